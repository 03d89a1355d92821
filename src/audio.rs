pub(crate) mod filters;
pub(crate) mod render;
pub(crate) mod timeline;
