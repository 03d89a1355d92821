pub(crate) mod detect;
pub(crate) mod extract;
pub(crate) mod selector;
