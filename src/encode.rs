pub(crate) mod format;
pub(crate) mod process;
pub(crate) mod sink;
pub(crate) mod visuals;
