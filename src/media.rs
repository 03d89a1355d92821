pub(crate) mod clock;
pub(crate) mod collect;
pub(crate) mod context;
pub(crate) mod handle;
pub(crate) mod node;
pub(crate) mod pool;
pub(crate) mod retry;
pub(crate) mod simulated;
pub(crate) mod sync;
