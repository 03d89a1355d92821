use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{ScenecastError, ScenecastResult};

/// Shared cancellation flag carried by export operations.
///
/// Cloning yields another handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the non-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the cancellation signal.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Return `true` once [`CancelToken::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Return [`ScenecastError::Cancelled`] when the signal is raised.
    pub fn check(&self) -> ScenecastResult<()> {
        if self.is_cancelled() {
            return Err(ScenecastError::Cancelled);
        }
        Ok(())
    }
}
