/// Convenience result type used across Scenecast.
pub type ScenecastResult<T> = Result<T, ScenecastError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum ScenecastError {
    /// Invalid user-provided settings or timeline data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A media handle never reached a playable state within the allotted time.
    #[error("readiness timeout: {0}")]
    Timeout(String),

    /// A native media handle reported a decode, network or format error.
    #[error("media error: {0}")]
    Media(String),

    /// An export stage (audio isolation, mixing, muxing, frame extraction) failed.
    #[error("export error: {0}")]
    Export(String),

    /// The operation observed a raised cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScenecastError {
    /// Build a [`ScenecastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScenecastError::Timeout`] value.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Build a [`ScenecastError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`ScenecastError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`ScenecastError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors that leave the caller free to retry the same frame.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
