/// Convenience result type used across tpdne.
pub type TpdneResult<T> = Result<T, TpdneError>;

/// Top-level error taxonomy.
///
/// Nothing here is recoverable inside the publish loop: every variant ends the run and the
/// process supervisor decides whether to restart.
#[derive(thiserror::Error, Debug)]
pub enum TpdneError {
    /// Invalid option or option combination, detected before the loop starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// A sampled frame does not fit any layout the normalizer understands.
    #[error("shape error: {0}")]
    Shape(String),

    /// The image codec failed to encode a canonical image.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from IO or a sampler.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TpdneError {
    /// Build a [`TpdneError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`TpdneError::Shape`] value.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Build a [`TpdneError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
