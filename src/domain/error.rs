use thiserror::Error;

/// Terminal failure of a highlight job. Every stage reports through one of
/// these; nothing is retried.
#[derive(Debug, Error)]
pub enum HighlightError {
    /// Source video missing, unopenable, or without frames.
    #[error("input error: {0}")]
    Input(String),
    /// The detector failed on a frame.
    #[error("processing error: {0}")]
    Processing(String),
    /// A clip or the archive could not be written.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl HighlightError {
    pub fn input(msg: impl Into<String>) -> Self {
        HighlightError::Input(msg.into())
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        HighlightError::Processing(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        HighlightError::Encoding(msg.into())
    }
}
