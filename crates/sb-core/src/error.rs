use thiserror::Error;

/// Host-facing error. Run failures are never reported through this type; they are
/// [`crate::Outcome::Failure`] values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct SpellBlocksError {
    pub code: String,
    pub message: String,
}

impl SpellBlocksError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
