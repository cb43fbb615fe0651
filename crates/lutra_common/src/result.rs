//! Common result and error types for the Lutra mapper.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable invariant violation (a bug in Lutra),
/// not a problem with the input design. Degraded-but-recoverable conditions
/// (combinational cycles, unknown cells) are reported through
/// `lutra_diagnostics` and the operation still returns `Ok`.
pub type LutraResult<T> = Result<T, InternalError>;

/// An internal error indicating a broken invariant inside the mapper.
///
/// These should never occur during normal operation; one firing means a
/// logic error in the mapper itself, and the mapping run is aborted.
#[derive(Debug, thiserror::Error)]
#[error("internal mapper error: {message}")]
pub struct InternalError {
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
