//! Common result and error types for the Tessera engine.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates a broken invariant inside the placer (a bug), not a
/// problem with the user's netlist or device. User-facing problems are
/// reported through a diagnostic sink and a dedicated error enum.
pub type TesseraResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in the placer, not a user input problem.
///
/// Raised for example when the strict legalizer exceeds its iteration caps,
/// which can only happen if an upstream phase broke its guarantees.
#[derive(Debug, thiserror::Error)]
#[error("internal placer error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
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
