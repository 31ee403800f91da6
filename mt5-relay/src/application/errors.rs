use thiserror::Error;

/// Who is at fault for a failed dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad request; never retried, no side effects on the terminal
    Client,
    Internal,
}

/// Failure to dispatch an operation.
///
/// A failing terminal call is not a `DispatchError`: it is a normal result
/// carrying `{error: true, last_error}`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            DispatchError::UnknownOperation(_)
            | DispatchError::MissingField(_)
            | DispatchError::InvalidField { .. } => ErrorClass::Client,
            DispatchError::Internal(_) => ErrorClass::Internal,
        }
    }
}
