/// Domain-level failure shared by every layer of the gateway.
///
/// Unknown usernames and unknown autologin tokens are reported as
/// [`CoreError::BadRequest`] so callers cannot probe for existence.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed field validation. `target` names the offending field.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        target: Option<&'static str>,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Validation failure pinned to a single input field.
    pub fn invalid_field(target: &'static str, message: impl Into<String>) -> Self {
        CoreError::Validation {
            message: message.into(),
            target: Some(target),
        }
    }
}
