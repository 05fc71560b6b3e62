/// Domain-level failures shared by every component.
///
/// Each variant maps to exactly one HTTP status in `jobportal-api`; the
/// message is what the caller sees, so it must never carry internals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// No pending-verification state bound to the caller's session.
    #[error("{0}")]
    Session(String),

    /// Missing or invalid credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch this resource.
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Request conflicts with the current state of the resource.
    #[error("{0}")]
    Conflict(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Forbidden".into())
    }
}
