//! Error types for campus-lostfound

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LostFoundError {
    /// Missing or malformed request fields
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is known but lacks the required role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// No usable caller identity on a protected route
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// State-machine invariant would be violated
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LostFoundError {
    /// Whether this error is the caller's fault (4xx) rather than ours
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LostFoundError::InvalidInput(_)
                | LostFoundError::NotFound(_)
                | LostFoundError::Forbidden(_)
                | LostFoundError::Unauthorized(_)
                | LostFoundError::Conflict(_)
                | LostFoundError::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(LostFoundError::Conflict("already returned".into()).is_client_error());
        assert!(LostFoundError::Forbidden("admins only".into()).is_client_error());
        assert!(!LostFoundError::Internal("disk".into()).is_client_error());
        assert!(!LostFoundError::Config("bad port".into()).is_client_error());
    }
}
