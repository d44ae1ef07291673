//! Error types shared by the backend seam

use thiserror::Error;

/// Errors returned by a [`Backend`](crate::api::Backend)
#[derive(Debug, Error)]
pub enum BackendError {
    /// Credentials rejected, e-mail already registered, weak password
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// Unique constraint hit (taken username and the like)
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// The row does not exist or is not visible to the caller
    #[error("not found")]
    NotFound,

    /// Access token missing, expired or refused by row-level rules
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-success response
    #[error("request failed ({status}): {message}")]
    Request { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Sign-up succeeded but no session is issued until the e-mail is confirmed
    #[error("check your e-mail to confirm the account before signing in")]
    ConfirmationRequired,

    #[error("not signed in")]
    NotSignedIn,
}

impl BackendError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Whether the error means the stored session can no longer be used
    pub const fn is_session_invalid(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::NotSignedIn)
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_readable() {
        assert_eq!(
            BackendError::auth("Invalid login credentials").to_string(),
            "authentication failed: Invalid login credentials"
        );
        let err = BackendError::Request {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "request failed (500): boom");
    }

    #[test]
    fn test_session_invalid() {
        assert!(BackendError::Unauthorized.is_session_invalid());
        assert!(BackendError::NotSignedIn.is_session_invalid());
        assert!(!BackendError::NotFound.is_session_invalid());
    }
}
