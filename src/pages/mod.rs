//! Page-level operations
//!
//! Each view fetches or mutates through the session's backend. Fetches log
//! failures and fall back to empty results; mutations return errors so the
//! caller can log them or show them.

pub mod auth;
pub mod books;
pub mod exchange_modal;
pub mod matches;
pub mod my_books;
pub mod profile;

use std::sync::Arc;
use thiserror::Error;

use crate::api::{AuthSession, Backend};
use crate::error::BackendError;
use crate::exchange::ExchangeError;
use crate::session::SessionStore;

/// A form that cannot be submitted as filled in
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("unknown condition {0:?}")]
    UnknownCondition(String),
    #[error("no book selected to offer")]
    NothingOffered,
}

/// Failure of a page operation
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    Form(#[from] FormError),
}

/// Backend handle plus a valid session for the signed-in user
pub(crate) async fn connect(
    store: &mut SessionStore,
) -> Result<(Arc<dyn Backend>, AuthSession), BackendError> {
    let session = store.authorized().await?;
    Ok((store.backend(), session))
}

/// Trimmed value of a required field
pub(crate) fn required(value: &str, field: &'static str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() {
        Err(FormError::Required(field))
    } else {
        Ok(value.to_string())
    }
}

/// Trimmed value of an optional field, `None` when blank
pub(crate) fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims() {
        assert_eq!(required("  Dune ", "title"), Ok("Dune".to_string()));
        assert_eq!(required("   ", "title"), Err(FormError::Required("title")));
    }

    #[test]
    fn test_optional_blank_is_none() {
        assert_eq!(optional(" "), None);
        assert_eq!(optional(" note "), Some("note".to_string()));
    }
}
