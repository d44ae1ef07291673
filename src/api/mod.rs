//! Data access against the hosted backend
//!
//! Everything above this module talks to a [`Backend`]: the production
//! implementation speaks Supabase (GoTrue auth + PostgREST rows) over HTTPS,
//! the in-memory one backs tests and `bookswap demo`.

pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BackendResult;
use crate::models::{
    Book, BookStatus, BookUpdate, ExchangeRequest, ExchangeRequestDetails, ExchangeStatus,
    NewBook, NewExchangeRequest, NewProfile, Profile, ProfileUpdate,
};

pub use memory::InMemoryBackend;
pub use supabase::SupabaseClient;

/// Seconds before the real expiry at which a session counts as expired
const EXPIRY_LEEWAY_SECS: i64 = 30;

/// Authenticated identity as reported by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens for an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl AuthSession {
    /// Id of the signed-in identity
    pub const fn user_id(&self) -> Uuid {
        self.user.id
    }

    /// Whether the access token has (almost) run out
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + chrono::Duration::seconds(EXPIRY_LEEWAY_SECS) >= self.expires_at
    }
}

/// Operations the client needs from the hosted backend.
///
/// Data calls take the caller's session so row-level rules apply to the
/// signed-in identity.
#[async_trait]
pub trait Backend: Send + Sync {
    // Auth

    /// Password sign-in
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession>;

    /// Create an identity. Fails with `ConfirmationRequired` when no session is issued.
    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthSession>;

    /// End the session on the server
    async fn sign_out(&self, session: &AuthSession) -> BackendResult<()>;

    /// Exchange a refresh token for a new session
    async fn refresh(&self, refresh_token: &str) -> BackendResult<AuthSession>;

    /// Validate the access token and return its identity
    async fn current_user(&self, session: &AuthSession) -> BackendResult<AuthUser>;

    // Profiles

    async fn get_profile(&self, session: &AuthSession, id: Uuid) -> BackendResult<Profile>;

    async fn insert_profile(
        &self,
        session: &AuthSession,
        profile: &NewProfile,
    ) -> BackendResult<Profile>;

    async fn update_profile(
        &self,
        session: &AuthSession,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> BackendResult<Profile>;

    // Books

    /// Every book with status `available`
    async fn available_books(&self, session: &AuthSession) -> BackendResult<Vec<Book>>;

    /// Books owned by a profile, optionally restricted to one status
    async fn books_by_owner(
        &self,
        session: &AuthSession,
        owner: Uuid,
        status: Option<BookStatus>,
    ) -> BackendResult<Vec<Book>>;

    async fn get_book(&self, session: &AuthSession, id: Uuid) -> BackendResult<Book>;

    async fn insert_book(&self, session: &AuthSession, book: &NewBook) -> BackendResult<Book>;

    async fn update_book(
        &self,
        session: &AuthSession,
        id: Uuid,
        update: &BookUpdate,
    ) -> BackendResult<Book>;

    async fn delete_book(&self, session: &AuthSession, id: Uuid) -> BackendResult<()>;

    // Exchange requests

    async fn insert_exchange_request(
        &self,
        session: &AuthSession,
        request: &NewExchangeRequest,
    ) -> BackendResult<ExchangeRequest>;

    /// Requests where the profile is requester or owner, joined with both books, newest first
    async fn exchange_requests_for(
        &self,
        session: &AuthSession,
        profile: Uuid,
    ) -> BackendResult<Vec<ExchangeRequestDetails>>;

    /// Set the status of a single request
    async fn update_exchange_status(
        &self,
        session: &AuthSession,
        id: Uuid,
        status: ExchangeStatus,
    ) -> BackendResult<ExchangeRequest>;

    // Counts

    /// Number of books owned by a profile
    async fn count_books(&self, session: &AuthSession, owner: Uuid) -> BackendResult<u64>;

    /// Number of requests in a status where the profile is requester or owner
    async fn count_exchange_requests(
        &self,
        session: &AuthSession,
        profile: Uuid,
        status: ExchangeStatus,
    ) -> BackendResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at,
            user: AuthUser {
                id: Uuid::new_v4(),
                email: None,
            },
        }
    }

    #[test]
    fn test_session_expiry_has_leeway() {
        let now = Utc::now();
        assert!(session(now).is_expired_at(now));
        assert!(session(now + chrono::Duration::seconds(10)).is_expired_at(now));
        assert!(!session(now + chrono::Duration::hours(1)).is_expired_at(now));
    }
}
