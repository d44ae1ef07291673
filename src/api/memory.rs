//! In-memory backend used by tests and `bookswap demo`

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{BackendError, BackendResult};
use crate::models::{
    Book, BookStatus, BookUpdate, ExchangeRequest, ExchangeRequestDetails, ExchangeStatus,
    NewBook, NewExchangeRequest, NewProfile, Profile, ProfileUpdate,
};

use super::{AuthSession, AuthUser, Backend};

const SESSION_LIFETIME_HOURS: i64 = 1;

struct Account {
    id: Uuid,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct Store {
    accounts: HashMap<String, Account>,
    /// access token -> identity
    access_tokens: HashMap<String, AuthUser>,
    /// refresh token -> identity
    refresh_tokens: HashMap<String, AuthUser>,
    profiles: HashMap<Uuid, Profile>,
    books: Vec<Book>,
    requests: Vec<ExchangeRequest>,
    /// Sign-up issues no session until the e-mail is confirmed
    require_confirmation: bool,
    /// Status every call fails with while the service is down
    outage: Option<u16>,
}

impl Store {
    fn issue_session(&mut self, user: AuthUser) -> AuthSession {
        let access_token = format!("mem-{}", Uuid::new_v4());
        let refresh_token = format!("mem-refresh-{}", Uuid::new_v4());
        self.access_tokens.insert(access_token.clone(), user.clone());
        self.refresh_tokens.insert(refresh_token.clone(), user.clone());
        AuthSession {
            access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::hours(SESSION_LIFETIME_HOURS),
            user,
        }
    }

    fn identity(&self, session: &AuthSession) -> BackendResult<Uuid> {
        self.access_tokens
            .get(&session.access_token)
            .map(|u| u.id)
            .ok_or(BackendError::Unauthorized)
    }

    fn book(&self, id: Uuid) -> BackendResult<&Book> {
        self.books.iter().find(|b| b.id == id).ok_or(BackendError::NotFound)
    }
}

/// Backend keeping every row in process memory.
///
/// Mirrors the hosted service closely enough for the client: tokens must be
/// issued by this instance, usernames are unique and rows are only changed by
/// their owners.
#[derive(Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose sign-ups wait for e-mail confirmation
    pub fn requiring_confirmation() -> Self {
        let backend = Self::new();
        backend.lock().require_confirmation = true;
        backend
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Lock the rows, failing like an unreachable service during an outage
    fn connect(&self) -> BackendResult<MutexGuard<'_, Store>> {
        let store = self.lock();
        match store.outage {
            Some(status) => Err(BackendError::Request {
                status,
                message: "Service Unavailable".to_string(),
            }),
            None => Ok(store),
        }
    }

    /// Make every call fail with `status` until cleared with `None`
    pub fn set_outage(&self, status: Option<u16>) {
        self.lock().outage = status;
    }

    /// Invalidate an access token so the next call is rejected
    pub fn revoke(&self, access_token: &str) {
        self.lock().access_tokens.remove(access_token);
    }

    /// Snapshot of every stored request (test inspection)
    pub fn all_requests(&self) -> Vec<ExchangeRequest> {
        self.lock().requests.clone()
    }

    /// Snapshot of every stored profile (test inspection)
    pub fn all_profiles(&self) -> Vec<Profile> {
        self.lock().profiles.values().cloned().collect()
    }

    /// Snapshot of every stored book (test inspection)
    pub fn all_books(&self) -> Vec<Book> {
        self.lock().books.clone()
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let mut store = self.connect()?;
        let key = email.trim().to_lowercase();
        let id = match store.accounts.get(&key) {
            Some(account) if account.password == password && !account.confirmed => {
                return Err(BackendError::auth("Email not confirmed"));
            }
            Some(account) if account.password == password => account.id,
            _ => return Err(BackendError::auth("Invalid login credentials")),
        };
        Ok(store.issue_session(AuthUser {
            id,
            email: Some(key),
        }))
    }

    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let mut store = self.connect()?;
        let key = email.trim().to_lowercase();
        if store.accounts.contains_key(&key) {
            return Err(BackendError::auth("User already registered"));
        }
        if password.len() < 6 {
            return Err(BackendError::auth(
                "Password should be at least 6 characters",
            ));
        }
        let id = Uuid::new_v4();
        let confirmed = !store.require_confirmation;
        store.accounts.insert(
            key.clone(),
            Account {
                id,
                password: password.to_string(),
                confirmed,
            },
        );
        if !confirmed {
            return Err(BackendError::ConfirmationRequired);
        }
        Ok(store.issue_session(AuthUser {
            id,
            email: Some(key),
        }))
    }

    async fn sign_out(&self, session: &AuthSession) -> BackendResult<()> {
        let mut store = self.connect()?;
        store.identity(session)?;
        store.access_tokens.remove(&session.access_token);
        store.refresh_tokens.remove(&session.refresh_token);
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> BackendResult<AuthSession> {
        let mut store = self.connect()?;
        let user = store
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| BackendError::auth("Invalid Refresh Token"))?;
        Ok(store.issue_session(user))
    }

    async fn current_user(&self, session: &AuthSession) -> BackendResult<AuthUser> {
        let store = self.connect()?;
        store
            .access_tokens
            .get(&session.access_token)
            .cloned()
            .ok_or(BackendError::Unauthorized)
    }

    async fn get_profile(&self, session: &AuthSession, id: Uuid) -> BackendResult<Profile> {
        let store = self.connect()?;
        store.identity(session)?;
        store.profiles.get(&id).cloned().ok_or(BackendError::NotFound)
    }

    async fn insert_profile(
        &self,
        session: &AuthSession,
        profile: &NewProfile,
    ) -> BackendResult<Profile> {
        let mut store = self.connect()?;
        if store.identity(session)? != profile.id {
            return Err(BackendError::Unauthorized);
        }
        if store.profiles.values().any(|p| p.username == profile.username) {
            return Err(BackendError::conflict(format!(
                "username {:?} is already taken",
                profile.username
            )));
        }
        let row = Profile::new(profile.id, &profile.username);
        store.profiles.insert(profile.id, row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        session: &AuthSession,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> BackendResult<Profile> {
        let mut store = self.connect()?;
        if store.identity(session)? != id {
            return Err(BackendError::Unauthorized);
        }
        if let Some(username) = &update.username
            && store
                .profiles
                .values()
                .any(|p| p.id != id && &p.username == username)
        {
            return Err(BackendError::conflict(format!(
                "username {username:?} is already taken"
            )));
        }
        let profile = store.profiles.get_mut(&id).ok_or(BackendError::NotFound)?;
        update.apply_to(profile);
        Ok(profile.clone())
    }

    async fn available_books(&self, session: &AuthSession) -> BackendResult<Vec<Book>> {
        let store = self.connect()?;
        store.identity(session)?;
        Ok(store
            .books
            .iter()
            .filter(|b| b.status == BookStatus::Available)
            .cloned()
            .collect())
    }

    async fn books_by_owner(
        &self,
        session: &AuthSession,
        owner: Uuid,
        status: Option<BookStatus>,
    ) -> BackendResult<Vec<Book>> {
        let store = self.connect()?;
        store.identity(session)?;
        Ok(store
            .books
            .iter()
            .filter(|b| b.owner_id == owner && status.is_none_or(|s| b.status == s))
            .cloned()
            .collect())
    }

    async fn get_book(&self, session: &AuthSession, id: Uuid) -> BackendResult<Book> {
        let store = self.connect()?;
        store.identity(session)?;
        store.book(id).cloned()
    }

    async fn insert_book(&self, session: &AuthSession, book: &NewBook) -> BackendResult<Book> {
        let mut store = self.connect()?;
        if store.identity(session)? != book.owner_id {
            return Err(BackendError::Unauthorized);
        }
        let row = book.clone().into_book(Uuid::new_v4());
        store.books.push(row.clone());
        Ok(row)
    }

    async fn update_book(
        &self,
        session: &AuthSession,
        id: Uuid,
        update: &BookUpdate,
    ) -> BackendResult<Book> {
        let mut store = self.connect()?;
        let caller = store.identity(session)?;
        let book = store
            .books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(BackendError::NotFound)?;
        if book.owner_id != caller {
            return Err(BackendError::Unauthorized);
        }
        update.apply_to(book);
        Ok(book.clone())
    }

    async fn delete_book(&self, session: &AuthSession, id: Uuid) -> BackendResult<()> {
        let mut store = self.connect()?;
        let caller = store.identity(session)?;
        // Other owners' rows are invisible to the caller
        store.books.retain(|b| !(b.id == id && b.owner_id == caller));
        Ok(())
    }

    async fn insert_exchange_request(
        &self,
        session: &AuthSession,
        request: &NewExchangeRequest,
    ) -> BackendResult<ExchangeRequest> {
        let mut store = self.connect()?;
        if store.identity(session)? != request.requester_id {
            return Err(BackendError::Unauthorized);
        }
        store.book(request.requested_book_id)?;
        store.book(request.offered_book_id)?;
        let row = request.clone().into_request(Uuid::new_v4());
        store.requests.push(row.clone());
        Ok(row)
    }

    async fn exchange_requests_for(
        &self,
        session: &AuthSession,
        profile: Uuid,
    ) -> BackendResult<Vec<ExchangeRequestDetails>> {
        let store = self.connect()?;
        store.identity(session)?;

        let mut rows = store
            .requests
            .iter()
            .filter(|r| r.involves(profile))
            .map(|r| {
                Ok(ExchangeRequestDetails {
                    request: r.clone(),
                    requested_book: store.book(r.requested_book_id)?.clone(),
                    offered_book: store.book(r.offered_book_id)?.clone(),
                })
            })
            .collect::<BackendResult<Vec<_>>>()?;

        // Equal timestamps: latest insert first
        rows.reverse();
        rows.sort_by(|a, b| b.request.created_at.cmp(&a.request.created_at));
        Ok(rows)
    }

    async fn update_exchange_status(
        &self,
        session: &AuthSession,
        id: Uuid,
        status: ExchangeStatus,
    ) -> BackendResult<ExchangeRequest> {
        let mut store = self.connect()?;
        let caller = store.identity(session)?;
        let request = store
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(BackendError::NotFound)?;
        if !request.involves(caller) {
            return Err(BackendError::NotFound);
        }
        request.status = status;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn count_books(&self, session: &AuthSession, owner: Uuid) -> BackendResult<u64> {
        let store = self.connect()?;
        store.identity(session)?;
        Ok(store.books.iter().filter(|b| b.owner_id == owner).count() as u64)
    }

    async fn count_exchange_requests(
        &self,
        session: &AuthSession,
        profile: Uuid,
        status: ExchangeStatus,
    ) -> BackendResult<u64> {
        let store = self.connect()?;
        store.identity(session)?;
        Ok(store
            .requests
            .iter()
            .filter(|r| r.status == status && r.involves(profile))
            .count() as u64)
    }
}
