//! Exchange requests the user takes part in

use uuid::Uuid;

use crate::error::BackendError;
use crate::exchange;
use crate::models::{ExchangeRequest, ExchangeRequestDetails, ExchangeStatus};
use crate::session::SessionStore;

use super::{PageError, connect};

/// Side of a request the viewer is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Requester,
    Owner,
}

impl Role {
    pub fn of(request: &ExchangeRequest, viewer: Uuid) -> Option<Self> {
        if request.owner_id == viewer {
            Some(Self::Owner)
        } else if request.requester_id == viewer {
            Some(Self::Requester)
        } else {
            None
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Requester => "You asked for",
            Self::Owner => "Requested from you",
        }
    }
}

/// Fetch the user's requests, newest first. Failures are logged and yield an empty list.
pub async fn load(store: &mut SessionStore) -> Vec<ExchangeRequestDetails> {
    let result = async {
        let me = store.user_id().ok_or(BackendError::NotSignedIn)?;
        let (backend, session) = connect(store).await?;
        backend.exchange_requests_for(&session, me).await
    }
    .await;

    result.unwrap_or_else(|e| {
        tracing::error!("Error fetching requests: {e}");
        Vec::new()
    })
}

/// Accept or reject a request as its owner
pub async fn respond(
    store: &mut SessionStore,
    request: &ExchangeRequest,
    status: ExchangeStatus,
) -> Result<ExchangeRequest, PageError> {
    let me = store.user_id().ok_or(BackendError::NotSignedIn)?;
    exchange::check_transition(request, me, status)?;

    let (backend, session) = connect(store).await?;
    let updated = backend
        .update_exchange_status(&session, request.id, status)
        .await?;
    tracing::info!(request_id = %updated.id, status = %updated.status, "Updated exchange request");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Backend, InMemoryBackend};
    use crate::exchange::ExchangeError;
    use crate::models::{Book, BookCondition, BookStatus, NewBook};
    use crate::pages::exchange_modal;
    use crate::session::SessionVault;
    use std::sync::Arc;

    async fn user(backend: &Arc<dyn Backend>, email: &str, name: &str) -> SessionStore {
        let mut store = SessionStore::new(Arc::clone(backend), SessionVault::Ephemeral);
        store.sign_up(email, "secret-pw", name).await.unwrap();
        store
    }

    async fn list(store: &mut SessionStore, title: &str) -> Book {
        let (backend, session) = connect(store).await.unwrap();
        backend
            .insert_book(
                &session,
                &NewBook::new(session.user_id(), title, "Author", "Fiction", BookCondition::Good, None),
            )
            .await
            .unwrap()
    }

    async fn request(store: &mut SessionStore, wanted: &Book) -> ExchangeRequest {
        let modal = exchange_modal::open(store, wanted.clone()).await;
        exchange_modal::submit(store, &modal).await.unwrap()
    }

    #[tokio::test]
    async fn test_full_exchange_scenario() {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let mut alice = user(&backend, "a@example.com", "alice").await;
        let mut bob = user(&backend, "b@example.com", "bob").await;

        let x = list(&mut alice, "X").await;
        assert_eq!(x.status, BookStatus::Available);
        let y = list(&mut bob, "Y").await;
        request(&mut bob, &x).await;

        let seen_by_alice = load(&mut alice).await;
        assert_eq!(seen_by_alice.len(), 1);
        let pending = &seen_by_alice[0];
        assert_eq!(pending.request.status, ExchangeStatus::Pending);
        assert_eq!(pending.requested_book.id, x.id);
        assert_eq!(pending.offered_book.id, y.id);

        respond(&mut alice, &pending.request, ExchangeStatus::Accepted)
            .await
            .unwrap();

        for store in [&mut alice, &mut bob] {
            let rows = load(store).await;
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].request.status, ExchangeStatus::Accepted);
        }
    }

    #[tokio::test]
    async fn test_accept_changes_only_that_request() {
        let memory = Arc::new(InMemoryBackend::new());
        let backend: Arc<dyn Backend> = Arc::clone(&memory) as Arc<dyn Backend>;
        let mut alice = user(&backend, "a@example.com", "alice").await;
        let mut bob = user(&backend, "b@example.com", "bob").await;
        let mut carol = user(&backend, "c@example.com", "carol").await;

        let x = list(&mut alice, "X").await;
        let w = list(&mut alice, "W").await;
        list(&mut bob, "Y").await;
        list(&mut carol, "Z").await;
        let first = request(&mut bob, &x).await;
        request(&mut carol, &x).await;
        request(&mut bob, &w).await;

        respond(&mut alice, &first, ExchangeStatus::Accepted)
            .await
            .unwrap();

        for row in memory.all_requests() {
            let expected = if row.id == first.id {
                ExchangeStatus::Accepted
            } else {
                ExchangeStatus::Pending
            };
            assert_eq!(row.status, expected);
        }
        // Book statuses are left alone
        assert!(memory.all_books().iter().all(|b| b.status == BookStatus::Available));
    }

    #[tokio::test]
    async fn test_requester_cannot_respond() {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let mut alice = user(&backend, "a@example.com", "alice").await;
        let mut bob = user(&backend, "b@example.com", "bob").await;
        let x = list(&mut alice, "X").await;
        list(&mut bob, "Y").await;
        let req = request(&mut bob, &x).await;

        let err = respond(&mut bob, &req, ExchangeStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Exchange(ExchangeError::NotOwner)));
    }

    #[tokio::test]
    async fn test_newest_first() {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let mut alice = user(&backend, "a@example.com", "alice").await;
        let mut bob = user(&backend, "b@example.com", "bob").await;
        let x = list(&mut alice, "X").await;
        let w = list(&mut alice, "W").await;
        list(&mut bob, "Y").await;
        request(&mut bob, &x).await;
        let later = request(&mut bob, &w).await;

        let rows = load(&mut bob).await;
        assert_eq!(rows[0].request.id, later.id);
    }

    #[test]
    fn test_role() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let x = NewBook::new(alice, "X", "A", "Fiction", BookCondition::Good, None).into_book(Uuid::new_v4());
        let y = NewBook::new(bob, "Y", "A", "Fiction", BookCondition::Good, None).into_book(Uuid::new_v4());
        let req = exchange::build_offer(bob, &x, &y, None)
            .unwrap()
            .into_request(Uuid::new_v4());
        assert_eq!(Role::of(&req, alice), Some(Role::Owner));
        assert_eq!(Role::of(&req, bob), Some(Role::Requester));
        assert_eq!(Role::of(&req, Uuid::new_v4()), None);
    }
}
