//! Request-exchange modal: pick one of your books to offer

use crate::error::BackendError;
use crate::exchange;
use crate::models::{Book, BookStatus, ExchangeRequest};
use crate::session::SessionStore;

use super::{FormError, PageError, connect, optional};

/// Modal state for one requested book
#[derive(Debug, Clone)]
pub struct ExchangeModal {
    /// The book the user wants
    pub requested: Book,
    /// The user's books that may be offered
    pub offers: Vec<Book>,
    pub selected: Option<usize>,
    pub message: String,
    pub submitting: bool,
}

impl ExchangeModal {
    pub fn new(requested: Book, offers: Vec<Book>) -> Self {
        let selected = (!offers.is_empty()).then_some(0);
        Self {
            requested,
            offers,
            selected,
            message: String::new(),
            submitting: false,
        }
    }

    pub fn selected_offer(&self) -> Option<&Book> {
        self.selected.and_then(|i| self.offers.get(i))
    }

    pub fn select_next(&mut self) {
        if self.offers.is_empty() {
            return;
        }
        self.selected = Some(self.selected.map_or(0, |i| (i + 1) % self.offers.len()));
    }

    pub fn select_prev(&mut self) {
        if self.offers.is_empty() {
            return;
        }
        let len = self.offers.len();
        self.selected = Some(self.selected.map_or(0, |i| (i + len - 1) % len));
    }
}

/// Open the modal, loading the user's available books as offers.
///
/// A failed load is logged and leaves the offer list empty.
pub async fn open(store: &mut SessionStore, requested: Book) -> ExchangeModal {
    let result = async {
        let me = store.user_id().ok_or(BackendError::NotSignedIn)?;
        let (backend, session) = connect(store).await?;
        let mine = backend
            .books_by_owner(&session, me, Some(BookStatus::Available))
            .await?;
        Ok::<_, BackendError>((me, mine))
    }
    .await;

    let offers = match result {
        Ok((me, mine)) => exchange::offerable(me, &requested, &mine)
            .into_iter()
            .cloned()
            .collect(),
        Err(e) => {
            tracing::error!("Error fetching books: {e}");
            Vec::new()
        }
    };
    ExchangeModal::new(requested, offers)
}

/// Send the request described by the modal
pub async fn submit(store: &mut SessionStore, modal: &ExchangeModal) -> Result<ExchangeRequest, PageError> {
    let offered = modal.selected_offer().ok_or(FormError::NothingOffered)?;
    let me = store.user_id().ok_or(BackendError::NotSignedIn)?;
    let row = exchange::build_offer(me, &modal.requested, offered, optional(&modal.message))?;

    let (backend, session) = connect(store).await?;
    let request = backend.insert_exchange_request(&session, &row).await?;
    tracing::info!(
        request_id = %request.id,
        requested_book = %request.requested_book_id,
        offered_book = %request.offered_book_id,
        "Created exchange request"
    );
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Backend, InMemoryBackend};
    use crate::exchange::ExchangeError;
    use crate::models::{BookCondition, ExchangeStatus, NewBook};
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

    #[tokio::test]
    async fn test_open_lists_only_own_books() {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let mut alice = user(&backend, "a@example.com", "alice").await;
        let mut bob = user(&backend, "b@example.com", "bob").await;
        let x = list(&mut alice, "X").await;
        list(&mut alice, "Other").await;
        let y = list(&mut bob, "Y").await;

        let modal = open(&mut bob, x).await;
        let offers: Vec<_> = modal.offers.iter().map(|b| b.id).collect();
        assert_eq!(offers, vec![y.id]);
        assert_eq!(modal.selected, Some(0));
    }

    #[tokio::test]
    async fn test_submit_creates_pending_request() {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let mut alice = user(&backend, "a@example.com", "alice").await;
        let mut bob = user(&backend, "b@example.com", "bob").await;
        let x = list(&mut alice, "X").await;
        let y = list(&mut bob, "Y").await;

        let modal = open(&mut bob, x.clone()).await;
        let request = submit(&mut bob, &modal).await.unwrap();
        assert_eq!(request.status, ExchangeStatus::Pending);
        assert_eq!(request.owner_id, x.owner_id);
        assert_eq!(request.requested_book_id, x.id);
        assert_eq!(request.offered_book_id, y.id);
    }

    #[tokio::test]
    async fn test_submit_without_offer_fails() {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let mut alice = user(&backend, "a@example.com", "alice").await;
        let mut bob = user(&backend, "b@example.com", "bob").await;
        let x = list(&mut alice, "X").await;

        let modal = open(&mut bob, x).await;
        assert!(modal.offers.is_empty());
        let err = submit(&mut bob, &modal).await.unwrap_err();
        assert!(matches!(err, PageError::Form(FormError::NothingOffered)));
    }

    #[tokio::test]
    async fn test_offering_requested_book_is_refused() {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let mut alice = user(&backend, "a@example.com", "alice").await;
        let x = list(&mut alice, "X").await;

        // Forged modal offering the requested book itself
        let modal = ExchangeModal::new(x.clone(), vec![x]);
        let err = submit(&mut alice, &modal).await.unwrap_err();
        assert!(matches!(err, PageError::Exchange(ExchangeError::SameBook)));
    }
}
