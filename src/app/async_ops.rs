//! Async operations for the TUI
//!
//! Uses channels to communicate between the sync TUI loop and the worker
//! task that owns the session store.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::{Book, ExchangeRequest, ExchangeRequestDetails, ExchangeStatus, Profile};
use crate::pages::auth::{self, Credentials};
use crate::pages::exchange_modal::{self, ExchangeModal};
use crate::pages::my_books::{self, BookForm};
use crate::pages::profile::{self, ProfileForm, ProfileStats};
use crate::pages::{books, matches};
use crate::session::SessionStore;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum AsyncCommand {
    /// Restore the stored session
    Init,
    /// Sign in or sign up
    Authenticate(Credentials),
    SignOut,
    LoadBooks,
    LoadMyBooks,
    /// Insert or patch a listing
    SaveBook(BookForm),
    DeleteBook(Uuid),
    /// Load the user's offers for a requested book
    OpenExchange(Book),
    SubmitExchange(ExchangeModal),
    LoadMatches,
    /// Accept or reject a request
    Respond {
        request: ExchangeRequest,
        status: ExchangeStatus,
    },
    LoadProfileStats,
    SaveProfile(ProfileForm),
    /// Shutdown the worker
    Shutdown,
}

/// Results sent back from the async worker to the TUI
#[derive(Debug)]
pub enum AsyncResult {
    /// Session initialised, signed in or not
    SessionReady { user: Option<Profile> },
    SignedIn(Profile),
    /// Sign-in or sign-up refused; shown on the auth form
    AuthFailed(String),
    SignedOut,
    BooksLoaded(Vec<Book>),
    MyBooksLoaded(Vec<Book>),
    BookSaved(Book),
    BookDeleted(Uuid),
    ExchangeOpened(ExchangeModal),
    ExchangeSent(ExchangeRequest),
    MatchesLoaded(Vec<ExchangeRequestDetails>),
    Responded(ExchangeRequest),
    StatsLoaded(ProfileStats),
    ProfileSaved(Profile),
    /// A mutation failed
    Error { message: String },
}

/// Channel handles for communicating with the async worker
pub struct AsyncHandle {
    /// Send commands to the worker
    pub cmd_tx: mpsc::Sender<AsyncCommand>,
    /// Receive results from the worker
    pub result_rx: mpsc::Receiver<AsyncResult>,
}

/// Spawn the async worker and return handles
pub fn spawn_worker(mut store: SessionStore) -> AsyncHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<AsyncCommand>(32);
    let (result_tx, result_rx) = mpsc::channel::<AsyncResult>(32);

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            let Some(result) = execute(&mut store, cmd).await else {
                break;
            };
            if result_tx.send(result).await.is_err() {
                break;
            }
        }
        tracing::debug!("worker stopped");
    });

    AsyncHandle { cmd_tx, result_rx }
}

/// Run one command against the store. `None` on shutdown.
async fn execute(store: &mut SessionStore, cmd: AsyncCommand) -> Option<AsyncResult> {
    let result = match cmd {
        AsyncCommand::Init => {
            store.init().await;
            AsyncResult::SessionReady {
                user: store.user().cloned(),
            }
        }
        AsyncCommand::Authenticate(credentials) => match auth::submit(store, &credentials).await {
            Ok(profile) => AsyncResult::SignedIn(profile),
            Err(e) => {
                tracing::warn!("Authentication failed: {e}");
                AsyncResult::AuthFailed(e.to_string())
            }
        },
        AsyncCommand::SignOut => match store.sign_out().await {
            Ok(()) => AsyncResult::SignedOut,
            Err(e) => failed("Sign out failed", e),
        },
        AsyncCommand::LoadBooks => AsyncResult::BooksLoaded(books::load(store).await),
        AsyncCommand::LoadMyBooks => AsyncResult::MyBooksLoaded(my_books::load(store).await),
        AsyncCommand::SaveBook(form) => match my_books::submit(store, &form).await {
            Ok(book) => AsyncResult::BookSaved(book),
            Err(e) => failed("Error saving book", e),
        },
        AsyncCommand::DeleteBook(id) => match my_books::delete(store, id).await {
            Ok(()) => AsyncResult::BookDeleted(id),
            Err(e) => failed("Error deleting book", e),
        },
        AsyncCommand::OpenExchange(book) => {
            AsyncResult::ExchangeOpened(exchange_modal::open(store, book).await)
        }
        AsyncCommand::SubmitExchange(modal) => match exchange_modal::submit(store, &modal).await {
            Ok(request) => AsyncResult::ExchangeSent(request),
            Err(e) => failed("Error creating exchange request", e),
        },
        AsyncCommand::LoadMatches => AsyncResult::MatchesLoaded(matches::load(store).await),
        AsyncCommand::Respond { request, status } => {
            match matches::respond(store, &request, status).await {
                Ok(updated) => AsyncResult::Responded(updated),
                Err(e) => failed("Error updating request", e),
            }
        }
        AsyncCommand::LoadProfileStats => AsyncResult::StatsLoaded(profile::stats(store).await),
        AsyncCommand::SaveProfile(form) => match profile::save(store, &form).await {
            Ok(profile) => AsyncResult::ProfileSaved(profile),
            Err(e) => failed("Error updating profile", e),
        },
        AsyncCommand::Shutdown => return None,
    };
    Some(result)
}

/// Log a failed mutation and hand a short message to the status bar
fn failed(context: &str, err: impl std::fmt::Display) -> AsyncResult {
    tracing::error!("{context}: {err}");
    AsyncResult::Error {
        message: format!("{context}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Backend, InMemoryBackend};
    use crate::models::BookCondition;
    use crate::session::SessionVault;
    use std::sync::Arc;

    fn store() -> SessionStore {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        SessionStore::new(backend, SessionVault::Ephemeral)
    }

    fn sign_up(email: &str, username: &str) -> AsyncCommand {
        AsyncCommand::Authenticate(Credentials::SignUp {
            email: email.to_string(),
            password: "secret-pw".to_string(),
            username: username.to_string(),
        })
    }

    #[tokio::test]
    async fn test_init_without_session() {
        let mut store = store();
        let result = execute(&mut store, AsyncCommand::Init).await.unwrap();
        assert!(matches!(result, AsyncResult::SessionReady { user: None }));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_bad_login_reports_auth_failure() {
        let mut store = store();
        let cmd = AsyncCommand::Authenticate(Credentials::Login {
            email: "nobody@example.com".to_string(),
            password: "wrong-pw".to_string(),
        });
        let result = execute(&mut store, cmd).await.unwrap();
        assert!(matches!(result, AsyncResult::AuthFailed(_)));
        assert!(!store.is_signed_in());
    }

    #[tokio::test]
    async fn test_save_book_then_list() {
        let mut store = store();
        let result = execute(&mut store, sign_up("a@example.com", "alice")).await.unwrap();
        assert!(matches!(result, AsyncResult::SignedIn(ref p) if p.username == "alice"));

        let form = BookForm {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: "Science Fiction".to_string(),
            condition: Some(BookCondition::Good),
            ..BookForm::default()
        };
        let saved = execute(&mut store, AsyncCommand::SaveBook(form)).await.unwrap();
        assert!(matches!(saved, AsyncResult::BookSaved(_)));

        match execute(&mut store, AsyncCommand::LoadMyBooks).await.unwrap() {
            AsyncResult::MyBooksLoaded(books) => assert_eq!(books.len(), 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_book_is_an_error() {
        let mut store = store();
        execute(&mut store, sign_up("a@example.com", "alice")).await.unwrap();
        let result = execute(&mut store, AsyncCommand::SaveBook(BookForm::default())).await.unwrap();
        assert!(matches!(result, AsyncResult::Error { ref message } if message.contains("title")));
    }

    #[tokio::test]
    async fn test_sign_out_after_token_revoked() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut store = SessionStore::new(Arc::clone(&backend) as Arc<dyn Backend>, SessionVault::Ephemeral);
        execute(&mut store, sign_up("a@example.com", "alice")).await.unwrap();
        let token = store.authorized().await.unwrap().access_token;
        backend.revoke(&token);

        for _ in 0..2 {
            let result = execute(&mut store, AsyncCommand::SignOut).await.unwrap();
            assert!(matches!(result, AsyncResult::SignedOut));
        }
        assert!(!store.is_signed_in());
    }

    #[tokio::test]
    async fn test_unconfirmed_sign_up_shows_inline() {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::requiring_confirmation());
        let mut store = SessionStore::new(backend, SessionVault::Ephemeral);
        let result = execute(&mut store, sign_up("a@example.com", "alice")).await.unwrap();
        assert!(matches!(result, AsyncResult::AuthFailed(ref m) if m.contains("confirm")));
    }

    #[tokio::test]
    async fn test_worker_round_trip() {
        let mut handle = spawn_worker(store());
        handle.cmd_tx.send(AsyncCommand::Init).await.unwrap();
        let result = handle.result_rx.recv().await.unwrap();
        assert!(matches!(result, AsyncResult::SessionReady { user: None }));
        handle.cmd_tx.send(AsyncCommand::Shutdown).await.unwrap();
    }
}
