//! Profile view: identity, stats and the edit form

use crate::error::BackendError;
use crate::models::{ExchangeStatus, Profile, ProfileUpdate};
use crate::session::SessionStore;

use super::{PageError, connect, optional, required};

/// Counters shown on the profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub total_books: u64,
    /// Requests in `accepted` where the user is either side
    pub exchanges_completed: u64,
    /// Requests in `pending` where the user is either side
    pub pending_requests: u64,
}

/// Load the three counters concurrently.
///
/// A failed count is logged and shows as zero.
pub async fn stats(store: &mut SessionStore) -> ProfileStats {
    let Some(me) = store.user_id() else {
        return ProfileStats::default();
    };
    let (backend, session) = match connect(store).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("Error fetching stats: {e}");
            return ProfileStats::default();
        }
    };

    let (books, accepted, pending) = tokio::join!(
        backend.count_books(&session, me),
        backend.count_exchange_requests(&session, me, ExchangeStatus::Accepted),
        backend.count_exchange_requests(&session, me, ExchangeStatus::Pending),
    );

    let or_zero = |result: Result<u64, BackendError>| {
        result.unwrap_or_else(|e| {
            tracing::error!("Error fetching stats: {e}");
            0
        })
    };

    ProfileStats {
        total_books: or_zero(books),
        exchanges_completed: or_zero(accepted),
        pending_requests: or_zero(pending),
    }
}

/// Edit form for the profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub username: String,
    pub avatar_url: String,
    /// Avatar field focused instead of username
    pub avatar_focused: bool,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            username: profile.username.clone(),
            avatar_url: profile.avatar_url.clone().unwrap_or_default(),
            avatar_focused: false,
        }
    }

    pub fn focused_mut(&mut self) -> &mut String {
        if self.avatar_focused {
            &mut self.avatar_url
        } else {
            &mut self.username
        }
    }

    pub fn to_update(&self) -> Result<ProfileUpdate, PageError> {
        Ok(ProfileUpdate {
            username: Some(required(&self.username, "username")?),
            avatar_url: Some(optional(&self.avatar_url).unwrap_or_default()),
            bio: None,
        })
    }
}

/// Save the form and refresh the session's copy of the profile
pub async fn save(store: &mut SessionStore, form: &ProfileForm) -> Result<Profile, PageError> {
    let update = form.to_update()?;
    let me = store.user_id().ok_or(BackendError::NotSignedIn)?;
    let (backend, session) = connect(store).await?;
    backend.update_profile(&session, me, &update).await?;

    let profile = store.refresh_profile().await?.clone();
    tracing::info!(user_id = %profile.id, username = %profile.username, "Updated profile");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Backend, InMemoryBackend};
    use crate::models::{BookCondition, NewBook};
    use crate::pages::{FormError, exchange_modal, matches};
    use crate::session::SessionVault;
    use std::sync::Arc;

    async fn user(backend: &Arc<dyn Backend>, email: &str, name: &str) -> SessionStore {
        let mut store = SessionStore::new(Arc::clone(backend), SessionVault::Ephemeral);
        store.sign_up(email, "secret-pw", name).await.unwrap();
        store
    }

    async fn list(store: &mut SessionStore, title: &str) -> crate::models::Book {
        let (backend, session) = connect(store).await.unwrap();
        let row = NewBook::new(session.user_id(), title, "A", "Fiction", BookCondition::Good, None);
        backend.insert_book(&session, &row).await.unwrap()
    }

    #[tokio::test]
    async fn test_stats_count_both_sides() {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let mut alice = user(&backend, "a@example.com", "alice").await;
        let mut bob = user(&backend, "b@example.com", "bob").await;

        let mut books = Vec::new();
        for title in ["X", "W"] {
            books.push(list(&mut alice, title).await);
        }
        list(&mut bob, "Y").await;

        for wanted in &books {
            let modal = exchange_modal::open(&mut bob, wanted.clone()).await;
            exchange_modal::submit(&mut bob, &modal).await.unwrap();
        }
        let first = matches::load(&mut alice).await.pop().unwrap();
        matches::respond(&mut alice, &first.request, ExchangeStatus::Accepted)
            .await
            .unwrap();

        let alice_stats = stats(&mut alice).await;
        assert_eq!(
            alice_stats,
            ProfileStats {
                total_books: 2,
                exchanges_completed: 1,
                pending_requests: 1,
            }
        );
        let bob_stats = stats(&mut bob).await;
        assert_eq!(bob_stats.total_books, 1);
        assert_eq!(bob_stats.exchanges_completed, 1);
        assert_eq!(bob_stats.pending_requests, 1);
    }

    #[tokio::test]
    async fn test_save_refreshes_session_profile() {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let mut alice = user(&backend, "a@example.com", "alice").await;

        let mut form = ProfileForm::from_profile(alice.user().unwrap());
        form.username = "alice-reads".to_string();
        form.avatar_url = "https://example.com/a.png".to_string();
        save(&mut alice, &form).await.unwrap();

        let profile = alice.user().unwrap();
        assert_eq!(profile.username, "alice-reads");
        assert_eq!(profile.avatar_url.as_deref(), Some("https://example.com/a.png"));
    }

    #[tokio::test]
    async fn test_taken_username_is_refused() {
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        user(&backend, "a@example.com", "alice").await;
        let mut bob = user(&backend, "b@example.com", "bob").await;

        let form = ProfileForm {
            username: "alice".to_string(),
            ..ProfileForm::default()
        };
        let err = save(&mut bob, &form).await.unwrap_err();
        assert!(matches!(err, PageError::Backend(BackendError::Conflict { .. })));
        assert_eq!(bob.user().unwrap().username, "bob");
    }

    #[test]
    fn test_username_required() {
        let form = ProfileForm::default();
        assert!(matches!(
            form.to_update(),
            Err(PageError::Form(FormError::Required("username")))
        ));
    }
}
