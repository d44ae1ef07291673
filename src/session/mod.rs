//! Authentication session store
//!
//! Holds the signed-in profile, the loading flag the router waits on and the
//! tokens of the current session. One store is built at startup and handed
//! to whoever needs it.

mod vault;

pub use vault::{SessionVault, VaultError};

use std::sync::Arc;
use uuid::Uuid;

use crate::api::{AuthSession, Backend};
use crate::error::{BackendError, BackendResult};
use crate::models::{NewProfile, Profile};

/// Client-side session state
pub struct SessionStore {
    backend: Arc<dyn Backend>,
    vault: SessionVault,
    session: Option<AuthSession>,
    user: Option<Profile>,
    loading: bool,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn Backend>, vault: SessionVault) -> Self {
        Self {
            backend,
            vault,
            session: None,
            user: None,
            loading: true,
        }
    }

    /// Profile of the signed-in user
    pub const fn user(&self) -> Option<&Profile> {
        self.user.as_ref()
    }

    /// True until [`init`](Self::init) has finished
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|p| p.id)
    }

    pub fn email(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.user.email.as_deref())
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    /// Restore the persisted session and load its profile.
    ///
    /// Never fails: any problem leaves the store signed out.
    pub async fn init(&mut self) {
        match self.restore().await {
            Ok(Some((session, profile))) => {
                tracing::info!(user_id = %profile.id, "session restored");
                self.session = Some(session);
                self.user = Some(profile);
            }
            Ok(None) => {
                tracing::debug!("no stored session");
                self.session = None;
                self.user = None;
            }
            Err(e) => {
                tracing::warn!("Failed to restore session: {e}");
                if let Err(e) = self.vault.clear() {
                    tracing::warn!("Failed to clear stored session: {e}");
                }
                self.session = None;
                self.user = None;
            }
        }
        self.loading = false;
    }

    async fn restore(&self) -> anyhow::Result<Option<(AuthSession, Profile)>> {
        let Some(mut session) = self.vault.load()? else {
            return Ok(None);
        };

        if session.is_expired() {
            session = self.backend.refresh(&session.refresh_token).await?;
            self.vault.save(&session)?;
            tracing::info!(user_id = %session.user_id(), "token_refreshed");
        }

        let user = self.backend.current_user(&session).await?;
        let profile = self.backend.get_profile(&session, user.id).await?;
        Ok(Some((session, profile)))
    }

    /// Sign in with e-mail and password
    pub async fn sign_in(&mut self, email: &str, password: &str) -> BackendResult<&Profile> {
        let session = self.backend.sign_in(email, password).await?;
        let profile = self.backend.get_profile(&session, session.user_id()).await?;
        Ok(self.establish(session, profile))
    }

    /// Create an identity and its profile, then sign in
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        username: &str,
    ) -> BackendResult<&Profile> {
        let session = self.backend.sign_up(email, password).await?;
        let row = NewProfile {
            id: session.user_id(),
            username: username.trim().to_string(),
        };
        self.backend.insert_profile(&session, &row).await?;
        let profile = self.backend.get_profile(&session, session.user_id()).await?;
        Ok(self.establish(session, profile))
    }

    fn establish(&mut self, session: AuthSession, profile: Profile) -> &Profile {
        if let Err(e) = self.vault.save(&session) {
            tracing::warn!("Failed to persist session: {e}");
        }
        tracing::info!(user_id = %profile.id, username = %profile.username, "signed_in");
        self.session = Some(session);
        self.loading = false;
        self.user.insert(profile)
    }

    /// End the session.
    ///
    /// A session the backend no longer accepts counts as already ended and is
    /// dropped locally. Any other failure keeps it so sign-out can be retried.
    pub async fn sign_out(&mut self) -> BackendResult<()> {
        let remote = match self.authorized().await {
            Ok(session) => self.backend.sign_out(&session).await,
            Err(e) => Err(e),
        };
        match remote {
            Ok(()) => {}
            Err(e) if e.is_session_invalid() => {
                tracing::debug!("session already ended on the backend: {e}");
            }
            Err(e) => return Err(e),
        }
        if let Err(e) = self.vault.clear() {
            tracing::warn!("Failed to clear stored session: {e}");
        }
        if let Some(profile) = self.user.take() {
            tracing::info!(user_id = %profile.id, "signed_out");
        }
        self.session = None;
        Ok(())
    }

    /// Current session, refreshed first when its token has expired
    pub async fn authorized(&mut self) -> BackendResult<AuthSession> {
        let session = self.session.as_ref().ok_or(BackendError::NotSignedIn)?;
        if !session.is_expired() {
            return Ok(session.clone());
        }

        let renewed = self
            .backend
            .refresh(&session.refresh_token)
            .await
            .map_err(|e| match e {
                // A refused refresh token means the session is gone
                BackendError::Auth { .. } => BackendError::Unauthorized,
                other => other,
            })?;
        if let Err(e) = self.vault.save(&renewed) {
            tracing::warn!("Failed to persist session: {e}");
        }
        tracing::info!(user_id = %renewed.user_id(), "token_refreshed");
        self.session = Some(renewed.clone());
        Ok(renewed)
    }

    /// Re-read the signed-in profile
    pub async fn refresh_profile(&mut self) -> BackendResult<&Profile> {
        let session = self.authorized().await?;
        let profile = self.backend.get_profile(&session, session.user_id()).await?;
        Ok(self.user.insert(profile))
    }
}
