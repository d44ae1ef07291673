//! Sign-in / sign-up view

use crate::error::BackendResult;
use crate::models::Profile;
use crate::session::SessionStore;

use super::{FormError, required};

/// Which form the auth view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    SignUp,
}

impl AuthMode {
    pub const fn heading(&self) -> &'static str {
        match self {
            Self::Login => "Welcome Back",
            Self::SignUp => "Create Account",
        }
    }

    pub const fn submit_label(&self) -> &'static str {
        match self {
            Self::Login => "Sign In",
            Self::SignUp => "Create Account",
        }
    }

    pub const fn switch_hint(&self) -> &'static str {
        match self {
            Self::Login => "Don't have an account? Sign up",
            Self::SignUp => "Already have an account? Sign in",
        }
    }
}

/// Input field of the auth form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthField {
    Username,
    #[default]
    Email,
    Password,
}

impl AuthField {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Username => "Username",
            Self::Email => "Email",
            Self::Password => "Password",
        }
    }
}

/// Credentials ready to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Login {
        email: String,
        password: String,
    },
    SignUp {
        email: String,
        password: String,
        username: String,
    },
}

/// Auth form state with its inline error
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub focus: AuthField,
    pub email: String,
    pub password: String,
    pub username: String,
    pub error: Option<String>,
    /// Waiting for the backend
    pub submitting: bool,
}

impl AuthForm {
    /// Fields shown in the current mode, top to bottom
    pub const fn fields(&self) -> &'static [AuthField] {
        match self.mode {
            AuthMode::Login => &[AuthField::Email, AuthField::Password],
            AuthMode::SignUp => &[AuthField::Username, AuthField::Email, AuthField::Password],
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::Login,
        };
        self.error = None;
        self.focus = self.fields()[0];
    }

    pub fn focus_next(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + 1) % fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + fields.len() - 1) % fields.len()];
    }

    /// Text of the focused field
    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            AuthField::Username => &mut self.username,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    /// Validate and extract credentials
    pub fn credentials(&self) -> Result<Credentials, FormError> {
        let email = required(&self.email, "email")?;
        if self.password.is_empty() {
            return Err(FormError::Required("password"));
        }
        let password = self.password.clone();
        match self.mode {
            AuthMode::Login => Ok(Credentials::Login { email, password }),
            AuthMode::SignUp => Ok(Credentials::SignUp {
                email,
                password,
                username: required(&self.username, "username")?,
            }),
        }
    }

    /// Show a failure inline and keep what was typed, minus the password
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.password.clear();
        self.submitting = false;
    }
}

/// Sign in or sign up with the given credentials
pub async fn submit(store: &mut SessionStore, credentials: &Credentials) -> BackendResult<Profile> {
    let profile = match credentials {
        Credentials::Login { email, password } => store.sign_in(email, password).await?,
        Credentials::SignUp {
            email,
            password,
            username,
        } => store.sign_up(email, password, username).await?,
    };
    Ok(profile.clone())
}
