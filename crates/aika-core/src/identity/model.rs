//! Identity domain models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A username/password pair as typed by the user.
///
/// Only ever handed to an [`IdentityVerifier`](super::IdentityVerifier);
/// never persisted. `Debug` output redacts the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// True when either field is empty or only whitespace.
    ///
    /// Only this check looks past whitespace; verification compares the
    /// fields exactly as typed.
    pub fn is_incomplete(&self) -> bool {
        self.username.trim().is_empty() || self.password.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The persisted identity claim of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Login name; also the conversation partition key
    pub username: String,
    /// Name shown in the UI
    pub display_name: String,
}

impl Identity {
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
        }
    }
}

/// Why a login attempt did not succeed. `Display` yields the user-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoginFailure {
    #[error("Please enter both username and password")]
    MissingFields,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("An error occurred during login")]
    Unexpected,
}

/// Result of [`SessionGate::login`](super::SessionGate::login).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(Identity),
    Rejected(LoginFailure),
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
