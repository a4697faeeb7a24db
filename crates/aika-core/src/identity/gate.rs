use super::model::{Credentials, Identity, LoginFailure, LoginOutcome};
use super::verifier::IdentityVerifier;
use crate::confirmation::{ConfirmableAction, Intent, IntentSlot};
use crate::error::{AikaError, Result};
use crate::storage::{IDENTITY_KEY, KeyValueStore, load_json, save_json};
use std::sync::Arc;

/// Owns the signed-in identity and guards access to the rest of the client.
///
/// The identity claim is persisted under [`IDENTITY_KEY`] after a successful
/// login and trusted as-is by [`restore`](Self::restore) on the next start.
/// There is no expiry; the claim lives until logout.
pub struct SessionGate {
    storage: Arc<dyn KeyValueStore>,
    verifier: Arc<dyn IdentityVerifier>,
    identity: Option<Identity>,
    intents: IntentSlot,
}

impl SessionGate {
    pub fn new(storage: Arc<dyn KeyValueStore>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            storage,
            verifier,
            identity: None,
            intents: IntentSlot::new(),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Restores a previously persisted identity claim.
    ///
    /// A missing or unreadable claim leaves the gate unauthenticated.
    pub fn restore(&mut self) -> Option<&Identity> {
        match load_json::<Identity>(self.storage.as_ref(), IDENTITY_KEY) {
            Ok(Some(identity)) => {
                tracing::info!(username = %identity.username, "Restored signed-in user");
                self.identity = Some(identity);
            }
            Ok(None) => {
                tracing::debug!("No stored identity");
                self.identity = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored identity");
                self.identity = None;
            }
        }
        self.identity.as_ref()
    }

    /// Attempts to sign in with `credentials`.
    ///
    /// Incomplete credentials are rejected without consulting the verifier.
    /// Verifier and storage failures are reported as
    /// [`LoginFailure::Unexpected`] and leave the gate unchanged.
    pub async fn login(&mut self, credentials: &Credentials) -> LoginOutcome {
        if credentials.is_incomplete() {
            return LoginOutcome::Rejected(LoginFailure::MissingFields);
        }

        let verdict = self.verifier.verify(credentials).await;

        match verdict {
            Ok(Some(identity)) => {
                if let Err(e) = save_json(self.storage.as_ref(), IDENTITY_KEY, &identity) {
                    tracing::warn!(error = %e, "Failed to persist identity");
                    return LoginOutcome::Rejected(LoginFailure::Unexpected);
                }
                tracing::info!(username = %identity.username, "User signed in");
                self.identity = Some(identity.clone());
                LoginOutcome::Authenticated(identity)
            }
            Ok(None) => {
                tracing::info!(username = %credentials.username, "Rejected login");
                LoginOutcome::Rejected(LoginFailure::InvalidCredentials)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Identity verification failed");
                LoginOutcome::Rejected(LoginFailure::Unexpected)
            }
        }
    }

    /// Asks to sign out. `None` when nobody is signed in.
    pub fn request_logout(&mut self) -> Option<Intent> {
        self.identity.as_ref()?;
        Some(self.intents.issue(ConfirmableAction::Logout))
    }

    /// Signs out: forgets the identity and removes the persisted claim.
    ///
    /// # Errors
    ///
    /// Returns [`AikaError::InvalidIntent`] for stale or foreign intents. A
    /// failure to remove the stored claim is returned after the in-memory
    /// identity has already been cleared.
    pub fn confirm_logout(&mut self, intent: Intent) -> Result<()> {
        match self.intents.redeem(intent)? {
            ConfirmableAction::Logout => {}
            _ => return Err(AikaError::InvalidIntent),
        }

        if let Some(identity) = self.identity.take() {
            tracing::info!(username = %identity.username, "User signed out");
        }
        self.storage.remove(IDENTITY_KEY)
    }

    pub fn decline_logout(&mut self, intent: Intent) {
        self.intents.discard(intent);
    }
}
