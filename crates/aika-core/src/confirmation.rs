//! Two-phase confirmation for destructive actions.
//!
//! Destructive operations (clearing a conversation, clearing all
//! conversations, logging out) are split into a *request* step that hands
//! back an [`Intent`] and a *confirm* step that consumes it. The component
//! that issued the intent owns an [`IntentSlot`] remembering the one intent
//! it is waiting on, so a stale or foreign intent cannot be replayed.
//! How the user is asked is entirely up to the front end.

use crate::error::{AikaError, Result};
use uuid::Uuid;

/// An action that must be confirmed before it takes effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmableAction {
    /// Empty the messages of one conversation and reset its title.
    ClearCurrent { conversation_id: String },
    /// Discard every conversation of the active user.
    ClearAll,
    /// Forget the signed-in identity.
    Logout,
}

impl ConfirmableAction {
    /// Question to put to the user.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::ClearCurrent { .. } => "Are you sure you want to clear the current conversation?",
            Self::ClearAll => "Are you sure you want to clear all conversations?",
            Self::Logout => "Are you sure you want to logout?",
        }
    }
}

/// A pending request for a destructive action.
///
/// Intents are deliberately not `Clone`: confirming or declining consumes
/// them, so each one can be acted upon at most once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an intent has no effect until it is confirmed or declined"]
pub struct Intent {
    id: Uuid,
    action: ConfirmableAction,
}

impl Intent {
    fn new(action: ConfirmableAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn action(&self) -> &ConfirmableAction {
        &self.action
    }

    pub fn prompt(&self) -> &'static str {
        self.action.prompt()
    }
}

/// Remembers the single outstanding intent of a component.
///
/// Issuing a new intent supersedes the previous one.
#[derive(Debug, Default)]
pub struct IntentSlot {
    pending: Option<Uuid>,
}

impl IntentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new intent for `action`, replacing any outstanding one.
    pub fn issue(&mut self, action: ConfirmableAction) -> Intent {
        let intent = Intent::new(action);
        self.pending = Some(intent.id);
        intent
    }

    /// Consumes `intent` and returns its action if it is the outstanding one.
    ///
    /// # Errors
    ///
    /// Returns [`AikaError::InvalidIntent`] if `intent` was superseded,
    /// already redeemed, or issued by another slot.
    pub fn redeem(&mut self, intent: Intent) -> Result<ConfirmableAction> {
        if self.pending != Some(intent.id) {
            return Err(AikaError::InvalidIntent);
        }
        self.pending = None;
        Ok(intent.action)
    }

    /// Drops `intent` without acting on it.
    pub fn discard(&mut self, intent: Intent) {
        if self.pending == Some(intent.id) {
            self.pending = None;
        }
    }

    /// Forgets any outstanding intent.
    pub fn reset(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
