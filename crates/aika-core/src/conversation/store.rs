use super::message::{Message, MessageRole};
use super::model::{Conversation, DEFAULT_TITLE, derive_title, normalize_title};
use crate::confirmation::{ConfirmableAction, Intent, IntentSlot};
use crate::error::{AikaError, Result};
use crate::storage::{CONVERSATIONS_KEY, KeyValueStore, load_json, save_json};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// Owns the conversations of the signed-in user.
///
/// `ConversationStore` is responsible for:
/// - Hydrating the user's conversations from the key-value store
/// - Tracking which conversation is current
/// - Applying every mutation and writing it back
/// - Guaranteeing the active user never ends up with zero conversations
///
/// The persisted collection under [`CONVERSATIONS_KEY`] holds the
/// conversations of *all* users. Every write-back reloads it, replaces the
/// active user's partition and keeps every other entry as raw JSON, so data
/// of other users is never touched.
///
/// Nothing is written until [`activate`](Self::activate) has finished
/// hydrating, and the active user is only recorded once hydration succeeds.
pub struct ConversationStore {
    storage: Arc<dyn KeyValueStore>,
    /// Active user; `Some` only after hydration completed
    user_id: Option<String>,
    /// In-memory set, most recent first
    conversations: Vec<Conversation>,
    current_id: Option<String>,
    intents: IntentSlot,
}

impl ConversationStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            user_id: None,
            conversations: Vec::new(),
            current_id: None,
            intents: IntentSlot::new(),
        }
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    /// Hydrates the conversations of `user_id` and makes them the active set.
    ///
    /// Selects the first stored conversation, or synthesizes one empty
    /// conversation when the user has none. Activating the already active
    /// user again is a no-op; activating another user replaces the set.
    ///
    /// # Errors
    ///
    /// Returns an error if the key-value store itself fails. Corrupt stored
    /// JSON is not an error; it is treated as no prior state.
    pub fn activate(&mut self, user_id: &str) -> Result<()> {
        if self.user_id.as_deref() == Some(user_id) {
            tracing::debug!(user_id, "Conversation store already active for user");
            return Ok(());
        }
        if self.user_id.is_some() {
            self.deactivate();
        }

        let stored = self.load_partition(user_id)?;
        if stored.is_empty() {
            let conversation = Conversation::new(user_id);
            self.current_id = Some(conversation.id.clone());
            self.conversations = vec![conversation];
            tracing::info!(user_id, "No stored conversations, created an empty one");
        } else {
            self.current_id = stored.first().map(|c| c.id.clone());
            tracing::info!(user_id, count = stored.len(), "Restored conversations");
            self.conversations = stored;
        }

        self.user_id = Some(user_id.to_string());
        self.persist()
    }

    /// Drops the in-memory set without writing anything.
    pub fn deactivate(&mut self) {
        if let Some(user_id) = self.user_id.take() {
            tracing::debug!(user_id, "Deactivating conversation store");
        }
        self.conversations.clear();
        self.current_id = None;
        self.intents.reset();
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn active_user(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn current(&self) -> Option<&Conversation> {
        self.current_id.as_deref().and_then(|id| self.get(id))
    }

    // ============================================================================
    // Operations
    // ============================================================================

    /// Creates an empty conversation at the front of the list and selects it.
    ///
    /// Returns `Ok(None)` when no user is active; callers treat this as
    /// "cannot proceed".
    pub fn create(&mut self) -> Result<Option<String>> {
        let Some(user_id) = self.user_id.clone() else {
            return Ok(None);
        };
        let id = self.insert_blank(&user_id);
        self.persist()?;
        Ok(Some(id))
    }

    /// Selects a blank conversation if one exists, otherwise creates one.
    pub fn start_new_chat(&mut self) -> Result<Option<String>> {
        if let Some(id) = self
            .conversations
            .iter()
            .find(|c| c.is_blank())
            .map(|c| c.id.clone())
        {
            self.current_id = Some(id.clone());
            return Ok(Some(id));
        }
        self.create()
    }

    /// Makes `id` the current conversation. Returns false if it is unknown.
    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            tracing::debug!(conversation_id = id, "Ignoring selection of unknown conversation");
            return false;
        }
        self.current_id = Some(id.to_string());
        true
    }

    /// Removes a conversation.
    ///
    /// If it was current, the first remaining conversation becomes current;
    /// if none remain, a fresh empty one is created. Unknown ids are ignored.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let Some(user_id) = self.user_id.clone() else {
            return Ok(());
        };

        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            return Ok(());
        }

        if self.conversations.is_empty() {
            self.insert_blank(&user_id);
        } else if self.current_id.as_deref() == Some(id) {
            self.current_id = self.conversations.first().map(|c| c.id.clone());
        }

        self.persist()
    }

    /// Appends `message` to a conversation and refreshes its timestamp.
    ///
    /// The first user message of a conversation still carrying the default
    /// title also names the conversation.
    pub fn append_message(&mut self, conversation_id: &str, mut message: Message) -> Result<()> {
        let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        else {
            tracing::debug!(conversation_id, "Dropping message for unknown conversation");
            return Ok(());
        };

        if message.normalize_enrichment() {
            tracing::warn!(
                role = %message.role,
                "Dropped response enrichment from a non-assistant message"
            );
        }

        if conversation.messages.is_empty()
            && message.role == MessageRole::User
            && conversation.has_default_title()
        {
            conversation.title = derive_title(&message.content);
        }

        conversation.messages.push(message);
        conversation.last_updated = Utc::now();
        self.persist()
    }

    /// Sets a conversation's title; blank input restores the default title.
    pub fn update_title(&mut self, conversation_id: &str, title: &str) -> Result<()> {
        let Some(conversation) = self.get_mut(conversation_id) else {
            return Ok(());
        };
        conversation.title = normalize_title(title);
        self.persist()
    }

    /// Replaces a conversation's meta-information verbatim.
    pub fn update_meta_information(&mut self, conversation_id: &str, meta_information: &str) -> Result<()> {
        let Some(conversation) = self.get_mut(conversation_id) else {
            return Ok(());
        };
        conversation.meta_information = meta_information.to_string();
        self.persist()
    }

    // ============================================================================
    // Destructive operations (two-phase)
    // ============================================================================

    /// Asks to clear the current conversation. `None` if there is none.
    pub fn request_clear_current(&mut self) -> Option<Intent> {
        let conversation_id = self.current_id.clone()?;
        Some(
            self.intents
                .issue(ConfirmableAction::ClearCurrent { conversation_id }),
        )
    }

    /// Asks to clear every conversation. `None` if no user is active.
    pub fn request_clear_all(&mut self) -> Option<Intent> {
        self.user_id.as_ref()?;
        Some(self.intents.issue(ConfirmableAction::ClearAll))
    }

    /// Carries out a previously requested destructive action.
    ///
    /// # Errors
    ///
    /// Returns [`AikaError::InvalidIntent`] for intents this store did not
    /// issue or that were superseded, plus any storage error.
    pub fn confirm(&mut self, intent: Intent) -> Result<()> {
        match self.intents.redeem(intent)? {
            ConfirmableAction::ClearCurrent { conversation_id } => {
                let Some(conversation) = self.get_mut(&conversation_id) else {
                    return Ok(());
                };
                conversation.messages.clear();
                conversation.title = DEFAULT_TITLE.to_string();
                conversation.last_updated = Utc::now();
                tracing::info!(conversation_id, "Cleared conversation");
            }
            ConfirmableAction::ClearAll => {
                let Some(user_id) = self.user_id.clone() else {
                    return Ok(());
                };
                self.conversations.clear();
                self.insert_blank(&user_id);
                tracing::info!(user_id, "Cleared all conversations");
            }
            ConfirmableAction::Logout => return Err(AikaError::InvalidIntent),
        }
        self.persist()
    }

    /// Drops a requested destructive action without applying it.
    pub fn decline(&mut self, intent: Intent) {
        self.intents.discard(intent);
    }

    // ============================================================================
    // Internals
    // ============================================================================

    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    fn insert_blank(&mut self, user_id: &str) -> String {
        let conversation = Conversation::new(user_id);
        let id = conversation.id.clone();
        self.conversations.insert(0, conversation);
        self.current_id = Some(id.clone());
        id
    }

    fn load_all(&self) -> Result<Vec<Value>> {
        Ok(load_json::<Vec<Value>>(self.storage.as_ref(), CONVERSATIONS_KEY)?.unwrap_or_default())
    }

    fn load_partition(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let conversations = self
            .load_all()?
            .into_iter()
            .filter(|entry| owner_of(entry) == Some(user_id))
            .filter_map(|entry| match serde_json::from_value::<Conversation>(entry) {
                Ok(conversation) => Some(conversation),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Skipping unreadable stored conversation");
                    None
                }
            })
            .collect();
        Ok(conversations)
    }

    /// Read-merge-write of the shared collection.
    fn persist(&self) -> Result<()> {
        let Some(user_id) = self.user_id.as_deref() else {
            return Ok(());
        };

        let mut all = self.load_all()?;
        all.retain(|entry| owner_of(entry) != Some(user_id));
        for conversation in &self.conversations {
            all.push(serde_json::to_value(conversation)?);
        }

        save_json(self.storage.as_ref(), CONVERSATIONS_KEY, &all)?;
        tracing::debug!(user_id, count = self.conversations.len(), "Persisted conversations");
        Ok(())
    }
}

fn owner_of(entry: &Value) -> Option<&str> {
    entry.get("userId").and_then(Value::as_str)
}
