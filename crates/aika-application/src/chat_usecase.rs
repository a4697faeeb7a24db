//! Chat use case.
//!
//! Sends a user message to the backend in the context of the current
//! conversation and records the answer (or the failure) in that same
//! conversation.

use aika_core::backend::{AikaBackend, ChatRequest};
use aika_core::config::ChatSettings;
use aika_core::conversation::{ConversationStore, Message};
use aika_core::{AikaError, Result};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Prefix of the error message recorded when a request fails.
pub const CHAT_ERROR_PREFIX: &str = "Sorry, there was an error processing your request";

/// Lowest and highest accepted sampling temperature.
pub const TEMPERATURE_RANGE: (f32, f32) = (0.0, 2.0);
/// Lowest and highest accepted number of retrieved chunks.
pub const TOP_K_RANGE: (u32, u32) = (1, 50);

/// Use case for exchanging messages with the backend.
///
/// # Concurrency
///
/// The store lock is held only while reading context and appending
/// messages, never while the backend request is in flight. Sends to
/// different conversations may therefore overlap; every answer is appended
/// to the conversation its question was sent from.
pub struct ChatUseCase {
    store: Arc<Mutex<ConversationStore>>,
    backend: Arc<dyn AikaBackend>,
    settings: RwLock<ChatSettings>,
}

impl ChatUseCase {
    pub fn new(
        store: Arc<Mutex<ConversationStore>>,
        backend: Arc<dyn AikaBackend>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            store,
            backend,
            settings: RwLock::new(settings),
        }
    }

    pub async fn settings(&self) -> ChatSettings {
        self.settings.read().await.clone()
    }

    pub async fn set_model(&self, model: &str) -> Result<()> {
        if !ChatSettings::is_known_model(model) {
            return Err(AikaError::validation(format!("Unknown model '{model}'")));
        }
        self.settings.write().await.model = model.to_string();
        Ok(())
    }

    pub async fn set_temperature(&self, temperature: f32) -> Result<()> {
        let (min, max) = TEMPERATURE_RANGE;
        if !(min..=max).contains(&temperature) {
            return Err(AikaError::validation(format!(
                "Temperature must be between {min} and {max}"
            )));
        }
        self.settings.write().await.temperature = temperature;
        Ok(())
    }

    pub async fn set_top_k(&self, top_k: u32) -> Result<()> {
        let (min, max) = TOP_K_RANGE;
        if !(min..=max).contains(&top_k) {
            return Err(AikaError::validation(format!(
                "Top-K must be between {min} and {max}"
            )));
        }
        self.settings.write().await.top_k = top_k;
        Ok(())
    }

    pub async fn set_industry_code(&self, code: &str) -> Result<()> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AikaError::validation("Industry code cannot be empty"));
        }
        self.settings.write().await.industry_code = code.to_string();
        Ok(())
    }

    /// Sends `content` from the current conversation.
    ///
    /// Creates a conversation first if none is current. Backend failures
    /// are not returned as errors: they are recorded as an error message
    /// in the conversation, which is also what this returns.
    ///
    /// # Errors
    ///
    /// - Validation error for blank input (nothing is recorded or sent)
    /// - Validation error when no user is signed in
    /// - Storage errors while recording messages
    pub async fn send_message(&self, content: &str) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(AikaError::validation("Message cannot be empty"));
        }

        let (conversation_id, history, meta_information) = {
            let mut store = self.store.lock().await;
            let conversation_id = match store.current_id() {
                Some(id) => id.to_string(),
                None => store
                    .create()?
                    .ok_or_else(|| AikaError::validation("No user is signed in"))?,
            };
            let (history, meta_information) = store
                .get(&conversation_id)
                .map(|c| (c.messages.clone(), c.meta_information.clone()))
                .unwrap_or_default();

            store.append_message(&conversation_id, Message::user(content))?;
            (conversation_id, history, meta_information)
        };

        let settings = self.settings().await;
        let request = ChatRequest::new(content, &history, &settings, meta_information);

        let reply = match self.backend.chat(&request).await {
            Ok(reply) => reply.into_message(),
            Err(e) => {
                tracing::warn!(conversation_id = %conversation_id, error = %e, "Chat request failed");
                Message::error(format!("{CHAT_ERROR_PREFIX}: {}", failure_reason(&e)))
            }
        };

        self.store
            .lock()
            .await
            .append_message(&conversation_id, reply.clone())?;
        Ok(reply)
    }
}

/// The part of an error worth showing to the user.
fn failure_reason(err: &AikaError) -> String {
    match err {
        AikaError::Backend { message, .. } => message.clone(),
        AikaError::Transport(message) => message.clone(),
        other => other.to_string(),
    }
}
