//! Backend port.
//!
//! [`AikaBackend`] is everything the client needs from the retrieval
//! backend: chat completion, knowledge-base document management and the
//! ÖNACE category listing. The HTTP implementation lives in
//! `aika-interaction`; tests substitute their own.

use crate::catalog::OnaceCategory;
use crate::config::ChatSettings;
use crate::conversation::{Message, MessageRole, ResponseEnrichment, SourceChunk};
use crate::document::DocumentCategory;
use crate::error::Result;
use crate::render;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A prior turn sent as context with a chat request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
}

/// Body of a chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub content: String,
    pub history: Vec<HistoryEntry>,
    pub model: String,
    pub temperature: f32,
    pub top_k: u32,
    pub meta_information: String,
    pub industry_code: String,
}

impl ChatRequest {
    /// Builds a request for `content` in the context of `history`.
    ///
    /// Client-side error messages are not part of the dialogue and are left
    /// out of the history.
    pub fn new(
        content: impl Into<String>,
        history: &[Message],
        settings: &ChatSettings,
        meta_information: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            history: history
                .iter()
                .filter(|m| m.role != MessageRole::Error)
                .map(|m| HistoryEntry {
                    role: m.role,
                    content: m.content.clone(),
                })
                .collect(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            top_k: settings.top_k,
            meta_information: meta_information.into(),
            industry_code: settings.industry_code.clone(),
        }
    }
}

/// Successful chat completion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub content: String,
    #[serde(default)]
    pub sources: Vec<SourceChunk>,
    #[serde(default)]
    pub expanded_queries: Vec<String>,
    #[serde(default)]
    pub relevant_links: Vec<String>,
}

impl ChatReply {
    pub fn into_message(self) -> Message {
        Message::assistant(
            self.content,
            ResponseEnrichment {
                sources: self.sources,
                expanded_queries: self.expanded_queries,
                relevant_links: self.relevant_links,
            },
        )
    }
}

/// A file to add to the knowledge base.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub category: DocumentCategory,
}

impl DocumentUpload {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[async_trait]
pub trait AikaBackend: Send + Sync {
    /// Base URL requests are sent to, without trailing slash.
    fn base_url(&self) -> &str;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply>;

    /// Uploads a document and returns the backend's document id.
    async fn upload_document(&self, upload: &DocumentUpload) -> Result<String>;

    async fn delete_document(&self, document_id: &str) -> Result<()>;

    async fn list_categories(&self) -> Result<Vec<OnaceCategory>>;

    /// Download URL of a document, optionally at a page.
    fn document_link(&self, document_id: &str, page: Option<u32>) -> String {
        render::document_link(self.base_url(), document_id, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_history_skips_error_messages() {
        let history = vec![
            Message::user("What is VSME?"),
            Message::error("Sorry, there was an error processing your request: timeout"),
            Message::assistant("VSME is ...", ResponseEnrichment::default()),
        ];
        let request = ChatRequest::new("And for banks?", &history, &ChatSettings::default(), "");

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["history"].as_array().unwrap().len(), 2);
        assert_eq!(body["history"][1]["role"], "assistant");
        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["top_k"], 5);
        assert_eq!(body["industry_code"], "0");
    }

    #[test]
    fn test_reply_without_enrichment() {
        let reply: ChatReply = serde_json::from_value(json!({"content": "Hi"})).unwrap();
        let message = reply.into_message();
        assert_eq!(message.role, MessageRole::Assistant);
        assert!(!message.has_enrichment());
    }
}
