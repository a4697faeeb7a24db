//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles, content, and the enrichment the backend attaches to
//! assistant answers (source citations, expanded queries, relevant links).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Represents the role of a message in a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Answer from the assistant.
    Assistant,
    /// Client-generated message describing a failed request.
    #[serde(alias = "system")]
    Error,
}

/// A retrieved document excerpt backing an assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceChunk {
    #[serde(default)]
    pub chunk_id: String,
    pub document_id: String,
    pub text: String,
    #[serde(default)]
    pub score: f64,
    /// Free-form provenance; usually carries `filename` and `page_number`.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl SourceChunk {
    /// Filename recorded in the metadata, if any.
    pub fn filename(&self) -> Option<&str> {
        self.metadata
            .get("filename")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Page number recorded in the metadata.
    ///
    /// The backend sends either a number or a numeric string.
    pub fn page_number(&self) -> Option<u32> {
        match self.metadata.get("page_number")? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Everything the backend attaches to an answer besides its text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnrichment {
    #[serde(default)]
    pub sources: Vec<SourceChunk>,
    #[serde(default)]
    pub expanded_queries: Vec<String>,
    #[serde(default)]
    pub relevant_links: Vec<String>,
}

impl ResponseEnrichment {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.expanded_queries.is_empty() && self.relevant_links.is_empty()
    }
}

/// A single message in a conversation.
///
/// Enrichment fields are only ever populated on assistant messages; use
/// [`Message::user`], [`Message::assistant`] and [`Message::error`] to build
/// messages that respect this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceChunk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expanded_queries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relevant_links: Vec<String>,
}

impl Message {
    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            sources: Vec::new(),
            expanded_queries: Vec::new(),
            relevant_links: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Error, content)
    }

    pub fn assistant(content: impl Into<String>, enrichment: ResponseEnrichment) -> Self {
        Self {
            sources: enrichment.sources,
            expanded_queries: enrichment.expanded_queries,
            relevant_links: enrichment.relevant_links,
            ..Self::plain(MessageRole::Assistant, content)
        }
    }

    pub fn has_enrichment(&self) -> bool {
        !(self.sources.is_empty() && self.expanded_queries.is_empty() && self.relevant_links.is_empty())
    }

    /// Drops enrichment from non-assistant messages. Returns true if anything was dropped.
    pub(crate) fn normalize_enrichment(&mut self) -> bool {
        if self.role == MessageRole::Assistant || !self.has_enrichment() {
            return false;
        }
        self.sources.clear();
        self.expanded_queries.clear();
        self.relevant_links.clear();
        true
    }
}
