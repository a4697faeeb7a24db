//! Conversation domain model.

use super::message::Message;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to new and cleared conversations.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Number of characters of the first user message kept in a derived title.
pub const TITLE_MAX_CHARS: usize = 30;

/// A titled, ordered thread of messages owned by one user.
///
/// Serialized with camelCase keys; the persisted collection mixes the
/// conversations of every user and is partitioned by `userId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation identifier (UUID format)
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Messages in append order
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Refreshed whenever `messages` changes
    pub last_updated: DateTime<Utc>,
    /// Free-text context forwarded with every request in this thread
    #[serde(default)]
    pub meta_information: String,
    /// Owning user; storage partition key
    pub user_id: String,
}

impl Conversation {
    /// Creates an empty conversation owned by `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            last_updated: Utc::now(),
            meta_information: String::new(),
            user_id: user_id.into(),
        }
    }

    /// True for a conversation nobody has written to yet.
    pub fn is_blank(&self) -> bool {
        self.messages.is_empty() && self.title == DEFAULT_TITLE
    }

    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    /// Serializes the messages as pretty-printed JSON for export.
    pub fn export_messages_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.messages)?)
    }
}

/// Derives a conversation title from the first user message.
///
/// Keeps the first [`TITLE_MAX_CHARS`] characters and appends `...` when
/// anything was cut. Counts characters, not bytes.
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Resolves a user-supplied title, falling back to the default when blank.
pub fn normalize_title(title: &str) -> String {
    if title.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_short_message_kept_verbatim() {
        assert_eq!(derive_title("Hello world"), "Hello world");
    }

    #[test]
    fn test_derive_title_exactly_thirty_chars_not_truncated() {
        let content = "a".repeat(30);
        assert_eq!(derive_title(&content), content);
    }

    #[test]
    fn test_derive_title_long_message_truncated() {
        let content = "What are the VSME reporting duties for SMEs?";
        let content = format!("{content}!");
        assert_eq!(content.chars().count(), 45);
        assert_eq!(derive_title(&content), "What are the VSME reporting du...");
    }

    #[test]
    fn test_derive_title_counts_characters_not_bytes() {
        let content = "ü".repeat(31);
        let title = derive_title(&content);
        assert_eq!(title, format!("{}...", "ü".repeat(30)));
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title(""), DEFAULT_TITLE);
        assert_eq!(normalize_title("   \t"), DEFAULT_TITLE);
        assert_eq!(normalize_title(" Taxonomy "), " Taxonomy ");
    }

    #[test]
    fn test_conversation_serializes_camel_case() {
        let conversation = Conversation::new("test1");
        let value = serde_json::to_value(&conversation).unwrap();
        assert_eq!(value["userId"], "test1");
        assert_eq!(value["metaInformation"], "");
        assert!(value.get("lastUpdated").is_some());
        assert!(conversation.is_blank());
    }
}
