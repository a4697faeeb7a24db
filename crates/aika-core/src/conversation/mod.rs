//! Conversation domain module.
//!
//! # Module Structure
//!
//! - `message`: Message types (`Message`, `MessageRole`, `SourceChunk`)
//! - `model`: The `Conversation` model and title rules
//! - `store`: `ConversationStore`, the per-user conversation set

mod message;
mod model;
mod store;

pub use message::{Message, MessageRole, ResponseEnrichment, SourceChunk};
pub use model::{Conversation, DEFAULT_TITLE, TITLE_MAX_CHARS, derive_title, normalize_title};
pub use store::ConversationStore;
