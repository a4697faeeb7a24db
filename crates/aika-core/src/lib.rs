//! Domain layer of the AIKA chat client.
//!
//! Holds the conversation store, the session gate, the ports the outer
//! layers implement (`KeyValueStore`, `IdentityVerifier`, `AikaBackend`)
//! and small presentation helpers.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod confirmation;
pub mod conversation;
pub mod document;
pub mod error;
pub mod identity;
pub mod render;
pub mod storage;

// Re-export common error type
pub use error::{AikaError, Result};
