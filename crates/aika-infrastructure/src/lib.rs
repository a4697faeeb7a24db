//! Adapters for the AIKA client: storage, identity verification, paths and
//! configuration loading.

pub mod config_service;
pub mod paths;
pub mod static_verifier;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::paths::AikaPaths;
pub use crate::static_verifier::StaticCredentialVerifier;
pub use crate::storage::{FileKeyValueStore, InMemoryKeyValueStore};
