//! Key-value storage port.
//!
//! The client keeps all of its local state (conversations, uploaded file
//! records, the signed-in identity) as JSON strings under a handful of
//! well-known keys. This module defines the port those components write
//! through, so the backing store can be swapped (in-memory for tests, a
//! directory of files for the CLI).

use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Key under which all users' conversations are stored.
pub const CONVERSATIONS_KEY: &str = "conversations";
/// Key under which uploaded file records are stored.
pub const UPLOADED_FILES_KEY: &str = "uploadedFiles";
/// Key under which the signed-in identity claim is stored.
pub const IDENTITY_KEY: &str = "aika_user";

/// A string-keyed, string-valued persistent store.
///
/// # Implementation Notes
///
/// Implementations are shared behind `Arc` and may be called from several
/// components; they must tolerate interleaved calls but are not required to
/// provide any transactional guarantee across keys. Read-merge-write cycles
/// performed by callers are last-write-wins.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Reads `key` and deserializes it as JSON.
///
/// A missing key yields `Ok(None)`. A present but unparseable value is
/// logged and also yields `Ok(None)`: corrupt local state is treated as no
/// prior state rather than a fatal error. Only failures of the store itself
/// are returned as errors.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring unparseable stored value");
            Ok(None)
        }
    }
}

/// Serializes `value` as JSON and stores it under `key`.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
