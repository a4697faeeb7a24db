use aika_core::storage::KeyValueStore;
use aika_core::{AikaError, Result};
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local key-value store. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AikaError {
    AikaError::storage("In-memory store lock poisoned")
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let store = InMemoryKeyValueStore::new();
        store.set("uploadedFiles", "[]").unwrap();
        assert_eq!(store.get("uploadedFiles").unwrap().as_deref(), Some("[]"));
        store.remove("uploadedFiles").unwrap();
        assert!(store.get("uploadedFiles").unwrap().is_none());
    }
}
