use super::atomic::write_atomic;
use aika_core::storage::KeyValueStore;
use aika_core::{AikaError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Directory-backed key-value store.
///
/// Each key is one `<key>.json` file in the store directory. Writes are
/// atomic (temporary file + rename) and serialized within the process.
/// Nothing coordinates several processes sharing a directory; the last
/// write wins.
#[derive(Debug)]
pub struct FileKeyValueStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Opens (and creates if needed) the store at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "Opened file key-value store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AikaError::validation(format!("Invalid storage key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AikaError::storage("Write lock poisoned"))?;
        write_atomic(&path, value.as_bytes())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AikaError::storage("Write lock poisoned"))?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aika_core::storage::CONVERSATIONS_KEY;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::open(temp_dir.path().join("storage")).unwrap();

        assert_eq!(store.get(CONVERSATIONS_KEY).unwrap(), None);
        store.set(CONVERSATIONS_KEY, "[]").unwrap();
        assert_eq!(store.get(CONVERSATIONS_KEY).unwrap().as_deref(), Some("[]"));
        assert!(store.dir().join("conversations.json").exists());

        store.remove(CONVERSATIONS_KEY).unwrap();
        store.remove(CONVERSATIONS_KEY).unwrap();
        assert_eq!(store.get(CONVERSATIONS_KEY).unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        FileKeyValueStore::open(temp_dir.path())
            .unwrap()
            .set("aika_user", r#"{"username":"test1"}"#)
            .unwrap();

        let reopened = FileKeyValueStore::open(temp_dir.path()).unwrap();
        assert_eq!(
            reopened.get("aika_user").unwrap().as_deref(),
            Some(r#"{"username":"test1"}"#)
        );
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::open(temp_dir.path()).unwrap();

        let err = store.set("../escape", "x").unwrap_err();
        assert!(err.is_validation());
        assert!(store.get("").is_err());
    }

    #[test]
    fn test_two_stores_writing_one_key_concurrently() {
        let temp_dir = TempDir::new().unwrap();
        let first = FileKeyValueStore::open(temp_dir.path()).unwrap();
        let second = FileKeyValueStore::open(temp_dir.path()).unwrap();
        let body = |owner: &str| {
            let entries: Vec<String> = (0..2000)
                .map(|i| format!(r#"{{"id":"{owner}-{i}","userId":"{owner}"}}"#))
                .collect();
            format!("[{}]", entries.join(","))
        };
        let (first_body, second_body) = (body("test1"), body("Amernaj"));

        std::thread::scope(|scope| {
            let a = scope.spawn(|| {
                (0..30).try_for_each(|_| first.set(CONVERSATIONS_KEY, &first_body))
            });
            let b = scope.spawn(|| {
                (0..30).try_for_each(|_| second.set(CONVERSATIONS_KEY, &second_body))
            });
            a.join().unwrap().unwrap();
            b.join().unwrap().unwrap();
        });

        let stored = first.get(CONVERSATIONS_KEY).unwrap().unwrap();
        assert!(stored == first_body || stored == second_body);
        let files = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(files, 1);
    }
}
