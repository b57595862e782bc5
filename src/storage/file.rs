//! File-backed storage medium.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::debug;

use super::Storage;
use crate::error::Result;

/// Key/value medium persisted as one JSON object in a file.
///
/// The whole map is loaded on open and rewritten on every mutation via a
/// temporary file and rename, so a failed write leaves both the file and the
/// in-memory view as they were.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens the medium at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items: BTreeMap<String, String> = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), items = items.len(), "opened file storage");

        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file written before the rename, `<file name>.tmp`.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<()> {
        let text = serde_json::to_string(items)?;
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, text)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write();
        let previous = items.insert(key.to_string(), value.to_string());

        if let Err(err) = self.persist(&items) {
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.write();
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };

        if let Err(err) = self.persist(&items) {
            items.insert(key.to_string(), previous);
            return Err(err);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("store.json")).unwrap();

        assert!(storage.keys().is_empty());
        assert_eq!(storage.get_item("anything"), None);
    }

    #[test]
    fn test_items_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let storage = FileStorage::open(&path).unwrap();
            storage.set_item("a", "1").unwrap();
            storage.set_item("b", "2").unwrap();
            storage.remove_item("a").unwrap();
        }

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("a"), None);
        assert_eq!(reopened.get_item("b"), Some("2".to_string()));
        assert_eq!(reopened.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn test_corrupt_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let result = FileStorage::open(&path);
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_failed_write_leaves_items_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone").join("store.json");
        // Parent directory does not exist, so every persist fails
        let storage = FileStorage::open(&path).unwrap();

        let result = storage.set_item("a", "1");

        assert!(matches!(result, Err(CacheError::Io(_))));
        assert_eq!(storage.get_item("a"), None);
    }

    #[test]
    fn test_media_in_one_directory_use_distinct_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let json = FileStorage::open(dir.path().join("a.json")).unwrap();
        let txt = FileStorage::open(dir.path().join("a.txt")).unwrap();

        assert_eq!(json.tmp_path(), dir.path().join("a.json.tmp"));
        assert_ne!(json.tmp_path(), txt.tmp_path());

        json.set_item("k", "json").unwrap();
        txt.set_item("k", "txt").unwrap();

        let json = FileStorage::open(dir.path().join("a.json")).unwrap();
        let txt = FileStorage::open(dir.path().join("a.txt")).unwrap();
        assert_eq!(json.get_item("k"), Some("json".to_string()));
        assert_eq!(txt.get_item("k"), Some("txt".to_string()));
    }
}
