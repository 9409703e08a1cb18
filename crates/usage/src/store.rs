//! Durable storage for usage records
//!
//! Records are JSON text under fixed string keys, the same shape a browser
//! key-value store would hold.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::UsageError;

/// Key-value storage for serialized usage records
pub trait UsageStore: Send + Sync {
    /// Read the record stored under `key`
    fn read(&self, key: &str) -> Result<Option<String>, UsageError>;

    /// Replace the record stored under `key`
    fn write(&self, key: &str, json: &str) -> Result<(), UsageError>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}

/// Non-persistent store, mostly for tests and single-process use
#[derive(Default)]
pub struct MemoryUsageStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageStore for MemoryUsageStore {
    fn read(&self, key: &str) -> Result<Option<String>, UsageError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn write(&self, key: &str, json: &str) -> Result<(), UsageError> {
        self.records.write().insert(key.to_string(), json.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// One JSON file per key inside a directory
pub struct FileUsageStore {
    dir: PathBuf,
}

impl FileUsageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl UsageStore for FileUsageStore {
    fn read(&self, key: &str) -> Result<Option<String>, UsageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, json: &str) -> Result<(), UsageError> {
        fs::create_dir_all(&self.dir)?;

        // Write then rename so readers never see a partial record
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryUsageStore::new();
        assert!(store.read("k").unwrap().is_none());
        store.write("k", "{}").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileUsageStore::new(dir.path().join("usage"));

        assert!(store.read("maps.usage_stats").unwrap().is_none());
        store.write("maps.usage_stats", r#"{"a":1}"#).unwrap();
        store.write("maps.usage_stats", r#"{"a":2}"#).unwrap();
        assert_eq!(store.read("maps.usage_stats").unwrap().as_deref(), Some(r#"{"a":2}"#));

        assert!(dir.path().join("usage/maps.usage_stats.json").exists());
        assert!(!dir.path().join("usage/maps.usage_stats.json.tmp").exists());
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let store = FileUsageStore::new("/tmp/x");
        assert_eq!(store.path_for("../etc/passwd"), PathBuf::from("/tmp/x/.._etc_passwd.json"));
    }
}
