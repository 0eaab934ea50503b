//! Key/value settings persistence
//!
//! The repository only needs typed read/write by string key. Values travel
//! as `serde_json::Value` so the trait stays object safe; the typed helpers
//! do the (de)serialization.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub trait SettingsStore {
    /// Raw value stored under `key`, if any
    fn read_value(&self, key: &str) -> Result<Option<Value>>;

    fn save_value(&mut self, key: &str, value: Value) -> Result<()>;

    /// Read and deserialize the value under `key`.
    /// A stored JSON `null` reads as `None`.
    fn read_setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>
    where
        Self: Sized,
    {
        match self.read_value(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .with_context(|| format!("Failed to deserialize setting '{key}'")),
        }
    }

    fn save_setting<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        let value = serde_json::to_value(value)
            .with_context(|| format!("Failed to serialize setting '{key}'"))?;
        self.save_value(key, value)
    }
}

/// All settings in one pretty-printed JSON object on disk
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonSettingsStore {
    /// Open the settings file, treating a missing file as empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let values = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            if contents.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse settings JSON from {}", path.display()))?
            }
        } else {
            debug!(path = %path.display(), "Settings file not found, starting empty");
            Map::new()
        };

        info!(path = %path.display(), keys = values.len(), "Opened settings store");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.values)
            .context("Failed to serialize settings to JSON")?;
        atomic_write(&self.path, json.as_bytes())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn read_value(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    /// Memory only changes once the file write has succeeded
    fn save_value(&mut self, key: &str, value: Value) -> Result<()> {
        let previous = self.values.insert(key.to_string(), value);
        if let Err(e) = self.persist() {
            match previous {
                Some(previous) => self.values.insert(key.to_string(), previous),
                None => self.values.remove(key),
            };
            return Err(e.context(format!("Failed to save setting '{key}'")));
        }
        Ok(())
    }
}

/// Settings kept in memory only, for embedders that persist elsewhere and for tests
#[derive(Debug, Default, Clone)]
pub struct MemorySettingsStore {
    values: Map<String, Value>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn read_value(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn save_value(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Write data to a file atomically using temp-file + rename.
fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target.parent().context("Settings path has no parent")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create settings directory {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    tmp.write_all(data).context("Failed to write temp file")?;
    tmp.persist(target)
        .with_context(|| format!("Failed to persist settings to {}", target.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::open(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.read_setting::<String>("anything").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut store = JsonSettingsStore::open(&path).unwrap();
        store.save_setting("names", &vec!["a", "b"]).unwrap();
        store.save_setting("count", &3u32).unwrap();

        let reopened = JsonSettingsStore::open(&path).unwrap();
        assert_eq!(
            reopened.read_setting::<Vec<String>>("names").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(reopened.read_setting::<u32>("count").unwrap(), Some(3));
    }

    #[test]
    fn test_failed_write_keeps_memory_in_step_with_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = JsonSettingsStore::open(&path).unwrap();
        store.save_setting("kept", &1u32).unwrap();

        // a directory at the target path makes the rename fail
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(store.save_setting("kept", &2u32).is_err());
        assert!(store.save_setting("added", &3u32).is_err());
        assert_eq!(store.read_setting::<u32>("kept").unwrap(), Some(1));
        assert_eq!(store.read_setting::<u32>("added").unwrap(), None);
    }

    #[test]
    fn test_null_reads_as_none() {
        let mut store = MemorySettingsStore::new();
        store.save_setting::<Option<String>>("active", &None).unwrap();
        assert_eq!(store.read_setting::<String>("active").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(JsonSettingsStore::open(&path).is_err());
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let mut store = MemorySettingsStore::new();
        store.save_setting("count", &"three").unwrap();
        assert!(store.read_setting::<u32>("count").is_err());
    }
}
