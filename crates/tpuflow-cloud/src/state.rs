//! Local record store
//!
//! Manages the `cache.json` file which records every TPU VM this tool has
//! created and the zone it lives in. The file is the only persisted memory of
//! what the operator believes exists, so every write is an atomic replace.

use crate::error::{CloudError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const RECORD_FILE: &str = "cache.json";

/// What was created where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Accelerator type (e.g., "v5litepod-8")
    #[serde(rename = "type")]
    pub accelerator_type: String,

    pub zone: String,
}

impl InstanceRecord {
    pub fn new(accelerator_type: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            accelerator_type: accelerator_type.into(),
            zone: zone.into(),
        }
    }
}

/// Logical name -> record, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordTable {
    records: IndexMap<String, InstanceRecord>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&InstanceRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Add or replace a record. A replaced record keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, record: InstanceRecord) {
        self.records.insert(name.into(), record);
    }

    /// Remove a record, keeping the order of the others
    pub fn remove(&mut self, name: &str) -> Option<InstanceRecord> {
        self.records.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InstanceRecord)> {
        self.records.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads and writes the record table
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Store backed by `<dir>/cache.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(RECORD_FILE))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record table. A missing file is an empty table.
    pub async fn load(&self) -> Result<RecordTable> {
        if !self.path.exists() {
            tracing::debug!("Record file {} not found, starting empty", self.path.display());
            return Ok(RecordTable::new());
        }

        // Bytes, not a String: invalid UTF-8 is corruption too
        let content = fs::read(&self.path).await?;
        let table: RecordTable =
            serde_json::from_slice(&content).map_err(|e| CloudError::CorruptState {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Loaded {} records", table.len());
        Ok(table)
    }

    /// Atomically replace the record file
    pub async fn save(&self, table: &RecordTable) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).await?;
                tracing::debug!("Created state directory: {}", dir.display());
            }
        }

        let mut content = serde_json::to_string_pretty(table)?;
        content.push('\n');

        let tmp = self.tmp_path();
        fs::write(&tmp, content).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!("Saved {} records to {}", table.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| RECORD_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_empty_table_when_missing() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::in_dir(temp_dir.path());

        let table = store.load().await.unwrap();
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::in_dir(temp_dir.path().join("nested").join("state"));

        let mut table = RecordTable::new();
        table.insert("tpu-vm-us-east5-a", InstanceRecord::new("v5litepod-8", "us-east5-a"));
        store.save(&table).await.unwrap();

        assert!(store.path().exists());
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, table);
    }

    #[tokio::test]
    async fn test_save_load_is_byte_stable() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::in_dir(temp_dir.path());

        let mut table = RecordTable::new();
        table.insert("tpu-vm-b", InstanceRecord::new("v5litepod-8", "us-east5-b"));
        table.insert("tpu-vm-a", InstanceRecord::new("v4-8", "us-central2-b"));
        store.save(&table).await.unwrap();
        let first = std::fs::read(store.path()).unwrap();

        let loaded = store.load().await.unwrap();
        store.save(&loaded).await.unwrap();
        let second = std::fs::read(store.path()).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_insertion_order_preserved() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::in_dir(temp_dir.path());
        std::fs::write(
            store.path(),
            r#"{
  "tpu-vm-z": {"type": "v5litepod-8", "zone": "europe-west4-b"},
  "tpu-vm-a": {"type": "v5litepod-8", "zone": "us-east5-a"},
  "tpu-vm-m": {"zone": "us-west4-a", "type": "v5litepod-4"}
}"#,
        )
        .unwrap();

        let mut table = store.load().await.unwrap();
        let names: Vec<_> = table.names().cloned().collect();
        assert_eq!(names, vec!["tpu-vm-z", "tpu-vm-a", "tpu-vm-m"]);

        table.remove("tpu-vm-a");
        let names: Vec<_> = table.names().cloned().collect();
        assert_eq!(names, vec!["tpu-vm-z", "tpu-vm-m"]);
        assert_eq!(table.get("tpu-vm-m").unwrap().accelerator_type, "v5litepod-4");
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::in_dir(temp_dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CloudError::CorruptState { .. }));
        assert!(err.to_string().contains("cache.json"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_corrupt() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::in_dir(temp_dir.path());
        std::fs::write(
            store.path(),
            b"{\"tpu-vm-a\": {\"type\": \"\xff\", \"zone\": \"us-east5-a\"}}",
        )
        .unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CloudError::CorruptState { ref path, .. } if path == store.path()));
        assert!(err.to_string().contains("cache.json"));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_corrupt() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::in_dir(temp_dir.path());
        std::fs::write(store.path(), r#"["tpu-vm-a"]"#).unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, CloudError::CorruptState { .. }));
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let temp_dir = tempdir().unwrap();
        let store = RecordStore::in_dir(temp_dir.path());
        store.save(&RecordTable::new()).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(RECORD_FILE)]);
    }
}
