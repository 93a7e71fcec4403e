//! Snapshot files for record tables

use crate::core::{Result, StoreFieldError, Value};
use super::StoreCodec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

/// One persisted record. Store attributes are kept as opaque blobs in the
/// table's codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: String,
    pub type_name: String,
    pub columns: BTreeMap<String, Value>,
    pub stores: BTreeMap<String, Vec<u8>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub version: u32,
    pub codec: StoreCodec,
    pub rows: BTreeMap<String, StoredRow>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub row_count: usize,
}

impl TableSnapshot {
    pub fn new(codec: StoreCodec, rows: BTreeMap<String, StoredRow>) -> Self {
        let row_count = rows.len();
        Self {
            version: SNAPSHOT_VERSION,
            codec,
            rows,
            metadata: SnapshotMetadata {
                created_at: Utc::now(),
                row_count,
            },
        }
    }
}

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Writes to a temp file next to the target, then renames over it.
    pub fn save(&self, snapshot: &TableSnapshot) -> Result<()> {
        let dir = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let serialized = rmp_serde::to_vec(snapshot)?;
        let temp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            writer.write_all(&serialized)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| StoreFieldError::IoError(format!("Failed to replace snapshot: {}", e)))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<TableSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let mut file = File::open(&self.snapshot_path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        let snapshot: TableSnapshot = rmp_serde::from_slice(&data)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreFieldError::Serialization(format!(
                "Unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(Some(snapshot))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }

    pub fn delete(&self) -> Result<()> {
        if self.snapshot_path.exists() {
            fs::remove_file(&self.snapshot_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(id: &str) -> StoredRow {
        StoredRow {
            id: id.to_string(),
            type_name: "User".to_string(),
            columns: BTreeMap::new(),
            stores: BTreeMap::from([("storage".to_string(), b"{}".to_vec())]),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(temp_dir.path().join("nested/users.snapshot"));
        assert!(manager.load().unwrap().is_none());

        let rows = BTreeMap::from([("u1".to_string(), row("u1"))]);
        manager.save(&TableSnapshot::new(StoreCodec::Json, rows)).unwrap();
        assert!(manager.exists());

        let loaded = manager.load().unwrap().unwrap();
        assert_eq!(loaded.metadata.row_count, 1);
        assert_eq!(loaded.codec, StoreCodec::Json);
        assert_eq!(loaded.rows["u1"].stores, row("u1").stores);

        manager.delete().unwrap();
        assert!(!manager.exists());
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(temp_dir.path().join("users.snapshot"));

        let first = BTreeMap::from([("u1".to_string(), row("u1")), ("u2".to_string(), row("u2"))]);
        manager.save(&TableSnapshot::new(StoreCodec::Json, first)).unwrap();
        let second = BTreeMap::from([("u3".to_string(), row("u3"))]);
        manager.save(&TableSnapshot::new(StoreCodec::MessagePack, second)).unwrap();

        let loaded = manager.load().unwrap().unwrap();
        assert_eq!(loaded.rows.len(), 1);
        assert!(loaded.rows.contains_key("u3"));
        assert_eq!(loaded.codec, StoreCodec::MessagePack);
    }
}
