use crate::storage::StoreCodec;
use std::path::{Path, PathBuf};

/// Record table configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Encoding of store attributes inside persisted rows
    pub codec: StoreCodec,

    /// Snapshot file backing the table (memory only when unset)
    pub snapshot_path: Option<PathBuf>,

    /// Write a snapshot after every successful save
    pub checkpoint_on_save: bool,

    /// Run the validation pipeline before saving
    pub validate_on_save: bool,
}

impl StorageConfig {
    /// In-memory table with JSON-encoded stores
    pub fn new() -> Self {
        Self {
            codec: StoreCodec::Json,
            snapshot_path: None,
            checkpoint_on_save: false,
            validate_on_save: true,
        }
    }

    /// Set the store codec
    pub fn codec(mut self, codec: StoreCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Back the table with a snapshot file
    pub fn snapshot_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.snapshot_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Checkpoint after each save
    pub fn checkpoint_on_save(mut self, enabled: bool) -> Self {
        self.checkpoint_on_save = enabled;
        self
    }

    /// Skip validation on save
    pub fn skip_validation(mut self) -> Self {
        self.validate_on_save = false;
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new()
    }
}
