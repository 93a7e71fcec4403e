use crate::config::StorageConfig;
use crate::core::{Result, StoreFieldError, ValueMap};
use crate::record::Record;
use crate::schema::RecordType;
use super::persistence::{SnapshotManager, StoredRow, TableSnapshot};
use chrono::Utc;
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Rows of persisted records, keyed by record id.
///
/// Each store attribute is encoded into an opaque blob with the configured
/// [`StoreCodec`](super::StoreCodec); columns are stored as plain values.
pub struct RecordTable {
    config: StorageConfig,
    rows: BTreeMap<String, StoredRow>,
    snapshot: Option<SnapshotManager>,
}

impl RecordTable {
    /// Empty table. Nothing is read from disk even when a snapshot path is
    /// configured; see [`RecordTable::open`].
    pub fn new(config: StorageConfig) -> Self {
        let snapshot = config.snapshot_path.as_ref().map(SnapshotManager::new);
        Self {
            config,
            rows: BTreeMap::new(),
            snapshot,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(StorageConfig::new())
    }

    /// Table recovered from its snapshot file, if one exists.
    ///
    /// Blobs keep the codec they were written with; they are re-encoded when
    /// the configured codec differs.
    pub fn open(config: StorageConfig) -> Result<Self> {
        let mut table = Self::new(config);
        let loaded = match &table.snapshot {
            Some(manager) => manager.load()?,
            None => None,
        };

        if let Some(snapshot) = loaded {
            let mut rows = snapshot.rows;
            if snapshot.codec != table.config.codec {
                for row in rows.values_mut() {
                    for blob in row.stores.values_mut() {
                        let store = snapshot.codec.decode(blob)?;
                        *blob = table.config.codec.encode(&store)?;
                    }
                }
            }
            info!("Recovered {} rows from snapshot", rows.len());
            table.rows = rows;
        }
        Ok(table)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    pub fn row(&self, id: &str) -> Option<&StoredRow> {
        self.rows.get(id)
    }

    /// Validates (unless disabled) and writes the record. Returns `false`
    /// and writes nothing when the record is invalid.
    pub fn save(&mut self, record: &mut Record) -> Result<bool> {
        if self.config.validate_on_save && !record.validate() {
            debug!(
                "Record {} not saved: {}",
                record.id(),
                record.errors()
            );
            return Ok(false);
        }

        let row = self.encode(record)?;
        let previous = self.rows.insert(row.id.clone(), row);

        if self.config.checkpoint_on_save {
            if let Err(err) = self.checkpoint() {
                match previous {
                    Some(previous) => self.rows.insert(previous.id.clone(), previous),
                    None => self.rows.remove(record.id()),
                };
                return Err(err);
            }
        }

        record.mark_persisted();
        debug!("Saved record {} ({})", record.id(), record.record_type().name());
        Ok(true)
    }

    pub fn save_strict(&mut self, record: &mut Record) -> Result<()> {
        if self.save(record)? {
            Ok(())
        } else {
            Err(StoreFieldError::RecordInvalid(record.errors().to_string()))
        }
    }

    pub fn find(&self, record_type: &Arc<RecordType>, id: &str) -> Result<Record> {
        let row = self.fetch(record_type, id)?;
        let (columns, stores) = self.decode(row)?;
        Ok(Record::from_parts(record_type, row.id.clone(), columns, stores))
    }

    /// Replaces the record's in-memory state with the persisted row.
    pub fn reload(&self, record: &mut Record) -> Result<()> {
        let row = self.fetch(record.record_type(), record.id())?;
        let (columns, stores) = self.decode(row)?;
        record.replace_state(columns, stores);
        record.mark_persisted();
        debug!("Reloaded record {}", record.id());
        Ok(())
    }

    /// Removes a row. Returns whether it existed.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let existed = self.rows.remove(id).is_some();
        if existed && self.config.checkpoint_on_save {
            self.checkpoint()?;
        }
        Ok(existed)
    }

    /// All records of one type.
    pub fn all(&self, record_type: &Arc<RecordType>) -> Result<Vec<Record>> {
        self.rows
            .values()
            .filter(|row| row.type_name == record_type.name())
            .map(|row| {
                let (columns, stores) = self.decode(row)?;
                Ok(Record::from_parts(record_type, row.id.clone(), columns, stores))
            })
            .collect()
    }

    /// Writes the whole table to its snapshot file. A no-op for memory-only
    /// tables.
    pub fn checkpoint(&self) -> Result<()> {
        if let Some(manager) = &self.snapshot {
            let snapshot = TableSnapshot::new(self.config.codec, self.rows.clone());
            manager.save(&snapshot)?;
            info!(
                "Checkpointed {} rows to {}",
                self.rows.len(),
                manager.path().display()
            );
        }
        Ok(())
    }

    fn fetch(&self, record_type: &RecordType, id: &str) -> Result<&StoredRow> {
        self.rows
            .get(id)
            .filter(|row| row.type_name == record_type.name())
            .ok_or_else(|| StoreFieldError::RecordNotFound(id.to_string()))
    }

    fn encode(&self, record: &Record) -> Result<StoredRow> {
        let stores = record
            .stores()
            .iter()
            .map(|(name, store)| Ok((name.clone(), self.config.codec.encode(store)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(StoredRow {
            id: record.id().to_string(),
            type_name: record.record_type().name().to_string(),
            columns: record.columns().clone(),
            stores,
            updated_at: Utc::now(),
        })
    }

    fn decode(&self, row: &StoredRow) -> Result<(ValueMap, BTreeMap<String, ValueMap>)> {
        let stores = row
            .stores
            .iter()
            .map(|(name, blob)| Ok((name.clone(), self.config.codec.decode(blob)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok((row.columns.clone(), stores))
    }
}
