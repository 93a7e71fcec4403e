pub mod codec;
pub mod persistence;
pub mod table;

pub use codec::StoreCodec;
pub use persistence::{SnapshotManager, StoredRow, TableSnapshot};
pub use table::RecordTable;
