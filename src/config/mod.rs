pub mod definition;
pub mod storage;

pub use definition::{FieldDefinition, TypeDefinition};
pub use storage::StorageConfig;
