// ============================================================================
// storefield Library
// ============================================================================

pub mod core;
pub mod config;
pub mod field;
pub mod record;
pub mod schema;
pub mod storage;
pub mod validation;
pub mod prelude;

// Re-export main types for convenience
pub use crate::core::{ConfigError, Result, StoreFieldError, Value, ValueMap, ValueSet};
pub use crate::config::{StorageConfig, TypeDefinition};
pub use crate::field::{FieldDeclaration, ValueKind};
pub use crate::record::Record;
pub use crate::schema::{FieldOptions, RecordType};
pub use crate::storage::{RecordTable, StoreCodec};
pub use crate::validation::{Errors, InclusionRule, ValidationRule};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_use() {
        let mut user = RecordType::new("User");
        user.store("storage").unwrap();
        user.store_field("preference", FieldOptions::new()).unwrap();
        user.store_field("notified", FieldOptions::set()).unwrap();
        let user = user.finish();

        let mut record = Record::new(&user);
        assert_eq!(*record.field("preference").unwrap(), Value::empty_map());
        record.add("notified", Value::symbol("welcome")).unwrap();

        let mut table = RecordTable::in_memory();
        assert!(record.save(&mut table).unwrap());
        let reloaded = table.find(&user, record.id()).unwrap();
        assert!(reloaded.contains("notified", &Value::symbol("welcome")).unwrap());
    }
}
