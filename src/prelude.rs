//! Everything needed to declare store fields and work with records.
//!
//! ```
//! use storefield::prelude::*;
//!
//! # fn main() -> storefield::Result<()> {
//! let mut user = RecordType::new("User");
//! user.store("storage")?;
//! user.store_field("notified", FieldOptions::set())?;
//! let user = user.finish();
//!
//! let mut record = Record::new(&user);
//! record.add("notified", Value::symbol("welcome"))?;
//! assert!(record.contains("notified", &Value::symbol("welcome"))?);
//! # Ok(())
//! # }
//! ```

pub use crate::core::{ConfigError, Result, StoreFieldError, Value, ValueMap, ValueSet};
pub use crate::config::{StorageConfig, TypeDefinition};
pub use crate::field::ValueKind;
pub use crate::record::Record;
pub use crate::schema::{FieldOptions, RecordType};
pub use crate::storage::{RecordTable, StoreCodec};
pub use crate::validation::{AllowListRule, Errors, FnRule, InclusionRule, ValidationRule};
