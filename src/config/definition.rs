//! JSON documents describing record types.
//!
//! ```json
//! {
//!   "name": "User",
//!   "columns": ["email"],
//!   "stores": ["storage"],
//!   "fields": [
//!     { "name": "preference", "sub_keys": ["theme"] },
//!     { "name": "notified", "value_kind": "set", "allowed_values": ["welcome"] }
//!   ]
//! }
//! ```
//!
//! Strings inside `allowed_values` are read as symbols.

use crate::core::{ConfigError, Result};
use crate::schema::{FieldOptions, RecordType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default)]
    pub target_attribute: Option<String>,
    #[serde(default)]
    pub value_kind: Option<String>,
    #[serde(default)]
    pub allowed_values: Option<serde_json::Value>,
    #[serde(default)]
    pub sub_keys: Option<Vec<String>>,
}

impl FieldDefinition {
    pub fn options(&self) -> FieldOptions {
        let mut options = FieldOptions::new();
        if let Some(target) = &self.target_attribute {
            options = options.target_attribute(target.as_str());
        }
        if let Some(kind) = &self.value_kind {
            options = options.value_kind(kind.as_str());
        }
        if let Some(allowed) = &self.allowed_values {
            options = options.allowed_values_json(allowed);
        }
        if let Some(sub_keys) = &self.sub_keys {
            options = options.sub_keys(sub_keys.iter().cloned());
        }
        options
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDefinition {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub stores: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl TypeDefinition {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ConfigError::InvalidDefinition(e.to_string()).into())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Declares columns, then stores, then fields in document order.
    pub fn build(&self) -> Result<RecordType> {
        let mut ty = RecordType::new(self.name.as_str());
        for column in &self.columns {
            ty.column(column)?;
        }
        for store in &self.stores {
            ty.store(store)?;
        }
        for field in &self.fields {
            ty.store_field(&field.name, field.options())?;
        }
        Ok(ty)
    }
}
