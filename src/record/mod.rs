//! Record instances.
//!
//! A record owns one [`ValueMap`] per store attribute of its type and one
//! value per column. Declared fields have no storage of their own: every
//! access goes through the field table of the record type into the store the
//! field was resolved to.

use crate::core::{Result, StoreFieldError, Value, ValueMap, ValueSet};
use crate::field::{FieldDeclaration, ValueKind};
use crate::schema::RecordType;
use crate::storage::RecordTable;
use crate::validation::Errors;
use uuid::Uuid;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Record {
    id: String,
    record_type: Arc<RecordType>,
    columns: ValueMap,
    stores: BTreeMap<String, ValueMap>,
    errors: Errors,
    persisted: bool,
}

impl Record {
    /// A fresh, unsaved record with empty stores and null columns.
    pub fn new(record_type: &Arc<RecordType>) -> Self {
        Self::with_id(record_type, Uuid::new_v4().to_string())
    }

    pub fn with_id(record_type: &Arc<RecordType>, id: impl Into<String>) -> Self {
        let columns = record_type
            .columns()
            .iter()
            .map(|column| (column.clone(), Value::Null))
            .collect();
        let stores = record_type
            .store_attributes()
            .iter()
            .map(|store| (store.clone(), ValueMap::new()))
            .collect();

        Self {
            id: id.into(),
            record_type: Arc::clone(record_type),
            columns,
            stores,
            errors: Errors::new(),
            persisted: false,
        }
    }

    /// Rebuilds a persisted record. Stores or columns missing from the
    /// persisted data start out empty.
    pub(crate) fn from_parts(
        record_type: &Arc<RecordType>,
        id: String,
        columns: ValueMap,
        stores: BTreeMap<String, ValueMap>,
    ) -> Self {
        let mut record = Self::with_id(record_type, id);
        record.replace_state(columns, stores);
        record.persisted = true;
        record
    }

    pub(crate) fn replace_state(&mut self, columns: ValueMap, stores: BTreeMap<String, ValueMap>) {
        for (name, value) in columns {
            if self.record_type.is_column(&name) {
                self.columns.insert(name, value);
            }
        }
        for (name, map) in stores {
            if self.record_type.is_store_attribute(&name) {
                self.stores.insert(name, map);
            }
        }
        self.errors.clear();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn is_new_record(&self) -> bool {
        !self.persisted
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    pub(crate) fn columns(&self) -> &ValueMap {
        &self.columns
    }

    pub(crate) fn stores(&self) -> &BTreeMap<String, ValueMap> {
        &self.stores
    }

    /// Raw mapping of a store attribute.
    pub fn store(&self, name: &str) -> Result<&ValueMap> {
        self.stores
            .get(name)
            .ok_or_else(|| StoreFieldError::UnknownAttribute(name.to_string()))
    }

    pub fn store_mut(&mut self, name: &str) -> Result<&mut ValueMap> {
        self.stores
            .get_mut(name)
            .ok_or_else(|| StoreFieldError::UnknownAttribute(name.to_string()))
    }

    fn declaration(&self, name: &str) -> Result<Arc<FieldDeclaration>> {
        self.record_type.field(name).map(Arc::clone)
    }

    fn slot(&mut self, decl: &FieldDeclaration) -> &mut Value {
        let store = self.stores.entry(decl.store().to_string()).or_default();
        decl.read_or_init(store)
    }

    fn map_slot(&mut self, decl: &FieldDeclaration) -> Result<&mut ValueMap> {
        if decl.value_kind() != ValueKind::Mapping {
            return Err(decl.wrong_kind(ValueKind::Mapping));
        }
        match self.slot(decl) {
            Value::Map(map) => Ok(map),
            other => Err(decl.mismatch(other)),
        }
    }

    fn set_slot(&mut self, decl: &FieldDeclaration) -> Result<&mut ValueSet> {
        if decl.value_kind() != ValueKind::Set {
            return Err(decl.wrong_kind(ValueKind::Set));
        }
        match self.slot(decl) {
            Value::Set(set) => Ok(set),
            other => Err(decl.mismatch(other)),
        }
    }

    /// Reads a declared field, writing the kind's empty default into the
    /// store first when the key is absent.
    pub fn field(&mut self, name: &str) -> Result<&mut Value> {
        let decl = self.declaration(name)?;
        Ok(self.slot(&decl))
    }

    /// Mapping-value field accessor.
    pub fn map_field(&mut self, name: &str) -> Result<&mut ValueMap> {
        let decl = self.declaration(name)?;
        self.map_slot(&decl)
    }

    /// Set-of-values field accessor. Mutating the returned set directly skips
    /// the allow-list check; the validation pass still reports such members.
    pub fn set_field(&mut self, name: &str) -> Result<&mut ValueSet> {
        let decl = self.declaration(name)?;
        self.set_slot(&decl)
    }

    /// Reads a field without initialising it: an absent key yields the kind's
    /// default and nothing is written.
    pub fn peek_field(&self, name: &str) -> Result<Cow<'_, Value>> {
        let decl = self.record_type.field(name)?;
        match self.stores.get(decl.store()).and_then(|store| store.get(name)) {
            Some(value) => Ok(Cow::Borrowed(value)),
            None => Ok(Cow::Owned(decl.default_value())),
        }
    }

    /// Inserts into a set field, refusing members outside its allow-list.
    pub fn add(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let decl = self.declaration(field)?;
        let strategy = decl.set_strategy()?;
        let set = self.set_slot(&decl)?;
        strategy.add(decl.name(), set, value.into())?;
        Ok(self)
    }

    /// Removes from a set field; removing an absent member is a no-op.
    pub fn remove(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let decl = self.declaration(field)?;
        let strategy = decl.set_strategy()?;
        let value = value.into();
        let set = self.set_slot(&decl)?;
        strategy.remove(set, &value);
        Ok(self)
    }

    pub fn contains(&self, field: &str, value: &Value) -> Result<bool> {
        let decl = self.record_type.field(field)?;
        decl.set_strategy()?;
        let current = self.peek_field(field)?;
        match current.as_set() {
            Some(set) => Ok(set.contains(value)),
            None => Err(decl.mismatch(&current)),
        }
    }

    pub fn not_contains(&self, field: &str, value: &Value) -> Result<bool> {
        self.contains(field, value).map(|present| !present)
    }

    /// Reads any attribute by name: column, store attribute, field or
    /// sub-key accessor. Never initialises anything.
    pub fn read_attribute(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.columns.get(name) {
            return Ok(value.clone());
        }
        if let Some(store) = self.stores.get(name) {
            return Ok(Value::Map(store.clone()));
        }
        if self.record_type.has_field(name) {
            return Ok(self.peek_field(name)?.into_owned());
        }
        if let Some(accessor) = self.record_type.sub_key_accessor(name) {
            let field = self.peek_field(&accessor.field)?;
            return Ok(field
                .as_map()
                .and_then(|map| map.get(&accessor.sub_key))
                .cloned()
                .unwrap_or(Value::Null));
        }
        Err(StoreFieldError::UnknownAttribute(name.to_string()))
    }

    /// Writes any attribute by name. Field and store values must have the
    /// right shape; sub-key writes initialise their field.
    pub fn write_attribute(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let value = value.into();

        if let Some(slot) = self.columns.get_mut(name) {
            *slot = value;
            return Ok(self);
        }

        if self.record_type.is_store_attribute(name) {
            return match value {
                Value::Map(map) => {
                    self.stores.insert(name.to_string(), map);
                    Ok(self)
                }
                other => Err(StoreFieldError::TypeMismatch(format!(
                    "store attribute '{}' expects MAP, got {}",
                    name,
                    other.type_name()
                ))),
            };
        }

        if self.record_type.has_field(name) {
            let decl = self.declaration(name)?;
            decl.check_shape(&value)?;
            *self.slot(&decl) = value;
            return Ok(self);
        }

        if let Some(accessor) = self.record_type.sub_key_accessor(name).cloned() {
            self.map_field(&accessor.field)?
                .insert(accessor.sub_key, value);
            return Ok(self);
        }

        Err(StoreFieldError::UnknownAttribute(name.to_string()))
    }

    /// Runs the type's validation pipeline, replacing previous errors.
    pub fn validate(&mut self) -> bool {
        let mut errors = Errors::new();
        for rule in self.record_type.rules() {
            rule.validate(self, &mut errors);
        }
        self.errors = errors;
        self.errors.is_empty()
    }

    pub fn is_valid(&mut self) -> bool {
        self.validate()
    }

    /// Errors from the last validation pass.
    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Validates and writes the record; `false` when validation failed.
    pub fn save(&mut self, table: &mut RecordTable) -> Result<bool> {
        table.save(self)
    }

    /// Like [`Record::save`] but an invalid record is an error.
    pub fn save_strict(&mut self, table: &mut RecordTable) -> Result<&mut Self> {
        table.save_strict(self)?;
        Ok(self)
    }

    /// Discards in-memory changes and reloads the persisted state.
    pub fn reload(&mut self, table: &RecordTable) -> Result<&mut Self> {
        table.reload(self)?;
        Ok(self)
    }
}
