//! Record types: the host-side registry of column attributes, store
//! attributes, declared fields and validation rules.
//!
//! A type is assembled mutably during setup and then frozen with
//! [`RecordType::finish`]. Records created from the frozen type dispatch every
//! field access through its tables.

mod declarator;
mod options;

use crate::core::{ConfigError, Result, StoreFieldError};
use crate::field::FieldDeclaration;
use crate::record::Record;
use crate::validation::{Errors, FnRule, ValidationRule};
use tracing::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub(crate) use options::AllowedValues;
pub use options::FieldOptions;

/// Generated `"{field}_{sub_key}"` attribute of a mapping field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubKeyAccessor {
    pub field: String,
    pub sub_key: String,
}

struct RegisteredRule {
    /// Field whose declaration installed the rule.
    owner: Option<String>,
    rule: Arc<dyn ValidationRule>,
}

pub struct RecordType {
    name: String,
    columns: Vec<String>,
    stores: Vec<String>,
    fields: BTreeMap<String, Arc<FieldDeclaration>>,
    accessors: BTreeMap<String, SubKeyAccessor>,
    rules: Vec<RegisteredRule>,
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            stores: Vec::new(),
            fields: BTreeMap::new(),
            accessors: BTreeMap::new(),
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a plain column attribute.
    pub fn column(&mut self, name: &str) -> Result<&mut Self> {
        declarator::validate_name("column", name)?;
        self.ensure_free(name)?;
        self.columns.push(name.to_string());
        debug!(record_type = %self.name, column = name, "declared column");
        Ok(self)
    }

    /// Declare a serialized store attribute.
    pub fn store(&mut self, name: &str) -> Result<&mut Self> {
        declarator::validate_name("store attribute", name)?;
        self.ensure_free(name)?;
        self.stores.push(name.to_string());
        debug!(record_type = %self.name, store = name, "declared store attribute");
        Ok(self)
    }

    /// Declare a virtual field kept inside a store attribute.
    ///
    /// The declaration is all-or-nothing: on error nothing is registered.
    pub fn store_field(&mut self, name: &str, options: FieldOptions) -> Result<&mut Self> {
        declarator::declare_field(self, name, options)?;
        Ok(self)
    }

    /// Alias of [`RecordType::store_field`].
    pub fn declare_field(&mut self, name: &str, options: FieldOptions) -> Result<&mut Self> {
        self.store_field(name, options)
    }

    /// Append a rule to the validation pipeline.
    pub fn validate_with<R>(&mut self, rule: R) -> &mut Self
    where
        R: ValidationRule + 'static,
    {
        self.rules.push(RegisteredRule {
            owner: None,
            rule: Arc::new(rule),
        });
        self
    }

    /// Append a closure to the validation pipeline.
    pub fn validates<F>(&mut self, name: &str, rule: F) -> &mut Self
    where
        F: Fn(&Record, &mut Errors) + Send + Sync + 'static,
    {
        self.validate_with(FnRule::new(name, rule))
    }

    pub fn finish(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn is_store_attribute(&self, name: &str) -> bool {
        self.stores.iter().any(|store| store == name)
    }

    pub fn is_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Store attributes in declaration order.
    pub fn store_attributes(&self) -> &[String] {
        &self.stores
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn field(&self, name: &str) -> Result<&Arc<FieldDeclaration>> {
        self.fields
            .get(name)
            .ok_or_else(|| StoreFieldError::UnknownField(name.to_string()))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Arc<FieldDeclaration>> {
        self.fields.values()
    }

    pub fn sub_key_accessor(&self, name: &str) -> Option<&SubKeyAccessor> {
        self.accessors.get(name)
    }

    pub fn rules(&self) -> impl Iterator<Item = &Arc<dyn ValidationRule>> {
        self.rules.iter().map(|registered| &registered.rule)
    }

    /// Any attribute name: column, store, field or sub-key accessor.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.is_column(name)
            || self.is_store_attribute(name)
            || self.fields.contains_key(name)
            || self.accessors.contains_key(name)
    }

    fn ensure_free(&self, name: &str) -> Result<()> {
        if self.has_attribute(name) {
            return Err(ConfigError::DuplicateAttribute(name.to_string()).into());
        }
        Ok(())
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .field("stores", &self.stores)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("accessors", &self.accessors.keys().collect::<Vec<_>>())
            .field(
                "rules",
                &self.rules.iter().map(|r| r.rule.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::field::ValueKind;

    fn user_type() -> RecordType {
        let mut ty = RecordType::new("User");
        ty.column("email").unwrap().store("storage").unwrap();
        ty
    }

    #[test]
    fn test_field_before_store_is_rejected() {
        let mut ty = RecordType::new("User");
        let err = ty.store_field("notified", FieldOptions::set()).unwrap_err();
        assert_eq!(err.config(), Some(&ConfigError::StoreNotDeclared));
        assert!(!ty.has_field("notified"));

        ty.store("storage").unwrap();
        ty.store_field("notified", FieldOptions::set()).unwrap();
        assert_eq!(ty.field("notified").unwrap().store(), "storage");
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let mut ty = user_type();

        let err = ty
            .store_field("notified", FieldOptions::new().value_kind("file"))
            .unwrap_err();
        assert!(matches!(err.config(), Some(ConfigError::InvalidValueKind(_))));

        let err = ty
            .store_field("notified", FieldOptions::set().target_attribute("bogus"))
            .unwrap_err();
        assert!(matches!(err.config(), Some(ConfigError::InvalidTargetAttribute(_))));

        // A column exists but is not a store attribute.
        let err = ty
            .store_field("notified", FieldOptions::set().target_attribute("email"))
            .unwrap_err();
        assert!(matches!(err.config(), Some(ConfigError::InvalidTargetAttribute(_))));

        assert!(!ty.has_field("notified"));
    }

    #[test]
    fn test_allowed_values_accepts_any_list() {
        let mut ty = user_type();
        ty.store_field(
            "notified",
            FieldOptions::set().allowed_values([Value::symbol("a"), Value::symbol("a")]),
        )
        .unwrap();
        ty.store_field("muted", FieldOptions::set().allowed_values(Vec::<Value>::new()))
            .unwrap();
        ty.store_field(
            "preference",
            FieldOptions::new().allowed_values(Vec::<Value>::new()),
        )
        .unwrap();

        let preference = ty.field("preference").unwrap();
        assert_eq!(preference.value_kind(), ValueKind::Mapping);
        assert!(preference.allowed_values().is_none());
        assert_eq!(ty.rules().count(), 2);

        let ty = ty.finish();
        let mut record = Record::new(&ty);
        record.add("notified", Value::symbol("a")).unwrap();
        assert!(record.add("muted", Value::symbol("a")).is_err());

        record.set_field("muted").unwrap().insert(Value::symbol("a"));
        assert!(!record.validate());
        assert_eq!(record.errors().on("muted"), ["is invalid with [:a]".to_string()]);
        assert!(record.errors().on("notified").is_empty());
    }

    #[test]
    fn test_ambiguous_store_requires_target() {
        let mut ty = user_type();
        ty.store("settings").unwrap();

        let err = ty.store_field("preference", FieldOptions::new()).unwrap_err();
        assert!(matches!(err.config(), Some(ConfigError::AmbiguousStore(_))));

        ty.store_field("preference", FieldOptions::new().target_attribute("settings"))
            .unwrap();
        assert_eq!(ty.field("preference").unwrap().store(), "settings");
    }

    #[test]
    fn test_allow_list_registers_rule() {
        let mut ty = user_type();
        ty.store_field("displayed", FieldOptions::set()).unwrap();
        assert_eq!(ty.rules().count(), 0);

        ty.store_field(
            "notified",
            FieldOptions::set().allowed_values([Value::symbol("a"), Value::symbol("b")]),
        )
        .unwrap();
        assert_eq!(ty.rules().count(), 1);
        assert_eq!(
            ty.field("notified").unwrap().allowed_values(),
            Some(&[Value::symbol("a"), Value::symbol("b")][..])
        );
    }

    #[test]
    fn test_redeclaration_replaces_previous() {
        let mut ty = user_type();
        ty.store_field(
            "notified",
            FieldOptions::set().allowed_values([Value::symbol("a")]),
        )
        .unwrap();
        ty.store_field("notified", FieldOptions::new().sub_keys(["last"]))
            .unwrap();

        let decl = ty.field("notified").unwrap();
        assert_eq!(decl.value_kind(), ValueKind::Mapping);
        assert_eq!(ty.rules().count(), 0);
        assert!(ty.sub_key_accessor("notified_last").is_some());

        ty.store_field("notified", FieldOptions::set()).unwrap();
        assert!(ty.sub_key_accessor("notified_last").is_none());
    }

    #[test]
    fn test_sub_key_accessors_and_collisions() {
        let mut ty = user_type();
        ty.store_field("preference", FieldOptions::new().sub_keys(["theme", "locale"]))
            .unwrap();
        assert_eq!(
            ty.sub_key_accessor("preference_theme"),
            Some(&SubKeyAccessor {
                field: "preference".to_string(),
                sub_key: "theme".to_string(),
            })
        );

        ty.column("count_total").unwrap();
        let err = ty
            .store_field("count", FieldOptions::new().sub_keys(["total"]))
            .unwrap_err();
        assert_eq!(
            err.config(),
            Some(&ConfigError::DuplicateAttribute("count_total".to_string()))
        );
        assert!(!ty.has_field("count"));
    }

    #[test]
    fn test_duplicate_attribute_names() {
        let mut ty = user_type();
        assert!(ty.store("storage").is_err());
        assert!(ty.column("storage").is_err());
        assert!(ty.store_field("email", FieldOptions::new()).is_err());
    }
}
