//! Field declarations: the per-field strategy objects a record type keeps in
//! its field table.

use crate::core::{ConfigError, Result, StoreFieldError, Value, ValueMap, ValueSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Shape of the value a field keeps under its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    #[default]
    Mapping,
    Set,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mapping => "mapping-value",
            Self::Set => "set-of-values",
        }
    }

    /// Fresh default written into the store on first read.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Mapping => Value::empty_map(),
            Self::Set => Value::empty_set(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Mapping => "MAP",
            Self::Set => "SET",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mapping-value" | "mapping" | "map" | "hash" => Ok(Self::Mapping),
            "set-of-values" | "set" => Ok(Self::Set),
            _ => Err(ConfigError::InvalidValueKind(s.to_string())),
        }
    }
}

/// Permitted members of a set-of-values field, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    members: Vec<Value>,
    lookup: ValueSet,
}

impl AllowList {
    /// Repeated members collapse into one lookup entry.
    pub fn new(members: Vec<Value>) -> Self {
        let lookup = members.iter().cloned().collect();
        Self { members, lookup }
    }

    pub fn permits(&self, value: &Value) -> bool {
        self.lookup.contains(value)
    }

    pub fn members(&self) -> &[Value] {
        &self.members
    }

    /// Members of `set` that are not permitted.
    pub fn offending<'a>(&self, set: &'a ValueSet) -> Vec<&'a Value> {
        set.iter().filter(|member| !self.permits(member)).collect()
    }
}

/// Mutation strategy for set-of-values fields.
#[derive(Debug, Clone, Default)]
pub struct SetStrategy {
    allowed: Option<Arc<AllowList>>,
}

impl SetStrategy {
    pub fn new(allowed: Option<AllowList>) -> Self {
        Self {
            allowed: allowed.map(Arc::new),
        }
    }

    pub fn allowed(&self) -> Option<&Arc<AllowList>> {
        self.allowed.as_ref()
    }

    /// Inserts `value`, or fails without touching `set` when the allow-list
    /// rejects it.
    pub fn add(&self, field: &str, set: &mut ValueSet, value: Value) -> Result<()> {
        if let Some(allowed) = &self.allowed {
            if !allowed.permits(&value) {
                return Err(StoreFieldError::DisallowedValue {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
        set.insert(value);
        Ok(())
    }

    pub fn remove(&self, set: &mut ValueSet, value: &Value) {
        set.remove(value);
    }
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Mapping { sub_keys: Vec<String> },
    Set(SetStrategy),
}

impl FieldKind {
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::Mapping { .. } => ValueKind::Mapping,
            Self::Set(_) => ValueKind::Set,
        }
    }
}

/// Immutable configuration of one declared field.
#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    name: String,
    store: String,
    kind: FieldKind,
}

impl FieldDeclaration {
    pub(crate) fn new(name: String, store: String, kind: FieldKind) -> Self {
        Self { name, store, kind }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store attribute the field lives in.
    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn value_kind(&self) -> ValueKind {
        self.kind.value_kind()
    }

    pub fn default_value(&self) -> Value {
        self.value_kind().default_value()
    }

    pub fn sub_keys(&self) -> &[String] {
        match &self.kind {
            FieldKind::Mapping { sub_keys } => sub_keys,
            FieldKind::Set(_) => &[],
        }
    }

    pub fn allowed_values(&self) -> Option<&[Value]> {
        match &self.kind {
            FieldKind::Set(strategy) => strategy.allowed().map(|list| list.members()),
            FieldKind::Mapping { .. } => None,
        }
    }

    pub(crate) fn set_strategy(&self) -> Result<&SetStrategy> {
        match &self.kind {
            FieldKind::Set(strategy) => Ok(strategy),
            FieldKind::Mapping { .. } => Err(self.wrong_kind(ValueKind::Set)),
        }
    }

    pub(crate) fn wrong_kind(&self, expected: ValueKind) -> StoreFieldError {
        StoreFieldError::WrongFieldKind {
            field: self.name.clone(),
            expected: expected.as_str(),
            actual: self.value_kind().as_str(),
        }
    }

    /// Checks a stored value has this field's shape.
    pub(crate) fn check_shape(&self, value: &Value) -> Result<()> {
        let matches = match self.value_kind() {
            ValueKind::Mapping => value.as_map().is_some(),
            ValueKind::Set => value.as_set().is_some(),
        };
        if matches {
            Ok(())
        } else {
            Err(self.mismatch(value))
        }
    }

    pub(crate) fn mismatch(&self, found: &Value) -> StoreFieldError {
        StoreFieldError::FieldTypeMismatch {
            field: self.name.clone(),
            expected: self.value_kind().type_name(),
            found: found.type_name(),
        }
    }

    /// Returns the value under the field's key, inserting the default first
    /// when the key is absent.
    pub(crate) fn read_or_init<'a>(&self, store: &'a mut ValueMap) -> &'a mut Value {
        store
            .entry(self.name.clone())
            .or_insert_with(|| self.default_value())
    }
}
