use crate::core::Value;
use crate::field::ValueKind;

/// How `allowed_values` arrived: as a real sequence, or as something that is
/// not one (only reachable through configuration documents).
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AllowedValues {
    Members(Vec<Value>),
    Malformed(String),
}

/// Options accepted by [`RecordType::store_field`](super::RecordType::store_field).
///
/// # Examples
///
/// ```
/// use storefield::{FieldOptions, Value, ValueKind};
///
/// let options = FieldOptions::new()
///     .target_attribute("storage")
///     .kind(ValueKind::Set)
///     .allowed_values([Value::symbol("welcome"), Value::symbol("balance_low")]);
/// assert_eq!(options.value_kind_name(), Some("set-of-values"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    pub(crate) target_attribute: Option<String>,
    pub(crate) value_kind: Option<String>,
    pub(crate) allowed_values: Option<AllowedValues>,
    pub(crate) sub_keys: Option<Vec<String>>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a set-of-values field.
    pub fn set() -> Self {
        Self::new().kind(ValueKind::Set)
    }

    /// Name the store attribute explicitly
    pub fn target_attribute(mut self, store: impl Into<String>) -> Self {
        self.target_attribute = Some(store.into());
        self
    }

    /// Value kind by name, as it appears in configuration. Unknown names are
    /// rejected when the field is declared.
    pub fn value_kind(mut self, kind: impl Into<String>) -> Self {
        self.value_kind = Some(kind.into());
        self
    }

    pub fn kind(self, kind: ValueKind) -> Self {
        self.value_kind(kind.as_str())
    }

    pub fn allowed_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed_values = Some(AllowedValues::Members(
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn sub_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn allowed_values_json(mut self, json: &serde_json::Value) -> Self {
        self.allowed_values = Some(match json {
            serde_json::Value::Array(items) => {
                AllowedValues::Members(items.iter().map(Value::from_config_json).collect())
            }
            other => AllowedValues::Malformed(format!("expected a list, found {}", other)),
        });
        self
    }

    pub fn target_attribute_name(&self) -> Option<&str> {
        self.target_attribute.as_deref()
    }

    pub fn value_kind_name(&self) -> Option<&str> {
        self.value_kind.as_deref()
    }
}
