use thiserror::Error;

/// Problems detected while declaring a record type.
///
/// Every variant is raised synchronously at declaration time; none of them is
/// ever produced lazily by a record instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`target_attribute` is invalid: '{0}' is not a store attribute")]
    InvalidTargetAttribute(String),

    #[error("`value_kind` is invalid: '{0}'")]
    InvalidValueKind(String),

    #[error("`allowed_values` is invalid: {0}")]
    InvalidAllowedValues(String),

    #[error("store attribute must be declared before declaring a field")]
    StoreNotDeclared,

    #[error("store attribute is ambiguous: {0} are declared, `target_attribute` must name one")]
    AmbiguousStore(String),

    #[error("Attribute '{0}' is already declared")]
    DuplicateAttribute(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid type definition: {0}")]
    InvalidDefinition(String),
}

#[derive(Error, Debug)]
pub enum StoreFieldError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Value {value} is not allowed for '{field}'")]
    DisallowedValue { field: String, value: String },

    #[error("Field '{0}' not found")]
    UnknownField(String),

    #[error("Attribute '{0}' not found")]
    UnknownAttribute(String),

    #[error("Field '{field}' is a {actual} field, not a {expected} field")]
    WrongFieldKind {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Field '{field}' holds {found}, expected {expected}")]
    FieldTypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Record is invalid: {0}")]
    RecordInvalid(String),

    #[error("Record '{0}' not found")]
    RecordNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl StoreFieldError {
    /// True for errors raised while declaring a type rather than while
    /// operating on a record.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub fn config(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreFieldError>;

impl From<std::io::Error> for StoreFieldError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for StoreFieldError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for StoreFieldError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StoreFieldError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_distinguishable() {
        let config: StoreFieldError = ConfigError::StoreNotDeclared.into();
        assert!(config.is_configuration());
        assert_eq!(config.config(), Some(&ConfigError::StoreNotDeclared));

        let runtime = StoreFieldError::DisallowedValue {
            field: "notified".to_string(),
            value: ":c".to_string(),
        };
        assert!(!runtime.is_configuration());
        assert!(runtime.config().is_none());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ConfigError::StoreNotDeclared.to_string(),
            "store attribute must be declared before declaring a field"
        );
        assert!(
            ConfigError::InvalidValueKind("file".to_string())
                .to_string()
                .starts_with("`value_kind` is invalid")
        );
        assert!(
            ConfigError::InvalidTargetAttribute("bogus".to_string())
                .to_string()
                .starts_with("`target_attribute` is invalid")
        );
    }
}
