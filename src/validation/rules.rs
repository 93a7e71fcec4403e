use crate::core::{Value, inspect_list};
use crate::field::AllowList;
use crate::record::Record;
use super::Errors;
use std::fmt;
use std::sync::Arc;

/// A single step of a record type's validation pipeline.
///
/// Rules never fail the pass; they append messages to `errors` and the
/// pipeline keeps going.
pub trait ValidationRule: Send + Sync {
    fn validate(&self, record: &Record, errors: &mut Errors);

    fn name(&self) -> &str {
        "custom"
    }
}

/// Adapts a closure into a rule.
pub struct FnRule<F> {
    name: String,
    rule: F,
}

impl<F> FnRule<F>
where
    F: Fn(&Record, &mut Errors) + Send + Sync,
{
    pub fn new(name: impl Into<String>, rule: F) -> Self {
        Self {
            name: name.into(),
            rule,
        }
    }
}

impl<F> ValidationRule for FnRule<F>
where
    F: Fn(&Record, &mut Errors) + Send + Sync,
{
    fn validate(&self, record: &Record, errors: &mut Errors) {
        (self.rule)(record, errors)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish()
    }
}

/// Flags members of a set-of-values field that fall outside its allow-list.
///
/// This is the soft counterpart of the check `Record::add` performs: members
/// that bypassed `add` are reported here instead of raising.
#[derive(Debug, Clone)]
pub struct AllowListRule {
    field: String,
    allowed: Arc<AllowList>,
}

impl AllowListRule {
    pub fn new(field: impl Into<String>, allowed: Arc<AllowList>) -> Self {
        Self {
            field: field.into(),
            allowed,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl ValidationRule for AllowListRule {
    fn validate(&self, record: &Record, errors: &mut Errors) {
        let current = match record.peek_field(&self.field) {
            Ok(value) => value,
            Err(err) => {
                errors.add(self.field.as_str(), format!("is unreadable: {}", err));
                return;
            }
        };

        match current.as_set() {
            Some(members) => {
                let offending = self.allowed.offending(members);
                if !offending.is_empty() {
                    errors.add(
                        self.field.as_str(),
                        format!("is invalid with {}", inspect_list(offending)),
                    );
                }
            }
            None => errors.add(
                self.field.as_str(),
                format!("must be a set, found {}", current.type_name()),
            ),
        }
    }

    fn name(&self) -> &str {
        "allow_list"
    }
}

/// Checks that an attribute's value is one of an enumerated list.
///
/// Works against any attribute `Record::read_attribute` resolves, which makes
/// it the natural companion of mapping sub-key accessors.
#[derive(Debug, Clone)]
pub struct InclusionRule {
    attribute: String,
    allowed: Vec<Value>,
    allow_null: bool,
}

impl InclusionRule {
    pub fn new<I, V>(attribute: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            attribute: attribute.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
            allow_null: false,
        }
    }

    /// Accept an unset attribute.
    pub fn allow_null(mut self) -> Self {
        self.allow_null = true;
        self
    }
}

impl ValidationRule for InclusionRule {
    fn validate(&self, record: &Record, errors: &mut Errors) {
        match record.read_attribute(&self.attribute) {
            Ok(value) if value.is_null() && self.allow_null => {}
            Ok(value) if self.allowed.contains(&value) => {}
            Ok(_) => errors.add(self.attribute.as_str(), "is not included in the list"),
            Err(err) => errors.add(self.attribute.as_str(), format!("is unreadable: {}", err)),
        }
    }

    fn name(&self) -> &str {
        "inclusion"
    }
}
