//! Field declaration: validates options, resolves the backing store and
//! installs the field's strategy, sub-key accessors and allow-list rule on the
//! record type.

use crate::core::{ConfigError, Result};
use crate::field::{AllowList, FieldDeclaration, FieldKind, SetStrategy, ValueKind};
use crate::validation::AllowListRule;
use super::{AllowedValues, FieldOptions, RecordType, RegisteredRule, SubKeyAccessor};
use tracing::{debug, warn};
use std::sync::Arc;

pub(super) fn validate_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidName(format!("{} name must not be empty", what)).into());
    }
    Ok(())
}

/// Everything a declaration will install, computed before touching the type.
struct Plan {
    declaration: FieldDeclaration,
    accessors: Vec<(String, SubKeyAccessor)>,
    rule: Option<AllowListRule>,
}

pub(super) fn declare_field(ty: &mut RecordType, name: &str, options: FieldOptions) -> Result<()> {
    let plan = plan_field(ty, name, options)?;
    install(ty, plan);
    Ok(())
}

fn plan_field(ty: &RecordType, name: &str, options: FieldOptions) -> Result<Plan> {
    validate_name("field", name)?;

    if let Some(target) = options.target_attribute.as_deref() {
        if !ty.is_store_attribute(target) {
            return Err(ConfigError::InvalidTargetAttribute(target.to_string()).into());
        }
    }

    let kind = match options.value_kind.as_deref() {
        Some(kind) => kind.parse::<ValueKind>()?,
        None => ValueKind::default(),
    };

    let allowed_members = match options.allowed_values {
        Some(AllowedValues::Members(members)) => Some(members),
        Some(AllowedValues::Malformed(reason)) => {
            return Err(ConfigError::InvalidAllowedValues(reason).into());
        }
        None => None,
    };

    let store = resolve_store(ty, options.target_attribute)?;

    if !ty.fields.contains_key(name) && ty.has_attribute(name) {
        return Err(ConfigError::DuplicateAttribute(name.to_string()).into());
    }

    let (field_kind, accessors, rule) = match kind {
        ValueKind::Mapping => {
            if allowed_members.is_some() {
                warn!(
                    record_type = %ty.name,
                    field = name,
                    "`allowed_values` ignored on a mapping-value field"
                );
            }
            let sub_keys = options.sub_keys.unwrap_or_default();
            let accessors = plan_accessors(ty, name, &sub_keys)?;
            (FieldKind::Mapping { sub_keys }, accessors, None)
        }
        ValueKind::Set => {
            if options.sub_keys.as_ref().is_some_and(|keys| !keys.is_empty()) {
                warn!(
                    record_type = %ty.name,
                    field = name,
                    "`sub_keys` ignored on a set-of-values field"
                );
            }
            let strategy = SetStrategy::new(allowed_members.map(AllowList::new));
            let rule = strategy
                .allowed()
                .map(|allowed| AllowListRule::new(name, Arc::clone(allowed)));
            (FieldKind::Set(strategy), Vec::new(), rule)
        }
    };

    Ok(Plan {
        declaration: FieldDeclaration::new(name.to_string(), store, field_kind),
        accessors,
        rule,
    })
}

/// An explicit target was already checked; without one exactly one store
/// attribute must exist.
fn resolve_store(ty: &RecordType, target: Option<String>) -> Result<String> {
    if let Some(target) = target {
        return Ok(target);
    }
    match ty.stores.as_slice() {
        [] => Err(ConfigError::StoreNotDeclared.into()),
        [only] => Ok(only.clone()),
        many => Err(ConfigError::AmbiguousStore(many.join(", ")).into()),
    }
}

fn plan_accessors(
    ty: &RecordType,
    field: &str,
    sub_keys: &[String],
) -> Result<Vec<(String, SubKeyAccessor)>> {
    let mut planned: Vec<(String, SubKeyAccessor)> = Vec::with_capacity(sub_keys.len());

    for sub_key in sub_keys {
        validate_name("sub-key", sub_key)?;
        let accessor_name = format!("{}_{}", field, sub_key);

        let owned_by_field = ty
            .accessors
            .get(&accessor_name)
            .is_some_and(|existing| existing.field == field);
        let taken = (ty.has_attribute(&accessor_name) && !owned_by_field)
            || planned.iter().any(|(planned_name, _)| *planned_name == accessor_name);
        if taken {
            return Err(ConfigError::DuplicateAttribute(accessor_name).into());
        }

        planned.push((
            accessor_name,
            SubKeyAccessor {
                field: field.to_string(),
                sub_key: sub_key.clone(),
            },
        ));
    }

    Ok(planned)
}

fn install(ty: &mut RecordType, plan: Plan) {
    let name = plan.declaration.name().to_string();

    if ty.fields.contains_key(&name) {
        debug!(record_type = %ty.name, field = %name, "redeclaring field");
        ty.accessors.retain(|_, accessor| accessor.field != name);
        ty.rules
            .retain(|registered| registered.owner.as_deref() != Some(name.as_str()));
    }

    for (accessor_name, accessor) in plan.accessors {
        ty.accessors.insert(accessor_name, accessor);
    }

    if let Some(rule) = plan.rule {
        ty.rules.push(RegisteredRule {
            owner: Some(name.clone()),
            rule: Arc::new(rule),
        });
    }

    debug!(
        record_type = %ty.name,
        field = %name,
        store = plan.declaration.store(),
        kind = %plan.declaration.value_kind(),
        "declared store field"
    );
    ty.fields.insert(name, Arc::new(plan.declaration));
}
