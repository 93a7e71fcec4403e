use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// String-keyed mapping held by store attributes and mapping-value fields.
pub type ValueMap = BTreeMap<String, Value>;

/// Ordered set held by set-of-values fields.
pub type ValueSet = BTreeSet<Value>;

/// Dynamic value stored in columns and store attributes.
///
/// Ordering, equality and hashing agree with each other so any value can be a
/// set member or a map value. Values of different variants order by variant
/// rank; floats use IEEE total ordering with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Symbol(String),
    List(Vec<Value>),
    Map(ValueMap),
    Set(ValueSet),
}

impl Value {
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn empty_map() -> Self {
        Self::Map(ValueMap::new())
    }

    pub fn empty_set() -> Self {
        Self::Set(ValueSet::new())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Boolean(_) => "BOOLEAN",
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Symbol(_) => "SYMBOL",
            Self::List(_) => "LIST",
            Self::Map(_) => "MAP",
            Self::Set(_) => "SET",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::Integer(_) => 2,
            Self::Float(_) => 3,
            Self::Text(_) => 4,
            Self::Symbol(_) => 5,
            Self::List(_) => 6,
            Self::Map(_) => 7,
            Self::Set(_) => 8,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut ValueMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&ValueSet> {
        match self {
            Self::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_set_mut(&mut self) -> Option<&mut ValueSet> {
        match self {
            Self::Set(set) => Some(set),
            _ => None,
        }
    }

    /// Converts configuration JSON into a value. Strings become symbols, since
    /// configuration documents use them to spell keyword members.
    pub fn from_config_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Symbol(s.clone()),
            serde_json::Value::Array(items) => {
                Self::List(items.iter().map(Self::from_config_json).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_config_json(v)))
                    .collect(),
            ),
        }
    }
}

fn unsigned_zero(f: f64) -> f64 {
    if f == 0.0 { 0.0 } else { f }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => unsigned_zero(*a).total_cmp(&unsigned_zero(*b)),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Symbol(a), Self::Symbol(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            (Self::Map(a), Self::Map(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Null => {}
            Self::Boolean(b) => b.hash(state),
            Self::Integer(i) => i.hash(state),
            Self::Float(f) => unsigned_zero(*f).to_bits().hash(state),
            Self::Text(s) | Self::Symbol(s) => s.hash(state),
            Self::List(items) => items.hash(state),
            Self::Map(map) => map.hash(state),
            Self::Set(set) => set.hash(state),
        }
    }
}

fn write_joined<'a, I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = &'a Value>,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "nil"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{:?}", s),
            Self::Symbol(s) => write!(f, ":{}", s),
            Self::List(items) => {
                write!(f, "[")?;
                write_joined(f, items)?;
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?} => {}", k, v)?;
                }
                write!(f, "}}")
            }
            Self::Set(set) => {
                write!(f, "#<Set {{")?;
                write_joined(f, set)?;
                write!(f, "}}>")
            }
        }
    }
}

/// Renders a member list the way validation messages quote offending values.
pub fn inspect_list<'a, I>(items: I) -> String
where
    I: IntoIterator<Item = &'a Value>,
{
    let rendered: Vec<String> = items.into_iter().map(|v| v.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl From<ValueSet> for Value {
    fn from(set: ValueSet) -> Self {
        Value::Set(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_variant_ordering_is_total() {
        let mut values = vec![
            Value::symbol("b"),
            Value::Integer(3),
            Value::Null,
            Value::text("a"),
            Value::Float(1.5),
            Value::Boolean(true),
        ];
        values.sort();
        assert_eq!(values[0], Value::Null);
        assert_eq!(values[1], Value::Boolean(true));
        assert_eq!(values[2], Value::Integer(3));
        assert_eq!(values[5], Value::symbol("b"));
    }

    #[test]
    fn test_text_and_symbol_are_distinct_members() {
        let mut set = ValueSet::new();
        set.insert(Value::symbol("welcome"));
        set.insert(Value::text("welcome"));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Value::symbol("welcome")));
    }

    #[test]
    fn test_nan_is_a_usable_member() {
        let mut set = ValueSet::new();
        set.insert(Value::Float(f64::NAN));
        set.insert(Value::Float(f64::NAN));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_signed_zeros_are_one_member() {
        use std::collections::hash_map::DefaultHasher;

        let hash = |value: &Value| {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(Value::Float(0.0), Value::Float(-0.0));
        assert_eq!(hash(&Value::Float(0.0)), hash(&Value::Float(-0.0)));

        let set: ValueSet = [Value::Float(-0.0), Value::Float(0.0)].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&Value::Float(0.0)));
        assert!(Value::Float(-0.5) < Value::Float(-0.0));
    }

    #[test]
    fn test_display_matches_inspect_style() {
        assert_eq!(Value::symbol("c").to_string(), ":c");
        assert_eq!(Value::text("c").to_string(), "\"c\"");
        let members = [Value::symbol("c"), Value::Integer(4)];
        assert_eq!(inspect_list(members.iter()), "[:c, 4]");
    }

    #[test]
    fn test_config_json_strings_become_symbols() {
        let json = serde_json::json!(["a", 1, true]);
        assert_eq!(
            Value::from_config_json(&json),
            Value::List(vec![Value::symbol("a"), Value::Integer(1), Value::Boolean(true)])
        );
    }
}
