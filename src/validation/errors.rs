use std::collections::BTreeMap;
use std::fmt;

/// Validation messages collected during one validation pass, keyed by
/// attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Errors {
    entries: BTreeMap<String, Vec<String>>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.entries
            .entry(attribute.into())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded for `attribute`, empty when it is valid.
    pub fn on(&self, attribute: &str) -> &[String] {
        self.entries
            .get(attribute)
            .map(|messages| messages.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, attribute: &str) -> bool {
        self.entries.contains_key(attribute)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of individual messages.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `"<attribute> <message>"` for every entry.
    pub fn full_messages(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|(attribute, messages)| {
                messages
                    .iter()
                    .map(move |message| format!("{} {}", attribute, message))
            })
            .collect()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_messages().join(", "))
    }
}
