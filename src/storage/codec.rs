use crate::core::{Result, StoreFieldError, Value, ValueMap};
use serde::{Deserialize, Serialize};

/// Serialization of a store attribute into the opaque blob kept in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StoreCodec {
    #[default]
    Json,
    MessagePack,
}

impl StoreCodec {
    pub fn encode(&self, store: &ValueMap) -> Result<Vec<u8>> {
        match self {
            Self::Json => {
                // serde_json writes NaN and infinities as null, which never decodes
                // back into a float.
                if let Some((key, value)) = store.iter().find(|(_, value)| !is_finite(value)) {
                    return Err(StoreFieldError::Serialization(format!(
                        "'{}' holds a non-finite float in {}",
                        key, value
                    )));
                }
                Ok(serde_json::to_vec(store)?)
            }
            Self::MessagePack => Ok(rmp_serde::to_vec(store)?),
        }
    }

    pub fn decode(&self, blob: &[u8]) -> Result<ValueMap> {
        if blob.is_empty() {
            return Ok(ValueMap::new());
        }
        match self {
            Self::Json => Ok(serde_json::from_slice(blob)?),
            Self::MessagePack => Ok(rmp_serde::from_slice(blob)?),
        }
    }
}

fn is_finite(value: &Value) -> bool {
    match value {
        Value::Float(f) => f.is_finite(),
        Value::List(items) => items.iter().all(is_finite),
        Value::Map(map) => map.values().all(is_finite),
        Value::Set(set) => set.iter().all(is_finite),
        _ => true,
    }
}
