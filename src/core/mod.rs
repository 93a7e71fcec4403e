pub mod error;
pub mod value;

pub use error::{ConfigError, Result, StoreFieldError};
pub use value::{Value, ValueMap, ValueSet, inspect_list};
