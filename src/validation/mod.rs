//! Record validation pipeline.
//!
//! A record type owns an ordered chain of [`ValidationRule`]s. Running the
//! chain never raises: every rule appends to a shared [`Errors`] collection and
//! the record is valid when the collection stays empty.

mod errors;
mod rules;

pub use errors::Errors;
pub use rules::{AllowListRule, FnRule, InclusionRule, ValidationRule};
