//! Classification and formatting of the errors surfaced in GraphQL responses.
//!
//! Errors raised by resolvers reach the GraphQL engine wrapped in one or more layers. The
//! formatter walks down to the innermost error, matches its [`ErrorKind`] against an ordered
//! [`RuleTable`] and reports it with a stable `code`, a human readable `message` and structured
//! `details`.

mod code;
mod database;
mod envelope;
mod error;
mod format;
mod kind;
mod rule;
mod source;
mod validation;

use std::collections::BTreeMap;

pub use code::ErrorCode;
pub use database::DatabaseErrorDetails;
pub use envelope::*;
pub use error::{ConfigurationError, FormatError, RuleError};
pub use format::{format_error, ErrorFormatter};
pub use kind::ErrorKind;
pub use rule::{non_field_details, DetailsFn, Rule, RuleDetails, RuleTable};
pub use source::{extract_original_error, ErrorPayload, SourceError, ValidationMessages};
pub use validation::validation_error_details;

/// Messages per input field.
pub type Details = BTreeMap<String, Vec<String>>;

/// Field under which messages not tied to a specific input field are reported.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";
