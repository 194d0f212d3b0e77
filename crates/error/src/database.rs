//! Details for errors raised by the database layer.
//!
//! Classification relies on the SQLSTATE reported by the PostgreSQL driver, so the helper is only
//! available with the `postgres` feature. Without it, [`DatabaseErrorDetails::load`] fails when the
//! application sets up its rules rather than when the first database error is formatted.

use crate::{
    non_field_details, ConfigurationError, Details, ErrorCode, ErrorKind, FormatError, Rule, RuleDetails, SourceError,
};

const DEFAULT_MESSAGE: &str = "A database error occurred that prevented this request from being completed.";
#[cfg(feature = "postgres")]
const INVALID_DATA_MESSAGE: &str = "The information you provided is not acceptable.";
#[cfg(feature = "postgres")]
const ALREADY_EXISTS_MESSAGE: &str = "The item you are attempting to save already exists.";

/// Proof that database error details can be computed in this build.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseErrorDetails {
    _private: (),
}

impl DatabaseErrorDetails {
    #[cfg(feature = "postgres")]
    pub fn load() -> Result<Self, ConfigurationError> {
        Ok(DatabaseErrorDetails { _private: () })
    }

    #[cfg(not(feature = "postgres"))]
    pub fn load() -> Result<Self, ConfigurationError> {
        Err(ConfigurationError::MissingDependency {
            dependency: "tokio-postgres",
        })
    }

    pub fn details(&self, error: &SourceError) -> Result<Details, FormatError> {
        if !error.kind().is_a(ErrorKind::Database) {
            return Err(FormatError::NotADatabaseError { kind: error.kind() });
        }

        Ok(non_field_details(message_for(error.vendor_code())))
    }
}

#[cfg(feature = "postgres")]
fn message_for(vendor_code: Option<&str>) -> &'static str {
    use tokio_postgres::error::SqlState;

    let Some(code) = vendor_code.filter(|code| !code.is_empty()) else {
        return DEFAULT_MESSAGE;
    };

    let state = SqlState::from_code(code);
    if state == SqlState::UNIQUE_VIOLATION {
        ALREADY_EXISTS_MESSAGE
    } else if code.starts_with("22") || code.starts_with("23") {
        // Data exceptions and integrity violations are almost always invalid input.
        INVALID_DATA_MESSAGE
    } else {
        DEFAULT_MESSAGE
    }
}

#[cfg(not(feature = "postgres"))]
fn message_for(_vendor_code: Option<&str>) -> &'static str {
    DEFAULT_MESSAGE
}

impl Rule {
    /// An opt-in rule reporting database errors through [`DatabaseErrorDetails`].
    pub fn database() -> Result<Rule, ConfigurationError> {
        let helper = DatabaseErrorDetails::load()?;

        Ok(Rule::for_kind(ErrorKind::Database)
            .with_code(ErrorCode::DatabaseError)
            .with_message("Database error")
            .with_details(RuleDetails::computed(move |error| helper.details(error))))
    }
}

#[cfg(feature = "postgres")]
impl From<&tokio_postgres::Error> for SourceError {
    fn from(error: &tokio_postgres::Error) -> Self {
        SourceError::database(error.code().map(|state| state.code().to_string())).with_message(error.to_string())
    }
}
