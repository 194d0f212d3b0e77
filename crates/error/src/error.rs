use crate::ErrorKind;

/// Failure of a rule while formatting an error. This points at a misconfigured rule table.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("expected a validation error carrying messages, got {kind}")]
    MissingValidationPayload { kind: ErrorKind },
    #[error("expected a database error, got {kind}")]
    NotADatabaseError { kind: ErrorKind },
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("a rule must match at least one error kind")]
    EmptyMatchSet,
}

/// Raised once, when a component is set up, never at formatting time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Cannot use this function without {dependency}.")]
    MissingDependency { dependency: &'static str },
    #[error(transparent)]
    Rule(#[from] RuleError),
}
