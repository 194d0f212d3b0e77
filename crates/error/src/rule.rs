use std::{borrow::Cow, sync::Arc};

use crate::{
    validation_error_details, Details, ErrorCode, ErrorKind, FormatError, RuleError, SourceError, NON_FIELD_ERRORS,
};

pub type DetailsFn = dyn Fn(&SourceError) -> Result<Details, FormatError> + Send + Sync;

/// Details attached by a rule: either a fixed value, or computed from the matched error only once
/// the rule has been selected.
#[derive(Clone)]
pub enum RuleDetails {
    Literal(Details),
    Computed(Arc<DetailsFn>),
}

impl RuleDetails {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&SourceError) -> Result<Details, FormatError> + Send + Sync + 'static,
    {
        RuleDetails::Computed(Arc::new(f))
    }

    /// `{"non_field_errors": [message]}`
    pub fn non_field(message: impl Into<String>) -> Self {
        RuleDetails::Literal(non_field_details(message))
    }

    pub(crate) fn resolve(&self, error: &SourceError) -> Result<Details, FormatError> {
        match self {
            RuleDetails::Literal(details) => Ok(details.clone()),
            RuleDetails::Computed(f) => f(error),
        }
    }
}

impl std::fmt::Debug for RuleDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleDetails::Literal(details) => f.debug_tuple("Literal").field(details).finish(),
            RuleDetails::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<Details> for RuleDetails {
    fn from(details: Details) -> Self {
        RuleDetails::Literal(details)
    }
}

pub fn non_field_details(message: impl Into<String>) -> Details {
    Details::from([(NON_FIELD_ERRORS.to_string(), vec![message.into()])])
}

const FALLBACK_MESSAGE: &str = "Unknown error";
const FALLBACK_DETAILS: &str = "An unexpected error occurred that prevented this request from being completed.";

/// A classification rule: which error kinds it matches and what a matched error is reported as.
///
/// Fields left unset fall back to generic values, but only once this rule has been selected.
#[derive(Debug, Clone)]
pub struct Rule {
    kinds: Vec<ErrorKind>,
    code: Option<Cow<'static, str>>,
    message: Option<Cow<'static, str>>,
    details: Option<RuleDetails>,
}

impl Rule {
    pub fn new(kinds: impl IntoIterator<Item = ErrorKind>) -> Result<Self, RuleError> {
        let kinds: Vec<_> = kinds.into_iter().collect();
        if kinds.is_empty() {
            return Err(RuleError::EmptyMatchSet);
        }

        Ok(Rule {
            kinds,
            code: None,
            message: None,
            details: None,
        })
    }

    pub fn for_kind(kind: ErrorKind) -> Self {
        Rule {
            kinds: vec![kind],
            code: None,
            message: None,
            details: None,
        }
    }

    #[must_use]
    pub fn or_kind(mut self, kind: ErrorKind) -> Self {
        self.kinds.push(kind);
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<RuleDetails>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn kinds(&self) -> &[ErrorKind] {
        &self.kinds
    }

    pub fn matches(&self, error: &SourceError) -> bool {
        error.kind().lineage().any(|kind| self.kinds.contains(&kind))
    }

    pub fn code(&self) -> Cow<'static, str> {
        self.code.clone().unwrap_or_else(|| ErrorCode::UnknownError.into())
    }

    pub fn message(&self) -> Cow<'static, str> {
        self.message.clone().unwrap_or(Cow::Borrowed(FALLBACK_MESSAGE))
    }

    /// Only called for the selected rule; computed details are never evaluated otherwise.
    pub fn details(&self, error: &SourceError) -> Result<Details, FormatError> {
        match &self.details {
            Some(details) => details.resolve(error),
            None => Ok(non_field_details(FALLBACK_DETAILS)),
        }
    }
}

/// Ordered rules, the first matching one wins.
#[derive(Debug, Clone)]
pub struct RuleTable(Vec<Rule>);

impl RuleTable {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        RuleTable(rules.into_iter().collect())
    }

    pub fn empty() -> Self {
        RuleTable(Vec::new())
    }

    #[must_use]
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.0.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    pub fn find(&self, error: &SourceError) -> Option<&Rule> {
        self.0.iter().find(|rule| rule.matches(error))
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        RuleTable(vec![
            Rule::for_kind(ErrorKind::PermissionDenied)
                .with_code(ErrorCode::Forbidden)
                .with_message("Access forbidden")
                .with_details(RuleDetails::non_field(
                    "This request is understood, but is not able to be processed.",
                )),
            Rule::for_kind(ErrorKind::ObjectNotFound)
                .with_code(ErrorCode::NotFound)
                .with_message("Not found")
                .with_details(RuleDetails::non_field(
                    "An error occurred attempting to locate what you requested - no objects were found.",
                )),
            Rule::for_kind(ErrorKind::Validation)
                .with_code(ErrorCode::InvalidInput)
                .with_message("The information you provided is not acceptable.")
                .with_details(RuleDetails::computed(validation_error_details)),
            Rule::for_kind(ErrorKind::MultipleObjectsFound)
                .with_code(ErrorCode::ManyFound)
                .with_message("Many found")
                .with_details(RuleDetails::non_field(
                    "An error occurred attempting to locate what you requested - many objects were found.",
                )),
            Rule::for_kind(ErrorKind::ImproperlyConfigured)
                .or_kind(ErrorKind::SuspiciousOperation)
                .with_code(ErrorCode::InternalServerError)
                .with_message("Internal server error")
                .with_details(RuleDetails::non_field(
                    "A server error occurred that prevented this request from being completed.",
                )),
        ])
    }
}

impl FromIterator<Rule> for RuleTable {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        RuleTable::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn empty_match_set_is_rejected() {
        assert!(matches!(Rule::new([]), Err(RuleError::EmptyMatchSet)));
    }

    #[rstest]
    #[case(ErrorKind::PermissionDenied, Some("FORBIDDEN"))]
    #[case(ErrorKind::ObjectNotFound, Some("NOT_FOUND"))]
    #[case(ErrorKind::Validation, Some("INVALID_INPUT"))]
    #[case(ErrorKind::MultipleObjectsFound, Some("MANY_FOUND"))]
    #[case(ErrorKind::ImproperlyConfigured, Some("INTERNAL_SERVER_ERROR"))]
    #[case(ErrorKind::SuspiciousOperation, Some("INTERNAL_SERVER_ERROR"))]
    #[case(ErrorKind::DisallowedHost, Some("INTERNAL_SERVER_ERROR"))]
    #[case(ErrorKind::Database, None)]
    #[case(ErrorKind::Graphql, None)]
    #[case(ErrorKind::Other, None)]
    fn default_table_codes(#[case] kind: ErrorKind, #[case] expected: Option<&str>) {
        let table = RuleTable::default();
        let code = table.find(&SourceError::new(kind)).map(|rule| rule.code());
        assert_eq!(code.as_deref(), expected);
    }

    #[test]
    fn unset_fields_fall_back_once_selected() {
        let rule = Rule::for_kind(ErrorKind::Other);
        let error = SourceError::new(ErrorKind::Other);

        assert_eq!(rule.code(), "UNKNOWN_ERROR");
        assert_eq!(rule.message(), "Unknown error");
        assert_eq!(
            rule.details(&error).unwrap(),
            non_field_details("An unexpected error occurred that prevented this request from being completed.")
        );
    }

    #[test]
    fn literal_details_are_returned_verbatim() {
        let details = non_field_details("pie > cake");
        let rule = Rule::for_kind(ErrorKind::Other).with_details(details.clone());
        assert_eq!(rule.details(&SourceError::new(ErrorKind::Other)).unwrap(), details);
    }
}
