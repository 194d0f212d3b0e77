use std::sync::Arc;

use serde_json::json;

use crate::{
    extract_original_error, Extensions, FormatError, FormattedError, GraphqlError, RuleTable, SourceError,
};

/// Formats a GraphQL error, classifying the error it was originally raised from.
///
/// The innermost original error is matched against `rules` in order and the first matching rule
/// sets `message`, `code` and `details`. Without a match the engine's envelope is returned as is.
/// With `debug`, an `exception` extension is added unless the error already has extensions.
///
/// The caller's error is never modified. Failures of a rule's details function are returned
/// unchanged.
pub fn format_error(error: &GraphqlError, rules: &RuleTable, debug: bool) -> Result<FormattedError, FormatError> {
    let mut formatted = error.formatted();

    if let Some(original_error) = error.original_error().map(extract_original_error) {
        if let Some(rule) = rules.find(original_error) {
            let details = rule.details(original_error)?;
            let code = rule.code();

            tracing::debug!(kind = %original_error.kind(), code = %code, "Classified GraphQL error");

            formatted.message = rule.message();
            formatted.code = Some(code);
            formatted.details = Some(details);
        }
    }

    if debug {
        attach_debug_extension(error, &mut formatted);
    }

    Ok(formatted)
}

fn attach_debug_extension(error: &GraphqlError, formatted: &mut FormattedError) {
    if formatted.extensions.is_some() {
        return;
    }

    let mut extensions = Extensions::new();
    extensions.insert("exception".to_string(), exception_extension(error.original_error()));
    formatted.extensions = Some(extensions);
}

fn exception_extension(original_error: Option<&SourceError>) -> serde_json::Value {
    let Some(error) = original_error else {
        return serde_json::Value::Null;
    };

    let innermost = extract_original_error(error);
    let chain: Vec<_> = std::iter::successors(Some(error), |error| error.original_error())
        .map(|error| json!({ "kind": error.kind(), "message": error.message() }))
        .collect();

    json!({
        "kind": innermost.kind(),
        "message": innermost.message(),
        "chain": chain,
    })
}

/// The error formatting hook used for every error of a GraphQL response.
#[derive(Debug, Clone, Default)]
pub enum ErrorFormatter {
    /// The engine's own envelope, no classification.
    #[default]
    Plain,
    Classified(Arc<RuleTable>),
}

impl ErrorFormatter {
    pub fn classified(rules: RuleTable) -> Self {
        ErrorFormatter::Classified(Arc::new(rules))
    }

    pub fn format(&self, error: &GraphqlError, debug: bool) -> Result<FormattedError, FormatError> {
        match self {
            ErrorFormatter::Plain => {
                let mut formatted = error.formatted();
                if debug {
                    attach_debug_extension(error, &mut formatted);
                }
                Ok(formatted)
            }
            ErrorFormatter::Classified(rules) => format_error(error, rules, debug),
        }
    }
}
