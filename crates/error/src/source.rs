use std::{borrow::Cow, collections::BTreeMap, sync::Arc};

use crate::ErrorKind;

/// Messages carried by a validation error, in one of the three shapes a validation failure
/// can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationMessages {
    /// Messages grouped by the input field they relate to.
    Fields(BTreeMap<String, Vec<String>>),
    Single(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ErrorPayload {
    #[default]
    None,
    Validation(ValidationMessages),
    /// Vendor error code (SQLSTATE) reported by the database driver, if any.
    Database { vendor_code: Option<String> },
}

/// A node in a chain of causally related errors.
///
/// The innermost node, the one without an original error, is the subject of classification.
/// Nodes are immutable once built and share their cause, so a chain can be handed to any number
/// of formatters at once.
#[derive(Debug, Clone)]
pub struct SourceError {
    kind: ErrorKind,
    message: Option<Cow<'static, str>>,
    payload: ErrorPayload,
    original_error: Option<Arc<SourceError>>,
}

impl SourceError {
    pub fn new(kind: ErrorKind) -> Self {
        SourceError {
            kind,
            message: None,
            payload: ErrorPayload::None,
            original_error: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: ErrorPayload) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn caused_by(mut self, error: impl Into<Arc<SourceError>>) -> Self {
        self.original_error = Some(error.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn payload(&self) -> &ErrorPayload {
        &self.payload
    }

    pub fn original_error(&self) -> Option<&SourceError> {
        self.original_error.as_deref()
    }

    pub fn validation_messages(&self) -> Option<&ValidationMessages> {
        match &self.payload {
            ErrorPayload::Validation(messages) => Some(messages),
            _ => None,
        }
    }

    pub fn vendor_code(&self) -> Option<&str> {
        match &self.payload {
            ErrorPayload::Database { vendor_code } => vendor_code.as_deref(),
            _ => None,
        }
    }

    // ------------- //
    // Common errors //
    // ------------- //

    pub fn permission_denied() -> Self {
        SourceError::new(ErrorKind::PermissionDenied)
    }

    pub fn object_not_found() -> Self {
        SourceError::new(ErrorKind::ObjectNotFound)
    }

    pub fn multiple_objects_found() -> Self {
        SourceError::new(ErrorKind::MultipleObjectsFound)
    }

    pub fn improperly_configured(message: impl Into<Cow<'static, str>>) -> Self {
        SourceError::new(ErrorKind::ImproperlyConfigured).with_message(message)
    }

    pub fn validation(messages: ValidationMessages) -> Self {
        let error = SourceError::new(ErrorKind::Validation);
        match &messages {
            ValidationMessages::Single(message) => error
                .with_message(message.clone())
                .with_payload(ErrorPayload::Validation(messages)),
            _ => error.with_payload(ErrorPayload::Validation(messages)),
        }
    }

    pub fn database(vendor_code: Option<String>) -> Self {
        SourceError::new(ErrorKind::Database).with_payload(ErrorPayload::Database { vendor_code })
    }

    /// The wrapping layer the GraphQL engine puts around resolver errors.
    pub fn graphql(message: impl Into<Cow<'static, str>>) -> Self {
        SourceError::new(ErrorKind::Graphql).with_message(message)
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => f.write_str(self.kind.as_ref()),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.original_error
            .as_deref()
            .map(|error| error as &(dyn std::error::Error + 'static))
    }
}

/// Follows the chain of original errors down to the innermost one.
///
/// An error without an original error is returned as is. Chains built through [`SourceError`]
/// are finite; a cyclic chain would never terminate.
pub fn extract_original_error(error: &SourceError) -> &SourceError {
    let mut current = error;
    while let Some(original) = current.original_error() {
        current = original;
    }
    current
}
