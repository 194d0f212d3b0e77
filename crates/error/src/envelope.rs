use std::{borrow::Cow, sync::Arc};

use crate::{Details, SourceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ErrorPathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for ErrorPathSegment {
    fn from(field: &str) -> Self {
        ErrorPathSegment::Field(field.to_string())
    }
}

impl From<String> for ErrorPathSegment {
    fn from(field: String) -> Self {
        ErrorPathSegment::Field(field)
    }
}

impl From<usize> for ErrorPathSegment {
    fn from(index: usize) -> Self {
        ErrorPathSegment::Index(index)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ErrorPath(Vec<ErrorPathSegment>);

impl std::ops::Deref for ErrorPath {
    type Target = Vec<ErrorPathSegment>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Into<ErrorPathSegment>> FromIterator<S> for ErrorPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ErrorPath(iter.into_iter().map(Into::into).collect())
    }
}

pub type Extensions = serde_json::Map<String, serde_json::Value>;

/// An error as reported by the GraphQL engine for one resolver failure, together with the error
/// it was raised from, if any.
#[derive(Debug, Clone)]
pub struct GraphqlError {
    pub message: Cow<'static, str>,
    pub locations: Option<Vec<Location>>,
    pub path: Option<ErrorPath>,
    pub extensions: Option<Extensions>,
    pub original_error: Option<Arc<SourceError>>,
}

impl GraphqlError {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        GraphqlError {
            message: message.into(),
            locations: None,
            path: None,
            extensions: None,
            original_error: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.get_or_insert_with(Vec::new).push(location);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl IntoIterator<Item = impl Into<ErrorPathSegment>>) -> Self {
        self.path = Some(path.into_iter().collect());
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extensions
            .get_or_insert_with(Extensions::new)
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_original_error(mut self, error: impl Into<Arc<SourceError>>) -> Self {
        self.original_error = Some(error.into());
        self
    }

    pub fn original_error(&self) -> Option<&SourceError> {
        self.original_error.as_deref()
    }

    /// The envelope the engine itself would send for this error.
    pub fn formatted(&self) -> FormattedError {
        FormattedError {
            message: self.message.clone(),
            locations: self.locations.clone(),
            path: self.path.clone(),
            code: None,
            details: None,
            extensions: self.extensions.clone(),
        }
    }
}

impl std::fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// An entry of the `errors` array of a GraphQL response.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FormattedError {
    pub message: Cow<'static, str>,
    pub locations: Option<Vec<Location>>,
    pub path: Option<ErrorPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Cow<'static, str>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>,
}
