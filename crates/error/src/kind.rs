/// Kinds of errors raised by the web framework, its ORM and the GraphQL layer.
///
/// The hierarchy between kinds is explicit data (see [`ErrorKind::parent`]) so that rule
/// tables can match a whole family of errors without any runtime type introspection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    PermissionDenied,
    ObjectNotFound,
    MultipleObjectsFound,
    Validation,
    ImproperlyConfigured,
    SuspiciousOperation,
    // Suspicious operations
    DisallowedHost,
    RequestDataTooBig,
    TooManyFieldsSent,
    Database,
    // Database errors
    DataError,
    IntegrityError,
    // Wrapping layer added by the GraphQL engine
    Graphql,
    Other,
}

impl ErrorKind {
    pub fn parent(self) -> Option<ErrorKind> {
        match self {
            ErrorKind::DisallowedHost | ErrorKind::RequestDataTooBig | ErrorKind::TooManyFieldsSent => {
                Some(ErrorKind::SuspiciousOperation)
            }
            ErrorKind::DataError | ErrorKind::IntegrityError => Some(ErrorKind::Database),
            ErrorKind::PermissionDenied
            | ErrorKind::ObjectNotFound
            | ErrorKind::MultipleObjectsFound
            | ErrorKind::Validation
            | ErrorKind::ImproperlyConfigured
            | ErrorKind::SuspiciousOperation
            | ErrorKind::Database
            | ErrorKind::Graphql
            | ErrorKind::Other => None,
        }
    }

    /// The kind itself followed by its ancestors, closest first.
    pub fn lineage(self) -> impl Iterator<Item = ErrorKind> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }

    /// Whether `self` is `other` or one of its descendants.
    pub fn is_a(self, other: ErrorKind) -> bool {
        self.lineage().any(|kind| kind == other)
    }
}
