use std::borrow::Cow;

/// Codes used by the built-in rule table. Custom rules may use any string.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
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
pub enum ErrorCode {
    Forbidden,
    NotFound,
    InvalidInput,
    ManyFound,
    InternalServerError,
    DatabaseError,
    // Fallback of a selected rule that does not define its own code
    UnknownError,
}

impl From<ErrorCode> for Cow<'static, str> {
    fn from(code: ErrorCode) -> Self {
        let code: &'static str = code.into();
        Cow::Borrowed(code)
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use strum::IntoEnumIterator;

    use super::ErrorCode;

    #[test]
    fn serde_and_display_agree() {
        for code in ErrorCode::iter() {
            let serialized = serde_json::to_value(code).unwrap();
            assert_eq!(serialized, serde_json::Value::String(code.to_string()));
        }
    }

    #[test]
    fn converts_into_wire_string() {
        let code: Cow<'static, str> = ErrorCode::InternalServerError.into();
        assert_eq!(code, "INTERNAL_SERVER_ERROR");
    }
}
