use std::{
    collections::{BTreeMap, HashMap},
    convert::Infallible,
};

use axum::{
    body::Body,
    extract::{multipart::MultipartError, DefaultBodyLimit, FromRequest, Multipart, Request},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http::{header, request::Parts, HeaderMap, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;
use tower::{service_fn, Layer as _, ServiceExt as _};

use crate::multipart::{combine_multipart_data, Upload, MULTIPART_SPEC_URL};

const APPLICATION_JSON: &str = "application/json";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// A GraphQL request as posted by the client, with the files uploaded alongside it.
///
/// `data` is either a single operation object or a batch of them. `uploads` is keyed by the dotted
/// path of the variable each file is bound to, e.g. `variables.file` or `0.variables.files.1`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphqlRequestData {
    pub data: Value,
    pub uploads: BTreeMap<String, Upload>,
}

impl GraphqlRequestData {
    pub fn new(data: Value) -> Self {
        GraphqlRequestData {
            data,
            uploads: BTreeMap::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Posted content must be of type {} or {}", APPLICATION_JSON, MULTIPART_FORM_DATA)]
    UnsupportedContentType,
    #[error("Request body is not a valid JSON")]
    InvalidJson,
    #[error("Request 'operations' multipart field is not a valid JSON")]
    InvalidOperationsJson,
    #[error("Request 'map' multipart field is not a valid JSON")]
    InvalidMapJson,
    #[error("Invalid type for the 'operations' multipart field ({}).", MULTIPART_SPEC_URL)]
    InvalidOperationsType,
    #[error("Invalid type for the 'map' multipart field ({}).", MULTIPART_SPEC_URL)]
    InvalidMapType,
    #[error("Invalid type for the 'map' multipart field entry key '{key}' array ({}).", MULTIPART_SPEC_URL)]
    InvalidMapEntry { key: String },
    #[error(
        "Invalid type for the 'map' multipart field entry key '{key}' array index '{index}' value ({}).",
        MULTIPART_SPEC_URL
    )]
    InvalidMapEntryValue { key: String, index: usize },
    #[error("File data was missing for entry key '{key}' ({}).", MULTIPART_SPEC_URL)]
    MissingFile { key: String },
    #[error("{0}")]
    Multipart(String),
    #[error("Request body exceeds the limit of {limit} bytes")]
    BodyTooLarge { limit: usize },
    #[error("Failed to read the request body: {0}")]
    Body(String),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.to_string()));
        *response.status_mut() = self.status();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            http::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

/// Reads the GraphQL request out of a posted body, either plain JSON or a multipart form following
/// the GraphQL multipart request protocol.
pub async fn extract_request_data(parts: Parts, body: Body, limit: usize) -> Result<GraphqlRequestData, RequestError> {
    match content_type(&parts.headers) {
        Some(APPLICATION_JSON) => {
            let bytes = read_body(body, limit).await?;
            let data = serde_json::from_slice(&bytes).map_err(|_| RequestError::InvalidJson)?;
            Ok(GraphqlRequestData::new(data))
        }
        Some(MULTIPART_FORM_DATA) => {
            let bytes = read_body(body, limit).await?;
            extract_multipart_data(Request::from_parts(parts, Body::from(bytes)), limit).await
        }
        _ => Err(RequestError::UnsupportedContentType),
    }
}

// The media type without its parameters, e.g. `multipart/form-data` out of
// `multipart/form-data; boundary=xyz`.
fn content_type(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let media_type = value.split_once(';').map_or(value, |(media_type, _)| media_type);
    Some(media_type.trim())
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, RequestError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(error) if error.is::<LengthLimitError>() => Err(RequestError::BodyTooLarge { limit }),
        Err(error) => Err(RequestError::Body(error.to_string())),
    }
}

async fn extract_multipart_data(request: Request, limit: usize) -> Result<GraphqlRequestData, RequestError> {
    // The multipart extractor reads its limit from the request, falling back to the axum default.
    let extractor = DefaultBodyLimit::max(limit).layer(service_fn(|request: Request| async move {
        Ok::<_, Infallible>(Multipart::from_request(request, &()).await)
    }));

    let mut multipart = match extractor.oneshot(request).await {
        Ok(multipart) => multipart.map_err(|rejection| RequestError::Multipart(rejection.body_text()))?,
        Err(never) => match never {},
    };

    let mut fields = HashMap::new();
    let mut files = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| multipart_error(error, limit))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|error| multipart_error(error, limit))?;

                files.insert(
                    name,
                    Upload {
                        filename,
                        content_type,
                        data,
                    },
                );
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|error| multipart_error(error, limit))?;

                fields.insert(name, text);
            }
        }
    }

    let operations = parse_field(&fields, "operations").map_err(|_| RequestError::InvalidOperationsJson)?;
    let files_map = parse_field(&fields, "map").map_err(|_| RequestError::InvalidMapJson)?;

    combine_multipart_data(operations, files_map, &files)
}

fn multipart_error(error: MultipartError, limit: usize) -> RequestError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RequestError::BodyTooLarge { limit }
    } else {
        RequestError::Multipart(error.body_text())
    }
}

// A missing field reads as an empty object.
fn parse_field(fields: &HashMap<String, String>, name: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(fields.get(name).map_or("{}", String::as_str))
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn parts(content_type: Option<&str>) -> Parts {
        let mut builder = http::Request::builder().method("POST").uri("/graphql");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn multipart_body(operations: &str) -> Body {
        Body::from(format!(
            "--xyz\r\nContent-Disposition: form-data; name=\"operations\"\r\n\r\n{operations}\r\n--xyz--\r\n"
        ))
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=xyz"),
        );
        assert_eq!(content_type(&headers), Some("multipart/form-data"));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(content_type(&headers), Some("application/json"));

        assert_eq!(content_type(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn json_body() {
        let body = Body::from(r#"{"query": "{ pets { name } }"}"#);
        let data = extract_request_data(parts(Some("application/json; charset=utf-8")), body, 1024)
            .await
            .unwrap();

        assert_eq!(data, GraphqlRequestData::new(json!({"query": "{ pets { name } }"})));
    }

    #[tokio::test]
    async fn invalid_json_body() {
        let error = extract_request_data(parts(Some("application/json")), Body::from("{"), 1024)
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "Request body is not a valid JSON");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unsupported_content_types() {
        for content_type in [Some("text/plain"), Some("application/graphql"), None] {
            let error = extract_request_data(parts(content_type), Body::from("{}"), 1024)
                .await
                .unwrap_err();

            assert_eq!(
                error.to_string(),
                "Posted content must be of type application/json or multipart/form-data"
            );
        }
    }

    #[tokio::test]
    async fn body_over_the_limit() {
        let body = Body::from(format!(r#"{{"query": "{}"}}"#, "a".repeat(64)));
        let error = extract_request_data(parts(Some("application/json")), body, 16)
            .await
            .unwrap_err();

        assert!(matches!(error, RequestError::BodyTooLarge { limit: 16 }));
        assert_eq!(error.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn multipart_body_above_the_axum_default_limit() {
        let blob = "a".repeat(3 * 1024 * 1024);
        let body = multipart_body(&format!(r#"{{"query": "{{ a }}", "variables": {{"blob": "{blob}"}}}}"#));

        let data = extract_request_data(parts(Some("multipart/form-data; boundary=xyz")), body, 8 * 1024 * 1024)
            .await
            .unwrap();

        assert_eq!(data.data["variables"]["blob"].as_str().map(str::len), Some(blob.len()));
    }

    #[tokio::test]
    async fn multipart_body_over_the_limit() {
        let body = multipart_body(&format!(r#"{{"query": "{}"}}"#, "a".repeat(64)));

        let error = extract_request_data(parts(Some("multipart/form-data; boundary=xyz")), body, 32)
            .await
            .unwrap_err();

        assert!(matches!(error, RequestError::BodyTooLarge { limit: 32 }));
        assert_eq!(error.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
