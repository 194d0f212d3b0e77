//! Helpers for testing applications that serve a [`GraphqlView`](crate::GraphqlView).
//!
//! [`GraphqlQuery`] builds the request a GraphQL client would post, as JSON or as a multipart form
//! when files are attached, and sends it to a [`Router`] without going through the network.

use axum::{body::Body, Router};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use crate::Upload;

pub const DEFAULT_URL: &str = "/graphql/";

const BOUNDARY: &str = "graphql-adapter-boundary";
const FILE_VARIABLE: &str = "variables.file";

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error(transparent)]
    Request(#[from] http::Error),
    #[error(transparent)]
    Body(#[from] axum::Error),
}

/// The `operations` of a GraphQL request. `input` is passed as the `input` variable.
pub fn operations(
    query: &str,
    variables: Map<String, Value>,
    operation_name: Option<&str>,
    input: Option<Value>,
) -> Value {
    let mut variables = variables;
    if let Some(input) = input {
        variables.insert("input".to_string(), input);
    }

    let mut operations = json!({ "query": query, "variables": variables });
    if let Some(operation_name) = operation_name {
        operations["operationName"] = json!(operation_name);
    }

    operations
}

/// A multipart `map` binding `count` files, named `0` to `count - 1`, to the `file` variable.
pub fn file_map(count: usize) -> Value {
    (0..count)
        .map(|index| (index.to_string(), json!([FILE_VARIABLE])))
        .collect::<Map<_, _>>()
        .into()
}

pub fn json_request(url: &str, body: impl Into<Body>) -> Result<http::Request<Body>, http::Error> {
    http::Request::builder()
        .method(Method::POST)
        .uri(url)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
}

/// A multipart request following the GraphQL multipart request protocol. Each file is sent in a
/// form field named after its key in `files`.
pub fn multipart_request(
    url: &str,
    operations: &Value,
    map: &Value,
    files: &[(String, Upload)],
) -> Result<http::Request<Body>, http::Error> {
    let mut body = Vec::new();

    for (name, value) in [("operations", operations), ("map", map)] {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }

    for (name, upload) in files {
        let disposition = format!("form-data; name=\"{name}\"; filename=\"{}\"", upload.filename);
        let content_type = upload.content_type.as_deref().unwrap_or("application/octet-stream");
        body.extend_from_slice(format!("--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(&upload.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    http::Request::builder()
        .method(Method::POST)
        .uri(url)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
}

/// A GraphQL query posted the way a client would.
///
/// Without files the query is posted as JSON. Files turn it into a multipart upload; files added
/// with [`file`](Self::file) are bound to the `file` variable.
#[derive(Debug, Clone)]
pub struct GraphqlQuery {
    query: String,
    variables: Map<String, Value>,
    operation_name: Option<String>,
    input: Option<Value>,
    files: Vec<(Vec<String>, Upload)>,
    headers: HeaderMap,
    url: String,
}

impl GraphqlQuery {
    pub fn new(query: impl Into<String>) -> Self {
        GraphqlQuery {
            query: query.into(),
            variables: Map::new(),
            operation_name: None,
            input: None,
            files: Vec::new(),
            headers: HeaderMap::new(),
            url: DEFAULT_URL.to_string(),
        }
    }

    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    #[must_use]
    pub fn input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    #[must_use]
    pub fn file(self, upload: Upload) -> Self {
        self.file_at([FILE_VARIABLE], upload)
    }

    /// Attaches a file bound to every path of `paths`, e.g. `variables.files.0`. The variables must
    /// hold a `null` placeholder at those paths.
    #[must_use]
    pub fn file_at<P: Into<String>>(mut self, paths: impl IntoIterator<Item = P>, upload: Upload) -> Self {
        self.files.push((paths.into_iter().map(Into::into).collect(), upload));
        self
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn operations(&self) -> Value {
        let mut operations = operations(
            &self.query,
            self.variables.clone(),
            self.operation_name.as_deref(),
            self.input.clone(),
        );

        let binds_file_variable = self
            .files
            .iter()
            .any(|(paths, _)| paths.iter().any(|path| path == FILE_VARIABLE));

        if binds_file_variable {
            operations["variables"]["file"] = Value::Null;
        }

        operations
    }

    pub fn into_request(self) -> Result<http::Request<Body>, http::Error> {
        let operations = self.operations();

        let mut request = if self.files.is_empty() {
            json_request(&self.url, operations.to_string())?
        } else {
            let map: Map<String, Value> = self
                .files
                .iter()
                .enumerate()
                .map(|(index, (paths, _))| (index.to_string(), json!(paths)))
                .collect();

            let files: Vec<(String, Upload)> = self
                .files
                .into_iter()
                .enumerate()
                .map(|(index, (_, upload))| (index.to_string(), upload))
                .collect();

            multipart_request(&self.url, &operations, &Value::Object(map), &files)?
        };

        request.headers_mut().extend(self.headers);
        Ok(request)
    }

    pub async fn send(self, router: Router) -> Result<TestResponse, TestClientError> {
        send(router, self.into_request()?).await
    }
}

/// A response received from a router, with its body read in full.
#[derive(Debug, Clone)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub async fn send(router: Router, request: http::Request<Body>) -> Result<TestResponse, TestClientError> {
    let response = match router.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let (parts, body) = response.into_parts();
    let body = body.collect().await?.to_bytes();

    Ok(TestResponse {
        status: parts.status,
        headers: parts.headers,
        body,
    })
}
