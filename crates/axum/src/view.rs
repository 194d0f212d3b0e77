use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request, State},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use config::{ErrorFormattingConfig, ViewConfig};
use error::{ConfigurationError, ErrorFormatter, Rule, RuleTable};
use http::{header, HeaderValue, Method, StatusCode};
use serde_json::Value;

use crate::{extract_request_data, playground, ExecutionOptions, Executor, RequestContext};

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("invalid playground template: {0}")]
    Template(#[from] ramhorns::Error),
}

/// Serves a GraphQL schema over HTTP: the playground on `GET` and queries on `POST`.
pub struct GraphqlView<E> {
    inner: Arc<GraphqlViewInner<E>>,
}

struct GraphqlViewInner<E> {
    executor: E,
    config: ViewConfig,
    root_value: Option<Value>,
    error_formatter: ErrorFormatter,
    playground_page: String,
}

impl<E> Clone for GraphqlView<E> {
    fn clone(&self) -> Self {
        GraphqlView {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Executor> GraphqlView<E> {
    pub fn new(executor: E, config: ViewConfig) -> Result<Self, ViewError> {
        Self::builder(executor).config(config).build()
    }

    pub fn builder(executor: E) -> GraphqlViewBuilder<E> {
        GraphqlViewBuilder {
            executor,
            config: ViewConfig::default(),
            root_value: None,
            error_formatter: None,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.inner.config
    }

    /// A router serving this view on `path`. Bodies are limited by `request_body_limit` instead of
    /// the axum default.
    pub fn router(self, path: &str) -> Router {
        Router::new()
            .route(path, any(dispatch::<E>))
            .layer(DefaultBodyLimit::disable())
            .with_state(self)
    }

    pub async fn handle(&self, request: Request) -> Response {
        match *request.method() {
            Method::GET => html_response(self.inner.playground_page.clone()),
            Method::POST => self.execute(request).await,
            Method::OPTIONS => allow_response(StatusCode::OK),
            _ => allow_response(StatusCode::METHOD_NOT_ALLOWED),
        }
    }

    async fn execute(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        let context = RequestContext::new(&parts);

        let data = match extract_request_data(parts, body, self.inner.config.request_body_limit).await {
            Ok(data) => data,
            Err(error) => {
                tracing::warn!("Rejected GraphQL request: {error}");
                return error.into_response();
            }
        };

        let options = ExecutionOptions {
            context,
            root_value: self.inner.root_value.clone(),
            debug: self.inner.config.debug,
            introspection: self.inner.config.introspection,
            error_formatter: self.inner.error_formatter.clone(),
        };

        match self.inner.executor.execute(data, options).await {
            Ok(result) if result.success => json_response(StatusCode::OK, &result.body),
            Ok(result) => json_response(StatusCode::BAD_REQUEST, &result.body),
            Err(error) => {
                tracing::error!("GraphQL execution failed: {error}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

async fn dispatch<E: Executor>(State(view): State<GraphqlView<E>>, request: Request) -> Response {
    view.handle(request).await
}

pub struct GraphqlViewBuilder<E> {
    executor: E,
    config: ViewConfig,
    root_value: Option<Value>,
    error_formatter: Option<ErrorFormatter>,
}

impl<E: Executor> GraphqlViewBuilder<E> {
    #[must_use]
    pub fn config(mut self, config: ViewConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn root_value(mut self, root_value: Value) -> Self {
        self.root_value = Some(root_value);
        self
    }

    /// Replaces the formatter derived from the `error_formatting` configuration.
    #[must_use]
    pub fn error_formatter(mut self, error_formatter: ErrorFormatter) -> Self {
        self.error_formatter = Some(error_formatter);
        self
    }

    pub fn build(self) -> Result<GraphqlView<E>, ViewError> {
        let error_formatter = match self.error_formatter {
            Some(error_formatter) => error_formatter,
            None => error_formatter_from_config(&self.config.error_formatting)?,
        };

        let playground_page = playground::render(&self.config.playground_options())?;

        Ok(GraphqlView {
            inner: Arc::new(GraphqlViewInner {
                executor: self.executor,
                config: self.config,
                root_value: self.root_value,
                error_formatter,
                playground_page,
            }),
        })
    }
}

fn error_formatter_from_config(config: &ErrorFormattingConfig) -> Result<ErrorFormatter, ConfigurationError> {
    if !(config.classify || config.database_errors) {
        return Ok(ErrorFormatter::Plain);
    }

    let mut rules = if config.classify {
        RuleTable::default()
    } else {
        RuleTable::empty()
    };

    if config.database_errors {
        rules = rules.with_rule(Rule::database()?);
    }

    Ok(ErrorFormatter::classified(rules))
}

fn html_response(page: String) -> Response {
    let mut response = Response::new(Body::from(page));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

fn allow_response(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

fn json_response(status: StatusCode, body: &Value) -> Response {
    let bytes = match serde_json::to_vec(body) {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Failed to serialize the GraphQL response: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
