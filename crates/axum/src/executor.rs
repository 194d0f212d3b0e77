use std::sync::Arc;

use auth::{AnonymousUser, Identity, ResolverContext};
use error::{ErrorFormatter, FormatError, FormattedError, GraphqlError};
use futures_util::future::BoxFuture;
use http::{Extensions, HeaderMap, Method, Uri};
use serde_json::Value;

use crate::GraphqlRequestData;

/// Outcome of running a GraphQL request. `body` is sent back as is, with a 200 status when
/// `success` is set and a 400 otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub success: bool,
    pub body: Value,
}

impl ExecutionResult {
    pub fn success(body: Value) -> Self {
        ExecutionResult { success: true, body }
    }

    pub fn failure(body: Value) -> Self {
        ExecutionResult { success: false, body }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("GraphQL executor panicked: {0}")]
    Panicked(String),
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Runs GraphQL requests against a schema. The engine itself is not part of this crate.
pub trait Executor: Send + Sync + 'static {
    fn execute(
        &self,
        request: GraphqlRequestData,
        options: ExecutionOptions,
    ) -> BoxFuture<'_, Result<ExecutionResult, ExecutionError>>;
}

/// An executor resolving on the calling thread.
pub trait SyncExecutor: Send + Sync + 'static {
    fn execute(
        &self,
        request: GraphqlRequestData,
        options: ExecutionOptions,
    ) -> Result<ExecutionResult, ExecutionError>;
}

/// Runs a [`SyncExecutor`] on the blocking thread pool of the runtime.
pub struct Blocking<S>(Arc<S>);

impl<S: SyncExecutor> Blocking<S> {
    pub fn new(executor: S) -> Self {
        Blocking(Arc::new(executor))
    }
}

impl<S: SyncExecutor> Executor for Blocking<S> {
    fn execute(
        &self,
        request: GraphqlRequestData,
        options: ExecutionOptions,
    ) -> BoxFuture<'_, Result<ExecutionResult, ExecutionError>> {
        let executor = Arc::clone(&self.0);

        Box::pin(async move {
            match tokio::task::spawn_blocking(move || executor.execute(request, options)).await {
                Ok(result) => result,
                Err(error) => {
                    tracing::error!("Blocking GraphQL executor failed: {error}");
                    Err(ExecutionError::Panicked(error.to_string()))
                }
            }
        })
    }
}

/// What a resolver can see of the HTTP request being served.
#[derive(Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Set by upstream middleware, e.g. the session layer.
    pub extensions: Extensions,
    identity: Arc<dyn Identity>,
}

impl RequestContext {
    /// Builds the context of a request. The identity is taken from an `Arc<dyn Identity>` request
    /// extension and defaults to an anonymous user.
    pub fn new(parts: &http::request::Parts) -> Self {
        let identity = parts
            .extensions
            .get::<Arc<dyn Identity>>()
            .cloned()
            .unwrap_or_else(|| Arc::new(AnonymousUser));

        RequestContext {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            extensions: parts.extensions.clone(),
            identity,
        }
    }
}

impl ResolverContext for RequestContext {
    fn identity(&self) -> &dyn Identity {
        self.identity.as_ref()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("authenticated", &self.identity.is_authenticated())
            .finish()
    }
}

/// Everything the view hands to an executor besides the request itself.
///
/// The view has no per-request hooks of its own. Context values, validation rules and engine
/// middleware are the executor's business; values set by upstream middleware are read from
/// `context.extensions`.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    pub context: RequestContext,
    pub root_value: Option<Value>,
    pub debug: bool,
    pub introspection: bool,
    pub error_formatter: ErrorFormatter,
}

impl ExecutionOptions {
    /// Formats an error raised while executing, the way the view is configured to report errors.
    pub fn format_error(&self, error: &GraphqlError) -> Result<FormattedError, FormatError> {
        self.error_formatter.format(error, self.debug)
    }

    /// Formats every error and serializes them into a response `errors` list.
    pub fn format_errors<'a>(
        &self,
        errors: impl IntoIterator<Item = &'a GraphqlError>,
    ) -> Result<Value, ExecutionError> {
        let formatted = errors
            .into_iter()
            .map(|error| self.format_error(error))
            .collect::<Result<Vec<_>, _>>()?;

        serde_json::to_value(formatted).map_err(|error| ExecutionError::Format(FormatError::Custom(error.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use auth::AuthenticatedUser;
    use error::{RuleTable, SourceError};
    use insta::assert_json_snapshot;
    use pretty_assertions::assert_eq;

    use super::*;

    fn parts(identity: Option<Arc<dyn Identity>>) -> http::request::Parts {
        let mut request = http::Request::builder()
            .method("POST")
            .uri("/graphql")
            .header("x-request-id", "1")
            .body(())
            .unwrap();

        if let Some(identity) = identity {
            request.extensions_mut().insert(identity);
        }

        request.into_parts().0
    }

    fn options(error_formatter: ErrorFormatter, debug: bool) -> ExecutionOptions {
        ExecutionOptions {
            context: RequestContext::new(&parts(None)),
            root_value: None,
            debug,
            introspection: true,
            error_formatter,
        }
    }

    #[test]
    fn identity_defaults_to_anonymous() {
        let context = RequestContext::new(&parts(None));

        assert!(!context.identity().is_authenticated());
        assert_eq!(context.method, Method::POST);
        assert_eq!(context.headers["x-request-id"], "1");
    }

    #[test]
    fn identity_from_request_extensions() {
        let user: Arc<dyn Identity> = Arc::new(AuthenticatedUser::new("bob"));
        let context = RequestContext::new(&parts(Some(user)));

        assert!(context.identity().is_authenticated());
    }

    #[test]
    fn plain_formatting_keeps_engine_messages() {
        let error = GraphqlError::new("Meow").with_original_error(SourceError::permission_denied());
        let errors = options(ErrorFormatter::Plain, false).format_errors([&error]).unwrap();

        assert_json_snapshot!(errors, @r#"
        [
          {
            "message": "Meow",
            "locations": null,
            "path": null
          }
        ]
        "#);
    }

    #[test]
    fn classified_formatting() {
        let error = GraphqlError::new("Meow").with_original_error(SourceError::permission_denied());
        let formatter = ErrorFormatter::classified(RuleTable::default());
        let errors = options(formatter, false).format_errors([&error]).unwrap();

        assert_json_snapshot!(errors, @r#"
        [
          {
            "message": "Access forbidden",
            "locations": null,
            "path": null,
            "code": "FORBIDDEN",
            "details": {
              "non_field_errors": [
                "This request is understood, but is not able to be processed."
              ]
            }
          }
        ]
        "#);
    }

    struct Echo;

    impl SyncExecutor for Echo {
        fn execute(
            &self,
            request: GraphqlRequestData,
            _options: ExecutionOptions,
        ) -> Result<ExecutionResult, ExecutionError> {
            Ok(ExecutionResult::success(request.data))
        }
    }

    struct Panicking;

    impl SyncExecutor for Panicking {
        #[allow(clippy::panic)]
        fn execute(&self, _: GraphqlRequestData, _: ExecutionOptions) -> Result<ExecutionResult, ExecutionError> {
            panic!("boom")
        }
    }

    #[tokio::test]
    async fn blocking_executor() {
        let executor = Blocking::new(Echo);
        let request = GraphqlRequestData::new(serde_json::json!({"query": "{ a }"}));

        let result = Executor::execute(&executor, request, options(ErrorFormatter::Plain, false))
            .await
            .unwrap();

        assert_eq!(result, ExecutionResult::success(serde_json::json!({"query": "{ a }"})));
    }

    #[tokio::test]
    async fn panicking_blocking_executor() {
        let executor = Blocking::new(Panicking);
        let result = Executor::execute(
            &executor,
            GraphqlRequestData::default(),
            options(ErrorFormatter::Plain, false),
        )
        .await;

        assert!(matches!(result, Err(ExecutionError::Panicked(_))));
    }
}
