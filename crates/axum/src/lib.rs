//! GraphQL over HTTP for axum.
//!
//! [`GraphqlView`] reads GraphQL requests posted as JSON or as multipart forms with file uploads,
//! hands them to an [`Executor`] and serves the GraphQL Playground to browsers.

mod executor;
mod multipart;
mod playground;
mod request;
#[cfg(feature = "test-utils")]
pub mod test_client;
mod view;

pub use executor::{
    Blocking, ExecutionError, ExecutionOptions, ExecutionResult, Executor, RequestContext, SyncExecutor,
};
pub use multipart::{combine_multipart_data, Upload};
pub use request::{extract_request_data, GraphqlRequestData, RequestError};
pub use view::{GraphqlView, GraphqlViewBuilder, ViewError};
