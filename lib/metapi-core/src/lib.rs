//! # Metapi Core
//!
//! Run API operations described as data, and get a uniform result back.
//!
//! An operation ([`Operation`], usually an [`ApiOperation`]) tells how to turn
//! a JSON request value into an HTTP call and which schemas the request and the
//! responses must follow. [`MetaApiClient`] runs it through a fixed pipeline:
//!
//! 1. validate the request against the request schema,
//! 2. build the URL, the headers and the body,
//! 3. send the request once through a [`Transport`],
//! 4. decode the body as JSON (an empty body is `{}`),
//! 5. verify the body against the schema registered for the status code,
//! 6. build an [`ApiResult`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use http::{Method, StatusCode};
//! use metapi_core::{ApiModel, ApiOperation, ApiResult, JsonSchema, MetaApiClient};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pet = JsonSchema::new(
//!     "Pet",
//!     json!({
//!         "type": "object",
//!         "required": ["id", "name"],
//!         "properties": {
//!             "id": { "type": "integer" },
//!             "name": { "type": "string" }
//!         }
//!     }),
//! );
//! let request = JsonSchema::new(
//!     "GetPet",
//!     json!({
//!         "type": "object",
//!         "required": ["id"],
//!         "properties": { "id": { "type": "integer" } }
//!     }),
//! );
//!
//! let model = ApiModel::new().with_operation(
//!     ApiOperation::new("getPet", Method::GET, "/pets/{id}")
//!         .with_request_schema(request)
//!         .with_response(StatusCode::OK, pet),
//! );
//!
//! let client = MetaApiClient::builder()
//!     .with_host("petstore.example.com")
//!     .with_base_path("/api")?
//!     .with_model(model)
//!     .build()?;
//!
//! match client.run_operation_by_id("getPet", json!({"id": 1})).await? {
//!     ApiResult::Success { value, .. } => println!("got {value}"),
//!     ApiResult::Mismatch { error } => eprintln!("not sent: {:?}", error.messages()),
//!     ApiResult::Failure { error, response } => eprintln!("{error} ({response:?})"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Outcomes
//!
//! - [`ApiResult::Success`]: the status is below `400` and the body passed the
//!   schema registered for that status, if any.
//! - [`ApiResult::Mismatch`]: the request has validation errors. Nothing was
//!   sent. Request warnings alone do not block the call, they go to the
//!   [`Diagnostics`] sink.
//! - [`ApiResult::Failure`]: shaping, sending or decoding failed, the body did
//!   not pass its schema (a warning is enough), or the status is `400` or more.
//!   Only in the last case is the decoded body kept.
//!
//! An unknown operation id is the only case reported as an `Err` by
//! [`MetaApiClient::run_operation_by_id`].
//!
//! ## Schemas
//!
//! Validation goes through the [`Schema`] trait. [`JsonSchema`] covers the
//! JSON Schema keywords used by OpenAPI documents and can be generated from
//! `utoipa` types with [`JsonSchema::of`]. With the `yaml` feature,
//! `JsonSchema::from_yaml` loads a YAML document.

mod client;
mod operation;
mod schema;
mod transport;

pub use self::client::{
    ApiClientBuilder, ApiClientError, ApiResult, Diagnostics, ErrorKind, MetaApiClient,
    TracingDiagnostics,
};
pub use self::operation::{
    ApiModel, ApiOperation, BodySource, Operation, OperationRegistry, PathTemplate,
};
pub use self::schema::{JsonSchema, Schema, Severity, ValidationContext, ValidationMessage};
pub use self::transport::{
    BoxFuture, HttpRequest, HttpResponse, ReqwestTransport, RequestMode, Transport,
};
