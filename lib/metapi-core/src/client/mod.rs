use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::operation::{Operation, OperationRegistry};
use crate::transport::Transport;

mod builder;
pub use self::builder::ApiClientBuilder;

mod diagnostics;
pub use self::diagnostics::{Diagnostics, TracingDiagnostics};

mod error;
pub use self::error::{ApiClientError, ErrorKind};

mod execution;

mod result;
pub use self::result::ApiResult;

mod verify;


/// Runs registered API operations and reports a uniform [`ApiResult`].
///
/// The client owns the base URL and the operation registry for its whole
/// lifetime; invocations only read them and may run concurrently. Use
/// [`ApiClientBuilder`] to create instances.
///
/// # Example
///
/// ```rust,no_run
/// use http::{Method, StatusCode};
/// use metapi_core::{ApiModel, ApiOperation, JsonSchema, MetaApiClient};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let model = ApiModel::new().with_operation(
///     ApiOperation::new("getPet", Method::GET, "/pets/{id}")
///         .with_response(StatusCode::OK, JsonSchema::new("Pet", json!({"type": "object"}))),
/// );
/// let client = MetaApiClient::builder()
///     .with_base_url("http://localhost:8080/api")?
///     .with_model(model)
///     .build()?;
///
/// let result = client.run_operation_by_id("getPet", json!({"id": 42})).await?;
/// if let Some(pet) = result.success() {
///     println!("{pet}");
/// } else {
///     eprintln!("{result}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MetaApiClient {
    base_url: Url,
    registry: Arc<dyn OperationRegistry>,
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn Diagnostics>,
}

// Create
impl MetaApiClient {
    /// Creates a builder with the default configuration.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }
}

// Accessors
impl MetaApiClient {
    /// The URL every operation path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The operation registry.
    pub fn registry(&self) -> &dyn OperationRegistry {
        self.registry.as_ref()
    }
}

// Run
impl MetaApiClient {
    /// Looks up an operation by id, then runs it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::InvalidOperation`] if the registry has no
    /// operation with this id. Every other problem is reported in the
    /// [`ApiResult`].
    pub async fn run_operation_by_id(
        &self,
        id: &str,
        request: Value,
    ) -> Result<ApiResult, ApiClientError> {
        let Some(operation) = self.registry.operation_by_id(id) else {
            return Err(ApiClientError::InvalidOperation { id: id.to_string() });
        };
        let result = self.run_operation(operation.as_ref(), request).await;
        Ok(result)
    }

    /// Runs an operation.
    ///
    /// The request is validated first: a request with validation errors gives
    /// an [`ApiResult::Mismatch`] and is never sent. Warnings are forwarded to
    /// the diagnostics sink and the request is sent anyway.
    pub async fn run_operation(&self, operation: &dyn Operation, request: Value) -> ApiResult {
        self.execute(operation, request).await
    }
}
