//! Operation descriptors and their registry.
//!
//! An [`Operation`] describes one API call: its method, how a request value is
//! turned into a path, a query string, headers and a body, and which schemas
//! the request and the responses must follow. An [`OperationRegistry`] maps
//! operation ids to descriptors.

use std::fmt::Debug;
use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};
use indexmap::IndexMap;
use serde_json::Value;

use crate::client::ApiClientError;
use crate::schema::Schema;

mod descriptor;
pub use self::descriptor::{ApiOperation, BodySource};

mod params;

mod path;
pub use self::path::PathTemplate;

/// Static description of one API operation.
///
/// The shaping functions receive the raw request value and may fail; a failure
/// turns the invocation into a [`Failure`](crate::ApiResult::Failure).
pub trait Operation: Debug + Send + Sync {
    /// Unique operation id.
    fn id(&self) -> &str;

    /// HTTP method.
    fn method(&self) -> &Method;

    /// The request path, starting with `/`.
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be built from the request.
    fn path(&self, request: &Value) -> Result<String, ApiClientError>;

    /// The query string, starting with `?`, or an empty string.
    ///
    /// # Errors
    ///
    /// Fails if a parameter value is not supported.
    fn query(&self, request: &Value) -> Result<String, ApiClientError>;

    /// The serialized request body, if any.
    ///
    /// # Errors
    ///
    /// Fails if the body cannot be serialized.
    fn body(&self, request: &Value) -> Result<Option<String>, ApiClientError>;

    /// The request headers.
    ///
    /// # Errors
    ///
    /// Fails on invalid header names or values.
    fn headers(&self, request: &Value) -> Result<HeaderMap, ApiClientError>;

    /// Schema the request value must follow.
    fn request_schema(&self) -> &dyn Schema;

    /// Schema registered for a response status, if any.
    fn response_schema(&self, status: StatusCode) -> Option<&dyn Schema>;
}

/// Looks up operations by id.
pub trait OperationRegistry: Debug + Send + Sync {
    /// Returns the operation with this id.
    fn operation_by_id(&self, id: &str) -> Option<Arc<dyn Operation>>;
}

/// An in-memory [`OperationRegistry`], in registration order.
///
/// ```rust
/// use http::Method;
/// use metapi_core::{ApiModel, ApiOperation, OperationRegistry};
///
/// let model = ApiModel::new()
///     .with_operation(ApiOperation::new("listPets", Method::GET, "/pets"))
///     .with_operation(ApiOperation::new("getPet", Method::GET, "/pets/{id}"));
///
/// assert!(model.operation_by_id("getPet").is_some());
/// assert!(model.operation_by_id("deletePet").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ApiModel {
    operations: IndexMap<String, Arc<dyn Operation>>,
}

impl ApiModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operation, replacing any operation with the same id.
    pub fn with_operation(mut self, operation: impl Operation + 'static) -> Self {
        self.add_operation(Arc::new(operation));
        self
    }

    /// Adds a shared operation, returning the one it replaces.
    pub fn add_operation(&mut self, operation: Arc<dyn Operation>) -> Option<Arc<dyn Operation>> {
        self.operations
            .insert(operation.id().to_string(), operation)
    }

    /// Iterates over the operations.
    pub fn operations(&self) -> impl Iterator<Item = &Arc<dyn Operation>> {
        self.operations.values()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` when no operation is registered.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl OperationRegistry for ApiModel {
    fn operation_by_id(&self, id: &str) -> Option<Arc<dyn Operation>> {
        self.operations.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_register_operations_in_order() {
        let model = ApiModel::new()
            .with_operation(ApiOperation::new("listPets", Method::GET, "/pets"))
            .with_operation(ApiOperation::new("createPet", Method::POST, "/pets"));

        let ids = model.operations().map(|op| op.id()).collect::<Vec<_>>();

        assert_eq!(ids, ["listPets", "createPet"]);
        assert_eq!(model.len(), 2);
        assert!(!model.is_empty());
    }

    #[test]
    fn should_replace_operation_with_same_id() {
        let mut model =
            ApiModel::new().with_operation(ApiOperation::new("getPet", Method::GET, "/pets/{id}"));

        let previous = model.add_operation(Arc::new(ApiOperation::new(
            "getPet",
            Method::GET,
            "/v2/pets/{id}",
        )));

        assert!(previous.is_some());
        assert_eq!(model.len(), 1);
        let path = model
            .operation_by_id("getPet")
            .map(|op| op.path(&serde_json::json!({"id": 1})))
            .transpose()
            .expect("valid path");
        assert_eq!(path.as_deref(), Some("/v2/pets/1"));
    }

    #[test]
    fn should_not_find_unknown_operation() {
        let model = ApiModel::new();

        assert!(model.operation_by_id("nope").is_none());
        assert!(model.is_empty());
    }
}
