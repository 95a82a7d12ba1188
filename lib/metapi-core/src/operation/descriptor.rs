use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};
use indexmap::IndexMap;
use serde_json::Value;

use super::params::{to_headers, to_query_string};
use super::{Operation, PathTemplate};
use crate::client::ApiClientError;
use crate::schema::{JsonSchema, Schema};

/// Where the request body comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BodySource {
    /// No body is sent.
    #[default]
    None,
    /// The whole request value is the body.
    Request,
    /// The value of one request field is the body (no body if absent or null).
    Field(String),
    /// The request object without the path, query and header parameters.
    Remaining,
}

/// A declarative [`Operation`].
///
/// The request value is expected to be a JSON object. Path placeholders, query
/// parameters and header parameters are read from its fields.
///
/// # Example
///
/// ```rust
/// use http::{Method, StatusCode};
/// use metapi_core::{ApiOperation, BodySource, JsonSchema, Operation};
/// use serde_json::json;
///
/// let operation = ApiOperation::new("updatePet", Method::PUT, "/pets/{id}")
///     .with_query_params(["dry_run"])
///     .with_header_params(["x-request-id"])
///     .with_body(BodySource::Field("pet".to_string()))
///     .with_response(StatusCode::OK, JsonSchema::new("Pet", json!({"type": "object"})));
///
/// let request = json!({
///     "id": 7,
///     "dry_run": true,
///     "x-request-id": "abc",
///     "pet": { "name": "Rex" }
/// });
///
/// assert_eq!(operation.path(&request)?, "/pets/7");
/// assert_eq!(operation.query(&request)?, "?dry_run=true");
/// assert_eq!(operation.body(&request)?.as_deref(), Some(r#"{"name":"Rex"}"#));
/// assert!(operation.response_schema(StatusCode::OK).is_some());
/// assert!(operation.response_schema(StatusCode::NOT_FOUND).is_none());
/// # Ok::<(), metapi_core::ApiClientError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ApiOperation {
    id: String,
    method: Method,
    path: PathTemplate,
    query_params: Vec<String>,
    header_params: Vec<String>,
    body: BodySource,
    request_schema: Arc<dyn Schema>,
    responses: IndexMap<StatusCode, Arc<dyn Schema>>,
}

impl ApiOperation {
    /// Creates an operation without parameters, body or response schema.
    ///
    /// The request schema accepts anything until
    /// [`with_request_schema`](Self::with_request_schema) is called.
    pub fn new(id: impl Into<String>, method: Method, path: impl Into<PathTemplate>) -> Self {
        Self {
            id: id.into(),
            method,
            path: path.into(),
            query_params: vec![],
            header_params: vec![],
            body: BodySource::None,
            request_schema: Arc::new(JsonSchema::any()),
            responses: IndexMap::new(),
        }
    }

    /// Sets the request fields sent as query parameters.
    pub fn with_query_params<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.query_params = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the request fields sent as headers; field names are header names.
    pub fn with_header_params<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.header_params = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets where the body comes from.
    pub fn with_body(mut self, body: BodySource) -> Self {
        self.body = body;
        self
    }

    /// Sets the schema the request value must follow.
    pub fn with_request_schema(mut self, schema: impl Schema + 'static) -> Self {
        self.request_schema = Arc::new(schema);
        self
    }

    /// Registers the schema of the response for a status code.
    pub fn with_response(mut self, status: StatusCode, schema: impl Schema + 'static) -> Self {
        self.responses.insert(status, Arc::new(schema));
        self
    }

    /// The path template.
    pub fn path_template(&self) -> &PathTemplate {
        &self.path
    }

    fn remaining_fields(&self, request: &Value) -> Value {
        let Value::Object(fields) = request else {
            return request.clone();
        };
        let consumed = self
            .path
            .names()
            .iter()
            .chain(&self.query_params)
            .chain(&self.header_params)
            .collect::<Vec<_>>();
        let remaining = fields
            .iter()
            .filter(|(name, _)| !consumed.contains(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Value::Object(remaining)
    }
}

impl Operation for ApiOperation {
    fn id(&self) -> &str {
        &self.id
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self, request: &Value) -> Result<String, ApiClientError> {
        self.path.render(request)
    }

    fn query(&self, request: &Value) -> Result<String, ApiClientError> {
        to_query_string(&self.query_params, request)
    }

    fn body(&self, request: &Value) -> Result<Option<String>, ApiClientError> {
        let body = match &self.body {
            BodySource::None => return Ok(None),
            BodySource::Request => request.clone(),
            BodySource::Field(name) => match request.get(name) {
                None | Some(Value::Null) => return Ok(None),
                Some(value) => value.clone(),
            },
            BodySource::Remaining => self.remaining_fields(request),
        };
        let body = serde_json::to_string(&body)?;
        Ok(Some(body))
    }

    fn headers(&self, request: &Value) -> Result<HeaderMap, ApiClientError> {
        to_headers(&self.header_params, request)
    }

    fn request_schema(&self) -> &dyn Schema {
        self.request_schema.as_ref()
    }

    fn response_schema(&self, status: StatusCode) -> Option<&dyn Schema> {
        self.responses.get(&status).map(AsRef::as_ref)
    }
}
