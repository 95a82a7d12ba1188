use headers::{ContentType, HeaderMapExt};
use http::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::verify::Verifier;
use super::{ApiClientError, ApiResult, MetaApiClient};
use crate::operation::Operation;
use crate::schema::ValidationContext;
use crate::transport::{HttpRequest, RequestMode};

impl MetaApiClient {
    pub(super) async fn execute(&self, operation: &dyn Operation, request: Value) -> ApiResult {
        let validation = ValidationContext::validate(request, operation.request_schema());
        if validation.has_errors() {
            let messages = validation.errors().cloned().collect::<Vec<_>>();
            debug!(
                operation = operation.id(),
                errors = messages.len(),
                "request rejected before sending"
            );
            return ApiResult::mismatch(messages);
        }
        if !validation.is_clean() {
            self.diagnostics.warn(
                &format!("request of '{}' has validation warnings", operation.id()),
                &validation,
            );
        }

        let request = validation.into_value();
        match self.exchange(operation, &request).await {
            Ok(result) => result,
            Err(error) => {
                warn!(operation = operation.id(), %error, "operation failed");
                ApiResult::failure(error)
            }
        }
    }

    async fn exchange(
        &self,
        operation: &dyn Operation,
        request: &Value,
    ) -> Result<ApiResult, ApiClientError> {
        let request = self.build_request(operation, request)?;

        let response = self.transport.send(request).await?;

        let value = decode_body(&response.body)?;
        let status = response.status;
        let value = Verifier::new(operation, self.diagnostics.as_ref()).verify(
            status,
            &response.url,
            value,
        )?;

        let result = if status.as_u16() < 400 {
            ApiResult::Success { status, value }
        } else {
            ApiResult::Failure {
                error: ApiClientError::HttpStatus { status },
                response: Some(value),
            }
        };
        Ok(result)
    }

    pub(super) fn build_request(
        &self,
        operation: &dyn Operation,
        request: &Value,
    ) -> Result<HttpRequest, ApiClientError> {
        let path = operation.path(request)?;
        let query = operation.query(request)?;
        let url = build_url(&self.base_url, &path, &query)?;

        let mut headers = operation.headers(request)?;
        let body = operation.body(request)?;
        if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.typed_insert(ContentType::json());
        }

        Ok(HttpRequest {
            method: operation.method().clone(),
            url,
            headers,
            body,
            mode: RequestMode::Cors,
        })
    }
}

pub(super) fn build_url(base_url: &Url, path: &str, query: &str) -> Result<Url, ApiClientError> {
    let base = base_url.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let url = if path.is_empty() {
        format!("{base}{query}")
    } else {
        format!("{base}/{path}{query}")
    };
    let url = url.parse::<Url>()?;
    Ok(url)
}

/// An empty body decodes to an empty object.
fn decode_body(text: &str) -> Result<Value, ApiClientError> {
    if text.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    let value = serde_json::from_str(text)?;
    Ok(value)
}
