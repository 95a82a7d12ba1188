use http::StatusCode;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{ApiClientError, Diagnostics};
use crate::operation::Operation;
use crate::schema::ValidationContext;

/// Checks a decoded response body against the schema registered for its status.
///
/// A status without a registered schema is not verified. When a schema is
/// registered, any message it reports, warnings included, rejects the response.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Verifier<'a> {
    operation: &'a dyn Operation,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> Verifier<'a> {
    pub(crate) fn new(operation: &'a dyn Operation, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            operation,
            diagnostics,
        }
    }

    /// Returns the value unchanged once verified.
    pub(crate) fn verify(
        &self,
        status: StatusCode,
        url: &Url,
        value: Value,
    ) -> Result<Value, ApiClientError> {
        let Some(schema) = self.operation.response_schema(status) else {
            debug!(
                operation = self.operation.id(),
                %status,
                "no response schema registered, skipping verification"
            );
            return Ok(value);
        };

        let validation = ValidationContext::validate(value, schema);
        if !validation.is_clean() {
            return Err(ApiClientError::InvalidResponse {
                status,
                validation: Box::new(validation),
            });
        }

        self.diagnostics
            .info(&format!("validated response (successfully) from {url}"));
        Ok(validation.into_value())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::Method;
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::operation::ApiOperation;
    use crate::schema::JsonSchema;

    #[derive(Debug, Default)]
    struct InfoRecorder {
        infos: Mutex<Vec<String>>,
    }

    impl Diagnostics for InfoRecorder {
        fn warn(&self, _message: &str, _context: &ValidationContext) {}

        fn info(&self, message: &str) {
            self.infos.lock().expect("not poisoned").push(message.to_string());
        }
    }

    #[fixture]
    fn operation() -> ApiOperation {
        let pet = json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string" },
                "tag": { "type": "string", "deprecated": true }
            }
        });
        ApiOperation::new("getPet", Method::GET, "/pets/{id}")
            .with_response(StatusCode::OK, JsonSchema::new("Pet", pet))
    }

    #[fixture]
    fn url() -> Url {
        "http://localhost/pets/1".parse().expect("valid url")
    }

    #[rstest]
    fn should_pass_valid_response(operation: ApiOperation, url: Url) {
        let diagnostics = InfoRecorder::default();
        let verifier = Verifier::new(&operation, &diagnostics);

        let value = verifier
            .verify(StatusCode::OK, &url, json!({"name": "Rex"}))
            .expect("valid response");

        assert_eq!(value, json!({"name": "Rex"}));
        let infos = diagnostics.infos.lock().expect("not poisoned");
        assert_eq!(
            infos.as_slice(),
            ["validated response (successfully) from http://localhost/pets/1"]
        );
    }

    #[rstest]
    fn should_skip_unregistered_status(operation: ApiOperation, url: Url) {
        let diagnostics = InfoRecorder::default();
        let verifier = Verifier::new(&operation, &diagnostics);

        let value = verifier
            .verify(StatusCode::NOT_FOUND, &url, json!("anything"))
            .expect("not verified");

        assert_eq!(value, json!("anything"));
        assert!(diagnostics.infos.lock().expect("not poisoned").is_empty());
    }

    #[rstest]
    #[case::error(json!({"tag": "dog"}))]
    #[case::warning(json!({"name": "Rex", "tag": "dog"}))]
    fn should_reject_any_message(operation: ApiOperation, url: Url, #[case] body: Value) {
        let diagnostics = InfoRecorder::default();
        let verifier = Verifier::new(&operation, &diagnostics);

        let error = verifier
            .verify(StatusCode::OK, &url, body.clone())
            .expect_err("invalid response");

        assert_eq!(error.to_string(), "invalid response received");
        assert_eq!(error.http_status(), Some(StatusCode::OK));
        assert!(!error.messages().is_empty());
        assert_eq!(error.validation().map(ValidationContext::value), Some(&body));
    }
}
