use http::StatusCode;

use crate::schema::{ValidationContext, ValidationMessage};

/// Broad category of an [`ApiClientError`].
///
/// Callers usually branch on the [`ApiResult`](crate::ApiResult) variant; the
/// kind is there when the error itself needs to be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorKind {
    /// The operation id is not known by the registry.
    InvalidOperation,
    /// The request value does not match the operation request schema.
    RequestValidation,
    /// The response body does not match the schema declared for its status.
    ResponseVerification,
    /// The request could not be shaped, sent or decoded.
    Transport,
    /// The server answered with a status code of 400 or more.
    HttpStatus,
    /// The client or a schema was wrongly configured.
    Configuration,
}

/// Errors that can occur when running an API operation.
///
/// Every variant maps to an [`ErrorKind`], see [`ApiClientError::kind`].
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ApiClientError {
    /// HTTP client error from the underlying reqwest library.
    ///
    /// Occurs when network requests fail or connection issues arise.
    ReqwestError(reqwest::Error),

    /// URL parsing error when constructing request URLs.
    UrlError(url::ParseError),

    /// HTTP protocol error from the http crate.
    HttpError(http::Error),

    /// Invalid HTTP header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid HTTP header value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// JSON serialization/deserialization error.
    ///
    /// Occurs when the response body is not valid JSON, or when a request
    /// body cannot be serialized.
    JsonValueError(serde_json::Error),

    /// Query parameter serialization error.
    QuerySerializationError(serde_urlencoded::ser::Error),

    /// The registry has no operation with this id.
    #[display("Invalid operation: {id}")]
    #[from(skip)]
    InvalidOperation {
        /// The unknown operation id.
        id: String,
    },

    /// The request value failed its schema validation.
    #[display("parameter validation failed")]
    #[from(skip)]
    ParameterValidation {
        /// The validation errors, in order.
        messages: Vec<ValidationMessage>,
    },

    /// The response body does not match the schema registered for its status code.
    #[display("invalid response received")]
    #[from(skip)]
    InvalidResponse {
        /// The observed status code.
        status: StatusCode,
        /// The full validation pass, value included.
        validation: Box<ValidationContext>,
    },

    /// The server answered with a non-success status code.
    #[display("{status}")]
    #[from(skip)]
    HttpStatus {
        /// The observed status code.
        status: StatusCode,
    },

    /// Failure reported by a custom transport.
    #[display("Transport failure: {message}")]
    #[from(skip)]
    TransportFailure {
        /// Description of the failure.
        message: String,
    },

    /// Invalid base path configuration.
    #[display("Invalid base path: {error}")]
    #[from(skip)]
    InvalidBasePath {
        /// Description of why the base path is invalid.
        error: String,
    },

    /// A schema document could not be loaded.
    #[display("Invalid schema '{name}': {message}")]
    #[from(skip)]
    InvalidSchema {
        /// Name of the schema.
        name: String,
        /// Description of the problem.
        message: String,
    },

    /// Path template contains unresolved parameters.
    #[display("Path '{path}' is missing required arguments: {missings:?}")]
    #[from(skip)]
    PathUnresolved {
        /// The path template that couldn't be resolved.
        path: String,
        /// List of missing parameter names.
        missings: Vec<String>,
    },

    /// Parameter value cannot be converted to the required format.
    #[display("Unsupported parameter value for '{name}': {message}. Got: {value}")]
    #[from(skip)]
    UnsupportedParameterValue {
        /// The parameter name.
        name: String,
        /// Specific error message describing the conversion failure.
        message: String,
        /// The value that failed to convert.
        value: serde_json::Value,
    },

    /// JSON response deserialization into a typed value failed.
    #[display("Failed to deserialize JSON at '{path}': {error}")]
    #[from(skip)]
    JsonError {
        /// Location of the error in the value.
        path: String,
        /// The underlying JSON error.
        error: serde_json::Error,
    },
}

impl ApiClientError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            Self::ParameterValidation { .. } => ErrorKind::RequestValidation,
            Self::InvalidResponse { .. } => ErrorKind::ResponseVerification,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
            Self::InvalidBasePath { .. } | Self::InvalidSchema { .. } => {
                ErrorKind::Configuration
            }
            Self::ReqwestError(_)
            | Self::UrlError(_)
            | Self::HttpError(_)
            | Self::InvalidHeaderName(_)
            | Self::InvalidHeaderValue(_)
            | Self::JsonValueError(_)
            | Self::QuerySerializationError(_)
            | Self::TransportFailure { .. }
            | Self::PathUnresolved { .. }
            | Self::UnsupportedParameterValue { .. }
            | Self::JsonError { .. } => ErrorKind::Transport,
        }
    }

    /// The HTTP status that caused this error, if any.
    pub fn http_status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status } | Self::InvalidResponse { status, .. } => Some(*status),
            Self::ReqwestError(error) => error.status(),
            _ => None,
        }
    }

    /// Validation messages carried by this error.
    ///
    /// Empty unless the error is a request validation or response verification failure.
    pub fn messages(&self) -> &[ValidationMessage] {
        match self {
            Self::ParameterValidation { messages } => messages,
            Self::InvalidResponse { validation, .. } => validation.messages(),
            _ => &[],
        }
    }

    /// The validation context of a response verification failure.
    pub fn validation(&self) -> Option<&ValidationContext> {
        match self {
            Self::InvalidResponse { validation, .. } => Some(validation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use serde_json::json;

    use super::*;
    use crate::schema::JsonSchema;

    #[test]
    fn test_api_client_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ApiClientError>();
        assert_sync::<ApiClientError>();
    }

    #[test]
    fn should_describe_invalid_operation() {
        let error = ApiClientError::InvalidOperation {
            id: "getPet".to_string(),
        };

        assert_eq!(error.kind(), ErrorKind::InvalidOperation);
        assert_eq!(error.http_status(), None);
        assert!(error.source().is_none());
        insta::assert_snapshot!(error, @"Invalid operation: getPet");
    }

    #[test]
    fn should_describe_http_status() {
        let error = ApiClientError::HttpStatus {
            status: StatusCode::NOT_FOUND,
        };

        assert_eq!(error.kind(), ErrorKind::HttpStatus);
        assert_eq!(error.http_status(), Some(StatusCode::NOT_FOUND));
        insta::assert_snapshot!(error, @"404 Not Found");
    }

    #[test]
    fn should_carry_response_validation() {
        let schema = JsonSchema::new("Pet", json!({"type": "object"}));
        let validation = ValidationContext::validate(json!([]), &schema);
        let error = ApiClientError::InvalidResponse {
            status: StatusCode::OK,
            validation: Box::new(validation),
        };

        assert_eq!(error.kind(), ErrorKind::ResponseVerification);
        assert_eq!(error.to_string(), "invalid response received");
        assert_eq!(error.messages().len(), 1);
        assert_eq!(
            error.validation().map(ValidationContext::value),
            Some(&json!([]))
        );
    }

    #[test]
    fn should_map_json_errors_to_transport_kind() {
        let error = ApiClientError::from(
            serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json"),
        );

        assert_eq!(error.kind(), ErrorKind::Transport);
        assert!(error.messages().is_empty());
    }
}
