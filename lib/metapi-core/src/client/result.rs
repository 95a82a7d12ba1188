use std::fmt::{self, Display};

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ApiClientError;
use crate::schema::ValidationMessage;

/// Outcome of one operation invocation.
///
/// Expected failures are data, not errors: callers branch on the variant (or
/// on [`is_success`](Self::is_success)) rather than on a `Result`.
///
/// ```rust
/// use http::StatusCode;
/// use metapi_core::ApiResult;
/// use serde_json::json;
///
/// let result = ApiResult::Success {
///     status: StatusCode::OK,
///     value: json!({"id": 1}),
/// };
///
/// assert!(result.is_success());
/// assert_eq!(result.success(), Some(&json!({"id": 1})));
/// assert!(result.error().is_none());
/// ```
#[derive(Debug)]
pub enum ApiResult {
    /// The response was received, decoded and, when a schema is registered for
    /// its status, verified.
    Success {
        /// The response status, always below `400`.
        status: StatusCode,
        /// The decoded body.
        value: Value,
    },

    /// The request value failed its schema validation; nothing was sent.
    Mismatch {
        /// Always an [`ApiClientError::ParameterValidation`].
        error: ApiClientError,
    },

    /// The call failed.
    Failure {
        /// Why the call failed.
        error: ApiClientError,
        /// The decoded body that came with an error status.
        ///
        /// `None` when the failure happened before a body could be decoded and
        /// verified.
        response: Option<Value>,
    },
}

impl ApiResult {
    pub(crate) fn mismatch(messages: Vec<ValidationMessage>) -> Self {
        Self::Mismatch {
            error: ApiClientError::ParameterValidation { messages },
        }
    }

    pub(crate) fn failure(error: ApiClientError) -> Self {
        Self::Failure {
            error,
            response: None,
        }
    }

    /// Returns `true` for [`ApiResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The verified value of a success.
    pub fn success(&self) -> Option<&Value> {
        match self {
            Self::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The response body, if one was received.
    ///
    /// Same as [`success`](Self::success) for a success, the body attached to
    /// an error status for a failure.
    pub fn response(&self) -> Option<&Value> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Failure { response, .. } => response.as_ref(),
            Self::Mismatch { .. } => None,
        }
    }

    /// The error of a mismatch or a failure.
    pub fn error(&self) -> Option<&ApiClientError> {
        match self {
            Self::Success { .. } => None,
            Self::Mismatch { error } | Self::Failure { error, .. } => Some(error),
        }
    }

    /// The request validation errors of a mismatch, in order.
    pub fn messages(&self) -> &[ValidationMessage] {
        match self {
            Self::Mismatch { error } => error.messages(),
            _ => &[],
        }
    }

    /// The HTTP status of the response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::Failure { error, .. } => error.http_status(),
            Self::Mismatch { .. } => None,
        }
    }

    /// Converts into the verified value of a success.
    ///
    /// # Errors
    ///
    /// Returns the held error for a mismatch or a failure.
    pub fn into_success(self) -> Result<Value, ApiClientError> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Mismatch { error } | Self::Failure { error, .. } => Err(error),
        }
    }

    /// Deserializes the value of a success.
    ///
    /// # Errors
    ///
    /// Returns the held error for a mismatch or a failure, and
    /// [`ApiClientError::JsonError`] when the value does not fit `T`.
    pub fn into_json<T>(self) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        let value = self.into_success()?;
        serde_path_to_error::deserialize(value).map_err(|err| ApiClientError::JsonError {
            path: err.path().to_string(),
            error: err.into_inner(),
        })
    }
}

impl Display for ApiResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { status, value } => write!(f, "{status}: {value}"),
            Self::Mismatch { error } => {
                for (index, message) in error.messages().iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{message}")?;
                }
                Ok(())
            }
            Self::Failure { error, .. } => write!(f, "{error}"),
        }
    }
}
