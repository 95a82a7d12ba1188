use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use serde_json::Value;

use crate::client::ApiClientError;

/// Converts a scalar JSON value into its parameter text.
pub(super) fn scalar_to_string(name: &str, value: &Value) -> Result<String, ApiClientError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(ApiClientError::UnsupportedParameterValue {
            name: name.to_string(),
            message: "expected a scalar value".to_string(),
            value: value.clone(),
        }),
    }
}

/// Builds a query string (`?a=1&b=2`) from the named fields of `request`.
///
/// Absent and null fields are skipped, arrays repeat the key (form style,
/// exploded) and objects are rejected. Returns an empty string when no
/// parameter is present.
pub(super) fn to_query_string(
    names: &[String],
    request: &Value,
) -> Result<String, ApiClientError> {
    let mut pairs = Vec::<(&str, String)>::new();
    for name in names {
        match request.get(name) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    pairs.push((name.as_str(), scalar_to_string(name, item)?));
                }
            }
            Some(value @ Value::Object(_)) => {
                return Err(ApiClientError::UnsupportedParameterValue {
                    name: name.clone(),
                    message: "objects are not supported for query parameters".to_string(),
                    value: value.clone(),
                });
            }
            Some(value) => pairs.push((name.as_str(), scalar_to_string(name, value)?)),
        }
    }

    if pairs.is_empty() {
        return Ok(String::new());
    }
    let query = serde_urlencoded::to_string(&pairs)?;
    Ok(format!("?{query}"))
}

/// Builds headers from the named fields of `request`.
///
/// Absent and null fields are skipped, arrays are joined with `,`.
pub(super) fn to_headers(names: &[String], request: &Value) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    for name in names {
        let text = match request.get(name) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| scalar_to_string(name, item))
                .collect::<Result<Vec<_>, _>>()?
                .join(","),
            Some(value) => scalar_to_string(name, value)?,
        };
        headers.insert(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(&text)?,
        );
    }
    Ok(headers)
}
