use std::sync::LazyLock;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use serde_json::Value;

use super::params::scalar_to_string;
use crate::client::ApiClientError;

/// Regular expression for matching path parameters in the format `{param_name}`.
static RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?<name>\w+)}").expect("a valid regex"));

fn encode_path_param_value(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// An HTTP path with `{name}` placeholders.
///
/// The same parameter may appear several times.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{template}")]
pub struct PathTemplate {
    template: String,
    names: Vec<String>,
}

impl PathTemplate {
    /// Parses a template.
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let mut names = Vec::<String>::new();
        for capture in RE.captures_iter(&template) {
            if let Some(name) = capture.name("name") {
                if !names.iter().any(|it| it == name.as_str()) {
                    names.push(name.as_str().to_string());
                }
            }
        }
        Self { template, names }
    }

    /// The parameter names, in order of first appearance.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Substitutes every placeholder with the matching field of `request`.
    ///
    /// Values are percent-encoded.
    ///
    /// # Errors
    ///
    /// Fails with [`ApiClientError::PathUnresolved`] when a field is absent or null,
    /// and with [`ApiClientError::UnsupportedParameterValue`] for arrays and objects.
    pub fn render(&self, request: &Value) -> Result<String, ApiClientError> {
        let mut path = self.template.clone();
        let mut missings = vec![];

        for name in &self.names {
            let value = match request.get(name) {
                None | Some(Value::Null) => {
                    missings.push(name.clone());
                    continue;
                }
                Some(value) => value,
            };
            let text = scalar_to_string(name, value)?;
            let pattern = ["{", name, "}"].concat();
            path = path.replace(&pattern, &encode_path_param_value(&text));
        }

        if !missings.is_empty() {
            return Err(ApiClientError::PathUnresolved {
                path: self.template.clone(),
                missings,
            });
        }

        Ok(path)
    }
}

impl From<&str> for PathTemplate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PathTemplate {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
