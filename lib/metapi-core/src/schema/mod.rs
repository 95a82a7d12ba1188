//! Schema validation capability.
//!
//! The pipeline only needs one thing from a schema: validate a JSON value and
//! report messages. A message is either an [`Severity::Error`] or a
//! [`Severity::Warning`]. What counts as fatal depends on the caller:
//!
//! - request validation stops on errors and logs warnings,
//! - response verification stops on any message.
//!
//! [`JsonSchema`] is the bundled implementation, but any type implementing
//! [`Schema`] can be plugged into an operation.

use std::borrow::Cow;
use std::fmt::{self, Debug, Display};

use serde::Serialize;
use serde_json::Value;

mod json;
pub use self::json::JsonSchema;

/// Severity of a [`ValidationMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The value does not conform to the schema.
    #[display("error")]
    Error,
    /// The value conforms, but something looks off (deprecated or undeclared field, ...).
    #[display("warning")]
    Warning,
}

/// A single diagnostic produced while validating a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationMessage {
    /// JSON pointer to the offending location, empty for the root value.
    pub path: String,
    /// Human readable description.
    pub message: String,
    /// How serious the issue is.
    pub severity: Severity,
}

impl ValidationMessage {
    /// Creates an error message at `path`.
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Creates a warning message at `path`.
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    /// Returns `true` for [`Severity::Error`] messages.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{path}: {}", self.message)
    }
}

/// A schema a JSON value can be validated against.
///
/// Implementations append messages in the order they are found; the order is
/// preserved all the way to [`ApiResult::messages`](crate::ApiResult::messages).
pub trait Schema: Debug + Send + Sync {
    /// A short name for diagnostics.
    fn name(&self) -> Cow<'_, str>;

    /// Validates `value`, pushing every issue found into `messages`.
    fn validate(&self, value: &Value, messages: &mut Vec<ValidationMessage>);
}

/// Outcome of one validation pass.
///
/// Holds the validated value, the schema name and every message in the order
/// the schema produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationContext {
    schema: String,
    value: Value,
    messages: Vec<ValidationMessage>,
}

impl ValidationContext {
    /// Validates `value` against `schema`.
    pub fn validate(value: Value, schema: &dyn Schema) -> Self {
        let mut messages = Vec::new();
        schema.validate(&value, &mut messages);
        Self {
            schema: schema.name().into_owned(),
            value,
            messages,
        }
    }

    /// Name of the schema used for this pass.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// The validated value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the context and gives the value back.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Every message, errors and warnings interleaved as produced.
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    /// Error messages only, in order.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.messages.iter().filter(|msg| msg.is_error())
    }

    /// Warning messages only, in order.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.messages.iter().filter(|msg| !msg.is_error())
    }

    /// Returns `true` if at least one error was reported.
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(ValidationMessage::is_error)
    }

    /// Returns `true` when nothing at all was reported.
    pub fn is_clean(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug)]
    struct Scripted(Vec<ValidationMessage>);

    impl Schema for Scripted {
        fn name(&self) -> Cow<'_, str> {
            Cow::Borrowed("Scripted")
        }

        fn validate(&self, _value: &Value, messages: &mut Vec<ValidationMessage>) {
            messages.extend(self.0.iter().cloned());
        }
    }

    #[test]
    fn should_keep_messages_order_and_split_by_severity() {
        let schema = Scripted(vec![
            ValidationMessage::warning("/a", "first"),
            ValidationMessage::error("/b", "second"),
            ValidationMessage::warning("", "third"),
            ValidationMessage::error("/c", "fourth"),
        ]);

        let ctx = ValidationContext::validate(json!({"a": 1}), &schema);

        assert_eq!(ctx.schema(), "Scripted");
        assert!(ctx.has_errors());
        assert!(!ctx.is_clean());
        let errors = ctx.errors().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(errors, ["/b: second", "/c: fourth"]);
        let warnings = ctx.warnings().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(warnings, ["/a: first", "/: third"]);
    }

    #[test]
    fn should_be_clean_without_messages() {
        let ctx = ValidationContext::validate(json!(null), &Scripted(vec![]));

        assert!(ctx.is_clean());
        assert!(!ctx.has_errors());
        assert_eq!(ctx.into_value(), Value::Null);
    }
}
