use std::borrow::Cow;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;
use utoipa::ToSchema;

use super::{Schema, ValidationMessage};
use crate::client::ApiClientError;

/// Guard against reference cycles and absurdly nested documents.
const MAX_DEPTH: usize = 64;

const REF_PREFIXES: [&str; 3] = ["#/components/schemas/", "#/$defs/", "#/definitions/"];

/// A JSON Schema (OpenAPI 3.1 flavour) validator.
///
/// Supported keywords: `$ref`, `type` (single or list), `nullable`, `enum`,
/// `const`, `required`, `properties`, `additionalProperties`, `items`,
/// `minItems`, `maxItems`, `uniqueItems`, `minLength`, `maxLength`, `pattern`,
/// `minimum`, `maximum`, `exclusiveMinimum`, `exclusiveMaximum`, `allOf`,
/// `anyOf`, `oneOf` and `deprecated`. Other keywords are ignored.
///
/// Two situations produce warnings instead of errors:
/// - a property not declared in `properties` while `additionalProperties` is absent,
/// - a value matched by a schema flagged `deprecated`.
///
/// # Example
///
/// ```rust
/// use metapi_core::{JsonSchema, Schema, ValidationContext};
/// use serde_json::json;
///
/// let schema = JsonSchema::new("Pet", json!({
///     "type": "object",
///     "required": ["name"],
///     "properties": { "name": { "type": "string" } }
/// }));
///
/// let ctx = ValidationContext::validate(json!({ "name": 42 }), &schema);
/// assert_eq!(ctx.messages()[0].to_string(), "/name: expected string, got number");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSchema {
    name: String,
    root: Value,
    definitions: IndexMap<String, Value>,
}

impl JsonSchema {
    /// Creates a schema from its JSON representation.
    ///
    /// Definitions found under `$defs`, `definitions` or `components.schemas`
    /// of the document are registered for `$ref` resolution.
    pub fn new(name: impl Into<String>, root: Value) -> Self {
        let mut definitions = IndexMap::new();
        let embedded = [
            root.get("$defs"),
            root.get("definitions"),
            root.get("components").and_then(|it| it.get("schemas")),
        ];
        for defs in embedded.into_iter().flatten().filter_map(Value::as_object) {
            for (def_name, def) in defs {
                definitions.insert(def_name.clone(), def.clone());
            }
        }

        Self {
            name: name.into(),
            root,
            definitions,
        }
    }

    /// A schema accepting any value.
    pub fn any() -> Self {
        Self::new("any", Value::Bool(true))
    }

    /// Builds the schema of a Rust type deriving [`ToSchema`].
    ///
    /// Nested types referenced by `T` are registered as definitions.
    ///
    /// # Errors
    ///
    /// Fails if the generated schema cannot be turned into JSON.
    pub fn of<T>() -> Result<Self, ApiClientError>
    where
        T: ToSchema,
    {
        let mut nested = Vec::new();
        T::schemas(&mut nested);

        let root = serde_json::to_value(T::schema())?;
        let mut result = Self::new(T::name(), root);
        for (def_name, def) in nested {
            let def = serde_json::to_value(def)?;
            result.definitions.insert(def_name, def);
        }
        Ok(result)
    }

    /// Parses a YAML schema document.
    ///
    /// # Errors
    ///
    /// Fails if the document is not valid YAML.
    #[cfg(feature = "yaml")]
    pub fn from_yaml(name: impl Into<String>, yaml: &str) -> Result<Self, ApiClientError> {
        let name = name.into();
        let root = serde_saphyr::from_str::<Value>(yaml).map_err(|err| {
            ApiClientError::InvalidSchema {
                name: name.clone(),
                message: err.to_string(),
            }
        })?;
        Ok(Self::new(name, root))
    }

    /// Registers a definition usable through `#/components/schemas/{name}`.
    pub fn with_definition(mut self, name: impl Into<String>, definition: Value) -> Self {
        self.definitions.insert(name.into(), definition);
        self
    }

    /// The raw schema document.
    pub fn as_value(&self) -> &Value {
        &self.root
    }
}

impl Schema for JsonSchema {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn validate(&self, value: &Value, messages: &mut Vec<ValidationMessage>) {
        let validator = Validator {
            definitions: &self.definitions,
        };
        validator.check(&self.root, value, "", 0, &[], messages);
    }
}

struct Validator<'a> {
    definitions: &'a IndexMap<String, Value>,
}

impl Validator<'_> {
    fn resolve(&self, reference: &str) -> Option<&Value> {
        REF_PREFIXES
            .iter()
            .find_map(|prefix| reference.strip_prefix(prefix))
            .and_then(|name| self.definitions.get(name))
    }

    /// `siblings` lists property names declared by sibling `allOf` branches.
    fn check(
        &self,
        schema: &Value,
        value: &Value,
        path: &str,
        depth: usize,
        siblings: &[String],
        out: &mut Vec<ValidationMessage>,
    ) {
        if depth > MAX_DEPTH {
            out.push(ValidationMessage::warning(path, "schema nesting is too deep"));
            return;
        }

        let rules = match schema {
            Value::Bool(true) => return,
            Value::Bool(false) => {
                out.push(ValidationMessage::error(path, "no value is allowed here"));
                return;
            }
            Value::Object(rules) => rules,
            _ => {
                warn!(%path, "ignoring malformed schema");
                return;
            }
        };

        if let Some(reference) = rules.get("$ref").and_then(Value::as_str) {
            match self.resolve(reference) {
                Some(target) => self.check(target, value, path, depth + 1, siblings, out),
                None => out.push(ValidationMessage::warning(
                    path,
                    format!("unresolved schema reference '{reference}'"),
                )),
            }
        }

        if rules.get("deprecated") == Some(&Value::Bool(true)) {
            out.push(ValidationMessage::warning(path, "deprecated"));
        }

        if !Self::check_type(rules, value, path, out) {
            return;
        }

        if let Some(Value::Array(allowed)) = rules.get("enum") {
            if !allowed.contains(value) {
                out.push(ValidationMessage::error(
                    path,
                    format!("{value} is not one of {}", Value::Array(allowed.clone())),
                ));
            }
        }
        if let Some(expected) = rules.get("const") {
            if expected != value {
                out.push(ValidationMessage::error(
                    path,
                    format!("expected constant {expected}"),
                ));
            }
        }

        self.check_composition(rules, value, path, depth, out);

        match value {
            Value::Object(object) => self.check_object(rules, object, path, depth, siblings, out),
            Value::Array(items) => self.check_array(rules, items, path, depth, out),
            Value::String(text) => Self::check_string(rules, text, path, out),
            Value::Number(_) => Self::check_number(rules, value, path, out),
            Value::Null | Value::Bool(_) => {}
        }
    }

    /// Returns `false` when nothing else should be checked for this value.
    fn check_type(
        rules: &Map<String, Value>,
        value: &Value,
        path: &str,
        out: &mut Vec<ValidationMessage>,
    ) -> bool {
        if value.is_null() && rules.get("nullable") == Some(&Value::Bool(true)) {
            return false;
        }

        let expected = match rules.get("type") {
            None => return true,
            Some(Value::String(ty)) => vec![ty.as_str()],
            Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
            Some(other) => {
                warn!(%path, %other, "ignoring malformed type");
                return true;
            }
        };

        if expected.iter().any(|ty| type_matches(ty, value)) {
            return true;
        }

        out.push(ValidationMessage::error(
            path,
            format!("expected {}, got {}", expected.join(" or "), type_name(value)),
        ));
        false
    }

    fn check_composition(
        &self,
        rules: &Map<String, Value>,
        value: &Value,
        path: &str,
        depth: usize,
        out: &mut Vec<ValidationMessage>,
    ) {
        if let Some(Value::Array(branches)) = rules.get("allOf") {
            let mut declared = declared_properties(rules);
            for branch in branches {
                let branch = self.follow_ref(branch);
                if let Some(branch) = branch.as_object() {
                    declared.extend(declared_properties(branch));
                }
            }
            for branch in branches {
                self.check(branch, value, path, depth + 1, &declared, out);
            }
        }

        if let Some(Value::Array(branches)) = rules.get("anyOf") {
            let matched = branches.iter().find_map(|branch| {
                let mut scratch = Vec::new();
                self.check(branch, value, path, depth + 1, &[], &mut scratch);
                (!scratch.iter().any(ValidationMessage::is_error)).then_some(scratch)
            });
            match matched {
                Some(scratch) => out.extend(scratch),
                None => out.push(ValidationMessage::error(
                    path,
                    "value does not match any of the expected schemas",
                )),
            }
        }

        if let Some(Value::Array(branches)) = rules.get("oneOf") {
            let mut matches = branches.iter().filter_map(|branch| {
                let mut scratch = Vec::new();
                self.check(branch, value, path, depth + 1, &[], &mut scratch);
                (!scratch.iter().any(ValidationMessage::is_error)).then_some(scratch)
            });
            match (matches.next(), matches.next()) {
                (Some(scratch), None) => out.extend(scratch),
                (None, _) => out.push(ValidationMessage::error(
                    path,
                    "value does not match any of the expected schemas",
                )),
                (Some(_), Some(_)) => out.push(ValidationMessage::error(
                    path,
                    "value matches more than one exclusive schema",
                )),
            }
        }
    }

    fn follow_ref<'s>(&'s self, schema: &'s Value) -> &'s Value {
        schema
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|reference| self.resolve(reference))
            .unwrap_or(schema)
    }

    fn check_object(
        &self,
        rules: &Map<String, Value>,
        object: &Map<String, Value>,
        path: &str,
        depth: usize,
        siblings: &[String],
        out: &mut Vec<ValidationMessage>,
    ) {
        if let Some(Value::Array(required)) = rules.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    out.push(ValidationMessage::error(
                        path,
                        format!("missing required property '{name}'"),
                    ));
                }
            }
        }

        let properties = rules.get("properties").and_then(Value::as_object);
        let additional = rules.get("additionalProperties");
        let has_composition = ["allOf", "anyOf", "oneOf"]
            .iter()
            .any(|key| rules.contains_key(*key));

        for (name, item) in object {
            let item_path = child_path(path, name);
            if let Some(item_schema) = properties.and_then(|props| props.get(name)) {
                self.check(item_schema, item, &item_path, depth + 1, &[], out);
                continue;
            }
            match additional {
                Some(Value::Bool(false)) => {
                    out.push(ValidationMessage::error(item_path, "property is not allowed"));
                }
                Some(extra @ Value::Object(_)) => {
                    self.check(extra, item, &item_path, depth + 1, &[], out);
                }
                Some(_) => {}
                None if properties.is_some()
                    && !has_composition
                    && !siblings.iter().any(|it| it == name) =>
                {
                    out.push(ValidationMessage::warning(
                        item_path,
                        format!("undeclared property '{name}'"),
                    ));
                }
                None => {}
            }
        }
    }

    fn check_array(
        &self,
        rules: &Map<String, Value>,
        items: &[Value],
        path: &str,
        depth: usize,
        out: &mut Vec<ValidationMessage>,
    ) {
        if let Some(min) = rules.get("minItems").and_then(Value::as_u64) {
            if (items.len() as u64) < min {
                out.push(ValidationMessage::error(
                    path,
                    format!("expected at least {min} items, got {}", items.len()),
                ));
            }
        }
        if let Some(max) = rules.get("maxItems").and_then(Value::as_u64) {
            if (items.len() as u64) > max {
                out.push(ValidationMessage::error(
                    path,
                    format!("expected at most {max} items, got {}", items.len()),
                ));
            }
        }
        if rules.get("uniqueItems") == Some(&Value::Bool(true)) {
            let duplicated = items
                .iter()
                .enumerate()
                .any(|(idx, item)| items.iter().skip(idx + 1).any(|other| other == item));
            if duplicated {
                out.push(ValidationMessage::error(path, "items are not unique"));
            }
        }

        if let Some(item_schema) = rules.get("items") {
            for (idx, item) in items.iter().enumerate() {
                let item_path = child_path(path, &idx.to_string());
                self.check(item_schema, item, &item_path, depth + 1, &[], out);
            }
        }
    }

    fn check_string(
        rules: &Map<String, Value>,
        text: &str,
        path: &str,
        out: &mut Vec<ValidationMessage>,
    ) {
        let length = text.chars().count() as u64;
        if let Some(min) = rules.get("minLength").and_then(Value::as_u64) {
            if length < min {
                out.push(ValidationMessage::error(
                    path,
                    format!("expected at least {min} characters, got {length}"),
                ));
            }
        }
        if let Some(max) = rules.get("maxLength").and_then(Value::as_u64) {
            if length > max {
                out.push(ValidationMessage::error(
                    path,
                    format!("expected at most {max} characters, got {length}"),
                ));
            }
        }
        if let Some(pattern) = rules.get("pattern").and_then(Value::as_str) {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(text) => out.push(ValidationMessage::error(
                    path,
                    format!("'{text}' does not match pattern '{pattern}'"),
                )),
                Ok(_) => {}
                Err(error) => out.push(ValidationMessage::warning(
                    path,
                    format!("invalid pattern '{pattern}': {error}"),
                )),
            }
        }
    }

    fn check_number(
        rules: &Map<String, Value>,
        value: &Value,
        path: &str,
        out: &mut Vec<ValidationMessage>,
    ) {
        let Some(number) = value.as_f64() else {
            return;
        };
        let bound = |key: &str| rules.get(key).and_then(Value::as_f64);
        // OpenAPI 3.0 uses boolean exclusive flags on top of minimum/maximum
        let flag = |key: &str| rules.get(key) == Some(&Value::Bool(true));

        if let Some(min) = bound("minimum") {
            if number < min || (flag("exclusiveMinimum") && number <= min) {
                out.push(ValidationMessage::error(
                    path,
                    format!("{value} is below the minimum of {min}"),
                ));
            }
        }
        if let Some(max) = bound("maximum") {
            if number > max || (flag("exclusiveMaximum") && number >= max) {
                out.push(ValidationMessage::error(
                    path,
                    format!("{value} is above the maximum of {max}"),
                ));
            }
        }
        if let Some(min) = bound("exclusiveMinimum") {
            if number <= min {
                out.push(ValidationMessage::error(
                    path,
                    format!("{value} must be greater than {min}"),
                ));
            }
        }
        if let Some(max) = bound("exclusiveMaximum") {
            if number >= max {
                out.push(ValidationMessage::error(
                    path,
                    format!("{value} must be less than {max}"),
                ));
            }
        }
    }
}

fn declared_properties(rules: &Map<String, Value>) -> Vec<String> {
    rules
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default()
}

fn type_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "null" => value.is_null(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|it| it.fract().abs() < f64::EPSILON)
        }
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Appends a reference token, escaped as per RFC 6901.
fn child_path(parent: &str, token: &str) -> String {
    let token = token.replace('~', "~0").replace('/', "~1");
    format!("{parent}/{token}")
}
