//! Structural schemas for generated output.
//!
//! A [`Schema`] is a plain value describing the expected shape of a decoded
//! JSON document. It is checked field by field after decoding and rendered
//! as a JSON-schema document that is appended to structured prompts.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Why a decoded document was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("field '{path}' expected {expected}, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field '{path}' has {actual} items, expected at least {min}")]
    TooFewItems {
        path: String,
        min: usize,
        actual: usize,
    },

    #[error("field '{path}' has {actual} items, expected at most {max}")]
    TooManyItems {
        path: String,
        max: usize,
        actual: usize,
    },

    #[error("field '{path}' value {value} is out of range")]
    OutOfRange { path: String, value: f64 },

    #[error("field '{path}' value '{value}' is not one of: {allowed}")]
    NotAllowed {
        path: String,
        value: String,
        allowed: String,
    },

    /// The document passed the structural checks but could not be mapped
    /// onto the target Rust type.
    #[error("failed to map output onto {target}: {details}")]
    Deserialize {
        target: &'static str,
        details: String,
    },
}

/// The expected type of a single value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    /// A string restricted to a fixed vocabulary.
    OneOf(&'static [&'static str]),
    List {
        item: Box<FieldKind>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object(Vec<FieldSpec>),
    /// Any JSON object, contents unchecked.
    AnyObject,
    /// Any JSON value.
    Any,
}

/// A named field inside an object.
///
/// Optional fields may be absent or `null`; required fields must be present
/// and non-null.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    required: bool,
    description: Option<&'static str>,
}

impl FieldSpec {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            description: None,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            description: None,
        }
    }

    pub fn describe_as(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl FieldKind {
    pub fn list(item: FieldKind) -> Self {
        FieldKind::List {
            item: Box::new(item),
            min_items: None,
            max_items: None,
        }
    }

    pub fn list_bounded(item: FieldKind, min_items: Option<usize>, max_items: Option<usize>) -> Self {
        FieldKind::List {
            item: Box::new(item),
            min_items,
            max_items,
        }
    }

    pub fn number_between(min: f64, max: f64) -> Self {
        FieldKind::Number {
            min: Some(min),
            max: Some(max),
        }
    }

    fn validate(&self, value: &Value, path: &str) -> Result<(), ValidationError> {
        match self {
            FieldKind::Any => Ok(()),
            FieldKind::String => expect_str(value, path).map(|_| ()),
            FieldKind::OneOf(allowed) => {
                let s = expect_str(value, path)?;
                if allowed.contains(&s) {
                    Ok(())
                } else {
                    Err(ValidationError::NotAllowed {
                        path: path.to_string(),
                        value: s.to_string(),
                        allowed: allowed.join(", "),
                    })
                }
            }
            FieldKind::Number { min, max } => {
                let n = value.as_f64().ok_or_else(|| wrong_type(path, "number", value))?;
                let below = min.is_some_and(|m| n < m);
                let above = max.is_some_and(|m| n > m);
                if below || above {
                    return Err(ValidationError::OutOfRange {
                        path: path.to_string(),
                        value: n,
                    });
                }
                Ok(())
            }
            FieldKind::List {
                item,
                min_items,
                max_items,
            } => {
                let items = value
                    .as_array()
                    .ok_or_else(|| wrong_type(path, "array", value))?;
                if let Some(min) = min_items {
                    if items.len() < *min {
                        return Err(ValidationError::TooFewItems {
                            path: path.to_string(),
                            min: *min,
                            actual: items.len(),
                        });
                    }
                }
                if let Some(max) = max_items {
                    if items.len() > *max {
                        return Err(ValidationError::TooManyItems {
                            path: path.to_string(),
                            max: *max,
                            actual: items.len(),
                        });
                    }
                }
                for (i, element) in items.iter().enumerate() {
                    item.validate(element, &format!("{}[{}]", path, i))?;
                }
                Ok(())
            }
            FieldKind::AnyObject => value
                .as_object()
                .map(|_| ())
                .ok_or_else(|| wrong_type(path, "object", value)),
            FieldKind::Object(fields) => {
                let object = value
                    .as_object()
                    .ok_or_else(|| wrong_type(path, "object", value))?;
                validate_fields(fields, object, path)
            }
        }
    }

    /// Removes `null` values of optional fields, so they deserialize like
    /// absent keys.
    fn prune_nulls(&self, value: &mut Value) {
        match (self, value) {
            (FieldKind::List { item, .. }, Value::Array(items)) => {
                for element in items {
                    item.prune_nulls(element);
                }
            }
            (FieldKind::Object(fields), Value::Object(object)) => {
                for field in fields {
                    if field.required {
                        if let Some(value) = object.get_mut(field.name) {
                            field.kind.prune_nulls(value);
                        }
                    } else if object.get(field.name).is_some_and(Value::is_null) {
                        object.remove(field.name);
                    } else if let Some(value) = object.get_mut(field.name) {
                        field.kind.prune_nulls(value);
                    }
                }
            }
            _ => {}
        }
    }

    fn describe(&self) -> Value {
        match self {
            FieldKind::Any => json!({}),
            FieldKind::String => json!({ "type": "string" }),
            FieldKind::OneOf(allowed) => json!({ "type": "string", "enum": allowed }),
            FieldKind::Number { min, max } => {
                let mut out = json!({ "type": "number" });
                if let Some(min) = min {
                    out["minimum"] = json!(min);
                }
                if let Some(max) = max {
                    out["maximum"] = json!(max);
                }
                out
            }
            FieldKind::List {
                item,
                min_items,
                max_items,
            } => {
                let mut out = json!({ "type": "array", "items": item.describe() });
                if let Some(min) = min_items {
                    out["minItems"] = json!(min);
                }
                if let Some(max) = max_items {
                    out["maxItems"] = json!(max);
                }
                out
            }
            FieldKind::AnyObject => json!({ "type": "object" }),
            FieldKind::Object(fields) => describe_fields(fields),
        }
    }
}

fn validate_fields(
    fields: &[FieldSpec],
    object: &Map<String, Value>,
    path: &str,
) -> Result<(), ValidationError> {
    for field in fields {
        let field_path = format!("{}.{}", path, field.name);
        match object.get(field.name) {
            None | Some(Value::Null) if field.required => {
                return Err(ValidationError::MissingField(field_path));
            }
            None | Some(Value::Null) => {}
            Some(value) => field.kind.validate(value, &field_path)?,
        }
    }
    Ok(())
}

fn describe_fields(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        let mut property = field.kind.describe();
        if !field.required {
            property = json!({ "anyOf": [property, { "type": "null" }] });
        }
        if let Some(description) = field.description {
            property["description"] = json!(description);
        }
        properties.insert(field.name.to_string(), property);
        if field.required {
            required.push(field.name);
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn expect_str<'a>(value: &'a Value, path: &str) -> Result<&'a str, ValidationError> {
    value.as_str().ok_or_else(|| wrong_type(path, "string", value))
}

fn wrong_type(path: &str, expected: &'static str, found: &Value) -> ValidationError {
    ValidationError::WrongType {
        path: path.to_string(),
        expected,
        found: json_type_name(found),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Expected shape of a generated document.
///
/// # Examples
///
/// ```
/// use product_pipeline::{FieldKind, FieldSpec, Schema};
/// use serde_json::json;
///
/// let schema = Schema::object(
///     "Greeting",
///     vec![
///         FieldSpec::required("text", FieldKind::String),
///         FieldSpec::optional("tags", FieldKind::list(FieldKind::String)),
///     ],
/// );
///
/// assert!(schema.validate(&json!({ "text": "hi" })).is_ok());
/// assert!(schema.validate(&json!({ "tags": ["a"] })).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: &'static str,
    root: FieldKind,
}

impl Schema {
    pub fn object(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self {
            name,
            root: FieldKind::Object(fields),
        }
    }

    pub fn new(name: &'static str, root: FieldKind) -> Self {
        Self { name, root }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn root(&self) -> &FieldKind {
        &self.root
    }

    /// Checks `value` against the schema, reporting the first mismatch.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.root.validate(value, "$")
    }

    /// Validates `value` and maps it onto `T`.
    ///
    /// Optional fields set to `null` are treated as absent.
    pub fn conform<T: DeserializeOwned>(&self, mut value: Value) -> Result<T, ValidationError> {
        self.validate(&value)?;
        self.root.prune_nulls(&mut value);
        serde_json::from_value(value).map_err(|e| ValidationError::Deserialize {
            target: self.name,
            details: e.to_string(),
        })
    }

    /// Renders the schema as a JSON-schema document for prompts.
    pub fn describe(&self) -> Value {
        let mut out = self.root.describe();
        out["title"] = json!(self.name);
        out
    }
}

/// Decodes raw text as JSON.
pub fn decode(text: &str) -> Result<Value, ValidationError> {
    serde_json::from_str(text).map_err(|e| ValidationError::InvalidJson(e.to_string()))
}
