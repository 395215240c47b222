// Parameter schemas: declaration, structural validation and JSON Schema rendering

use serde_json::{json, Map, Value};
use sonarqube_sdk::PageRequest;
use std::collections::HashSet;

/// Largest page size any paged tool accepts.
pub const MAX_PAGE_SIZE: i64 = 20;

/// Type of a single argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Integer { min: Option<i64>, max: Option<i64> },
    Number,
    Boolean,
    Enum(Vec<&'static str>),
    Array(Box<FieldKind>),
}

impl FieldKind {
    pub fn integer() -> Self {
        Self::Integer { min: None, max: None }
    }

    pub fn integer_at_least(min: i64) -> Self {
        Self::Integer { min: Some(min), max: None }
    }

    pub fn integer_between(min: i64, max: i64) -> Self {
        Self::Integer { min: Some(min), max: Some(max) }
    }

    pub fn one_of(values: &[&'static str]) -> Self {
        Self::Enum(values.to_vec())
    }

    pub fn array_of(item: FieldKind) -> Self {
        Self::Array(Box::new(item))
    }

    /// Check `value` against this kind, returning the normalized value.
    fn check(&self, field: &str, value: &Value) -> Result<Value, String> {
        match self {
            Self::String => match value {
                Value::String(_) => Ok(value.clone()),
                other => Err(format!("{}: expected a string, got {}", field, type_name(other))),
            },
            Self::Integer { min, max } => {
                let n = as_integer(value).ok_or_else(|| {
                    format!("{}: expected an integer, got {}", field, type_name(value))
                })?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(format!("{}: must be >= {}, got {}", field, min, n));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(format!("{}: must be <= {}, got {}", field, max, n));
                    }
                }
                Ok(Value::from(n))
            }
            Self::Number => match value {
                Value::Number(_) => Ok(value.clone()),
                other => Err(format!("{}: expected a number, got {}", field, type_name(other))),
            },
            Self::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                other => Err(format!("{}: expected a boolean, got {}", field, type_name(other))),
            },
            Self::Enum(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => Ok(value.clone()),
                Some(s) => Err(format!(
                    "{}: '{}' is not one of {}",
                    field,
                    s,
                    allowed.join(", ")
                )),
                None => Err(format!("{}: expected a string, got {}", field, type_name(value))),
            },
            Self::Array(item) => {
                let items = value.as_array().ok_or_else(|| {
                    format!("{}: expected an array, got {}", field, type_name(value))
                })?;
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| item.check(&format!("{}[{}]", field, i), v))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
        }
    }

    fn json_schema(&self) -> Map<String, Value> {
        let mut schema = Map::new();
        match self {
            Self::String => {
                schema.insert("type".into(), json!("string"));
            }
            Self::Integer { min, max } => {
                schema.insert("type".into(), json!("integer"));
                if let Some(min) = min {
                    schema.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    schema.insert("maximum".into(), json!(max));
                }
            }
            Self::Number => {
                schema.insert("type".into(), json!("number"));
            }
            Self::Boolean => {
                schema.insert("type".into(), json!("boolean"));
            }
            Self::Enum(values) => {
                schema.insert("type".into(), json!("string"));
                schema.insert("enum".into(), json!(values));
            }
            Self::Array(item) => {
                schema.insert("type".into(), json!("array"));
                schema.insert("items".into(), Value::Object(item.json_schema()));
            }
        }
        schema
    }
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
}

/// Declared parameters of a tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    fields: Vec<FieldSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        self.fields.push(FieldSpec {
            name,
            description,
            kind,
            required: true,
            default: None,
        });
        self
    }

    pub fn optional(mut self, name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        self.fields.push(FieldSpec {
            name,
            description,
            kind,
            required: false,
            default: None,
        });
        self
    }

    pub fn with_default(
        mut self,
        name: &'static str,
        kind: FieldKind,
        default: Value,
        description: &'static str,
    ) -> Self {
        self.fields.push(FieldSpec {
            name,
            description,
            kind,
            required: false,
            default: Some(default),
        });
        self
    }

    /// Add the standard `page` / `page_size` pair.
    pub fn paged(self) -> Self {
        self.with_default(
            "page",
            FieldKind::integer_at_least(1),
            json!(1),
            "Page number for pagination.",
        )
        .with_default(
            "page_size",
            FieldKind::integer_between(1, MAX_PAGE_SIZE),
            json!(MAX_PAGE_SIZE),
            "Number of items per page (max 20).",
        )
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Structural problems that make the schema unusable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();

        for field in &self.fields {
            if field.name.trim().is_empty() {
                problems.push("field with an empty name".to_string());
                continue;
            }
            if !seen.insert(field.name) {
                problems.push(format!("{}: declared more than once", field.name));
            }
            if let FieldKind::Enum(values) = &field.kind {
                if values.is_empty() {
                    problems.push(format!("{}: enumeration has no values", field.name));
                }
            }
            if let Some(default) = &field.default {
                if field.required {
                    problems.push(format!("{}: required field cannot have a default", field.name));
                }
                if let Err(issue) = field.kind.check(field.name, default) {
                    problems.push(format!("default does not match its type ({})", issue));
                }
            }
        }

        problems
    }

    /// Validate arguments, applying defaults.
    ///
    /// `null` or absent arguments count as an empty object; a `null` field
    /// counts as absent. Every issue found is reported, not only the first.
    pub fn validate(&self, arguments: &Value) -> Result<Arguments, Vec<String>> {
        let empty = Map::new();
        let supplied = match arguments {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(vec![format!(
                    "arguments must be an object, got {}",
                    type_name(other)
                )])
            }
        };

        let mut issues = Vec::new();
        let mut values = Map::new();

        for field in &self.fields {
            match supplied.get(field.name).filter(|v| !v.is_null()) {
                Some(value) => match field.kind.check(field.name, value) {
                    Ok(normalized) => {
                        values.insert(field.name.to_string(), normalized);
                    }
                    Err(issue) => issues.push(issue),
                },
                None if field.required => {
                    issues.push(format!("{}: required field is missing", field.name));
                }
                None => {
                    if let Some(default) = &field.default {
                        values.insert(field.name.to_string(), default.clone());
                    }
                }
            }
        }

        let mut unknown: Vec<&String> = supplied
            .keys()
            .filter(|key| self.field(key).is_none())
            .collect();
        unknown.sort();
        issues.extend(unknown.into_iter().map(|key| format!("{}: unknown field", key)));

        if issues.is_empty() {
            Ok(Arguments { values })
        } else {
            Err(issues)
        }
    }

    /// JSON Schema advertised through `tools/list`.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut property = field.kind.json_schema();
            property.insert("description".into(), json!(field.description));
            if let Some(default) = &field.default {
                property.insert("default".into(), default.clone());
            }
            properties.insert(field.name.to_string(), Value::Object(property));
            if field.required {
                required.push(field.name);
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

/// Validated arguments with defaults applied.
///
/// Accessors for required fields fall back to an empty value; validation
/// has already guaranteed their presence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> &str {
        self.opt_str(name).unwrap_or_default()
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn opt_string(&self, name: &str) -> Option<String> {
        self.opt_str(name).map(str::to_string)
    }

    pub fn bool(&self, name: &str) -> bool {
        self.opt_bool(name).unwrap_or(false)
    }

    pub fn opt_bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    pub fn opt_u32(&self, name: &str) -> Option<u32> {
        self.opt_u64(name).and_then(|n| u32::try_from(n).ok())
    }

    pub fn opt_u64(&self, name: &str) -> Option<u64> {
        self.values.get(name).and_then(Value::as_u64)
    }

    pub fn strings(&self, name: &str) -> Vec<String> {
        self.values
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Page selection from `page` / `page_size`. The page number is kept
    /// whole so the cap check sees what the caller asked for.
    pub fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.opt_u64("page").unwrap_or(defaults.page),
            self.opt_u32("page_size").unwrap_or(defaults.page_size),
        )
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    // 3.0 is accepted as 3; 3.5 is not
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
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
