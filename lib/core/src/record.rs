use crate::fields::{FieldKind, FieldSpec, LABEL_FIELD};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw lead record: field name to JSON value
///
/// Values are coerced to the kind declared in the field table when read,
/// so `"42"` and `42` are the same integer and `1` and `true` the same flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct LeadRecord {
    fields: Map<String, Value>,
}

impl LeadRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::SchemaMismatch(format!(
                "lead record must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    /// Read a numeric, integer or boolean field as a float
    ///
    /// Conditional fields that are absent or null read as 0.
    pub fn number(&self, spec: &FieldSpec) -> Result<f64> {
        match self.fields.get(spec.name) {
            None | Some(Value::Null) if spec.imputed => Ok(0.0),
            None | Some(Value::Null) => Err(missing(spec)),
            Some(value) => match spec.kind {
                FieldKind::Boolean => coerce_bool(value)
                    .map(|b| if b { 1.0 } else { 0.0 })
                    .ok_or_else(|| invalid(spec, value)),
                _ => coerce_number(value).ok_or_else(|| invalid(spec, value)),
            },
        }
    }

    /// Read a categorical field as text
    pub fn category(&self, spec: &FieldSpec) -> Result<String> {
        match self.fields.get(spec.name) {
            None | Some(Value::Null) => Err(missing(spec)),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(value) => Err(invalid(spec, value)),
        }
    }

    /// Read the tag list: comma-separated, tokens trimmed, empty tokens dropped
    ///
    /// A null tag field is an empty list; an absent one is a mismatch.
    pub fn tags(&self, spec: &FieldSpec) -> Result<Vec<String>> {
        match self.fields.get(spec.name) {
            None => Err(missing(spec)),
            Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(split_tags(s)),
            Some(Value::Array(items)) => Ok(items
                .iter()
                .filter_map(|v| v.as_str())
                .flat_map(split_tags)
                .collect()),
            Some(value) => Err(invalid(spec, value)),
        }
    }

    /// Read the outcome label, required for training
    pub fn label(&self) -> Result<String> {
        match self.fields.get(LABEL_FIELD) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Null) | None => Err(Error::SchemaMismatch(format!(
                "missing label field '{}'",
                LABEL_FIELD
            ))),
            Some(other) => Ok(other.to_string()),
        }
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn missing(spec: &FieldSpec) -> Error {
    Error::SchemaMismatch(format!("missing required field '{}'", spec.name))
}

fn invalid(spec: &FieldSpec, value: &Value) -> Error {
    Error::SchemaMismatch(format!(
        "field '{}' expects {:?}, got {}",
        spec.name, spec.kind, value
    ))
}
