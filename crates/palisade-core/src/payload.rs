// ── Payload model ──
//
// An object payload is an ordered, semantically-typed map of field name
// to scalar, list, or nested map. Conversion to and from
// `serde_json::Value` happens at the backend boundary; everything inside
// the engine works on this shape.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::EngineError;

/// Ordered field map for one config object.
pub type Payload = IndexMap<String, Value>;

/// One payload field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn scalar(s: impl Into<String>) -> Self {
        Self::Scalar(s.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::Scalar(s.into())).collect())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Scalar(s)
    }
}

// ── JSON conversion ─────────────────────────────────────────────────

/// Convert a wire payload into the engine's ordered map shape.
///
/// Numbers and booleans collapse to their string form; the appliance's
/// tree is stringly typed, and the diff engine normalizes strings anyway.
pub fn from_json(value: &JsonValue) -> Result<Payload, EngineError> {
    match value {
        JsonValue::Object(map) => {
            let mut payload = Payload::new();
            for (k, v) in map {
                payload.insert(k.clone(), value_from_json(v));
            }
            Ok(payload)
        }
        other => Err(EngineError::Internal(format!(
            "expected object payload from backend, got {other}"
        ))),
    }
}

fn value_from_json(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Scalar(String::new()),
        JsonValue::Bool(b) => Value::Scalar(b.to_string()),
        JsonValue::Number(n) => Value::Scalar(n.to_string()),
        JsonValue::String(s) => Value::Scalar(s.clone()),
        JsonValue::Array(items) => Value::List(items.iter().map(value_from_json).collect()),
        JsonValue::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), value_from_json(v)))
                .collect(),
        ),
    }
}

/// Convert an engine payload to the wire shape.
pub fn to_json(payload: &Payload) -> JsonValue {
    JsonValue::Object(
        payload
            .iter()
            .map(|(k, v)| (k.clone(), value_to_json(v)))
            .collect(),
    )
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Scalar(s) => JsonValue::String(s.clone()),
        Value::List(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
    }
}
