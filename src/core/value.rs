use crate::core::{GridError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Scalar cell value of an entity record.
///
/// Records are flat: every field holds either text or a number, which is
/// exactly what a JSON string or JSON number can carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Converts a JSON scalar into a field value.
    ///
    /// `null`, booleans, arrays and objects are rejected: the editor only
    /// understands flat string/number records.
    pub fn from_json(field: &str, value: &JsonValue) -> Result<Self> {
        match value {
            JsonValue::String(s) => Ok(Self::Text(s.clone())),
            JsonValue::Number(n) => n.as_f64().map(Self::Number).ok_or_else(|| {
                GridError::Decode(format!("field '{}' holds an unrepresentable number", field))
            }),
            other => Err(GridError::Decode(format!(
                "field '{}' must be a string or number, got {}",
                field,
                json_type_name(other)
            ))),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            // Whole numbers go out as integers so servers with typed columns accept them.
            Self::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                JsonValue::from(*n as i64)
            }
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Text(s) => JsonValue::String(s.clone()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "NUMBER",
            Self::Text(_) => "TEXT",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    /// Empty text counts as blank; numbers never do.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                a == b
            }
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                write!(f, "{}", *n as i64)
            }
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_equality() {
        assert_eq!(FieldValue::from("a"), FieldValue::Text("a".into()));
        assert_eq!(FieldValue::from(3_i64), FieldValue::Number(3.0));
        assert_ne!(FieldValue::from("3"), FieldValue::from(3_i64));
    }

    #[test]
    fn test_from_json_rejects_non_scalars() {
        assert!(FieldValue::from_json("x", &json!(null)).is_err());
        assert!(FieldValue::from_json("x", &json!(true)).is_err());
        assert!(FieldValue::from_json("x", &json!({"a": 1})).is_err());
        assert_eq!(
            FieldValue::from_json("x", &json!(4.5)).unwrap(),
            FieldValue::Number(4.5)
        );
    }

    #[test]
    fn test_whole_numbers_encode_as_integers() {
        assert_eq!(FieldValue::Number(42.0).to_json(), json!(42));
        assert_eq!(FieldValue::Number(1.5).to_json(), json!(1.5));
        assert_eq!(FieldValue::Number(42.0).to_string(), "42");
    }

    #[test]
    fn test_blank_detection() {
        assert!(FieldValue::from("   ").is_blank());
        assert!(!FieldValue::from("x").is_blank());
        assert!(!FieldValue::Number(0.0).is_blank());
    }
}
