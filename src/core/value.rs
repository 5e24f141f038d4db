use super::{AttributeType, DataStoreError, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Typed attribute value held by a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Reference(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "string",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
            Self::Reference(_) => "reference",
        }
    }

    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Self::Text(_) => AttributeType::String,
            Self::Number(_) => AttributeType::Number,
            Self::Boolean(_) => AttributeType::Boolean,
            Self::Date(_) => AttributeType::Date,
            Self::Reference(_) => AttributeType::Reference,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Reference(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Converts an untyped input value into the declared attribute type.
    ///
    /// Callers decide beforehand whether the input counts as absent
    /// (see [`is_absent`]); this only handles present values.
    pub fn coerce(attribute: &str, raw: &JsonValue, target: AttributeType) -> Result<Self> {
        let coerced = match target {
            AttributeType::String => match raw {
                JsonValue::String(s) => Some(Self::Text(s.clone())),
                JsonValue::Number(n) => Some(Self::Text(n.to_string())),
                JsonValue::Bool(b) => Some(Self::Text(b.to_string())),
                _ => None,
            },
            AttributeType::Number => match raw {
                JsonValue::Number(n) => n.as_f64().map(Self::Number),
                JsonValue::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(Self::Number),
                _ => None,
            },
            AttributeType::Boolean => match raw {
                JsonValue::Bool(b) => Some(Self::Boolean(*b)),
                JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(Self::Boolean(true)),
                    "false" => Some(Self::Boolean(false)),
                    _ => None,
                },
                _ => None,
            },
            AttributeType::Date => match raw {
                JsonValue::String(s) => parse_date(s.trim()).map(Self::Date),
                JsonValue::Number(n) => n
                    .as_i64()
                    .and_then(DateTime::<Utc>::from_timestamp_millis)
                    .map(Self::Date),
                _ => None,
            },
            AttributeType::Reference => match raw {
                JsonValue::String(s) if !s.trim().is_empty() => {
                    Some(Self::Reference(s.trim().to_string()))
                }
                _ => None,
            },
        };

        coerced.ok_or_else(|| DataStoreError::TypeMismatch {
            attribute: attribute.to_string(),
            expected: target.to_string(),
            found: describe_json(raw),
        })
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Text(s) | Self::Reference(s) => JsonValue::String(s.clone()),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Boolean(b) => JsonValue::Bool(*b),
            Self::Date(d) => JsonValue::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) | Self::Reference(s) => write!(f, "{}", s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

/// `null` and the empty string are treated as "no value supplied".
pub fn is_absent(raw: Option<&JsonValue>) -> bool {
    match raw {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn describe_json(raw: &JsonValue) -> String {
    match raw {
        JsonValue::Null => "null".to_string(),
        JsonValue::Bool(b) => format!("boolean {}", b),
        JsonValue::Number(n) => format!("number {}", n),
        JsonValue::String(s) => format!("string '{}'", s),
        JsonValue::Array(_) => "array".to_string(),
        JsonValue::Object(_) => "object".to_string(),
    }
}
