//! Scalar and field value types.
//!
//! Records read from the record store and documents written to the search
//! engine share the same scalar vocabulary: booleans, integers, floats and text.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// Floats in this range convert to i64 without saturating.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Interpret the scalar as an integer.
    ///
    /// Text is parsed after trimming, floats are accepted only when they carry
    /// no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Bool(b) => Some(i64::from(*b)),
            Scalar::Int(i) => Some(*i),
            Scalar::Float(f) if f.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(f) => {
                Some(*f as i64)
            }
            Scalar::Float(_) => None,
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Interpret the scalar as an unsigned integer.
    ///
    /// Text is parsed directly so that ids above `i64::MAX` survive.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Text(s) => s.trim().parse().ok(),
            other => other.as_i64().and_then(|i| u64::try_from(i).ok()),
        }
    }

    /// Interpret the scalar as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            Scalar::Int(i) => Some(*i != 0),
            Scalar::Float(f) => Some(*f != 0.0),
            Scalar::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" | "" => Some(false),
                _ => None,
            },
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Returns true for empty text.
    pub fn is_empty(&self) -> bool {
        matches!(self, Scalar::Text(s) if s.is_empty())
    }

    /// Compare two scalars the way a relational store compares column values:
    /// `1 == "1"` holds.
    pub fn loosely_eq(&self, other: &Scalar) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) if !self.is_text() || !other.is_text() => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }

    /// Order two scalars, numerically when both sides are numeric.
    pub fn compare(&self, other: &Scalar) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, Scalar::Text(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", u8::from(*b)),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

/// Values above `i64::MAX` are kept as their decimal text.
impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(Scalar::Int)
            .unwrap_or_else(|_| Scalar::Text(value.to_string()))
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Int(i64::from(value))
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// A record field value: nothing, one scalar, or an ordered list of scalars.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl Value {
    /// Null, empty text and empty lists count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Scalar(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
        }
    }

    /// The first scalar held by this value.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Null => None,
            Value::Scalar(s) => Some(s),
            Value::List(items) => items.first(),
        }
    }

    /// All scalars held by this value, in stored order.
    pub fn scalars(&self) -> Vec<Scalar> {
        match self {
            Value::Null => Vec::new(),
            Value::Scalar(s) => vec![s.clone()],
            Value::List(items) => items.clone(),
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<Vec<Scalar>> for Value {
    fn from(values: Vec<Scalar>) -> Self {
        Value::List(values)
    }
}
