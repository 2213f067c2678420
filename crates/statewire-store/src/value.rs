#![forbid(unsafe_code)]

//! Value model: JSON kind tags, the deletion tombstone, numeric clamping.

use serde::Serialize;
use serde_json::Value;

/// The JSON kind of a stored value, used by type protection and error
/// reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// The kind of the given value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Lowercase kind name, as used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Marker string for the deletion tombstone. Deliberately unprintable-ish so
/// no real payload collides with it.
const TOMBSTONE_MARK: &str = "\u{1}statewire::tombstone\u{1}";

/// The deletion tombstone: a unique marker value standing in for "delete
/// this key".
///
/// Passing the tombstone to `set` or inside a `merge` payload deletes the
/// key instead of storing the marker, so bulk updates expressed as plain
/// JSON objects can still delete entries.
#[must_use]
pub fn tombstone() -> Value {
    Value::String(TOMBSTONE_MARK.to_owned())
}

/// Whether the given value is the deletion tombstone.
#[must_use]
pub fn is_tombstone(value: &Value) -> bool {
    matches!(value, Value::String(s) if s == TOMBSTONE_MARK)
}

/// Optional bounds for `increment`/`decrement`.
///
/// Bounds are applied upper-first, so when `min > max` the lower bound wins.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Clamp {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Clamp {
    /// No bounds.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Lower bound only.
    #[must_use]
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Upper bound only.
    #[must_use]
    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Both bounds.
    #[must_use]
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Apply the bounds to a value.
    #[must_use]
    pub fn apply(self, v: f64) -> f64 {
        let v = match self.max {
            Some(max) => v.min(max),
            None => v,
        };
        match self.min {
            Some(min) => v.max(min),
            None => v,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
