//! Scalar values, per-node value specifications, and difficulty tiers.

use serde::{Deserialize, Serialize};

/// World difficulty, as handed in by the host at event time.
///
/// `Easy`, `Normal`, and `Hard` map onto per-tier settings; `Peaceful` has
/// no tier of its own and resolves every tiered setting to its neutral
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Peaceful,
    Easy,
    Normal,
    Hard,
}

/// A scalar held by a node.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ScalarValue {
    /// Human-readable kind name, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ScalarValue::Bool(_) => "a boolean",
            ScalarValue::Int(_) => "an integer",
            ScalarValue::Float(_) => "a float",
            ScalarValue::Str(_) => "a string",
        }
    }

    /// The boolean inside, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The integer inside, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// The float inside; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Float(value) => Some(*value),
            ScalarValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// The string inside, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

/// Per-node value specification: scalar kind, default, and numeric bounds.
///
/// Per-setting behavior (defaults, domains) is plain data supplied at
/// construction; there are no node subtypes to override.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarSpec {
    Bool { default: bool },
    Int { default: i64, min: i64, max: i64 },
    Float { default: f64, min: f64, max: f64 },
    Str { default: &'static str },
}

impl ScalarSpec {
    /// A boolean setting.
    pub fn bool(default: bool) -> Self {
        ScalarSpec::Bool { default }
    }

    /// An integer setting with an inclusive domain.
    pub fn int(default: i64, min: i64, max: i64) -> Self {
        debug_assert!(min <= default && default <= max);
        ScalarSpec::Int { default, min, max }
    }

    /// A float setting with an inclusive domain.
    pub fn float(default: f64, min: f64, max: f64) -> Self {
        debug_assert!(min <= default && default <= max);
        ScalarSpec::Float { default, min, max }
    }

    /// A string setting.
    pub fn string(default: &'static str) -> Self {
        ScalarSpec::Str { default }
    }

    /// Human-readable kind name, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ScalarSpec::Bool { .. } => "a boolean",
            ScalarSpec::Int { .. } => "an integer",
            ScalarSpec::Float { .. } => "a float",
            ScalarSpec::Str { .. } => "a string",
        }
    }

    /// The declared default. Pure data: never consults the document.
    pub fn default_value(&self) -> ScalarValue {
        match self {
            ScalarSpec::Bool { default } => ScalarValue::Bool(*default),
            ScalarSpec::Int { default, .. } => ScalarValue::Int(*default),
            ScalarSpec::Float { default, .. } => ScalarValue::Float(*default),
            ScalarSpec::Str { default } => ScalarValue::Str((*default).to_string()),
        }
    }

    /// The no-op value of this kind, returned for difficulties that have
    /// no tier of their own.
    pub fn neutral_value(&self) -> ScalarValue {
        match self {
            ScalarSpec::Bool { .. } => ScalarValue::Bool(false),
            ScalarSpec::Int { .. } => ScalarValue::Int(0),
            ScalarSpec::Float { .. } => ScalarValue::Float(0.0),
            ScalarSpec::Str { .. } => ScalarValue::Str(String::new()),
        }
    }

    /// Whether `value` is of this spec's kind.
    pub fn accepts(&self, value: &ScalarValue) -> bool {
        matches!(
            (self, value),
            (ScalarSpec::Bool { .. }, ScalarValue::Bool(_))
                | (ScalarSpec::Int { .. }, ScalarValue::Int(_))
                | (ScalarSpec::Float { .. }, ScalarValue::Float(_))
                | (ScalarSpec::Str { .. }, ScalarValue::Str(_))
        )
    }

    /// Correct an out-of-domain value to the nearest bound. Out-of-range
    /// values are repaired, never rejected.
    pub fn clamp(&self, value: ScalarValue) -> ScalarValue {
        match (self, value) {
            (ScalarSpec::Int { min, max, .. }, ScalarValue::Int(raw)) => {
                ScalarValue::Int(raw.clamp(*min, *max))
            }
            (ScalarSpec::Float { min, max, .. }, ScalarValue::Float(raw)) => {
                ScalarValue::Float(raw.clamp(*min, *max))
            }
            (_, value) => value,
        }
    }
}
