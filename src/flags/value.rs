//! Typed feature flag values.

use serde::{Deserialize, Serialize};

/// A single feature flag value.
///
/// Flags are weakly typed at the edge (they arrive from config files or
/// remote flag payloads), so every accessor defines an explicit coercion
/// instead of erroring on a type mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer flag.
    Int(i64),
    /// Floating-point flag.
    Float(f64),
    /// String flag.
    String(String),
}

impl FlagValue {
    /// Boolean coercion.
    ///
    /// `true` exactly for `Bool(true)` and for the strings `"true"`, `"1"`,
    /// and `"yes"` (case-sensitive). Every other value is `false`. The string
    /// rule is deliberately this narrow, not a general truthiness convention:
    /// `"True"`, `"on"`, and nonzero numbers all read as `false`.
    pub fn as_bool(&self) -> bool {
        match self {
            FlagValue::Bool(enabled) => *enabled,
            FlagValue::String(text) => matches!(text.as_str(), "true" | "1" | "yes"),
            _ => false,
        }
    }

    /// Default string representation; booleans and numbers are stringified.
    pub fn as_string(&self) -> String {
        match self {
            FlagValue::Bool(enabled) => enabled.to_string(),
            FlagValue::Int(number) => number.to_string(),
            FlagValue::Float(number) => number.to_string(),
            FlagValue::String(text) => text.clone(),
        }
    }

    /// Integer coercion.
    ///
    /// Floats truncate toward zero. Strings parse as decimal integers, and a
    /// parse failure silently yields `0` rather than an error. Booleans yield
    /// `0`.
    pub fn as_int(&self) -> i64 {
        match self {
            FlagValue::Int(number) => *number,
            FlagValue::Float(number) => *number as i64,
            FlagValue::String(text) => text.parse().unwrap_or(0),
            FlagValue::Bool(_) => 0,
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Int(value)
    }
}

impl From<i32> for FlagValue {
    fn from(value: i32) -> Self {
        FlagValue::Int(value.into())
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Float(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::String(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::String(value)
    }
}
