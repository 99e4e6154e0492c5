//! Raw numeric fields as they arrive from telemetry and zone configuration.
//!
//! Decimal columns are frequently serialised as strings (`"12.345678"`) while
//! mobile clients send plain JSON numbers. [`Numeric`] keeps whichever form was
//! received so the evaluation path can decide, per check, whether the value is
//! usable. Parsing never fails loudly: [`Numeric::as_f64`] returns `None` for
//! anything that is not a finite number.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A numeric value that may or may not be well-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    /// A value received as a JSON number.
    Number(f64),
    /// A value received as text (decimal string or garbage).
    Text(String),
    /// Any other JSON value (`null`, booleans, arrays, objects).
    Other(serde_json::Value),
}

impl Numeric {
    /// Interpret the value as a finite `f64`.
    ///
    /// Text is trimmed before parsing. `NaN` and infinities are treated as
    /// malformed.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
            Numeric::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Whether [`as_f64`](Self::as_f64) would yield a value.
    pub fn is_well_formed(&self) -> bool {
        self.as_f64().is_some()
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Number(value)
    }
}

impl From<&str> for Numeric {
    fn from(value: &str) -> Self {
        Numeric::Text(value.to_string())
    }
}

impl From<String> for Numeric {
    fn from(value: String) -> Self {
        Numeric::Text(value)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Number(n) => write!(f, "{}", n),
            Numeric::Text(s) => write!(f, "{}", s),
            Numeric::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Parse an optional field, collapsing "absent" and "malformed" into `None`.
pub fn parse_optional(value: Option<&Numeric>) -> Option<f64> {
    value.and_then(Numeric::as_f64)
}
