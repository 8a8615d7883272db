//! Dynamically-typed payload values.
//!
//! This module provides the `Value` enum carried by settlements: the
//! fulfillment value or rejection reason of a deferred computation.

use std::fmt;

/// Represents any value a deferred computation can settle with.
///
/// Primitive values are stored inline. Strings own their data.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let number = Value::from(42);
/// let text = Value::from("ok");
///
/// assert_eq!(number, Value::Smi(42));
/// assert_eq!(format!("{}:{}", text, number), "ok:42");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value
    Undefined,
    /// The explicit null value
    Null,
    /// Boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// String value
    String(std::string::String),
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// String conversion following JavaScript's `String()` rules:
/// - undefined → "undefined"
/// - null → "null"
/// - boolean → "true" or "false"
/// - number → decimal representation
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Null.to_string(), "null");
/// assert_eq!(Value::Boolean(true).to_string(), "true");
/// assert_eq!(Value::Smi(42).to_string(), "42");
/// assert_eq!(Value::from("err").to_string() + "2", "err2");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if n.is_sign_positive() {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    // Integer-valued doubles display without decimal point
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
        }
    }
}
