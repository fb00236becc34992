//! Resolved scalar values.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// The type a scalar resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Null,
    Bool,
    Integer,
    Float,
    Timestamp,
    Binary,
    String,
}

/// A calendar date, optionally with a time of day and a zone offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// `2001-12-14`
    Date(NaiveDate),
    /// `2001-12-14 21:59:43.10`, no zone given.
    Local(NaiveDateTime),
    /// `2001-12-14t21:59:43.10-05:00` or a trailing `Z`.
    Zoned(DateTime<FixedOffset>),
}

/// A decoded scalar.
#[derive(Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    /// Arbitrary-precision integer; YAML integers never overflow.
    Integer(BigInt),
    Float(f64),
    Timestamp(Timestamp),
    /// Content of a `!!binary` scalar.
    Binary(Vec<u8>),
    String(String),
}

impl ScalarValue {
    /// The type tag of this value.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ScalarValue::Null => ScalarType::Null,
            ScalarValue::Bool(_) => ScalarType::Bool,
            ScalarValue::Integer(_) => ScalarType::Integer,
            ScalarValue::Float(_) => ScalarType::Float,
            ScalarValue::Timestamp(_) => ScalarType::Timestamp,
            ScalarValue::Binary(_) => ScalarType::Binary,
            ScalarValue::String(_) => ScalarType::String,
        }
    }

    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns a reference to the integer if this is an `Integer`.
    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            ScalarValue::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the integer if it is an `Integer` that fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|n| n.to_i64())
    }

    /// Returns the float value if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ScalarValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            ScalarValue::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    /// Returns a reference to the bytes if this is `Binary`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ScalarValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Integer(n) => write!(f, "{}", n),
            ScalarValue::Float(n) => {
                if n.is_nan() {
                    write!(f, ".nan")
                } else if n.is_infinite() {
                    if *n > 0.0 {
                        write!(f, ".inf")
                    } else {
                        write!(f, "-.inf")
                    }
                } else {
                    write!(f, "{:?}", n)
                }
            }
            ScalarValue::Timestamp(Timestamp::Date(d)) => write!(f, "{}", d),
            ScalarValue::Timestamp(Timestamp::Local(dt)) => write!(f, "{}", dt),
            ScalarValue::Timestamp(Timestamp::Zoned(dt)) => write!(f, "{}", dt.to_rfc3339()),
            ScalarValue::String(s) => write!(f, "{:?}", s),
            ScalarValue::Binary(b) => {
                write!(f, "<")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, ">")
            }
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Bool(b)
    }
}

impl From<BigInt> for ScalarValue {
    fn from(n: BigInt) -> Self {
        ScalarValue::Integer(n)
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        ScalarValue::Integer(BigInt::from(n))
    }
}

impl From<f64> for ScalarValue {
    fn from(f: f64) -> Self {
        ScalarValue::Float(f)
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::String(s)
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.to_string())
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(b: Vec<u8>) -> Self {
        ScalarValue::Binary(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert!(ScalarValue::Null.is_null());
        assert_eq!(ScalarValue::from(true).as_bool(), Some(true));
        assert_eq!(ScalarValue::from(42i64).as_i64(), Some(42));
        assert_eq!(ScalarValue::from("x").as_str(), Some("x"));
        assert_eq!(ScalarValue::from(vec![1u8, 2]).as_bytes(), Some(&[1u8, 2][..]));
        assert_eq!(ScalarValue::from(0.5).scalar_type(), ScalarType::Float);
    }

    #[test]
    fn test_big_integer_does_not_fit_i64() {
        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        let v = ScalarValue::from(big);
        assert_eq!(v.as_i64(), None);
        assert!(v.as_integer().is_some());
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", ScalarValue::Float(f64::NEG_INFINITY)), "-.inf");
        assert_eq!(format!("{:?}", ScalarValue::Binary(vec![0x80, 0x81])), "<8081>");
        assert_eq!(format!("{:?}", ScalarValue::from("a")), "\"a\"");
    }
}
