use serde_json::Value as JsonValue;

use crate::error::Error;

/// A value crossing the engine boundary.
///
/// The engine stores exactly five classes of value, and everything bound into
/// a statement or read out of a result row is one of these. Host types with
/// no entry here (booleans, dates, structured data) are rejected at the
/// boundary rather than best-effort coerced.
///
/// Integers are signed 64-bit and preserved exactly in both directions, even
/// at magnitudes a double cannot represent losslessly. Floating values always
/// become [`Value::Real`], never `Integer`, including whole-valued floats.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }
}

macro_rules! value_from_int {
    ($($t:ty),* $(,)?) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Integer(i64::from(v))
            }
        }
    )*};
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! value_try_from_int {
    ($($t:ty),* $(,)?) => {$(
        impl TryFrom<$t> for Value {
            type Error = Error;

            fn try_from(v: $t) -> Result<Self, Error> {
                i64::try_from(v).map(Value::Integer).map_err(|_| {
                    Error::OutOfRange(format!(
                        "{v} does not fit in a signed 64-bit integer"
                    ))
                })
            }
        }
    )*};
}

value_try_from_int!(u64, usize, i128, u128);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Checked conversion from the dynamic JSON value model.
///
/// `Null`, numbers, and strings map onto their storage classes; a `u64`
/// above `i64::MAX` is [`Error::OutOfRange`] rather than silently rounded
/// through a double. Booleans, arrays, and objects have no storage class and
/// fail [`Error::ArgumentType`].
impl TryFrom<JsonValue> for Value {
    type Error = Error;

    fn try_from(v: JsonValue) -> Result<Self, Error> {
        match v {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if n.is_u64() {
                    Err(Error::OutOfRange(format!(
                        "{n} does not fit in a signed 64-bit integer"
                    )))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Real(f))
                } else {
                    Err(Error::OutOfRange(format!("{n} is not representable")))
                }
            }
            JsonValue::String(s) => Ok(Value::Text(s)),
            JsonValue::Bool(_) => Err(Error::ArgumentType(
                "booleans have no storage class; bind 0 or 1 explicitly".into(),
            )),
            JsonValue::Array(_) | JsonValue::Object(_) => Err(Error::ArgumentType(
                "structured JSON values cannot be bound; serialize to text first".into(),
            )),
        }
    }
}
