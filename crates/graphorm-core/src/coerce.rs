//! Bidirectional coercion between store [`Value`]s and typed record fields.
//!
//! Inbound conversion tries, in order: a direct match, a lossless conversion,
//! the numeric table (int/int, int/float, unsigned/signed, float to int by
//! truncation, bool to int as 0/1), and finally string formatting for string
//! fields. Anything else is a [`CoerceError`].
//!
//! A `Null` coming from the store always produces the field's zero value
//! (`None` for options).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::value::Value;

/// A coercion failure that does not yet know which field it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot coerce {source_type} into {target_type}")]
pub struct CoerceError {
    pub source_type: String,
    pub target_type: String,
}

impl CoerceError {
    pub fn new(source_type: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            target_type: target_type.into(),
        }
    }

    /// Inbound mismatch: a store value that does not fit field type `T`.
    pub fn inbound<T: ?Sized>(value: &Value) -> Self {
        Self::new(value.kind_name(), std::any::type_name::<T>())
    }
}

/// A field type that can be written to and read from a property bag.
pub trait FieldValue {
    /// Whether this is the type's zero value (omitted from writes).
    fn is_zero(&self) -> bool;

    /// Convert to a store value regardless of zero-ness.
    fn to_value(&self) -> Result<Value, CoerceError>;

    /// Convert from a store value, applying the coercion table.
    fn from_value(value: Value) -> Result<Self, CoerceError>
    where
        Self: Sized;

    /// Outbound form: `None` when the value is zero.
    fn to_property(&self) -> Result<Option<Value>, CoerceError> {
        if self.is_zero() {
            Ok(None)
        } else {
            self.to_value().map(Some)
        }
    }
}

// ── Numeric table ────────────────────────────────────────────────

fn bool_to_int(b: bool) -> i64 {
    i64::from(b)
}

/// Truncate toward zero and check that the result lands in `[min, end)`.
///
/// `end` is the power of two just past the target's `MAX`, which is exact in
/// `f64` even where `MAX` itself is not.
fn truncate_float(x: f64, min: f64, end: f64) -> Option<f64> {
    let t = x.trunc();
    (t.is_finite() && t >= min && t < end).then_some(t)
}

macro_rules! impl_signed {
    ($($t:ty),*) => {$(
        impl FieldValue for $t {
            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn to_value(&self) -> Result<Value, CoerceError> {
                i64::try_from(*self)
                    .map(Value::Int)
                    .map_err(|_| CoerceError::new(stringify!($t), "Int"))
            }

            fn from_value(value: Value) -> Result<Self, CoerceError> {
                match value {
                    Value::Null => Ok(0),
                    Value::Int(i) => <$t>::try_from(i).map_err(|_| CoerceError::inbound::<$t>(&value)),
                    Value::Float(x) => {
                        let end = 2f64.powi(<$t>::BITS as i32 - 1);
                        truncate_float(x, <$t>::MIN as f64, end)
                            .map(|t| t as $t)
                            .ok_or_else(|| CoerceError::inbound::<$t>(&value))
                    }
                    Value::Bool(b) => Ok(bool_to_int(b) as $t),
                    other => Err(CoerceError::inbound::<$t>(&other)),
                }
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl FieldValue for $t {
            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn to_value(&self) -> Result<Value, CoerceError> {
                i64::try_from(*self)
                    .map(Value::Int)
                    .map_err(|_| CoerceError::new(stringify!($t), "Int"))
            }

            fn from_value(value: Value) -> Result<Self, CoerceError> {
                match value {
                    Value::Null => Ok(0),
                    // Negative integers fail the conversion.
                    Value::Int(i) => <$t>::try_from(i).map_err(|_| CoerceError::inbound::<$t>(&value)),
                    Value::Float(x) => {
                        let end = 2f64.powi(<$t>::BITS as i32);
                        truncate_float(x, 0.0, end)
                            .map(|t| t as $t)
                            .ok_or_else(|| CoerceError::inbound::<$t>(&value))
                    }
                    Value::Bool(b) => Ok(<$t>::from(b)),
                    other => Err(CoerceError::inbound::<$t>(&other)),
                }
            }
        }
    )*};
}

macro_rules! impl_float {
    ($($t:ty),*) => {$(
        impl FieldValue for $t {
            fn is_zero(&self) -> bool {
                *self == 0.0
            }

            fn to_value(&self) -> Result<Value, CoerceError> {
                Ok(Value::Float(f64::from(*self)))
            }

            fn from_value(value: Value) -> Result<Self, CoerceError> {
                match value {
                    Value::Null => Ok(0.0),
                    Value::Float(x) => Ok(x as $t),
                    Value::Int(i) => Ok(i as $t),
                    Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
                    other => Err(CoerceError::inbound::<$t>(&other)),
                }
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64, isize);
impl_unsigned!(u8, u16, u32, u64, usize);
impl_float!(f32, f64);

impl FieldValue for bool {
    fn is_zero(&self) -> bool {
        !*self
    }

    fn to_value(&self) -> Result<Value, CoerceError> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            other => Err(CoerceError::inbound::<bool>(&other)),
        }
    }
}

impl FieldValue for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_value(&self) -> Result<Value, CoerceError> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }
}

// ── Containers ───────────────────────────────────────────────────

/// `None` is the zero value; `Some(x)` is always written, even when `x` is zero.
impl<T: FieldValue> FieldValue for Option<T> {
    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn to_value(&self) -> Result<Value, CoerceError> {
        match self {
            Some(inner) => inner.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_value(&self) -> Result<Value, CoerceError> {
        self.iter()
            .map(FieldValue::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(CoerceError::inbound::<Self>(&other)),
        }
    }
}

impl FieldValue for Value {
    fn is_zero(&self) -> bool {
        self.is_null()
    }

    fn to_value(&self) -> Result<Value, CoerceError> {
        Ok(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        Ok(value)
    }
}

// ── String-backed types ──────────────────────────────────────────

/// Stored as RFC 3339 text; the Unix epoch is the zero value.
impl FieldValue for DateTime<Utc> {
    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::default()
    }

    fn to_value(&self) -> Result<Value, CoerceError> {
        Ok(Value::String(self.to_rfc3339()))
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(DateTime::<Utc>::default()),
            Value::String(ref s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| CoerceError::inbound::<Self>(&value)),
            other => Err(CoerceError::inbound::<Self>(&other)),
        }
    }
}

/// Stored as hyphenated text; the nil UUID is the zero value.
impl FieldValue for Uuid {
    fn is_zero(&self) -> bool {
        self.is_nil()
    }

    fn to_value(&self) -> Result<Value, CoerceError> {
        Ok(Value::String(self.to_string()))
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Null => Ok(Uuid::nil()),
            Value::String(ref s) => {
                Uuid::parse_str(s).map_err(|_| CoerceError::inbound::<Self>(&value))
            }
            other => Err(CoerceError::inbound::<Self>(&other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values() {
        assert!(0i32.is_zero());
        assert!(0u8.is_zero());
        assert!(0.0f64.is_zero());
        assert!(false.is_zero());
        assert!(String::new().is_zero());
        assert!(None::<i64>.is_zero());
        assert!(Vec::<String>::new().is_zero());
        assert!(Uuid::nil().is_zero());
        assert!(DateTime::<Utc>::default().is_zero());

        assert!(!1i32.is_zero());
        assert!(!"x".to_string().is_zero());
        assert!(!Some(0i64).is_zero());
    }

    #[test]
    fn test_some_zero_is_written() {
        assert_eq!(Some(0i64).to_property().unwrap(), Some(Value::Int(0)));
        assert_eq!(0i64.to_property().unwrap(), None);
    }

    #[test]
    fn test_direct_assignment() {
        assert_eq!(i64::from_value(Value::Int(42)).unwrap(), 42);
        assert_eq!(f64::from_value(Value::Float(1.5)).unwrap(), 1.5);
        assert!(bool::from_value(Value::Bool(true)).unwrap());
        assert_eq!(
            String::from_value(Value::String("P1001".into())).unwrap(),
            "P1001"
        );
    }

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(i8::from_value(Value::Int(-5)).unwrap(), -5);
        assert_eq!(u16::from_value(Value::Int(65535)).unwrap(), 65535);
        assert!(i8::from_value(Value::Int(300)).is_err());
    }

    #[test]
    fn test_negative_to_unsigned_fails() {
        let err = u32::from_value(Value::Int(-1)).unwrap_err();
        assert_eq!(err.source_type, "Int");
        assert_eq!(err.target_type, "u32");
        assert!(u64::from_value(Value::Float(-2.5)).is_err());
    }

    #[test]
    fn test_float_to_int_truncates() {
        assert_eq!(i64::from_value(Value::Float(2.9)).unwrap(), 2);
        assert_eq!(i64::from_value(Value::Float(-2.9)).unwrap(), -2);
        assert_eq!(u8::from_value(Value::Float(7.99)).unwrap(), 7);
        assert!(i32::from_value(Value::Float(f64::NAN)).is_err());
        assert!(u8::from_value(Value::Float(256.0)).is_err());
    }

    #[test]
    fn test_float_past_64_bit_range_fails() {
        let two_63 = 2f64.powi(63);
        let two_64 = 2f64.powi(64);
        assert!(i64::from_value(Value::Float(two_63)).is_err());
        assert!(isize::from_value(Value::Float(two_64)).is_err());
        assert!(u64::from_value(Value::Float(two_64)).is_err());
        assert!(usize::from_value(Value::Float(two_64)).is_err());
        assert_eq!(i64::from_value(Value::Float(-two_63)).unwrap(), i64::MIN);
        assert_eq!(
            u64::from_value(Value::Float(two_63)).unwrap(),
            9_223_372_036_854_775_808
        );
        assert_eq!(i32::from_value(Value::Float(2_147_483_647.9)).unwrap(), i32::MAX);
        assert!(i32::from_value(Value::Float(2_147_483_648.0)).is_err());
    }

    #[test]
    fn test_bool_int_table() {
        assert_eq!(i32::from_value(Value::Bool(true)).unwrap(), 1);
        assert_eq!(u64::from_value(Value::Bool(false)).unwrap(), 0);
        assert_eq!(f32::from_value(Value::Bool(true)).unwrap(), 1.0);
        assert!(bool::from_value(Value::Int(1)).unwrap());
        assert!(!bool::from_value(Value::Int(0)).unwrap());
        assert!(bool::from_value(Value::Int(2)).is_err());
    }

    #[test]
    fn test_int_to_float() {
        assert_eq!(f64::from_value(Value::Int(3)).unwrap(), 3.0);
    }

    #[test]
    fn test_string_is_last_resort() {
        assert_eq!(String::from_value(Value::Int(12)).unwrap(), "12");
        assert_eq!(String::from_value(Value::Bool(true)).unwrap(), "true");
        assert!(i64::from_value(Value::String("12".into())).is_err());
    }

    #[test]
    fn test_null_yields_zero() {
        assert_eq!(i32::from_value(Value::Null).unwrap(), 0);
        assert_eq!(String::from_value(Value::Null).unwrap(), "");
        assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
        assert!(Vec::<i64>::from_value(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_option_routes_through_numeric_table() {
        assert_eq!(Option::<u8>::from_value(Value::Float(3.7)).unwrap(), Some(3));
        assert!(Option::<u8>::from_value(Value::Int(-3)).is_err());
        assert_eq!(
            Option::<String>::from_value(Value::String("x".into())).unwrap(),
            Some("x".into())
        );
    }

    #[test]
    fn test_list_coercion() {
        let list = Value::List(vec![Value::Int(1), Value::Float(2.2)]);
        assert_eq!(Vec::<i32>::from_value(list).unwrap(), vec![1, 2]);
        assert!(Vec::<i32>::from_value(Value::Int(1)).is_err());
    }

    #[test]
    fn test_unsigned_overflow_outbound() {
        assert!(u64::MAX.to_value().is_err());
        assert_eq!(7u64.to_value().unwrap(), Value::Int(7));
    }

    #[test]
    fn test_uuid_and_datetime_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(Uuid::from_value(id.to_value().unwrap()).unwrap(), id);

        let now = DateTime::parse_from_rfc3339("2025-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(DateTime::<Utc>::from_value(now.to_value().unwrap()).unwrap(), now);
        assert!(Uuid::from_value(Value::String("not-a-uuid".into())).is_err());
    }
}
