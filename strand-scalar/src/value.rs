use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use jiff::Timestamp;
use strand_dtype::{LogicalType, StorageMode};
use strand_error::{StrandResult, strand_err};

/// A native value of one logical type.
#[derive(Debug, Clone)]
pub enum Value {
    /// A string of characters.
    Text(Arc<str>),
    /// A 64-bit floating point number.
    Float(f64),
    /// A signed 64-bit integer.
    Integer(i64),
    /// An arbitrary precision decimal.
    Decimal(BigDecimal),
    /// An instant with millisecond precision.
    Date(Timestamp),
    /// A boolean.
    Boolean(bool),
    /// A byte sequence.
    Bytes(Bytes),
    /// A serialized blob the engine does not interpret.
    Opaque(Bytes),
}

impl Value {
    /// The logical type of this value.
    pub fn logical_type(&self) -> LogicalType {
        match self {
            Self::Text(_) => LogicalType::Text,
            Self::Float(_) => LogicalType::Float,
            Self::Integer(_) => LogicalType::Integer,
            Self::Decimal(_) => LogicalType::Decimal,
            Self::Date(_) => LogicalType::Date,
            Self::Boolean(_) => LogicalType::Boolean,
            Self::Bytes(_) => LogicalType::Bytes,
            Self::Opaque(_) => LogicalType::Opaque,
        }
    }

    /// A date value from milliseconds since the Unix epoch.
    pub fn date_from_millis(millis: i64) -> StrandResult<Self> {
        Timestamp::from_millisecond(millis)
            .map(Self::Date)
            .map_err(|e| strand_err!(Conversion: "{} ms is not a representable date: {}", millis, e))
    }

    /// The text of a [`Value::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Structural equality: same variant and same value. Floats compare numerically with `NaN`
/// equal to itself, decimals ignore their scale.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) | (Self::Opaque(a), Self::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

/// Ordering between values of the same variant; `None` across variants.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => Some(a.total_cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Bytes(a), Self::Bytes(b)) | (Self::Opaque(a), Self::Opaque(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Float(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Date(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Bytes(v) | Self::Opaque(v) => write!(f, "[{} bytes]", v.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<Timestamp> for Value {
    /// Sub-millisecond precision is dropped.
    fn from(value: Timestamp) -> Self {
        Self::Date(Timestamp::from_millisecond(value.as_millisecond()).unwrap_or(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value.into())
    }
}

/// The content of one position of a row.
///
/// A slot's variant must match the storage mode of the descriptor at the same position.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// A native value.
    Native(Value),
    /// Raw bytes, decoded on demand through the descriptor's storage descriptor.
    Deferred(Bytes),
    /// An offset into the descriptor's dictionary.
    Indexed(u32),
}

impl Slot {
    /// Raw bytes for a DEFERRED slot.
    pub fn deferred(raw: impl Into<Bytes>) -> Self {
        Self::Deferred(raw.into())
    }

    /// The storage mode this slot is represented in.
    pub fn storage_mode(&self) -> StorageMode {
        match self {
            Self::Native(_) => StorageMode::Native,
            Self::Deferred(_) => StorageMode::Deferred,
            Self::Indexed(_) => StorageMode::Dictionary,
        }
    }

    /// The native value, if this slot holds one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Native(v) => Some(v),
            _ => None,
        }
    }

    /// A copy that shares no mutable buffers with `self`.
    ///
    /// Byte payloads are copied out of whatever larger buffer they were sliced from, so a
    /// retained row does not pin or alias the producer's read buffer.
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::Native(Value::Bytes(b)) => Self::Native(Value::Bytes(Bytes::copy_from_slice(b))),
            Self::Native(Value::Opaque(b)) => {
                Self::Native(Value::Opaque(Bytes::copy_from_slice(b)))
            }
            Self::Deferred(b) => Self::Deferred(Bytes::copy_from_slice(b)),
            other => other.clone(),
        }
    }
}

macro_rules! native_slot_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Slot {
                fn from(value: $ty) -> Self {
                    Self::Native(value.into())
                }
            }
        )*
    };
}

native_slot_from!(Value, &str, String, Arc<str>, f64, i64, BigDecimal, Timestamp, bool);

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn equality_is_structural() {
        assert_eq!(Value::from(1.5), Value::Float(1.5));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::from(1i64), Value::from(1.0));
        assert_eq!(
            Value::Decimal(BigDecimal::from_str("1.50").unwrap()),
            Value::Decimal(BigDecimal::from_str("1.5").unwrap())
        );
        assert_ne!(Value::Bytes(Bytes::from_static(b"a")), Value::Opaque(Bytes::from_static(b"a")));
    }

    #[test]
    fn dates_truncate_to_milliseconds() {
        let ts = Timestamp::from_nanosecond(1_500_123_456).unwrap();
        assert_eq!(Value::from(ts), Value::date_from_millis(1_500).unwrap());
    }

    #[test]
    fn slots_report_storage_mode() {
        assert_eq!(Slot::from("a").storage_mode(), StorageMode::Native);
        assert_eq!(Slot::deferred(&b"a"[..]).storage_mode(), StorageMode::Deferred);
        assert_eq!(Slot::Indexed(0).storage_mode(), StorageMode::Dictionary);
    }

    #[test]
    fn deep_copy_detaches_bytes() {
        let shared = Bytes::from(vec![1u8, 2, 3, 4]);
        let slot = Slot::Deferred(shared.slice(1..3));
        let copy = slot.deep_copy();
        assert_eq!(copy, slot);
        match copy {
            Slot::Deferred(b) => assert_ne!(b.as_ptr(), shared[1..].as_ptr()),
            _ => unreachable!(),
        }
    }
}
