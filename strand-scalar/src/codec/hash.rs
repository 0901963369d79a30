use std::hash::{Hash, Hasher};

use num_traits::Zero;
use rustc_hash::FxHasher;
use strand_error::StrandResult;

use crate::{Slot, Value, ValueDescriptor};

/// Mixed into the hash of a null so nulls of different types spread apart.
const NULL_SEED: u64 = 0x6e75_6c6c_6e75_6c6c;

impl ValueDescriptor {
    /// A deterministic hash of a slot, consistent with [`ValueDescriptor::compare`]: slots that
    /// compare equal hash equal whatever their storage mode.
    pub fn hash(&self, slot: Option<&Slot>) -> StrandResult<u64> {
        let mut hasher = FxHasher::default();
        match self.resolve(slot)?.as_deref() {
            None => {
                NULL_SEED.hash(&mut hasher);
                self.logical_type().code().hash(&mut hasher);
            }
            Some(value) => self.hash_value(value, &mut hasher),
        }
        Ok(hasher.finish())
    }

    pub(crate) fn hash_value<H: Hasher>(&self, value: &Value, state: &mut H) {
        match value {
            Value::Text(s) if self.is_case_insensitive() => {
                for c in s.chars().flat_map(char::to_lowercase) {
                    c.hash(state);
                }
            }
            Value::Text(s) => s.hash(state),
            Value::Float(f) => {
                let canonical = if *f == 0.0 {
                    0.0f64
                } else if f.is_nan() {
                    f64::NAN
                } else {
                    *f
                };
                canonical.to_bits().hash(state);
            }
            Value::Integer(i) => i.hash(state),
            Value::Decimal(d) => {
                if d.is_zero() {
                    0u8.hash(state);
                } else {
                    let (unscaled, scale) = d.normalized().as_bigint_and_exponent();
                    unscaled.hash(state);
                    scale.hash(state);
                }
            }
            Value::Date(ts) => ts.as_millisecond().hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Bytes(b) | Value::Opaque(b) => b.as_ref().hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use strand_dtype::LogicalType;

    use super::*;

    #[test]
    fn equal_values_hash_equal() {
        let text = ValueDescriptor::new("t", LogicalType::Text).with_case_insensitive(true);
        assert_eq!(
            text.hash(Some(&Slot::from("Oslo"))).unwrap(),
            text.hash(Some(&Slot::from("OSLO"))).unwrap()
        );

        let float = ValueDescriptor::new("f", LogicalType::Float);
        assert_eq!(
            float.hash(Some(&Slot::from(-0.0))).unwrap(),
            float.hash(Some(&Slot::from(0.0))).unwrap()
        );

        let decimal = ValueDescriptor::new("d", LogicalType::Decimal);
        assert_eq!(
            decimal.hash(Some(&Slot::from(BigDecimal::from_str("2.50").unwrap()))).unwrap(),
            decimal.hash(Some(&Slot::from(BigDecimal::from_str("2.5").unwrap()))).unwrap()
        );
    }

    #[test]
    fn hash_is_storage_independent() {
        let native = ValueDescriptor::new("flag", LogicalType::Boolean);
        let dict = native.clone().with_dictionary([Value::Boolean(false), Value::Boolean(true)]);
        assert_eq!(
            native.hash(Some(&Slot::from(true))).unwrap(),
            dict.hash(Some(&Slot::Indexed(1))).unwrap()
        );
    }

    #[test]
    fn nulls_hash_per_type() {
        let a = ValueDescriptor::new("a", LogicalType::Integer);
        let b = ValueDescriptor::new("b", LogicalType::Text);
        assert_eq!(a.hash(None).unwrap(), a.hash(None).unwrap());
        assert_ne!(a.hash(None).unwrap(), b.hash(None).unwrap());
    }
}
