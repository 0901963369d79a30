use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use strand_error::{StrandResult, strand_err};

use super::bridge::f64_to_decimal;
use crate::{Slot, Value, ValueDescriptor};

fn compare_text(a: &str, b: &str, case_insensitive: bool) -> Ordering {
    if case_insensitive {
        a.chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase))
    } else {
        a.cmp(b)
    }
}

/// NaN sorts after every other double and equal to itself; `-0.0 == 0.0`.
fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

fn numeric_as_decimal(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Integer(i) => Some(BigDecimal::from(*i)),
        Value::Decimal(d) => Some(d.clone()),
        Value::Float(f) => f64_to_decimal(*f).ok(),
        _ => None,
    }
}

impl ValueDescriptor {
    /// Order two non-null values with this descriptor's rules, ignoring the descending flag.
    pub(crate) fn compare_values(&self, a: &Value, b: &Value) -> StrandResult<Ordering> {
        Ok(match (a, b) {
            (Value::Text(a), Value::Text(b)) => compare_text(a, b, self.is_case_insensitive()),
            (Value::Float(a), Value::Float(b)) => compare_f64(*a, *b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) | (Value::Opaque(a), Value::Opaque(b)) => a.cmp(b),
            (Value::Float(a), Value::Integer(b)) => compare_f64(*a, *b as f64),
            (Value::Integer(a), Value::Float(b)) => compare_f64(*a as f64, *b),
            (a, b) => match (numeric_as_decimal(a), numeric_as_decimal(b)) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => {
                    return Err(strand_err!(
                        Conversion: "column {} ({}): cannot compare {} with {}",
                        self.name(),
                        self.logical_type(),
                        a.logical_type(),
                        b.logical_type()
                    ));
                }
            },
        })
    }

    fn order(&self, a: Option<&Value>, b: Option<&Value>) -> StrandResult<Ordering> {
        match (a, b) {
            (None, None) => Ok(Ordering::Equal),
            (None, Some(_)) => Ok(Ordering::Less),
            (Some(_), None) => Ok(Ordering::Greater),
            (Some(a), Some(b)) => {
                let ordering = self.compare_values(a, b)?;
                Ok(if self.is_descending() {
                    ordering.reverse()
                } else {
                    ordering
                })
            }
        }
    }

    /// Order two slots of this column.
    ///
    /// Nulls sort first whether or not the column is descending; descending reverses only
    /// comparisons between two non-null values.
    pub fn compare(&self, a: Option<&Slot>, b: Option<&Slot>) -> StrandResult<Ordering> {
        let a = self.resolve(a)?;
        let b = self.resolve(b)?;
        self.order(a.as_deref(), b.as_deref())
    }

    /// Order a slot of this column against a slot described by `other`.
    ///
    /// `b` is decoded by `other` and, when the logical types differ, converted into this
    /// column's type first. The rules of this descriptor decide, so swapping the operands may
    /// give a different answer.
    pub fn compare_with(
        &self,
        a: Option<&Slot>,
        other: &ValueDescriptor,
        b: Option<&Slot>,
    ) -> StrandResult<Ordering> {
        let a = self.resolve(a)?;
        if other.logical_type() == self.logical_type() {
            let b = other.resolve(b)?;
            self.order(a.as_deref(), b.as_deref())
        } else {
            let b = self.convert_from(other, b)?;
            self.order(a.as_deref(), b.as_ref())
        }
    }

    /// Whether two slots of this column compare equal.
    pub fn equals(&self, a: Option<&Slot>, b: Option<&Slot>) -> StrandResult<bool> {
        Ok(self.compare(a, b)? == Ordering::Equal)
    }
}
