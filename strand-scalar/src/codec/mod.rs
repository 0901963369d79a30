//! The storage codec: reading any slot of a column as any logical type.

mod bridge;
mod compare;
mod hash;

use std::borrow::Cow;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use jiff::Timestamp;
use num_traits::Zero;
use strand_dtype::{LogicalType, StorageMode, pad_end, pad_start};
use strand_error::{StrandError, StrandResult, strand_bail, strand_err};

pub use self::bridge::*;
use crate::{EngineConfig, Slot, Value, ValueDescriptor};

const TRUE_WORDS: [&str; 4] = ["Y", "YES", "TRUE", "1"];
const FALSE_WORDS: [&str; 4] = ["N", "NO", "FALSE", "0"];

/// Parse boolean text: `Y`, `YES`, `TRUE`, `1` or `N`, `NO`, `FALSE`, `0`, in any case.
pub fn parse_boolean(text: &str) -> StrandResult<bool> {
    let word = text.trim();
    if TRUE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word)) {
        Ok(true)
    } else if FALSE_WORDS.iter().any(|w| w.eq_ignore_ascii_case(word)) {
        Ok(false)
    } else {
        strand_bail!(Conversion: "{:?} is not a boolean", text)
    }
}

impl ValueDescriptor {
    fn no_path(&self, from: LogicalType, to: LogicalType) -> StrandError {
        strand_err!(
            Conversion: "column {} ({}): no conversion from {} to {}",
            self.name(),
            self.logical_type(),
            from,
            to
        )
    }

    fn value_context(&self, raw: &[u8]) -> String {
        format!(
            "column {} ({}) value {:?}",
            self.name(),
            self.logical_type(),
            String::from_utf8_lossy(raw)
        )
    }

    /// `result` with the column, its type and the converted value named in any error.
    fn bridged<T>(&self, result: StrandResult<T>, value: &Value, target: LogicalType) -> StrandResult<T> {
        result.map_err(|e| {
            e.with_context(format!(
                "column {} ({}) value {} as {}",
                self.name(),
                self.logical_type(),
                value,
                target
            ))
        })
    }

    /// Whether `slot` is null.
    ///
    /// An empty TEXT value counts as null when [`EngineConfig::empty_text_is_null`] is set, and
    /// blank raw text is null for every column that is not TEXT or binary.
    pub fn is_null(&self, slot: Option<&Slot>) -> bool {
        let empty_text_is_null = EngineConfig::global().empty_text_is_null;
        match slot {
            None => true,
            Some(Slot::Native(Value::Text(s))) => empty_text_is_null && s.is_empty(),
            Some(Slot::Native(_)) => false,
            Some(Slot::Deferred(raw)) => match self.logical_type() {
                LogicalType::Text => empty_text_is_null && self.trim().apply_bytes(raw).is_empty(),
                LogicalType::Bytes | LogicalType::Opaque => false,
                _ => self.trim().apply_bytes(raw).trim_ascii().is_empty(),
            },
            Some(Slot::Indexed(idx)) => self
                .dictionary()
                .with_value(*idx, |v| {
                    matches!(v, Value::Text(s) if empty_text_is_null && s.is_empty())
                })
                .unwrap_or(false),
        }
    }

    /// Decode `slot` into a value of this column's logical type. Null and null-equivalent slots
    /// resolve to `None`.
    pub(crate) fn resolve<'a>(
        &self,
        slot: Option<&'a Slot>,
    ) -> StrandResult<Option<Cow<'a, Value>>> {
        let value = match slot {
            None => return Ok(None),
            Some(Slot::Native(v)) => Cow::Borrowed(v),
            Some(Slot::Indexed(idx)) => Cow::Owned(self.dictionary().get(*idx).cloned().ok_or_else(|| {
                strand_err!(
                    Conversion: "column {} ({}): dictionary index {} outside 0..{}",
                    self.name(),
                    self.logical_type(),
                    idx,
                    self.dictionary().len()
                )
            })?),
            Some(Slot::Deferred(raw)) => match self.decode_deferred(raw)? {
                Some(v) => Cow::Owned(v),
                None => return Ok(None),
            },
        };
        if EngineConfig::global().empty_text_is_null
            && matches!(&*value, Value::Text(s) if s.is_empty())
        {
            return Ok(None);
        }
        Ok(Some(value))
    }

    fn decode_deferred(&self, raw: &Bytes) -> StrandResult<Option<Value>> {
        match self.logical_type() {
            LogicalType::Bytes => return Ok(Some(Value::Bytes(raw.clone()))),
            LogicalType::Opaque => return Ok(Some(Value::Opaque(raw.clone()))),
            _ => {}
        }
        let encoding = self
            .storage_descriptor()
            .map_or(self.encoding(), |s| s.encoding());
        let text = encoding
            .decode(raw)
            .map_err(|e| e.with_context(self.value_context(raw)))?;
        self.parse_text(&text, self.logical_type())
    }

    /// Parse text into `target` with this descriptor's trim policy, mask, symbols and time zone.
    ///
    /// Blank text is null for every target but TEXT.
    pub fn parse_text(&self, text: &str, target: LogicalType) -> StrandResult<Option<Value>> {
        let trimmed = self.trim().apply(text);
        if target != LogicalType::Text && trimmed.trim().is_empty() {
            return Ok(None);
        }
        let parsed = match target {
            LogicalType::Text => Ok(Value::Text(trimmed.into())),
            LogicalType::Integer => self
                .number_renderer()
                .and_then(|r| r.parse(trimmed))
                .and_then(|d| decimal_to_i64(&d))
                .map(Value::Integer),
            LogicalType::Float => self
                .number_renderer()
                .and_then(|r| r.parse_f64(trimmed))
                .map(Value::Float),
            LogicalType::Decimal => self
                .number_renderer()
                .and_then(|r| r.parse(trimmed))
                .map(Value::Decimal),
            LogicalType::Date => self
                .date_format()
                .and_then(|f| f.parse(trimmed, self.is_lenient_dates()))
                .map(Value::Date),
            LogicalType::Boolean => parse_boolean(trimmed).map(Value::Boolean),
            LogicalType::Bytes => self
                .encoding()
                .encode(trimmed)
                .map(|b| Value::Bytes(Bytes::copy_from_slice(&b))),
            LogicalType::Opaque | LogicalType::None => {
                Err(self.no_path(LogicalType::Text, target))
            }
        };
        parsed.map(Some).map_err(|e| {
            e.with_context(format!(
                "column {} ({}) text {:?} as {}",
                self.name(),
                self.logical_type(),
                text,
                target
            ))
        })
    }

    /// Render a value as text in this descriptor's format, without padding.
    pub fn format_value<'v>(&self, value: &'v Value) -> StrandResult<Cow<'v, str>> {
        Ok(match value {
            Value::Text(s) => Cow::Borrowed(s.as_ref()),
            Value::Integer(v) => Cow::Owned(self.number_renderer()?.format_i64(*v)),
            Value::Float(v) => Cow::Owned(self.number_renderer()?.format_f64(*v)),
            Value::Decimal(v) => Cow::Owned(self.number_renderer()?.format_decimal(v)),
            Value::Date(v) => Cow::Owned(self.date_format()?.format(*v)),
            Value::Boolean(v) => Cow::Borrowed(self.boolean_text(*v)),
            Value::Bytes(v) => self
                .encoding()
                .decode(v)
                .map_err(|e| e.with_context(self.value_context(v)))?,
            Value::Opaque(_) => return Err(self.no_path(LogicalType::Opaque, LogicalType::Text)),
        })
    }

    fn boolean_text(&self, value: bool) -> &'static str {
        let long = self.length().is_some_and(|l| l >= 3);
        match (value, long) {
            (true, false) => "Y",
            (false, false) => "N",
            (true, true) => "true",
            (false, true) => "false",
        }
    }

    fn pad<'a>(&self, text: Option<Cow<'a, str>>) -> Option<Cow<'a, str>> {
        let width = match self.length() {
            Some(width) if self.is_output_padding() => width as usize,
            _ => return text,
        };
        let Some(text) = text else {
            return Some(Cow::Owned(" ".repeat(width)));
        };
        if text.chars().count() >= width {
            return Some(text);
        }
        let padded = if self.logical_type().is_masked() {
            pad_start(&text, width).into_owned()
        } else {
            pad_end(&text, width).into_owned()
        };
        Some(Cow::Owned(padded))
    }

    /// The text of a DEFERRED slot whose raw bytes are already in this descriptor's format.
    fn identical_text<'a>(&self, raw: &'a [u8]) -> StrandResult<Option<Cow<'a, str>>> {
        let text = self
            .encoding()
            .decode(raw)
            .map_err(|e| e.with_context(self.value_context(raw)))?;
        let null = match self.logical_type() {
            LogicalType::Text => EngineConfig::global().empty_text_is_null && text.is_empty(),
            _ => text.trim().is_empty(),
        };
        Ok((!null).then_some(text))
    }

    /// The slot as text.
    ///
    /// A null slot is `None`, or a string of spaces when output padding and a display length
    /// are both set.
    pub fn as_text<'a>(&self, slot: Option<&'a Slot>) -> StrandResult<Option<Cow<'a, str>>> {
        let text = match slot {
            Some(Slot::Deferred(raw)) if self.is_identical_format() => self.identical_text(raw)?,
            _ => match self.resolve(slot)? {
                None => None,
                Some(Cow::Borrowed(v)) => Some(self.format_value(v)?),
                Some(Cow::Owned(v)) => Some(Cow::Owned(self.format_value(&v)?.into_owned())),
            },
        };
        Ok(self.pad(text))
    }

    /// The slot as a double.
    pub fn as_float(&self, slot: Option<&Slot>) -> StrandResult<Option<f64>> {
        let Some(value) = self.resolve(slot)? else {
            return Ok(None);
        };
        match &*value {
            Value::Float(f) => Ok(Some(*f)),
            Value::Integer(i) => Ok(Some(*i as f64)),
            Value::Decimal(d) => Ok(Some(decimal_to_f64(d))),
            Value::Date(ts) => Ok(Some(ts.as_millisecond() as f64)),
            Value::Boolean(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
            Value::Text(s) => match self.parse_text(s, LogicalType::Float)? {
                Some(Value::Float(f)) => Ok(Some(f)),
                _ => Ok(None),
            },
            other => Err(self.no_path(other.logical_type(), LogicalType::Float)),
        }
    }

    /// The slot as an integer. Doubles round half away from zero, decimals truncate.
    pub fn as_integer(&self, slot: Option<&Slot>) -> StrandResult<Option<i64>> {
        let Some(value) = self.resolve(slot)? else {
            return Ok(None);
        };
        match &*value {
            Value::Integer(i) => Ok(Some(*i)),
            v @ Value::Float(f) => self.bridged(f64_to_i64(*f), v, LogicalType::Integer).map(Some),
            v @ Value::Decimal(d) => self
                .bridged(decimal_to_i64(d), v, LogicalType::Integer)
                .map(Some),
            Value::Date(ts) => Ok(Some(ts.as_millisecond())),
            Value::Boolean(b) => Ok(Some(i64::from(*b))),
            Value::Text(s) => match self.parse_text(s, LogicalType::Integer)? {
                Some(Value::Integer(i)) => Ok(Some(i)),
                _ => Ok(None),
            },
            other => Err(self.no_path(other.logical_type(), LogicalType::Integer)),
        }
    }

    /// The slot as a decimal. Doubles convert exactly.
    pub fn as_decimal(&self, slot: Option<&Slot>) -> StrandResult<Option<BigDecimal>> {
        let Some(value) = self.resolve(slot)? else {
            return Ok(None);
        };
        match &*value {
            Value::Decimal(d) => Ok(Some(d.clone())),
            Value::Integer(i) => Ok(Some(BigDecimal::from(*i))),
            v @ Value::Float(f) => self
                .bridged(f64_to_decimal(*f), v, LogicalType::Decimal)
                .map(Some),
            Value::Date(ts) => Ok(Some(BigDecimal::from(ts.as_millisecond()))),
            Value::Boolean(b) => Ok(Some(BigDecimal::from(i64::from(*b)))),
            Value::Text(s) => match self.parse_text(s, LogicalType::Decimal)? {
                Some(Value::Decimal(d)) => Ok(Some(d)),
                _ => Ok(None),
            },
            other => Err(self.no_path(other.logical_type(), LogicalType::Decimal)),
        }
    }

    /// The slot as an instant. Numbers are milliseconds since the Unix epoch.
    pub fn as_date(&self, slot: Option<&Slot>) -> StrandResult<Option<Timestamp>> {
        let Some(value) = self.resolve(slot)? else {
            return Ok(None);
        };
        let millis = match &*value {
            Value::Date(ts) => return Ok(Some(*ts)),
            Value::Integer(i) => *i,
            v @ Value::Float(f) => self.bridged(f64_to_i64(*f), v, LogicalType::Date)?,
            v @ Value::Decimal(d) => self.bridged(decimal_to_i64(d), v, LogicalType::Date)?,
            Value::Text(s) => {
                return match self.parse_text(s, LogicalType::Date)? {
                    Some(Value::Date(ts)) => Ok(Some(ts)),
                    _ => Ok(None),
                };
            }
            other => return Err(self.no_path(other.logical_type(), LogicalType::Date)),
        };
        self.bridged(millis_to_timestamp(millis), &value, LogicalType::Date)
            .map(Some)
    }

    /// The slot as a boolean. Numbers are `true` when non-zero.
    pub fn as_boolean(&self, slot: Option<&Slot>) -> StrandResult<Option<bool>> {
        let Some(value) = self.resolve(slot)? else {
            return Ok(None);
        };
        match &*value {
            Value::Boolean(b) => Ok(Some(*b)),
            Value::Integer(i) => Ok(Some(*i != 0)),
            Value::Float(f) => Ok(Some(*f != 0.0)),
            Value::Decimal(d) => Ok(Some(!d.is_zero())),
            Value::Text(s) => match self.parse_text(s, LogicalType::Boolean)? {
                Some(Value::Boolean(b)) => Ok(Some(b)),
                _ => Ok(None),
            },
            other => Err(self.no_path(other.logical_type(), LogicalType::Boolean)),
        }
    }

    /// The slot as bytes. Values that are not binary are rendered as text and encoded.
    pub fn as_bytes<'a>(&self, slot: Option<&'a Slot>) -> StrandResult<Option<Cow<'a, [u8]>>> {
        if let Some(Slot::Deferred(raw)) = slot {
            if self.logical_type().is_binary() {
                return Ok(Some(Cow::Borrowed(raw.as_ref())));
            }
        }
        let Some(value) = self.resolve(slot)? else {
            return Ok(None);
        };
        let bytes = match value {
            Cow::Borrowed(Value::Bytes(b) | Value::Opaque(b)) => Cow::Borrowed(b.as_ref()),
            Cow::Owned(Value::Bytes(b) | Value::Opaque(b)) => Cow::Owned(b.to_vec()),
            other => {
                let text = self.format_value(&other)?;
                Cow::Owned(self.encoding().encode(&text)?.into_owned())
            }
        };
        Ok(Some(bytes))
    }

    /// The slot decoded into this column's logical type.
    pub fn as_native(&self, slot: Option<&Slot>) -> StrandResult<Option<Value>> {
        Ok(self.resolve(slot)?.map(Cow::into_owned))
    }

    /// Normalise a slot of any storage mode into [`Slot::Native`].
    pub fn to_native_slot(&self, slot: Option<&Slot>) -> StrandResult<Option<Slot>> {
        Ok(self.as_native(slot)?.map(Slot::Native))
    }

    /// Store a native value in this column's storage mode: interned for DICTIONARY columns,
    /// rendered through the storage descriptor for DEFERRED ones.
    pub fn to_storage_slot(&self, value: Option<Value>) -> StrandResult<Option<Slot>> {
        let Some(value) = value else {
            return Ok(None);
        };
        Ok(Some(match self.storage_mode() {
            StorageMode::Native => Slot::Native(value),
            StorageMode::Dictionary => Slot::Indexed(self.dictionary().intern(value)?),
            StorageMode::Deferred => match value {
                Value::Bytes(b) | Value::Opaque(b) => Slot::Deferred(b),
                other => {
                    let storage = self.storage_descriptor().unwrap_or(self);
                    let text = storage.format_value(&other)?;
                    Slot::Deferred(Bytes::copy_from_slice(&storage.encoding().encode(&text)?))
                }
            },
        }))
    }

    /// Convert a slot described by `source` into a value of this column's logical type.
    pub fn convert_from(
        &self,
        source: &ValueDescriptor,
        slot: Option<&Slot>,
    ) -> StrandResult<Option<Value>> {
        Ok(match self.logical_type() {
            LogicalType::Text => source.as_text(slot)?.map(|t| Value::Text(t.as_ref().into())),
            LogicalType::Float => source.as_float(slot)?.map(Value::Float),
            LogicalType::Integer => source.as_integer(slot)?.map(Value::Integer),
            LogicalType::Decimal => source.as_decimal(slot)?.map(Value::Decimal),
            LogicalType::Date => source.as_date(slot)?.map(Value::Date),
            LogicalType::Boolean => source.as_boolean(slot)?.map(Value::Boolean),
            LogicalType::Bytes => source
                .as_bytes(slot)?
                .map(|b| Value::Bytes(Bytes::copy_from_slice(&b))),
            LogicalType::Opaque => match source.resolve(slot)?.as_deref() {
                None => None,
                Some(Value::Opaque(b) | Value::Bytes(b)) => Some(Value::Opaque(b.clone())),
                Some(other) => {
                    return Err(self.no_path(other.logical_type(), LogicalType::Opaque));
                }
            },
            LogicalType::None => {
                return Err(self.no_path(source.logical_type(), LogicalType::None));
            }
        })
    }
}
