//! Canonical, lossless text for values, as carried by the XML row format.
//!
//! The canonical form ignores every formatting attribute of a descriptor: doubles use their
//! shortest round-trip form, decimals their plain string, dates RFC 3339 in UTC with milliseconds,
//! booleans `true`/`false` and byte payloads standard base64.

use std::borrow::Cow;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bigdecimal::BigDecimal;
use bytes::Bytes;
use jiff::Timestamp;
use strand_dtype::LogicalType;
use strand_error::{StrandResult, strand_bail, strand_err};

use crate::{Slot, Value, ValueDescriptor};

/// The canonical text of a value.
pub fn value_to_canonical_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Text(s) => Cow::Borrowed(s),
        Value::Float(f) => Cow::Owned(f.to_string()),
        Value::Integer(i) => Cow::Owned(i.to_string()),
        Value::Decimal(d) => Cow::Owned(d.to_string()),
        Value::Date(ts) => Cow::Owned(format!("{:.3}", ts)),
        Value::Boolean(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        Value::Bytes(b) | Value::Opaque(b) => Cow::Owned(STANDARD.encode(b)),
    }
}

/// Parse the canonical text of a value of `logical_type`.
pub fn value_from_canonical_text(logical_type: LogicalType, text: &str) -> StrandResult<Value> {
    let malformed = |e: &dyn std::fmt::Display| {
        strand_err!(StreamFormat: "malformed {} text {:?}: {}", logical_type, text, e)
    };
    Ok(match logical_type {
        LogicalType::Text => Value::Text(text.into()),
        LogicalType::Float => Value::Float(f64::from_str(text).map_err(|e| malformed(&e))?),
        LogicalType::Integer => Value::Integer(i64::from_str(text).map_err(|e| malformed(&e))?),
        LogicalType::Decimal => {
            Value::Decimal(BigDecimal::from_str(text).map_err(|e| malformed(&e))?)
        }
        LogicalType::Date => Value::from(Timestamp::from_str(text).map_err(|e| malformed(&e))?),
        LogicalType::Boolean => match text {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => return Err(malformed(&"expected true or false")),
        },
        LogicalType::Bytes => {
            Value::Bytes(Bytes::from(STANDARD.decode(text).map_err(|e| malformed(&e))?))
        }
        LogicalType::Opaque => {
            Value::Opaque(Bytes::from(STANDARD.decode(text).map_err(|e| malformed(&e))?))
        }
        LogicalType::None => strand_bail!(StreamFormat: "a NONE column cannot carry a value"),
    })
}

/// The canonical text of a slot of the column `descriptor` describes. Null is `None`.
pub fn slot_to_canonical_text(
    descriptor: &ValueDescriptor,
    slot: Option<&Slot>,
) -> StrandResult<Option<String>> {
    match slot {
        // raw bytes travel untouched so a DEFERRED column round trips exactly
        Some(Slot::Deferred(raw)) => Ok(Some(STANDARD.encode(raw))),
        None => Ok(None),
        Some(Slot::Native(v)) => Ok(Some(value_to_canonical_text(v).into_owned())),
        Some(slot @ Slot::Indexed(_)) => Ok(descriptor
            .as_native(Some(slot))?
            .map(|v| value_to_canonical_text(&v).into_owned())),
    }
}

/// Parse the canonical text of a slot into the storage mode of the column `descriptor`
/// describes.
pub fn slot_from_canonical_text(
    descriptor: &ValueDescriptor,
    text: Option<&str>,
) -> StrandResult<Option<Slot>> {
    let Some(text) = text else {
        return Ok(None);
    };
    match descriptor.storage_mode() {
        strand_dtype::StorageMode::Deferred => {
            let raw = STANDARD
                .decode(text)
                .map_err(|e| strand_err!(StreamFormat: "malformed raw bytes {:?}: {}", text, e))?;
            Ok(Some(Slot::Deferred(Bytes::from(raw))))
        }
        _ => descriptor.to_storage_slot(Some(value_from_canonical_text(
            descriptor.logical_type(),
            text,
        )?)),
    }
}
