//! The binary encoding of single values and slots.
//!
//! Every value is preceded by a presence byte (`0` null, `1` present). Integers, doubles and
//! dates are big-endian fixed width; text, decimals and byte payloads are a big-endian `u32`
//! length followed by the payload. Decimals travel as their canonical string. DEFERRED slots
//! travel as their raw bytes and DICTIONARY slots as the value they index, interned again on the
//! reading side.

use std::io::{self, Read, Write};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use strand_dtype::{LogicalType, StorageMode};
use strand_error::{StrandError, StrandResult, strand_bail, strand_err};

use crate::codec::millis_to_timestamp;
use crate::{Slot, Value, ValueDescriptor};

const NULL: u8 = 0;
const PRESENT: u8 = 1;

/// Map a read failure in the middle of a row. Any failure there leaves the stream out of step,
/// so timeouts are reported as format errors too.
pub fn stream_error(err: io::Error) -> StrandError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => strand_err!(StreamFormat: "stream ended in the middle of a row"),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
            strand_err!(StreamFormat: "stream timed out in the middle of a row: {}", err)
        }
        _ => StrandError::from(err),
    }
}

fn read_array<const N: usize>(source: &mut impl Read) -> StrandResult<[u8; N]> {
    let mut buf = [0u8; N];
    source.read_exact(&mut buf).map_err(stream_error)?;
    Ok(buf)
}

/// Read one byte.
pub fn read_u8(source: &mut impl Read) -> StrandResult<u8> {
    Ok(read_array::<1>(source)?[0])
}

/// Read a big-endian `u32`.
pub fn read_u32(source: &mut impl Read) -> StrandResult<u32> {
    Ok(u32::from_be_bytes(read_array(source)?))
}

/// Read a big-endian `i64`.
pub fn read_i64(source: &mut impl Read) -> StrandResult<i64> {
    Ok(i64::from_be_bytes(read_array(source)?))
}

/// Read a `u32` length followed by that many bytes.
pub fn read_len_prefixed(source: &mut impl Read) -> StrandResult<Vec<u8>> {
    let len = read_u32(source)? as usize;
    let mut buf = Vec::with_capacity(len.min(64 * 1024));
    source
        .by_ref()
        .take(len as u64)
        .read_to_end(&mut buf)
        .map_err(stream_error)?;
    if buf.len() != len {
        strand_bail!(StreamFormat: "expected {} payload bytes, stream ended after {}", len, buf.len());
    }
    Ok(buf)
}

/// Read a length-prefixed UTF-8 string.
pub fn read_string(source: &mut impl Read) -> StrandResult<String> {
    Ok(String::from_utf8(read_len_prefixed(source)?)?)
}

/// Read an optional length-prefixed string behind a presence byte.
pub fn read_opt_string(source: &mut impl Read) -> StrandResult<Option<String>> {
    match read_presence(source)? {
        false => Ok(None),
        true => read_string(source).map(Some),
    }
}

/// Write a `u32` length followed by `payload`.
pub fn write_len_prefixed(sink: &mut impl Write, payload: &[u8]) -> StrandResult<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| strand_err!(InvalidArgument: "payload of {} bytes is too long", payload.len()))?;
    sink.write_all(&len.to_be_bytes())?;
    sink.write_all(payload)?;
    Ok(())
}

/// Write an optional string behind a presence byte.
pub fn write_opt_string(sink: &mut impl Write, text: Option<&str>) -> StrandResult<()> {
    match text {
        None => Ok(sink.write_all(&[NULL])?),
        Some(text) => {
            sink.write_all(&[PRESENT])?;
            write_len_prefixed(sink, text.as_bytes())
        }
    }
}

/// Read a presence byte.
pub fn read_presence(source: &mut impl Read) -> StrandResult<bool> {
    match read_u8(source)? {
        NULL => Ok(false),
        PRESENT => Ok(true),
        other => strand_bail!(StreamFormat: "invalid presence byte {:#04x}", other),
    }
}

/// Write `value` with its presence byte.
pub fn write_value(sink: &mut impl Write, value: Option<&Value>) -> StrandResult<()> {
    let Some(value) = value else {
        sink.write_all(&[NULL])?;
        return Ok(());
    };
    sink.write_all(&[PRESENT])?;
    match value {
        Value::Text(s) => write_len_prefixed(sink, s.as_bytes())?,
        Value::Float(f) => sink.write_all(&f.to_be_bytes())?,
        Value::Integer(i) => sink.write_all(&i.to_be_bytes())?,
        Value::Decimal(d) => write_len_prefixed(sink, d.to_string().as_bytes())?,
        Value::Date(ts) => sink.write_all(&ts.as_millisecond().to_be_bytes())?,
        Value::Boolean(b) => sink.write_all(&[u8::from(*b)])?,
        Value::Bytes(b) | Value::Opaque(b) => write_len_prefixed(sink, b)?,
    }
    Ok(())
}

/// Read a value of `logical_type` written by [`write_value`].
pub fn read_value(source: &mut impl Read, logical_type: LogicalType) -> StrandResult<Option<Value>> {
    if !read_presence(source)? {
        return Ok(None);
    }
    let value = match logical_type {
        LogicalType::Text => Value::Text(read_string(source)?.into()),
        LogicalType::Float => Value::Float(f64::from_be_bytes(read_array(source)?)),
        LogicalType::Integer => Value::Integer(read_i64(source)?),
        LogicalType::Decimal => {
            let text = read_string(source)?;
            Value::Decimal(BigDecimal::from_str(&text).map_err(|e| {
                strand_err!(StreamFormat: "malformed decimal {:?} in stream: {}", text, e)
            })?)
        }
        LogicalType::Date => Value::Date(
            millis_to_timestamp(read_i64(source)?)
                .map_err(|e| strand_err!(StreamFormat: "date in stream: {}", e))?,
        ),
        LogicalType::Boolean => match read_u8(source)? {
            0 => Value::Boolean(false),
            1 => Value::Boolean(true),
            other => strand_bail!(StreamFormat: "invalid boolean byte {:#04x}", other),
        },
        LogicalType::Bytes => Value::Bytes(Bytes::from(read_len_prefixed(source)?)),
        LogicalType::Opaque => Value::Opaque(Bytes::from(read_len_prefixed(source)?)),
        LogicalType::None => strand_bail!(StreamFormat: "a NONE column cannot carry a value"),
    };
    Ok(Some(value))
}

/// Write a slot of the column `descriptor` describes.
pub fn write_slot(
    descriptor: &ValueDescriptor,
    slot: Option<&Slot>,
    sink: &mut impl Write,
) -> StrandResult<()> {
    match (descriptor.storage_mode(), slot) {
        (_, None) => write_value(sink, None),
        (StorageMode::Deferred, Some(Slot::Deferred(raw))) => {
            sink.write_all(&[PRESENT])?;
            write_len_prefixed(sink, raw)
        }
        (StorageMode::Native, Some(Slot::Native(value))) => {
            if value.logical_type() != descriptor.logical_type() {
                strand_bail!(
                    Conversion: "column {} ({}) holds a {} value",
                    descriptor.name(),
                    descriptor.logical_type(),
                    value.logical_type()
                );
            }
            write_value(sink, Some(value))
        }
        (StorageMode::Dictionary, Some(slot @ Slot::Indexed(_))) => {
            write_value(sink, descriptor.as_native(Some(slot))?.as_ref())
        }
        (mode, Some(other)) => strand_bail!(
            Conversion: "column {} is {} but its slot is {}",
            descriptor.name(),
            mode,
            other.storage_mode()
        ),
    }
}

/// Read a slot of the column `descriptor` describes, in that column's storage mode.
pub fn read_slot(descriptor: &ValueDescriptor, source: &mut impl Read) -> StrandResult<Option<Slot>> {
    match descriptor.storage_mode() {
        StorageMode::Deferred => {
            if !read_presence(source)? {
                return Ok(None);
            }
            Ok(Some(Slot::Deferred(Bytes::from(read_len_prefixed(source)?))))
        }
        StorageMode::Native => Ok(read_value(source, descriptor.logical_type())?.map(Slot::Native)),
        StorageMode::Dictionary => {
            let value = read_value(source, descriptor.logical_type())?;
            descriptor.to_storage_slot(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use jiff::Timestamp;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(LogicalType::Text, Some(Value::from("AB-100")))]
    #[case(LogicalType::Integer, Some(Value::Integer(-42)))]
    #[case(LogicalType::Float, Some(Value::Float(2.5)))]
    #[case(LogicalType::Decimal, Some(Value::Decimal(BigDecimal::from_str("-12.340").unwrap())))]
    #[case(LogicalType::Date, Some(Value::Date(Timestamp::from_millisecond(1_700_000_000_123).unwrap())))]
    #[case(LogicalType::Boolean, Some(Value::Boolean(true)))]
    #[case(LogicalType::Bytes, Some(Value::Bytes(Bytes::from_static(b"\x00\xff"))))]
    #[case(LogicalType::Opaque, Some(Value::Opaque(Bytes::from_static(b"blob"))))]
    #[case(LogicalType::Integer, None)]
    fn values_survive_the_wire(#[case] logical_type: LogicalType, #[case] value: Option<Value>) {
        let mut buf = Vec::new();
        write_value(&mut buf, value.as_ref()).unwrap();
        let back = read_value(&mut Cursor::new(buf), logical_type).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn integers_are_big_endian() {
        let mut buf = Vec::new();
        write_value(&mut buf, Some(&Value::Integer(42))).unwrap();
        assert_eq!(buf, [1, 0, 0, 0, 0, 0, 0, 0, 42]);
    }

    #[test]
    fn truncated_value_is_a_format_error() {
        let mut buf = Vec::new();
        write_value(&mut buf, Some(&Value::from("hello"))).unwrap();
        buf.truncate(buf.len() - 2);
        let err = read_value(&mut Cursor::new(buf), LogicalType::Text).unwrap_err();
        assert!(err.is_stream_format());
    }

    #[test]
    fn bad_presence_byte() {
        let err = read_value(&mut Cursor::new(vec![7u8]), LogicalType::Boolean).unwrap_err();
        assert!(err.is_stream_format());
    }

    #[test]
    fn dictionary_slots_travel_as_values() {
        let writer = ValueDescriptor::new("flag", LogicalType::Boolean)
            .with_dictionary([Value::Boolean(false), Value::Boolean(true)]);
        let mut buf = Vec::new();
        write_slot(&writer, Some(&Slot::Indexed(1)), &mut buf).unwrap();
        assert_eq!(buf, [1, 1]);

        let reader = ValueDescriptor::new("flag", LogicalType::Boolean).with_dictionary([]);
        let slot = read_slot(&reader, &mut Cursor::new(buf)).unwrap();
        assert_eq!(slot, Some(Slot::Indexed(0)));
        assert_eq!(reader.dictionary().len(), 1);
    }

    #[test]
    fn deferred_slots_keep_raw_bytes() {
        let d = ValueDescriptor::new("qty", LogicalType::Integer).with_deferred_storage();
        let slot = Slot::deferred(&b" 0042 "[..]);
        let mut buf = Vec::new();
        write_slot(&d, Some(&slot), &mut buf).unwrap();
        assert_eq!(read_slot(&d, &mut Cursor::new(buf)).unwrap(), Some(slot));
    }

    #[test]
    fn mismatched_slot_is_rejected() {
        let d = ValueDescriptor::new("qty", LogicalType::Integer);
        let mut buf = Vec::new();
        assert!(write_slot(&d, Some(&Slot::from("x")), &mut buf).unwrap_err().is_conversion());
        assert!(write_slot(&d, Some(&Slot::Indexed(0)), &mut buf).unwrap_err().is_conversion());
    }
}
