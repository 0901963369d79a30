use std::io::{self, BufReader, Cursor, Read};

use strand_dtype::{LogicalType, StorageMode, TrimPolicy};
use strand_row::{RowReader, RowSchema, RowWriter, decode_row, encode_row, encode_schema};
use strand_scalar::{Slot, Value, ValueDescriptor};

fn orders() -> RowSchema {
    RowSchema::from_descriptors([
        ValueDescriptor::new("code", LogicalType::Text).with_length(10),
        ValueDescriptor::new("qty", LogicalType::Integer),
    ])
}

/// Serves `data`, failing with a timeout once when the read position reaches `fail_at`.
struct Stalling {
    data: Cursor<Vec<u8>>,
    fail_at: Option<u64>,
}

impl Read for Stalling {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.data.position();
        match self.fail_at {
            Some(at) if at == pos => {
                self.fail_at = None;
                Err(io::Error::new(io::ErrorKind::TimedOut, "no data yet"))
            }
            Some(at) if at > pos => {
                let room = usize::try_from(at - pos).unwrap().min(buf.len());
                self.data.read(&mut buf[..room])
            }
            _ => self.data.read(buf),
        }
    }
}

fn stalling(data: Vec<u8>, fail_at: u64) -> BufReader<Stalling> {
    BufReader::with_capacity(
        1,
        Stalling {
            data: Cursor::new(data),
            fail_at: Some(fail_at),
        },
    )
}

#[test]
fn order_row_round_trips() {
    let row = vec![Some(Slot::from("AB-100")), Some(Slot::from(42i64))];
    let mut writer = RowWriter::try_new(Vec::new(), orders()).unwrap();
    writer.write_row(&row).unwrap();
    let buf = writer.finish().unwrap();

    let mut reader = RowReader::try_new(Cursor::new(buf)).unwrap();
    assert_eq!(reader.schema(), &orders());
    let back = reader.read_row().unwrap().unwrap();
    assert_eq!(back, row);
    let schema = reader.schema();
    assert_eq!(schema.get_text(&back, 0).unwrap().as_deref(), Some("AB-100"));
    assert_eq!(schema.get_integer_by_name(&back, "QTY").unwrap(), Some(42));
    assert_eq!(reader.read_row().unwrap(), None);
}

#[test]
fn zero_column_rows_are_not_end_of_stream() {
    let schema = RowSchema::new();
    let mut buf = Vec::new();
    encode_schema(&schema, &mut buf).unwrap();
    encode_row(&schema, &[], &mut buf).unwrap();
    encode_row(&schema, &[], &mut buf).unwrap();

    let rows: Vec<_> = RowReader::try_new(Cursor::new(buf))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows, vec![Vec::<Option<Slot>>::new(), Vec::new()]);
}

#[test]
fn deferred_price_reads_through_its_mask() {
    let price = ValueDescriptor::new("price", LogicalType::Float)
        .with_mask("#.00")
        .with_length(5)
        .with_output_padding(true)
        .with_trim(TrimPolicy::Both)
        .with_storage_mode(StorageMode::Deferred)
        .with_storage_descriptor(ValueDescriptor::new("price", LogicalType::Text));
    let schema = RowSchema::from_descriptors([price]);
    let row = vec![Some(Slot::deferred(&b"  3.140"[..]))];

    let mut buf = Vec::new();
    encode_row(&schema, &row, &mut buf).unwrap();
    let back = decode_row(&schema, &mut Cursor::new(buf)).unwrap().unwrap();
    assert_eq!(back, row);
    assert_eq!(schema.get_float(&back, 0).unwrap(), Some(3.14));
    let descriptor = schema.descriptor(0).unwrap();
    assert_eq!(descriptor.as_text(back[0].as_ref()).unwrap().as_deref(), Some(" 3.14"));
}

#[test]
fn dictionary_flag_matches_native_flag() {
    let indexed = ValueDescriptor::new("flag", LogicalType::Boolean)
        .with_dictionary([Value::Boolean(false), Value::Boolean(true)]);
    let native = ValueDescriptor::new("flag", LogicalType::Boolean);
    let left = RowSchema::from_descriptors([indexed]);
    let right = RowSchema::from_descriptors([native]);

    let a = vec![Some(Slot::Indexed(1))];
    let b = vec![Some(Slot::from(true))];
    assert_eq!(left.get_boolean(&a, 0).unwrap(), Some(true));
    assert_eq!(left.hash_row(&a, &[0]).unwrap(), right.hash_row(&b, &[0]).unwrap());

    // the indexed row travels as its value and reads back in the native schema
    let mut buf = Vec::new();
    encode_row(&left, &a, &mut buf).unwrap();
    assert_eq!(decode_row(&right, &mut Cursor::new(buf)).unwrap(), Some(b));
}

#[test]
fn timeout_before_a_row_can_be_retried() {
    let schema = orders();
    let row = vec![Some(Slot::from("AB-100")), None];
    let mut buf = Vec::new();
    encode_row(&schema, &row, &mut buf).unwrap();

    let mut source = stalling(buf, 0);
    let err = decode_row(&schema, &mut source).unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(decode_row(&schema, &mut source).unwrap(), Some(row));
    assert_eq!(decode_row(&schema, &mut source).unwrap(), None);
}

#[test]
fn timeout_inside_a_row_is_fatal() {
    let schema = orders();
    let mut buf = Vec::new();
    encode_row(&schema, &[Some(Slot::from("AB-100")), Some(Slot::from(1i64))], &mut buf).unwrap();

    let err = decode_row(&schema, &mut stalling(buf, 3)).unwrap_err();
    assert!(err.is_stream_format());
    assert!(!err.is_retryable());
}

#[test]
fn reader_retries_after_a_timeout() {
    let schema = orders();
    let mut buf = Vec::new();
    encode_schema(&schema, &mut buf).unwrap();
    let schema_len = buf.len() as u64;
    encode_row(&schema, &[Some(Slot::from("x")), Some(Slot::from(1i64))], &mut buf).unwrap();

    let mut reader = RowReader::try_new(stalling(buf, schema_len)).unwrap();
    assert!(reader.next().unwrap().unwrap_err().is_retryable());
    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().is_none());
}
