use std::io::Cursor;

use rstest::rstest;
use strand::dtype::{LogicalType, TrimPolicy};
use strand::{RowBuffer, RowReader, RowSchema, RowWriter, Slot, Value, ValueDescriptor};

fn incoming() -> RowSchema {
    RowSchema::from_descriptors([
        ValueDescriptor::new("id", LogicalType::Integer)
            .with_trim(TrimPolicy::Both)
            .with_deferred_storage(),
        ValueDescriptor::new("amount", LogicalType::Decimal)
            .with_mask("#,##0.00")
            .with_deferred_storage(),
        ValueDescriptor::new("status", LogicalType::Text)
            .with_dictionary([Value::from("open"), Value::from("closed")]),
    ])
}

#[rstest]
#[case(b" 12 ", b"1,234.50", 0, 12, "1234.5")]
#[case(b"3", b"0.10", 1, 3, "0.1")]
fn rows_survive_a_stage_boundary(
    #[case] id: &'static [u8],
    #[case] amount: &'static [u8],
    #[case] status: u32,
    #[case] expected_id: i64,
    #[case] expected_amount: &str,
) {
    let row = vec![
        Some(Slot::deferred(id)),
        Some(Slot::deferred(amount)),
        Some(Slot::Indexed(status)),
    ];
    let mut writer = RowWriter::try_new(Vec::new(), incoming()).unwrap();
    writer.write_row(&row).unwrap();
    let buf = writer.finish().unwrap();

    // the next stage only sees the stream
    let mut reader = RowReader::try_new(Cursor::new(buf)).unwrap();
    let back = reader.read_row().unwrap().unwrap();
    let schema = reader.schema();
    assert_eq!(schema.get_integer(&back, 0).unwrap(), Some(expected_id));
    assert_eq!(
        schema.get_decimal_by_name(&back, "AMOUNT").unwrap().map(|d| d.normalized().to_string()),
        Some(expected_amount.to_string())
    );
    assert_eq!(
        schema.get_text(&back, 2).unwrap(),
        schema.get_text(&row, 2).unwrap()
    );
}

#[test]
fn buffered_rows_sort_and_persist() {
    let mut schema = incoming();
    schema.remove_by_name("status").unwrap();
    let mut buffer = RowBuffer::new(schema);
    for (id, amount) in [
        (&b"9"[..], &b"1.00"[..]),
        (&b"2"[..], &b"5.00"[..]),
        (&b"5"[..], &b"3.00"[..]),
    ] {
        buffer
            .push(vec![Some(Slot::deferred(id)), Some(Slot::deferred(amount))])
            .unwrap();
    }
    buffer.sort_by(&[1]).unwrap();
    let ids: Vec<_> = buffer
        .iter()
        .map(|row| buffer.schema().get_integer(row, 0).unwrap())
        .collect();
    assert_eq!(ids, [Some(9), Some(5), Some(2)]);

    let restored = RowBuffer::from_xml(&buffer.to_xml().unwrap()).unwrap();
    assert_eq!(restored.rows(), buffer.rows());
}
