use std::cmp::Ordering;

use strand_dtype::LogicalType;
use strand_row::{RowSchema, row_from_xml, row_to_xml};
use strand_scalar::{EngineConfig, Slot, ValueDescriptor};

fn install() {
    // every test in this binary runs with the same configuration, whichever installs it first
    let _ = EngineConfig {
        empty_text_is_null: true,
        compatible_formatting: false,
    }
    .install();
    assert!(EngineConfig::global().empty_text_is_null);
}

#[test]
fn empty_text_behaves_like_null() {
    install();
    let d = ValueDescriptor::new("code", LogicalType::Text);
    let empty = Slot::from("");
    assert!(d.is_null(Some(&empty)));
    assert_eq!(d.compare(Some(&empty), None).unwrap(), Ordering::Equal);
    assert_eq!(d.hash(Some(&empty)).unwrap(), d.hash(None).unwrap());
    assert_eq!(d.as_text(Some(&empty)).unwrap(), None);
}

#[test]
fn blank_raw_text_is_null() {
    install();
    let d = ValueDescriptor::new("code", LogicalType::Text).with_deferred_storage();
    assert!(d.is_null(Some(&Slot::deferred(&b""[..]))));
    assert!(!d.is_null(Some(&Slot::deferred(&b"x"[..]))));
}

#[test]
fn rows_still_carry_the_empty_value() {
    install();
    let schema = RowSchema::from_descriptors([ValueDescriptor::new("code", LogicalType::Text)]);
    let row = vec![Some(Slot::from(""))];
    let back = row_from_xml(&schema, &row_to_xml(&schema, &row).unwrap()).unwrap();
    assert_eq!(back, row);
    assert_eq!(schema.row_to_display(&back).unwrap(), "[code=<null>]");
}
