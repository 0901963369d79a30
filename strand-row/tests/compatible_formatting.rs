use strand_dtype::LogicalType;
use strand_row::RowSchema;
use strand_scalar::{EngineConfig, Slot, ValueDescriptor};

fn install() {
    let _ = EngineConfig {
        empty_text_is_null: false,
        compatible_formatting: true,
    }
    .install();
    assert!(EngineConfig::global().compatible_formatting);
}

#[test]
fn numbers_render_plain() {
    install();
    let schema = RowSchema::from_descriptors([
        ValueDescriptor::new("qty", LogicalType::Integer).with_length(6),
        ValueDescriptor::new("ratio", LogicalType::Float),
    ]);
    let row = vec![Some(Slot::from(7i64)), Some(Slot::from(3.25))];
    assert_eq!(schema.get_text(&row, 0).unwrap().as_deref(), Some("7"));
    assert_eq!(schema.get_text(&row, 1).unwrap().as_deref(), Some("3.25"));
    assert_eq!(schema.row_to_display(&row).unwrap(), "[qty=7, ratio=3.25]");
}

#[test]
fn masks_are_unaffected() {
    install();
    let d = ValueDescriptor::new("qty", LogicalType::Integer).with_mask("000");
    assert_eq!(d.as_text(Some(&Slot::from(7i64))).unwrap().as_deref(), Some("007"));
}

#[test]
fn empty_text_is_a_value() {
    install();
    let d = ValueDescriptor::new("code", LogicalType::Text);
    assert!(!d.is_null(Some(&Slot::from(""))));
}
