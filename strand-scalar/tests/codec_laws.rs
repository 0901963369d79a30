use std::cmp::Ordering;

use jiff::Timestamp;
use bigdecimal::BigDecimal;
use proptest::prelude::*;
use strand_dtype::{LogicalType, TrimPolicy};
use strand_scalar::{Slot, Value, ValueDescriptor};

fn deferred(native: &ValueDescriptor, value: Value) -> (ValueDescriptor, Slot) {
    let d = native.clone().with_deferred_storage();
    let slot = d.to_storage_slot(Some(value)).unwrap().unwrap();
    (d, slot)
}

fn interned(native: &ValueDescriptor, value: Value) -> (ValueDescriptor, Slot) {
    let d = native.clone().with_dictionary(Vec::new());
    let slot = d.to_storage_slot(Some(value)).unwrap().unwrap();
    assert!(matches!(slot, Slot::Indexed(_)));
    (d, slot)
}

fn assert_reads_match(stored: &ValueDescriptor, slot: &Slot, native: &ValueDescriptor, value: Value) {
    let native_slot = Slot::Native(value);
    let n = Some(&native_slot);
    let s = Some(slot);
    assert_eq!(stored.as_text(s).unwrap(), native.as_text(n).unwrap());
    assert_eq!(stored.as_native(s).unwrap(), native.as_native(n).unwrap());
    assert_eq!(stored.as_integer(s).ok(), native.as_integer(n).ok());
    assert_eq!(stored.as_float(s).ok(), native.as_float(n).ok());
    assert_eq!(stored.as_decimal(s).ok(), native.as_decimal(n).ok());
    assert_eq!(stored.as_boolean(s).ok(), native.as_boolean(n).ok());
    assert_eq!(stored.as_date(s).ok(), native.as_date(n).ok());
    assert_eq!(stored.as_bytes(s).unwrap(), native.as_bytes(n).unwrap());
    assert_eq!(stored.hash(s).unwrap(), native.hash(n).unwrap());
    assert_eq!(stored.compare_with(s, native, n).unwrap(), Ordering::Equal);
}

fn assert_same_reads(native: &ValueDescriptor, value: Value) {
    let (d, slot) = deferred(native, value.clone());
    assert_reads_match(&d, &slot, native, value.clone());
    let (d, slot) = interned(native, value.clone());
    assert_reads_match(&d, &slot, native, value);
}

fn cents(c: i64) -> Value {
    Value::Decimal(BigDecimal::new(c.into(), 2))
}

proptest! {
    #[test]
    fn deferred_reads_like_native_integers(i in any::<i64>()) {
        assert_same_reads(&ValueDescriptor::new("qty", LogicalType::Integer).with_mask("#,##0"), Value::Integer(i));
        assert_same_reads(&ValueDescriptor::new("qty", LogicalType::Integer), Value::Integer(i));
    }

    #[test]
    fn deferred_reads_like_native_dates(millis in 0i64..4_102_444_800_000i64) {
        let value = Value::Date(Timestamp::from_millisecond(millis).unwrap());
        assert_same_reads(&ValueDescriptor::new("at", LogicalType::Date), value);
    }

    #[test]
    fn deferred_reads_like_native_text(s in "[a-zA-Z0-9 ]{0,12}") {
        let d = ValueDescriptor::new("label", LogicalType::Text);
        assert_same_reads(&d, Value::from(s.as_str()));
    }

    #[test]
    fn deferred_reads_like_native_doubles(c in -1_000_000_000_000i64..1_000_000_000_000i64) {
        // two places survive the default rendering exactly
        let value = Value::Float(c as f64 / 100.0);
        assert_same_reads(&ValueDescriptor::new("ratio", LogicalType::Float), value.clone());
        assert_same_reads(&ValueDescriptor::new("ratio", LogicalType::Float).with_mask("#,##0.00"), value);
    }

    #[test]
    fn deferred_reads_like_native_decimals(c in any::<i64>()) {
        assert_same_reads(&ValueDescriptor::new("amount", LogicalType::Decimal), cents(c));
        assert_same_reads(
            &ValueDescriptor::new("amount", LogicalType::Decimal).with_mask("#,##0.00;(#,##0.00)"),
            cents(c),
        );
    }

    #[test]
    fn deferred_reads_like_native_booleans(b in any::<bool>(), long in any::<bool>()) {
        let d = ValueDescriptor::new("flag", LogicalType::Boolean);
        let d = if long { d.with_length(5) } else { d };
        assert_same_reads(&d, Value::Boolean(b));
    }

    #[test]
    fn identical_format_matches_slow_path(i in any::<i64>(), c in -1_000_000_000i64..1_000_000_000i64) {
        for (native, identical) in [
            (ValueDescriptor::new("qty", LogicalType::Integer).with_mask("#,##0"), true),
            (ValueDescriptor::new("qty", LogicalType::Integer).with_length(22).with_output_padding(true), true),
            (ValueDescriptor::new("qty", LogicalType::Integer).with_trim(TrimPolicy::Both), false),
            (ValueDescriptor::new("qty", LogicalType::Integer).with_trim(TrimPolicy::Left), false),
        ] {
            let d = native.clone().with_deferred_storage();
            prop_assert_eq!(d.is_identical_format(), identical);
            let raw = d.to_storage_slot(Some(Value::Integer(i))).unwrap().unwrap();
            let native_slot = Slot::from(i);
            prop_assert_eq!(d.as_text(Some(&raw)).unwrap(), native.as_text(Some(&native_slot)).unwrap());
        }

        for (amount, identical) in [
            (ValueDescriptor::new("amount", LogicalType::Decimal).with_mask("#,##0.00;(#,##0.00)"), true),
            (
                ValueDescriptor::new("amount", LogicalType::Decimal)
                    .with_mask("#,##0.00;(#,##0.00)")
                    .with_trim(TrimPolicy::Both),
                false,
            ),
        ] {
            let d = amount.clone().with_deferred_storage();
            prop_assert_eq!(d.is_identical_format(), identical);
            let raw = d.to_storage_slot(Some(cents(c))).unwrap().unwrap();
            let native_slot = Slot::Native(cents(c));
            prop_assert_eq!(d.as_text(Some(&raw)).unwrap(), amount.as_text(Some(&native_slot)).unwrap());
        }
    }

    #[test]
    fn compare_is_reflexive_and_antisymmetric(a in any::<i64>(), b in any::<i64>(), descending in any::<bool>()) {
        let d = ValueDescriptor::new("n", LogicalType::Integer).with_descending(descending);
        let (a, b) = (Slot::from(a), Slot::from(b));
        prop_assert_eq!(d.compare(Some(&a), Some(&a)).unwrap(), Ordering::Equal);
        prop_assert_eq!(d.compare(Some(&a), Some(&b)).unwrap(), d.compare(Some(&b), Some(&a)).unwrap().reverse());
        let asc = d.clone().with_descending(!descending);
        prop_assert_eq!(d.compare(Some(&a), Some(&b)).unwrap(), asc.compare(Some(&a), Some(&b)).unwrap().reverse());
        prop_assert_eq!(d.compare(None, Some(&b)).unwrap(), Ordering::Less);
    }

    #[test]
    fn text_reparses_to_the_same_value(i in any::<i64>(), f in 0.0f64..1.0e12f64) {
        let d = ValueDescriptor::new("qty", LogicalType::Integer).with_mask("#,##0");
        let slot = Slot::from(i);
        let text = d.as_text(Some(&slot)).unwrap().unwrap();
        prop_assert_eq!(d.parse_text(&text, LogicalType::Integer).unwrap(), Some(Value::Integer(i)));

        let d = ValueDescriptor::new("ratio", LogicalType::Float).with_mask("0.00");
        let slot = Slot::from(f);
        let text = d.as_text(Some(&slot)).unwrap().unwrap();
        let reparsed = d.parse_text(&text, LogicalType::Float).unwrap().map(Slot::Native);
        let again = d.as_text(reparsed.as_ref()).unwrap().unwrap();
        prop_assert_eq!(again, text);
    }
}

#[test]
fn dictionary_boolean_equals_native() {
    let dict = ValueDescriptor::new("flag", LogicalType::Boolean)
        .with_dictionary([Value::Boolean(false), Value::Boolean(true)]);
    let native = ValueDescriptor::new("flag", LogicalType::Boolean);
    let indexed = Slot::Indexed(1);
    assert_eq!(dict.as_boolean(Some(&indexed)).unwrap(), Some(true));
    assert_eq!(
        dict.compare_with(Some(&indexed), &native, Some(&Slot::from(true))).unwrap(),
        Ordering::Equal
    );
    assert_eq!(
        dict.hash(Some(&indexed)).unwrap(),
        native.hash(Some(&Slot::from(true))).unwrap()
    );
}
