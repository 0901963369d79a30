//! The XML schema and row format.
//!
//! A schema is a `<row-meta>` element holding one `<value-meta>` per column, each attribute of
//! the descriptor a child element of its own. Attributes left at their default are omitted. A row
//! is a `<row>` element holding one `<value>` per column with the canonical text of the slot; a
//! null slot is `<value null="Y"/>`, which keeps it apart from an empty TEXT value.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use strand_dtype::{Locale, LogicalType, StorageMode, TextEncoding, TrimPolicy};
use strand_error::{ContextExt, StrandResult, strand_bail, strand_err};
use strand_scalar::text::{
    slot_from_canonical_text, slot_to_canonical_text, value_from_canonical_text,
    value_to_canonical_text,
};
use strand_scalar::{Dictionary, Slot, ValueDescriptor};

use crate::{Row, RowSchema};

pub(crate) const SCHEMA_TAG: &str = "row-meta";
pub(crate) const ROW_TAG: &str = "row";
const COLUMN_TAG: &str = "value-meta";
const VALUE_TAG: &str = "value";
const STORAGE_TAG: &str = "storage-meta";
const CONVERSION_TAG: &str = "conversion-meta";
const DICTIONARY_TAG: &str = "dictionary";
const NULL_ATTR: &str = "null";

/// A parsed element. Text is only meaningful for elements without children.
#[derive(Debug, Default)]
pub(crate) struct Element {
    pub(crate) name: String,
    pub(crate) null: bool,
    pub(crate) text: String,
    pub(crate) children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> StrandResult<Self> {
        let mut element = Element {
            name: std::str::from_utf8(start.name().as_ref())?.to_string(),
            ..Default::default()
        };
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if attr.key.as_ref() == NULL_ATTR.as_bytes() {
                element.null = parse_flag(&attr.unescape_value()?)?;
            }
        }
        Ok(element)
    }

    pub(crate) fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub(crate) fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    pub(crate) fn expect_name(&self, name: &str) -> StrandResult<()> {
        if self.name != name {
            strand_bail!(StreamFormat: "expected <{}>, found <{}>", name, self.name);
        }
        Ok(())
    }
}

/// Parse `xml` into its root element.
pub(crate) fn parse_document(xml: &str) -> StrandResult<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    loop {
        let closed = match reader.read_event()? {
            Event::Start(start) => {
                stack.push(Element::open(&start)?);
                None
            }
            Event::Empty(start) => Some(Element::open(&start)?),
            Event::End(_) => stack.pop(),
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape()?);
                }
                None
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(std::str::from_utf8(&data)?);
                }
                None
            }
            Event::Eof => strand_bail!(StreamFormat: "XML document ended before its root element"),
            _ => None,
        };
        if let Some(element) = closed {
            match stack.last_mut() {
                Some(parent) => parent.children.push(element),
                None => return Ok(element),
            }
        }
    }
}

fn parse_flag(text: &str) -> StrandResult<bool> {
    match text.trim() {
        "Y" | "y" | "true" => Ok(true),
        "N" | "n" | "false" => Ok(false),
        other => strand_bail!(StreamFormat: "expected Y or N, found {:?}", other),
    }
}

fn flag(value: bool) -> &'static str {
    if value { "Y" } else { "N" }
}

fn leaf<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> StrandResult<()> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn opt_leaf<W: Write>(writer: &mut Writer<W>, name: &str, text: Option<&str>) -> StrandResult<()> {
    match text {
        Some(text) => leaf(writer, name, text),
        None => Ok(()),
    }
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> StrandResult<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> StrandResult<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_descriptor<W: Write>(writer: &mut Writer<W>, descriptor: &ValueDescriptor) -> StrandResult<()> {
    start(writer, COLUMN_TAG)?;
    leaf(writer, "name", descriptor.name())?;
    leaf(writer, "type", descriptor.logical_type().name())?;
    leaf(writer, "storage", descriptor.storage_mode().name())?;
    opt_leaf(writer, "length", descriptor.length().map(|l| l.to_string()).as_deref())?;
    opt_leaf(writer, "precision", descriptor.precision().map(|p| p.to_string()).as_deref())?;
    opt_leaf(writer, "mask", descriptor.mask())?;
    opt_leaf(
        writer,
        "decimal",
        descriptor.explicit_decimal_symbol().map(String::from).as_deref(),
    )?;
    opt_leaf(
        writer,
        "grouping",
        descriptor.explicit_grouping_symbol().map(String::from).as_deref(),
    )?;
    opt_leaf(writer, "currency", descriptor.explicit_currency_symbol())?;
    if descriptor.locale() != &Locale::default() {
        leaf(writer, "locale", descriptor.locale().tag())?;
    }
    opt_leaf(writer, "time_zone", descriptor.time_zone())?;
    if descriptor.encoding() != TextEncoding::default() {
        leaf(writer, "encoding", descriptor.encoding().name())?;
    }
    if descriptor.trim() != TrimPolicy::default() {
        leaf(writer, "trim", descriptor.trim().name())?;
    }
    leaf(writer, "case_insensitive", flag(descriptor.is_case_insensitive()))?;
    leaf(writer, "descending", flag(descriptor.is_descending()))?;
    leaf(writer, "output_padding", flag(descriptor.is_output_padding()))?;
    leaf(writer, "lenient_dates", flag(descriptor.is_lenient_dates()))?;
    opt_leaf(writer, "origin", descriptor.origin())?;
    opt_leaf(writer, "comments", descriptor.comments())?;

    for (tag, nested) in [
        (STORAGE_TAG, descriptor.storage_descriptor()),
        (CONVERSION_TAG, descriptor.conversion_descriptor()),
    ] {
        if let Some(nested) = nested {
            start(writer, tag)?;
            write_descriptor(writer, nested)?;
            end(writer, tag)?;
        }
    }

    let values = descriptor.dictionary().values();
    if !values.is_empty() {
        start(writer, DICTIONARY_TAG)?;
        for value in &values {
            leaf(writer, VALUE_TAG, &value_to_canonical_text(value))?;
        }
        end(writer, DICTIONARY_TAG)?;
    }
    end(writer, COLUMN_TAG)
}

fn parse_attr<T: std::str::FromStr>(element: &Element, name: &str) -> StrandResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    element
        .child_text(name)
        .map(|text| {
            text.trim()
                .parse::<T>()
                .map_err(|e| strand_err!(StreamFormat: "<{}>{}</{}>: {}", name, text, name, e))
        })
        .transpose()
}

fn parse_symbol(element: &Element, name: &str) -> StrandResult<Option<char>> {
    let Some(text) = element.child_text(name) else {
        return Ok(None);
    };
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Some(c)),
        _ => strand_bail!(StreamFormat: "<{}> must hold a single symbol, found {:?}", name, text),
    }
}

fn read_descriptor(element: &Element, nested: bool) -> StrandResult<ValueDescriptor> {
    element.expect_name(COLUMN_TAG)?;
    let name = element
        .child_text("name")
        .ok_or_else(|| strand_err!(StreamFormat: "<{}> without a <name>", COLUMN_TAG))?;
    let logical_type: LogicalType = parse_attr(element, "type")?
        .ok_or_else(|| strand_err!(StreamFormat: "column {} has no <type>", name))?;
    let storage_mode: StorageMode = parse_attr(element, "storage")?.unwrap_or_default();

    let mut descriptor = ValueDescriptor::new(name, logical_type);
    descriptor.set_length(parse_attr(element, "length")?);
    descriptor.set_precision(parse_attr(element, "precision")?);
    descriptor.set_mask(element.child_text("mask").map(String::from));
    descriptor.set_decimal_symbol(parse_symbol(element, "decimal")?);
    descriptor.set_grouping_symbol(parse_symbol(element, "grouping")?);
    descriptor.set_currency_symbol(element.child_text("currency").map(String::from));
    if let Some(tag) = element.child_text("locale") {
        descriptor.set_locale(Locale::new(tag.trim()));
    }
    descriptor.set_time_zone(element.child_text("time_zone").map(String::from));
    descriptor.set_encoding(parse_attr(element, "encoding")?.unwrap_or_default());
    descriptor.set_trim(parse_attr(element, "trim")?.unwrap_or_default());
    for (tag, set) in [
        ("case_insensitive", ValueDescriptor::set_case_insensitive as fn(&mut ValueDescriptor, bool)),
        ("descending", ValueDescriptor::set_descending),
        ("output_padding", ValueDescriptor::set_output_padding),
        ("lenient_dates", ValueDescriptor::set_lenient_dates),
    ] {
        if let Some(text) = element.child_text(tag) {
            set(&mut descriptor, parse_flag(text)?);
        }
    }
    descriptor.set_origin(element.child_text("origin").map(String::from));
    descriptor.set_comments(element.child_text("comments").map(String::from));

    let mut nested_descriptors = [None, None];
    for (tag, out) in [STORAGE_TAG, CONVERSION_TAG].into_iter().zip(&mut nested_descriptors) {
        let Some(wrapper) = element.child(tag) else {
            continue;
        };
        if nested {
            strand_bail!(StreamFormat: "column {} nests descriptors more than one level deep", name);
        }
        let inner = wrapper
            .child(COLUMN_TAG)
            .ok_or_else(|| strand_err!(StreamFormat: "<{}> of column {} is empty", tag, name))?;
        *out = Some(read_descriptor(inner, true)?);
    }
    let [storage, conversion] = nested_descriptors;
    descriptor.set_storage_descriptor(storage);
    descriptor.set_conversion_descriptor(conversion);

    if let Some(dictionary) = element.child(DICTIONARY_TAG) {
        let values = dictionary
            .children_named(VALUE_TAG)
            .map(|v| value_from_canonical_text(logical_type, &v.text))
            .collect::<StrandResult<Vec<_>>>()?;
        descriptor.set_dictionary(Dictionary::from_values(values));
    }
    descriptor.set_storage_mode(storage_mode);
    Ok(descriptor)
}

/// Write `schema` as a `<row-meta>` element.
pub(crate) fn write_schema<W: Write>(writer: &mut Writer<W>, schema: &RowSchema) -> StrandResult<()> {
    start(writer, SCHEMA_TAG)?;
    for descriptor in schema {
        write_descriptor(writer, descriptor)?;
    }
    end(writer, SCHEMA_TAG)
}

/// Read a schema from a `<row-meta>` element.
pub(crate) fn read_schema(element: &Element) -> StrandResult<RowSchema> {
    element.expect_name(SCHEMA_TAG)?;
    let mut schema = RowSchema::new();
    for child in element.children_named(COLUMN_TAG) {
        let descriptor = read_descriptor(child, false)?;
        if schema.exists(descriptor.name()) {
            strand_bail!(StreamFormat: "duplicate column {} in XML schema", descriptor.name());
        }
        schema.append(descriptor);
    }
    Ok(schema)
}

/// Write `row` as a `<row>` element.
pub(crate) fn write_row<W: Write>(
    writer: &mut Writer<W>,
    schema: &RowSchema,
    row: &[Option<Slot>],
) -> StrandResult<()> {
    if row.len() < schema.len() {
        strand_bail!(
            InvalidArgument: "row has {} slots but the schema has {} columns",
            row.len(),
            schema.len()
        );
    }
    start(writer, ROW_TAG)?;
    for (descriptor, slot) in schema.iter().zip(row) {
        match slot_to_canonical_text(descriptor, slot.as_ref())
            .with_context(|| format!("writing column {}", descriptor.name()))?
        {
            Some(text) => leaf(writer, VALUE_TAG, &text)?,
            None => {
                writer
                    .create_element(VALUE_TAG)
                    .with_attribute((NULL_ATTR, "Y"))
                    .write_empty()?;
            }
        }
    }
    end(writer, ROW_TAG)
}

/// Read a row of `schema` from a `<row>` element.
pub(crate) fn read_row(schema: &RowSchema, element: &Element) -> StrandResult<Row> {
    element.expect_name(ROW_TAG)?;
    let values: Vec<&Element> = element.children_named(VALUE_TAG).collect();
    if values.len() != schema.len() {
        strand_bail!(
            StreamFormat: "row has {} values but the schema has {} columns",
            values.len(),
            schema.len()
        );
    }
    schema
        .iter()
        .zip(values)
        .map(|(descriptor, value)| {
            let text = (!value.null).then_some(value.text.as_str());
            slot_from_canonical_text(descriptor, text)
                .with_context(|| format!("reading column {}", descriptor.name()))
        })
        .collect()
}

pub(crate) fn finish(writer: Writer<Vec<u8>>) -> StrandResult<String> {
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Render `schema` as XML.
pub fn schema_to_xml(schema: &RowSchema) -> StrandResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_schema(&mut writer, schema)?;
    finish(writer)
}

/// Parse a schema rendered by [`schema_to_xml`].
pub fn schema_from_xml(xml: &str) -> StrandResult<RowSchema> {
    read_schema(&parse_document(xml)?)
}

/// Render `row` as XML, each value in its canonical text.
pub fn row_to_xml(schema: &RowSchema, row: &[Option<Slot>]) -> StrandResult<String> {
    let mut writer = Writer::new(Vec::new());
    write_row(&mut writer, schema, row)?;
    finish(writer)
}

/// Parse a row of `schema` rendered by [`row_to_xml`].
pub fn row_from_xml(schema: &RowSchema, xml: &str) -> StrandResult<Row> {
    read_row(schema, &parse_document(xml)?)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use strand_scalar::Value;

    use super::*;

    fn schema() -> RowSchema {
        RowSchema::from_descriptors([
            ValueDescriptor::new("code", LogicalType::Text).with_length(10),
            ValueDescriptor::new("price", LogicalType::Decimal)
                .with_mask("#,##0.00;(#,##0.00)")
                .with_locale("de_DE")
                .with_grouping_symbol('\'')
                .with_comments("a < b & c"),
            ValueDescriptor::new("raw", LogicalType::Integer)
                .with_trim(TrimPolicy::Both)
                .with_deferred_storage(),
            ValueDescriptor::new("flag", LogicalType::Boolean)
                .with_dictionary([Value::Boolean(true)]),
            ValueDescriptor::new("blob", LogicalType::Bytes),
        ])
    }

    #[test]
    fn schema_round_trips() {
        let schema = schema();
        let xml = schema_to_xml(&schema).unwrap();
        assert!(xml.starts_with("<row-meta>"));
        assert!(xml.contains("a &lt; b &amp; c"));
        assert_eq!(schema_from_xml(&xml).unwrap(), schema);
    }

    #[test]
    fn null_is_not_empty_text() {
        let schema = schema();
        let row: Row = vec![
            Some(Slot::from("")),
            None,
            Some(Slot::deferred(&b" 12 "[..])),
            Some(Slot::Indexed(0)),
            Some(Slot::Native(Value::Bytes(Bytes::from_static(b"\x00\x01")))),
        ];
        let xml = row_to_xml(&schema, &row).unwrap();
        assert!(xml.starts_with("<row><value></value><value null=\"Y\"/>"));
        assert_eq!(row_from_xml(&schema, &xml).unwrap(), row);
    }

    #[test]
    fn whitespace_inside_values_is_kept() {
        let schema = RowSchema::from_descriptors([ValueDescriptor::new("code", LogicalType::Text)]);
        let xml = "<row>\n  <value>  AB </value>\n</row>";
        assert_eq!(row_from_xml(&schema, xml).unwrap(), vec![Some(Slot::from("  AB "))]);
    }

    #[test]
    fn defaults_fill_missing_attributes() {
        let xml = "<row-meta><value-meta><name>qty</name><type>integer</type></value-meta></row-meta>";
        let schema = schema_from_xml(xml).unwrap();
        assert_eq!(
            schema,
            RowSchema::from_descriptors([ValueDescriptor::new("qty", LogicalType::Integer)])
        );
    }

    #[rstest::rstest]
    #[case("<row><value>1</value>")]
    #[case("<row><value>1</value><value>2</value></row>")]
    #[case("<row><value>x</value></row>")]
    #[case("<rows><value>1</value></rows>")]
    #[case("<row><value null=\"maybe\"/></row>")]
    fn malformed_rows(#[case] xml: &str) {
        let schema = RowSchema::from_descriptors([ValueDescriptor::new("qty", LogicalType::Integer)]);
        assert!(row_from_xml(&schema, xml).unwrap_err().is_stream_format());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let xml = "<row-meta><value-meta><name>q</name><type>widget</type></value-meta></row-meta>";
        assert!(schema_from_xml(xml).unwrap_err().is_stream_format());
    }
}
