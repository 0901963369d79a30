use std::cmp::Ordering;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use strand_error::{StrandError, StrandResult, strand_bail};

use crate::xml::{ROW_TAG, SCHEMA_TAG, finish, parse_document, read_row, read_schema, write_row, write_schema};
use crate::{Row, RowSchema};

const BUFFER_TAG: &str = "row-buffer";

/// An in-memory set of rows sharing one schema.
#[derive(Debug, Clone, Default)]
pub struct RowBuffer {
    schema: RowSchema,
    rows: Vec<Row>,
}

impl RowBuffer {
    /// An empty buffer for rows of `schema`.
    pub fn new(schema: RowSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// A buffer over existing rows. Every row must cover every column of `schema`.
    pub fn with_rows(schema: RowSchema, rows: Vec<Row>) -> StrandResult<Self> {
        let mut buffer = Self::new(schema);
        buffer.rows.reserve(rows.len());
        for row in rows {
            buffer.push(row)?;
        }
        Ok(buffer)
    }

    /// Append a row.
    pub fn push(&mut self, row: Row) -> StrandResult<()> {
        if row.len() < self.schema.len() {
            strand_bail!(
                InvalidArgument: "row has {} slots but the schema has {} columns",
                row.len(),
                self.schema.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the buffer holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows, in order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The schema of every row.
    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.iter()
    }

    /// The schema and the rows.
    pub fn into_parts(self) -> (RowSchema, Vec<Row>) {
        (self.schema, self.rows)
    }

    /// Stable sort on the columns at `keys`, each in its descriptor's direction.
    ///
    /// On error the rows are left in an unspecified order.
    pub fn sort_by(&mut self, keys: &[usize]) -> StrandResult<()> {
        for &key in keys {
            self.schema.descriptor(key)?;
        }
        let schema = &self.schema;
        let mut failure: Option<StrandError> = None;
        self.rows.sort_by(|a, b| {
            if failure.is_some() {
                return Ordering::Equal;
            }
            schema.compare_rows(a, b, keys).unwrap_or_else(|e| {
                failure = Some(e);
                Ordering::Equal
            })
        });
        failure.map_or(Ok(()), Err)
    }

    /// Render the schema and every row as one XML document.
    pub fn to_xml(&self) -> StrandResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Start(BytesStart::new(BUFFER_TAG)))?;
        write_schema(&mut writer, &self.schema)?;
        for row in &self.rows {
            write_row(&mut writer, &self.schema, row)?;
        }
        writer.write_event(Event::End(BytesEnd::new(BUFFER_TAG)))?;
        finish(writer)
    }

    /// Parse a document rendered by [`RowBuffer::to_xml`].
    pub fn from_xml(xml: &str) -> StrandResult<Self> {
        let root = parse_document(xml)?;
        root.expect_name(BUFFER_TAG)?;
        let Some(schema) = root.child(SCHEMA_TAG) else {
            strand_bail!(StreamFormat: "<{}> without a <{}>", BUFFER_TAG, SCHEMA_TAG);
        };
        let mut buffer = Self::new(read_schema(schema)?);
        for row in root.children_named(ROW_TAG) {
            let row = read_row(&buffer.schema, row)?;
            buffer.rows.push(row);
        }
        Ok(buffer)
    }
}

impl<'a> IntoIterator for &'a RowBuffer {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use strand_dtype::LogicalType;
    use strand_scalar::{Slot, ValueDescriptor};

    use super::*;

    fn buffer() -> RowBuffer {
        let schema = RowSchema::from_descriptors([
            ValueDescriptor::new("region", LogicalType::Text).with_case_insensitive(true),
            ValueDescriptor::new("qty", LogicalType::Integer).with_descending(true),
        ]);
        let rows = [("north", 3i64), ("South", 1), ("NORTH", 7), ("south", 5)]
            .into_iter()
            .map(|(r, q)| vec![Some(Slot::from(r)), Some(Slot::from(q))])
            .chain([vec![Some(Slot::from("east")), None]])
            .collect();
        RowBuffer::with_rows(schema, rows).unwrap()
    }

    fn column(buffer: &RowBuffer, index: usize) -> Vec<String> {
        buffer
            .iter()
            .map(|row| {
                buffer
                    .schema()
                    .descriptor(index)
                    .unwrap()
                    .as_text(row[index].as_ref())
                    .unwrap()
                    .map_or_else(|| "-".to_string(), |t| t.trim().to_string())
            })
            .collect()
    }

    #[test]
    fn sorts_on_several_keys() {
        let mut buffer = buffer();
        buffer.sort_by(&[0, 1]).unwrap();
        assert_eq!(column(&buffer, 0), ["east", "NORTH", "north", "south", "South"]);
        assert_eq!(column(&buffer, 1), ["-", "7", "3", "5", "1"]);
    }

    #[test]
    fn bad_sort_key() {
        assert!(buffer().sort_by(&[2]).is_err());
    }

    #[test]
    fn short_rows_are_rejected() {
        let mut buffer = buffer();
        assert!(buffer.push(vec![None]).is_err());
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn xml_round_trip() {
        let buffer = buffer();
        let xml = buffer.to_xml().unwrap();
        let back = RowBuffer::from_xml(&xml).unwrap();
        assert_eq!(back.schema(), buffer.schema());
        assert_eq!(back.rows(), buffer.rows());
        assert!(RowBuffer::from_xml("<row-buffer/>").unwrap_err().is_stream_format());
    }
}
