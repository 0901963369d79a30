//! The binary row format.
//!
//! A stream carries one schema followed by any number of rows. The schema is a `u32` column count
//! and then every descriptor with its full attribute set; a row is each slot in column order.
//! There is no row delimiter, so a reader must know the schema to find the next row.

use std::io::{self, BufRead, Write};

use strand_dtype::{Locale, LogicalType, StorageMode, TextEncoding, TrimPolicy};
use strand_error::{StrandResult, strand_bail, strand_err};
use strand_scalar::wire::{
    read_opt_string, read_presence, read_string, read_u8, read_u32, read_value, read_slot,
    write_len_prefixed, write_opt_string, write_slot, write_value,
};
use strand_scalar::{Dictionary, Slot, Value, ValueDescriptor};

use crate::buffer::OVER_ALLOCATE;
use crate::schema::describe;
use crate::{Row, RowSchema};

const CASE_INSENSITIVE: u8 = 1;
const DESCENDING: u8 = 1 << 1;
const OUTPUT_PADDING: u8 = 1 << 2;
const LENIENT_DATES: u8 = 1 << 3;

fn write_u32(sink: &mut impl Write, value: u32) -> StrandResult<()> {
    Ok(sink.write_all(&value.to_be_bytes())?)
}

fn write_opt_u32(sink: &mut impl Write, value: Option<u32>) -> StrandResult<()> {
    match value {
        None => write_value(sink, None),
        Some(v) => {
            sink.write_all(&[1])?;
            write_u32(sink, v)
        }
    }
}

fn read_opt_u32(source: &mut impl BufRead) -> StrandResult<Option<u32>> {
    if read_presence(source)? {
        read_u32(source).map(Some)
    } else {
        Ok(None)
    }
}

fn write_opt_char(sink: &mut impl Write, symbol: Option<char>) -> StrandResult<()> {
    let mut buf = [0u8; 4];
    match symbol {
        None => write_opt_string(sink, None),
        Some(c) => write_opt_string(sink, Some(&*c.encode_utf8(&mut buf))),
    }
}

fn read_opt_char(source: &mut impl BufRead) -> StrandResult<Option<char>> {
    let Some(text) = read_opt_string(source)? else {
        return Ok(None);
    };
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Some(c)),
        _ => strand_bail!(StreamFormat: "expected a single symbol, found {:?}", text),
    }
}

fn write_descriptor(descriptor: &ValueDescriptor, sink: &mut impl Write) -> StrandResult<()> {
    write_len_prefixed(sink, descriptor.name().as_bytes())?;
    sink.write_all(&[
        descriptor.logical_type().code(),
        descriptor.storage_mode().code(),
    ])?;
    write_opt_u32(sink, descriptor.length())?;
    write_opt_u32(sink, descriptor.precision())?;
    write_opt_string(sink, descriptor.mask())?;
    write_opt_char(sink, descriptor.explicit_decimal_symbol())?;
    write_opt_char(sink, descriptor.explicit_grouping_symbol())?;
    write_opt_string(sink, descriptor.explicit_currency_symbol())?;
    write_len_prefixed(sink, descriptor.locale().tag().as_bytes())?;
    write_opt_string(sink, descriptor.time_zone())?;

    let mut flags = 0u8;
    for (set, bit) in [
        (descriptor.is_case_insensitive(), CASE_INSENSITIVE),
        (descriptor.is_descending(), DESCENDING),
        (descriptor.is_output_padding(), OUTPUT_PADDING),
        (descriptor.is_lenient_dates(), LENIENT_DATES),
    ] {
        if set {
            flags |= bit;
        }
    }
    sink.write_all(&[descriptor.encoding().code(), descriptor.trim().code(), flags])?;
    write_opt_string(sink, descriptor.origin())?;
    write_opt_string(sink, descriptor.comments())?;

    for nested in [
        descriptor.storage_descriptor(),
        descriptor.conversion_descriptor(),
    ] {
        match nested {
            None => sink.write_all(&[0])?,
            Some(nested) => {
                sink.write_all(&[1])?;
                write_descriptor(nested, sink)?;
            }
        }
    }

    let values = descriptor.dictionary().values();
    let count = u32::try_from(values.len())
        .map_err(|_| strand_err!(InvalidArgument: "dictionary of {} values is too large", values.len()))?;
    write_u32(sink, count)?;
    for value in &values {
        write_value(sink, Some(value))?;
    }
    Ok(())
}

fn read_descriptor(source: &mut impl BufRead, depth: usize) -> StrandResult<ValueDescriptor> {
    let name = read_string(source)?;
    let bad_code = |e: strand_error::StrandError| strand_err!(StreamFormat: "column {}: {}", name, e);
    let logical_type = LogicalType::from_code(read_u8(source)?).map_err(bad_code)?;
    let storage_mode = StorageMode::from_code(read_u8(source)?).map_err(bad_code)?;

    let mut descriptor = ValueDescriptor::new(name.as_str(), logical_type);
    descriptor.set_length(read_opt_u32(source)?);
    descriptor.set_precision(read_opt_u32(source)?);
    descriptor.set_mask(read_opt_string(source)?);
    descriptor.set_decimal_symbol(read_opt_char(source)?);
    descriptor.set_grouping_symbol(read_opt_char(source)?);
    descriptor.set_currency_symbol(read_opt_string(source)?);
    descriptor.set_locale(Locale::new(read_string(source)?));
    descriptor.set_time_zone(read_opt_string(source)?);
    descriptor.set_encoding(TextEncoding::from_code(read_u8(source)?).map_err(bad_code)?);
    descriptor.set_trim(TrimPolicy::from_code(read_u8(source)?).map_err(bad_code)?);
    let flags = read_u8(source)?;
    descriptor.set_case_insensitive(flags & CASE_INSENSITIVE != 0);
    descriptor.set_descending(flags & DESCENDING != 0);
    descriptor.set_output_padding(flags & OUTPUT_PADDING != 0);
    descriptor.set_lenient_dates(flags & LENIENT_DATES != 0);
    descriptor.set_origin(read_opt_string(source)?);
    descriptor.set_comments(read_opt_string(source)?);

    let mut nested = [None, None];
    for slot in &mut nested {
        if read_presence(source)? {
            if depth > 0 {
                strand_bail!(
                    StreamFormat: "column {} nests descriptors more than one level deep",
                    descriptor.name()
                );
            }
            *slot = Some(read_descriptor(source, depth + 1)?);
        }
    }
    let [storage, conversion] = nested;
    descriptor.set_storage_descriptor(storage);
    descriptor.set_conversion_descriptor(conversion);

    let count = read_u32(source)?;
    let mut values = Vec::with_capacity(count.min(1024) as usize);
    for _ in 0..count {
        match read_value(source, logical_type)? {
            Some(value) => values.push(value),
            None => strand_bail!(StreamFormat: "column {} has a null dictionary entry", descriptor.name()),
        }
    }
    descriptor.set_dictionary(Dictionary::from_values(values));
    descriptor.set_storage_mode(storage_mode);
    Ok(descriptor)
}

/// Write `schema` to `sink`.
pub fn encode_schema(schema: &RowSchema, sink: &mut impl Write) -> StrandResult<()> {
    let count = u32::try_from(schema.len())
        .map_err(|_| strand_err!(InvalidArgument: "schema of {} columns is too wide", schema.len()))?;
    write_u32(sink, count)?;
    for descriptor in schema {
        write_descriptor(descriptor, sink)?;
    }
    Ok(())
}

/// Read a schema written by [`encode_schema`].
pub fn decode_schema(source: &mut impl BufRead) -> StrandResult<RowSchema> {
    let count = read_u32(source)?;
    let mut schema = RowSchema::new();
    for _ in 0..count {
        let descriptor = read_descriptor(source, 0)?;
        if schema.exists(descriptor.name()) {
            strand_bail!(StreamFormat: "duplicate column {} in stream", descriptor.name());
        }
        schema.append(descriptor);
    }
    log::debug!("decoded schema [{}]", describe(&schema));
    Ok(schema)
}

/// Write `row` to `sink`, each slot through the descriptor of its column.
///
/// A zero-column row is written as a single marker so a reader can tell it apart from the end of
/// the stream.
pub fn encode_row(schema: &RowSchema, row: &[Option<Slot>], sink: &mut impl Write) -> StrandResult<()> {
    if schema.is_empty() {
        return write_value(sink, Some(&Value::Boolean(true)));
    }
    if row.len() < schema.len() {
        strand_bail!(
            InvalidArgument: "row has {} slots but the schema has {} columns",
            row.len(),
            schema.len()
        );
    }
    for (descriptor, slot) in schema.iter().zip(row) {
        write_slot(descriptor, slot.as_ref(), sink)
            .map_err(|e| e.with_context(format!("writing column {}", descriptor.name())))?;
    }
    Ok(())
}

/// Read the next row of `schema` from `source`.
///
/// Returns `Ok(None)` when the stream ends cleanly before the row. A transport timeout before
/// any byte of the row arrived is a retryable [`StreamTimeout`](strand_error::StrandError), any
/// failure after that is a stream format error because the stream is no longer aligned to a row.
pub fn decode_row(schema: &RowSchema, source: &mut impl BufRead) -> StrandResult<Option<Row>> {
    match source.fill_buf() {
        Ok([]) => return Ok(None),
        Ok(_) => {}
        Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
            strand_bail!(StreamTimeout: "timed out waiting for the next row: {}", e)
        }
        Err(e) => return Err(e.into()),
    }

    if schema.is_empty() {
        return match read_value(source, LogicalType::Boolean)? {
            Some(Value::Boolean(true)) => Ok(Some(Row::new())),
            other => strand_bail!(StreamFormat: "expected an empty row marker, found {:?}", other),
        };
    }

    let mut row = Row::with_capacity(schema.len() + OVER_ALLOCATE);
    for descriptor in schema {
        row.push(
            read_slot(descriptor, source)
                .map_err(|e| e.with_context(format!("reading column {}", descriptor.name())))?,
        );
    }
    Ok(Some(row))
}

/// Writes a schema and then any number of rows to a sink.
pub struct RowWriter<W> {
    sink: W,
    schema: RowSchema,
}

impl<W: Write> RowWriter<W> {
    /// Write `schema` to `sink` and return a writer for its rows.
    pub fn try_new(mut sink: W, schema: RowSchema) -> StrandResult<Self> {
        encode_schema(&schema, &mut sink)?;
        Ok(Self { sink, schema })
    }

    /// The schema rows are written with.
    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    /// Write one row.
    pub fn write_row(&mut self, row: &[Option<Slot>]) -> StrandResult<()> {
        encode_row(&self.schema, row, &mut self.sink)
    }

    /// Flush the sink and return it.
    pub fn finish(mut self) -> StrandResult<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// Reads a schema and then yields rows until the stream ends.
///
/// Iteration stops after the first error, except for a timeout at a row boundary: the next call
/// to [`Iterator::next`] tries that row again.
pub struct RowReader<R> {
    source: R,
    schema: RowSchema,
    done: bool,
}

impl<R: BufRead> RowReader<R> {
    /// Read the schema from `source` and return a reader for its rows.
    pub fn try_new(mut source: R) -> StrandResult<Self> {
        let schema = decode_schema(&mut source)?;
        Ok(Self {
            source,
            schema,
            done: false,
        })
    }

    /// The schema read from the stream.
    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    /// Read the next row, `None` at the end of the stream.
    pub fn read_row(&mut self) -> StrandResult<Option<Row>> {
        decode_row(&self.schema, &mut self.source)
    }

    /// The schema and the remaining stream.
    pub fn into_parts(self) -> (RowSchema, R) {
        (self.schema, self.source)
    }
}

impl<R: BufRead> Iterator for RowReader<R> {
    type Item = StrandResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = !e.is_retryable();
                Some(Err(e))
            }
        }
    }
}
