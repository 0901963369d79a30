#![deny(missing_docs)]

//! Row schemas, row buffers and the row formats of the Strand row/value engine.
//!
//! A row is a plain vector of optional [`Slot`]s whose meaning comes entirely from the
//! [`RowSchema`] that travels with it: position `i` of the row is read through descriptor `i` of
//! the schema. Rows and schemas move between stages through the binary format of [`encode_row`] or the
//! XML format of [`schema_to_xml`] and [`row_to_xml`].

pub use codec::*;
pub use row_buffer::*;
pub use schema::*;
pub use xml::{row_from_xml, row_to_xml, schema_from_xml, schema_to_xml};

pub mod buffer;
mod codec;
mod row_buffer;
mod schema;
mod xml;

use strand_scalar::Slot;

/// One row. Slots past the schema's column count are spare capacity and always null.
pub type Row = Vec<Option<Slot>>;
