#![deny(missing_docs)]

//! Values, value descriptors and the storage codec of the Strand row/value engine.
//!
//! A [`Value`] is a native scalar of one [`LogicalType`](strand_dtype::LogicalType). A row slot
//! ([`Slot`]) holds a value natively, as raw undecoded bytes, or as an index into a
//! [`Dictionary`]. The [`ValueDescriptor`] that owns a column knows how to read any of those
//! representations as any logical type: the conversion matrix, comparison, hashing and null
//! detection are all methods on the descriptor.

pub use codec::*;
pub use config::*;
pub use descriptor::*;
pub use dictionary::*;
pub use value::*;

mod codec;
mod config;
mod descriptor;
mod dictionary;
pub mod text;
mod value;
pub mod wire;
