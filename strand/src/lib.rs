//! Strand, a row/value type engine for pipelines that move typed rows between stages.
//!
//! Each stage sees rows as vectors of slots described by a [`RowSchema`]; the
//! [`ValueDescriptor`] of a column converts, compares and renders its values.

pub use strand_row::*;
pub use strand_scalar::{Dictionary, EngineConfig, Slot, Value, ValueDescriptor};
pub use {
    strand_dtype as dtype, strand_error as error, strand_row as row, strand_scalar as scalar,
};
