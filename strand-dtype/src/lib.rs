#![deny(missing_docs)]

//! The type system of the Strand row/value engine.
//!
//! This crate holds the closed enumerations that describe a column ([`LogicalType`],
//! [`StorageMode`], [`TrimPolicy`], [`TextEncoding`]), the [`Locale`] symbol tables, and the two
//! compiled text formats used to move values between text and native form: [`NumberFormat`] for
//! decimal-format masks and [`DateFormat`] for date-pattern masks.

pub use date_format::*;
pub use encoding::*;
pub use locale::*;
pub use logical_type::*;
pub use number_format::*;
pub use pad::*;
pub use storage_mode::*;
pub use trim::*;

mod date_format;
mod digits;
mod encoding;
mod locale;
mod logical_type;
mod number_format;
mod pad;
mod storage_mode;
mod trim;

pub use bigdecimal::BigDecimal;
pub use jiff;
