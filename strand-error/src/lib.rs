#![feature(error_generic_member_access)]
#![deny(missing_docs)]

//! Error handling for the Strand row/value engine.
//!
//! Every fallible operation in the engine returns a [`StrandResult`]. The variants of
//! [`StrandError`] form a closed taxonomy so that callers can pick a recovery policy: conversion
//! and schema errors are data/programming errors, stream format errors are fatal to the stream
//! they occur on, and stream timeouts may be retried by the caller.

mod ext;

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::{fmt, io};

pub use ext::*;

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The top-level error type for Strand.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum StrandError {
    /// A value could not be converted between logical types, or text did not match a mask.
    #[error("{0}\nBacktrace:\n{1}")]
    Conversion(ErrString, Backtrace),
    /// A schema lookup or mutation referred to a column that does not exist.
    #[error("{0}\nBacktrace:\n{1}")]
    Schema(ErrString, Backtrace),
    /// A binary or XML payload was malformed or ended in the middle of a value.
    #[error("{0}\nBacktrace:\n{1}")]
    StreamFormat(ErrString, Backtrace),
    /// The underlying transport timed out before any byte of the next row arrived.
    #[error("{0}\nBacktrace:\n{1}")]
    StreamTimeout(ErrString, Backtrace),
    /// An invalid argument was provided.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, Backtrace),
    /// An index is out of bounds.
    #[error("index {0} out of bounds from {1} to {2}\nBacktrace:\n{3}")]
    OutOfBounds(usize, usize, usize, Backtrace),
    /// A wrapper for other errors, carrying additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<StrandError>),
    /// A wrapper for IO errors.
    #[error("{0}\nBacktrace:\n{1}")]
    Io(io::Error, Backtrace),
    /// A wrapper for errors from the jiff date/time library.
    #[error("{0}\nBacktrace:\n{1}")]
    Jiff(jiff::Error, Backtrace),
    /// A wrapper for errors from the quick-xml library.
    #[error("{0}\nBacktrace:\n{1}")]
    Xml(quick_xml::Error, Backtrace),
}

impl StrandError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        StrandError::Context(msg.into(), Box::new(self))
    }

    /// The innermost error, skipping any number of [`StrandError::Context`] wrappers.
    pub fn root(&self) -> &StrandError {
        match self {
            StrandError::Context(_, inner) => inner.root(),
            other => other,
        }
    }

    /// Whether the caller may retry the failed operation on the same stream.
    ///
    /// Only a [`StrandError::StreamTimeout`] that happened at a row boundary qualifies.
    pub fn is_retryable(&self) -> bool {
        matches!(self.root(), StrandError::StreamTimeout(..))
    }

    /// Whether this is a conversion error, possibly wrapped in context.
    pub fn is_conversion(&self) -> bool {
        matches!(self.root(), StrandError::Conversion(..))
    }

    /// Whether this is a schema error, possibly wrapped in context.
    pub fn is_schema(&self) -> bool {
        matches!(self.root(), StrandError::Schema(..))
    }

    /// Whether this is a stream format error, possibly wrapped in context. Malformed XML counts.
    pub fn is_stream_format(&self) -> bool {
        matches!(
            self.root(),
            StrandError::StreamFormat(..) | StrandError::Xml(..)
        )
    }
}

impl Debug for StrandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for Results that return StrandErrors as their error type.
pub type StrandResult<T> = Result<T, StrandError>;

/// A convenient macro for creating a StrandError.
#[macro_export]
macro_rules! strand_err {
    (OutOfBounds: $idx:expr, $start:expr, $stop:expr) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::StrandError::OutOfBounds($idx, $start, $stop, Backtrace::capture())
        )
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::StrandError::$variant(format!($fmt, $($arg),*).into(), Backtrace::capture())
        )
    }};
    ($variant:ident: $err:expr $(,)?) => {
        $crate::__private::must_use(
            $crate::StrandError::$variant($err)
        )
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::strand_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// A convenient macro for returning a StrandError.
#[macro_export]
macro_rules! strand_bail {
    ($($tt:tt)+) => {
        return Err($crate::strand_err!($($tt)+))
    };
}

impl From<io::Error> for StrandError {
    fn from(value: io::Error) -> Self {
        StrandError::Io(value, Backtrace::capture())
    }
}

impl From<jiff::Error> for StrandError {
    fn from(value: jiff::Error) -> Self {
        StrandError::Jiff(value, Backtrace::capture())
    }
}

impl From<quick_xml::Error> for StrandError {
    fn from(value: quick_xml::Error) -> Self {
        StrandError::Xml(value, Backtrace::capture())
    }
}

impl From<quick_xml::escape::EscapeError> for StrandError {
    fn from(value: quick_xml::escape::EscapeError) -> Self {
        StrandError::StreamFormat(value.to_string().into(), Backtrace::capture())
    }
}

impl From<std::str::Utf8Error> for StrandError {
    fn from(value: std::str::Utf8Error) -> Self {
        StrandError::StreamFormat(value.to_string().into(), Backtrace::capture())
    }
}

impl From<std::string::FromUtf8Error> for StrandError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        StrandError::StreamFormat(value.to_string().into(), Backtrace::capture())
    }
}

#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn must_use(error: crate::StrandError) -> crate::StrandError {
        error
    }
}
