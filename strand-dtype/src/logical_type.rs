use std::fmt::{Display, Formatter};
use std::str::FromStr;

use enum_iterator::Sequence;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strand_error::{StrandError, StrandResult, strand_bail, strand_err};

/// The logical type of a value, independent of how the value is physically stored.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum LogicalType {
    /// No type; no value of this type can be converted to anything.
    None = 0,
    /// A 64-bit floating point number.
    Float = 1,
    /// A string of characters.
    Text = 2,
    /// An instant in time with millisecond precision.
    Date = 3,
    /// `true` or `false`.
    Boolean = 4,
    /// A signed 64-bit integer.
    Integer = 5,
    /// An arbitrary precision decimal number.
    Decimal = 6,
    /// A serializable blob that is opaque to the engine.
    Opaque = 7,
    /// A sequence of bytes.
    Bytes = 8,
}

impl LogicalType {
    /// The stable lowercase name used by the XML schema format.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Float => "float",
            Self::Text => "text",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Opaque => "opaque",
            Self::Bytes => "bytes",
        }
    }

    /// The stable numeric code used by the binary schema format.
    pub fn code(&self) -> u8 {
        (*self).into()
    }

    /// Resolve a numeric code written by [`LogicalType::code`].
    pub fn from_code(code: u8) -> StrandResult<Self> {
        Self::try_from(code)
            .map_err(|_| strand_err!(StreamFormat: "unknown logical type code {}", code))
    }

    /// Whether values of this type are numbers (and therefore take a decimal-format mask).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Float | Self::Integer | Self::Decimal)
    }

    /// Whether text rendered for values of this type is shaped by a mask and symbols.
    pub fn is_masked(&self) -> bool {
        self.is_numeric() || matches!(self, Self::Date)
    }

    /// Whether values of this type are raw bytes.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Bytes | Self::Opaque)
    }
}

impl Display for LogicalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogicalType {
    type Err = StrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "float" | "number" => Self::Float,
            "text" | "string" => Self::Text,
            "date" | "datetime" => Self::Date,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "decimal" | "bignumber" => Self::Decimal,
            "opaque" | "serializable" => Self::Opaque,
            "bytes" | "binary" => Self::Bytes,
            _ => strand_bail!(Schema: "unknown logical type {}", s),
        })
    }
}

#[cfg(test)]
mod tests {
    use enum_iterator::all;
    use rstest::rstest;

    use super::*;

    #[test]
    fn codes_round_trip() {
        for ty in all::<LogicalType>() {
            assert_eq!(LogicalType::from_code(ty.code()).unwrap(), ty);
            assert_eq!(ty.name().parse::<LogicalType>().unwrap(), ty);
        }
    }

    #[test]
    fn unknown_code_is_stream_format() {
        assert!(LogicalType::from_code(42).unwrap_err().is_stream_format());
    }

    #[rstest]
    #[case("Number", LogicalType::Float)]
    #[case("STRING", LogicalType::Text)]
    #[case("BigNumber", LogicalType::Decimal)]
    #[case("Binary", LogicalType::Bytes)]
    fn legacy_aliases(#[case] name: &str, #[case] expected: LogicalType) {
        assert_eq!(name.parse::<LogicalType>().unwrap(), expected);
    }

    #[test]
    fn unknown_name_is_schema_error() {
        assert!("varchar".parse::<LogicalType>().unwrap_err().is_schema());
    }

    #[test]
    fn numeric_classification() {
        assert!(LogicalType::Decimal.is_numeric());
        assert!(LogicalType::Date.is_masked());
        assert!(!LogicalType::Text.is_masked());
        assert!(LogicalType::Opaque.is_binary());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&LogicalType::Decimal).unwrap();
        assert_eq!(json, "\"decimal\"");
        assert_eq!(serde_json::from_str::<LogicalType>(&json).unwrap(), LogicalType::Decimal);
    }
}
