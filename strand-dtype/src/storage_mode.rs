use std::fmt::{Display, Formatter};
use std::str::FromStr;

use enum_iterator::Sequence;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strand_error::{StrandError, StrandResult, strand_bail, strand_err};

/// How the content of a slot is physically represented.
///
/// The storage mode is orthogonal to the [`LogicalType`](crate::LogicalType): any logical type can
/// be held natively, as undecoded bytes, or as an index into a dictionary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Sequence, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum StorageMode {
    /// The slot holds the value in its logical type's native representation.
    #[default]
    Native = 0,
    /// The slot holds raw bytes, decoded on demand through a storage descriptor.
    Deferred = 1,
    /// The slot holds an offset into the descriptor's dictionary.
    Dictionary = 2,
}

impl StorageMode {
    /// The stable lowercase name used by the XML schema format.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Deferred => "deferred",
            Self::Dictionary => "dictionary",
        }
    }

    /// The stable numeric code used by the binary schema format.
    pub fn code(&self) -> u8 {
        (*self).into()
    }

    /// Resolve a numeric code written by [`StorageMode::code`].
    pub fn from_code(code: u8) -> StrandResult<Self> {
        Self::try_from(code)
            .map_err(|_| strand_err!(StreamFormat: "unknown storage mode code {}", code))
    }
}

impl Display for StorageMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StorageMode {
    type Err = StrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "native" | "normal" => Self::Native,
            "deferred" | "binary-string" => Self::Deferred,
            "dictionary" | "indexed" => Self::Dictionary,
            _ => strand_bail!(Schema: "unknown storage mode {}", s),
        })
    }
}

#[cfg(test)]
mod tests {
    use enum_iterator::all;

    use super::*;

    #[test]
    fn codes_and_names_round_trip() {
        for mode in all::<StorageMode>() {
            assert_eq!(StorageMode::from_code(mode.code()).unwrap(), mode);
            assert_eq!(mode.to_string().parse::<StorageMode>().unwrap(), mode);
        }
        assert!(StorageMode::from_code(3).is_err());
    }
}
