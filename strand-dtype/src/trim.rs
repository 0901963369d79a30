use std::fmt::{Display, Formatter};
use std::str::FromStr;

use enum_iterator::Sequence;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strand_error::{StrandError, StrandResult, strand_bail, strand_err};

/// Which ends of a text value are stripped of whitespace before it is parsed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Sequence, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum TrimPolicy {
    /// Keep the text as is.
    #[default]
    None = 0,
    /// Strip leading whitespace.
    Left = 1,
    /// Strip trailing whitespace.
    Right = 2,
    /// Strip leading and trailing whitespace.
    Both = 3,
}

impl TrimPolicy {
    /// Apply the policy, borrowing from the input.
    pub fn apply<'a>(&self, text: &'a str) -> &'a str {
        match self {
            Self::None => text,
            Self::Left => text.trim_start(),
            Self::Right => text.trim_end(),
            Self::Both => text.trim(),
        }
    }

    /// Apply the policy to raw bytes, stripping ASCII whitespace only.
    pub fn apply_bytes<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        match self {
            Self::None => bytes,
            Self::Left => bytes.trim_ascii_start(),
            Self::Right => bytes.trim_ascii_end(),
            Self::Both => bytes.trim_ascii(),
        }
    }

    /// The stable lowercase name used by the XML schema format.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Left => "left",
            Self::Right => "right",
            Self::Both => "both",
        }
    }

    /// The stable numeric code used by the binary schema format.
    pub fn code(&self) -> u8 {
        (*self).into()
    }

    /// Resolve a numeric code written by [`TrimPolicy::code`].
    pub fn from_code(code: u8) -> StrandResult<Self> {
        Self::try_from(code).map_err(|_| strand_err!(StreamFormat: "unknown trim policy code {}", code))
    }
}

impl Display for TrimPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrimPolicy {
    type Err = StrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            "left" => Self::Left,
            "right" => Self::Right,
            "both" => Self::Both,
            _ => strand_bail!(Schema: "unknown trim policy {}", s),
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(TrimPolicy::None, "  a b  ")]
    #[case(TrimPolicy::Left, "a b  ")]
    #[case(TrimPolicy::Right, "  a b")]
    #[case(TrimPolicy::Both, "a b")]
    fn trims_requested_ends(#[case] policy: TrimPolicy, #[case] expected: &str) {
        assert_eq!(policy.apply("  a b  "), expected);
        assert_eq!(policy.apply_bytes(b"  a b  "), expected.as_bytes());
    }

    #[test]
    fn names_round_trip() {
        for policy in enum_iterator::all::<TrimPolicy>() {
            assert_eq!(policy.name().parse::<TrimPolicy>().unwrap(), policy);
            assert_eq!(TrimPolicy::from_code(policy.code()).unwrap(), policy);
        }
    }
}
