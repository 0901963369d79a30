use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use enum_iterator::Sequence;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strand_error::{StrandError, StrandResult, strand_bail, strand_err};

/// The character encoding of raw text bytes held in DEFERRED slots.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Sequence, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TextEncoding {
    /// UTF-8.
    #[default]
    Utf8 = 0,
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1 = 1,
    /// 7-bit US-ASCII.
    Ascii = 2,
}

impl TextEncoding {
    /// The canonical charset name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
            Self::Ascii => "US-ASCII",
        }
    }

    /// The stable numeric code used by the binary schema format.
    pub fn code(&self) -> u8 {
        (*self).into()
    }

    /// Resolve a numeric code written by [`TextEncoding::code`].
    pub fn from_code(code: u8) -> StrandResult<Self> {
        Self::try_from(code).map_err(|_| strand_err!(StreamFormat: "unknown text encoding code {}", code))
    }

    /// Whether raw bytes in this encoding can be borrowed as a `&str` without copying.
    ///
    /// ASCII qualifies because every valid ASCII sequence is also valid UTF-8.
    pub fn is_utf8_compatible(&self) -> bool {
        matches!(self, Self::Utf8 | Self::Ascii)
    }

    /// Decode raw bytes into text, borrowing whenever the bytes are already valid UTF-8.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> StrandResult<Cow<'a, str>> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|e| strand_err!(Conversion: "invalid UTF-8 text: {}", e)),
            Self::Ascii => {
                if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
                    strand_bail!(Conversion: "byte 0x{:02x} at {} is not US-ASCII", bytes[pos], pos);
                }
                std::str::from_utf8(bytes)
                    .map(Cow::Borrowed)
                    .map_err(|e| strand_err!(Conversion: "invalid US-ASCII text: {}", e))
            }
            Self::Latin1 => {
                if bytes.is_ascii() {
                    std::str::from_utf8(bytes)
                        .map(Cow::Borrowed)
                        .map_err(|e| strand_err!(Conversion: "invalid ISO-8859-1 text: {}", e))
                } else {
                    Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()))
                }
            }
        }
    }

    /// Encode text into raw bytes, borrowing whenever no transcoding is needed.
    pub fn encode<'a>(&self, text: &'a str) -> StrandResult<Cow<'a, [u8]>> {
        if text.is_ascii() || matches!(self, Self::Utf8) {
            return Ok(Cow::Borrowed(text.as_bytes()));
        }
        match self {
            Self::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            Self::Ascii => {
                strand_bail!(Conversion: "text {:?} cannot be encoded as US-ASCII", text)
            }
            Self::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        strand_err!(Conversion: "character {:?} cannot be encoded as ISO-8859-1", c)
                    })
                })
                .collect::<StrandResult<Vec<u8>>>()
                .map(Cow::Owned),
        }
    }
}

impl Display for TextEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = StrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().replace('_', "-").as_str() {
            "UTF-8" | "UTF8" => Self::Utf8,
            "ISO-8859-1" | "LATIN1" | "LATIN-1" => Self::Latin1,
            "US-ASCII" | "ASCII" => Self::Ascii,
            _ => strand_bail!(Schema: "unsupported text encoding {}", s),
        })
    }
}
