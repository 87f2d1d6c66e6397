//! Text encoding and BOM (Byte Order Mark) handling
//!
//! Decoding is delegated to `encoding_rs`. UTF-8 is validated strictly and
//! malformed input is reported instead of being replaced. Labels follow the
//! WHATWG Encoding Standard, so `latin1` and `iso-8859-1` name Windows-1252.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// UTF-8 byte-order mark
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Character encoding of a subtitle source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextEncoding {
    /// UTF-8, rejecting invalid sequences
    #[default]
    Utf8,
    /// ISO-8859-1, every byte is the code point of the same value
    Latin1,
    /// Windows-1252, Latin-1 with printable characters in 0x80..=0x9F
    Windows1252,
}

impl TextEncoding {
    /// Canonical name of the encoding
    #[must_use]
    pub fn name(self) -> &'static str {
        match self.encoding() {
            Some(encoding) => encoding.name(),
            None => "ISO-8859-1",
        }
    }

    /// Backing `encoding_rs` encoding, `None` for strict Latin-1
    #[must_use]
    pub fn encoding(self) -> Option<&'static Encoding> {
        match self {
            Self::Utf8 => Some(UTF_8),
            Self::Latin1 => None,
            Self::Windows1252 => Some(WINDOWS_1252),
        }
    }

    /// Look an encoding up by one of its WHATWG labels
    ///
    /// Returns `None` for labels of encodings this parser does not read.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())?;
        if encoding == UTF_8 {
            Some(Self::Utf8)
        } else if encoding == WINDOWS_1252 {
            Some(Self::Windows1252)
        } else {
            None
        }
    }

    /// Decode one line worth of bytes
    ///
    /// Returns `None` when the bytes are not valid in this encoding.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        match self.encoding() {
            Some(encoding) => encoding.decode_without_bom_handling_and_without_replacement(bytes),
            None => Some(encoding_rs::mem::decode_latin1(bytes)),
        }
    }
}

/// Strip a leading UTF-8 BOM from raw bytes
///
/// Returns the remaining bytes and whether a BOM was present.
#[must_use]
pub fn strip_utf8_bom(bytes: &[u8]) -> (&[u8], bool) {
    bytes
        .strip_prefix(&UTF8_BOM)
        .map_or((bytes, false), |rest| (rest, true))
}
