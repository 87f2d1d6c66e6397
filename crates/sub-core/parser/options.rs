//! Parse configuration
//!
//! [`ParseOptions`] is an immutable value built once and shared by every
//! parse a [`SubtitleParser`](super::SubtitleParser) runs.
//!
//! # Example
//!
//! ```rust
//! use sub_core::{Dialect, ParseOptions};
//!
//! let options = ParseOptions::new(Dialect::Srt)
//!     .with_offset(-500)
//!     .with_max_duration(10_000)
//!     .with_strict(false);
//!
//! assert_eq!(options.offset_ms, -500);
//! assert!(!options.strict);
//! ```

use core::fmt;

use super::errors::{ParseError, ParseResult};
use super::reporter::StrictnessTable;
use crate::markup::DEFAULT_MAX_NESTING_DEPTH;
use crate::utils::encoding::TextEncoding;

/// Supported subtitle dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dialect {
    /// SubRip, line-numbered cues
    Srt,
    /// SAMI, `<SYNC>`-delimited cues
    Sami,
    /// WebVTT, optional cue identifiers
    WebVtt,
}

impl Dialect {
    /// Pick a dialect from a file extension, with or without the leading dot
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnsupportedExtension`] for unknown extensions.
    pub fn from_extension(extension: &str) -> ParseResult<Self> {
        let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "srt" => Ok(Self::Srt),
            "smi" | "sami" => Ok(Self::Sami),
            "vtt" | "webvtt" => Ok(Self::WebVtt),
            _ => Err(ParseError::UnsupportedExtension(extension.to_string())),
        }
    }

    /// Conventional file extension
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Sami => "smi",
            Self::WebVtt => "vtt",
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Srt => "SubRip",
            Self::Sami => "SAMI",
            Self::WebVtt => "WebVTT",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for parsing documents
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseOptions {
    /// Dialect to parse
    pub dialect: Dialect,
    /// Byte encoding of the input
    pub encoding: TextEncoding,
    /// Milliseconds added to every timecode
    pub offset_ms: i64,
    /// Longest allowed cue duration, `0` for unbounded
    pub max_duration_ms: i64,
    /// Deliver every issue unchanged
    pub strict: bool,
    /// Adjustments applied when not strict
    pub strictness: StrictnessTable,
    /// Maximum open-element depth in cue text
    pub max_nesting_depth: usize,
}

impl ParseOptions {
    /// Strict UTF-8 options for `dialect`, no offset and no duration bound
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            encoding: TextEncoding::default(),
            offset_ms: 0,
            max_duration_ms: 0,
            strict: true,
            strictness: StrictnessTable::default(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }

    /// Set input encoding
    #[must_use]
    pub const fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set timecode offset
    #[must_use]
    pub const fn with_offset(mut self, offset_ms: i64) -> Self {
        self.offset_ms = offset_ms;
        self
    }

    /// Set maximum cue duration
    #[must_use]
    pub const fn with_max_duration(mut self, max_duration_ms: i64) -> Self {
        self.max_duration_ms = max_duration_ms;
        self
    }

    /// Set strict mode
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set lenient-mode table
    #[must_use]
    pub fn with_strictness(mut self, strictness: StrictnessTable) -> Self {
        self.strictness = strictness;
        self
    }

    /// Set markup nesting bound
    #[must_use]
    pub const fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new(Dialect::Srt)
    }
}
