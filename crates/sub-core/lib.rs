//! # sub-core
//!
//! Recoverable parser for line-numbered (SubRip), tag-delimited (SAMI) and
//! optional-label (WebVTT) subtitle documents. Produces a format-neutral
//! [`Document`] together with a stream of position-stamped diagnostics, and
//! keeps going past every malformed construct.
//!
//! ## Features
//!
//! - **Single pass**: one forward read of the source, one line buffered
//! - **Recovery first**: grammar deviations are reported, never fatal
//! - **Listener fan-out**: diagnostics delivered synchronously in order
//! - **Markup trees**: inline tags, entities and karaoke timestamps with
//!   nesting and annotation rules per dialect
//! - **Style validation**: `::cue` rule sets from WebVTT `STYLE` blocks
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use sub_core::parser::IssueCollector;
//! use sub_core::{Dialect, SubtitleParser};
//!
//! let text = "WEBVTT\n\n00:00.000 --> 00:01.500\n<v Ann>Hello &amp; welcome\n";
//!
//! let collector = Rc::new(IssueCollector::new());
//! let mut parser = SubtitleParser::new(Dialect::WebVtt);
//! parser.add_listener(collector.clone());
//!
//! let document = parser.parse_str(text)?;
//! assert_eq!(document.cues()[0].plain_text(), "Hello & welcome");
//!
//! // The voice span was never closed
//! let issues = collector.take_issues();
//! assert_eq!(issues.len(), 1);
//! # Ok::<(), sub_core::ParseError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(clippy::all)]
#![deny(unsafe_code)]

pub mod document;
pub mod markup;
pub mod parser;
pub mod style;
pub mod timecode;
pub mod utils;

pub use document::{Cue, Document, Line, Property, TextSpan};
pub use parser::{Dialect, ParseError, ParseOptions, SubtitleParser};
pub use timecode::TimeCode;
pub use utils::encoding::TextEncoding;

/// Result type for fallible crate operations
pub type Result<T> = core::result::Result<T, ParseError>;

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn parse_by_extension() -> Result<()> {
        let dialect = Dialect::from_extension("srt")?;
        let document = SubtitleParser::new(dialect).parse_str("1\n00:00:00,000 --> 00:00:01,000\nx")?;
        assert_eq!(document.cue_count(), 1);
        Ok(())
    }
}
