//! Subtitle document parser
//!
//! Turns a byte stream in one of the supported dialects into a [`Document`]
//! while streaming every grammar deviation to the registered
//! [`ValidationListener`]s. Parsing never stops at a malformed construct;
//! only source failures, undecodable bytes and uninterpretable SAMI timing
//! markers end a parse with a [`ParseError`].
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use sub_core::parser::{IssueCollector, SubtitleParser};
//! use sub_core::Dialect;
//!
//! let collector = Rc::new(IssueCollector::new());
//! let mut parser = SubtitleParser::new(Dialect::Srt);
//! parser.add_listener(collector.clone());
//!
//! let document = parser.parse_str("1\n00:00:01,000 --> 00:00:02,000\n<b>Hi</b>\n")?;
//! assert_eq!(document.cue_count(), 1);
//! assert_eq!(document.cues()[0].plain_text(), "Hi");
//! assert!(collector.take_issues().is_empty());
//! # Ok::<(), sub_core::ParseError>(())
//! ```

use std::io::{BufRead, BufReader, Read};
use std::rc::Rc;

pub mod errors;
pub mod options;
pub mod reporter;
pub mod scanner;
pub mod source;
pub mod timing;

pub use errors::{
    IssueCategory, IssueKind, IssueSeverity, ParseError, ParseResult, Position, ValidationIssue,
};
pub use options::{Dialect, ParseOptions};
pub use reporter::{
    DiagnosticReporter, IssueCollector, IssueCounter, LenientAction, LogListener,
    StrictnessTable, ValidationListener,
};
pub use source::{LineSource, PositionCursor};

use crate::document::Document;
use crate::markup::{MarkupProfile, MarkupTreeParser};
use scanner::ScanContext;

/// Reusable parser for one configuration
///
/// Listeners registered here are attached to the reporter of every parse
/// this parser runs.
pub struct SubtitleParser {
    /// Immutable configuration
    options: ParseOptions,
    /// Listeners in registration order
    listeners: Vec<Rc<dyn ValidationListener>>,
}

impl SubtitleParser {
    /// Create a parser with default options for `dialect`
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self::with_options(ParseOptions::new(dialect))
    }

    /// Create a parser with explicit options
    #[must_use]
    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            listeners: Vec::new(),
        }
    }

    /// Configuration in use
    #[must_use]
    pub const fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Register a listener for every subsequent parse
    pub fn add_listener(&mut self, listener: Rc<dyn ValidationListener>) {
        self.listeners.push(listener);
    }

    /// Parse `reader` with the configured options
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on read failure, undecodable input or a
    /// malformed SAMI timing marker.
    pub fn parse<R: Read>(&self, reader: R) -> ParseResult<Document> {
        self.run(BufReader::new(reader), &self.options)
    }

    /// Parse with a different timecode offset
    ///
    /// # Errors
    ///
    /// See [`SubtitleParser::parse`].
    pub fn parse_with_offset<R: Read>(&self, reader: R, offset_ms: i64) -> ParseResult<Document> {
        let options = self.options.clone().with_offset(offset_ms);
        self.run(BufReader::new(reader), &options)
    }

    /// Parse with a different offset and strictness
    ///
    /// # Errors
    ///
    /// See [`SubtitleParser::parse`].
    pub fn parse_with_strict<R: Read>(
        &self,
        reader: R,
        offset_ms: i64,
        strict: bool,
    ) -> ParseResult<Document> {
        let options = self
            .options
            .clone()
            .with_offset(offset_ms)
            .with_strict(strict);
        self.run(BufReader::new(reader), &options)
    }

    /// Parse with a different offset, duration bound and strictness
    ///
    /// # Errors
    ///
    /// See [`SubtitleParser::parse`].
    pub fn parse_bounded<R: Read>(
        &self,
        reader: R,
        offset_ms: i64,
        max_duration_ms: i64,
        strict: bool,
    ) -> ParseResult<Document> {
        let options = self
            .options
            .clone()
            .with_offset(offset_ms)
            .with_max_duration(max_duration_ms)
            .with_strict(strict);
        self.run(BufReader::new(reader), &options)
    }

    /// Parse in-memory text, ignoring the configured encoding
    ///
    /// # Errors
    ///
    /// See [`SubtitleParser::parse`].
    pub fn parse_str(&self, text: &str) -> ParseResult<Document> {
        let options = self
            .options
            .clone()
            .with_encoding(crate::utils::encoding::TextEncoding::Utf8);
        self.run(text.as_bytes(), &options)
    }

    /// Run one parse session
    fn run<R: BufRead>(&self, reader: R, options: &ParseOptions) -> ParseResult<Document> {
        let mut source = LineSource::new(reader, options.encoding);

        let mut reporter = DiagnosticReporter::new();
        reporter.bind(source.cursor());
        reporter.set_strict(options.strict);
        reporter.set_strictness(options.strictness.clone());
        for listener in &self.listeners {
            reporter.add_listener(Rc::clone(listener));
        }

        let context = ScanContext {
            reporter: &reporter,
            markup: MarkupTreeParser::new(MarkupProfile::for_dialect(options.dialect))
                .with_max_depth(options.max_nesting_depth)
                .with_offset(options.offset_ms),
            offset: options.offset_ms,
            max_duration: options.max_duration_ms,
        };

        let mut document = Document::new(options.dialect);
        match options.dialect {
            Dialect::Srt => scanner::srt::scan(&mut source, &context, &mut document)?,
            Dialect::Sami => scanner::sami::scan(&mut source, &context, &mut document)?,
            Dialect::WebVtt => scanner::vtt::scan(&mut source, &context, &mut document)?,
        }

        log::debug!(
            "Parsed {} document: {} cue(s) from {} line(s)",
            options.dialect,
            document.cue_count(),
            source.current_line()
        );
        Ok(document)
    }
}

impl core::fmt::Debug for SubtitleParser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SubtitleParser")
            .field("options", &self.options)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timecode::TimeCode;
    use std::io::Cursor;

    const SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\n<blink>Hi</blink>\n\n2\n00:00:03,000 --> 00:00:20,000\nLong\n";

    fn collecting(dialect: Dialect) -> (SubtitleParser, Rc<IssueCollector>) {
        let collector = Rc::new(IssueCollector::new());
        let mut parser = SubtitleParser::new(dialect);
        parser.add_listener(collector.clone());
        (parser, collector)
    }

    #[test]
    fn parse_from_reader() {
        let (parser, collector) = collecting(Dialect::Srt);
        let doc = parser.parse(Cursor::new(SRT)).unwrap();
        assert_eq!(doc.cue_count(), 2);
        assert_eq!(doc.dialect(), Dialect::Srt);
        assert_eq!(collector.count_kind(IssueKind::UnknownTag), 1);
    }

    #[test]
    fn offset_variant() {
        let (parser, _) = collecting(Dialect::Srt);
        let doc = parser.parse_with_offset(Cursor::new(SRT), 1_000).unwrap();
        assert_eq!(doc.cues()[0].start(), Some(TimeCode::from_millis(2_000)));
    }

    #[test]
    fn lenient_variant_suppresses_unknown_tags() {
        let (parser, collector) = collecting(Dialect::Srt);
        parser.parse_with_strict(Cursor::new(SRT), 0, false).unwrap();
        assert!(collector.is_empty());
    }

    #[test]
    fn bounded_variant_clamps() {
        let (parser, collector) = collecting(Dialect::Srt);
        let doc = parser
            .parse_bounded(Cursor::new(SRT), 0, 5_000, false)
            .unwrap();
        assert_eq!(doc.cues()[1].end(), Some(TimeCode::from_millis(8_000)));
        assert_eq!(collector.count_kind(IssueKind::DurationClamped), 1);
    }

    #[test]
    fn issues_carry_line_numbers() {
        let (parser, collector) = collecting(Dialect::Srt);
        parser.parse_str(SRT).unwrap();
        let issue = &collector.issues()[0];
        assert_eq!(issue.kind, IssueKind::UnknownTag);
        assert_eq!(issue.position.line, 3);
        assert_eq!(issue.position.column, 1);
    }

    #[test]
    fn offset_reaches_inline_timestamps() {
        let parser = SubtitleParser::new(Dialect::WebVtt);
        let doc = parser
            .parse_with_offset(
                Cursor::new("WEBVTT\n\n00:01.000 --> 00:03.000\none <00:02.000>two\n"),
                10_000,
            )
            .unwrap();
        let cue = &doc.cues()[0];
        assert_eq!(cue.start(), Some(TimeCode::from_millis(11_000)));
        assert_eq!(
            cue.timestamps().collect::<Vec<_>>(),
            vec![TimeCode::from_millis(12_000)]
        );
        assert_eq!(cue.lines()[0].timestamps()[0].offset, 4);
        assert_eq!(cue.plain_text(), "one two");
    }

    #[test]
    fn listeners_persist_across_parses() {
        let (parser, collector) = collecting(Dialect::Srt);
        parser.parse_str(SRT).unwrap();
        parser.parse_str(SRT).unwrap();
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn encoding_failure_is_fatal() {
        let parser = SubtitleParser::new(Dialect::Srt);
        let err = parser.parse(Cursor::new(b"1\n\xff\xfe\n".to_vec())).unwrap_err();
        assert!(matches!(err, ParseError::Encoding { line: 2, .. }));
    }

    #[test]
    fn latin1_input() {
        let options = ParseOptions::new(Dialect::Srt)
            .with_encoding(crate::utils::encoding::TextEncoding::Latin1);
        let parser = SubtitleParser::with_options(options);
        let doc = parser
            .parse(Cursor::new(b"1\n00:00:01,000 --> 00:00:02,000\nCaf\xe9\n".to_vec()))
            .unwrap();
        assert_eq!(doc.cues()[0].plain_text(), "Caf\u{e9}");
    }
}
