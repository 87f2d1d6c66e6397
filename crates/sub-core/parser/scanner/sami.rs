//! SAMI cue scanner
//!
//! SAMI documents are HTML-like; cue boundaries are `<SYNC Start=ms>`
//! markers rather than lines. Each cue ends where the next one starts and
//! the last cue lasts [`LAST_CUE_DURATION_MS`]. A SYNC whose text is only
//! whitespace or `&nbsp;` clears the screen: it ends the previous cue and is
//! not kept itself.
//!
//! Structural tags are matched case-insensitively. `<P>` wrappers are
//! removed and `<BR>` breaks lines; every other tag is left in the cue text
//! for the markup parser.

use std::io::BufRead;
use std::sync::OnceLock;

use regex::Regex;

use super::{CueBuilder, ScanContext};
use crate::document::{Document, Property};
use crate::markup::SourceMap;
use crate::parser::errors::{IssueKind, ParseError, ParseResult, Position};
use crate::parser::source::LineSource;
use crate::timecode::TimeCode;

/// Duration given to the final cue
pub const LAST_CUE_DURATION_MS: i64 = 2_000;

/// Structural tags the scanner consumes
fn structure_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)<(/?)(sami|head|title|style|body|sync|p|br)\b([^>]*)>")
            .expect("structure pattern is valid")
    })
}

/// `Start=` attribute of a SYNC marker
fn start_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)\bstart\s*=\s*["']?([^"'\s>]*)"#).expect("start pattern is valid")
    })
}

/// Document section the scanner is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Outside head and body
    Outside,
    /// Inside `<HEAD>`
    Head,
    /// Inside `<TITLE>`
    Title,
    /// Inside `<STYLE>`, content skipped
    Style,
    /// Inside `<BODY>`
    Body,
}

/// Scanner state for one document
struct SamiScanner<'c, 'a> {
    context: &'c ScanContext<'a>,
    section: Section,
    cue: CueBuilder,
    /// Raw text of the cue in progress, `\n` at `<BR>`
    buffer: String,
    /// Where each fragment of `buffer` was read
    origins: SourceMap,
    title: String,
}

/// Scan a SAMI stream into `document`
///
/// # Errors
///
/// Returns [`ParseError::MalformedTiming`] for a SYNC marker without a
/// numeric `Start` and propagates source failures.
pub fn scan<R: BufRead>(
    source: &mut LineSource<R>,
    context: &ScanContext<'_>,
    document: &mut Document,
) -> ParseResult<()> {
    let mut scanner = SamiScanner {
        context,
        section: Section::Outside,
        cue: CueBuilder::new(),
        buffer: String::new(),
        origins: SourceMap::new(),
        title: String::new(),
    };

    while let Some(line) = source.read_line()? {
        scanner.line(&line, source.current_line(), document)?;
    }

    scanner.finish_last(document);
    Ok(())
}

impl SamiScanner<'_, '_> {
    /// Process one source line
    fn line(&mut self, line: &str, line_number: usize, document: &mut Document) -> ParseResult<()> {
        let mut last = 0;

        for captures in structure_pattern().captures_iter(line) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            self.text(&line[last..whole.start()], fragment_start(line, line_number, last));
            last = whole.end();

            let closing = captures.get(1).is_some_and(|m| !m.as_str().is_empty());
            let name = captures
                .get(2)
                .map_or(String::new(), |m| m.as_str().to_ascii_lowercase());
            let attributes = captures.get(3).map_or("", |m| m.as_str());

            self.tag(&name, closing, attributes, line_number, document)?;
        }

        self.text(&line[last..], fragment_start(line, line_number, last));
        if self.section == Section::Body && self.cue.is_open() {
            self.buffer.push(' ');
        }
        Ok(())
    }

    /// Handle text between structural tags, read right after `at`
    fn text(&mut self, text: &str, at: Position) {
        match self.section {
            Section::Title => self.title.push_str(text),
            Section::Body if self.cue.is_open() => {
                if !text.is_empty() {
                    self.origins.anchor(self.buffer.len(), at);
                    self.buffer.push_str(text);
                }
            }
            Section::Body if !text.trim().is_empty() => self.context.reporter.warn(
                IssueKind::UnexpectedLine,
                format!("Text '{}' outside of any SYNC block", text.trim()),
            ),
            _ => {}
        }
    }

    /// Handle one structural tag
    fn tag(
        &mut self,
        name: &str,
        closing: bool,
        attributes: &str,
        line_number: usize,
        document: &mut Document,
    ) -> ParseResult<()> {
        match (name, closing) {
            ("head", false) => self.section = Section::Head,
            ("head", true) | ("sami", true) => self.section = Section::Outside,
            ("title", false) => {
                self.title.clear();
                self.section = Section::Title;
            }
            ("title", true) => {
                let title = self.title.trim();
                if !title.is_empty() {
                    document.set_property(Property::Title, title);
                }
                self.section = Section::Head;
            }
            ("style", false) => self.section = Section::Style,
            ("style", true) => self.section = Section::Head,
            ("body", false) => self.section = Section::Body,
            ("body", true) => {
                self.finish_last(document);
                self.section = Section::Outside;
            }
            ("sync", false) => {
                let start = self.sync_start(attributes, line_number)?;
                self.section = Section::Body;
                self.finish(start, document);
                self.cue.begin();
                self.cue.set_times(start, None);
            }
            ("br", _) if self.section == Section::Body && self.cue.is_open() => {
                self.buffer.push('\n');
            }
            _ => {}
        }
        Ok(())
    }

    /// Read and validate the `Start` attribute of a SYNC marker
    fn sync_start(&self, attributes: &str, line_number: usize) -> ParseResult<Option<TimeCode>> {
        let value = start_pattern()
            .captures(attributes)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| ParseError::MalformedTiming {
                line: line_number,
                reason: "SYNC marker has no Start attribute".to_string(),
            })?;

        let millis = value
            .parse::<i64>()
            .map_err(|_| ParseError::MalformedTiming {
                line: line_number,
                reason: format!("SYNC Start value '{value}' is not a number"),
            })?;

        let start = TimeCode::from_millis(millis).checked_add_millis(self.context.offset);
        match start {
            Some(start) if !start.is_negative() => Ok(Some(start)),
            _ => {
                self.context.reporter.error(
                    IssueKind::InvalidTimecode,
                    format!(
                        "SYNC Start {millis}ms with offset {}ms is not a valid time",
                        self.context.offset
                    ),
                );
                Ok(None)
            }
        }
    }

    /// Close the cue in progress at `end`
    fn finish(&mut self, end: Option<TimeCode>, document: &mut Document) {
        if !self.cue.is_open() {
            return;
        }

        let raw = core::mem::take(&mut self.buffer);
        let origins = core::mem::take(&mut self.origins);
        let lines = trimmed_lines(&raw);

        let texts: Vec<&str> = lines.iter().map(|&(_, line)| line).collect();
        if is_clear_marker(&texts) {
            log::debug!("SYNC at {:?} clears the screen", self.cue.start());
            self.cue.discard();
            return;
        }

        self.cue.set_times(self.cue.start(), end);
        for (begin, line) in lines {
            let origin = origins.slice(&raw, begin..begin + line.len());
            self.cue.push_line(line, &origin, self.context);
        }
        self.cue.flush(self.context, document);
    }

    /// Close the final cue with the default duration
    fn finish_last(&mut self, document: &mut Document) {
        let end = self
            .cue
            .start()
            .and_then(|start| start.checked_add_millis(LAST_CUE_DURATION_MS));
        self.finish(end, document);
    }
}

/// Position just before byte `offset` of source line `line`
fn fragment_start(line: &str, line_number: usize, offset: usize) -> Position {
    Position::new(line_number, line[..offset].chars().count())
}

/// Non-empty `\n`-separated lines of `text`, trimmed, with their byte offsets
fn trimmed_lines(text: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    let mut start = 0;
    for piece in text.split('\n') {
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            lines.push((start + piece.len() - piece.trim_start().len(), trimmed));
        }
        start += piece.len() + 1;
    }
    lines
}

/// Check whether cue text carries nothing visible
fn is_clear_marker(lines: &[&str]) -> bool {
    lines.iter().all(|line| {
        let lower = line.to_ascii_lowercase();
        lower.replace("&nbsp;", "").trim().is_empty()
    })
}
