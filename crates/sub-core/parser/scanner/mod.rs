//! Cue-boundary scanners
//!
//! Each dialect has a scanner that turns the line stream into cues. The
//! line-oriented dialects share the [`ScanState`] machine; the tag-delimited
//! one drives [`CueBuilder`] from its markers instead. Every scanner hands
//! each raw cue-text line to the markup tree parser through
//! [`CueBuilder::push_line`], together with the source positions it came
//! from.

pub mod sami;
pub mod srt;
pub mod vtt;

use super::reporter::DiagnosticReporter;
use crate::document::{Cue, Document, Line};
use crate::markup::{flatten_lines, MarkupTreeParser, SourceMap};
use crate::parser::errors::IssueKind;
use crate::timecode::TimeCode;

/// Position of a line-oriented scanner within the cue grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Between cues
    #[default]
    Idle,
    /// Label read, timing line expected
    Label,
    /// Timing read, first text line expected
    Timing,
    /// Accumulating text lines
    Text,
}

/// Per-parse settings shared by the scanners
#[derive(Debug)]
pub struct ScanContext<'a> {
    /// Issue sink for this parse
    pub reporter: &'a DiagnosticReporter,
    /// Cue-text parser for the dialect
    pub markup: MarkupTreeParser<'static>,
    /// Milliseconds added to every timecode
    pub offset: i64,
    /// Longest allowed cue duration, `0` for unbounded
    pub max_duration: i64,
}

impl ScanContext<'_> {
    /// Apply duration checks to a finished timing pair, returning the end
    fn bounded_end(&self, start: Option<TimeCode>, end: Option<TimeCode>) -> Option<TimeCode> {
        let (Some(start), Some(end)) = (start, end) else {
            return end;
        };

        let duration = end - start;
        if duration.is_negative() {
            self.reporter.warn(
                IssueKind::NegativeDuration,
                format!("Cue ends at {end}, before its start at {start}"),
            );
            return Some(end);
        }

        if self.max_duration > 0 && duration.millis() > self.max_duration {
            if let Some(clamped) = start.checked_add_millis(self.max_duration) {
                self.reporter.warn(
                    IssueKind::DurationClamped,
                    format!(
                        "Cue duration {}ms exceeds {}ms; end moved from {end} to {clamped}",
                        duration.millis(),
                        self.max_duration
                    ),
                );
                return Some(clamped);
            }
        }

        Some(end)
    }
}

/// Cue under construction
#[derive(Debug, Default)]
pub struct CueBuilder {
    /// A cue has been started and not yet flushed
    open: bool,
    id: Option<String>,
    start: Option<TimeCode>,
    end: Option<TimeCode>,
    settings: Vec<(String, String)>,
    /// Parsed text lines
    lines: Vec<Line>,
}

impl CueBuilder {
    /// Create an idle builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new cue, dropping any unflushed state
    pub fn begin(&mut self) {
        *self = Self {
            open: true,
            ..Self::default()
        };
    }

    /// Whether a cue is in progress
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Set the cue identifier
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Set start and end times
    pub fn set_times(&mut self, start: Option<TimeCode>, end: Option<TimeCode>) {
        self.start = start;
        self.end = end;
    }

    /// Start time of the cue in progress
    #[must_use]
    pub const fn start(&self) -> Option<TimeCode> {
        self.start
    }

    /// Set cue settings
    pub fn set_settings(&mut self, settings: Vec<(String, String)>) {
        self.settings = settings;
    }

    /// Parse a raw text line and append it
    ///
    /// Markup issues are reported right away, at the positions `origin`
    /// gives for the offending constructs.
    pub fn push_line(&mut self, line: &str, origin: &SourceMap, context: &ScanContext<'_>) {
        let tree = context.markup.parse_mapped(line, origin, context.reporter);
        self.lines.extend(flatten_lines(&tree));
    }

    /// Lines parsed so far
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Abandon the cue in progress
    pub fn discard(&mut self) {
        *self = Self::default();
    }

    /// Finish the cue in progress and append it to `document`
    ///
    /// Does nothing when no cue is open.
    pub fn flush(&mut self, context: &ScanContext<'_>, document: &mut Document) {
        if !self.open {
            return;
        }
        let builder = core::mem::take(self);
        let end = context.bounded_end(builder.start, builder.end);

        log::debug!(
            "Flushed cue {} ({} line(s), {:?} to {:?})",
            builder.id.as_deref().unwrap_or("-"),
            builder.lines.len(),
            builder.start.map(|t| t.millis()),
            end.map(|t| t.millis())
        );

        document.push_cue(Cue::new(
            builder.id,
            builder.start,
            end,
            builder.lines,
            builder.settings,
        ));
    }
}
