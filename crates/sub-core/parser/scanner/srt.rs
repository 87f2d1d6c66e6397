//! SubRip cue scanner
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:02,500
//! First line
//! Second line
//!
//! 2
//! ...
//! ```

use std::io::BufRead;

use super::{CueBuilder, ScanContext, ScanState};
use crate::document::Document;
use crate::markup::SourceMap;
use crate::parser::errors::{IssueKind, ParseResult};
use crate::parser::source::LineSource;
use crate::parser::timing::{
    is_timing_line, parse_cue_settings, parse_timing_line_with, FractionSeparator,
};

/// Scan a SubRip stream into `document`
///
/// # Errors
///
/// Only source failures are fatal; grammar problems are reported.
pub fn scan<R: BufRead>(
    source: &mut LineSource<R>,
    context: &ScanContext<'_>,
    document: &mut Document,
) -> ParseResult<()> {
    let reporter = context.reporter;
    let mut state = ScanState::Idle;
    let mut cue = CueBuilder::new();

    while let Some(line) = source.read_line()? {
        let blank = line.trim().is_empty();

        state = match state {
            ScanState::Idle if blank => ScanState::Idle,
            ScanState::Idle if is_timing_line(&line) => {
                reporter.error(IssueKind::InvalidLabel, "Cue is missing its numeric label");
                cue.begin();
                apply_timing(&line, context, &mut cue);
                ScanState::Timing
            }
            ScanState::Idle => {
                let label = line.trim();
                if label.parse::<u64>().is_err() {
                    reporter.error(
                        IssueKind::InvalidLabel,
                        format!("Cue label '{label}' is not a number"),
                    );
                }
                cue.begin();
                cue.set_id(label);
                ScanState::Label
            }
            ScanState::Label if blank => {
                reporter.error(IssueKind::InvalidTiming, "Cue has no timing line");
                cue.flush(context, document);
                ScanState::Idle
            }
            ScanState::Label => {
                apply_timing(&line, context, &mut cue);
                ScanState::Timing
            }
            ScanState::Timing | ScanState::Text if blank => {
                cue.flush(context, document);
                ScanState::Idle
            }
            ScanState::Timing | ScanState::Text => {
                if is_timing_line(&line) {
                    reporter.warn(
                        IssueKind::UnexpectedLine,
                        "Timing line inside cue text; is a blank line missing?",
                    );
                }
                cue.push_line(&line, &SourceMap::line_start(source.current_line()), context);
                ScanState::Text
            }
        };
    }

    cue.flush(context, document);
    Ok(())
}

/// Parse a SubRip timing line into the cue in progress
///
/// A line that is not shaped like a timing line is an error and leaves both
/// times unset. Only the time fields accept `,` before the fraction.
fn apply_timing(line: &str, context: &ScanContext<'_>, cue: &mut CueBuilder) {
    let timing = parse_timing_line_with(
        line,
        FractionSeparator::DotOrComma,
        context.offset,
        context.reporter,
    );
    match timing {
        Some(timing) => {
            cue.set_times(timing.start, timing.end);
            if !timing.trailing.is_empty() {
                cue.set_settings(parse_cue_settings(&timing.trailing, context.reporter));
            }
        }
        None => context.reporter.error(
            IssueKind::InvalidTiming,
            format!("Expected '<start> --> <end>', found '{}'", line.trim()),
        ),
    }
}
