//! WebVTT cue scanner
//!
//! The `WEBVTT` signature line is followed by optional header lines, then by
//! blocks separated by blank lines. Before the first cue a block may be a
//! `NOTE`, `STYLE` or `REGION` block; after it only `NOTE` blocks and cues
//! are expected. Cue identifiers are optional.

use std::io::BufRead;

use super::{CueBuilder, ScanContext, ScanState};
use crate::document::{Document, Property, Region};
use crate::markup::SourceMap;
use crate::parser::errors::{IssueKind, ParseResult};
use crate::parser::source::LineSource;
use crate::parser::timing::{is_timing_line, parse_cue_settings, parse_timing_line};
use crate::style::StyleRuleParser;

/// Signature every WebVTT file starts with
const SIGNATURE: &str = "WEBVTT";

/// Non-cue block being consumed
#[derive(Debug)]
enum Block {
    /// Header lines directly after the signature
    Header,
    /// Comment block, skipped
    Note,
    /// Style sheet lines
    Style(Vec<String>),
    /// Region setting lines
    Region(Vec<String>),
}

/// Check whether `line` is `keyword` alone or followed by whitespace
fn starts_block(line: &str, keyword: &str) -> bool {
    line.strip_prefix(keyword)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Scan a WebVTT stream into `document`
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
    let mut block = None;
    let mut cue = CueBuilder::new();
    let mut seen_cue = false;

    let Some(first) = source.read_line()? else {
        reporter.error(IssueKind::MissingHeader, "Empty input has no WEBVTT signature");
        return Ok(());
    };

    let mut pending = None;
    if starts_block(&first, SIGNATURE) {
        let header = first[SIGNATURE.len()..].trim();
        if !header.is_empty() {
            document.set_property(Property::Header, header);
        }
        block = Some(Block::Header);
    } else {
        reporter.error(
            IssueKind::MissingHeader,
            format!("Expected '{SIGNATURE}' signature, found '{}'", first.trim()),
        );
        pending = Some(first);
    }

    loop {
        let line = match pending.take() {
            Some(line) => line,
            None => match source.read_line()? {
                Some(line) => line,
                None => break,
            },
        };
        let blank = line.trim().is_empty();

        if let Some(current) = block.as_mut() {
            if matches!(current, Block::Header) && is_timing_line(&line) {
                reporter.warn(
                    IssueKind::UnexpectedLine,
                    "Missing blank line between the header and the first cue",
                );
                block = None;
            } else if blank {
                if let Some(finished) = block.take() {
                    finish_block(finished, context, document);
                }
                continue;
            } else {
                match current {
                    Block::Header => header_line(&line, document),
                    Block::Note => {}
                    Block::Style(lines) | Block::Region(lines) => lines.push(line),
                }
                continue;
            }
        }

        state = match state {
            ScanState::Idle if blank => ScanState::Idle,
            ScanState::Idle if starts_block(&line, "NOTE") => {
                block = Some(Block::Note);
                ScanState::Idle
            }
            ScanState::Idle if starts_block(&line, "STYLE") || starts_block(&line, "REGION") => {
                if seen_cue {
                    reporter.warn(
                        IssueKind::UnexpectedLine,
                        format!("'{}' block after the first cue is ignored", line.trim()),
                    );
                    block = Some(Block::Note);
                } else if starts_block(&line, "STYLE") {
                    block = Some(Block::Style(Vec::new()));
                } else {
                    block = Some(Block::Region(Vec::new()));
                }
                ScanState::Idle
            }
            ScanState::Idle if is_timing_line(&line) => {
                seen_cue = true;
                cue.begin();
                apply_timing(&line, context, &mut cue);
                ScanState::Timing
            }
            ScanState::Idle => {
                seen_cue = true;
                cue.begin();
                cue.set_id(line.trim());
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
                if line.contains("-->") {
                    reporter.warn(
                        IssueKind::UnexpectedLine,
                        "'-->' inside cue text; is a blank line missing?",
                    );
                }
                cue.push_line(&line, &SourceMap::line_start(source.current_line()), context);
                ScanState::Text
            }
        };
    }

    if let Some(finished) = block.take() {
        finish_block(finished, context, document);
    }
    cue.flush(context, document);
    Ok(())
}

/// Record a `Key: value` header line
fn header_line(line: &str, document: &mut Document) {
    let Some((key, value)) = line.split_once(':') else {
        return;
    };
    let property = match key.trim().to_ascii_lowercase().as_str() {
        "language" => Property::Language,
        "title" => Property::Title,
        "description" => Property::Description,
        "copyright" => Property::Copyright,
        _ => return,
    };
    document.set_property(property, value.trim());
}

/// Store the result of a completed header-level block
fn finish_block(block: Block, context: &ScanContext<'_>, document: &mut Document) {
    match block {
        Block::Header | Block::Note => {}
        Block::Style(lines) => {
            let rules = StyleRuleParser::parse(&lines.join("\n"), context.reporter);
            log::debug!("Consumed STYLE block with {} rule(s)", rules.len());
            document.extend_style_rules(rules);
        }
        Block::Region(lines) => {
            let settings = lines
                .iter()
                .flat_map(|line| parse_cue_settings(line, context.reporter))
                .collect::<Vec<_>>();
            log::debug!("Consumed REGION block with {} setting(s)", settings.len());
            document.push_region(Region::new(settings));
        }
    }
}

/// Parse a WebVTT timing line with settings into the cue in progress
fn apply_timing(line: &str, context: &ScanContext<'_>, cue: &mut CueBuilder) {
    match parse_timing_line(line, context.offset, context.reporter) {
        Some(timing) => {
            cue.set_times(timing.start, timing.end);
            cue.set_settings(parse_cue_settings(&timing.trailing, context.reporter));
        }
        None => context.reporter.error(
            IssueKind::InvalidTiming,
            format!("Expected '<start> --> <end>', found '{}'", line.trim()),
        ),
    }
}
