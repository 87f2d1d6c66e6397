//! Timecode and timing-line parsing shared by the line-oriented dialects
//!
//! Timecodes are `[[h:]m:]s[.fraction]`. Components are accumulated base 60
//! and the fraction digits are added as a literal millisecond count, so
//! `00:01.42` is 1042 ms rather than 1420 ms.

use std::sync::OnceLock;

use regex::Regex;

use super::errors::IssueKind;
use super::reporter::DiagnosticReporter;
use crate::timecode::TimeCode;

/// Maximum number of `:`-separated components
const MAX_CLOCK_COMPONENTS: usize = 3;

/// Characters accepted between the seconds and the fraction digits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FractionSeparator {
    /// `.` only
    #[default]
    Dot,
    /// `.` or `,`, as SubRip writes it
    DotOrComma,
}

/// Start/end pair and trailing settings text of a timing line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingLine {
    /// Start time, `None` when the field could not be interpreted
    pub start: Option<TimeCode>,
    /// End time, `None` when the field could not be interpreted
    pub end: Option<TimeCode>,
    /// Text after the end time, trimmed
    pub trailing: String,
}

/// Pattern matching `<time> --> <time> [trailing]`
fn timing_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\S+)\s+-->\s+(\S+)(.*)$").expect("timing pattern is valid")
    })
}

/// Check whether a line is shaped like a timing line
#[must_use]
pub fn is_timing_line(line: &str) -> bool {
    timing_pattern().is_match(line)
}

/// Parse one timecode field
///
/// Reports [`IssueKind::InvalidTimecode`] and returns `None` on non-numeric
/// components, too many separators, overflow or a negative result.
pub fn parse_timecode(text: &str, offset: i64, reporter: &DiagnosticReporter) -> Option<TimeCode> {
    let text = text.trim();
    match timecode_millis(text, offset) {
        Ok(millis) => Some(TimeCode::from_millis(millis)),
        Err(reason) => {
            reporter.error(
                IssueKind::InvalidTimecode,
                format!("Invalid timecode '{text}': {reason}"),
            );
            None
        }
    }
}

/// Compute the millisecond value of a timecode, or say why it has none
fn timecode_millis(text: &str, offset: i64) -> Result<i64, &'static str> {
    let mut parts = text.split('.');
    let clock = parts.next().unwrap_or_default();
    let fraction = parts.next();
    if parts.next().is_some() {
        return Err("more than one '.'");
    }

    let components: Vec<&str> = clock.split(':').collect();
    if components.len() > MAX_CLOCK_COMPONENTS {
        return Err("more than three ':'-separated components");
    }

    let mut value: i64 = 0;
    for component in components {
        let component = parse_digits(component).ok_or("non-numeric component")?;
        value = value
            .checked_mul(60)
            .and_then(|v| v.checked_add(component))
            .ok_or("value overflows")?;
    }

    let fraction = match fraction {
        Some(digits) => parse_digits(digits).ok_or("non-numeric fraction")?,
        None => 0,
    };

    let millis = value
        .checked_mul(1_000)
        .and_then(|v| v.checked_add(offset))
        .and_then(|v| v.checked_add(fraction))
        .ok_or("value overflows")?;

    if millis < 0 {
        return Err("resolves to a negative time");
    }

    Ok(millis)
}

/// Interpret the body of a `<...>` run as an inline timestamp
///
/// Only `[h:]m:s.fraction` shapes qualify; `None` means the caller should
/// handle the body as an ordinary tag. A qualifying body yields the shifted
/// time, or the reason the shift left no valid time.
pub(crate) fn parse_inline_timestamp(
    body: &str,
    offset: i64,
) -> Option<Result<TimeCode, &'static str>> {
    let starts_with_digit = body.bytes().next().is_some_and(|b| b.is_ascii_digit());
    if !starts_with_digit || !body.contains(':') || !body.contains('.') {
        return None;
    }
    timecode_millis(body, 0).ok()?;
    Some(timecode_millis(body, offset).map(TimeCode::from_millis))
}

/// Parse a non-empty run of ASCII digits
fn parse_digits(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Parse a full timing line
///
/// Returns `None` without reporting when the line does not have the
/// `<time> --> <time>` shape at all; the caller decides how to report that.
/// A line with the right shape but bad fields yields `Some` with the bad
/// fields unset.
pub fn parse_timing_line(
    line: &str,
    offset: i64,
    reporter: &DiagnosticReporter,
) -> Option<TimingLine> {
    parse_timing_line_with(line, FractionSeparator::Dot, offset, reporter)
}

/// Parse a full timing line whose time fields may use `separator`
///
/// The trailing settings text is returned exactly as written.
pub fn parse_timing_line_with(
    line: &str,
    separator: FractionSeparator,
    offset: i64,
    reporter: &DiagnosticReporter,
) -> Option<TimingLine> {
    let captures = timing_pattern().captures(line)?;
    let field = |index: usize| captures.get(index).map_or("", |m| m.as_str());
    let time = |index: usize| match separator {
        FractionSeparator::Dot => parse_timecode(field(index), offset, reporter),
        FractionSeparator::DotOrComma => {
            parse_timecode(&field(index).replace(',', "."), offset, reporter)
        }
    };

    Some(TimingLine {
        start: time(1),
        end: time(2),
        trailing: field(3).trim().to_string(),
    })
}

/// Split trailing timing-line text into `key:value` settings
///
/// Entries without a `:` or with an empty key are reported as
/// [`IssueKind::InvalidCueSetting`] and dropped.
pub fn parse_cue_settings(text: &str, reporter: &DiagnosticReporter) -> Vec<(String, String)> {
    let mut settings = Vec::new();

    for entry in text.split_whitespace() {
        match entry.split_once(':') {
            Some((key, value)) if !key.is_empty() => {
                settings.push((key.to_string(), value.to_string()));
            }
            _ => reporter.warn(
                IssueKind::InvalidCueSetting,
                format!("Cue setting '{entry}' is not of the form key:value"),
            ),
        }
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::reporter::IssueCollector;
    use std::rc::Rc;

    fn reporter() -> (DiagnosticReporter, Rc<IssueCollector>) {
        let collector = Rc::new(IssueCollector::new());
        let mut reporter = DiagnosticReporter::new();
        reporter.add_listener(collector.clone());
        (reporter, collector)
    }

    #[test]
    fn full_clock_timecode() {
        let (reporter, collector) = reporter();
        let time = parse_timecode("01:02:03.456", 0, &reporter).unwrap();
        assert_eq!(time.millis(), 3_723_456);
        assert!(collector.is_empty());
    }

    #[test]
    fn short_forms() {
        let (reporter, _) = reporter();
        assert_eq!(parse_timecode("02:03.000", 0, &reporter).unwrap().millis(), 123_000);
        assert_eq!(parse_timecode("7", 0, &reporter).unwrap().millis(), 7_000);
    }

    #[test]
    fn fraction_is_literal_digits() {
        let (reporter, _) = reporter();
        assert_eq!(parse_timecode("00:00:01.42", 0, &reporter).unwrap().millis(), 1_042);
        assert_eq!(parse_timecode("00:00:01.5", 0, &reporter).unwrap().millis(), 1_005);
        assert_eq!(parse_timecode("00:00:01.500", 0, &reporter).unwrap().millis(), 1_500);
    }

    #[test]
    fn offset_is_added() {
        let (reporter, _) = reporter();
        assert_eq!(parse_timecode("00:00:01.000", 250, &reporter).unwrap().millis(), 1_250);
    }

    #[test]
    fn invalid_timecodes_report() {
        let (reporter, collector) = reporter();
        for text in ["1.2.3", "1:2:3:4", "aa:00:01.000", "00:00:01.x", "", "00::01", "-1:00"] {
            assert!(parse_timecode(text, 0, &reporter).is_none(), "{text}");
        }
        assert_eq!(collector.count_kind(IssueKind::InvalidTimecode), 7);
    }

    #[test]
    fn negative_result_reports() {
        let (reporter, collector) = reporter();
        assert!(parse_timecode("00:00:01.000", -5_000, &reporter).is_none());
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn overflow_reports() {
        let (reporter, collector) = reporter();
        assert!(parse_timecode("99999999999999999:00:00", 0, &reporter).is_none());
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn timing_line_fields() {
        let (reporter, collector) = reporter();
        let timing =
            parse_timing_line("00:00:01.000 --> 00:00:02.500 align:start", 0, &reporter).unwrap();
        assert_eq!(timing.start, Some(TimeCode::from_millis(1_000)));
        assert_eq!(timing.end, Some(TimeCode::from_millis(2_500)));
        assert_eq!(timing.trailing, "align:start");
        assert!(collector.is_empty());
    }

    #[test]
    fn timing_line_shape() {
        let (reporter, collector) = reporter();
        assert!(parse_timing_line("not a timing line", 0, &reporter).is_none());
        assert!(parse_timing_line("00:01 -> 00:02", 0, &reporter).is_none());
        assert!(collector.is_empty());
        assert!(is_timing_line("00:01.000 --> 00:02.000"));
        assert!(!is_timing_line("Hello"));
    }

    #[test]
    fn timing_line_with_bad_field() {
        let (reporter, collector) = reporter();
        let timing = parse_timing_line("00:0x:01.000 --> 00:00:02.000", 0, &reporter).unwrap();
        assert_eq!(timing.start, None);
        assert_eq!(timing.end, Some(TimeCode::from_millis(2_000)));
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn inline_timestamps() {
        assert_eq!(
            parse_inline_timestamp("00:00:05.250", 0),
            Some(Ok(TimeCode::from_millis(5_250)))
        );
        assert_eq!(
            parse_inline_timestamp("01:02.003", 0),
            Some(Ok(TimeCode::from_millis(62_003)))
        );
        assert_eq!(parse_inline_timestamp("b", 0), None);
        assert_eq!(parse_inline_timestamp("00:05", 0), None);
        assert_eq!(parse_inline_timestamp("1.5", 0), None);
    }

    #[test]
    fn inline_timestamps_take_the_offset() {
        assert_eq!(
            parse_inline_timestamp("00:02.000", 10_000),
            Some(Ok(TimeCode::from_millis(12_000)))
        );
        assert!(matches!(parse_inline_timestamp("00:02.000", -5_000), Some(Err(_))));
        assert_eq!(parse_inline_timestamp("0a:02.000", -5_000), None);
    }

    #[test]
    fn comma_fractions_leave_settings_alone() {
        let (reporter, collector) = reporter();
        let timing = parse_timing_line_with(
            "00:00:01,000 --> 00:00:02,500 note:a,b",
            FractionSeparator::DotOrComma,
            0,
            &reporter,
        )
        .unwrap();
        assert_eq!(timing.start, Some(TimeCode::from_millis(1_000)));
        assert_eq!(timing.end, Some(TimeCode::from_millis(2_500)));
        assert_eq!(timing.trailing, "note:a,b");
        assert!(collector.is_empty());

        let timing = parse_timing_line("00:01,000 --> 00:02.000", 0, &reporter).unwrap();
        assert_eq!(timing.start, None);
        assert_eq!(collector.count_kind(IssueKind::InvalidTimecode), 1);
    }

    #[test]
    fn cue_settings() {
        let (reporter, collector) = reporter();
        let settings = parse_cue_settings("align:start line:10% bogus :x", &reporter);
        assert_eq!(
            settings,
            vec![
                ("align".to_string(), "start".to_string()),
                ("line".to_string(), "10%".to_string()),
            ]
        );
        assert_eq!(collector.count_kind(IssueKind::InvalidCueSetting), 2);
    }
}
