//! End-to-end parsing tests for the three supported dialects.
//!
//! Each test drives the public [`SubtitleParser`] entry point and checks the
//! resulting document together with the diagnostics a listener received.

use std::io::Cursor;
use std::rc::Rc;

use sub_core::parser::{
    IssueCollector, IssueCounter, IssueKind, IssueSeverity, LogListener, StrictnessTable,
};
use sub_core::{Dialect, ParseError, ParseOptions, Property, SubtitleParser, TimeCode};

fn collecting(options: ParseOptions) -> (SubtitleParser, Rc<IssueCollector>) {
    let collector = Rc::new(IssueCollector::new());
    let mut parser = SubtitleParser::with_options(options);
    parser.add_listener(collector.clone());
    (parser, collector)
}

fn millis(time: Option<TimeCode>) -> Option<i64> {
    time.map(TimeCode::millis)
}

mod srt {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_CUES: &str = "1\n00:00:01,000 --> 00:00:02,000\nFirst\n\n2\n00:00:03,000 --> 00:00:04,500\nSecond\nline";

    #[test]
    fn test_cue_count_without_trailing_newline() {
        let (parser, collector) = collecting(ParseOptions::new(Dialect::Srt));
        let doc = parser.parse(Cursor::new(TWO_CUES)).unwrap();

        assert_eq!(doc.cue_count(), 2);
        assert!(collector.is_empty(), "{:?}", collector.issues());
        assert_eq!(doc.cues()[1].plain_text(), "Second\nline");
        assert_eq!(millis(doc.cues()[1].end()), Some(4_500));
    }

    #[test]
    fn test_cue_count_with_trailing_blank_lines() {
        let (parser, _) = collecting(ParseOptions::new(Dialect::Srt));
        let text = format!("{TWO_CUES}\n\n\n");
        let doc = parser.parse_str(&text).unwrap();
        assert_eq!(doc.cue_count(), 2);
    }

    #[test]
    fn test_crlf_line_endings() {
        let (parser, collector) = collecting(ParseOptions::new(Dialect::Srt));
        let doc = parser
            .parse_str("1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\n\r\n")
            .unwrap();
        assert!(collector.is_empty(), "{:?}", collector.issues());
        assert_eq!(doc.cues()[0].plain_text(), "Hello");
    }

    #[test]
    fn test_fraction_digits_are_literal() {
        let (parser, _) = collecting(ParseOptions::new(Dialect::Srt));
        let doc = parser.parse_str("1\n00:00:01,42 --> 00:00:02,5\nA\n").unwrap();
        assert_eq!(millis(doc.cues()[0].start()), Some(1_042));
        assert_eq!(millis(doc.cues()[0].end()), Some(2_005));
    }

    #[test]
    fn test_recovers_after_bad_cue() {
        let (parser, collector) = collecting(ParseOptions::new(Dialect::Srt));
        let doc = parser
            .parse_str("x\n00:00:01,000 --> 00:00:0a,000\nA\n\n2\n00:00:03,000 --> 00:00:04,000\nB\n")
            .unwrap();

        assert_eq!(doc.cue_count(), 2);
        assert_eq!(collector.count_kind(IssueKind::InvalidLabel), 1);
        assert_eq!(collector.count_kind(IssueKind::InvalidTimecode), 1);
        assert_eq!(millis(doc.cues()[0].start()), Some(1_000));
        assert_eq!(doc.cues()[0].end(), None);
        assert_eq!(millis(doc.cues()[1].start()), Some(3_000));
    }

    #[test]
    fn test_negative_offset_is_reported() {
        let (parser, collector) = collecting(ParseOptions::new(Dialect::Srt));
        let doc = parser
            .parse_with_offset(Cursor::new("1\n00:00:01,000 --> 00:00:05,000\nA\n"), -2_000)
            .unwrap();
        assert_eq!(collector.count_kind(IssueKind::InvalidTimecode), 1);
        assert_eq!(doc.cues()[0].start(), None);
        assert_eq!(millis(doc.cues()[0].end()), Some(3_000));
    }

    #[test]
    fn test_lenient_mode_softens_markup_issues() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\n<blink>A</blink> &foo;\n";

        let counter = Rc::new(IssueCounter::new());
        let mut parser = SubtitleParser::new(Dialect::Srt);
        parser.add_listener(counter.clone());

        parser.parse_with_strict(Cursor::new(text), 0, true).unwrap();
        assert_eq!(counter.count(IssueSeverity::Warning), 2);

        let counter = Rc::new(IssueCounter::new());
        let mut parser = SubtitleParser::new(Dialect::Srt);
        parser.add_listener(counter.clone());

        parser.parse_with_strict(Cursor::new(text), 0, false).unwrap();
        assert_eq!(counter.count(IssueSeverity::Info), 1);
        assert_eq!(counter.total(), 1);
    }

    #[test]
    fn test_empty_strictness_table_keeps_severities() {
        let options = ParseOptions::new(Dialect::Srt).with_strictness(StrictnessTable::empty());
        let (parser, collector) = collecting(options);
        parser
            .parse_str("1\n00:00:01,000 --> 00:00:02,000\n<blink>A</blink>\n")
            .unwrap();
        assert_eq!(collector.count_kind(IssueKind::UnknownTag), 1);
    }

    #[test]
    fn test_formatting_spans_survive() {
        let (parser, _) = collecting(ParseOptions::new(Dialect::Srt));
        let doc = parser
            .parse_str("1\n00:00:01,000 --> 00:00:02,000\nplain <b>bold</b> <font color=\"#ff0000\">red</font>\n")
            .unwrap();
        let spans = doc.cues()[0].lines()[0].spans();
        let texts: Vec<_> = spans.iter().map(|span| span.text()).collect();
        assert_eq!(texts, vec!["plain ", "bold", " ", "red"]);
        let color = spans[3].style().and_then(|style| style.color.as_deref());
        assert_eq!(color, Some("#ff0000"));
    }
}

mod sami {
    use super::*;
    use pretty_assertions::assert_eq;

    const FILM: &str = "<SAMI>\n<HEAD>\n<TITLE>Demo</TITLE>\n</HEAD>\n<BODY>\n<SYNC Start=1000><P>One\n<SYNC Start=2500><P>&nbsp;\n<SYNC Start=4000><P>Two<br>lines\n</BODY>\n</SAMI>\n";

    #[test]
    fn test_end_times_are_inferred() {
        let (parser, collector) = collecting(ParseOptions::new(Dialect::Sami));
        let doc = parser.parse_str(FILM).unwrap();

        assert!(collector.is_empty(), "{:?}", collector.issues());
        assert_eq!(doc.property(Property::Title), Some("Demo"));
        let times: Vec<_> = doc
            .cues()
            .iter()
            .map(|cue| (millis(cue.start()), millis(cue.end())))
            .collect();
        assert_eq!(
            times,
            vec![(Some(1_000), Some(2_500)), (Some(4_000), Some(6_000))]
        );
        assert_eq!(doc.cues()[1].plain_text(), "Two\nlines");
    }

    #[test]
    fn test_malformed_sync_is_fatal() {
        let parser = SubtitleParser::new(Dialect::Sami);
        let err = parser
            .parse_str("<SAMI>\n<BODY>\n<SYNC Start=1000>a\n<SYNC Start=later>b\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::MalformedTiming { line: 4, .. }), "{err:?}");
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn test_bounded_duration() {
        let options = ParseOptions::new(Dialect::Sami).with_max_duration(1_000);
        let (parser, collector) = collecting(options);
        let doc = parser.parse_str(FILM).unwrap();
        assert_eq!(millis(doc.cues()[0].end()), Some(2_000));
        assert_eq!(millis(doc.cues()[1].end()), Some(5_000));
        assert_eq!(collector.count_kind(IssueKind::DurationClamped), 2);
    }
}

mod webvtt {
    use super::*;
    use pretty_assertions::assert_eq;

    const VTT: &str = "WEBVTT\nTitle: Sample\n\nSTYLE\n::cue(.loud) { font-weight: bold }\n\nintro\n00:00:01.000 --> 00:00:03.000 position:10% align:start\n<v Ann><c.loud>Hey</c></v> there\n\n00:04.000 --> 00:05.000\n<00:04.500>karaoke <00:04.800>style\n";

    #[test]
    fn test_blocks_and_settings() {
        let (parser, collector) = collecting(ParseOptions::new(Dialect::WebVtt));
        let doc = parser.parse_str(VTT).unwrap();

        assert!(collector.is_empty(), "{:?}", collector.issues());
        assert_eq!(doc.property(Property::Title), Some("Sample"));
        assert_eq!(doc.style_rules().len(), 1);
        assert_eq!(doc.style_rules()[0].declaration("font-weight"), Some("bold"));

        assert_eq!(doc.cue_count(), 2);
        let intro = &doc.cues()[0];
        assert_eq!(intro.id(), Some("intro"));
        assert_eq!(intro.setting("position"), Some("10%"));
        assert_eq!(intro.setting("align"), Some("start"));
        assert_eq!(intro.plain_text(), "Hey there");

        let karaoke = &doc.cues()[1];
        assert_eq!(karaoke.id(), None);
        assert_eq!(millis(karaoke.start()), Some(4_000));
        assert_eq!(karaoke.plain_text(), "karaoke style");
        assert_eq!(
            karaoke.timestamps().map(TimeCode::millis).collect::<Vec<_>>(),
            vec![4_500, 4_800]
        );
    }

    #[test]
    fn test_class_spans_are_kept() {
        let (parser, _) = collecting(ParseOptions::new(Dialect::WebVtt));
        let doc = parser.parse_str(VTT).unwrap();
        let first = &doc.cues()[0].lines()[0].spans()[0];
        let classes = first.style().map(|style| style.classes.clone()).unwrap_or_default();
        assert_eq!(first.text(), "Hey");
        assert_eq!(classes, vec!["loud".to_string()]);
    }

    #[test]
    fn test_latin1_source() {
        let options = ParseOptions::new(Dialect::WebVtt)
            .with_encoding(sub_core::TextEncoding::Latin1);
        let (parser, collector) = collecting(options);
        let doc = parser
            .parse(Cursor::new(b"WEBVTT\n\n00:01.000 --> 00:02.000\nna\xefve\n".to_vec()))
            .unwrap();
        assert!(collector.is_empty());
        assert_eq!(doc.cues()[0].plain_text(), "na\u{ef}ve");
    }

    #[test]
    fn test_diagnostics_are_ordered_by_line() {
        let (parser, collector) = collecting(ParseOptions::new(Dialect::WebVtt));
        parser
            .parse_str("WEBVTT\n\n00:01.000 --> 00:02.000 bogus\n<v>A\n\n00:03.000 --> soon\nB\n")
            .unwrap();
        let lines: Vec<_> = collector
            .issues()
            .iter()
            .map(|issue| issue.position.line)
            .collect();
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        assert_eq!(lines, sorted);
        assert_eq!(collector.count_kind(IssueKind::InvalidCueSetting), 1);
        assert_eq!(collector.count_kind(IssueKind::InvalidTimecode), 1);
    }

    #[test]
    fn test_log_listener_alongside_collector() {
        let _ = env_logger::builder().is_test(true).try_init();

        let (mut parser, collector) = collecting(ParseOptions::new(Dialect::WebVtt));
        parser.add_listener(Rc::new(LogListener));
        let doc = parser.parse_str("WEBVTT\n\n00:01.000 --> 00:02.000\n<v>who?</v>\n").unwrap();

        assert_eq!(doc.cue_count(), 1);
        assert_eq!(collector.count_kind(IssueKind::MissingAnnotation), 1);
    }
}
