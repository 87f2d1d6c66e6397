//! Single-pass cue-text tree parser with recovery
//!
//! The parser walks the text once, keeping open elements on an explicit
//! stack. Every deviation is reported through the [`DiagnosticReporter`] and
//! the parser carries on; no input character is discarded; malformed
//! constructs end up as literal leaf text.

use super::entities;
use super::profile::{AnnotationRule, MarkupProfile};
use super::source_map::SourceMap;
use super::{Element, MarkupNode};
use crate::parser::errors::{IssueKind, IssueSeverity, Position};
use crate::parser::reporter::DiagnosticReporter;
use crate::parser::timing::parse_inline_timestamp;

/// Default bound on open-element depth
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Cue-text parser bound to one markup profile
#[derive(Debug, Clone, Copy)]
pub struct MarkupTreeParser<'p> {
    /// Tag table in use
    profile: &'p MarkupProfile,
    /// Maximum number of simultaneously open elements
    max_depth: usize,
    /// Milliseconds added to inline timestamps
    offset: i64,
}

impl<'p> MarkupTreeParser<'p> {
    /// Create a parser for `profile` with the default depth bound
    #[must_use]
    pub const fn new(profile: &'p MarkupProfile) -> Self {
        Self {
            profile,
            max_depth: DEFAULT_MAX_NESTING_DEPTH,
            offset: 0,
        }
    }

    /// Set the maximum element depth
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Shift inline timestamps by `offset` milliseconds
    #[must_use]
    pub const fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Parse the cue text of the line the reporter's cursor is on
    ///
    /// Always returns a usable tree; every problem found on the way is
    /// reported through `reporter`.
    #[must_use]
    pub fn parse(&self, text: &str, reporter: &DiagnosticReporter) -> Element {
        let origin = SourceMap::line_start(reporter.position().line);
        self.parse_mapped(text, &origin, reporter)
    }

    /// Parse cue text whose source positions are given by `origin`
    ///
    /// Each issue is stamped with the position of the construct that caused
    /// it.
    #[must_use]
    pub fn parse_mapped(
        &self,
        text: &str,
        origin: &SourceMap,
        reporter: &DiagnosticReporter,
    ) -> Element {
        let mut builder = TreeBuilder::new(reporter, origin, text);
        let mut rest = text;

        while let Some(index) = rest.find(|c| matches!(c, '<' | '>' | '&')) {
            builder.push_text(&rest[..index]);
            let tail = &rest[index..];
            builder.offset = text.len() - tail.len();
            rest = match tail.as_bytes()[0] {
                b'<' => self.tag(tail, &mut builder),
                b'>' => {
                    builder.warn(IssueKind::StrayCloseBracket, "Stray '>' outside of a tag");
                    builder.push_text(">");
                    &tail[1..]
                }
                _ => self.entity(tail, &mut builder),
            };
        }
        builder.push_text(rest);
        builder.offset = text.len();

        builder.finish()
    }

    /// Handle a run starting with `<`, returning the input after it
    fn tag<'t>(&self, tail: &'t str, builder: &mut TreeBuilder<'_>) -> &'t str {
        let after = &tail[1..];
        let limit = after.find('<').unwrap_or(after.len());

        let Some(end) = after[..limit].find('>') else {
            let literal = &tail[..=limit];
            if after.starts_with('/') {
                builder.error(
                    IssueKind::DisclosedTag,
                    format!("Close tag '{}' is missing its '>'", literal.trim_end()),
                );
            } else {
                builder.error(
                    IssueKind::MalformedTag,
                    format!("Tag '{}' is missing its '>'", literal.trim_end()),
                );
            }
            builder.push_text(literal);
            return &after[limit..];
        };

        let body = &after[..end];
        let raw = &tail[..end + 2];

        if let Some(name) = body.strip_prefix('/') {
            self.close_tag(name.trim(), raw, builder);
        } else if let Some(time) = parse_inline_timestamp(body, self.offset) {
            if !self.profile.supports_timestamps() {
                builder.warn(
                    IssueKind::UnsupportedTimestamp,
                    format!("Inline timestamp {raw} is not supported here"),
                );
            }
            match time {
                Ok(time) => builder.push_node(MarkupNode::Timestamp(time)),
                Err(reason) => builder.error(
                    IssueKind::InvalidTimecode,
                    format!(
                        "Inline timestamp {raw} with offset {}ms {reason}",
                        self.offset
                    ),
                ),
            }
        } else {
            self.start_tag(body, raw, builder);
        }

        &after[end + 1..]
    }

    /// Open an element for a start tag body
    fn start_tag(&self, body: &str, raw: &str, builder: &mut TreeBuilder<'_>) {
        let (body, self_closing) = match body.strip_suffix('/') {
            Some(inner) => (inner.trim_end(), true),
            None => (body, false),
        };

        let (head, annotation) = match body.find(char::is_whitespace) {
            Some(split) => (&body[..split], body[split..].trim()),
            None => (body, ""),
        };
        let mut segments = head.split('.');
        let name = segments.next().unwrap_or_default();

        if name.is_empty() || !name.chars().all(is_tag_name_char) {
            builder.error(IssueKind::MalformedTag, format!("Malformed tag {raw}"));
            builder.push_text(raw);
            return;
        }

        if builder.depth() >= self.max_depth {
            builder.error(
                IssueKind::NestingTooDeep,
                format!(
                    "Tag {raw} exceeds the nesting limit of {}",
                    self.max_depth
                ),
            );
            builder.push_text(raw);
            return;
        }

        let name = self.profile.normalize(name);
        let classes = segments
            .filter(|class| !class.is_empty())
            .map(String::from)
            .collect();

        match self.profile.rule(&name) {
            None => builder.warn(IssueKind::UnknownTag, format!("Unknown tag <{name}>")),
            Some(rule) => {
                match rule.annotation {
                    AnnotationRule::Required if annotation.is_empty() => builder.error(
                        IssueKind::MissingAnnotation,
                        format!("Tag <{name}> requires an annotation"),
                    ),
                    AnnotationRule::Forbidden if !annotation.is_empty() => builder.warn(
                        IssueKind::UnexpectedAnnotation,
                        format!("Tag <{name}> does not take an annotation, found '{annotation}'"),
                    ),
                    _ => {}
                }

                if let Some(parent) = rule.parent {
                    if builder.top_name() != parent {
                        builder.error(
                            IssueKind::MisplacedRubyText,
                            format!("Tag <{name}> must be a direct child of <{parent}>"),
                        );
                    }
                }
            }
        }

        builder.open(Element::new(name, annotation, classes));
        if self_closing {
            builder.close_top();
        }
    }

    /// Close the element matching a close tag, unwinding over unclosed ones
    fn close_tag(&self, name: &str, raw: &str, builder: &mut TreeBuilder<'_>) {
        let name = self.profile.normalize(name);

        let Some(target) = builder.find_open(&name) else {
            builder.error(
                IssueKind::DisclosedTag,
                format!("Close tag {raw} has no matching start tag"),
            );
            builder.push_text(raw);
            return;
        };

        while builder.depth() > target {
            builder.report_unclosed(&format!("before </{name}>"));
            builder.close_top();
        }
        builder.close_top();
    }

    /// Handle a run starting with `&`, returning the input after it
    fn entity<'t>(&self, tail: &'t str, builder: &mut TreeBuilder<'_>) -> &'t str {
        let after = &tail[1..];

        let (name_len, numeric) = match after.strip_prefix('#') {
            Some(number) => {
                let digits = number.strip_prefix(['x', 'X']).unwrap_or(number);
                let prefix = number.len() - digits.len();
                let run = if prefix > 0 {
                    digits.find(|c: char| !c.is_ascii_hexdigit())
                } else {
                    digits.find(|c: char| !c.is_ascii_digit())
                }
                .unwrap_or(digits.len());
                if run == 0 {
                    builder.push_text("&");
                    return after;
                }
                (1 + prefix + run, true)
            }
            None => {
                let run = after
                    .find(|c: char| !c.is_ascii_alphanumeric())
                    .unwrap_or(after.len());
                if run == 0 {
                    builder.push_text("&");
                    return after;
                }
                (run, false)
            }
        };

        let name = &after[..name_len];
        let rest = &after[name_len..];
        let terminated = rest.starts_with(';');
        let decoded = if numeric {
            entities::decode_numeric(&name[1..])
        } else if self.profile.entities_ignore_case() {
            entities::lookup_ignore_case(name)
        } else {
            entities::lookup(name)
        };

        match (decoded, terminated) {
            (Some(c), true) => {
                builder.push_char(c);
                &rest[1..]
            }
            (Some(_), false) => {
                builder.warn(
                    IssueKind::UnterminatedEntity,
                    format!("Entity '&{name}' is missing its ';'"),
                );
                builder.push_text(&tail[..=name_len]);
                rest
            }
            (None, _) => {
                let consumed = 1 + name_len + usize::from(terminated);
                builder.warn(
                    IssueKind::UnknownEntity,
                    format!("Unknown entity '{}'", &tail[..consumed]),
                );
                builder.push_text(&tail[..consumed]);
                &tail[consumed..]
            }
        }
    }
}

/// Characters allowed in tag names
fn is_tag_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Open element paired with where it was opened
struct OpenElement {
    element: Element,
    opened_at: Position,
}

/// Mutable state of one parse
struct TreeBuilder<'r> {
    /// Open elements; index 0 is the root and is never popped
    stack: Vec<OpenElement>,
    /// Literal text not yet attached to the tree
    pending: String,
    reporter: &'r DiagnosticReporter,
    origin: &'r SourceMap,
    /// Text being parsed
    text: &'r str,
    /// Byte offset of the construct being handled
    offset: usize,
}

impl<'r> TreeBuilder<'r> {
    fn new(reporter: &'r DiagnosticReporter, origin: &'r SourceMap, text: &'r str) -> Self {
        Self {
            stack: vec![OpenElement {
                element: Element::root(),
                opened_at: origin.locate(text, 0),
            }],
            pending: String::new(),
            reporter,
            origin,
            text,
            offset: 0,
        }
    }

    /// Source position of the construct being handled
    fn position(&self) -> Position {
        self.origin.locate(self.text, self.offset)
    }

    fn warn(&self, kind: IssueKind, message: impl Into<String>) {
        self.reporter
            .report_at(IssueSeverity::Warning, kind, message, self.position());
    }

    fn error(&self, kind: IssueKind, message: impl Into<String>) {
        self.reporter
            .report_at(IssueSeverity::Error, kind, message, self.position());
    }

    /// Number of open elements below the root
    fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    fn top_name(&self) -> &str {
        self.stack
            .last()
            .map_or("", |open| open.element.name.as_str())
    }

    /// Stack index of the innermost open element named `name`
    fn find_open(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        (1..self.stack.len())
            .rev()
            .find(|&index| self.stack[index].element.name == name)
    }

    fn push_text(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    fn push_char(&mut self, c: char) {
        self.pending.push(c);
    }

    /// Attach pending text to the innermost open element
    fn flush_text(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = core::mem::take(&mut self.pending);
        if let Some(top) = self.stack.last_mut() {
            top.element.children.push(MarkupNode::Leaf(text));
        }
    }

    fn push_node(&mut self, node: MarkupNode) {
        self.flush_text();
        if let Some(top) = self.stack.last_mut() {
            top.element.children.push(node);
        }
    }

    fn open(&mut self, element: Element) {
        self.flush_text();
        self.stack.push(OpenElement {
            element,
            opened_at: self.position(),
        });
    }

    /// Pop the innermost open element into its parent
    fn close_top(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        self.flush_text();
        if let Some(open) = self.stack.pop() {
            self.push_node(MarkupNode::Element(open.element));
        }
    }

    fn report_unclosed(&self, context: &str) {
        if let Some(open) = self.stack.last() {
            self.error(
                IssueKind::UnclosedTag,
                format!(
                    "Tag <{}> opened at {} is not closed {context}",
                    open.element.name, open.opened_at
                ),
            );
        }
    }

    /// Close everything still open and return the root
    fn finish(mut self) -> Element {
        while self.depth() > 0 {
            self.report_unclosed("at end of text");
            self.close_top();
        }
        self.flush_text();
        self.stack
            .pop()
            .map_or_else(Element::root, |open| open.element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::reporter::IssueCollector;
    use crate::timecode::TimeCode;
    use crate::Dialect;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn parse(dialect: Dialect, text: &str) -> (Element, Rc<IssueCollector>) {
        let collector = Rc::new(IssueCollector::new());
        let mut reporter = DiagnosticReporter::new();
        reporter.add_listener(collector.clone());
        let tree = MarkupTreeParser::new(MarkupProfile::for_dialect(dialect)).parse(text, &reporter);
        (tree, collector)
    }

    fn kinds(collector: &IssueCollector) -> Vec<IssueKind> {
        collector.issues().iter().map(|issue| issue.kind).collect()
    }

    #[test]
    fn well_formed_markup_is_silent() {
        let (tree, collector) = parse(Dialect::Srt, "plain text<b>bold text</b> end text");
        assert!(collector.is_empty());
        assert_eq!(tree.to_plain_text(), "plain textbold text end text");
        assert_eq!(tree.children.len(), 3);
    }

    #[test]
    fn close_tag_without_bracket() {
        let (tree, collector) = parse(Dialect::Srt, "plain text<b>bold text</b end text");
        assert_eq!(
            kinds(&collector),
            vec![IssueKind::DisclosedTag, IssueKind::UnclosedTag]
        );
        assert_eq!(tree.to_plain_text(), "plain textbold text</b end text");
    }

    #[test]
    fn known_entities_decode() {
        let (tree, collector) = parse(Dialect::Srt, "plain &lt; &gt; &nbsp; end text");
        assert!(collector.is_empty());
        assert_eq!(tree.to_plain_text(), "plain < > \u{a0} end text");
    }

    #[test]
    fn unknown_entity_reported_once() {
        let (tree, collector) = parse(Dialect::Srt, "plain &lt; &gt; &nb");
        assert_eq!(kinds(&collector), vec![IssueKind::UnknownEntity]);
        assert_eq!(tree.to_plain_text(), "plain < > &nb");
    }

    #[test]
    fn unterminated_entity_kept() {
        let (tree, collector) = parse(Dialect::Srt, "a &amp b");
        assert_eq!(kinds(&collector), vec![IssueKind::UnterminatedEntity]);
        assert_eq!(tree.to_plain_text(), "a &amp b");
    }

    #[test]
    fn bare_ampersand_is_literal() {
        let (tree, collector) = parse(Dialect::Srt, "salt & pepper &#; &");
        assert!(collector.is_empty());
        assert_eq!(tree.to_plain_text(), "salt & pepper &#; &");
    }

    #[test]
    fn numeric_entities() {
        let (tree, collector) = parse(Dialect::WebVtt, "&#65;&#x42;&#99999999;");
        assert_eq!(kinds(&collector), vec![IssueKind::UnknownEntity]);
        assert_eq!(tree.to_plain_text(), "AB&#99999999;");
    }

    #[test]
    fn start_tag_without_bracket() {
        let (tree, collector) = parse(Dialect::Srt, "a <b bold text");
        assert_eq!(kinds(&collector), vec![IssueKind::MalformedTag]);
        assert_eq!(tree.to_plain_text(), "a <b bold text");
    }

    #[test]
    fn stray_close_bracket() {
        let (tree, collector) = parse(Dialect::Srt, "a > b");
        assert_eq!(kinds(&collector), vec![IssueKind::StrayCloseBracket]);
        assert_eq!(tree.to_plain_text(), "a > b");
    }

    #[test]
    fn unknown_tag_accepted() {
        let (tree, collector) = parse(Dialect::Srt, "<blink>x</blink>");
        assert_eq!(kinds(&collector), vec![IssueKind::UnknownTag]);
        match &tree.children[0] {
            MarkupNode::Element(element) => assert_eq!(element.name, "blink"),
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn srt_tags_are_case_insensitive() {
        let (tree, collector) = parse(Dialect::Srt, "<I>x</i>");
        assert!(collector.is_empty());
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn voice_requires_annotation() {
        let (tree, collector) = parse(Dialect::WebVtt, "<v>hi</v> <v.loud Ann>yo</v>");
        assert_eq!(kinds(&collector), vec![IssueKind::MissingAnnotation]);
        let MarkupNode::Element(second) = &tree.children[2] else {
            panic!("expected element");
        };
        assert_eq!(second.annotation, "Ann");
        assert_eq!(second.classes, vec!["loud".to_string()]);
    }

    #[test]
    fn unexpected_annotation() {
        let (_, collector) = parse(Dialect::WebVtt, "<b foo>x</b>");
        assert_eq!(kinds(&collector), vec![IssueKind::UnexpectedAnnotation]);
    }

    #[test]
    fn ruby_text_placement() {
        let (_, collector) = parse(Dialect::WebVtt, "<ruby>base<rt>top</rt></ruby>");
        assert!(collector.is_empty());

        let (tree, collector) = parse(Dialect::WebVtt, "<rt>top</rt>");
        assert_eq!(kinds(&collector), vec![IssueKind::MisplacedRubyText]);
        assert_eq!(tree.to_plain_text(), "top");
    }

    #[test]
    fn mismatched_close_unwinds() {
        let (tree, collector) = parse(Dialect::WebVtt, "<b><i><u>x</b>y");
        assert_eq!(
            kinds(&collector),
            vec![IssueKind::UnclosedTag, IssueKind::UnclosedTag]
        );
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.to_plain_text(), "xy");
    }

    #[test]
    fn unmatched_close_is_literal() {
        let (tree, collector) = parse(Dialect::WebVtt, "a</i>b");
        assert_eq!(kinds(&collector), vec![IssueKind::DisclosedTag]);
        assert_eq!(tree.to_plain_text(), "a</i>b");
    }

    #[test]
    fn inline_timestamps() {
        let (tree, collector) = parse(Dialect::WebVtt, "one <00:00:01.500>two");
        assert!(collector.is_empty());
        assert_eq!(tree.timestamps(), vec![TimeCode::from_millis(1_500)]);
        assert_eq!(tree.to_plain_text(), "one two");

        let (tree, collector) = parse(Dialect::Srt, "one <00:00:01.500>two");
        assert_eq!(kinds(&collector), vec![IssueKind::UnsupportedTimestamp]);
        assert_eq!(tree.timestamps().len(), 1);
    }

    #[test]
    fn inline_timestamps_are_shifted() {
        let reporter = DiagnosticReporter::new();
        let parser = MarkupTreeParser::new(MarkupProfile::for_dialect(Dialect::WebVtt))
            .with_offset(10_000);
        let tree = parser.parse("one <00:02.000>two", &reporter);
        assert_eq!(tree.timestamps(), vec![TimeCode::from_millis(12_000)]);
    }

    #[test]
    fn shifted_before_zero_is_reported() {
        let collector = Rc::new(IssueCollector::new());
        let mut reporter = DiagnosticReporter::new();
        reporter.add_listener(collector.clone());
        let parser = MarkupTreeParser::new(MarkupProfile::for_dialect(Dialect::WebVtt))
            .with_offset(-5_000);

        let tree = parser.parse("a <00:02.000>b", &reporter);
        assert_eq!(kinds(&collector), vec![IssueKind::InvalidTimecode]);
        assert!(tree.timestamps().is_empty());
        assert_eq!(tree.to_plain_text(), "a b");
    }

    #[test]
    fn issues_point_at_the_construct() {
        let collector = Rc::new(IssueCollector::new());
        let mut reporter = DiagnosticReporter::new();
        reporter.add_listener(collector.clone());
        let parser = MarkupTreeParser::new(MarkupProfile::for_dialect(Dialect::Srt));

        let origin = SourceMap::line_start(4);
        let _ = parser.parse_mapped("ok <blink>x</blink> &zz;", &origin, &reporter);
        let positions: Vec<_> = collector.issues().iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![Position::new(4, 4), Position::new(4, 21)]);
    }

    #[test]
    fn unclosed_tag_names_where_it_opened() {
        let collector = Rc::new(IssueCollector::new());
        let mut reporter = DiagnosticReporter::new();
        reporter.add_listener(collector.clone());
        let parser = MarkupTreeParser::new(MarkupProfile::for_dialect(Dialect::Srt));

        let _ = parser.parse_mapped("a <i>b", &SourceMap::line_start(2), &reporter);
        let issues = collector.issues();
        assert_eq!(issues[0].kind, IssueKind::UnclosedTag);
        assert_eq!(issues[0].position, Position::new(2, 7));
        assert!(issues[0].message.contains("opened at 2:3"), "{}", issues[0].message);
    }

    #[test]
    fn sami_entities_ignore_case() {
        let (tree, collector) = parse(Dialect::Sami, "A&NBSP;B &Amp; C");
        assert!(collector.is_empty(), "{:?}", collector.issues());
        assert_eq!(tree.to_plain_text(), "A\u{a0}B & C");

        let (_, collector) = parse(Dialect::Srt, "A&NBSP;B");
        assert_eq!(kinds(&collector), vec![IssueKind::UnknownEntity]);
    }

    #[test]
    fn nesting_limit() {
        let collector = Rc::new(IssueCollector::new());
        let mut reporter = DiagnosticReporter::new();
        reporter.add_listener(collector.clone());
        let parser =
            MarkupTreeParser::new(MarkupProfile::for_dialect(Dialect::Srt)).with_max_depth(2);

        let tree = parser.parse("<b><i><u>x</u></i></b>", &reporter);
        assert_eq!(
            kinds(&collector),
            vec![IssueKind::NestingTooDeep, IssueKind::DisclosedTag]
        );
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.to_plain_text(), "<u>x</u>");
    }

    #[test]
    fn self_closing_tag() {
        let (tree, collector) = parse(Dialect::Sami, "a<span/>b");
        assert!(collector.is_empty());
        assert_eq!(tree.children.len(), 3);
    }

    #[test]
    fn empty_input() {
        let (tree, collector) = parse(Dialect::WebVtt, "");
        assert!(collector.is_empty());
        assert!(tree.children.is_empty());
    }

    #[test]
    fn lone_open_bracket() {
        let (tree, collector) = parse(Dialect::Srt, "1 < 2 <");
        assert_eq!(
            kinds(&collector),
            vec![IssueKind::MalformedTag, IssueKind::MalformedTag]
        );
        assert_eq!(tree.to_plain_text(), "1 < 2 <");
    }
}
