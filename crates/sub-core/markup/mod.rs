//! Inline cue-text markup
//!
//! Cue text is parsed into a [`MarkupNode`] tree rooted at an unnamed
//! [`Element`]. Every walk over the tree (plain-text projection, flattening
//! into [`Line`]s, drop) uses an explicit stack, so arbitrarily deep input
//! cannot exhaust the call stack.
//!
//! # Example
//!
//! ```rust
//! use sub_core::markup::{MarkupProfile, MarkupTreeParser};
//! use sub_core::parser::DiagnosticReporter;
//! use sub_core::Dialect;
//!
//! let reporter = DiagnosticReporter::new();
//! let parser = MarkupTreeParser::new(MarkupProfile::for_dialect(Dialect::WebVtt));
//! let tree = parser.parse("<v Roger>Hello &amp; welcome</v>", &reporter);
//! assert_eq!(tree.to_plain_text(), "Hello & welcome");
//! ```

pub mod entities;
pub mod parser;
pub mod profile;
pub mod source_map;

pub use parser::{MarkupTreeParser, DEFAULT_MAX_NESTING_DEPTH};
pub use profile::{AnnotationRule, MarkupProfile, TagRule};
pub use source_map::SourceMap;

use crate::document::{Line, StyleProperties, TagAnnotation, TextFormatting, TextSpan};
use crate::timecode::TimeCode;

/// Node of a parsed cue-text tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    /// Entity-decoded text
    Leaf(String),
    /// Tagged element
    Element(Element),
    /// Inline karaoke timestamp
    Timestamp(TimeCode),
}

/// Tagged element with its children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Normalized tag name, empty for the root
    pub name: String,
    /// Text after the tag name and classes (voice name, language, attributes)
    pub annotation: String,
    /// `.class` segments in source order
    pub classes: Vec<String>,
    /// Child nodes in source order
    pub children: Vec<MarkupNode>,
}

impl Element {
    /// Create an element with no children
    #[must_use]
    pub fn new(name: impl Into<String>, annotation: impl Into<String>, classes: Vec<String>) -> Self {
        Self {
            name: name.into(),
            annotation: annotation.into(),
            classes,
            children: Vec::new(),
        }
    }

    /// Create an unnamed root element
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Check if this is the unnamed root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// Concatenated text of every leaf, in document order
    #[must_use]
    pub fn to_plain_text(&self) -> String {
        let mut text = String::new();
        let mut stack: Vec<&MarkupNode> = self.children.iter().rev().collect();

        while let Some(node) = stack.pop() {
            match node {
                MarkupNode::Leaf(leaf) => text.push_str(leaf),
                MarkupNode::Element(element) => stack.extend(element.children.iter().rev()),
                MarkupNode::Timestamp(_) => {}
            }
        }

        text
    }

    /// Inline timestamps in document order
    #[must_use]
    pub fn timestamps(&self) -> Vec<TimeCode> {
        let mut found = Vec::new();
        let mut stack: Vec<&MarkupNode> = self.children.iter().rev().collect();

        while let Some(node) = stack.pop() {
            match node {
                MarkupNode::Timestamp(time) => found.push(*time),
                MarkupNode::Element(element) => stack.extend(element.children.iter().rev()),
                MarkupNode::Leaf(_) => {}
            }
        }

        found
    }

    /// Maximum element depth below this element
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Self, usize)> = vec![(self, 0)];

        while let Some((element, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for child in &element.children {
                if let MarkupNode::Element(child) = child {
                    stack.push((child, depth + 1));
                }
            }
        }

        deepest
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = core::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let MarkupNode::Element(mut element) = node {
                pending.append(&mut element.children);
            }
        }
    }
}

/// Style and annotation inherited from enclosing elements
#[derive(Debug, Clone, Default)]
struct SpanContext {
    style: StyleProperties,
    annotation: Option<TagAnnotation>,
}

impl SpanContext {
    /// Context for the children of `element`
    fn enter(&self, element: &Element) -> Self {
        let mut next = self.clone();
        let style = &mut next.style;
        style.classes.extend(element.classes.iter().cloned());

        match element.name.as_str() {
            "b" => style.formatting |= TextFormatting::BOLD,
            "i" => style.formatting |= TextFormatting::ITALIC,
            "u" => style.formatting |= TextFormatting::UNDERLINE,
            "s" => style.formatting |= TextFormatting::STRIKE_OUT,
            "rt" => style.ruby_text = true,
            "v" => next.annotation = Some(TagAnnotation::Voice(element.annotation.clone())),
            "lang" => next.annotation = Some(TagAnnotation::Lang(element.annotation.clone())),
            "font" | "span" => {
                for (key, value) in parse_attributes(&element.annotation) {
                    match key.to_ascii_lowercase().as_str() {
                        "color" => style.color = Some(value),
                        "face" => style.font_face = Some(value),
                        "class" => style.classes.extend(value.split_whitespace().map(String::from)),
                        _ => {}
                    }
                }
            }
            _ => {}
        }

        next
    }

    fn span(&self, text: &str) -> TextSpan {
        let text = text.to_string();
        match &self.annotation {
            Some(annotation) => TextSpan::Annotated {
                text,
                style: self.style.clone(),
                annotation: annotation.clone(),
            },
            None if self.style.is_plain() => TextSpan::Plain(text),
            None => TextSpan::Styled {
                text,
                style: self.style.clone(),
            },
        }
    }
}

/// Flatten a tree into lines of styled spans
///
/// Leaf text is split on `\n` into separate lines. Style accumulates down the
/// element path; the innermost voice or language annotation wins. Inline
/// timestamps are kept on the line they appear in.
#[must_use]
pub fn flatten_lines(root: &Element) -> Vec<Line> {
    let mut lines = vec![Line::new()];
    let base = SpanContext::default();
    let mut stack: Vec<(&MarkupNode, SpanContext)> = root
        .children
        .iter()
        .rev()
        .map(|node| (node, base.clone()))
        .collect();

    while let Some((node, context)) = stack.pop() {
        match node {
            MarkupNode::Leaf(text) => {
                for (index, piece) in text.split('\n').enumerate() {
                    if index > 0 {
                        lines.push(Line::new());
                    }
                    if let Some(line) = lines.last_mut() {
                        line.push(context.span(piece));
                    }
                }
            }
            MarkupNode::Element(element) => {
                let inner = context.enter(element);
                for child in element.children.iter().rev() {
                    stack.push((child, inner.clone()));
                }
            }
            MarkupNode::Timestamp(time) => {
                if let Some(line) = lines.last_mut() {
                    line.push_timestamp(*time);
                }
            }
        }
    }

    lines
}

/// Split `key=value` attribute text, accepting quoted and bare values
fn parse_attributes(text: &str) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        rest = rest[key_end..].trim_start();

        let Some(after_eq) = rest.strip_prefix('=') else {
            if !key.is_empty() {
                attributes.push((key.to_string(), String::new()));
            }
            continue;
        };
        let after_eq = after_eq.trim_start();

        let (value, remaining) = match after_eq.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &after_eq[1..];
                match body.find(quote) {
                    Some(end) => (&body[..end], &body[end + 1..]),
                    None => (body, ""),
                }
            }
            _ => {
                let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            }
        };

        if !key.is_empty() {
            attributes.push((key.to_string(), value.to_string()));
        }
        rest = remaining.trim_start();
    }

    attributes
}
