//! Cue, line and text-span types
//!
//! A cue owns its lines and a line owns its spans. The plain-text projection
//! of a line is the concatenation of its span texts, computed on demand.

use crate::timecode::TimeCode;

bitflags::bitflags! {
    /// Text formatting applied to a span
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TextFormatting: u8 {
        /// Bold text formatting
        const BOLD = 1 << 0;
        /// Italic text formatting
        const ITALIC = 1 << 1;
        /// Underline text formatting
        const UNDERLINE = 1 << 2;
        /// Strike-through text formatting
        const STRIKE_OUT = 1 << 3;
    }
}

/// Accumulated style of a span
///
/// Collected from every element between the span and the tree root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleProperties {
    /// Bold / italic / underline / strike-out
    pub formatting: TextFormatting,
    /// Class names, outermost element first
    pub classes: Vec<String>,
    /// Font color, as written in the markup
    pub color: Option<String>,
    /// Font face, as written in the markup
    pub font_face: Option<String>,
    /// Span is ruby text rather than base text
    pub ruby_text: bool,
}

impl StyleProperties {
    /// Check if no styling applies
    #[must_use]
    pub fn is_plain(&self) -> bool {
        self.formatting.is_empty()
            && self.classes.is_empty()
            && self.color.is_none()
            && self.font_face.is_none()
            && !self.ruby_text
    }
}

/// Voice or language metadata carried by a span
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagAnnotation {
    /// Speaker name from a voice tag
    Voice(String),
    /// Language tag from a language span
    Lang(String),
}

/// One run of text within a line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextSpan {
    /// Unstyled text
    Plain(String),
    /// Text with styling
    Styled {
        /// Span text
        text: String,
        /// Applied style
        style: StyleProperties,
    },
    /// Text inside a voice or language element
    Annotated {
        /// Span text
        text: String,
        /// Applied style
        style: StyleProperties,
        /// Innermost voice or language annotation
        annotation: TagAnnotation,
    },
}

impl TextSpan {
    /// Text of the span
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Styled { text, .. } | Self::Annotated { text, .. } => text,
        }
    }

    /// Style of the span, `None` for plain spans
    #[must_use]
    pub const fn style(&self) -> Option<&StyleProperties> {
        match self {
            Self::Plain(_) => None,
            Self::Styled { style, .. } | Self::Annotated { style, .. } => Some(style),
        }
    }

    /// Mutable access to the text, used when merging adjacent spans
    pub(crate) fn text_mut(&mut self) -> &mut String {
        match self {
            Self::Plain(text) | Self::Styled { text, .. } | Self::Annotated { text, .. } => text,
        }
    }

    /// Check whether `other` carries the same style and annotation
    pub(crate) fn same_format(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Plain(_), Self::Plain(_)) => true,
            (Self::Styled { style: a, .. }, Self::Styled { style: b, .. }) => a == b,
            (
                Self::Annotated {
                    style: a,
                    annotation: x,
                    ..
                },
                Self::Annotated {
                    style: b,
                    annotation: y,
                    ..
                },
            ) => a == b && x == y,
            _ => false,
        }
    }
}

/// Karaoke timestamp anchored in a line's plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InlineTimestamp {
    /// Characters of plain text preceding the timestamp
    pub offset: usize,
    /// Time at which the following text becomes active
    pub time: TimeCode,
}

/// A line of cue text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    /// Spans in reading order
    spans: Vec<TextSpan>,
    /// Inline timestamps in reading order
    timestamps: Vec<InlineTimestamp>,
}

impl Line {
    /// Create an empty line
    #[must_use]
    pub const fn new() -> Self {
        Self {
            spans: Vec::new(),
            timestamps: Vec::new(),
        }
    }

    /// Create a line holding one plain span
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            spans: vec![TextSpan::Plain(text.into())],
            timestamps: Vec::new(),
        }
    }

    /// Spans of the line
    #[must_use]
    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    /// Inline timestamps of the line
    #[must_use]
    pub fn timestamps(&self) -> &[InlineTimestamp] {
        &self.timestamps
    }

    /// Record a timestamp at the current end of the text
    pub fn push_timestamp(&mut self, time: TimeCode) {
        let offset = self.spans.iter().map(|span| span.text().chars().count()).sum();
        self.timestamps.push(InlineTimestamp { offset, time });
    }

    /// Append a span, merging it into the last one when formats match
    pub fn push(&mut self, span: TextSpan) {
        if span.text().is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.same_format(&span) => last.text_mut().push_str(span.text()),
            _ => self.spans.push(span),
        }
    }

    /// Concatenated text of all spans
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(TextSpan::text).collect()
    }

    /// Check if the line has no text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|span| span.text().is_empty())
    }
}

/// One timed caption unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cue {
    /// Optional identifier
    id: Option<String>,
    /// Start time, unset when the timing was not interpretable
    start: Option<TimeCode>,
    /// End time, unset when the timing was not interpretable
    end: Option<TimeCode>,
    /// Text lines
    lines: Vec<Line>,
    /// Ordered key/value settings
    settings: Vec<(String, String)>,
}

impl Cue {
    /// Create a cue from its parts
    #[must_use]
    pub const fn new(
        id: Option<String>,
        start: Option<TimeCode>,
        end: Option<TimeCode>,
        lines: Vec<Line>,
        settings: Vec<(String, String)>,
    ) -> Self {
        Self {
            id,
            start,
            end,
            lines,
            settings,
        }
    }

    /// Identifier, if any
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Start time
    #[must_use]
    pub const fn start(&self) -> Option<TimeCode> {
        self.start
    }

    /// End time
    #[must_use]
    pub const fn end(&self) -> Option<TimeCode> {
        self.end
    }

    /// Text lines
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Settings in source order
    #[must_use]
    pub fn settings(&self) -> &[(String, String)] {
        &self.settings
    }

    /// Look up a setting by key
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// End minus start, when both are set
    #[must_use]
    pub fn duration(&self) -> Option<TimeCode> {
        Some(self.end? - self.start?)
    }

    /// Inline timestamps of every line, in reading order
    #[must_use]
    pub fn timestamps(&self) -> impl Iterator<Item = TimeCode> + '_ {
        self.lines
            .iter()
            .flat_map(|line| line.timestamps.iter().map(|mark| mark.time))
    }

    /// Plain text of all lines joined with `\n`
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(Line::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
