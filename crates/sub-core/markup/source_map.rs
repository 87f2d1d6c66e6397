//! Byte offsets of cue text mapped back to source positions
//!
//! Cue text handed to the markup parser is rarely a verbatim slice of the
//! source: SAMI text is stitched together from fragments between structural
//! tags, and every dialect drops line terminators. A [`SourceMap`] records
//! where each stitched piece came from so markup diagnostics point at the
//! character that caused them.

use core::ops::Range;

use crate::parser::errors::Position;

/// Anchors pairing cue-text byte offsets with source positions
///
/// The position stored with an anchor is that of the source character just
/// before the anchored byte, matching the "last delivered character"
/// convention of the line source. The anchored character is therefore one
/// column to the right of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    /// `(byte offset, position)` pairs ordered by offset
    anchors: Vec<(usize, Position)>,
}

impl SourceMap {
    /// Create a map with no anchors, locating everything from `{0, 0}`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            anchors: Vec::new(),
        }
    }

    /// Map for text that begins right after `position`
    #[must_use]
    pub fn at(position: Position) -> Self {
        Self {
            anchors: vec![(0, position)],
        }
    }

    /// Map for text that is a whole source line
    #[must_use]
    pub fn line_start(line: usize) -> Self {
        Self::at(Position::new(line, 0))
    }

    /// Record that text from byte `offset` on begins right after `position`
    ///
    /// Offsets must not decrease; an anchor at the same offset replaces the
    /// previous one.
    pub fn anchor(&mut self, offset: usize, position: Position) {
        if self.anchors.last().is_some_and(|&(last, _)| last == offset) {
            self.anchors.pop();
        }
        self.anchors.push((offset, position));
    }

    /// Check if no anchor was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Source position of the character at byte `offset` of `text`
    ///
    /// Newlines between the governing anchor and `offset` advance the line.
    #[must_use]
    pub fn locate(&self, text: &str, offset: usize) -> Position {
        let index = self.anchors.partition_point(|&(start, _)| start <= offset);
        let (start, origin) = index
            .checked_sub(1)
            .map_or((0, Position::default()), |i| self.anchors[i]);

        let skipped = text.get(start..offset).unwrap_or_default();
        match skipped.rfind('\n') {
            Some(newline) => Position::new(
                origin.line + skipped.matches('\n').count(),
                skipped[newline + 1..].chars().count() + 1,
            ),
            None => Position::new(origin.line, origin.column + skipped.chars().count() + 1),
        }
    }

    /// Restrict the map to `range` of `text`, rebasing offsets to its start
    #[must_use]
    pub fn slice(&self, text: &str, range: Range<usize>) -> Self {
        let head = self.locate(text, range.start);
        let mut anchors = vec![(0, Position::new(head.line, head.column.saturating_sub(1)))];
        anchors.extend(
            self.anchors
                .iter()
                .filter(|&&(start, _)| start > range.start && start < range.end)
                .map(|&(start, position)| (start - range.start, position)),
        );
        Self { anchors }
    }
}
