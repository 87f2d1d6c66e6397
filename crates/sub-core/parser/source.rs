//! Position-tracking line source
//!
//! Wraps a byte stream and hands it out one decoded line at a time while
//! keeping line/column information for the last delivered character. The
//! position is published through a [`PositionCursor`] so the diagnostic
//! reporter can stamp issues without borrowing the source.

use std::cell::Cell;
use std::io::{self, BufRead};
use std::rc::Rc;

use super::errors::{ParseError, ParseResult, Position};
use crate::utils::encoding::{strip_utf8_bom, TextEncoding};

/// Shared, read-mostly view of the current source position
///
/// The line source is the only writer. Cloning the cursor shares it.
#[derive(Debug, Clone, Default)]
pub struct PositionCursor {
    /// Position of the last delivered character
    inner: Rc<Cell<Position>>,
}

impl PositionCursor {
    /// Create a cursor at `{0, 0}`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position
    #[must_use]
    pub fn get(&self) -> Position {
        self.inner.get()
    }

    /// Publish a new position
    pub fn set(&self, position: Position) {
        self.inner.set(position);
    }
}

/// Line-buffered reader with line/column tracking
///
/// Lines are terminated by `\n`, `\r\n` or a lone `\r`; terminators are not
/// part of the returned text. A leading UTF-8 BOM is dropped. NUL and other
/// control characters except tab are replaced by U+FFFD.
#[derive(Debug)]
pub struct LineSource<R> {
    /// Underlying byte stream
    reader: R,
    /// Encoding used to decode line bytes
    encoding: TextEncoding,
    /// Published position
    cursor: PositionCursor,
    /// Number of lines delivered so far
    line: usize,
    /// Character count of the last delivered line
    column: usize,
    /// Raw bytes of the line being read
    buffer: Vec<u8>,
    /// Previous line ended in `\r`, so a leading `\n` belongs to it
    skip_lf: bool,
    /// Reached end of input
    exhausted: bool,
}

impl<'a> LineSource<&'a [u8]> {
    /// Create a UTF-8 source over in-memory text
    #[must_use]
    pub fn from_text(text: &'a str) -> Self {
        Self::new(text.as_bytes(), TextEncoding::Utf8)
    }
}

impl<R: BufRead> LineSource<R> {
    /// Create a new source decoding `reader` with `encoding`
    pub fn new(reader: R, encoding: TextEncoding) -> Self {
        Self {
            reader,
            encoding,
            cursor: PositionCursor::new(),
            line: 0,
            column: 0,
            buffer: Vec::new(),
            skip_lf: false,
            exhausted: false,
        }
    }

    /// Cursor publishing this source's position
    #[must_use]
    pub fn cursor(&self) -> PositionCursor {
        self.cursor.clone()
    }

    /// Line number of the last delivered line (1-based, 0 before reading)
    #[must_use]
    pub const fn current_line(&self) -> usize {
        self.line
    }

    /// Column of the last delivered character
    #[must_use]
    pub const fn current_column(&self) -> usize {
        self.column
    }

    /// Current position as a value
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Read the next line
    ///
    /// Returns `Ok(None)` at end of input. Once end of input is reached, every
    /// further call returns `Ok(None)` without touching the reader.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] when the reader fails and
    /// [`ParseError::Encoding`] when the line bytes cannot be decoded.
    pub fn read_line(&mut self) -> ParseResult<Option<String>> {
        if self.exhausted {
            return Ok(None);
        }

        if !self.read_raw_line()? {
            self.exhausted = true;
            return Ok(None);
        }

        let bytes = if self.line == 0 {
            strip_utf8_bom(&self.buffer).0
        } else {
            &self.buffer[..]
        };

        let decoded = self
            .encoding
            .decode(bytes)
            .ok_or(ParseError::Encoding {
                line: self.line + 1,
                encoding: self.encoding.name(),
            })?;
        let text = normalize_controls(&decoded);

        self.line += 1;
        self.column = text.chars().count();
        self.cursor.set(self.position());

        Ok(Some(text))
    }

    /// Fill `buffer` with the bytes of the next line
    ///
    /// Returns `false` when no bytes remain.
    fn read_raw_line(&mut self) -> io::Result<bool> {
        self.buffer.clear();
        let mut read_any = false;

        loop {
            let available = match self.reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if available.is_empty() {
                return Ok(read_any);
            }

            if self.skip_lf {
                self.skip_lf = false;
                if available[0] == b'\n' {
                    self.reader.consume(1);
                    continue;
                }
            }

            read_any = true;
            if let Some(index) = available.iter().position(|&b| b == b'\n' || b == b'\r') {
                let ended_with_cr = available[index] == b'\r';
                self.buffer.extend_from_slice(&available[..index]);
                self.reader.consume(index + 1);
                self.skip_lf = ended_with_cr;
                return Ok(true);
            }

            let consumed = available.len();
            self.buffer.extend_from_slice(available);
            self.reader.consume(consumed);
        }
    }
}

/// Replace NUL and other non-tab control characters with U+FFFD
fn normalize_controls(text: &str) -> String {
    if !text.chars().any(is_replaced_control) {
        return text.to_owned();
    }

    text.chars()
        .map(|c| if is_replaced_control(c) { '\u{FFFD}' } else { c })
        .collect()
}

/// Control characters that never reach the scanner
const fn is_replaced_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}'..='\u{1F}' | '\u{7F}')
}
