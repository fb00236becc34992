//! Source cursor.
//!
//! The scanner owns the input buffer on behalf of the lexer. It performs:
//! - UTF-8 validation
//! - Code point validation (YAML printable character set)
//! - Skipping a leading byte order mark
//! - Position tracking (byte offset, line, column) as the lexer advances

use crate::error::{Result, SyntaxError};
use crate::position::Position;

/// A cursor over validated YAML source text.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    src: &'a str,
    pos: Position,
}

impl<'a> Scanner<'a> {
    /// Validate `bytes` and position the cursor at the first character.
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        let src = std::str::from_utf8(bytes).map_err(|e| {
            let offset = e.valid_up_to();
            let prefix = &bytes[..offset];
            let line = 1 + prefix.iter().filter(|&&b| b == b'\n').count();
            let line_start = prefix
                .iter()
                .rposition(|&b| b == b'\n')
                .map(|i| i + 1)
                .unwrap_or(0);
            // The prefix is valid UTF-8 by construction.
            let column = 1 + String::from_utf8_lossy(&prefix[line_start..]).chars().count();
            SyntaxError::lexical(
                "invalid UTF-8 sequence",
                Position {
                    offset,
                    line,
                    column,
                },
            )
        })?;
        validate_code_points(src)?;

        let mut pos = Position::start();
        if src.starts_with('\u{FEFF}') {
            pos.offset = '\u{FEFF}'.len_utf8();
        }
        Ok(Self { src, pos })
    }

    /// The character just before the cursor.
    pub fn prev_char(&self) -> Option<char> {
        self.src[..self.pos.offset].chars().next_back()
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    /// Rewind or fast-forward to a position previously read from this scanner.
    pub fn reset(&mut self, pos: Position) {
        self.pos = pos;
    }

    pub fn offset(&self) -> usize {
        self.pos.offset
    }

    /// Zero-based column of the cursor.
    pub fn column(&self) -> usize {
        self.pos.indent()
    }

    pub fn is_eof(&self) -> bool {
        self.pos.offset >= self.src.len()
    }

    /// Text from the cursor to the end of the buffer.
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos.offset..]
    }

    /// Text from the cursor to (not including) the next line break.
    pub fn rest_of_line(&self) -> &'a str {
        let rest = self.rest();
        let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
        &rest[..end]
    }

    /// Source text between an earlier offset and the cursor.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.src[start..self.pos.offset]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The character `n` characters past the cursor.
    pub fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Consume one character.
    pub fn bump(&mut self) -> Option<char> {
        let mut chars = self.rest().chars();
        let ch = chars.next()?;
        let next = chars.next();
        self.pos.advance(ch, ch.len_utf8(), next);
        Some(ch)
    }

    /// Consume `n` characters.
    pub fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            if self.bump().is_none() {
                break;
            }
        }
    }

    /// Whether the cursor sits at a line break or at the end of input.
    pub fn at_break_or_eof(&self) -> bool {
        matches!(self.peek(), None | Some('\n') | Some('\r'))
    }

    /// Consume one line break (`\n`, `\r\n` or `\r`). Returns whether one
    /// was present.
    pub fn skip_break(&mut self) -> bool {
        match self.peek() {
            Some('\r') => {
                self.bump();
                if self.peek() == Some('\n') {
                    self.bump();
                }
                true
            }
            Some('\n') => {
                self.bump();
                true
            }
            _ => false,
        }
    }

    /// Consume spaces and tabs on the current line, returning how many.
    pub fn skip_blanks(&mut self) -> usize {
        let mut n = 0;
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.bump();
            n += 1;
        }
        n
    }

    /// Consume the remainder of the current line, not including its break.
    pub fn skip_to_break(&mut self) {
        while !self.at_break_or_eof() {
            self.bump();
        }
    }
}

/// Count the number of leading spaces in a line.
pub fn count_indent(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

/// Whether `ch` is a space or tab.
pub fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Whether `ch` is a space, tab, line break, or absent (end of input).
pub fn is_blank_or_end(ch: Option<char>) -> bool {
    matches!(ch, None | Some(' ') | Some('\t') | Some('\n') | Some('\r'))
}

/// Whether `ch` is one of the flow collection indicators.
pub fn is_flow_indicator(ch: char) -> bool {
    matches!(ch, ',' | '[' | ']' | '{' | '}')
}

/// Check whether a code point belongs to the YAML printable set.
fn is_allowed_code_point(cp: u32) -> bool {
    cp == 0x09
        || cp == 0x0A
        || cp == 0x0D
        || (0x20..=0x7E).contains(&cp)
        || cp == 0x85
        || (0xA0..=0xD7FF).contains(&cp)
        || (0xE000..=0xFFFD).contains(&cp)
        || (0x10000..=0x10FFFF).contains(&cp)
}

/// Validate that the source contains no forbidden code points.
fn validate_code_points(source: &str) -> Result<()> {
    let mut pos = Position::start();
    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        let cp = ch as u32;
        // A byte order mark is tolerated anywhere a document may start.
        if !is_allowed_code_point(cp) && cp != 0xFEFF {
            return Err(SyntaxError::lexical(
                format!("forbidden code point U+{:04X}", cp),
                pos,
            ));
        }
        pos.advance(ch, ch.len_utf8(), chars.peek().copied());
    }
    Ok(())
}
