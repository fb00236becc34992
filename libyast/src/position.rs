//! Source positions.
//!
//! Every token and every node carries the position where it starts and the
//! position just past where it ends, so errors and downstream tools can point
//! back into the original buffer.

use std::fmt;

/// A byte offset plus line/column location in the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Byte offset from the beginning of the buffer.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number, counted in characters.
    pub column: usize,
}

impl Position {
    /// The position of the first byte of a buffer.
    pub const fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Advance past one character that occupies `len` bytes.
    ///
    /// A `\n` starts a new line. A `\r` directly followed by `\n` is a single
    /// break, so the caller advances over the `\r` with `next = Some('\n')`
    /// and it is counted as ordinary width-zero text on that line.
    pub fn advance(&mut self, ch: char, len: usize, next: Option<char>) {
        self.offset += len;
        match ch {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' if next != Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {}
            _ => self.column += 1,
        }
    }

    /// Zero-based column, which is what indentation is measured in.
    pub fn indent(&self) -> usize {
        self.column - 1
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
