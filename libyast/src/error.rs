//! Error types for YAML tokenizing and parsing.

use std::fmt;

use thiserror::Error;

use crate::position::Position;

/// Result type for tokenizing and parsing operations.
pub type Result<T> = std::result::Result<T, SyntaxError>;

/// Which stage of the pipeline rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed low-level construct found by the lexer: unterminated quoted
    /// scalar, bad escape, bad block scalar header, invalid UTF-8.
    Lexical,
    /// Token sequence does not fit the block/flow grammar.
    Structural,
    /// Alias names an anchor that is not defined in the current document.
    Reference,
    /// A tag could not be applied to its content, such as `!!binary` over
    /// text that is not base64.
    Resolution,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lexical => "lexical",
            ErrorKind::Structural => "structural",
            ErrorKind::Reference => "reference",
            ErrorKind::Resolution => "resolution",
        };
        f.write_str(name)
    }
}

/// The single terminal failure of a tokenize or parse call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} error: {message} at {position}{}", filename_suffix(.filename))]
pub struct SyntaxError {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Position,
    pub filename: Option<String>,
}

fn filename_suffix(filename: &Option<String>) -> String {
    match filename {
        Some(name) => format!(" of <{}>", name),
        None => String::new(),
    }
}

impl SyntaxError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
            filename: None,
        }
    }

    pub fn lexical(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Lexical, message, position)
    }

    pub fn structural(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Structural, message, position)
    }

    pub fn reference(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Reference, message, position)
    }

    pub fn resolution(message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Resolution, message, position)
    }

    /// Attach a filename for error messages.
    pub fn with_filename(mut self, filename: Option<&str>) -> Self {
        self.filename = filename.map(String::from);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 1-based line of the offending token.
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// 1-based column of the offending token.
    pub fn column(&self) -> usize {
        self.position.column
    }

    /// Byte offset of the offending token.
    pub fn offset(&self) -> usize {
        self.position.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_without_filename() {
        let pos = Position {
            offset: 7,
            line: 2,
            column: 3,
        };
        let err = SyntaxError::structural("unexpected mapping key", pos);
        assert_eq!(
            err.to_string(),
            "structural error: unexpected mapping key at 2:3"
        );
    }

    #[test]
    fn test_display_with_filename() {
        let err = SyntaxError::lexical("unterminated single-quoted scalar", Position::start())
            .with_filename(Some("a.yaml"));
        assert_eq!(
            err.to_string(),
            "lexical error: unterminated single-quoted scalar at 1:1 of <a.yaml>"
        );
        assert_eq!(err.kind(), ErrorKind::Lexical);
        assert_eq!((err.line(), err.column(), err.offset()), (1, 1, 0));
    }
}
