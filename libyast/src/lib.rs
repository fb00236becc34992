//! YAML lexer and parser producing a position-aware document tree.
//!
//! # Parsing Pipeline
//!
//! The parser operates in three phases:
//!
//! 1. **Lexer**: Converts source bytes into a token stream, validating
//!    encoding, tracking block indentation with a stack and flow nesting with
//!    a depth counter, and decoding scalars (escapes, line folding, block
//!    scalar chomping). Comments go to a side channel.
//!
//! 2. **Parser**: Recursively builds one document tree per document of the
//!    stream from token columns and lines, binding anchors and aliases and
//!    marking merge keys.
//!
//! 3. **Resolver**: Gives each plain scalar its core-schema type (null, bool,
//!    integer, float, timestamp, string); `!!binary` and `!!str` tags
//!    override it. The parser calls it once per scalar.
//!
//! Every phase fails with a single [`SyntaxError`] carrying the kind, a
//! message and the position of the offending input. There is no error
//! recovery and no partial result.
//!
//! # Example
//!
//! ```
//! use libyast::{parse_str, ScalarValue};
//!
//! let stream = parse_str("name: yast\nversion: 2\n").unwrap();
//! let doc = &stream.documents[0];
//! let version = doc.lookup(doc.root, "version").unwrap();
//! assert_eq!(doc.node(version).as_scalar(), Some(&ScalarValue::from(2i64)));
//! ```

mod ast;
mod error;
mod lexer;
mod options;
mod parser;
mod position;
mod resolve;
mod scanner;
mod token;
mod value;

pub use ast::{
    walk, Document, MappingEntry, Marker, Node, NodeId, NodeKind, Stream, Visit, Visitor, Warning,
};
pub use error::{ErrorKind, Result, SyntaxError};
pub use lexer::{tokenize, tokenize_with_options};
pub use options::{ParseOptions, DEFAULT_MAX_DEPTH};
pub use parser::parse_tokens;
pub use position::Position;
pub use resolve::{core_tag_name, resolve, resolve_tagged};
pub use token::{Chomping, ScalarStyle, Token, TokenKind, TokenStream};
pub use value::{ScalarType, ScalarValue, Timestamp};

/// Parse a YAML stream with default options.
pub fn parse(input: &[u8]) -> Result<Stream> {
    parse_with_options(input, &ParseOptions::default())
}

/// Parse a YAML stream from a string.
pub fn parse_str(input: &str) -> Result<Stream> {
    parse(input.as_bytes())
}

/// Parse a YAML stream.
pub fn parse_with_options(input: &[u8], options: &ParseOptions) -> Result<Stream> {
    // Phase 1: Tokenize
    let tokens = lexer::tokenize_with_options(input, options)?;

    // Phases 2 and 3: Build documents, resolving scalars as they are met
    parser::parse_tokens(&tokens, 0, options)
}
