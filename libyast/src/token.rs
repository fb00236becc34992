//! Tokens produced by the lexer.

use std::fmt;

use crate::position::Position;

/// The syntactic category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `---`
    DocumentStart,
    /// `...`
    DocumentEnd,
    /// `%YAML 1.2`, `%TAG ! tag:example.com,2000:`
    Directive,
    /// `-` in block context.
    SequenceEntry,
    /// `?`
    MappingKey,
    /// `:`
    MappingValue,
    /// `[`
    SequenceStart,
    /// `]`
    SequenceEnd,
    /// `{`
    MappingStart,
    /// `}`
    MappingEnd,
    /// `,`
    CollectEntry,
    /// `&name`
    Anchor,
    /// `*name`
    Alias,
    /// `!tag`, `!!tag`, `!<uri>`
    Tag,
    PlainScalar,
    SingleQuoted,
    DoubleQuoted,
    /// `|` block scalar.
    Literal,
    /// `>` block scalar.
    Folded,
    /// `# ...`, only ever found in the comment side channel.
    Comment,
    /// A plain `<<` mapping key.
    MergeKey,
    EndOfStream,
}

impl TokenKind {
    /// Whether this token carries scalar content.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            TokenKind::PlainScalar
                | TokenKind::SingleQuoted
                | TokenKind::DoubleQuoted
                | TokenKind::Literal
                | TokenKind::Folded
        )
    }

    /// Whether this token is a node property (anchor or tag).
    pub fn is_property(self) -> bool {
        matches!(self, TokenKind::Anchor | TokenKind::Tag)
    }

    /// Human-readable name for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::DocumentStart => "document start",
            TokenKind::DocumentEnd => "document end",
            TokenKind::Directive => "directive",
            TokenKind::SequenceEntry => "sequence entry",
            TokenKind::MappingKey => "mapping key indicator",
            TokenKind::MappingValue => "mapping value indicator",
            TokenKind::SequenceStart => "'['",
            TokenKind::SequenceEnd => "']'",
            TokenKind::MappingStart => "'{'",
            TokenKind::MappingEnd => "'}'",
            TokenKind::CollectEntry => "','",
            TokenKind::Anchor => "anchor",
            TokenKind::Alias => "alias",
            TokenKind::Tag => "tag",
            TokenKind::PlainScalar => "scalar",
            TokenKind::SingleQuoted => "single-quoted scalar",
            TokenKind::DoubleQuoted => "double-quoted scalar",
            TokenKind::Literal => "literal block scalar",
            TokenKind::Folded => "folded block scalar",
            TokenKind::Comment => "comment",
            TokenKind::MergeKey => "merge key",
            TokenKind::EndOfStream => "end of stream",
        }
    }
}

/// How a scalar was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl ScalarStyle {
    /// The scalar style of a token kind, if it is a scalar.
    pub fn of(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::PlainScalar | TokenKind::MergeKey => Some(ScalarStyle::Plain),
            TokenKind::SingleQuoted => Some(ScalarStyle::SingleQuoted),
            TokenKind::DoubleQuoted => Some(ScalarStyle::DoubleQuoted),
            TokenKind::Literal => Some(ScalarStyle::Literal),
            TokenKind::Folded => Some(ScalarStyle::Folded),
            _ => None,
        }
    }
}

/// Block scalar trailing newline policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Chomping {
    /// Keep exactly one trailing newline.
    #[default]
    Clip,
    /// `-`: drop all trailing newlines.
    Strip,
    /// `+`: keep all trailing newlines.
    Keep,
}

/// One lexical unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Decoded text: escapes processed and lines folded for scalars, the
    /// bare name for anchors and aliases, the full tag for tags.
    pub value: String,
    /// The source text the token was scanned from.
    pub origin: String,
    pub start: Position,
    pub end: Position,
    /// Block scalars only.
    pub chomping: Option<Chomping>,
    /// Explicit indentation indicator digit of a block scalar header.
    pub indent_indicator: Option<usize>,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        value: impl Into<String>,
        origin: impl Into<String>,
        start: Position,
        end: Position,
    ) -> Self {
        Self {
            kind,
            value: value.into(),
            origin: origin.into(),
            start,
            end,
            chomping: None,
            indent_indicator: None,
        }
    }

    /// 1-based line of the token start.
    pub fn line(&self) -> usize {
        self.start.line
    }

    /// 1-based column of the token start.
    pub fn column(&self) -> usize {
        self.start.column
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?}) at {}", self.kind, self.value, self.start)
    }
}

/// The ordered token sequence of one buffer.
///
/// Comments never appear in `tokens`; they are kept in `comments` so that a
/// formatter can re-attach them. Neighbours are reached by index: `prev` and
/// `next` are navigational and do not imply ownership.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub comments: Vec<Token>,
}

impl TokenStream {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Token> {
        self.tokens.get(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// The token before index `i`.
    pub fn prev(&self, i: usize) -> Option<&Token> {
        i.checked_sub(1).and_then(|j| self.tokens.get(j))
    }

    /// The token after index `i`.
    pub fn next(&self, i: usize) -> Option<&Token> {
        self.tokens.get(i + 1)
    }

    /// Kinds of all tokens, handy for assertions.
    pub fn kinds(&self) -> Vec<TokenKind> {
        self.tokens.iter().map(|t| t.kind).collect()
    }

    /// One line per token: position, kind and decoded value.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for t in &self.tokens {
            out.push_str(&format!(
                "{:>4}:{:<3} {:<14} {:?}\n",
                t.start.line,
                t.start.column,
                format!("{:?}", t.kind),
                t.value
            ));
        }
        out
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
