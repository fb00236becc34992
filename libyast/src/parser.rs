//! Parser
//!
//! The parser consumes the token stream and builds one [`Document`] per
//! document of the stream. It never looks at the source text again: block
//! structure is recovered from token columns and lines alone.
//!
//! - Block collections: a `-` or an implicit key at column c opens a
//!   collection at c, and it continues while entries keep starting at c.
//!   A value belongs to its entry if it is on the same line as the
//!   indicator or more indented than c.
//! - Flow collections: entries separated by `,` until the matching closer;
//!   indentation is ignored.
//! - Properties: anchors bind the finished node in a per-document table;
//!   aliases resolve against it immediately.
//!
//! Recursion is bounded by [`ParseOptions::max_depth`].

use std::collections::HashMap;
use std::mem;

use crate::ast::{Document, MappingEntry, Marker, Node, NodeId, NodeKind, Stream, Warning};
use crate::error::{Result, SyntaxError};
use crate::options::ParseOptions;
use crate::position::Position;
use crate::resolve::resolve_tagged;
use crate::token::{ScalarStyle, Token, TokenKind, TokenStream};

/// Build the documents of a token stream, numbering them from
/// `start_document_index`.
pub fn parse_tokens(
    stream: &TokenStream,
    start_document_index: usize,
    options: &ParseOptions,
) -> Result<Stream> {
    // The parser relies on a trailing end-of-stream token.
    let owned;
    let tokens: &[Token] = match stream.tokens.last() {
        Some(t) if t.kind == TokenKind::EndOfStream => &stream.tokens,
        last => {
            let at = last.map(|t| t.end).unwrap_or_default();
            let mut with_end = stream.tokens.clone();
            with_end.push(Token::new(TokenKind::EndOfStream, "", "", at, at));
            owned = with_end;
            &owned
        }
    };

    let mut parser = Parser {
        tokens,
        pos: 0,
        max_depth: options.max_depth,
        depth: 0,
        arena: Vec::new(),
        anchors: HashMap::new(),
        warnings: Vec::new(),
    };
    let parsed = parser
        .parse_stream(start_document_index)
        .map_err(|e| e.with_filename(options.filename.as_deref()))?;
    tracing::debug!(
        tokens = tokens.len(),
        documents = parsed.len(),
        "parsed"
    );
    Ok(parsed)
}

/// Where a block node sits relative to the indicator that introduced it.
#[derive(Debug, Clone, Copy)]
enum Context {
    /// Document root.
    Root,
    /// Value of an implicit key whose mapping sits at `column`. The `:` is
    /// on `line`.
    MapValue { column: usize, line: usize },
    /// Content after `-`, `?`, or the `:` of an explicit key, found on
    /// `line`. Compact collections may start on that line.
    Compact { line: usize },
}

impl Context {
    fn line(self) -> Option<usize> {
        match self {
            Context::Root => None,
            Context::MapValue { line, .. } | Context::Compact { line } => Some(line),
        }
    }
}

/// Anchor and tag collected in front of a node.
#[derive(Debug, Default)]
struct Properties {
    anchor: Option<(String, Position)>,
    tag: Option<String>,
    start: Option<Position>,
    end: Position,
    /// Line of the last property.
    line: usize,
}

impl Properties {
    fn is_empty(&self) -> bool {
        self.start.is_none()
    }
}

struct Parser<'t> {
    /// Always ends with an end-of-stream token.
    tokens: &'t [Token],
    pos: usize,
    max_depth: usize,
    depth: usize,
    arena: Vec<Node>,
    anchors: HashMap<String, (NodeId, Position)>,
    warnings: Vec<Warning>,
}

/// Tokens that end any block node in progress.
fn ends_block_node(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::DocumentStart
            | TokenKind::DocumentEnd
            | TokenKind::Directive
            | TokenKind::EndOfStream
            | TokenKind::SequenceEnd
            | TokenKind::MappingEnd
            | TokenKind::CollectEntry
    )
}

impl<'t> Parser<'t> {
    // ========================================================================
    // Token Access
    // ========================================================================

    fn peek(&self) -> &'t Token {
        let tokens = self.tokens;
        &tokens[self.pos.min(tokens.len() - 1)]
    }

    fn advance(&mut self) -> &'t Token {
        let t = self.peek();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    /// End of the last consumed token.
    fn prev_end(&self) -> Position {
        match self.pos.checked_sub(1) {
            Some(i) => self.tokens[i].end,
            None => self.peek().start,
        }
    }

    /// Whether the next token starts on a line after the last consumed one.
    fn on_new_line(&self) -> bool {
        self.pos == 0 || self.peek().line() > self.prev_end().line
    }

    /// Index of the `:` that makes the node starting at token `i` an
    /// implicit mapping key. The `:` must be on the line the key starts on.
    fn implicit_key_colon(&self, i: usize) -> Option<usize> {
        let tokens = self.tokens;
        let first = tokens.get(i)?;
        let after = match first.kind {
            TokenKind::Alias | TokenKind::MergeKey => i + 1,
            k if k.is_scalar() => i + 1,
            TokenKind::SequenceStart | TokenKind::MappingStart => {
                let mut depth = 0usize;
                let mut j = i;
                loop {
                    match tokens.get(j)?.kind {
                        TokenKind::SequenceStart | TokenKind::MappingStart => depth += 1,
                        TokenKind::SequenceEnd | TokenKind::MappingEnd => {
                            depth -= 1;
                            if depth == 0 {
                                break j + 1;
                            }
                        }
                        TokenKind::EndOfStream => return None,
                        _ => {}
                    }
                    j += 1;
                }
            }
            _ => return None,
        };
        let colon = tokens.get(after)?;
        (colon.kind == TokenKind::MappingValue && colon.line() == first.line()).then_some(after)
    }

    fn at_implicit_key(&self) -> bool {
        self.implicit_key_colon(self.pos).is_some()
    }

    /// Error for a next token that cannot continue the current production.
    fn unexpected(&self, expected: &str) -> SyntaxError {
        let t = self.peek();
        let what = if self.at_implicit_key() {
            "mapping key"
        } else {
            t.kind.describe()
        };
        SyntaxError::structural(
            format!("unexpected {} at column {}, {}", what, t.column(), expected),
            t.start,
        )
    }

    // ========================================================================
    // Arena and Anchors
    // ========================================================================

    fn push(&mut self, kind: NodeKind, start: Position, end: Position, props: Properties) -> NodeId {
        let id = NodeId(self.arena.len());
        let (anchor, anchor_at) = match props.anchor {
            Some((name, at)) => (Some(name), Some(at)),
            None => (None, None),
        };
        self.arena.push(Node {
            kind,
            start,
            end,
            anchor: anchor.clone(),
            tag: props.tag,
        });
        if let (Some(name), Some(at)) = (anchor, anchor_at) {
            self.define_anchor(name, id, at);
        }
        id
    }

    fn define_anchor(&mut self, name: String, id: NodeId, at: Position) {
        if let Some(&(_, first)) = self.anchors.get(&name) {
            tracing::warn!(anchor = %name, first = %first, redefined = %at, "anchor redefined");
            self.warnings.push(Warning::AnchorRedefined {
                name: name.clone(),
                first,
                redefined: at,
            });
        }
        self.anchors.insert(name, (id, at));
    }

    /// A null node holding only `props`, ending where the last token did.
    fn empty_node(&mut self, props: Properties) -> NodeId {
        let end = self.prev_end();
        let start = props.start.unwrap_or(end);
        self.push(NodeKind::Null, start, end, props)
    }

    fn is_merge_key(&self, id: NodeId) -> bool {
        let node = &self.arena[id.0];
        node.tag.is_none()
            && matches!(
                &node.kind,
                NodeKind::Scalar { raw, style: ScalarStyle::Plain, .. } if raw == "<<"
            )
    }

    /// Run a node production one level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.max_depth {
            return Err(SyntaxError::structural(
                format!("nesting depth exceeds the limit of {}", self.max_depth),
                self.peek().start,
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // ========================================================================
    // Documents
    // ========================================================================

    fn parse_stream(&mut self, start_index: usize) -> Result<Stream> {
        let mut documents = Vec::new();
        while self.peek().kind != TokenKind::EndOfStream {
            if let Some(doc) = self.parse_document(start_index + documents.len())? {
                tracing::trace!(
                    index = doc.index,
                    nodes = doc.arena.len(),
                    warnings = doc.warnings.len(),
                    "document"
                );
                documents.push(doc);
            }
        }
        Ok(Stream { documents })
    }

    /// `Directive* DocumentStart? root DocumentEnd?`. Returns `None` for a
    /// stray `...` that closes nothing.
    fn parse_document(&mut self, index: usize) -> Result<Option<Document>> {
        self.arena.clear();
        self.anchors.clear();
        self.warnings.clear();

        let mut directives = Vec::new();
        while self.peek().kind == TokenKind::Directive {
            directives.push(self.advance().value.clone());
        }

        let start_marker = if self.peek().kind == TokenKind::DocumentStart {
            let t = self.advance();
            Some(self.push_marker(Marker::Start, t))
        } else if !directives.is_empty() {
            return Err(SyntaxError::structural(
                "directives must be followed by a document start marker",
                self.peek().start,
            ));
        } else if self.peek().kind == TokenKind::DocumentEnd {
            self.advance();
            return Ok(None);
        } else {
            None
        };

        let root = self.parse_node(-1, Context::Root)?;

        let end_marker = match self.peek().kind {
            TokenKind::DocumentEnd => {
                let t = self.advance();
                Some(self.push_marker(Marker::End, t))
            }
            TokenKind::DocumentStart | TokenKind::EndOfStream => None,
            _ => return Err(self.unexpected("expected the end of the document")),
        };

        Ok(Some(Document {
            index,
            directives,
            start_marker,
            end_marker,
            root,
            warnings: mem::take(&mut self.warnings),
            arena: mem::take(&mut self.arena),
        }))
    }

    fn push_marker(&mut self, marker: Marker, t: &Token) -> NodeId {
        self.push(
            NodeKind::DocumentMarker(marker),
            t.start,
            t.end,
            Properties::default(),
        )
    }

    // ========================================================================
    // Block Nodes
    // ========================================================================

    /// Parse the node owned by a block collection at `parent` (-1 at the
    /// root), or an empty node if nothing belongs to it.
    fn parse_node(&mut self, parent: isize, ctx: Context) -> Result<NodeId> {
        self.nested(|p| p.parse_block_node(parent, ctx))
    }

    /// Whether `t` belongs to the node being parsed. Tokens on `line` always
    /// do; on later lines they must be indented past `parent`, except that a
    /// mapping value may be a sequence at the mapping's own column.
    fn belongs_to_node(t: &Token, parent: isize, ctx: Context, line: Option<usize>) -> bool {
        if ends_block_node(t.kind) {
            return false;
        }
        if line == Some(t.line()) {
            return true;
        }
        let column = t.start.indent();
        if column as isize > parent {
            return true;
        }
        matches!(ctx, Context::MapValue { column: c, .. }
            if c == column && t.kind == TokenKind::SequenceEntry)
    }

    fn parse_block_node(&mut self, parent: isize, ctx: Context) -> Result<NodeId> {
        if !Self::belongs_to_node(self.peek(), parent, ctx, ctx.line()) {
            return Ok(self.empty_node(Properties::default()));
        }
        let props = self.parse_properties()?;
        let t = self.peek();
        if !props.is_empty()
            && t.line() != props.line
            && !Self::belongs_to_node(t, parent, ctx, Some(props.line))
        {
            return Ok(self.empty_node(props));
        }

        if let Context::MapValue { line, .. } = ctx {
            if t.line() == line {
                if t.kind == TokenKind::SequenceEntry {
                    return Err(SyntaxError::structural(
                        "block sequence entries are not allowed on the same line as a mapping key",
                        t.start,
                    ));
                }
                if let Some(colon) = self.implicit_key_colon(self.pos) {
                    return Err(SyntaxError::structural(
                        "mapping values are not allowed in this context",
                        self.tokens[colon].start,
                    ));
                }
            }
        }

        let same_line_props = !props.is_empty() && props.line == t.line();
        match t.kind {
            TokenKind::SequenceEntry | TokenKind::MappingKey if same_line_props => {
                Err(SyntaxError::structural(
                    format!(
                        "node properties must be on their own line before a block {}",
                        if t.kind == TokenKind::SequenceEntry {
                            "sequence"
                        } else {
                            "mapping"
                        }
                    ),
                    t.start,
                ))
            }
            TokenKind::SequenceEntry => self.parse_block_sequence(t.start.indent(), props),
            TokenKind::MappingKey => {
                let start = props.start.unwrap_or(t.start);
                self.parse_block_mapping(t.start.indent(), start, props, Properties::default())
            }
            _ if self.at_implicit_key() => {
                let start = props.start.unwrap_or(t.start);
                if props.is_empty() || same_line_props {
                    // Properties on the key's line belong to the key.
                    self.parse_block_mapping(start.indent(), start, Properties::default(), props)
                } else {
                    self.parse_block_mapping(t.start.indent(), start, props, Properties::default())
                }
            }
            _ => self.parse_content(props),
        }
    }

    fn parse_properties(&mut self) -> Result<Properties> {
        let mut props = Properties::default();
        loop {
            let t = self.peek();
            match t.kind {
                TokenKind::Anchor => {
                    if props.anchor.is_some() {
                        return Err(SyntaxError::structural(
                            "a node can have at most one anchor",
                            t.start,
                        ));
                    }
                    props.anchor = Some((t.value.clone(), t.start));
                }
                TokenKind::Tag => {
                    if props.tag.is_some() {
                        return Err(SyntaxError::structural(
                            "a node can have at most one tag",
                            t.start,
                        ));
                    }
                    props.tag = Some(t.value.clone());
                }
                _ => return Ok(props),
            }
            props.start.get_or_insert(t.start);
            props.end = t.end;
            props.line = t.line();
            self.advance();
        }
    }

    fn parse_block_sequence(&mut self, column: usize, props: Properties) -> Result<NodeId> {
        let start = props.start.unwrap_or(self.peek().start);
        let mut items = Vec::new();
        loop {
            let dash = self.advance();
            let item = self.parse_node(column as isize, Context::Compact { line: dash.line() })?;
            items.push(item);

            let t = self.peek();
            if ends_block_node(t.kind) {
                break;
            }
            let t_column = t.start.indent();
            if self.on_new_line() {
                if t_column == column && t.kind == TokenKind::SequenceEntry {
                    continue;
                }
                if t_column <= column {
                    break;
                }
            }
            return Err(self.unexpected(&format!(
                "expected a sequence entry at column {} or dedent",
                column + 1
            )));
        }
        let end = self.prev_end();
        Ok(self.push(
            NodeKind::Sequence { items, flow: false },
            start,
            end,
            props,
        ))
    }

    /// Parse a block mapping at `column`. `first_key` holds properties
    /// already read from the first key's line.
    fn parse_block_mapping(
        &mut self,
        column: usize,
        start: Position,
        props: Properties,
        first_key: Properties,
    ) -> Result<NodeId> {
        let mut entries = Vec::new();
        let mut pending = Some(first_key);
        loop {
            let key_props = match pending.take() {
                Some(first) => first,
                None => {
                    let t = self.peek();
                    if ends_block_node(t.kind) {
                        break;
                    }
                    let t_column = t.start.indent();
                    if self.on_new_line() && t_column < column {
                        break;
                    }
                    if !self.on_new_line() || t_column > column {
                        return Err(self.unexpected(&format!(
                            "expected a mapping key at column {} or dedent",
                            column + 1
                        )));
                    }
                    self.parse_properties()?
                }
            };

            let t = self.peek();
            let entry = if t.kind == TokenKind::MappingKey && key_props.is_empty() {
                self.parse_explicit_entry(column)?
            } else if self.at_implicit_key() && (key_props.is_empty() || key_props.line == t.line())
            {
                let key = self.nested(|p| p.parse_content(key_props))?;
                let colon = self.advance();
                let value = self.parse_node(
                    column as isize,
                    Context::MapValue {
                        column,
                        line: colon.line(),
                    },
                )?;
                MappingEntry {
                    key,
                    value,
                    merge: self.is_merge_key(key),
                }
            } else {
                return Err(SyntaxError::structural(
                    format!("expected a mapping key, found {}", t.kind.describe()),
                    t.start,
                ));
            };
            entries.push(entry);
        }
        let end = self.prev_end();
        Ok(self.push(
            NodeKind::Mapping {
                entries,
                flow: false,
            },
            start,
            end,
            props,
        ))
    }

    /// `? key` followed by an optional `: value` at the same column.
    fn parse_explicit_entry(&mut self, column: usize) -> Result<MappingEntry> {
        let question = self.advance();
        let key = self.parse_node(
            column as isize,
            Context::Compact {
                line: question.line(),
            },
        )?;
        let t = self.peek();
        let value = if t.kind == TokenKind::MappingValue
            && t.start.indent() == column
            && self.on_new_line()
        {
            let colon = self.advance();
            self.parse_node(column as isize, Context::Compact { line: colon.line() })?
        } else {
            self.empty_node(Properties::default())
        };
        Ok(MappingEntry {
            key,
            value,
            merge: self.is_merge_key(key),
        })
    }

    // ========================================================================
    // Scalars and Aliases
    // ========================================================================

    /// A scalar, alias or flow collection.
    fn parse_content(&mut self, props: Properties) -> Result<NodeId> {
        let t = self.peek();
        match t.kind {
            TokenKind::Alias => self.parse_alias(props),
            TokenKind::SequenceStart | TokenKind::MappingStart => {
                self.parse_flow_collection(props)
            }
            k if k.is_scalar() || k == TokenKind::MergeKey => self.parse_scalar(props),
            _ => Err(SyntaxError::structural(
                format!("expected a node, found {}", t.kind.describe()),
                t.start,
            )),
        }
    }

    fn parse_scalar(&mut self, props: Properties) -> Result<NodeId> {
        let t = self.advance();
        let style = ScalarStyle::of(t.kind).unwrap_or(ScalarStyle::Plain);
        let value = resolve_tagged(&t.value, style, props.tag.as_deref(), t.start)?;
        let start = props.start.unwrap_or(t.start);
        Ok(self.push(
            NodeKind::Scalar {
                value,
                raw: t.value.clone(),
                style,
            },
            start,
            t.end,
            props,
        ))
    }

    fn parse_alias(&mut self, props: Properties) -> Result<NodeId> {
        let t = self.advance();
        if let Some(at) = props.start {
            return Err(SyntaxError::structural(
                "an alias cannot have an anchor or a tag",
                at,
            ));
        }
        let Some(&(target, _)) = self.anchors.get(&t.value) else {
            return Err(SyntaxError::reference(
                format!("undefined alias '{}'", t.value),
                t.start,
            ));
        };
        Ok(self.push(
            NodeKind::Alias {
                name: t.value.clone(),
                target,
            },
            t.start,
            t.end,
            props,
        ))
    }

    // ========================================================================
    // Flow Collections
    // ========================================================================

    fn parse_flow_collection(&mut self, props: Properties) -> Result<NodeId> {
        let open = self.advance();
        let is_sequence = open.kind == TokenKind::SequenceStart;
        let (closer, close_char, what) = if is_sequence {
            (TokenKind::SequenceEnd, ']', "sequence")
        } else {
            (TokenKind::MappingEnd, '}', "mapping")
        };
        let unterminated = || {
            SyntaxError::structural(
                format!("unterminated flow {}, expected '{}'", what, close_char),
                open.start,
            )
        };

        let mut items = Vec::new();
        let mut entries = Vec::new();
        loop {
            let t = self.peek();
            match t.kind {
                k if k == closer => break,
                TokenKind::EndOfStream | TokenKind::DocumentStart | TokenKind::DocumentEnd => {
                    return Err(unterminated());
                }
                TokenKind::CollectEntry => {
                    return Err(SyntaxError::structural(
                        format!("unexpected ',' in flow {}", what),
                        t.start,
                    ));
                }
                _ => {}
            }

            if is_sequence {
                let item = self.parse_flow_sequence_item()?;
                items.push(item);
            } else {
                let entry = self.parse_flow_mapping_entry()?;
                entries.push(entry);
            }

            let t = self.peek();
            match t.kind {
                TokenKind::CollectEntry => {
                    self.advance();
                }
                k if k == closer => {}
                TokenKind::EndOfStream | TokenKind::DocumentStart | TokenKind::DocumentEnd => {
                    return Err(unterminated());
                }
                _ => {
                    return Err(SyntaxError::structural(
                        format!(
                            "expected ',' or '{}' in flow {}, found {}",
                            close_char,
                            what,
                            t.kind.describe()
                        ),
                        t.start,
                    ));
                }
            }
        }

        let close = self.advance();
        let start = props.start.unwrap_or(open.start);
        let kind = if is_sequence {
            NodeKind::Sequence { items, flow: true }
        } else {
            NodeKind::Mapping {
                entries,
                flow: true,
            }
        };
        Ok(self.push(kind, start, close.end, props))
    }

    /// A flow sequence item; `key: value` and `? key : value` make a
    /// single-pair mapping.
    fn parse_flow_sequence_item(&mut self) -> Result<NodeId> {
        let first = self.peek();
        let explicit = first.kind == TokenKind::MappingKey;
        if explicit {
            self.advance();
        }
        let key = self.parse_flow_node()?;
        if self.peek().kind != TokenKind::MappingValue {
            if explicit {
                let value = self.empty_node(Properties::default());
                return Ok(self.single_pair(first.start, key, value));
            }
            return Ok(key);
        }
        self.advance();
        let value = self.parse_flow_node()?;
        let start = if explicit {
            first.start
        } else {
            self.arena[key.0].start
        };
        Ok(self.single_pair(start, key, value))
    }

    fn single_pair(&mut self, start: Position, key: NodeId, value: NodeId) -> NodeId {
        let end = self.arena[value.0].end.max(self.arena[key.0].end);
        let merge = self.is_merge_key(key);
        self.push(
            NodeKind::Mapping {
                entries: vec![MappingEntry { key, value, merge }],
                flow: true,
            },
            start,
            end,
            Properties::default(),
        )
    }

    fn parse_flow_mapping_entry(&mut self) -> Result<MappingEntry> {
        if self.peek().kind == TokenKind::MappingKey {
            self.advance();
        }
        let key = self.parse_flow_node()?;
        let value = if self.peek().kind == TokenKind::MappingValue {
            self.advance();
            self.parse_flow_node()?
        } else {
            self.empty_node(Properties::default())
        };
        Ok(MappingEntry {
            key,
            value,
            merge: self.is_merge_key(key),
        })
    }

    fn parse_flow_node(&mut self) -> Result<NodeId> {
        self.nested(|p| {
            let props = p.parse_properties()?;
            let t = p.peek();
            match t.kind {
                TokenKind::CollectEntry
                | TokenKind::SequenceEnd
                | TokenKind::MappingEnd
                | TokenKind::MappingValue
                | TokenKind::EndOfStream
                | TokenKind::DocumentStart
                | TokenKind::DocumentEnd => Ok(p.empty_node(props)),
                TokenKind::SequenceEntry => Err(SyntaxError::structural(
                    "block sequence entries are not allowed in a flow collection",
                    t.start,
                )),
                _ => p.parse_content(props),
            }
        })
    }
}
