//! Document tree
//!
//! Every document owns an arena of nodes. Collections refer to their
//! children by [`NodeId`], and an alias refers to the node its anchor was
//! placed on by the same index, so shared structure never needs a copy or a
//! reference cycle.

use std::fmt;

use crate::position::Position;
use crate::token::ScalarStyle;
use crate::value::ScalarValue;

/// Index of a node in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Which document marker a marker node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `---`
    Start,
    /// `...`
    End,
}

/// One key/value pair of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry {
    pub key: NodeId,
    pub value: NodeId,
    /// The key is a plain `<<`: the value names mappings to merge into the
    /// surrounding one. Merging is left to the consumer.
    pub merge: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// An absent value: `a:` with nothing after it, an empty document.
    Null,
    Scalar {
        value: ScalarValue,
        /// Decoded text before type resolution.
        raw: String,
        style: ScalarStyle,
    },
    Sequence {
        items: Vec<NodeId>,
        flow: bool,
    },
    /// Entries in source order. Duplicate keys are kept.
    Mapping {
        entries: Vec<MappingEntry>,
        flow: bool,
    },
    Alias {
        name: String,
        target: NodeId,
    },
    DocumentMarker(Marker),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub start: Position,
    pub end: Position,
    /// Anchor name defined on this node.
    pub anchor: Option<String>,
    /// Tag exactly as written, e.g. `!!str` or `!<tag:yaml.org,2002:str>`.
    pub tag: Option<String>,
}

impl Node {
    pub fn is_null(&self) -> bool {
        matches!(self.kind, NodeKind::Null)
    }

    /// Returns the resolved value if this is a scalar.
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match &self.kind {
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns the decoded text if this is a scalar.
    pub fn raw(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Returns the string value if this is a string-typed scalar.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(ScalarValue::as_str)
    }

    pub fn style(&self) -> Option<ScalarStyle> {
        match &self.kind {
            NodeKind::Scalar { style, .. } => Some(*style),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[NodeId]> {
        match &self.kind {
            NodeKind::Sequence { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[MappingEntry]> {
        match &self.kind {
            NodeKind::Mapping { entries, .. } => Some(entries),
            _ => None,
        }
    }

    /// Returns the anchored node if this is an alias.
    pub fn as_alias(&self) -> Option<NodeId> {
        match &self.kind {
            NodeKind::Alias { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Whether this is a collection written in flow style.
    pub fn is_flow(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Sequence { flow: true, .. } | NodeKind::Mapping { flow: true, .. }
        )
    }

    /// Child nodes in document order: items, or keys and values interleaved.
    pub fn children(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Sequence { items, .. } => items.clone(),
            NodeKind::Mapping { entries, .. } => {
                entries.iter().flat_map(|e| [e.key, e.value]).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// A non-fatal condition found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// An anchor name was defined again; aliases after `redefined` refer to
    /// the newer node.
    AnchorRedefined {
        name: String,
        first: Position,
        redefined: Position,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::AnchorRedefined {
                name,
                first,
                redefined,
            } => write!(
                f,
                "anchor '{}' defined at {} is redefined at {}",
                name, first, redefined
            ),
        }
    }
}

/// One document of a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Position in the stream, counted from the index the parse started at.
    pub index: usize,
    /// `%YAML` and `%TAG` lines, comments removed.
    pub directives: Vec<String>,
    pub start_marker: Option<NodeId>,
    pub end_marker: Option<NodeId>,
    pub root: NodeId,
    pub warnings: Vec<Warning>,
    pub(crate) arena: Vec<Node>,
}

impl Document {
    /// The node stored at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was taken from another document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.arena[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id.0)
    }

    pub fn root(&self) -> &Node {
        self.node(self.root)
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> &[Node] {
        &self.arena
    }

    pub fn has_start_marker(&self) -> bool {
        self.start_marker.is_some()
    }

    pub fn has_end_marker(&self) -> bool {
        self.end_marker.is_some()
    }

    /// Follow an alias to the node it refers to. Other nodes resolve to
    /// themselves.
    pub fn resolve_alias(&self, id: NodeId) -> NodeId {
        self.node(id).as_alias().unwrap_or(id)
    }

    /// Value of the first entry of mapping `map` whose key is the string
    /// `key`. Aliases are followed on both the mapping and the key.
    pub fn lookup(&self, map: NodeId, key: &str) -> Option<NodeId> {
        let entries = self.node(self.resolve_alias(map)).as_mapping()?;
        entries
            .iter()
            .find(|e| self.node(self.resolve_alias(e.key)).raw() == Some(key))
            .map(|e| e.value)
    }

    /// The merge sources named by a `<<` entry, in source order and without
    /// flattening: the alias itself, or each element of a sequence value.
    pub fn merge_sources(&self, entry: &MappingEntry) -> Vec<NodeId> {
        if !entry.merge {
            return Vec::new();
        }
        match self.node(entry.value).as_sequence() {
            Some(items) => items.to_vec(),
            None => vec![entry.value],
        }
    }

    /// Render a node as single-line flow text, for tests and diagnostics.
    /// Scalars print through their resolved value's `Debug`.
    pub fn inspect(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.inspect_into(id, &mut out);
        out
    }

    fn inspect_into(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        if let Some(anchor) = &node.anchor {
            out.push_str(&format!("&{} ", anchor));
        }
        if let Some(tag) = &node.tag {
            out.push_str(tag);
            out.push(' ');
        }
        match &node.kind {
            NodeKind::Null => out.push('~'),
            NodeKind::Scalar { value, .. } => out.push_str(&format!("{:?}", value)),
            NodeKind::Sequence { items, .. } => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.inspect_into(*item, out);
                }
                out.push(']');
            }
            NodeKind::Mapping { entries, .. } => {
                out.push('{');
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.inspect_into(entry.key, out);
                    out.push_str(": ");
                    self.inspect_into(entry.value, out);
                }
                out.push('}');
            }
            NodeKind::Alias { name, .. } => out.push_str(&format!("*{}", name)),
            NodeKind::DocumentMarker(Marker::Start) => out.push_str("---"),
            NodeKind::DocumentMarker(Marker::End) => out.push_str("..."),
        }
    }
}

/// The documents of one input buffer, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
    pub documents: Vec<Document>,
}

impl Stream {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }
}

impl<'a> IntoIterator for &'a Stream {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// What to do after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the node's children.
    Continue,
    /// Do not visit the node's children.
    Skip,
}

/// Callback for [`walk`].
pub trait Visitor {
    fn visit(&mut self, doc: &Document, id: NodeId, node: &Node) -> Visit;
}

impl<F> Visitor for F
where
    F: FnMut(&Document, NodeId, &Node) -> Visit,
{
    fn visit(&mut self, doc: &Document, id: NodeId, node: &Node) -> Visit {
        self(doc, id, node)
    }
}

/// Visit a document's nodes in source order: the start marker, the root
/// tree depth first, then the end marker.
///
/// Aliases are visited as leaves; the node they point at is reached only
/// through its own position in the tree.
pub fn walk<V: Visitor + ?Sized>(doc: &Document, visitor: &mut V) {
    if let Some(marker) = doc.start_marker {
        visitor.visit(doc, marker, doc.node(marker));
    }
    let mut stack = vec![doc.root];
    while let Some(id) = stack.pop() {
        let node = doc.node(id);
        if visitor.visit(doc, id, node) == Visit::Skip {
            continue;
        }
        stack.extend(node.children().into_iter().rev());
    }
    if let Some(marker) = doc.end_marker {
        visitor.visit(doc, marker, doc.node(marker));
    }
}
