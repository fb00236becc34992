//! Structural tests over the public API.

use libyast::{
    parse, parse_str, parse_with_options, resolve, tokenize, walk, Document, ErrorKind, Node,
    NodeId, NodeKind, ParseOptions, ScalarStyle, ScalarType, ScalarValue, Stream, SyntaxError,
    TokenKind, Visit, Warning,
};

fn single(src: &str) -> Document {
    let mut stream = parse_str(src).unwrap();
    assert_eq!(stream.len(), 1);
    stream.documents.remove(0)
}

fn value_of<'d>(doc: &'d Document, key: &str) -> &'d Node {
    doc.node(doc.lookup(doc.root, key).unwrap())
}

/// Structure and resolved values only, ignoring style and positions.
fn shape(doc: &Document, id: NodeId) -> String {
    let node = doc.node(id);
    match &node.kind {
        NodeKind::Sequence { items, .. } => {
            let items: Vec<String> = items.iter().map(|&i| shape(doc, i)).collect();
            format!("[{}]", items.join(","))
        }
        NodeKind::Mapping { entries, .. } => {
            let entries: Vec<String> = entries
                .iter()
                .map(|e| format!("{}:{}", shape(doc, e.key), shape(doc, e.value)))
                .collect();
            format!("{{{}}}", entries.join(","))
        }
        NodeKind::Alias { target, .. } => shape(doc, *target),
        _ => doc.inspect(id),
    }
}

#[test]
fn plain_and_quoted_booleans_differ() {
    let doc = single("plain: true\nquoted: \"true\"\n");
    let plain = value_of(&doc, "plain");
    let quoted = value_of(&doc, "quoted");
    assert_eq!(plain.as_scalar(), Some(&ScalarValue::Bool(true)));
    assert_eq!(quoted.as_str(), Some("true"));
    assert_eq!(plain.style(), Some(ScalarStyle::Plain));
    assert_eq!(quoted.style(), Some(ScalarStyle::DoubleQuoted));
    assert_eq!(plain.raw(), quoted.raw());
}

#[test]
fn lookalike_scalars_stay_strings() {
    let doc = single("a: bogus\nb: 1:1\nc: 1.2.3.4\nd: 3s\ne: <foo>\n");
    for (key, text) in [("a", "bogus"), ("b", "1:1"), ("c", "1.2.3.4"), ("d", "3s"), ("e", "<foo>")] {
        assert_eq!(value_of(&doc, key).as_str(), Some(text));
    }
}

#[test]
fn alias_shares_the_anchored_node() {
    let doc = single("anchored: &a foo\naliased: *a\n");
    let anchored = doc.lookup(doc.root, "anchored").unwrap();
    let aliased = doc.lookup(doc.root, "aliased").unwrap();
    assert_ne!(anchored, aliased);
    assert_eq!(doc.resolve_alias(aliased), anchored);
    match &doc.node(aliased).kind {
        NodeKind::Alias { name, target } => {
            assert_eq!(name, "a");
            assert_eq!(*target, anchored);
        }
        other => panic!("expected alias, got {:?}", other),
    }
}

#[test]
fn merge_sources_keep_order_without_flattening() {
    let doc = single("x: &X {a: 1}\ny: &Y {b: 2}\nz:\n  <<: [*X, *Y]\n  c: 3\n");
    let z = doc.lookup(doc.root, "z").unwrap();
    let entries = doc.node(z).as_mapping().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].merge);
    let sources: Vec<NodeId> = doc
        .merge_sources(&entries[0])
        .into_iter()
        .map(|s| doc.resolve_alias(s))
        .collect();
    assert_eq!(
        sources,
        vec![
            doc.lookup(doc.root, "x").unwrap(),
            doc.lookup(doc.root, "y").unwrap()
        ]
    );
    assert!(doc.merge_sources(&entries[1]).is_empty());
}

#[test]
fn single_merge_source() {
    let doc = single("base: &b {a: 1}\nderived:\n  <<: *b\n");
    let derived = doc.lookup(doc.root, "derived").unwrap();
    let entry = doc.node(derived).as_mapping().unwrap()[0];
    let sources = doc.merge_sources(&entry);
    assert_eq!(sources, vec![entry.value]);
}

#[test]
fn block_scalar_chomping() {
    let doc = single("a: |-\n  x\n  y\n\nb: >-\n  x\n  y\n\nc: |\n  x\n  y\n\n\nd: >\n  x\n  y\n\n\n");
    assert_eq!(value_of(&doc, "a").as_str(), Some("x\ny"));
    assert_eq!(value_of(&doc, "b").as_str(), Some("x y"));
    assert_eq!(value_of(&doc, "c").as_str(), Some("x\ny\n"));
    assert_eq!(value_of(&doc, "d").as_str(), Some("x y\n"));
    assert_eq!(value_of(&doc, "c").style(), Some(ScalarStyle::Literal));
    assert_eq!(value_of(&doc, "d").style(), Some(ScalarStyle::Folded));
}

#[test]
fn misaligned_mapping_key_is_structural_error() {
    let err = parse_str("a:\n- b\n  c: d\n  e: f\n  g: h").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert_eq!(err.line(), 3);
    assert!(err.message.contains("expected a sequence entry"));
}

#[test]
fn two_documents_have_independent_anchors() {
    let stream = parse_str("---\na: &x 1\nb: *x\n...\n---\na: &x 2\nb: *x\n...\n").unwrap();
    assert_eq!(stream.len(), 2);
    for (i, doc) in stream.iter().enumerate() {
        let b = doc.lookup(doc.root, "b").unwrap();
        let target = doc.node(doc.resolve_alias(b));
        assert_eq!(target.as_scalar().and_then(ScalarValue::as_i64), Some(i as i64 + 1));
        assert!(doc.warnings.is_empty());
    }

    let err = parse_str("---\na: &x 1\n---\nb: *x\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);
}

#[test]
fn flow_and_block_styles_build_the_same_tree() {
    let flow = single("a: {x: 1}\nb: [1, 2]\n");
    let block = single("a:\n  x: 1\nb:\n  - 1\n  - 2\n");
    assert_eq!(shape(&flow, flow.root), shape(&block, block.root));
    assert!(value_of(&flow, "a").is_flow());
    assert!(!value_of(&block, "a").is_flow());
}

#[test]
fn equivalent_layouts_agree() {
    let inputs = [
        "{a: [1, two, {c: null}], d: \"e\"}",
        "a:\n- 1\n- two\n- c: null\nd: e\n",
        "a:\n  - 1\n  - two\n  -\n    c: ~\nd: 'e'\n",
    ];
    let shapes: Vec<String> = inputs
        .iter()
        .map(|src| {
            let doc = single(src);
            shape(&doc, doc.root)
        })
        .collect();
    assert!(shapes.windows(2).all(|w| w[0] == w[1]), "{:?}", shapes);
}

#[test]
fn positions_are_one_based_and_nested() {
    let doc = single("top:\n  inner: [a, b]\n");
    let inner = value_of(&doc, "top");
    assert_eq!((inner.start.line, inner.start.column), (2, 3));
    let list = doc.lookup(doc.lookup(doc.root, "top").unwrap(), "inner").unwrap();
    let list = doc.node(list);
    assert_eq!((list.start.line, list.start.column), (2, 10));
    assert_eq!(list.end.offset, "top:\n  inner: [a, b]".len());

    let mut violations = 0;
    walk(&doc, &mut |d: &Document, _: NodeId, node: &Node| {
        for child in node.children() {
            let child = d.node(child);
            if child.start < node.start || child.end > node.end {
                violations += 1;
            }
        }
        Visit::Continue
    });
    assert_eq!(violations, 0);
}

#[test]
fn walk_visits_markers_and_honours_skip() {
    let doc = single("---\na: [1, 2]\nb: 3\n...\n");
    let mut kinds = Vec::new();
    walk(&doc, &mut |_: &Document, _: NodeId, node: &Node| {
        kinds.push(match &node.kind {
            NodeKind::DocumentMarker(_) => "marker",
            NodeKind::Mapping { .. } => "map",
            NodeKind::Sequence { .. } => "seq",
            _ => "scalar",
        });
        if matches!(node.kind, NodeKind::Sequence { .. }) {
            Visit::Skip
        } else {
            Visit::Continue
        }
    });
    assert_eq!(
        kinds,
        vec!["marker", "map", "scalar", "seq", "scalar", "scalar", "marker"]
    );
}

#[test]
fn struct_visitor() {
    #[derive(Default)]
    struct Scalars(Vec<ScalarType>);

    impl libyast::Visitor for Scalars {
        fn visit(&mut self, _: &Document, _: NodeId, node: &Node) -> Visit {
            if let Some(value) = node.as_scalar() {
                self.0.push(value.scalar_type());
            }
            Visit::Continue
        }
    }

    let doc = single("- ~\n- yes\n- 0o17\n- 2.5\n- 2001-12-14t21:59:43.10-05:00\n- !!binary AAEC\n");
    let mut scalars = Scalars::default();
    walk(&doc, &mut scalars);
    assert_eq!(
        scalars.0,
        vec![
            ScalarType::Null,
            ScalarType::String,
            ScalarType::Integer,
            ScalarType::Float,
            ScalarType::Timestamp,
            ScalarType::Binary
        ]
    );
}

#[test]
fn anchor_redefinition_is_a_warning() {
    let doc = single("a: &x 1\nb: &x 2\nc: *x\n");
    assert!(matches!(
        doc.warnings.as_slice(),
        [Warning::AnchorRedefined { name, .. }] if name == "x"
    ));
    let c = doc.lookup(doc.root, "c").unwrap();
    assert_eq!(doc.resolve_alias(c), doc.lookup(doc.root, "b").unwrap());
}

#[test]
fn empty_values_are_null_nodes() {
    let doc = single("a:\nb: ~\n");
    assert!(value_of(&doc, "a").is_null());
    let b = value_of(&doc, "b");
    assert!(!b.is_null());
    assert_eq!(b.as_scalar(), Some(&ScalarValue::Null));
}

#[test]
fn tokens_carry_positions_and_chomping() {
    let tokens = tokenize(b"key: |+\n  text\n").unwrap();
    assert_eq!(
        tokens.kinds(),
        vec![
            TokenKind::PlainScalar,
            TokenKind::MappingValue,
            TokenKind::Literal,
            TokenKind::EndOfStream
        ]
    );
    let literal = &tokens.tokens[2];
    assert_eq!(literal.chomping, Some(libyast::Chomping::Keep));
    assert_eq!((literal.line(), literal.column()), (1, 6));
    assert_eq!(tokens.next(1).map(|t| t.kind), Some(TokenKind::Literal));
    assert_eq!(tokens.prev(1).map(|t| t.kind), Some(TokenKind::PlainScalar));
}

#[test]
fn resolve_matches_parsed_scalars() {
    for text in ["12", "-3.5", ".inf", "null", "2002-12-14", "word"] {
        let doc = single(&format!("v: {}\n", text));
        assert_eq!(
            value_of(&doc, "v").as_scalar(),
            Some(&resolve(text, ScalarStyle::Plain))
        );
    }
}

#[test]
fn byte_order_mark_and_crlf() {
    let doc = single("\u{FEFF}a: 1\r\nb: 2\r\n");
    assert_eq!(value_of(&doc, "b").as_scalar(), Some(&ScalarValue::from(2i64)));
    assert_eq!(value_of(&doc, "b").start.line, 2);
}

#[test]
fn invalid_utf8_is_lexical() {
    let err = parse(b"a: \xc3\x28\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lexical);
}

#[test]
fn options_apply_to_every_stage() {
    let options = ParseOptions::default()
        .with_filename("conf.yaml")
        .with_max_depth(2);
    let err = parse_with_options(b"a: 'open", &options).unwrap_err();
    assert_eq!(err.filename.as_deref(), Some("conf.yaml"));
    let err = parse_with_options(b"a: [b]", &options).unwrap_err();
    assert!(err.to_string().ends_with("of <conf.yaml>"));
    assert!(parse_with_options(b"a: b", &options).is_ok());
}

#[test]
fn results_cross_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Stream>();
    assert_send_sync::<SyntaxError>();
    assert_send_sync::<libyast::TokenStream>();

    let handles: Vec<_> = (0..4)
        .map(|i| std::thread::spawn(move || parse_str(&format!("n: {}", i)).map(|s| s.len())))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(1));
    }
}
