//! A line-marked YAML node tree.
//!
//! The decoder needs to know which line each value sits on, which the serde
//! based YAML front-ends do not expose. Instead the tree is assembled from
//! the marked event stream of `yaml-rust2`'s parser. Scalars are resolved to
//! a [`NodeKind`] with the YAML 1.2 core schema rules.

use std::{collections::HashMap, fmt, sync::LazyLock};

use regex::Regex;
use yaml_rust2::{
    parser::{Event, MarkedEventReceiver, Parser},
    scanner::{Marker, ScanError, TScalarStyle},
};

/// The most nodes that aliases may expand to within one document.
pub const ALIAS_BUDGET: usize = 100_000;

/// Parses the first YAML document in `text` into a node tree.
///
/// Returns `Ok(None)` if the text holds no document at all (for example
/// only comments).
///
/// # Errors
///
/// Returns the scanner error if `text` is not well-formed YAML, or an error
/// at the offending alias if aliases expand to more than [`ALIAS_BUDGET`]
/// nodes.
pub fn load(text: &str) -> Result<Option<Node>, ScanError> {
    let mut builder = Builder::default();
    let mut parser = Parser::new(text.chars());
    parser.load(&mut builder, false)?;

    if let Some(mark) = builder.overflow {
        return Err(ScanError::new(mark, "aliases expand to too many nodes"));
    }
    Ok(builder.root)
}

/// The kind of a YAML node, as seen by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// `~`, `null` or an empty value.
    Null,
    /// `true` or `false`.
    Bool,
    /// A decimal, octal (`0o`) or hexadecimal (`0x`) integer.
    Int,
    /// A floating point number, including `.inf` and `.nan`.
    Float,
    /// Any other scalar, and every quoted or block scalar.
    Str,
    /// A sequence.
    Sequence,
    /// A mapping.
    Mapping,
}

impl NodeKind {
    /// The YAML core schema tag for this kind, e.g. `!!str`.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Null => "!!null",
            Self::Bool => "!!bool",
            Self::Int => "!!int",
            Self::Float => "!!float",
            Self::Str => "!!str",
            Self::Sequence => "!!seq",
            Self::Mapping => "!!map",
        }
    }

    /// Whether this is a scalar kind.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(self, Self::Sequence | Self::Mapping)
    }

    fn resolve(text: &str, style: TScalarStyle) -> Self {
        static INT: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^(?:[-+]?[0-9]+|0o[0-7]+|0x[0-9a-fA-F]+)$").expect("valid regex")
        });
        static FLOAT: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                r"^(?:[-+]?(?:\.[0-9]+|[0-9]+(?:\.[0-9]*)?)(?:[eE][-+]?[0-9]+)?|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$",
            )
            .expect("valid regex")
        });

        if !matches!(style, TScalarStyle::Plain) {
            return Self::Str;
        }

        match text {
            "" | "~" | "null" | "Null" | "NULL" => Self::Null,
            "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => Self::Bool,
            _ if INT.is_match(text) => Self::Int,
            _ if FLOAT.is_match(text) => Self::Float,
            _ => Self::Str,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A YAML node with the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    line: usize,
    content: Content,
}

#[derive(Debug, Clone, PartialEq)]
enum Content {
    Scalar { text: String, kind: NodeKind },
    Sequence(Vec<Node>),
    Mapping(Vec<(Node, Node)>),
}

impl Node {
    /// A null node, used where a document or value is absent.
    #[must_use]
    pub const fn null(line: usize) -> Self {
        Self {
            line,
            content: Content::Scalar {
                text: String::new(),
                kind: NodeKind::Null,
            },
        }
    }

    /// The 1-based line the node starts on.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// The kind of the node.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match &self.content {
            Content::Scalar { kind, .. } => *kind,
            Content::Sequence(_) => NodeKind::Sequence,
            Content::Mapping(_) => NodeKind::Mapping,
        }
    }

    /// Whether the node is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.kind(), NodeKind::Null)
    }

    /// The text of a scalar node.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.content {
            Content::Scalar { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The items of a sequence node.
    #[must_use]
    pub fn items(&self) -> Option<&[Self]> {
        match &self.content {
            Content::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// The entries of a mapping node, in document order.
    #[must_use]
    pub fn entries(&self) -> Option<&[(Self, Self)]> {
        match &self.content {
            Content::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// A short excerpt of a scalar's text, for diagnostics.
    #[must_use]
    pub fn snippet(&self) -> Option<String> {
        const MAX_CHARS: usize = 40;

        let text = self.as_str()?;
        if text.chars().count() > MAX_CHARS {
            let truncated: String = text.chars().take(MAX_CHARS).collect();
            Some(format!("{truncated}..."))
        } else {
            Some(text.to_string())
        }
    }

    /// The number of nodes in this subtree, counting the node itself.
    fn size(&self) -> usize {
        match &self.content {
            Content::Scalar { .. } => 1,
            Content::Sequence(items) => 1 + items.iter().map(Self::size).sum::<usize>(),
            Content::Mapping(entries) => {
                1 + entries
                    .iter()
                    .map(|(key, value)| key.size() + value.size())
                    .sum::<usize>()
            }
        }
    }

    /// Converts the node into a free-form YAML value.
    #[must_use]
    pub fn to_value(&self) -> serde_yaml::Value {
        use serde_yaml::Value;

        match &self.content {
            Content::Scalar { text, kind } => match kind {
                NodeKind::Null => Value::Null,
                NodeKind::Bool => Value::Bool(text.eq_ignore_ascii_case("true")),
                NodeKind::Int => parse_int(text).map_or_else(|| Value::String(text.clone()), Value::from),
                NodeKind::Float => parse_float(text).map_or_else(|| Value::String(text.clone()), Value::from),
                _ => Value::String(text.clone()),
            },
            Content::Sequence(items) => Value::Sequence(items.iter().map(Self::to_value).collect()),
            Content::Mapping(entries) => Value::Mapping(
                entries
                    .iter()
                    .map(|(key, value)| (key.to_value(), value.to_value()))
                    .collect(),
            ),
        }
    }
}

/// Parses the text of an `!!int` scalar.
#[must_use]
pub fn parse_int(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(octal) = text.strip_prefix("0o") {
        i64::from_str_radix(octal, 8).ok()
    } else {
        text.parse().ok()
    }
}

/// Parses the text of an `!!float` or `!!int` scalar.
#[must_use]
pub fn parse_float(text: &str) -> Option<f64> {
    let unsigned = text.trim_start_matches(['-', '+']);
    let negative = text.starts_with('-');

    match unsigned {
        ".inf" | ".Inf" | ".INF" if negative => Some(f64::NEG_INFINITY),
        ".inf" | ".Inf" | ".INF" => Some(f64::INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        #[allow(clippy::cast_precision_loss)]
        _ => parse_int(text).map_or_else(|| text.parse().ok(), |int| Some(int as f64)),
    }
}

/// Assembles nodes from parser events.
#[derive(Debug, Default)]
struct Builder {
    stack: Vec<Frame>,
    /// Anchored nodes with their sizes.
    anchors: HashMap<usize, (Node, usize)>,
    root: Option<Node>,
    /// Nodes produced by alias expansion so far.
    aliased: usize,
    /// The first alias that would have exceeded [`ALIAS_BUDGET`].
    overflow: Option<Marker>,
}

#[derive(Debug)]
struct Frame {
    line: usize,
    anchor: usize,
    partial: Partial,
}

#[derive(Debug)]
enum Partial {
    Sequence(Vec<Node>),
    Mapping {
        entries: Vec<(Node, Node)>,
        key: Option<Node>,
    },
}

impl Builder {
    fn open(&mut self, mark: Marker, anchor: usize, partial: Partial) {
        self.stack.push(Frame {
            line: mark.line(),
            anchor,
            partial,
        });
    }

    fn close(&mut self) {
        let Some(Frame {
            line,
            anchor,
            partial,
        }) = self.stack.pop()
        else {
            return;
        };

        let content = match partial {
            Partial::Sequence(items) => Content::Sequence(items),
            Partial::Mapping { entries, .. } => Content::Mapping(entries),
        };
        self.complete(Node { line, content }, anchor);
    }

    fn complete(&mut self, node: Node, anchor: usize) {
        if anchor != 0 {
            let size = node.size();
            self.anchors.insert(anchor, (node.clone(), size));
        }

        match self.stack.last_mut() {
            None => {
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
            Some(Frame {
                partial: Partial::Sequence(items),
                ..
            }) => items.push(node),
            Some(Frame {
                partial: Partial::Mapping { entries, key },
                ..
            }) => match key.take() {
                Some(key) => entries.push((key, node)),
                None => *key = Some(node),
            },
        }
    }
}

impl MarkedEventReceiver for Builder {
    fn on_event(&mut self, event: Event, mark: Marker) {
        match event {
            Event::Scalar(text, style, anchor, ..) => {
                let kind = NodeKind::resolve(&text, style);
                let node = Node {
                    line: mark.line(),
                    content: Content::Scalar { text, kind },
                };
                self.complete(node, anchor);
            }
            Event::SequenceStart(anchor, ..) => {
                self.open(mark, anchor, Partial::Sequence(Vec::new()));
            }
            Event::MappingStart(anchor, ..) => self.open(
                mark,
                anchor,
                Partial::Mapping {
                    entries: Vec::new(),
                    key: None,
                },
            ),
            Event::SequenceEnd | Event::MappingEnd => self.close(),
            Event::Alias(id) => {
                let line = mark.line();
                let node = match self.anchors.get(&id) {
                    Some((node, size)) if self.aliased + size <= ALIAS_BUDGET => {
                        self.aliased += size;
                        node.clone()
                    }
                    Some(_) => {
                        tracing::debug!(line, "alias expansion budget exhausted");
                        self.overflow.get_or_insert(mark);
                        Node::null(line)
                    }
                    None => Node::null(line),
                };
                self.complete(node, 0);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use test_case::test_case;

    use super::*;

    fn root(text: &str) -> Node {
        load(text).unwrap().unwrap()
    }

    #[test_case("~", NodeKind::Null)]
    #[test_case("null", NodeKind::Null)]
    #[test_case("true", NodeKind::Bool)]
    #[test_case("False", NodeKind::Bool)]
    #[test_case("200", NodeKind::Int)]
    #[test_case("-7", NodeKind::Int)]
    #[test_case("0x1F", NodeKind::Int)]
    #[test_case("1.5", NodeKind::Float)]
    #[test_case("1e3", NodeKind::Float)]
    #[test_case(".inf", NodeKind::Float)]
    #[test_case("abc", NodeKind::Str)]
    #[test_case("'200'", NodeKind::Str; "quoted number")]
    #[test_case("\"true\"", NodeKind::Str; "quoted bool")]
    #[test_case("application/json", NodeKind::Str)]
    #[test_case("[1, 2]", NodeKind::Sequence)]
    #[test_case("{a: 1}", NodeKind::Mapping)]
    fn value_kinds(value: &str, expected: NodeKind) {
        let node = root(&format!("key: {value}\n"));
        let (_, value) = &node.entries().unwrap()[0];
        assert_eq!(value.kind(), expected);
    }

    #[test]
    fn empty_value_is_null() {
        let node = root("key:\nother: 1\n");
        let (_, value) = &node.entries().unwrap()[0];
        assert!(value.is_null());
    }

    #[test]
    fn lines_are_one_based() {
        let node = root("#%RAML 0.8\ntitle: API\nversion: v1\n");
        let entries = node.entries().unwrap();

        assert_eq!(entries[0].0.line(), 2);
        assert_eq!(entries[1].0.line(), 3);
        assert_eq!(entries[1].1.as_str(), Some("v1"));
    }

    #[test]
    fn aliases_resolve_to_anchored_node() {
        let node = root("a: &shared {x: 1}\nb: *shared\n");
        let entries = node.entries().unwrap();
        assert_eq!(entries[0].1, entries[1].1);
    }

    #[test]
    fn moderate_aliasing_is_expanded() {
        let node = root("a: &a [x, y]\nb: &b [*a, *a]\nc: [*b, *b]\n");
        let entries = node.entries().unwrap();
        assert_eq!(entries[2].1.size(), 15);
    }

    #[test]
    fn exponential_aliasing_is_rejected() {
        let mut text = String::from("a0: &a0 [x, x]\n");
        for i in 1..40 {
            writeln!(text, "a{i}: &a{i} [*a{}, *a{}]", i - 1, i - 1).unwrap();
        }

        let error = load(&text).unwrap_err();
        assert!(error.to_string().contains("aliases expand to too many nodes"));
    }

    #[test]
    fn comment_only_document_is_empty() {
        assert!(load("#%RAML 0.8\n# nothing here\n").unwrap().is_none());
    }

    #[test]
    fn only_first_document_is_loaded() {
        let node = root("a: 1\n---\nb: 2\n");
        assert_eq!(node.entries().unwrap()[0].0.as_str(), Some("a"));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(load("key: [unclosed\n").is_err());
    }

    #[test]
    fn converts_to_free_form_value() {
        let node = root("enum: [1, two, 3.5, true, ~]\n");
        let value = node.to_value();

        let expected: serde_yaml::Value = serde_yaml::from_str("enum: [1, two, 3.5, true, null]").unwrap();
        assert_eq!(value, expected);
    }

    #[test]
    fn snippet_truncates_long_scalars() {
        let long = "x".repeat(60);
        let node = root(&format!("k: {long}\n"));
        let snippet = node.entries().unwrap()[0].1.snippet().unwrap();
        assert_eq!(snippet, format!("{}...", "x".repeat(40)));
    }

    #[test_case("0x10", Some(16))]
    #[test_case("0o17", Some(15))]
    #[test_case("-42", Some(-42))]
    #[test_case("99999999999999999999", None; "overflow")]
    fn int_parsing(text: &str, expected: Option<i64>) {
        assert_eq!(parse_int(text), expected);
    }
}
