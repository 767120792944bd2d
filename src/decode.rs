//! Schema-driven decoding of the node tree.
//!
//! Every document type implements [`Decode`]. Decoding never stops at the
//! first problem: each mismatch is recorded in the [`Decoder`] as a
//! [`DecodeError`] and decoding carries on with the next field, so a single
//! pass reports everything that is wrong with a document.

use std::collections::BTreeMap;

use nonempty::NonEmpty;

pub mod node;
pub use node::{Node, NodeKind};

/// Decodes a whole document.
///
/// An absent document (`None`) is decoded as an empty value on line 1.
///
/// # Errors
///
/// Returns every error detected during the pass, in detection order.
pub fn decode<T: Decode>(root: Option<&Node>) -> Result<T, NonEmpty<DecodeError>> {
    let empty = Node::null(1);
    let root = root.unwrap_or(&empty);

    let mut decoder = Decoder::default();
    let value = T::decode(root, &mut decoder);

    match (NonEmpty::from_vec(decoder.errors), value) {
        (Some(errors), _) => Err(errors),
        (None, Some(value)) => Ok(value),
        (None, None) => Err(NonEmpty::new(DecodeError {
            line: root.line(),
            path: String::new(),
            target: T::TARGET,
            problem: Problem::Kind {
                found: root.kind(),
                value: root.snippet(),
            },
        })),
    }
}

/// A type that can be decoded from a node.
pub trait Decode: Sized {
    /// The target reported in diagnostics when decoding fails.
    const TARGET: Target;

    /// Decodes a value from `node`.
    ///
    /// Problems are recorded in `cx`. Returns `None` only if no value at all
    /// can be produced; a record with some broken fields is still returned,
    /// with those fields left at their defaults.
    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self>;
}

/// What a failed decode was aiming for.
///
/// The tokens are looked up in the diagnostic vocabulary to produce
/// readable names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A single type, e.g. `NamedParameter`.
    Type(&'static str),
    /// A sequence of the given type.
    SequenceOf(&'static str),
    /// A mapping from names to the given type.
    MappingOf(&'static str),
}

impl Target {
    /// The type token, without the container.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Type(token) | Self::SequenceOf(token) | Self::MappingOf(token) => token,
        }
    }
}

/// What went wrong with a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// The node is of the wrong kind.
    Kind {
        /// The kind that was found.
        found: NodeKind,
        /// An excerpt of the value, for scalars.
        value: Option<String>,
    },
    /// A required field is absent.
    Missing {
        /// The missing key.
        field: &'static str,
    },
    /// The node has the right kind but an unacceptable value.
    Invalid {
        /// An excerpt of the value.
        value: String,
        /// A description of acceptable values.
        expected: &'static str,
    },
}

/// A single decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    /// The 1-based line of the offending node in the preprocessed text.
    pub line: usize,
    /// The dotted path of keys leading to the offending node.
    pub path: String,
    /// What the node was being decoded into.
    pub target: Target,
    /// What went wrong.
    pub problem: Problem,
}

/// Decoding state: the current key path and the errors found so far.
#[derive(Debug, Default)]
pub struct Decoder {
    path: Vec<String>,
    errors: Vec<DecodeError>,
}

impl Decoder {
    /// The errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> &[DecodeError] {
        &self.errors
    }

    /// Records a problem with `node`.
    pub fn report(&mut self, node: &Node, target: Target, problem: Problem) {
        self.errors.push(DecodeError {
            line: node.line(),
            path: self.path.join("."),
            target,
            problem,
        });
    }

    /// Records that `node` is of the wrong kind for `target`.
    pub fn mismatch(&mut self, node: &Node, target: Target) {
        self.report(
            node,
            target,
            Problem::Kind {
                found: node.kind(),
                value: node.snippet(),
            },
        );
    }

    /// Records that `node` holds an unacceptable value for `target`.
    pub fn invalid(&mut self, node: &Node, target: Target, expected: &'static str) {
        let value = node.snippet().unwrap_or_else(|| node.kind().token().to_string());
        self.report(node, target, Problem::Invalid { value, expected });
    }

    /// Runs `f` with `segment` appended to the key path.
    pub fn nested<R>(&mut self, segment: impl Into<String>, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(segment.into());
        let result = f(self);
        self.path.pop();
        result
    }

    /// Views `node` as a mapping with fixed keys.
    ///
    /// A null node is treated as an empty mapping. Any other non-mapping
    /// node is reported against `target`.
    pub fn mapping<'n>(&mut self, node: &'n Node, target: Target) -> Option<Mapping<'n>> {
        if node.is_null() {
            return Some(Mapping { node, entries: &[] });
        }
        if let Some(entries) = node.entries() {
            Some(Mapping { node, entries })
        } else {
            self.mismatch(node, target);
            None
        }
    }

    /// Decodes the optional field `key`.
    ///
    /// Returns `None` if the field is absent or null, or fails to decode.
    pub fn field<T: Decode>(&mut self, mapping: &Mapping<'_>, key: &str) -> Option<T> {
        let node = mapping.get(key).filter(|node| !node.is_null())?;
        self.nested(key, |cx| T::decode(node, cx))
    }

    /// Decodes the required field `key`, reporting it against `target` if
    /// it is absent.
    pub fn required<T: Decode>(
        &mut self,
        mapping: &Mapping<'_>,
        key: &'static str,
        target: Target,
    ) -> Option<T> {
        if mapping.get(key).is_none_or(Node::is_null) {
            self.report(mapping.node, target, Problem::Missing { field: key });
            return None;
        }
        self.field(mapping, key)
    }

    /// Decodes the entries of a mapping node with `decode_entry`, which
    /// validates the key and decodes the value.
    ///
    /// A null node yields an empty map. Keys that are not scalars are
    /// reported against `key_target`; entries for which `decode_entry`
    /// returns `None` are dropped.
    pub fn entries<K: Ord, T>(
        &mut self,
        node: &Node,
        target: Target,
        key_target: Target,
        mut decode_entry: impl FnMut(&mut Self, &Node, &str, &Node) -> Option<(K, T)>,
    ) -> BTreeMap<K, T> {
        let Some(mapping) = self.mapping(node, target) else {
            return BTreeMap::new();
        };

        let mut decoded = BTreeMap::new();
        for (key, value) in mapping.entries {
            let Some(name) = key.as_str() else {
                self.mismatch(key, key_target);
                continue;
            };
            if let Some((key, value)) =
                self.nested(name, |cx| decode_entry(cx, key, name, value))
            {
                decoded.insert(key, value);
            }
        }
        decoded
    }
}

/// A mapping node viewed as a set of fixed keys.
#[derive(Debug, Clone, Copy)]
pub struct Mapping<'n> {
    node: &'n Node,
    entries: &'n [(Node, Node)],
}

impl<'n> Mapping<'n> {
    /// The node for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'n Node> {
        self.entries
            .iter()
            .find(|(k, _)| k.kind().is_scalar() && k.as_str() == Some(key))
            .map(|(_, value)| value)
    }

    /// The entries whose key satisfies `predicate`, in document order.
    pub fn matching(
        &self,
        predicate: impl Fn(&str) -> bool,
    ) -> impl Iterator<Item = (&'n Node, &'n Node)> {
        self.entries
            .iter()
            .filter(move |(key, _)| key.as_str().is_some_and(&predicate))
            .map(|(key, value)| (key, value))
    }

    /// The keys not in `known` that also fail `predicate`.
    ///
    /// Used to log keys that will be ignored.
    pub fn unknown(
        &self,
        known: &[&str],
        predicate: impl Fn(&str) -> bool,
    ) -> impl Iterator<Item = &'n str> {
        self.entries
            .iter()
            .filter_map(|(key, _)| key.as_str())
            .filter(move |key| !known.contains(key) && !predicate(key))
    }

    /// The mapping node itself.
    #[must_use]
    pub const fn node(&self) -> &'n Node {
        self.node
    }
}

impl Decode for String {
    const TARGET: Target = Target::Type("string");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        match node.kind() {
            NodeKind::Null => Some(Self::new()),
            kind if kind.is_scalar() => node.as_str().map(ToString::to_string),
            _ => {
                cx.mismatch(node, Self::TARGET);
                None
            }
        }
    }
}

impl Decode for i64 {
    const TARGET: Target = Target::Type("int");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        if node.kind() != NodeKind::Int {
            cx.mismatch(node, Self::TARGET);
            return None;
        }
        let parsed = node.as_str().and_then(node::parse_int);
        if parsed.is_none() {
            cx.invalid(node, Self::TARGET, "a 64-bit integer");
        }
        parsed
    }
}

impl Decode for u64 {
    const TARGET: Target = Target::Type("int");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        let value = i64::decode(node, cx)?;
        let converted = Self::try_from(value).ok();
        if converted.is_none() {
            cx.invalid(node, Self::TARGET, "a non-negative integer");
        }
        converted
    }
}

impl Decode for f64 {
    const TARGET: Target = Target::Type("float");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        if !matches!(node.kind(), NodeKind::Int | NodeKind::Float) {
            cx.mismatch(node, Self::TARGET);
            return None;
        }
        let parsed = node.as_str().and_then(node::parse_float);
        if parsed.is_none() {
            cx.invalid(node, Self::TARGET, "a number");
        }
        parsed
    }
}

impl Decode for bool {
    const TARGET: Target = Target::Type("bool");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        if node.kind() == NodeKind::Bool {
            node.as_str().map(|text| text.eq_ignore_ascii_case("true"))
        } else {
            cx.mismatch(node, Self::TARGET);
            None
        }
    }
}

impl Decode for serde_yaml::Value {
    const TARGET: Target = Target::Type("any");

    fn decode(node: &Node, _cx: &mut Decoder) -> Option<Self> {
        Some(node.to_value())
    }
}

impl<T: Decode> Decode for Vec<T> {
    const TARGET: Target = Target::SequenceOf(T::TARGET.token());

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        if node.is_null() {
            return Some(Self::new());
        }
        let Some(items) = node.items() else {
            cx.mismatch(node, Self::TARGET);
            return None;
        };
        Some(
            items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| cx.nested(index.to_string(), |cx| T::decode(item, cx)))
                .collect(),
        )
    }
}

impl<T: Decode> Decode for BTreeMap<String, T> {
    const TARGET: Target = Target::MappingOf(T::TARGET.token());

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        if !node.is_null() && node.entries().is_none() {
            cx.mismatch(node, Self::TARGET);
            return None;
        }
        Some(cx.entries(node, Self::TARGET, String::TARGET, |cx, _, name, value| {
            T::decode(value, cx).map(|value| (name.to_string(), value))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Node {
        node::load(text).unwrap().unwrap()
    }

    #[derive(Debug, PartialEq)]
    struct Sample {
        name: String,
        count: Option<i64>,
        enabled: bool,
        tags: Vec<String>,
    }

    impl Decode for Sample {
        const TARGET: Target = Target::Type("Sample");

        fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
            let mapping = cx.mapping(node, Self::TARGET)?;
            Some(Self {
                name: cx.required(&mapping, "name", Self::TARGET).unwrap_or_default(),
                count: cx.field(&mapping, "count"),
                enabled: cx.field(&mapping, "enabled").unwrap_or(false),
                tags: cx.field(&mapping, "tags").unwrap_or_default(),
            })
        }
    }

    #[test]
    fn decodes_fixed_keys_with_defaults() {
        let node = parse("name: sample\ntags: [a, b]\n");
        let sample: Sample = decode(Some(&node)).unwrap();

        assert_eq!(
            sample,
            Sample {
                name: "sample".to_string(),
                count: None,
                enabled: false,
                tags: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn accumulates_every_error_in_order() {
        let node = parse("count: many\nenabled: 3\ntags: {a: 1}\n");
        let errors = decode::<Sample>(Some(&node)).unwrap_err();

        let errors: Vec<_> = errors.into_iter().collect();
        assert_eq!(errors.len(), 4);

        assert_eq!(errors[0].problem, Problem::Missing { field: "name" });
        assert_eq!(errors[0].target, Target::Type("Sample"));

        assert_eq!(errors[1].line, 1);
        assert_eq!(errors[1].path, "count");
        assert_eq!(
            errors[1].problem,
            Problem::Kind {
                found: NodeKind::Str,
                value: Some("many".to_string())
            }
        );

        assert_eq!(errors[2].line, 2);
        assert_eq!(errors[2].target, Target::Type("bool"));

        assert_eq!(errors[3].line, 3);
        assert_eq!(errors[3].target, Target::SequenceOf("string"));
    }

    #[test]
    fn decoding_is_deterministic() {
        let node = parse("count: many\nname: [x]\n");
        let first = decode::<Sample>(Some(&node));
        let second = decode::<Sample>(Some(&node));
        assert_eq!(first, second);
    }

    #[test]
    fn paths_include_sequence_indices() {
        let node = parse("name: x\ntags: [a, [b], c]\n");
        let errors = decode::<Sample>(Some(&node)).unwrap_err();
        assert_eq!(errors.head.path, "tags.1");
    }

    #[test]
    fn absent_document_is_an_empty_mapping() {
        let errors = decode::<Sample>(None).unwrap_err();
        assert_eq!(errors.head.line, 1);
        assert_eq!(errors.head.problem, Problem::Missing { field: "name" });
    }

    #[test]
    fn non_mapping_document_is_a_mismatch() {
        let node = parse("- just\n- a list\n");
        let errors = decode::<Sample>(Some(&node)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.head.target, Target::Type("Sample"));
    }

    #[test]
    fn string_accepts_any_scalar() {
        let node = parse("a: 1\nb: true\nc: text\n");
        let map: BTreeMap<String, String> = decode(Some(&node)).unwrap();
        assert_eq!(map["a"], "1");
        assert_eq!(map["b"], "true");
        assert_eq!(map["c"], "text");
    }

    #[test]
    fn negative_unsigned_is_invalid() {
        let node = parse("-3\n");
        let errors = decode::<u64>(Some(&node)).unwrap_err();
        assert!(matches!(errors.head.problem, Problem::Invalid { .. }));
    }

    #[test]
    fn integers_are_accepted_as_floats() {
        let node = parse("5\n");
        assert!((decode::<f64>(Some(&node)).unwrap() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn complex_keys_are_reported() {
        let node = parse("? [a, b]\n: value\n");
        let errors = decode::<BTreeMap<String, String>>(Some(&node)).unwrap_err();
        assert_eq!(errors.head.target, Target::Type("string"));
        assert_eq!(
            errors.head.problem,
            Problem::Kind {
                found: NodeKind::Sequence,
                value: None
            }
        );
    }
}
