use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use super::{
    body::Bodies,
    ignore_unknown,
    parameter::{self, Header},
};
use crate::decode::{Decode, Decoder, Mapping, Node, NodeKind, Target};

/// An HTTP status code, e.g. `200`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct HttpCode(u16);

impl HttpCode {
    /// Creates a status code, if `code` is in the range 100 to 599.
    #[must_use]
    pub fn new(code: u16) -> Option<Self> {
        (100..=599).contains(&code).then_some(Self(code))
    }

    /// The numeric code.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for HttpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Decode for HttpCode {
    const TARGET: Target = Target::Type("HttpCode");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        if node.kind() != NodeKind::Int {
            cx.mismatch(node, Self::TARGET);
            return None;
        }

        let code = node
            .as_str()
            .and_then(crate::decode::node::parse_int)
            .and_then(|code| u16::try_from(code).ok())
            .and_then(Self::new);
        if code.is_none() {
            cx.invalid(node, Self::TARGET, "a status code between 100 and 599");
        }
        code
    }
}

/// A response to a method, keyed by its status code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// The status code the response is declared under.
    pub code: HttpCode,

    /// Clarifies why the response is emitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Headers sent with the response.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Header>,

    /// The response bodies.
    #[serde(skip_serializing_if = "Bodies::is_empty")]
    pub body: Bodies,
}

impl Response {
    const KNOWN: [&str; 3] = ["description", "headers", "body"];

    fn decode_with(node: &Node, cx: &mut Decoder, code: HttpCode) -> Option<Self> {
        let mapping = cx.mapping(node, Target::Type("Response"))?;
        ignore_unknown(&mapping, &Self::KNOWN, |_| false);

        Some(Self {
            code,
            description: cx.field(&mapping, "description"),
            headers: parameter::headers(cx, &mapping, "headers"),
            body: cx.field(&mapping, "body").unwrap_or_default(),
        })
    }
}

/// Decodes the responses under `key`, validating each status code.
pub(super) fn responses(
    cx: &mut Decoder,
    mapping: &Mapping<'_>,
    key: &str,
) -> BTreeMap<HttpCode, Response> {
    let Some(node) = mapping.get(key) else {
        return BTreeMap::new();
    };

    cx.nested(key, |cx| {
        cx.entries(
            node,
            Target::MappingOf("Response"),
            HttpCode::TARGET,
            |cx, key, _, value| {
                let code = HttpCode::decode(key, cx)?;
                Response::decode_with(value, cx, code).map(|response| (code, response))
            },
        )
    })
}
