//! The RAML 0.8 document model.
//!
//! These are plain records; all the interesting behavior lives in their
//! [`Decode`] implementations, which map RAML keys onto fields, validate
//! pattern-matched keys and fill in per-field defaults.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use crate::decode::{Decode, Decoder, Mapping, Node};

mod api;
mod body;
mod definition;
mod method;
mod parameter;
mod resource;
mod response;
mod security;
mod templates;

pub use api::{ApiDefinition, Documentation};
pub use body::{Bodies, Body};
pub use definition::{DefinitionChoice, DefinitionParameters};
pub use method::Method;
pub use parameter::{Header, NamedParameter, ParameterDefaults, ParameterType};
pub use resource::Resource;
pub use response::{HttpCode, Response};
pub use security::{SecurityScheme, SecuritySchemeMethod};
pub use templates::{ResourceType, ResourceTypeMethod, Trait};

/// An HTTP method that may appear as a key in a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// `get`
    Get,
    /// `head`
    Head,
    /// `post`
    Post,
    /// `put`
    Put,
    /// `delete`
    Delete,
    /// `patch`
    Patch,
    /// `options`
    Options,
    /// `trace`
    Trace,
    /// `connect`
    Connect,
}

impl HttpMethod {
    /// Every method, in the order RAML lists them.
    pub const ALL: [Self; 9] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Patch,
        Self::Options,
        Self::Trace,
        Self::Connect,
    ];

    /// The key used for this method in RAML.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Head => "head",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
            Self::Options => "options",
            Self::Trace => "trace",
            Self::Connect => "connect",
        }
    }

    /// Looks up a method by its RAML key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == key)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record whose name is the key it is declared under.
trait Named: Decode {
    fn named(self, name: &str) -> Self;
}

/// Decodes a list of single-key mappings of named records, such as
/// `traits` or `securitySchemes`.
///
/// A bare mapping is accepted as a list of one.
fn named_list<T: Named>(
    cx: &mut Decoder,
    mapping: &Mapping<'_>,
    key: &str,
) -> Vec<BTreeMap<String, T>> {
    let Some(node) = mapping.get(key) else {
        return Vec::new();
    };

    let maps = if node.entries().is_some() {
        cx.nested(key, |cx| BTreeMap::<String, T>::decode(node, cx))
            .map(|map| vec![map])
    } else {
        cx.field::<Vec<BTreeMap<String, T>>>(mapping, key)
    };

    maps.unwrap_or_default()
        .into_iter()
        .map(|map| {
            map.into_iter()
                .map(|(name, value)| {
                    let value = value.named(&name);
                    (name, value)
                })
                .collect()
        })
        .collect()
}

/// Decodes a list of references such as `is` or `securedBy`.
///
/// A single reference, bare or parameterized, is accepted as a list of one.
fn references(cx: &mut Decoder, mapping: &Mapping<'_>, key: &str) -> Vec<DefinitionChoice> {
    let Some(node) = mapping.get(key).filter(|node| !node.is_null()) else {
        return Vec::new();
    };

    if node.items().is_some() {
        return cx.field(mapping, key).unwrap_or_default();
    }
    cx.nested(key, |cx| DefinitionChoice::decode(node, cx))
        .into_iter()
        .collect()
}

/// Decodes the HTTP method keys of a mapping, in document order.
///
/// With `optional` set, the `get?`-style keys of resource types are decoded
/// instead.
fn methods<T>(
    cx: &mut Decoder,
    mapping: &Mapping<'_>,
    optional: bool,
    decode: impl Fn(&Node, &mut Decoder, HttpMethod) -> Option<T>,
) -> BTreeMap<HttpMethod, T> {
    let method_of = |key: &str| {
        if optional {
            key.strip_suffix('?').and_then(HttpMethod::from_key)
        } else {
            HttpMethod::from_key(key)
        }
    };

    let mut methods = BTreeMap::new();
    for (key, value) in mapping.matching(|key| method_of(key).is_some()) {
        let Some((name, method)) = key.as_str().and_then(|name| Some((name, method_of(name)?)))
        else {
            continue;
        };
        if let Some(decoded) = cx.nested(name, |cx| decode(value, cx, method)) {
            methods.insert(method, decoded);
        }
    }
    methods
}

/// Logs the keys of `mapping` that are neither in `known` nor pattern keys.
fn ignore_unknown(mapping: &Mapping<'_>, known: &[&str], is_pattern_key: impl Fn(&str) -> bool) {
    for key in mapping.unknown(known, is_pattern_key) {
        tracing::trace!(key, line = mapping.node().line(), "ignoring unknown key");
    }
}
