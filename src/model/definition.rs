use std::collections::BTreeMap;

use serde::Serialize;

use crate::decode::{Decode, Decoder, Node, Target};

/// Parameters passed to a trait, resource type or security scheme.
pub type DefinitionParameters = BTreeMap<String, String>;

static NO_PARAMETERS: DefinitionParameters = BTreeMap::new();

/// A reference to a trait, resource type or security scheme.
///
/// RAML accepts either a bare name (`is: [paged]`) or a single-key mapping
/// from the name to its parameters (`is: [paged: {size: 10}]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DefinitionChoice {
    /// A reference by name only.
    Named(String),
    /// A reference with parameters.
    Parameterized {
        /// The referenced definition.
        name: String,
        /// The parameter values.
        parameters: DefinitionParameters,
    },
}

impl DefinitionChoice {
    /// The referenced definition's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) | Self::Parameterized { name, .. } => name,
        }
    }

    /// The parameter values; empty for a reference by name.
    #[must_use]
    pub fn parameters(&self) -> &DefinitionParameters {
        match self {
            Self::Named(_) => &NO_PARAMETERS,
            Self::Parameterized { parameters, .. } => parameters,
        }
    }
}

impl Decode for DefinitionChoice {
    const TARGET: Target = Target::Type("DefinitionChoice");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        if node.is_null() {
            return Some(Self::Named("null".to_string()));
        }
        if node.kind().is_scalar() {
            return node.as_str().map(|name| Self::Named(name.to_string()));
        }

        let Some(entries) = node.entries() else {
            cx.mismatch(node, Self::TARGET);
            return None;
        };
        let [(key, value)] = entries else {
            cx.invalid(node, Self::TARGET, "a mapping with exactly one key");
            return None;
        };
        let Some(name) = key.as_str() else {
            cx.mismatch(key, String::TARGET);
            return None;
        };

        let parameters = cx.nested(name, |cx| DefinitionParameters::decode(value, cx))?;
        Some(Self::Parameterized {
            name: name.to_string(),
            parameters,
        })
    }
}
