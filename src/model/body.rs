use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use super::{
    ignore_unknown,
    parameter::{self, Header, NamedParameter, ParameterDefaults},
};
use crate::decode::{Decode, Decoder, Mapping, Node, Target};

static MEDIA_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.+*-]+/[\w.+*-]+(\s*;.*)?$").expect("valid media type regex")
});

/// Returns `true` if `key` looks like a media type, e.g. `application/json`.
pub(super) fn is_media_type(key: &str) -> bool {
    MEDIA_TYPE.is_match(key)
}

/// The request or response bodies of a method.
///
/// A body may be described directly, in which case it applies to the API's
/// default media type, or per media type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bodies {
    /// Schema of the default-media-type body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Description of the default-media-type body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Example of the default-media-type body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,

    /// Form parameters of the default-media-type body.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub form_parameters: BTreeMap<String, NamedParameter>,

    /// Bodies keyed by media type.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub media_types: BTreeMap<String, Body>,
}

impl Bodies {
    const FIXED: [&str; 4] = ["schema", "description", "example", "formParameters"];

    /// Returns `true` if nothing at all is described.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// The body for `media_type`, if described.
    #[must_use]
    pub fn for_media_type(&self, media_type: &str) -> Option<&Body> {
        self.media_types.get(media_type)
    }
}

impl Decode for Bodies {
    const TARGET: Target = Target::Type("Bodies");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        let mapping = cx.mapping(node, Self::TARGET)?;

        let mut media_types = BTreeMap::new();
        for (key, value) in mapping.matching(|key| !Self::FIXED.contains(&key)) {
            let Some(name) = key.as_str() else {
                continue;
            };
            if !is_media_type(name) {
                cx.invalid(
                    key,
                    Target::Type("MediaType"),
                    "a media type such as application/json",
                );
                continue;
            }
            if let Some(body) = cx.nested(name, |cx| Body::decode_with(value, cx, name)) {
                media_types.insert(name.to_string(), body);
            }
        }

        Some(Self {
            schema: cx.field(&mapping, "schema"),
            description: cx.field(&mapping, "description"),
            example: cx.field(&mapping, "example"),
            form_parameters: parameter::parameters(
                cx,
                &mapping,
                "formParameters",
                ParameterDefaults::OPTIONAL,
            ),
            media_types,
        })
    }
}

/// A body for a single media type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    /// The media type this body is declared under.
    pub media_type: String,

    /// The structure of the body, typically a JSON or XML schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Briefly describes the body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// An example body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,

    /// Form parameters, for form-encoded and multipart bodies.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub form_parameters: BTreeMap<String, NamedParameter>,

    /// Headers specific to this body.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Header>,
}

impl Body {
    const KNOWN: [&str; 5] = ["schema", "description", "example", "formParameters", "headers"];

    fn decode_with(node: &Node, cx: &mut Decoder, media_type: &str) -> Option<Self> {
        let mapping: Mapping<'_> = cx.mapping(node, Target::Type("Body"))?;
        ignore_unknown(&mapping, &Self::KNOWN, |_| false);

        Some(Self {
            media_type: media_type.to_string(),
            schema: cx.field(&mapping, "schema"),
            description: cx.field(&mapping, "description"),
            example: cx.field(&mapping, "example"),
            form_parameters: parameter::parameters(
                cx,
                &mapping,
                "formParameters",
                ParameterDefaults::OPTIONAL,
            ),
            headers: parameter::headers(cx, &mapping, "headers"),
        })
    }
}
