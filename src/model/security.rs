use std::collections::BTreeMap;

use serde::Serialize;

use super::{
    Named,
    body::Bodies,
    ignore_unknown,
    parameter::{self, Header, NamedParameter, ParameterDefaults},
    response::{self, HttpCode, Response},
};
use crate::decode::{Decode, Decoder, Node, Target};

/// An authentication mechanism supported by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    /// The key the scheme is declared under.
    pub name: String,

    /// Briefly describes the scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The mechanism, e.g. `OAuth 2.0` or `x-custom`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// The headers, parameters and responses the mechanism involves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub described_by: Option<SecuritySchemeMethod>,

    /// Mechanism-specific settings.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, serde_yaml::Value>,

    /// Extra information for `x-` schemes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, String>,
}

impl SecurityScheme {
    const KNOWN: [&str; 5] = ["description", "type", "describedBy", "settings", "other"];
}

impl Decode for SecurityScheme {
    const TARGET: Target = Target::Type("SecurityScheme");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        let mapping = cx.mapping(node, Self::TARGET)?;
        ignore_unknown(&mapping, &Self::KNOWN, |_| false);

        Some(Self {
            name: String::new(),
            description: cx.field(&mapping, "description"),
            kind: cx.field(&mapping, "type"),
            described_by: cx.field(&mapping, "describedBy"),
            settings: cx.field(&mapping, "settings").unwrap_or_default(),
            other: cx.field(&mapping, "other").unwrap_or_default(),
        })
    }
}

impl Named for SecurityScheme {
    fn named(self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self
        }
    }
}

/// The trait-like description of a security scheme.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySchemeMethod {
    /// As in [`super::Method`].
    #[serde(skip_serializing_if = "Bodies::is_empty")]
    pub body: Bodies,

    /// As in [`super::Method`].
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Header>,

    /// As in [`super::Method`].
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<HttpCode, Response>,

    /// As in [`super::Method`].
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub query_parameters: BTreeMap<String, NamedParameter>,
}

impl Decode for SecuritySchemeMethod {
    const TARGET: Target = Target::Type("SecuritySchemeMethod");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        let mapping = cx.mapping(node, Self::TARGET)?;

        Some(Self {
            body: cx.field(&mapping, "body").unwrap_or_default(),
            headers: parameter::headers(cx, &mapping, "headers"),
            responses: response::responses(cx, &mapping, "responses"),
            query_parameters: parameter::parameters(
                cx,
                &mapping,
                "queryParameters",
                ParameterDefaults::OPTIONAL,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{self, node};

    #[test]
    fn oauth_scheme() {
        let root = node::load(
            "description: OAuth 2.0\ntype: OAuth 2.0\ndescribedBy:\n  headers:\n    Authorization:\n  responses:\n    401:\nsettings:\n  authorizationUri: https://example.com/auth\n  scopes: [read, write]\n",
        )
        .unwrap();
        let scheme: SecurityScheme = decode::decode(root.as_ref()).unwrap();

        assert_eq!(scheme.kind.as_deref(), Some("OAuth 2.0"));
        let described_by = scheme.described_by.unwrap();
        assert!(described_by.headers.contains_key("Authorization"));
        assert!(described_by.responses.contains_key(&HttpCode::new(401).unwrap()));
        assert_eq!(
            scheme.settings["authorizationUri"],
            serde_yaml::Value::String("https://example.com/auth".to_string())
        );
        assert!(scheme.settings["scopes"].is_sequence());
    }
}
