use std::collections::BTreeMap;

use serde::Serialize;

use super::{
    HttpMethod,
    body::Bodies,
    definition::DefinitionChoice,
    ignore_unknown,
    parameter::{self, Header, NamedParameter, ParameterDefaults},
    references,
    response::{self, HttpCode, Response},
};
use crate::decode::{Decoder, Node, Target};

/// An operation performed on a resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    /// The HTTP method this is declared under.
    pub method: HttpMethod,

    /// Briefly describes what the method does to the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Security schemes protecting this method, overriding the API's.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secured_by: Vec<DefinitionChoice>,

    /// Request headers.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Header>,

    /// Protocols supported by this method, overriding the API's.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,

    /// Query string parameters.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub query_parameters: BTreeMap<String, NamedParameter>,

    /// The request bodies.
    #[serde(skip_serializing_if = "Bodies::is_empty")]
    pub body: Bodies,

    /// Responses keyed by status code.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<HttpCode, Response>,

    /// Traits applied to this method.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub is: Vec<DefinitionChoice>,
}

impl Method {
    /// The diagnostic target for a method.
    pub const TARGET: Target = Target::Type("Method");

    const KNOWN: [&str; 8] = [
        "description",
        "securedBy",
        "headers",
        "protocols",
        "queryParameters",
        "body",
        "responses",
        "is",
    ];

    pub(super) fn decode_with(node: &Node, cx: &mut Decoder, method: HttpMethod) -> Option<Self> {
        let mapping = cx.mapping(node, Self::TARGET)?;
        ignore_unknown(&mapping, &Self::KNOWN, |_| false);

        Some(Self {
            method,
            description: cx.field(&mapping, "description"),
            secured_by: references(cx, &mapping, "securedBy"),
            headers: parameter::headers(cx, &mapping, "headers"),
            protocols: cx.field(&mapping, "protocols").unwrap_or_default(),
            query_parameters: parameter::parameters(
                cx,
                &mapping,
                "queryParameters",
                ParameterDefaults::OPTIONAL,
            ),
            body: cx.field(&mapping, "body").unwrap_or_default(),
            responses: response::responses(cx, &mapping, "responses"),
            is: references(cx, &mapping, "is"),
        })
    }

    /// The response declared for `code`, if any.
    #[must_use]
    pub fn response(&self, code: u16) -> Option<&Response> {
        HttpCode::new(code).and_then(|code| self.responses.get(&code))
    }
}
