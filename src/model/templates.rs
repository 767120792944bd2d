//! Resource types and traits: the reusable partial definitions of RAML.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{
    HttpMethod, Named,
    body::Bodies,
    ignore_unknown, methods,
    parameter::{self, Header, NamedParameter, ParameterDefaults},
    response::{self, HttpCode, Response},
};
use crate::decode::{Decode, Decoder, Node, Target};

/// A partial method definition that methods inherit with `is`.
///
/// Keys ending in `?` describe properties that only apply if the inheriting
/// method already has them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trait {
    /// The key the trait is declared under.
    pub name: String,

    /// How the trait should be used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Briefly describes the trait.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// A friendly name for the trait.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

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

    /// As in [`super::Method`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,

    /// `body?`
    #[serde(skip_serializing_if = "Bodies::is_empty")]
    pub optional_body: Bodies,

    /// `headers?`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_headers: BTreeMap<String, Header>,

    /// `responses?`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_responses: BTreeMap<HttpCode, Response>,

    /// `queryParameters?`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_query_parameters: BTreeMap<String, NamedParameter>,
}

impl Trait {
    const KNOWN: [&str; 12] = [
        "usage",
        "description",
        "displayName",
        "body",
        "headers",
        "responses",
        "queryParameters",
        "protocols",
        "body?",
        "headers?",
        "responses?",
        "queryParameters?",
    ];
}

impl Decode for Trait {
    const TARGET: Target = Target::Type("Trait");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        let mapping = cx.mapping(node, Self::TARGET)?;
        ignore_unknown(&mapping, &Self::KNOWN, |_| false);

        Some(Self {
            name: String::new(),
            usage: cx.field(&mapping, "usage"),
            description: cx.field(&mapping, "description"),
            display_name: cx.field(&mapping, "displayName"),
            body: cx.field(&mapping, "body").unwrap_or_default(),
            headers: parameter::headers(cx, &mapping, "headers"),
            responses: response::responses(cx, &mapping, "responses"),
            query_parameters: parameter::parameters(
                cx,
                &mapping,
                "queryParameters",
                ParameterDefaults::OPTIONAL,
            ),
            protocols: cx.field(&mapping, "protocols").unwrap_or_default(),
            optional_body: cx.field(&mapping, "body?").unwrap_or_default(),
            optional_headers: parameter::headers(cx, &mapping, "headers?"),
            optional_responses: response::responses(cx, &mapping, "responses?"),
            optional_query_parameters: parameter::parameters(
                cx,
                &mapping,
                "queryParameters?",
                ParameterDefaults::OPTIONAL,
            ),
        })
    }
}

impl Named for Trait {
    fn named(self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self
        }
    }
}

/// A method inside a resource type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeMethod {
    /// The HTTP method this is declared under.
    pub method: HttpMethod,

    /// Briefly describes what the method does to the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

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

    /// As in [`super::Method`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,
}

impl ResourceTypeMethod {
    const TARGET: Target = Target::Type("ResourceTypeMethod");

    fn decode_with(node: &Node, cx: &mut Decoder, method: HttpMethod) -> Option<Self> {
        let mapping = cx.mapping(node, Self::TARGET)?;

        Some(Self {
            method,
            description: cx.field(&mapping, "description"),
            body: cx.field(&mapping, "body").unwrap_or_default(),
            headers: parameter::headers(cx, &mapping, "headers"),
            responses: response::responses(cx, &mapping, "responses"),
            query_parameters: parameter::parameters(
                cx,
                &mapping,
                "queryParameters",
                ParameterDefaults::OPTIONAL,
            ),
            protocols: cx.field(&mapping, "protocols").unwrap_or_default(),
        })
    }
}

/// A partial resource definition that resources inherit with `type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceType {
    /// The key the resource type is declared under.
    pub name: String,

    /// How the resource type should be used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Briefly describes the resource type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// As in [`super::Resource`].
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub uri_parameters: BTreeMap<String, NamedParameter>,

    /// As in [`super::Resource`].
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub base_uri_parameters: BTreeMap<String, NamedParameter>,

    /// Methods keyed by HTTP method.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<HttpMethod, ResourceTypeMethod>,

    /// Methods declared with a trailing `?`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_methods: BTreeMap<HttpMethod, ResourceTypeMethod>,

    /// `uriParameters?`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_uri_parameters: BTreeMap<String, NamedParameter>,

    /// `baseUriParameters?`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_base_uri_parameters: BTreeMap<String, NamedParameter>,
}

impl ResourceType {
    const KNOWN: [&str; 9] = [
        "usage",
        "description",
        "displayName",
        "uriParameters",
        "baseUriParameters",
        "uriParameters?",
        "baseUriParameters?",
        "type",
        "is",
    ];
}

impl Decode for ResourceType {
    const TARGET: Target = Target::Type("ResourceType");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        let mapping = cx.mapping(node, Self::TARGET)?;
        ignore_unknown(&mapping, &Self::KNOWN, |key| {
            HttpMethod::from_key(key.trim_end_matches('?')).is_some()
        });

        Some(Self {
            name: String::new(),
            usage: cx.field(&mapping, "usage"),
            description: cx.field(&mapping, "description"),
            uri_parameters: parameter::parameters(
                cx,
                &mapping,
                "uriParameters",
                ParameterDefaults::URI,
            ),
            base_uri_parameters: parameter::parameters(
                cx,
                &mapping,
                "baseUriParameters",
                ParameterDefaults::URI,
            ),
            methods: methods(cx, &mapping, false, ResourceTypeMethod::decode_with),
            optional_methods: methods(cx, &mapping, true, ResourceTypeMethod::decode_with),
            optional_uri_parameters: parameter::parameters(
                cx,
                &mapping,
                "uriParameters?",
                ParameterDefaults::URI,
            ),
            optional_base_uri_parameters: parameter::parameters(
                cx,
                &mapping,
                "baseUriParameters?",
                ParameterDefaults::URI,
            ),
        })
    }
}

impl Named for ResourceType {
    fn named(self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{self, node};

    fn parse<T: Decode>(text: &str) -> T {
        let root = node::load(text).unwrap();
        decode::decode(root.as_ref()).unwrap()
    }

    #[test]
    fn trait_with_optional_properties() {
        let paged: Trait = parse(
            "usage: apply to collections\nqueryParameters:\n  page:\n    type: integer\nresponses?:\n  200:\n    description: a page\n",
        );

        assert_eq!(paged.usage.as_deref(), Some("apply to collections"));
        assert!(paged.query_parameters.contains_key("page"));
        assert!(paged.responses.is_empty());
        assert_eq!(paged.optional_responses.len(), 1);
    }

    #[test]
    fn resource_type_methods_and_optional_methods() {
        let collection: ResourceType = parse(
            "description: a collection\nget:\n  description: list\npost?:\n  body:\n    application/json:\nuriParameters:\n  id:\n",
        );

        assert_eq!(collection.methods.len(), 1);
        assert_eq!(
            collection.methods[&HttpMethod::Get].description.as_deref(),
            Some("list")
        );
        assert_eq!(collection.optional_methods.len(), 1);
        assert_eq!(
            collection.optional_methods[&HttpMethod::Post].method,
            HttpMethod::Post
        );
        assert!(collection.uri_parameters["id"].required);
    }

    #[test]
    fn naming_fills_the_name() {
        let named = Trait::default().named("secured");
        assert_eq!(named.name, "secured");
    }
}
