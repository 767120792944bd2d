use std::collections::BTreeMap;

use serde::Serialize;

use super::{
    definition::DefinitionChoice,
    ignore_unknown, named_list, references,
    parameter::{self, NamedParameter, ParameterDefaults},
    resource::{self, Resource},
    security::SecurityScheme,
    templates::{ResourceType, Trait},
};
use crate::decode::{Decode, Decoder, Node, Target};

/// The root of a RAML document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinition {
    /// The version marker from the first line, e.g. `#%RAML 0.8`.
    pub raml_version: String,

    /// The title of the API.
    pub title: String,

    /// The version of the API, e.g. `v1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The URI all resources are relative to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,

    /// Parameters in the base URI.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub base_uri_parameters: BTreeMap<String, NamedParameter>,

    /// Parameters shared by every resource URI.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub uri_parameters: BTreeMap<String, NamedParameter>,

    /// Protocols supported by the API.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,

    /// The default media type of request and response bodies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Named schemas, as a list of mappings from name to schema.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<BTreeMap<String, String>>,

    /// Security schemes, as a list of mappings from name to scheme.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_schemes: Vec<BTreeMap<String, SecurityScheme>>,

    /// Security schemes applied to every method.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secured_by: Vec<DefinitionChoice>,

    /// User documentation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<Documentation>,

    /// Traits, as a list of mappings from name to trait.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<BTreeMap<String, Trait>>,

    /// Resource types, as a list of mappings from name to resource type.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_types: Vec<BTreeMap<String, ResourceType>>,

    /// Top-level resources keyed by URI.
    pub resources: BTreeMap<String, Resource>,
}

impl ApiDefinition {
    const KNOWN: [&str; 13] = [
        "title",
        "version",
        "baseUri",
        "baseUriParameters",
        "uriParameters",
        "protocols",
        "mediaType",
        "schemas",
        "securitySchemes",
        "securedBy",
        "documentation",
        "traits",
        "resourceTypes",
    ];

    /// Looks up a resource by its absolute URI, e.g. `/users/{id}`.
    #[must_use]
    pub fn resource(&self, path: &str) -> Option<&Resource> {
        resource::find(&self.resources, path)
    }

    /// Looks up a trait by name.
    #[must_use]
    pub fn find_trait(&self, name: &str) -> Option<&Trait> {
        self.traits.iter().find_map(|traits| traits.get(name))
    }

    /// Looks up a resource type by name.
    #[must_use]
    pub fn resource_type(&self, name: &str) -> Option<&ResourceType> {
        self.resource_types.iter().find_map(|types| types.get(name))
    }

    /// Looks up a security scheme by name.
    #[must_use]
    pub fn security_scheme(&self, name: &str) -> Option<&SecurityScheme> {
        self.security_schemes
            .iter()
            .find_map(|schemes| schemes.get(name))
    }
}

impl Decode for ApiDefinition {
    const TARGET: Target = Target::Type("ApiDefinition");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        let mapping = cx.mapping(node, Self::TARGET)?;
        ignore_unknown(&mapping, &Self::KNOWN, |key| key.starts_with('/'));

        Some(Self {
            raml_version: String::new(),
            title: cx
                .required(&mapping, "title", Self::TARGET)
                .unwrap_or_default(),
            version: cx.field(&mapping, "version"),
            base_uri: cx.field(&mapping, "baseUri"),
            base_uri_parameters: parameter::parameters(
                cx,
                &mapping,
                "baseUriParameters",
                ParameterDefaults::URI,
            ),
            uri_parameters: parameter::parameters(
                cx,
                &mapping,
                "uriParameters",
                ParameterDefaults::URI,
            ),
            protocols: cx.field(&mapping, "protocols").unwrap_or_default(),
            media_type: cx.field(&mapping, "mediaType"),
            schemas: cx.field(&mapping, "schemas").unwrap_or_default(),
            security_schemes: named_list(cx, &mapping, "securitySchemes"),
            secured_by: references(cx, &mapping, "securedBy"),
            documentation: cx.field(&mapping, "documentation").unwrap_or_default(),
            traits: named_list(cx, &mapping, "traits"),
            resource_types: named_list(cx, &mapping, "resourceTypes"),
            resources: resource::resources(cx, &mapping),
        })
    }
}

/// A page of user documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Documentation {
    /// The page title.
    pub title: String,
    /// The page content, usually Markdown.
    pub content: String,
}

impl Decode for Documentation {
    const TARGET: Target = Target::Type("Documentation");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        let mapping = cx.mapping(node, Self::TARGET)?;
        let title = cx.required(&mapping, "title", Self::TARGET);
        let content = cx.required(&mapping, "content", Self::TARGET);

        Some(Self {
            title: title?,
            content: content?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{self, DecodeError, Problem, node};

    fn decode_api(text: &str) -> Result<ApiDefinition, nonempty::NonEmpty<DecodeError>> {
        let root = node::load(text).unwrap();
        decode::decode(root.as_ref())
    }

    #[test]
    fn minimal_document() {
        let api = decode_api("title: Example\n").unwrap();
        assert_eq!(api.title, "Example");
        assert!(api.resources.is_empty());
    }

    #[test]
    fn title_is_required() {
        let errors = decode_api("version: v1\n").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.head.problem, Problem::Missing { field: "title" });
        assert_eq!(errors.head.target, ApiDefinition::TARGET);
    }

    #[test]
    fn documentation_requires_title_and_content() {
        let errors =
            decode_api("title: t\ndocumentation:\n  - title: Intro\n  - content: text\n").unwrap_err();

        let errors: Vec<_> = errors.into_iter().collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].path, "documentation.0");
        assert_eq!(errors[0].problem, Problem::Missing { field: "content" });
        assert_eq!(errors[0].line, 3);
        assert_eq!(errors[1].path, "documentation.1");
        assert_eq!(errors[1].problem, Problem::Missing { field: "title" });
    }

    #[test]
    fn named_lists_fill_names() {
        let api = decode_api(
            "title: t\ntraits:\n  - paged:\n      queryParameters:\n        page:\n  - secured:\nresourceTypes:\n  collection:\n    get:\nsecuritySchemes:\n  - oauth:\n      type: OAuth 2.0\n",
        )
        .unwrap();

        assert_eq!(api.traits.len(), 2);
        assert_eq!(api.find_trait("paged").unwrap().name, "paged");
        assert_eq!(api.find_trait("secured").unwrap().name, "secured");
        assert_eq!(api.resource_type("collection").unwrap().name, "collection");
        assert_eq!(
            api.security_scheme("oauth").unwrap().kind.as_deref(),
            Some("OAuth 2.0")
        );
    }

    #[test]
    fn schemas_and_base_uri_parameters() {
        let api = decode_api(
            "title: t\nbaseUri: https://{host}/api\nbaseUriParameters:\n  host:\nschemas:\n  - user: '{\"type\": \"object\"}'\n",
        )
        .unwrap();

        assert!(api.base_uri_parameters["host"].required);
        assert_eq!(api.schemas[0]["user"], "{\"type\": \"object\"}");
    }

    #[test]
    fn resource_lookup() {
        let api = decode_api("title: t\n/users:\n  /{id}:\n    get:\n").unwrap();
        assert!(api.resource("/users/{id}").is_some());
        assert!(api.resource("/accounts").is_none());
    }
}
