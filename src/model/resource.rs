use std::collections::BTreeMap;

use serde::Serialize;

use super::{
    HttpMethod,
    definition::DefinitionChoice,
    ignore_unknown,
    method::Method,
    methods,
    parameter::{self, NamedParameter, ParameterDefaults},
    references,
};
use crate::decode::{Decoder, Mapping, Node, Target};

/// A resource, identified by its URI relative to its parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// The relative URI the resource is declared under, e.g. `/{id}`.
    pub uri: String,

    /// A friendly name for the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Briefly describes the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Security schemes applied to every method of the resource.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secured_by: Vec<DefinitionChoice>,

    /// Overrides of the API's base URI parameters.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub base_uri_parameters: BTreeMap<String, NamedParameter>,

    /// Parameters in the resource's relative URI.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub uri_parameters: BTreeMap<String, NamedParameter>,

    /// The resource type the resource inherits from.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<DefinitionChoice>,

    /// Traits applied to every method of the resource.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub is: Vec<DefinitionChoice>,

    /// Methods keyed by HTTP method.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<HttpMethod, Method>,

    /// Nested resources keyed by their relative URI.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub nested: BTreeMap<String, Resource>,
}

impl Resource {
    /// The diagnostic target for a resource.
    pub const TARGET: Target = Target::Type("Resource");

    const KNOWN: [&str; 7] = [
        "displayName",
        "description",
        "securedBy",
        "baseUriParameters",
        "uriParameters",
        "type",
        "is",
    ];

    fn decode_with(node: &Node, cx: &mut Decoder, uri: &str) -> Option<Self> {
        let mapping = cx.mapping(node, Self::TARGET)?;
        ignore_unknown(&mapping, &Self::KNOWN, |key| {
            is_resource_key(key) || HttpMethod::from_key(key).is_some()
        });

        Some(Self {
            uri: uri.to_string(),
            display_name: cx.field(&mapping, "displayName"),
            description: cx.field(&mapping, "description"),
            secured_by: references(cx, &mapping, "securedBy"),
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
            kind: cx.field(&mapping, "type"),
            is: references(cx, &mapping, "is"),
            methods: methods(cx, &mapping, false, Method::decode_with),
            nested: resources(cx, &mapping),
        })
    }

    /// The method declared for `method`, if any.
    #[must_use]
    pub fn method(&self, method: HttpMethod) -> Option<&Method> {
        self.methods.get(&method)
    }
}

fn is_resource_key(key: &str) -> bool {
    key.starts_with('/')
}

/// Decodes the resources of a mapping, that is every key starting with `/`.
pub(super) fn resources(cx: &mut Decoder, mapping: &Mapping<'_>) -> BTreeMap<String, Resource> {
    let mut resources = BTreeMap::new();
    for (key, value) in mapping.matching(is_resource_key) {
        let Some(uri) = key.as_str() else {
            continue;
        };
        if let Some(resource) = cx.nested(uri, |cx| Resource::decode_with(value, cx, uri)) {
            resources.insert(uri.to_string(), resource);
        }
    }
    resources
}

/// Finds the resource at the absolute `path` among `resources` and their
/// nested resources.
pub(super) fn find<'r>(resources: &'r BTreeMap<String, Resource>, path: &str) -> Option<&'r Resource> {
    resources.iter().find_map(|(uri, resource)| {
        let rest = path.strip_prefix(uri.as_str())?;
        if rest.is_empty() {
            Some(resource)
        } else if rest.starts_with('/') {
            find(&resource.nested, rest)
        } else {
            None
        }
    })
}
