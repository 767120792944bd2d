use std::collections::BTreeMap;

use serde::Serialize;

use crate::decode::{Decode, Decoder, Mapping, Node, NodeKind, Target};

/// A named parameter.
///
/// RAML describes URI parameters, query parameters, form parameters and
/// headers all with the same set of properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedParameter {
    /// The key the parameter is declared under.
    pub name: String,

    /// A friendly name for documentation. Defaults to [`Self::name`].
    pub display_name: String,

    /// The intended use or meaning of the parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The primitive type of the parameter's value.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ParameterType>,

    /// The permitted values.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_yaml::Value>,

    /// A regular expression string values must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Minimum length of a string value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    /// Maximum length of a string value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    /// Minimum of a numeric value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    /// Maximum of a numeric value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    /// An example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,

    /// Whether the parameter may be repeated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<bool>,

    /// Whether the parameter is required. See [`ParameterDefaults`].
    pub required: bool,

    /// The value used when the parameter is omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_yaml::Value>,
}

/// A header is described exactly like any other named parameter.
pub type Header = NamedParameter;

/// Defaults applied to named parameters where a property is absent.
///
/// The defaults depend on where the parameter is declared: a URI parameter
/// is a path segment and so is required unless stated otherwise, while
/// query and form parameters and headers are optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterDefaults {
    /// Value of `required` when the property is absent.
    pub required: bool,
}

impl ParameterDefaults {
    /// Defaults for URI and base URI parameters.
    pub const URI: Self = Self { required: true };

    /// Defaults for query and form parameters and headers.
    pub const OPTIONAL: Self = Self { required: false };
}

impl NamedParameter {
    /// The diagnostic target for a named parameter.
    pub const TARGET: Target = Target::Type("NamedParameter");

    /// Decodes the parameter declared under `name`.
    pub fn decode_with(
        node: &Node,
        cx: &mut Decoder,
        name: &str,
        defaults: ParameterDefaults,
    ) -> Option<Self> {
        let mapping = cx.mapping(node, Self::TARGET)?;

        Some(Self {
            name: name.to_string(),
            display_name: cx
                .field(&mapping, "displayName")
                .unwrap_or_else(|| name.to_string()),
            description: cx.field(&mapping, "description"),
            kind: cx.field(&mapping, "type"),
            enum_values: cx.field(&mapping, "enum").unwrap_or_default(),
            pattern: cx.field(&mapping, "pattern"),
            min_length: cx.field(&mapping, "minLength"),
            max_length: cx.field(&mapping, "maxLength"),
            minimum: cx.field(&mapping, "minimum"),
            maximum: cx.field(&mapping, "maximum"),
            example: cx.field(&mapping, "example"),
            repeat: cx.field(&mapping, "repeat"),
            required: cx
                .field(&mapping, "required")
                .unwrap_or(defaults.required),
            default: cx.field(&mapping, "default"),
        })
    }
}

/// Decodes the named parameters under `key`.
pub(super) fn parameters(
    cx: &mut Decoder,
    mapping: &Mapping<'_>,
    key: &str,
    defaults: ParameterDefaults,
) -> BTreeMap<String, NamedParameter> {
    named_parameters(cx, mapping, key, defaults, String::TARGET)
}

/// Decodes the headers under `key`.
pub(super) fn headers(
    cx: &mut Decoder,
    mapping: &Mapping<'_>,
    key: &str,
) -> BTreeMap<String, Header> {
    named_parameters(
        cx,
        mapping,
        key,
        ParameterDefaults::OPTIONAL,
        Target::Type("HttpHeader"),
    )
}

fn named_parameters(
    cx: &mut Decoder,
    mapping: &Mapping<'_>,
    key: &str,
    defaults: ParameterDefaults,
    key_target: Target,
) -> BTreeMap<String, NamedParameter> {
    let Some(node) = mapping.get(key) else {
        return BTreeMap::new();
    };

    cx.nested(key, |cx| {
        cx.entries(
            node,
            Target::MappingOf("NamedParameter"),
            key_target,
            |cx, _, name, value| {
                NamedParameter::decode_with(value, cx, name, defaults)
                    .map(|parameter| (name.to_string(), parameter))
            },
        )
    })
}

/// The primitive type of a named parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// `string`
    String,
    /// `number`
    Number,
    /// `integer`
    Integer,
    /// `date`
    Date,
    /// `boolean`
    Boolean,
    /// `file`
    File,
}

impl Decode for ParameterType {
    const TARGET: Target = Target::Type("ParameterType");

    fn decode(node: &Node, cx: &mut Decoder) -> Option<Self> {
        if node.kind() != NodeKind::Str {
            cx.mismatch(node, Self::TARGET);
            return None;
        }

        let kind = match node.as_str()? {
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "date" => Self::Date,
            "boolean" => Self::Boolean,
            "file" => Self::File,
            _ => {
                cx.invalid(
                    node,
                    Self::TARGET,
                    "one of string, number, integer, date, boolean or file",
                );
                return None;
            }
        };
        Some(kind)
    }
}
