//! Translation of decode errors into messages written in RAML's vocabulary.
//!
//! Decode errors name node kinds by their YAML tag (`!!str`) and targets by
//! an internal type token (`NamedParameter`). A [`Vocabulary`] maps both onto
//! the words a RAML author would use, and the [`Translator`] composes them
//! into one line per error:
//!
//! ```text
//! line 12: HTTP code cannot be of type string (got "ok"), must be integer
//! ```

use std::{collections::BTreeMap, fmt, sync::LazyLock};

use nonempty::NonEmpty;

use crate::{
    decode::{DecodeError, NodeKind, Problem, Target},
    preprocess::{LineOrigin, Preprocessed},
};

static BUILTIN: LazyLock<Vocabulary> = LazyLock::new(|| {
    const KINDS: [(&str, &str); 10] = [
        ("!!seq", "sequence"),
        ("!!map", "mapping"),
        ("!!int", "integer"),
        ("!!str", "string"),
        ("!!null", "null"),
        ("!!bool", "boolean"),
        ("!!float", "float"),
        ("!!timestamp", "timestamp"),
        ("!!binary", "binary"),
        ("!!merge", "merge"),
    ];

    // (token, name, category)
    const TYPES: [(&str, &str, &str); 25] = [
        ("string", "string value", "string"),
        ("int", "numeric value", "integer"),
        ("float", "numeric value", "number"),
        ("bool", "boolean value", "boolean"),
        ("any", "value", "any value"),
        ("NamedParameter", "named parameter", "mapping"),
        ("ParameterType", "parameter type", "string"),
        ("HttpCode", "HTTP code", "integer"),
        ("HttpHeader", "HTTP header", "string"),
        ("Header", "header", "mapping"),
        ("MediaType", "media type", "string"),
        ("Documentation", "documentation", "mapping"),
        ("Bodies", "body", "mapping"),
        ("Body", "body", "mapping"),
        ("Response", "response", "mapping"),
        ("DefinitionParameters", "definition parameters", "mapping"),
        ("DefinitionChoice", "definition choice", "string or mapping"),
        ("Trait", "trait", "mapping"),
        ("ResourceTypeMethod", "resource type method", "mapping"),
        ("ResourceType", "resource type", "mapping"),
        ("SecuritySchemeMethod", "security scheme method", "mapping"),
        ("SecurityScheme", "security scheme", "mapping"),
        ("Method", "method", "mapping"),
        ("Resource", "resource", "mapping"),
        ("ApiDefinition", "API definition", "mapping"),
    ];

    const HINTS: [(&str, &str); 4] = [
        (
            "NamedParameter",
            "declare parameters as a mapping of properties such as type and required",
        ),
        ("HttpCode", "responses are keyed by numeric status codes such as 200"),
        (
            "DefinitionChoice",
            "use a name, or a single-key mapping from the name to its parameters",
        ),
        ("MediaType", "bodies are keyed by media types such as application/json"),
    ];

    let owned = |(key, value): (&str, &str)| (key.to_string(), value.to_string());

    Vocabulary {
        kinds: KINDS.into_iter().map(owned).collect(),
        type_names: TYPES
            .into_iter()
            .map(|(token, name, _)| owned((token, name)))
            .collect(),
        categories: TYPES
            .into_iter()
            .map(|(token, _, category)| owned((token, category)))
            .collect(),
        hints: HINTS.into_iter().map(owned).collect(),
    }
});

/// Lookup tables for node kinds and target types.
///
/// Lookups never fail: an unknown token is returned verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    kinds: BTreeMap<String, String>,
    type_names: BTreeMap<String, String>,
    categories: BTreeMap<String, String>,
    hints: BTreeMap<String, String>,
}

impl Vocabulary {
    /// The built-in vocabulary.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// A copy of this vocabulary with some labels replaced.
    ///
    /// `type_names` is keyed by type token (`NamedParameter`), `kind_names`
    /// by node-kind tag (`!!str`).
    #[must_use]
    pub fn with_overrides(
        &self,
        type_names: &BTreeMap<String, String>,
        kind_names: &BTreeMap<String, String>,
    ) -> Self {
        let mut vocabulary = self.clone();
        vocabulary
            .type_names
            .extend(type_names.iter().map(|(k, v)| (k.clone(), v.clone())));
        vocabulary
            .kinds
            .extend(kind_names.iter().map(|(k, v)| (k.clone(), v.clone())));
        vocabulary
    }

    /// The label for a node-kind tag, e.g. "string" for `!!str`.
    #[must_use]
    pub fn kind<'a>(&'a self, token: &'a str) -> &'a str {
        lookup(&self.kinds, token)
    }

    /// The readable name of a type token.
    #[must_use]
    pub fn type_name<'a>(&'a self, token: &'a str) -> &'a str {
        lookup(&self.type_names, token)
    }

    /// The kind of value a type token expects.
    #[must_use]
    pub fn category<'a>(&'a self, token: &'a str) -> &'a str {
        lookup(&self.categories, token)
    }

    /// Advice for fixing a value of the given type, if there is any.
    #[must_use]
    pub fn hint(&self, token: &str) -> Option<&str> {
        self.hints.get(token).map(String::as_str)
    }
}

fn lookup<'a>(table: &'a BTreeMap<String, String>, token: &'a str) -> &'a str {
    table.get(token).map_or(token, String::as_str)
}

/// Renders [`DecodeError`]s as messages.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'v> {
    vocabulary: &'v Vocabulary,
}

impl Default for Translator<'static> {
    fn default() -> Self {
        Self::new(Vocabulary::builtin())
    }
}

impl<'v> Translator<'v> {
    /// Creates a translator using `vocabulary`.
    #[must_use]
    pub const fn new(vocabulary: &'v Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Translates every error, in order.
    ///
    /// `buffer` is the text the errors were found in; it is used to point
    /// lines that came from included files back at those files.
    #[must_use]
    pub fn translate(
        &self,
        errors: NonEmpty<DecodeError>,
        buffer: &Preprocessed,
    ) -> DomainErrorReport {
        let render = |error: &DecodeError| self.message(error, buffer.origin(error.line));
        let messages = NonEmpty {
            head: render(&errors.head),
            tail: errors.tail.iter().map(render).collect(),
        };
        tracing::debug!(count = messages.len(), "translated decode errors");
        DomainErrorReport { messages, errors }
    }

    /// Renders a single error.
    #[must_use]
    pub fn message(&self, error: &DecodeError, origin: Option<&LineOrigin>) -> String {
        let location = location(error.line, origin);
        let destination = self.destination(error.target);

        let message = match &error.problem {
            Problem::Kind { found, value } => format!(
                "{location}: {destination} cannot be of type {}, must be {}",
                self.observed(*found, value.as_deref()),
                self.category(error.target),
            ),
            Problem::Missing { field } => {
                format!("{location}: {destination} is missing required field \"{field}\"")
            }
            Problem::Invalid { value, expected } => format!(
                "{location}: {destination} cannot be {}, must be {expected}",
                self.invalid_value(value),
            ),
        };

        let hint = match error.target {
            Target::Type(token) => self.vocabulary.hint(token),
            Target::SequenceOf(_) | Target::MappingOf(_) => None,
        };
        match hint {
            Some(hint) => format!("{message} ({hint})"),
            None => message,
        }
    }

    fn destination(&self, target: Target) -> String {
        let name = self.vocabulary.type_name(target.token());
        match target {
            Target::Type(_) => name.to_string(),
            Target::SequenceOf(_) => format!("sequence of {name}"),
            Target::MappingOf(_) => format!("mapping of {name}"),
        }
    }

    fn category(&self, target: Target) -> &str {
        match target {
            Target::Type(token) => self.vocabulary.category(token),
            Target::SequenceOf(_) => "sequence",
            Target::MappingOf(_) => "mapping",
        }
    }

    fn observed(&self, found: NodeKind, value: Option<&str>) -> String {
        let label = self.vocabulary.kind(found.token());
        match value {
            Some(value) if found.is_scalar() && found != NodeKind::Null => {
                format!("{label} (got \"{value}\")")
            }
            _ => label.to_string(),
        }
    }

    fn invalid_value(&self, value: &str) -> String {
        if value.starts_with("!!") {
            self.vocabulary.kind(value).to_string()
        } else {
            format!("\"{value}\"")
        }
    }
}

fn location(line: usize, origin: Option<&LineOrigin>) -> String {
    match origin {
        Some(LineOrigin {
            file: Some(file),
            line: source_line,
        }) => format!("line {line} ({}:{source_line})", file.display()),
        _ => format!("line {line}"),
    }
}

/// Every problem found while decoding a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainErrorReport {
    messages: NonEmpty<String>,
    errors: NonEmpty<DecodeError>,
}

impl DomainErrorReport {
    /// The rendered messages, in detection order.
    #[must_use]
    pub const fn messages(&self) -> &NonEmpty<String> {
        &self.messages
    }

    /// The underlying errors, in the same order as [`Self::messages`].
    #[must_use]
    pub const fn errors(&self) -> &NonEmpty<DecodeError> {
        &self.errors
    }
}

impl fmt::Display for DomainErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "problems parsing RAML:")?;
        for message in &self.messages {
            write!(f, "\n  {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DomainErrorReport {}
