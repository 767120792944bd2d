//! The parsing pipeline: read, check the version, expand includes, decode.

use std::path::Path;

use yaml_rust2::scanner::ScanError;

use crate::{
    config::Config,
    decode::{self, node},
    diagnostic::{DomainErrorReport, Translator, Vocabulary},
    model::ApiDefinition,
    preprocess::{IncludeError, Options, Preprocessed, Preprocessor},
    source::{self, FileError},
};

/// The marker every RAML 0.8 document must start with.
pub const RAML_VERSION: &str = "#%RAML 0.8";

/// Parses the RAML document at `path` with the default settings.
///
/// # Errors
///
/// See [`Parser::parse_file`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<ApiDefinition, Error> {
    Parser::default().parse_file(path.as_ref())
}

/// Parses RAML documents.
///
/// A parser holds no state between calls, so one parser can be shared
/// freely across threads.
#[derive(Debug, Clone)]
pub struct Parser {
    preprocessor: Preprocessor,
    vocabulary: Vocabulary,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Options::default(), Vocabulary::builtin().clone())
    }
}

impl Parser {
    /// Creates a parser with the given include options and diagnostic
    /// vocabulary.
    #[must_use]
    pub const fn new(options: Options, vocabulary: Vocabulary) -> Self {
        Self {
            preprocessor: Preprocessor::new(options),
            vocabulary,
        }
    }

    /// Creates a parser configured by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.include_options(), config.vocabulary())
    }

    /// Parses the RAML document at `path`.
    ///
    /// Includes are resolved relative to the directory containing `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a RAML 0.8
    /// document, has an include that cannot be expanded, is not valid YAML,
    /// or does not describe a valid API. In the last case every problem is
    /// reported together.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn parse_file(&self, path: &Path) -> Result<ApiDefinition, Error> {
        let (version, buffer) = self.expand_file(path)?;
        self.decode(version, &buffer)
    }

    /// Parses a RAML document held in memory.
    ///
    /// Includes are resolved relative to `directory`.
    ///
    /// # Errors
    ///
    /// See [`Parser::parse_file`].
    pub fn parse_str(&self, text: &str, directory: &Path) -> Result<ApiDefinition, Error> {
        let version = check_version(text)?;
        let buffer = self.preprocessor.expand(text, directory)?;
        self.decode(version, &buffer)
    }

    /// Reads the document at `path`, checks its version and expands its
    /// includes, without decoding it.
    ///
    /// Returns the version marker along with the expanded text.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a RAML 0.8
    /// document, or has an include that cannot be expanded.
    pub fn expand_file(&self, path: &Path) -> Result<(&'static str, Preprocessed), Error> {
        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        let name = path.file_name().map_or_else(|| Path::new(""), Path::new);

        let text = source::read_to_string(directory, name)?;
        let version = check_version(&text)?;
        let buffer = self.preprocessor.expand_file(&text, directory, name)?;

        tracing::debug!(lines = buffer.line_count(), "expanded includes");
        Ok((version, buffer))
    }

    fn decode(&self, version: &str, buffer: &Preprocessed) -> Result<ApiDefinition, Error> {
        tracing::trace!(text = buffer.text(), "preprocessed document");

        let root = node::load(buffer.text())?;
        let mut api = decode::decode::<ApiDefinition>(root.as_ref())
            .map_err(|errors| Translator::new(&self.vocabulary).translate(errors, buffer))?;

        api.raml_version = version.to_string();
        Ok(api)
    }
}

/// Checks the first-line version marker.
fn check_version(text: &str) -> Result<&'static str, VersionError> {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.starts_with(RAML_VERSION) {
        Ok(RAML_VERSION)
    } else {
        Err(VersionError {
            found: first_line.chars().take(RAML_VERSION.len()).collect(),
        })
    }
}

/// The document does not start with [`RAML_VERSION`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "input is not a RAML 0.8 document; make sure it starts with {} (found {found:?})",
    RAML_VERSION
)]
pub struct VersionError {
    found: String,
}

impl VersionError {
    /// The start of the first line that was found instead.
    #[must_use]
    pub fn found(&self) -> &str {
        &self.found
    }
}

/// Errors that can occur while parsing a RAML document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The root document could not be read.
    #[error(transparent)]
    File(#[from] FileError),

    /// The root document is not RAML 0.8.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// An `!include` directive could not be expanded.
    #[error(transparent)]
    Include(#[from] IncludeError),

    /// The expanded document is not valid YAML.
    #[error("YAML syntax error: {0}")]
    Syntax(#[from] ScanError),

    /// The document does not describe a valid API.
    #[error(transparent)]
    Decode(#[from] DomainErrorReport),
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("#%RAML 0.8\ntitle: x\n", true; "exact")]
    #[test_case("#%RAML 0.8 \n", true; "trailing space")]
    #[test_case("#%RAML 1.0\n", false; "wrong version")]
    #[test_case("title: x\n", false; "no marker")]
    #[test_case("", false; "empty")]
    #[test_case("\n#%RAML 0.8\n", false; "marker not on first line")]
    fn version_marker(text: &str, accepted: bool) {
        assert_eq!(check_version(text).is_ok(), accepted);
    }

    #[test]
    fn version_error_shows_what_was_found() {
        let error = check_version("#%RAML 1.0\n").unwrap_err();
        assert_eq!(error.found(), "#%RAML 1.0");
        assert!(error.to_string().contains(RAML_VERSION));
    }

    #[test]
    fn parse_str_sets_version() {
        let api = Parser::default()
            .parse_str("#%RAML 0.8\ntitle: Example\n", Path::new("."))
            .unwrap();
        assert_eq!(api.raml_version, RAML_VERSION);
        assert_eq!(api.title, "Example");
    }

    #[test]
    fn syntax_errors_are_fatal() {
        let error = Parser::default()
            .parse_str("#%RAML 0.8\ntitle: [unclosed\n", Path::new("."))
            .unwrap_err();
        assert!(matches!(error, Error::Syntax(_)));
    }

    #[test]
    fn runaway_aliases_are_fatal() {
        let mut text = String::from("#%RAML 0.8\ntitle: t\nl0: &l0 [lol, lol]\n");
        for i in 1..30 {
            text.push_str(&format!("l{i}: &l{i} [*l{}, *l{}]\n", i - 1, i - 1));
        }

        let error = Parser::default().parse_str(&text, Path::new(".")).unwrap_err();
        assert!(matches!(error, Error::Syntax(_)));
    }

    #[test]
    fn decode_errors_are_translated() {
        let error = Parser::default()
            .parse_str("#%RAML 0.8\ntitle: t\n/users:\n  get:\n    responses:\n      ok:\n", Path::new("."))
            .unwrap_err();

        let Error::Decode(report) = error else {
            panic!("expected decode error, got {error:?}");
        };
        assert_eq!(report.messages().len(), 1);
        assert!(report.messages().head.starts_with(
            "line 6: HTTP code cannot be of type string (got \"ok\"), must be integer"
        ));
    }

    #[test]
    fn empty_file_name_is_rejected() {
        let error = Parser::default().parse_file(Path::new("")).unwrap_err();
        assert!(matches!(error, Error::File(FileError::EmptyName(_))));
    }
}
