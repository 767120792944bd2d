//! Textual `!include` expansion.
//!
//! YAML has no notion of file inclusion, so RAML's `!include` directive is
//! resolved before the document ever reaches the YAML engine. Expansion is
//! purely line based: a line containing the directive keeps everything in
//! front of the marker, and the referenced file is spliced in after it. The
//! first spliced line continues the directive's line; every following line
//! is indented to the column the marker was found at, so the included
//! content nests under the same key.
//!
//! ```text
//! schema: !include user.json        schema: {
//!                                 =>          "type": "object"
//!                                           }
//! ```
//!
//! The preprocessor never interprets YAML itself.

use std::path::{Path, PathBuf};

use crate::source::{self, FileError};

/// The directive marker, including the separating space.
pub const INCLUDE_DIRECTIVE: &str = "!include ";

/// Controls how directives inside included files are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Expand directives found inside included files.
    ///
    /// When `false`, included files are spliced in verbatim.
    pub nested: bool,

    /// The maximum include nesting depth when `nested` is set.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            nested: true,
            max_depth: 16,
        }
    }
}

/// Expands `!include` directives in `text` with the default [`Options`].
///
/// Referenced paths are resolved relative to `directory`.
///
/// # Errors
///
/// Returns an error if any referenced file cannot be read.
pub fn expand(text: &str, directory: &Path) -> Result<Preprocessed, IncludeError> {
    Preprocessor::default().expand(text, directory)
}

/// Expands `!include` directives.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    options: Options,
}

impl Preprocessor {
    /// Creates a preprocessor with the given options.
    #[must_use]
    pub const fn new(options: Options) -> Self {
        Self { options }
    }

    /// Expands directives in an anonymous document.
    ///
    /// # Errors
    ///
    /// Returns an error if any referenced file cannot be read, if includes
    /// form a cycle, or if they nest deeper than the configured limit.
    pub fn expand(&self, text: &str, directory: &Path) -> Result<Preprocessed, IncludeError> {
        self.expand_in(text, directory, None, &mut Vec::new(), 0)
    }

    /// Expands directives in the document `name`, whose content is `text`.
    ///
    /// Knowing the document's own name lets a document that includes
    /// itself be reported as a cycle.
    ///
    /// # Errors
    ///
    /// See [`Preprocessor::expand`].
    pub fn expand_file(
        &self,
        text: &str,
        directory: &Path,
        name: &Path,
    ) -> Result<Preprocessed, IncludeError> {
        let path = directory.join(name);
        let mut stack = vec![canonical(&path)];
        self.expand_in(text, directory, None, &mut stack, 0)
    }

    fn expand_in(
        &self,
        text: &str,
        directory: &Path,
        file: Option<&Path>,
        stack: &mut Vec<PathBuf>,
        depth: usize,
    ) -> Result<Preprocessed, IncludeError> {
        let mut output = Preprocessed::with_capacity(text.len());

        for (index, raw_line) in text.split_inclusive('\n').enumerate() {
            let origin = LineOrigin {
                file: file.map(Path::to_path_buf),
                line: index + 1,
            };
            let line = raw_line.strip_suffix('\n').unwrap_or(raw_line);

            match Directive::find(line) {
                None => output.push(raw_line, origin),
                Some(directive) => {
                    let included = self.include(&directive, directory, stack, depth)?;
                    output.splice(&line[..directive.column], directive.column, included, origin);
                }
            }
        }

        Ok(output)
    }

    fn include(
        &self,
        directive: &Directive<'_>,
        directory: &Path,
        stack: &mut Vec<PathBuf>,
        depth: usize,
    ) -> Result<Preprocessed, IncludeError> {
        let reference = Path::new(directive.reference);
        let path = directory.join(reference);
        tracing::debug!(reference = directive.reference, column = directive.column, "including file");

        let text = source::read_to_string(directory, reference).map_err(|source| {
            IncludeError::Unresolved {
                reference: directive.reference.to_string(),
                source,
            }
        })?;

        if !self.options.nested {
            return Ok(Preprocessed::verbatim(&text, &path));
        }

        if depth >= self.options.max_depth {
            return Err(IncludeError::TooDeep {
                reference: directive.reference.to_string(),
                limit: self.options.max_depth,
            });
        }

        let key = canonical(&path);
        if stack.contains(&key) {
            return Err(IncludeError::Cycle {
                reference: directive.reference.to_string(),
            });
        }

        let nested_directory = path.parent().unwrap_or(directory).to_path_buf();

        stack.push(key);
        let expanded = self.expand_in(&text, &nested_directory, Some(&path), stack, depth + 1);
        stack.pop();

        expanded
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// An `!include` directive found on a line.
#[derive(Debug, PartialEq, Eq)]
struct Directive<'a> {
    /// Byte offset of the marker within the line.
    column: usize,
    /// The referenced path, as written.
    reference: &'a str,
}

impl<'a> Directive<'a> {
    /// Finds a directive in a single line (without its terminator).
    fn find(line: &'a str) -> Option<Self> {
        let column = line.find(INCLUDE_DIRECTIVE)?;
        let reference = line[column + INCLUDE_DIRECTIVE.len()..].trim();
        Some(Self { column, reference })
    }
}

/// Where a line of preprocessed text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOrigin {
    /// The included file the line came from, or `None` for the root
    /// document.
    pub file: Option<PathBuf>,
    /// The 1-based line number within that file.
    pub line: usize,
}

/// The flattened document text, with every directive resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preprocessed {
    text: String,
    origins: Vec<LineOrigin>,
}

impl Preprocessed {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            origins: Vec::new(),
        }
    }

    fn verbatim(text: &str, path: &Path) -> Self {
        let origins = (1..=text.split_inclusive('\n').count())
            .map(|line| LineOrigin {
                file: Some(path.to_path_buf()),
                line,
            })
            .collect();
        Self {
            text: text.to_string(),
            origins,
        }
    }

    fn push(&mut self, raw_line: &str, origin: LineOrigin) {
        self.text.push_str(raw_line);
        self.origins.push(origin);
    }

    fn splice(&mut self, prefix: &str, column: usize, included: Self, origin: LineOrigin) {
        self.text.push_str(prefix);

        if included.text.is_empty() {
            self.text.push('\n');
            self.origins.push(origin);
            return;
        }

        let indentation = " ".repeat(column);
        let mut origin = Some(origin);

        for (line, included_origin) in included.text.lines().zip(included.origins) {
            match origin.take() {
                Some(directive_origin) => self.origins.push(directive_origin),
                None => {
                    self.text.push_str(&indentation);
                    self.origins.push(included_origin);
                }
            }
            self.text.push_str(line);
            self.text.push('\n');
        }
    }

    /// The expanded text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consumes the buffer, returning the expanded text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    /// The number of lines in the expanded text.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.origins.len()
    }

    /// Where the given 1-based line of the expanded text came from.
    #[must_use]
    pub fn origin(&self, line: usize) -> Option<&LineOrigin> {
        line.checked_sub(1).and_then(|index| self.origins.get(index))
    }
}

/// Errors that can occur while expanding includes.
#[derive(Debug, thiserror::Error)]
pub enum IncludeError {
    /// A referenced file could not be read.
    #[error("error including file {reference}")]
    Unresolved {
        /// The path as written after the directive.
        reference: String,
        /// Why the file could not be read.
        source: FileError,
    },

    /// A file includes itself, directly or indirectly.
    #[error("include cycle detected at {reference}")]
    Cycle {
        /// The path as written after the directive.
        reference: String,
    },

    /// Includes nest too deeply.
    #[error("file {reference} is nested more than {limit} includes deep")]
    TooDeep {
        /// The path as written after the directive.
        reference: String,
        /// The configured limit.
        limit: usize,
    },
}

impl IncludeError {
    /// The reference that could not be included.
    #[must_use]
    pub fn reference(&self) -> &str {
        match self {
            Self::Unresolved { reference, .. }
            | Self::Cycle { reference }
            | Self::TooDeep { reference, .. } => reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use test_case::test_case;

    use super::*;

    fn fixture(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for (name, content) in files {
            let path = tmp.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }
        tmp
    }

    #[test_case("#%RAML 0.8\ntitle: API\n"; "terminated")]
    #[test_case("#%RAML 0.8\ntitle: API"; "unterminated final line")]
    #[test_case("#%RAML 0.8\r\ntitle: API\r\n"; "crlf")]
    #[test_case("#%RAML 0.8\n\n\n# comment\n"; "blank lines")]
    #[test_case(""; "empty")]
    fn documents_without_directives_are_unchanged(input: &str) {
        let output = expand(input, Path::new("/nonexistent")).unwrap();
        assert_eq!(output.text(), input);
    }

    #[test]
    fn directive_content_is_indented_to_marker_column() {
        let tmp = fixture(&[("user.json", "{\n  \"type\": \"object\"\n}")]);
        let input = "schemas:\n  - user: !include user.json\ntitle: API\n";

        let output = expand(input, tmp.path()).unwrap();

        assert_eq!(
            output.text(),
            "schemas:\n  - user: {\n            \"type\": \"object\"\n          }\ntitle: API\n"
        );
    }

    #[test]
    fn every_included_line_is_newline_terminated() {
        let tmp = fixture(&[("a.txt", "one\ntwo\n")]);
        let output = expand("k: !include a.txt", tmp.path()).unwrap();
        assert_eq!(output.text(), "k: one\n   two\n");
    }

    #[test]
    fn empty_include_terminates_directive_line() {
        let tmp = fixture(&[("empty.txt", "")]);
        let output = expand("a: !include empty.txt\nb: 1\n", tmp.path()).unwrap();
        assert_eq!(output.text(), "a: \nb: 1\n");
    }

    #[test]
    fn trailing_whitespace_after_reference_is_ignored() {
        let tmp = fixture(&[("a.txt", "value")]);
        let output = expand("k: !include a.txt  \r\n", tmp.path()).unwrap();
        assert_eq!(output.text(), "k: value\n");
    }

    #[test]
    fn missing_include_names_reference() {
        let tmp = TempDir::new().unwrap();
        let error = expand("k: !include missing.yaml\n", tmp.path()).unwrap_err();

        assert_eq!(error.reference(), "missing.yaml");
        assert!(error.to_string().contains("missing.yaml"));
        assert!(matches!(
            error,
            IncludeError::Unresolved {
                source: FileError::NotFound { .. },
                ..
            }
        ));
    }

    #[test]
    fn empty_reference_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let error = expand("k: !include   \n", tmp.path()).unwrap_err();
        assert!(matches!(
            error,
            IncludeError::Unresolved {
                source: FileError::EmptyName(_),
                ..
            }
        ));
    }

    #[test]
    fn nested_includes_resolve_relative_to_including_file() {
        let tmp = fixture(&[
            ("types/user.yaml", "type: object\nproperties: !include props.yaml\n"),
            ("types/props.yaml", "id: integer\nname: string\n"),
        ]);
        let input = "user: !include types/user.yaml\n";

        let output = expand(input, tmp.path()).unwrap();

        assert_eq!(
            output.text(),
            "user: type: object\n      properties: id: integer\n                  name: string\n"
        );
    }

    #[test]
    fn single_pass_leaves_nested_directives_in_place() {
        let tmp = fixture(&[("a.yaml", "x: !include b.yaml\n")]);
        let preprocessor = Preprocessor::new(Options {
            nested: false,
            ..Options::default()
        });

        let output = preprocessor.expand("a: !include a.yaml\n", tmp.path()).unwrap();
        assert_eq!(output.text(), "a: x: !include b.yaml\n");
    }

    #[test]
    fn include_cycle_is_detected() {
        let tmp = fixture(&[("a.yaml", "b: !include b.yaml\n"), ("b.yaml", "a: !include a.yaml\n")]);
        let error = expand("root: !include a.yaml\n", tmp.path()).unwrap_err();
        assert!(matches!(error, IncludeError::Cycle { ref reference } if reference == "a.yaml"));
    }

    #[test]
    fn self_include_of_root_is_a_cycle() {
        let tmp = fixture(&[("api.raml", "x: !include api.raml\n")]);
        let error = Preprocessor::default()
            .expand_file("x: !include api.raml\n", tmp.path(), Path::new("api.raml"))
            .unwrap_err();
        assert!(matches!(error, IncludeError::Cycle { .. }));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let tmp = fixture(&[
            ("1.yaml", "a: !include 2.yaml\n"),
            ("2.yaml", "b: !include 3.yaml\n"),
            ("3.yaml", "c: leaf\n"),
        ]);
        let preprocessor = Preprocessor::new(Options {
            nested: true,
            max_depth: 1,
        });

        let error = preprocessor.expand("r: !include 1.yaml\n", tmp.path()).unwrap_err();
        assert!(matches!(error, IncludeError::TooDeep { limit: 1, .. }));
        assert_eq!(error.reference(), "2.yaml");
    }

    #[test]
    fn origins_track_included_lines() {
        let tmp = fixture(&[("body.yaml", "first\nsecond\nthird\n")]);
        let output = expand("a: 1\nb: !include body.yaml\nc: 2\n", tmp.path()).unwrap();

        assert_eq!(output.line_count(), 5);
        assert_eq!(output.origin(1), Some(&LineOrigin { file: None, line: 1 }));
        assert_eq!(output.origin(2), Some(&LineOrigin { file: None, line: 2 }));
        assert_eq!(
            output.origin(3),
            Some(&LineOrigin {
                file: Some(tmp.path().join("body.yaml")),
                line: 2,
            })
        );
        assert_eq!(output.origin(5), Some(&LineOrigin { file: None, line: 3 }));
        assert_eq!(output.origin(0), None);
        assert_eq!(output.origin(6), None);
    }

    #[test]
    fn directive_marker_requires_trailing_space() {
        assert_eq!(Directive::find("key: !include"), None);
        assert_eq!(
            Directive::find("  key: !include a.raml"),
            Some(Directive {
                column: 7,
                reference: "a.raml"
            })
        );
    }
}
