use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{diagnostic::Vocabulary, preprocess};

/// Configuration for parsing RAML documents.
///
/// Controls how `!include` directives are expanded and lets the labels used
/// in diagnostics be adjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Whether directives inside included files are expanded too.
    ///
    /// When `false`, included files are spliced in verbatim.
    pub nested_includes: bool,

    /// How many includes deep expansion may go before giving up.
    pub max_include_depth: usize,

    /// Replacement names for target types, keyed by type token.
    ///
    /// For example, `NamedParameter = "parameter"`.
    type_names: BTreeMap<String, String>,

    /// Replacement labels for node kinds, keyed by YAML tag.
    ///
    /// For example, `"!!str" = "text"`.
    kind_names: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nested_includes: true,
            max_include_depth: default_max_include_depth(),
            type_names: BTreeMap::new(),
            kind_names: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The include expansion options this configuration describes.
    #[must_use]
    pub const fn include_options(&self) -> preprocess::Options {
        preprocess::Options {
            nested: self.nested_includes,
            max_depth: self.max_include_depth,
        }
    }

    /// The built-in vocabulary with this configuration's overrides applied.
    #[must_use]
    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::builtin().with_overrides(&self.type_names, &self.kind_names)
    }

    /// Overrides the name used for a target type in diagnostics.
    pub fn set_type_name(&mut self, token: impl Into<String>, name: impl Into<String>) {
        self.type_names.insert(token.into(), name.into());
    }

    /// Overrides the label used for a node kind in diagnostics.
    pub fn set_kind_name(&mut self, tag: impl Into<String>, label: impl Into<String>) {
        self.kind_names.insert(tag.into(), label.into());
    }
}

const fn default_max_include_depth() -> usize {
    16
}

const fn default_nested_includes() -> bool {
    true
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_nested_includes")]
        nested_includes: bool,

        #[serde(default = "default_max_include_depth")]
        max_include_depth: usize,

        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        type_names: BTreeMap<String, String>,

        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        kind_names: BTreeMap<String, String>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                nested_includes,
                max_include_depth,
                type_names,
                kind_names,
            } => Self {
                nested_includes,
                max_include_depth,
                type_names,
                kind_names,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            nested_includes: config.nested_includes,
            max_include_depth: config.max_include_depth,
            type_names: config.type_names,
            kind_names: config.kind_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nnested_includes = false\nmax_include_depth = 4\n\n[type_names]\nNamedParameter = \"parameter\"\n\n[kind_names]\n\"!!str\" = \"text\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert!(!config.nested_includes);
        assert_eq!(config.max_include_depth, 4);
        assert_eq!(
            config.include_options(),
            preprocess::Options {
                nested: false,
                max_depth: 4
            }
        );

        let vocabulary = config.vocabulary();
        assert_eq!(vocabulary.type_name("NamedParameter"), "parameter");
        assert_eq!(vocabulary.kind("!!str"), "text");
        assert_eq!(vocabulary.kind("!!map"), "mapping");
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nmax_include_depth = \"deep\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
        assert_eq!(actual.include_options(), preprocess::Options::default());
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("raml.toml");

        let mut config = Config::default();
        config.set_type_name("Resource", "endpoint");
        config.set_kind_name("!!seq", "list");
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
