use std::path::{Path, PathBuf};

use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use tracing::instrument;
use walkdir::WalkDir;

use super::terminal::{Colorize, Status};

#[derive(Debug, Parser)]
pub struct Check {
    /// Files or directories to check
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    output: OutputFormat,

    /// Only print documents with problems
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// The outcome of checking one document.
#[derive(Debug, Serialize)]
struct Outcome {
    path: PathBuf,
    ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    problems: Vec<String>,
}

impl Outcome {
    fn new(path: PathBuf, result: Result<raml::ApiDefinition, raml::Error>) -> Self {
        match result {
            Ok(_) => Self {
                path,
                ok: true,
                problems: Vec::new(),
            },
            Err(raml::Error::Decode(report)) => Self {
                path,
                ok: false,
                problems: report.messages().iter().cloned().collect(),
            },
            Err(error) => Self {
                path,
                ok: false,
                problems: vec![error_chain(&error)],
            },
        }
    }
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl Check {
    #[instrument(skip(parser))]
    pub fn run(self, parser: &raml::Parser) -> anyhow::Result<()> {
        let files = collect_documents(&self.paths)?;
        if files.is_empty() {
            anyhow::bail!("no RAML documents found");
        }

        let outcomes: Vec<Outcome> = files
            .into_par_iter()
            .map(|path| {
                let result = parser.parse_file(&path);
                Outcome::new(path, result)
            })
            .collect();

        match self.output {
            OutputFormat::Text => self.print_text(&outcomes),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcomes)?),
        }

        let failed = outcomes.iter().filter(|outcome| !outcome.ok).count();
        if failed > 0 {
            anyhow::bail!("{failed} of {} documents have problems", outcomes.len());
        }
        Ok(())
    }

    fn print_text(&self, outcomes: &[Outcome]) {
        for outcome in outcomes {
            let path = outcome.path.display().to_string();
            if outcome.ok {
                if !self.quiet {
                    println!("{} {}", "ok".styled(Status::Passed), path);
                }
                continue;
            }

            println!("{} {}", "error".styled(Status::Failed), path);
            for problem in &outcome.problems {
                println!("  {problem}");
            }
        }

        if !self.quiet {
            let passed = outcomes.iter().filter(|outcome| outcome.ok).count();
            println!();
            println!(
                "{}",
                format!("{passed} of {} documents ok", outcomes.len()).styled(Status::Summary)
            );
        }
    }
}

/// Expands directories into the `.raml` files beneath them, in a stable
/// order. Files named explicitly are kept whatever their extension.
fn collect_documents(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.exists() {
            anyhow::bail!("{} does not exist", path.display());
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && is_raml(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    tracing::debug!(count = files.len(), "collected documents");
    Ok(files)
}

fn is_raml(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "raml")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn collects_raml_files_recursively() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("b.raml"), "").unwrap();
        std::fs::write(tmp.path().join("nested/a.raml"), "").unwrap();
        std::fs::write(tmp.path().join("schema.json"), "").unwrap();

        let files = collect_documents(&[tmp.path().to_path_buf()]).unwrap();

        assert_eq!(
            files,
            [tmp.path().join("b.raml"), tmp.path().join("nested/a.raml")]
        );
    }

    #[test]
    fn explicit_files_are_kept() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("api.yaml");
        std::fs::write(&file, "").unwrap();

        assert_eq!(collect_documents(std::slice::from_ref(&file)).unwrap(), [file]);
    }

    #[test]
    fn missing_paths_are_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(collect_documents(&[tmp.path().join("missing")]).is_err());
    }

    #[test]
    fn decode_problems_are_listed_individually() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("api.raml");
        std::fs::write(&path, "#%RAML 0.8\nversion: [v1]\n").unwrap();

        let outcome = Outcome::new(path.clone(), raml::parse_file(&path));

        assert!(!outcome.ok);
        assert_eq!(outcome.problems.len(), 2);
    }
}
