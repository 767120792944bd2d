use std::path::PathBuf;

use clap::Parser;
use tracing::instrument;

#[derive(Debug, Parser)]
pub struct Show {
    /// The RAML document to parse
    path: PathBuf,

    /// Print a single resource, by its absolute URI (e.g. /users/{id})
    #[arg(long, short)]
    resource: Option<String>,

    /// Print compact rather than indented JSON
    #[arg(long)]
    compact: bool,
}

impl Show {
    #[instrument(skip(parser))]
    pub fn run(self, parser: &raml::Parser) -> anyhow::Result<()> {
        let api = parser.parse_file(&self.path)?;

        let json = match &self.resource {
            Some(uri) => {
                let resource = api.resource(uri).ok_or_else(|| {
                    anyhow::anyhow!("no resource {uri} in {}", self.path.display())
                })?;
                self.render(resource)?
            }
            None => self.render(&api)?,
        };

        println!("{json}");
        Ok(())
    }

    fn render(&self, value: &impl serde::Serialize) -> serde_json::Result<String> {
        if self.compact {
            serde_json::to_string(value)
        } else {
            serde_json::to_string_pretty(value)
        }
    }
}
