use std::path::PathBuf;

use clap::Parser;
use tracing::instrument;

use super::terminal::{Colorize, Status};

#[derive(Debug, Parser)]
pub struct Expand {
    /// The RAML document to expand
    path: PathBuf,

    /// Annotate each line with the file and line it came from
    #[arg(long)]
    origins: bool,
}

impl Expand {
    #[instrument(skip(parser))]
    pub fn run(self, parser: &raml::Parser) -> anyhow::Result<()> {
        let (_, buffer) = parser.expand_file(&self.path)?;

        if !self.origins {
            print!("{}", buffer.text());
            return Ok(());
        }

        let root = self.path.display().to_string();
        for (index, line) in buffer.text().lines().enumerate() {
            let origin = buffer.origin(index + 1).map_or_else(String::new, |origin| {
                let file = origin
                    .file
                    .as_ref()
                    .map_or_else(|| root.clone(), |file| file.display().to_string());
                format!("{file}:{}", origin.line)
            });
            println!("{} {line}", format!("{origin:>24} |").styled(Status::Margin));
        }
        Ok(())
    }
}
