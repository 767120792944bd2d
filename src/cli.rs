use std::path::{Path, PathBuf};

mod check;
mod expand;
mod show;
mod terminal;

use check::Check;
use clap::ArgAction;
use expand::Expand;
use raml::{Config, Parser};
use show::Show;

/// The configuration file picked up from the working directory.
const DEFAULT_CONFIG: &str = "raml.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// Path to a configuration file (defaults to ./raml.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = load_config(self.config.as_deref())?;
        self.command.run(&Parser::from_config(&config))
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).is_file() => Path::new(DEFAULT_CONFIG),
        None => return Ok(Config::default()),
    };

    tracing::info!(path = %path.display(), "loading configuration");
    Config::load(path).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Check RAML documents and report every problem found
    ///
    /// Directories are searched recursively for `.raml` files.
    Check(Check),

    /// Parse a RAML document and print it as JSON
    Show(Show),

    /// Print a RAML document with its includes expanded
    Expand(Expand),
}

impl Command {
    fn run(self, parser: &Parser) -> anyhow::Result<()> {
        match self {
            Self::Check(command) => command.run(parser)?,
            Self::Show(command) => command.run(parser)?,
            Self::Expand(command) => command.run(parser)?,
        }
        Ok(())
    }
}
