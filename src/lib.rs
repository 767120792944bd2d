//! RAML 0.8 parsing
//!
//! A RAML document is read from disk, its `!include` directives are
//! expanded into a single buffer, and the buffer is decoded into an
//! [`ApiDefinition`]. Every decoding problem in the document is reported at
//! once, each with the line it was found on.
//!
//! ```no_run
//! let api = raml::parse_file("api.raml")?;
//! println!("{} has {} top-level resources", api.title, api.resources.len());
//! # Ok::<(), raml::Error>(())
//! ```

pub mod source;
pub use source::FileError;

pub mod preprocess;
pub use preprocess::{IncludeError, Preprocessed, Preprocessor};

pub mod decode;
pub use decode::{DecodeError, Problem, Target};

pub mod model;
pub use model::{ApiDefinition, HttpMethod, Resource};

pub mod diagnostic;
pub use diagnostic::{DomainErrorReport, Translator, Vocabulary};

mod config;
pub use config::Config;

pub mod parser;
pub use parser::{Error, Parser, RAML_VERSION, VersionError, parse_file};
