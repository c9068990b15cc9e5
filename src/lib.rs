pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod output;
pub mod runner;
pub mod variables;

pub use cli::{Cli, OutputFormat};
pub use config::{Config, DirMode, IgnoreSet};
pub use error::{ExtractError, Result};
pub use extractor::{
    CommandLine, Directive, DirectiveExtractor, Extraction, SearchMode, SubstitutionRule, extract,
};
pub use output::{OutputFormatter, RunStats, get_formatter};
pub use runner::{FileOutcome, RunReport, Runner};
pub use variables::{FileFacts, Variables};
