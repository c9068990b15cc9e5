use crate::config::{Config, DirMode};
use crate::error::{ExtractError, Result};
use crate::extractor::{DirectiveExtractor, SearchMode, SubstitutionRule};
use crate::variables::Variables;
use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for extracted commands
#[derive(Debug, Clone, Default, ValueEnum)]
pub enum OutputFormat {
    /// The command line(s), ready for a shell
    #[default]
    Human,
    /// JSON format for machine processing
    Json,
}

/// Command-line interface for inmake
#[derive(Parser)]
#[command(
    name = "inmake",
    about = "Finds build commands embedded in source file comments",
    version = env!("CARGO_PKG_VERSION"),
    group(ArgGroup::new("search").args(["prefix", "suffix", "regex"]).multiple(false)),
    after_help = "Without -p, -s or -x the second line (or the third, after an encoding line) is used."
)]
pub struct Cli {
    /// Files or directories to scan
    #[arg(help = "Files or directories to scan")]
    pub files: Vec<PathBuf>,

    /// Target file (repeatable)
    #[arg(short = 'f', long = "file", value_name = "PATH", help = "Specify a target file")]
    pub file: Vec<PathBuf>,

    /// Comment prefix marking the directive line
    #[arg(short, long, help = "Find the build command by a prefix")]
    pub prefix: Option<String>,

    /// Suffix marking the directive line
    #[arg(short, long, help = "Find the build command by a suffix")]
    pub suffix: Option<String>,

    /// Regular expression matching the directive line
    #[arg(short = 'x', long, help = "Find the build command by a regular expression")]
    pub regex: Option<String>,

    /// Literal command text
    #[arg(short, long, value_name = "TEXT", help = "Use TEXT as the command instead of the directive text")]
    pub marker: Option<String>,

    /// Placeholder character
    #[arg(short = 'r', long = "replace", value_name = "CHAR", help = "Placeholder character to substitute")]
    pub placeholder: Option<char>,

    /// Replacement for the placeholder
    #[arg(short = 'w', long = "with", value_name = "VALUE", help = "Value substituted for the placeholder")]
    pub with: Option<String>,

    /// Strip placeholders (or regex matches) instead of replacing them
    #[arg(long, help = "Strip the placeholder, or everything matched by -x")]
    pub strip_matched: bool,

    /// Replacement variables
    #[arg(short = 'a', long = "add-var", value_name = "KEY=VALUE", help = "Add a replacement from {{KEY}} to VALUE")]
    pub add_var: Vec<String>,

    /// Disable variable expansion
    #[arg(long, help = "Disable all replacement variables, even the built-in ones")]
    pub no_vars: bool,

    /// Do not fail on named files without a build command
    #[arg(long, help = "Silently continue if a file has no build command")]
    pub ignore_nonmatched: bool,

    /// Directory handling
    #[arg(short, long, value_enum, help = "Behavior when a directory is given")]
    pub dir_mode: Option<DirMode>,

    /// Configuration file path
    #[arg(short, long, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    /// Show configuration and exit
    #[arg(long, help = "Show effective configuration and exit")]
    pub show_config: bool,

    /// Output format
    #[arg(short = 'F', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Cli {
    /// All inputs: `-f` files first, then positional ones
    pub fn get_files(&self) -> Vec<PathBuf> {
        self.file.iter().chain(self.files.iter()).cloned().collect()
    }

    /// Search mode selected by the flags
    pub fn search_mode(&self) -> Result<SearchMode> {
        if let Some(prefix) = &self.prefix {
            Ok(SearchMode::Prefix(prefix.clone()))
        } else if let Some(suffix) = &self.suffix {
            Ok(SearchMode::Suffix(suffix.clone()))
        } else if let Some(regex) = &self.regex {
            SearchMode::regex(regex)
        } else {
            Ok(SearchMode::SecondLine)
        }
    }

    /// Substitution rules in application order: marker, then placeholder
    pub fn get_rules(&self, strip_matched: bool) -> Result<Vec<SubstitutionRule>> {
        let mut rules = Vec::new();

        if let Some(marker) = &self.marker {
            rules.push(SubstitutionRule::Marker(marker.clone()));
        }

        if let Some(placeholder) = self.placeholder {
            let rule = SubstitutionRule::placeholder(placeholder, self.with.clone(), strip_matched)
                .ok_or_else(|| ExtractError::invalid_config("-r needs --with VALUE or --strip-matched"))?;
            rules.push(rule);
        } else if self.with.is_some() {
            return Err(ExtractError::invalid_config("--with needs a placeholder given with -r"));
        }

        Ok(rules)
    }

    /// Parse `-a KEY=VALUE` definitions
    pub fn get_variables(&self) -> Result<Variables> {
        let mut variables = Variables::new();
        for definition in &self.add_var {
            variables.define(definition)?;
        }
        Ok(variables)
    }

    /// Apply command-line settings on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        config.variables.extend(&self.get_variables()?);
        config.no_vars |= self.no_vars;
        config.ignore_nonmatched |= self.ignore_nonmatched;
        config.strip_matched |= self.strip_matched;
        if self.dir_mode.is_some() {
            config.dir_mode = self.dir_mode;
        }
        Ok(())
    }

    /// Build the extractor described by the flags and configuration
    pub fn build_extractor(&self, config: &Config) -> Result<DirectiveExtractor> {
        let extractor = DirectiveExtractor::new(self.search_mode()?)?
            .with_rules(self.get_rules(config.strip_matched)?)
            .with_strip_matched(config.strip_matched);
        Ok(extractor)
    }
}
