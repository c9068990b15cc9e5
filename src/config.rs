use crate::variables::Variables;
use clap::ValueEnum;
use eyre::{Context, ContextCompat, Result};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ignore patterns used when the configuration names none
const DEFAULT_IGNORE: [&str; 3] = ["**/.git/**", "**/target/**", "**/node_modules/**"];

/// How directories passed as inputs are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DirMode {
    /// Recurse into directories
    #[default]
    Accept,
    /// Skip directories
    Ignore,
}

/// Main configuration for inmake
///
/// `ignore` and `dir-mode` stay `None` until every `extends` level is merged,
/// so a child can tell "not set" from an explicit value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Base configuration to extend from
    pub extends: Option<String>,
    /// Replacement variables available as `{{KEY}}`
    pub variables: Variables,
    /// Glob patterns skipped while walking directories
    pub ignore: Option<Vec<String>>,
    /// Directory handling
    pub dir_mode: Option<DirMode>,
    /// Do not fail when a named file has no build command
    pub ignore_nonmatched: bool,
    /// Strip placeholders or regex matches instead of replacing them
    pub strip_matched: bool,
    /// Disable all variable expansion, built-ins included
    pub no_vars: bool,
}

impl Config {
    /// Load configuration from a file path
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => path.clone(),
            None => Self::default_config_path()?,
        };

        if config_file.exists() {
            let config = Self::load_file(&config_file, &mut HashSet::new())?;
            Ok(config.with_defaults())
        } else if config_path.is_some() {
            Err(eyre::eyre!("Config file not found: {}", config_file.display()))
        } else {
            Ok(Self::default().with_defaults())
        }
    }

    /// Read one file and everything it extends, without built-in defaults
    fn load_file(config_file: &Path, visited: &mut HashSet<PathBuf>) -> Result<Self> {
        let canonical = fs::canonicalize(config_file)
            .with_context(|| format!("Failed to resolve config file: {}", config_file.display()))?;
        if !visited.insert(canonical) {
            return Err(eyre::eyre!("Circular extends: {}", config_file.display()));
        }

        debug!(path = %config_file.display(), "loading configuration");
        let content = fs::read_to_string(config_file)
            .with_context(|| format!("Failed to read config file: {}", config_file.display()))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_file.display()))?;
        config.variables = normalize(&config.variables);

        if let Some(base_name) = &config.extends {
            let base_config = Self::load_base_config(base_name, config_file, visited)?;
            config = config.merge_with_base(base_config);
        }

        Ok(config)
    }

    /// Load a base configuration relative to the current one
    fn load_base_config(
        base_name: &str,
        current_config_path: &Path,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<Self> {
        let base_path = if Path::new(base_name).is_absolute() {
            PathBuf::from(base_name)
        } else {
            current_config_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(base_name)
        };

        if base_path.exists() {
            Self::load_file(&base_path, visited)
        } else {
            Err(eyre::eyre!("Base configuration '{}' not found", base_name))
        }
    }

    /// Merge this configuration with a base configuration
    fn merge_with_base(mut self, base: Self) -> Self {
        let mut merged = base.variables;
        merged.extend(&self.variables);
        self.variables = merged;

        self.ignore = self.ignore.or(base.ignore);
        self.dir_mode = self.dir_mode.or(base.dir_mode);

        self.ignore_nonmatched |= base.ignore_nonmatched;
        self.strip_matched |= base.strip_matched;
        self.no_vars |= base.no_vars;

        self
    }

    /// Fill unset fields with the built-in defaults
    fn with_defaults(mut self) -> Self {
        self.ignore
            .get_or_insert_with(|| DEFAULT_IGNORE.iter().map(|p| p.to_string()).collect());
        self.dir_mode.get_or_insert_default();
        self
    }

    /// Get the default configuration file path
    fn default_config_path() -> Result<PathBuf> {
        let candidates = [".inmake.yaml", ".inmake.yml", "inmake.yaml", "inmake.yml"];

        for candidate in candidates {
            let candidate = PathBuf::from(candidate);
            if candidate.exists() {
                return Ok(candidate);
            }
        }

        let config_dir = dirs::config_local_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .context("Could not determine config directory")?;

        Ok(config_dir.join("inmake").join("config.yaml"))
    }

    /// Effective directory handling
    pub fn dir_mode(&self) -> DirMode {
        self.dir_mode.unwrap_or_default()
    }

    /// Compile the ignore patterns
    pub fn ignore_set(&self) -> Result<IgnoreSet> {
        match &self.ignore {
            Some(patterns) => IgnoreSet::new(patterns),
            None => IgnoreSet::new(&DEFAULT_IGNORE),
        }
    }
}

/// Compiled ignore globs, matched against paths relative to a walked directory.
///
/// A pattern without `/` matches the file name at any depth. A pattern with
/// `/` matches the whole relative path; a trailing `/` means everything below
/// that directory.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    paths: Vec<Pattern>,
    names: Vec<Pattern>,
}

impl IgnoreSet {
    const OPTIONS: MatchOptions = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut set = Self::default();

        for raw in patterns {
            let raw = raw.as_ref();
            let expanded = match raw.strip_suffix('/') {
                Some(dir) => format!("{dir}/**"),
                None => raw.to_string(),
            };
            let pattern =
                Pattern::new(&expanded).with_context(|| format!("Invalid ignore pattern: {raw}"))?;

            if expanded.contains('/') {
                set.paths.push(pattern);
            } else {
                set.names.push(pattern);
            }
        }

        Ok(set)
    }

    /// Check a path relative to the walk root
    pub fn is_ignored(&self, relative: &Path) -> bool {
        if self.paths.iter().any(|p| p.matches_path_with(relative, Self::OPTIONS)) {
            return true;
        }

        relative.file_name().is_some_and(|name| {
            let name = name.to_string_lossy();
            self.names.iter().any(|p| p.matches_with(&name, Self::OPTIONS))
        })
    }
}

/// Upper-case the keys of variables read from a file
fn normalize(variables: &Variables) -> Variables {
    let mut normalized = Variables::new();
    for (key, value) in variables.iter() {
        normalized.insert(key, value);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dir_mode(), DirMode::Accept);
        assert!(!config.ignore_nonmatched);
        assert!(!config.strip_matched);
        assert!(!config.no_vars);
        assert!(config.variables.is_empty());
    }

    #[test]
    fn test_load_yaml() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write(
            &temp_dir,
            "inmake.yaml",
            "variables:\n  cc: clang\nignore-nonmatched: true\ndir-mode: ignore\n",
        );

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.variables.get("CC"), Some("clang"));
        assert!(config.ignore_nonmatched);
        assert_eq!(config.dir_mode(), DirMode::Ignore);
        // unspecified fields get the built-in defaults
        assert_eq!(config.ignore.as_deref().map(<[String]>::len), Some(DEFAULT_IGNORE.len()));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let missing = PathBuf::from("/definitely/not/here/inmake.yaml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write(&temp_dir, "inmake.yaml", "dir-mode: sideways\n");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_extends_merges_variables() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write(
            &temp_dir,
            "base.yaml",
            "variables:\n  CC: gcc\n  OPT: -O2\nstrip-matched: true\n",
        );
        let path = write(
            &temp_dir,
            "inmake.yaml",
            "extends: base.yaml\nvariables:\n  CC: clang\n",
        );

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.variables.get("CC"), Some("clang"));
        assert_eq!(config.variables.get("OPT"), Some("-O2"));
        assert!(config.strip_matched);
    }

    #[test]
    fn test_extends_inherits_ignore() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write(&temp_dir, "base.yaml", "ignore:\n  - generated/\n");
        let path = write(&temp_dir, "inmake.yaml", "extends: base.yaml\n");

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.ignore, Some(vec!["generated/".to_string()]));
    }

    #[test]
    fn test_extends_child_ignore_wins() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write(&temp_dir, "base.yaml", "ignore:\n  - generated/\n");
        let path = write(&temp_dir, "inmake.yaml", "extends: base.yaml\nignore: []\n");

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.ignore, Some(Vec::new()));
    }

    #[test]
    fn test_extends_dir_mode() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        write(&temp_dir, "base.yaml", "dir-mode: ignore\n");

        let inherited = write(&temp_dir, "inherit.yaml", "extends: base.yaml\n");
        let config = Config::load(Some(&inherited)).unwrap();
        assert_eq!(config.dir_mode(), DirMode::Ignore);

        let overridden = write(&temp_dir, "override.yaml", "extends: base.yaml\ndir-mode: accept\n");
        let config = Config::load(Some(&overridden)).unwrap();
        assert_eq!(config.dir_mode(), DirMode::Accept);
    }

    #[test]
    fn test_extends_missing_base() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write(&temp_dir, "inmake.yaml", "extends: nowhere.yaml\n");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_extends_cycle_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write(&temp_dir, "a.yaml", "extends: b.yaml\n");
        write(&temp_dir, "b.yaml", "extends: a.yaml\n");

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Circular extends"));

        let own = write(&temp_dir, "self.yaml", "extends: ./self.yaml\n");
        assert!(Config::load(Some(&own)).is_err());
    }

    #[test]
    fn test_ignore_set() {
        let set = IgnoreSet::new(&["*.generated.c", "vendor/", "**/.git/**"]).unwrap();

        assert!(set.is_ignored(Path::new("src/foo.generated.c")));
        assert!(set.is_ignored(Path::new("foo.generated.c")));
        assert!(set.is_ignored(Path::new("vendor/lib.c")));
        assert!(set.is_ignored(Path::new("repo/.git/objects/ab.pack")));
        assert!(set.is_ignored(Path::new(".git/HEAD.c")));
        assert!(!set.is_ignored(Path::new("x.generated.cpp")));
        assert!(!set.is_ignored(Path::new("src/main.c")));
        assert!(!set.is_ignored(Path::new("src/vendor/lib.c")));
        assert!(!set.is_ignored(Path::new("src/generated_c")));
    }

    #[test]
    fn test_default_ignore_set() {
        let set = Config::default().ignore_set().unwrap();
        assert!(set.is_ignored(Path::new("target/debug/build.c")));
        assert!(set.is_ignored(Path::new("web/node_modules/pkg/index.js")));
        assert!(!set.is_ignored(Path::new("proj/a.c")));
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        assert!(IgnoreSet::new(&["[unclosed"]).is_err());
    }
}
