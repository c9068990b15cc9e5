use crate::config::{Config, DirMode};
use crate::error::{self, ExtractError};
use crate::extractor::{CommandLine, DirectiveExtractor, Extraction};
use crate::variables::{self, FileFacts};
use eyre::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A file queued for extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    /// Named on the command line rather than found by walking a directory
    pub explicit: bool,
}

/// Extraction outcome for one file
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub explicit: bool,
    pub result: error::Result<Extraction>,
}

/// Outcomes of a run, split by how they should be reported
#[derive(Debug, Default)]
pub struct RunReport {
    /// Files with a build command
    pub commands: Vec<(PathBuf, Extraction)>,
    /// Files without a build command that are not treated as errors
    pub skipped: Vec<PathBuf>,
    /// Files that failed, including misses on named files
    pub failures: Vec<(PathBuf, ExtractError)>,
}

impl RunReport {
    /// Classify outcomes. Misses on walked files are always skipped.
    pub fn from_outcomes(outcomes: Vec<FileOutcome>, ignore_nonmatched: bool) -> Self {
        let mut report = Self::default();

        for outcome in outcomes {
            match outcome.result {
                Ok(extraction) => report.commands.push((outcome.path, extraction)),
                Err(e) if e.is_miss() && (ignore_nonmatched || !outcome.explicit) => {
                    debug!(path = %outcome.path.display(), "no build command, skipping");
                    report.skipped.push(outcome.path);
                }
                Err(e) => report.failures.push((outcome.path, e)),
            }
        }

        report
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the extractor over a set of files
pub struct Runner {
    extractor: DirectiveExtractor,
    config: Config,
}

impl Runner {
    /// Create a new runner with the given extractor and configuration
    pub fn new(extractor: DirectiveExtractor, config: Config) -> Self {
        Self { extractor, config }
    }

    /// Extract the build command from a single file
    pub fn process_file<P: AsRef<Path>>(&self, file_path: P) -> error::Result<Extraction> {
        let file_path = file_path.as_ref();
        debug!(path = %file_path.display(), mode = self.extractor.mode().name(), "scanning");

        let content = std::fs::read_to_string(file_path).map_err(|source| ExtractError::Io {
            path: file_path.display().to_string(),
            source,
        })?;

        let facts = if self.config.no_vars {
            None
        } else {
            Some(FileFacts::from_path(file_path)?)
        };

        self.process_content(file_path, &content, facts.as_ref())
    }

    /// Extract the build command from in-memory content
    pub fn process_content<P: AsRef<Path>>(
        &self,
        file_path: P,
        content: &str,
        facts: Option<&FileFacts>,
    ) -> error::Result<Extraction> {
        let file_path = file_path.as_ref();
        let lines: Vec<&str> = content.lines().collect();
        let mut extraction = self
            .extractor
            .extract(&file_path.display().to_string(), &lines)?;

        if !self.config.no_vars {
            let expanded = variables::expand(extraction.command.as_str(), &self.config.variables, facts);
            extraction.command = CommandLine::from(expanded);
        }

        debug!(
            path = %file_path.display(),
            line = extraction.directive.line(),
            command = %extraction.command,
            "found build command"
        );
        Ok(extraction)
    }

    /// Resolve files and directories into the list of files to scan
    pub fn collect_inputs<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<InputFile>> {
        let mut inputs = Vec::new();
        let ignore = self.config.ignore_set()?;

        for path in paths {
            let path = path.as_ref();

            if path.is_file() {
                inputs.push(InputFile {
                    path: path.to_path_buf(),
                    explicit: true,
                });
            } else if path.is_dir() {
                if self.config.dir_mode() == DirMode::Ignore {
                    warn!(path = %path.display(), "skipping directory");
                    continue;
                }

                for entry in WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                {
                    let file_path = entry.path();
                    let relative = file_path.strip_prefix(path).unwrap_or(file_path);

                    // only files with an extension are candidates
                    if file_path.extension().is_none() || ignore.is_ignored(relative) {
                        continue;
                    }

                    inputs.push(InputFile {
                        path: file_path.to_path_buf(),
                        explicit: false,
                    });
                }
            } else {
                return Err(eyre::eyre!("Path does not exist: {}", path.display()));
            }
        }

        Ok(inputs)
    }

    /// Extract commands from every input, in parallel, keeping input order
    pub fn run<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<FileOutcome>> {
        let inputs = self.collect_inputs(paths)?;

        Ok(inputs
            .into_par_iter()
            .map(|input| {
                let result = self.process_file(&input.path);
                FileOutcome {
                    path: input.path,
                    explicit: input.explicit,
                    result,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{SearchMode, SubstitutionRule};
    use std::fs;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let file_path = dir.join(name);
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn prefix_runner(config: Config) -> Runner {
        Runner::new(DirectiveExtractor::prefix("//#").unwrap(), config)
    }

    #[test]
    fn test_process_file_expands_builtins() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = create_test_file(temp_dir.path(), "hello.c", "//# gcc -o {{bn1}} {{bn}}\nint main() {}\n");

        let extraction = prefix_runner(Config::default()).process_file(&file_path).unwrap();
        assert_eq!(extraction.directive.line(), 1);
        assert_eq!(extraction.command.as_str(), "gcc -o hello hello.c");
    }

    #[test]
    fn test_process_file_with_user_variables() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = create_test_file(temp_dir.path(), "hello.c", "//# {{CC}} -c {{bn}}\n");

        let mut config = Config::default();
        config.variables.insert("cc", "clang");

        let extraction = prefix_runner(config).process_file(&file_path).unwrap();
        assert_eq!(extraction.command.as_str(), "clang -c hello.c");
    }

    #[test]
    fn test_process_file_no_vars() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = create_test_file(temp_dir.path(), "hello.c", "//# {{CC}} -c {{bn}}\n");

        let mut config = Config::default();
        config.variables.insert("CC", "clang");
        config.no_vars = true;

        let extraction = prefix_runner(config).process_file(&file_path).unwrap();
        assert_eq!(extraction.command.as_str(), "{{CC}} -c {{bn}}");
    }

    #[test]
    fn test_process_file_missing_directive() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = create_test_file(temp_dir.path(), "plain.c", "int main() {}\n");

        let result = prefix_runner(Config::default()).process_file(&file_path);
        assert!(result.unwrap_err().is_miss());
    }

    #[test]
    fn test_process_file_unreadable() {
        let result = prefix_runner(Config::default()).process_file("/definitely/not/here.c");
        assert!(matches!(result, Err(ExtractError::Io { .. })));
    }

    #[test]
    fn test_process_content_applies_rules() {
        let extractor = DirectiveExtractor::new(SearchMode::Prefix("//asdf".to_string()))
            .unwrap()
            .with_rules(vec![SubstitutionRule::Strip { placeholder: 'Z' }]);
        let runner = Runner::new(extractor, Config::default());

        let content = include_str!("../tests/fixtures/placeholder.c");
        let extraction = runner.process_content("placeholder.c", content, None).unwrap();
        assert_eq!(extraction.command.as_str(), "gcc -o test test.c -DAWESOME=1");
    }

    #[test]
    fn test_collect_inputs_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        create_test_file(temp_dir.path(), "b.c", "//# cc b.c");
        create_test_file(temp_dir.path(), "a.c", "//# cc a.c");
        create_test_file(temp_dir.path(), "Makefile", "all:");
        fs::create_dir(temp_dir.path().join("target")).unwrap();
        create_test_file(&temp_dir.path().join("target"), "out.c", "//# cc out.c");

        let runner = prefix_runner(Config::default());
        let inputs = runner.collect_inputs(&[temp_dir.path()]).unwrap();

        let names: Vec<String> = inputs
            .iter()
            .map(|input| input.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.c", "b.c"]);
        assert!(inputs.iter().all(|input| !input.explicit));
    }

    #[test]
    fn test_collect_inputs_walk_root_inside_ignored_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("target").join("proj");
        fs::create_dir_all(&root).unwrap();
        create_test_file(&root, "a.c", "//# cc a.c");

        let inputs = prefix_runner(Config::default()).collect_inputs(&[&root]).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].path, root.join("a.c"));
    }

    #[test]
    fn test_collect_inputs_ignore_patterns() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        create_test_file(temp_dir.path(), "x.generated.c", "//# cc x.generated.c");
        create_test_file(temp_dir.path(), "x.generated.cpp", "//# c++ x.generated.cpp");
        fs::create_dir(temp_dir.path().join("vendor")).unwrap();
        create_test_file(&temp_dir.path().join("vendor"), "lib.c", "//# cc lib.c");

        let config = Config {
            ignore: Some(vec!["*.generated.c".to_string(), "vendor/".to_string()]),
            ..Config::default()
        };
        let inputs = prefix_runner(config).collect_inputs(&[temp_dir.path()]).unwrap();

        let names: Vec<String> = inputs
            .iter()
            .map(|input| input.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["x.generated.cpp"]);
    }

    #[test]
    fn test_collect_inputs_ignore_dirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        create_test_file(temp_dir.path(), "a.c", "//# cc a.c");

        let config = Config {
            dir_mode: Some(DirMode::Ignore),
            ..Config::default()
        };
        let inputs = prefix_runner(config).collect_inputs(&[temp_dir.path()]).unwrap();
        assert!(inputs.is_empty());
    }

    #[test]
    fn test_collect_inputs_missing_path() {
        let runner = prefix_runner(Config::default());
        assert!(runner.collect_inputs(&[Path::new("/definitely/not/here")]).is_err());
    }

    #[test]
    fn test_run_keeps_order_and_classifies() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let found = create_test_file(temp_dir.path(), "found.c", "//# cc found.c");
        let missed = create_test_file(temp_dir.path(), "missed.c", "int x;");
        let walked = temp_dir.path().join("walked");
        fs::create_dir(&walked).unwrap();
        create_test_file(&walked, "quiet.c", "int y;");

        let runner = prefix_runner(Config::default());
        let outcomes = runner.run(&[found.clone(), missed.clone(), walked]).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].path, found);
        assert_eq!(outcomes[1].path, missed);

        let report = RunReport::from_outcomes(outcomes, false);
        assert_eq!(report.commands.len(), 1);
        assert_eq!(report.commands[0].1.command.as_str(), "cc found.c");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, missed);
        assert!(!report.is_success());
    }

    #[test]
    fn test_report_ignore_nonmatched() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let missed = create_test_file(temp_dir.path(), "missed.c", "int x;");

        let runner = prefix_runner(Config::default());
        let outcomes = runner.run(&[missed]).unwrap();
        let report = RunReport::from_outcomes(outcomes, true);
        assert!(report.is_success());
        assert_eq!(report.skipped.len(), 1);
    }
}
