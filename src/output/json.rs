use super::{OutputFormatter, RunStats};
use crate::extractor::Extraction;
use crate::runner::RunReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// JSON output formatter
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }
}

/// JSON representation of a run
#[derive(Debug, Serialize, Deserialize)]
struct JsonOutput {
    stats: JsonStats,
    files: Vec<JsonCommand>,
    skipped: Vec<String>,
    failures: Vec<JsonFailure>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonStats {
    total_files: usize,
    commands: usize,
    skipped: usize,
    failures: usize,
}

impl From<&RunStats> for JsonStats {
    fn from(stats: &RunStats) -> Self {
        Self {
            total_files: stats.total_files,
            commands: stats.commands,
            skipped: stats.skipped,
            failures: stats.failures,
        }
    }
}

/// A command found in a file
#[derive(Debug, Serialize, Deserialize)]
struct JsonCommand {
    path: String,
    /// Line of the directive (1-based)
    line: usize,
    directive: String,
    command: String,
}

impl From<&(PathBuf, Extraction)> for JsonCommand {
    fn from((path, extraction): &(PathBuf, Extraction)) -> Self {
        Self {
            path: path.display().to_string(),
            line: extraction.directive.line(),
            directive: extraction.directive.text().to_string(),
            command: extraction.command.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonFailure {
    path: String,
    error: String,
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &RunReport) -> String {
        let stats = RunStats::from_report(report);

        let json_output = JsonOutput {
            stats: JsonStats::from(&stats),
            files: report.commands.iter().map(JsonCommand::from).collect(),
            skipped: report.skipped.iter().map(|p| p.display().to_string()).collect(),
            failures: report
                .failures
                .iter()
                .map(|(path, error)| JsonFailure {
                    path: path.display().to_string(),
                    error: error.to_string(),
                })
                .collect(),
        };

        serde_json::to_string_pretty(&json_output)
            .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize JSON: {e}"}}"#))
    }
}
