pub mod human;
pub mod json;

use crate::cli::OutputFormat;
use crate::runner::RunReport;

/// Trait for formatting extraction results
pub trait OutputFormatter {
    /// Format the commands of a run for stdout
    fn format_report(&self, report: &RunReport) -> String;
}

/// Get the appropriate formatter for the given format
pub fn get_formatter(format: &OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Human => Box::new(human::HumanFormatter::new()),
        OutputFormat::Json => Box::new(json::JsonFormatter::new()),
    }
}

/// Statistics about a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub total_files: usize,
    pub commands: usize,
    pub skipped: usize,
    pub failures: usize,
}

impl RunStats {
    /// Calculate statistics from a run report
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            total_files: report.commands.len() + report.skipped.len() + report.failures.len(),
            commands: report.commands.len(),
            skipped: report.skipped.len(),
            failures: report.failures.len(),
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failures > 0
    }
}
