use super::OutputFormatter;
use crate::runner::RunReport;
use std::io::IsTerminal;
use std::path::Path;

/// Plain output: the bare command for one file, `path: command` for several
#[derive(Debug, Default)]
pub struct HumanFormatter {
    use_colors: bool,
}

impl HumanFormatter {
    /// Create a new human formatter
    pub fn new() -> Self {
        Self {
            use_colors: Self::should_use_colors(),
        }
    }

    /// Create a new human formatter with explicit color setting
    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn should_use_colors() -> bool {
        std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
    }

    fn format_path(&self, path: &Path) -> String {
        if self.use_colors {
            format!("\x1b[1m{}\x1b[0m", path.display()) // Bold
        } else {
            path.display().to_string()
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_report(&self, report: &RunReport) -> String {
        match report.commands.as_slice() {
            [(_, extraction)] => extraction.command.to_string(),
            commands => commands
                .iter()
                .map(|(path, extraction)| format!("{}: {}", self.format_path(path), extraction.command))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
