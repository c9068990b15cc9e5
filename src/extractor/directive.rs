use super::rules::{CommandLine, SubstitutionRule, apply_rules};
use crate::error::{ExtractError, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Matches encoding declarations such as `# -*- coding: utf-8 -*-`
static ENCODING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"coding[:=]\s*([-\w.]+)").expect("Invalid encoding regex"));

/// How the directive line is located inside a file
#[derive(Debug, Clone)]
pub enum SearchMode {
    /// Line starting with the marker, after leading whitespace
    Prefix(String),
    /// Line ending with the marker, before trailing whitespace
    Suffix(String),
    /// First line the expression matches
    Regex(Regex),
    /// Second line, or the third one when the second declares an encoding
    SecondLine,
}

impl SearchMode {
    /// Compile a regex search mode
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(SearchMode::Regex)
            .map_err(|source| ExtractError::InvalidRegex {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Short name used in logs and output
    pub fn name(&self) -> &'static str {
        match self {
            SearchMode::Prefix(_) => "prefix",
            SearchMode::Suffix(_) => "suffix",
            SearchMode::Regex(_) => "regex",
            SearchMode::SecondLine => "second-line",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            SearchMode::Prefix(marker) | SearchMode::Suffix(marker) if marker.is_empty() => Err(
                ExtractError::invalid_config(format!("{} marker must not be empty", self.name())),
            ),
            _ => Ok(()),
        }
    }
}

/// A matched directive line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    line: usize,
    text: String,
}

impl Directive {
    /// Line number of the directive (1-based)
    pub fn line(&self) -> usize {
        self.line
    }

    /// Raw command text with the marker removed
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Result of a successful extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub directive: Directive,
    pub command: CommandLine,
}

/// Finds the build command directive in a file and synthesizes the command
#[derive(Debug, Clone)]
pub struct DirectiveExtractor {
    mode: SearchMode,
    rules: Vec<SubstitutionRule>,
    strip_matched: bool,
}

impl DirectiveExtractor {
    /// Create an extractor for the given search mode
    pub fn new(mode: SearchMode) -> Result<Self> {
        mode.validate()?;
        Ok(Self {
            mode,
            rules: Vec::new(),
            strip_matched: false,
        })
    }

    /// Create a prefix extractor
    pub fn prefix(marker: impl Into<String>) -> Result<Self> {
        Self::new(SearchMode::Prefix(marker.into()))
    }

    /// Set the substitution rules, applied in the given order
    pub fn with_rules(mut self, rules: Vec<SubstitutionRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Remove everything a regex search matched from the command
    pub fn with_strip_matched(mut self, strip_matched: bool) -> Self {
        self.strip_matched = strip_matched;
        self
    }

    pub fn mode(&self) -> &SearchMode {
        &self.mode
    }

    pub fn rules(&self) -> &[SubstitutionRule] {
        &self.rules
    }

    /// Locate the directive. The first matching line wins.
    pub fn locate<S: AsRef<str>>(&self, lines: &[S]) -> Option<Directive> {
        match &self.mode {
            SearchMode::Prefix(marker) => first_match(lines, |line| {
                line.trim_start()
                    .strip_prefix(marker.as_str())
                    .map(|rest| rest.trim().to_string())
            }),
            SearchMode::Suffix(marker) => first_match(lines, |line| {
                line.trim_end()
                    .strip_suffix(marker.as_str())
                    .and_then(after_leading_token)
                    .map(str::to_string)
            }),
            SearchMode::Regex(re) => first_match(lines, |line| {
                re.is_match(line)
                    .then_some(line)
                    .and_then(after_leading_token)
                    .map(str::to_string)
            }),
            SearchMode::SecondLine => second_line(lines),
        }
    }

    /// Turn a directive into the final command line
    pub fn synthesize(&self, directive: &Directive) -> CommandLine {
        match &self.mode {
            SearchMode::Regex(re) if self.strip_matched => {
                let stripped = re.replace_all(directive.text(), "");
                apply_rules(stripped.trim(), &self.rules)
            }
            _ => apply_rules(directive.text(), &self.rules),
        }
    }

    /// Locate the directive in `lines` and synthesize its command
    pub fn extract<S: AsRef<str>>(&self, source_name: &str, lines: &[S]) -> Result<Extraction> {
        let directive = self
            .locate(lines)
            .ok_or_else(|| ExtractError::no_directive(source_name))?;
        let command = self.synthesize(&directive);
        Ok(Extraction { directive, command })
    }
}

/// Extract the command from the first line starting with `marker_prefix`
pub fn extract<S: AsRef<str>>(
    lines: &[S],
    marker_prefix: &str,
    rules: &[SubstitutionRule],
) -> Result<CommandLine> {
    let extractor = DirectiveExtractor::prefix(marker_prefix)?.with_rules(rules.to_vec());
    Ok(extractor.extract("input", lines)?.command)
}

fn first_match<S, F>(lines: &[S], matcher: F) -> Option<Directive>
where
    S: AsRef<str>,
    F: Fn(&str) -> Option<String>,
{
    lines.iter().enumerate().find_map(|(index, line)| {
        matcher(line.as_ref()).map(|text| Directive {
            line: index + 1,
            text,
        })
    })
}

fn second_line<S: AsRef<str>>(lines: &[S]) -> Option<Directive> {
    let mut index = 1;
    let mut line = lines.get(index)?.as_ref();
    if ENCODING_LINE.is_match(line) {
        index += 1;
        line = lines.get(index)?.as_ref();
    }

    after_leading_token(line).map(|text| Directive {
        line: index + 1,
        text: text.to_string(),
    })
}

/// Cut the comment leader (text up to the first whitespace) off a line.
/// `None` when nothing is left after it.
fn after_leading_token(line: &str) -> Option<&str> {
    let line = line.trim_start();
    line.find(char::is_whitespace)
        .map(|pos| line[pos..].trim())
        .filter(|rest| !rest.is_empty())
}
