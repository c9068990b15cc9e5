use serde::Serialize;
use std::fmt;

/// A rewrite applied to a directive's text while synthesizing the command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionRule {
    /// Replace every occurrence of the placeholder with a value
    Replace { placeholder: char, value: String },
    /// Delete every occurrence of the placeholder
    Strip { placeholder: char },
    /// Use the given text as the command verbatim
    Marker(String),
}

impl SubstitutionRule {
    /// Build the placeholder rule selected on the command line
    pub fn placeholder(placeholder: char, value: Option<String>, strip_matched: bool) -> Option<Self> {
        if strip_matched {
            Some(SubstitutionRule::Strip { placeholder })
        } else {
            value.map(|value| SubstitutionRule::Replace { placeholder, value })
        }
    }

    /// Apply this rule to a piece of command text
    pub fn apply(&self, text: &str) -> String {
        match self {
            SubstitutionRule::Replace { placeholder, value } => text.replace(*placeholder, value),
            SubstitutionRule::Strip { placeholder } => strip_placeholder(text, *placeholder),
            SubstitutionRule::Marker(literal) => literal.clone(),
        }
    }
}

impl fmt::Display for SubstitutionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubstitutionRule::Replace { placeholder, value } => {
                write!(f, "replace '{}' with \"{}\"", placeholder, value)
            }
            SubstitutionRule::Strip { placeholder } => write!(f, "strip '{}'", placeholder),
            SubstitutionRule::Marker(literal) => write!(f, "marker \"{}\"", literal),
        }
    }
}

/// Remove a placeholder character. Tokens made up only of placeholders are
/// dropped together with the whitespace in front of them.
fn strip_placeholder(text: &str, placeholder: char) -> String {
    if !text.contains(placeholder) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut dropped_leading = false;
    let mut rest = text;

    while !rest.is_empty() {
        let trimmed = rest.trim_start();
        let (space, after) = rest.split_at(rest.len() - trimmed.len());
        let token_len = after.find(char::is_whitespace).unwrap_or(after.len());
        let (token, tail) = after.split_at(token_len);

        let kept: String = token.chars().filter(|c| *c != placeholder).collect();
        if !kept.is_empty() || token.is_empty() {
            if !(out.is_empty() && dropped_leading) {
                out.push_str(space);
            }
            out.push_str(&kept);
        } else if out.is_empty() {
            dropped_leading = true;
        }

        rest = tail;
    }

    out
}

/// The final shell command synthesized from a directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandLine(String);

impl CommandLine {
    pub fn new(command: impl Into<String>) -> Self {
        Self(command.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CommandLine {
    fn from(command: String) -> Self {
        Self(command)
    }
}

/// Apply rules to a text in declared order
pub fn apply_rules(text: &str, rules: &[SubstitutionRule]) -> CommandLine {
    let command = rules
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc));
    CommandLine(command)
}
