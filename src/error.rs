use thiserror::Error;

/// Errors produced while locating and synthesizing a build command
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No build command found in {source_name}")]
    NoDirectiveFound { source_name: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Invalid variable definition `{definition}` (expected KEY=VALUE)")]
    InvalidVariable { definition: String },

    #[error("\"{pattern}\" is not a valid regex")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub fn no_directive(source_name: impl Into<String>) -> Self {
        ExtractError::NoDirectiveFound {
            source_name: source_name.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        ExtractError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Whether this error only means the input carried no build command
    pub fn is_miss(&self) -> bool {
        matches!(self, ExtractError::NoDirectiveFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
