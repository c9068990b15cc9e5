use crate::error::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// User-defined `{{KEY}}` replacements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, String>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable. Keys are always upper-cased.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.0.insert(key.as_ref().to_uppercase(), value.into());
    }

    /// Parse and insert a `KEY=VALUE` definition
    pub fn define(&mut self, definition: &str) -> Result<()> {
        match definition.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() && !value.is_empty() => {
                self.insert(key.trim(), value);
                Ok(())
            }
            _ => Err(ExtractError::InvalidVariable {
                definition: definition.to_string(),
            }),
        }
    }

    /// Add every variable from `other`, overriding existing keys
    pub fn extend(&mut self, other: &Variables) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Built-in variables describing the file a command came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFacts {
    pub path: String,
    pub basename: String,
    pub stem: String,
    pub extension: String,
    pub dirname: String,
    pub mode: u32,
    pub mtime: u64,
    pub ctime: u64,
    pub size: u64,
}

impl FileFacts {
    /// Gather facts about a file on disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|source| ExtractError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(path, &metadata))
    }

    pub fn new(path: &Path, metadata: &Metadata) -> Self {
        let name_of = |s: Option<&std::ffi::OsStr>| {
            s.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
        };

        Self {
            path: path.display().to_string(),
            basename: name_of(path.file_name()),
            stem: name_of(path.file_stem()),
            extension: path
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default(),
            dirname: path
                .parent()
                .map(|p| p.display().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| ".".to_string()),
            mode: file_mode(metadata),
            mtime: unix_seconds(metadata.modified().ok()),
            ctime: change_time(metadata),
            size: metadata.len(),
        }
    }

    fn pairs(&self) -> [(&'static str, String); 9] {
        [
            ("f", self.path.clone()),
            ("bn", self.basename.clone()),
            ("bn1", self.stem.clone()),
            ("ext", self.extension.clone()),
            ("dn", self.dirname.clone()),
            ("mode", self.mode.to_string()),
            ("mtime", self.mtime.to_string()),
            ("ctime", self.ctime.to_string()),
            ("size", self.size.to_string()),
        ]
    }
}

/// Expand user variables, then built-ins. Unknown names are left as they are.
pub fn expand(command: &str, variables: &Variables, facts: Option<&FileFacts>) -> String {
    let mut expanded = command.to_string();

    for (key, value) in variables.iter() {
        expanded = expanded.replace(&format!("{{{{{}}}}}", key), value);
    }

    if let Some(facts) = facts {
        for (key, value) in facts.pairs() {
            expanded = expanded.replace(&format!("{{{{{}}}}}", key), &value);
        }
    }

    expanded
}

fn unix_seconds(time: Option<SystemTime>) -> u64 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(unix)]
fn file_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

#[cfg(not(unix))]
fn file_mode(_metadata: &Metadata) -> u32 {
    0
}

#[cfg(unix)]
fn change_time(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    u64::try_from(metadata.ctime()).unwrap_or(0)
}

#[cfg(not(unix))]
fn change_time(metadata: &Metadata) -> u64 {
    unix_seconds(metadata.created().ok())
}
