use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while loading the data that drives the testing grounds.
///
/// Gameplay itself never fails: a missed trace or a missing controller only
/// suppresses the dependent effect. These errors cover the edges where the
/// runtime hands us files and names.
#[derive(Debug)]
pub enum GroundsError {
    /// Reading a config or level file failed
    Io { path: PathBuf, source: io::Error },

    /// A locomotion config file did not parse
    Config {
        path: Option<PathBuf>,
        source: toml::de::Error,
    },

    /// A level file did not parse
    Level {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },

    /// An input binding referred to an action or axis that does not exist
    UnknownBinding { name: String },

    /// Parsed data was well-formed but unusable
    Validation { item: String, reason: String },
}

impl fmt::Display for GroundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroundsError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            GroundsError::Config { path, source } => match path {
                Some(path) => write!(f, "invalid config {}: {}", path.display(), source),
                None => write!(f, "invalid config: {}", source),
            },
            GroundsError::Level { path, source } => match path {
                Some(path) => write!(f, "invalid level {}: {}", path.display(), source),
                None => write!(f, "invalid level: {}", source),
            },
            GroundsError::UnknownBinding { name } => {
                write!(f, "unknown input binding '{}'", name)
            }
            GroundsError::Validation { item, reason } => {
                write!(f, "invalid {}: {}", item, reason)
            }
        }
    }
}

impl std::error::Error for GroundsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GroundsError::Io { source, .. } => Some(source),
            GroundsError::Config { source, .. } => Some(source),
            GroundsError::Level { source, .. } => Some(source),
            GroundsError::UnknownBinding { .. } | GroundsError::Validation { .. } => None,
        }
    }
}

impl GroundsError {
    pub fn validation(item: impl Into<String>, reason: impl Into<String>) -> Self {
        GroundsError::Validation {
            item: item.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GroundsError>;
