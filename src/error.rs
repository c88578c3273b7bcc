use std::path::PathBuf;

use thiserror::Error;

/// A specialized Result type for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Errors surfaced by the checkers and their data sources.
///
/// Unresolvable class names are not an error; they are reported through
/// [`crate::source::ClassLookup::NotAClass`] and skipped by the caller.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("no composer manifest found for module \"{module}\"")]
    ManifestNotFound { module: String },

    #[error("unknown module \"{0}\"")]
    UnknownModule(String),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid version constraint \"{constraint}\": {reason}")]
    Constraint { constraint: String, reason: String },

    #[error("failed to parse version \"{version}\"")]
    Version {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("failed to detect PHP version: {0}")]
    PhpDetect(String),
}

impl AuditError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn manifest_parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::ManifestParse {
            path: path.into(),
            source,
        }
    }

    pub fn constraint(constraint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Constraint {
            constraint: constraint.into(),
            reason: reason.into(),
        }
    }
}
