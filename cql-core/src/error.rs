//! Error types for cql operations

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CqlError {
    #[error("Query parse error: {message}")]
    QueryParse { message: String },

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Failed to load {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Config already exists at {}", .0.display())]
    ConfigExists(PathBuf),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Glob pattern error: {0}")]
    GlobPattern(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CqlError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::QueryParse {
            message: message.into(),
        }
    }

    /// True for errors that only exclude a single file or candidate from the
    /// result set instead of aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound(_) | Self::Load { .. } | Self::TypeMismatch { .. }
        )
    }
}
