//! Document loading and file discovery.
//!
//! The engine only needs `load` and `list_files`; everything format-specific
//! lives here.

use crate::config::DiscoveryConfig;
use crate::error::CqlError;
use crate::value::Value;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Parse document text into a value tree
    pub fn parse(&self, content: &str) -> Result<Value, String> {
        match self {
            Self::Json => serde_json::from_str::<serde_json::Value>(content)
                .map(Value::from)
                .map_err(|e| e.to_string()),
            Self::Toml => toml::from_str::<toml::Table>(content)
                .map(|table| Value::from(toml::Value::Table(table)))
                .map_err(|e| e.to_string()),
        }
    }
}

/// Load a document into a value tree
pub fn load(path: &Path) -> crate::Result<Value> {
    let load_error = |message: String| CqlError::Load {
        path: path.to_path_buf(),
        message,
    };

    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| load_error("unsupported document format".to_string()))?;
    let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    format.parse(&content).map_err(load_error)
}

/// Walk `directory` for documents with a configured extension, respecting
/// .gitignore and the configured ignore patterns. Paths are returned sorted.
pub fn list_files(directory: &Path, discovery: &DiscoveryConfig) -> crate::Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(CqlError::DirectoryNotFound(directory.to_path_buf()));
    }

    let mut builder = WalkBuilder::new(directory);
    builder.hidden(false);
    builder.git_ignore(discovery.respect_gitignore);
    builder.git_global(discovery.respect_gitignore);
    builder.git_exclude(discovery.respect_gitignore);

    // Build glob matcher for inclusion
    let mut include_builder = globset::GlobSetBuilder::new();
    for extension in &discovery.extensions {
        include_builder.add(
            globset::Glob::new(&format!("**/*.{}", extension))
                .map_err(|e| CqlError::GlobPattern(e.to_string()))?,
        );
    }
    let include_set = include_builder
        .build()
        .map_err(|e| CqlError::GlobPattern(e.to_string()))?;

    // Build glob matcher for custom ignore patterns
    let mut ignore_builder = globset::GlobSetBuilder::new();
    for pattern in &discovery.ignore {
        let glob_pattern = if pattern.contains('*') || pattern.contains('?') {
            pattern.clone()
        } else {
            format!("**/{}", pattern)
        };
        if let Ok(g) = globset::Glob::new(&glob_pattern) {
            ignore_builder.add(g);
        }
        if let Ok(g) = globset::Glob::new(&format!("**/{}/**", pattern)) {
            ignore_builder.add(g);
        }
    }
    let ignore_set = ignore_builder
        .build()
        .map_err(|e| CqlError::GlobPattern(e.to_string()))?;

    let mut files = Vec::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();

        if path.is_dir() {
            continue;
        }

        let relative = path.strip_prefix(directory).unwrap_or(path);

        if ignore_set.is_match(relative) {
            continue;
        }

        if include_set.is_match(relative) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
