//! Configuration for cql

use crate::CqlError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up in the queried directory when no config is given
pub const CONFIG_FILE_NAME: &str = ".cql.toml";

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# CQL Configuration

[discovery]
# Document extensions that are loaded and queried
extensions = ["json", "toml"]
# Honor .gitignore files while walking the directory
respect_gitignore = true
# Additional patterns to skip (beyond .gitignore)
ignore = [
    ".git",
    "target",
    "node_modules",
    ".cql.toml",
]

[execution]
# Evaluate files on a worker pool; output order is unchanged
parallel = false

[output]
# Column widths of the result table
file_width = 30
field_width = 20
"#;

/// Ambient settings for a query run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_respect_gitignore")]
    pub respect_gitignore: bool,
    #[serde(default = "default_ignore_patterns")]
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_file_width")]
    pub file_width: usize,
    #[serde(default = "default_field_width")]
    pub field_width: usize,
}

// Default value functions
fn default_extensions() -> Vec<String> {
    vec!["json".to_string(), "toml".to_string()]
}
fn default_respect_gitignore() -> bool {
    true
}
fn default_ignore_patterns() -> Vec<String> {
    vec![
        ".git".to_string(),
        "target".to_string(),
        "node_modules".to_string(),
        CONFIG_FILE_NAME.to_string(),
    ]
}
fn default_file_width() -> usize {
    30
}
fn default_field_width() -> usize {
    20
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            respect_gitignore: default_respect_gitignore(),
            ignore: default_ignore_patterns(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_width: default_file_width(),
            field_width: default_field_width(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| CqlError::ConfigParse(e.to_string()))
    }

    /// Settings for `directory`: its `.cql.toml` when present, else defaults
    pub fn discover(directory: &Path) -> crate::Result<Self> {
        let candidate = directory.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading settings");
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the default config into `directory`
    pub fn init(directory: &Path) -> crate::Result<std::path::PathBuf> {
        let path = directory.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Err(CqlError::ConfigExists(path));
        }
        std::fs::write(&path, DEFAULT_CONFIG)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let settings = Settings::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(settings.discovery.extensions, vec!["json", "toml"]);
        assert!(settings.discovery.respect_gitignore);
        assert!(!settings.execution.parallel);
        assert_eq!(settings.output.file_width, 30);
        assert_eq!(settings.output.field_width, 20);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let settings = Settings::from_toml("[execution]\nparallel = true\n").unwrap();
        assert!(settings.execution.parallel);
        assert_eq!(settings.output.field_width, 20);
        assert!(settings.discovery.ignore.contains(&".git".to_string()));
    }

    #[test]
    fn test_invalid_config_is_parse_error() {
        let err = Settings::from_toml("[output]\nfile_width = \"wide\"\n").unwrap_err();
        assert!(matches!(err, CqlError::ConfigParse(_)));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = Settings::init(dir.path()).unwrap();
        assert!(path.is_file());
        assert!(matches!(
            Settings::init(dir.path()),
            Err(CqlError::ConfigExists(_))
        ));
        let settings = Settings::discover(dir.path()).unwrap();
        assert_eq!(settings.output.file_width, 30);
    }
}
