//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/imgdrop/cli.toml`
//! - Windows: `%APPDATA%/imgdrop/cli.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use imgdrop_transfer::{DEFAULT_ALLOWED_MIME_TYPES, MIB, ValidationOptions};
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the application serving `/api/s3/*`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Largest accepted file, in bytes.
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,

    /// Files accepted per session.
    #[serde(default = "default_max_file_count")]
    pub max_file_count: usize,

    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,

    /// Whole-request timeout; unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_api_base_url() -> String {
    "http://localhost:3000".into()
}

fn default_max_file_size_bytes() -> u64 {
    5 * MIB
}

fn default_max_file_count() -> usize {
    5
}

fn default_allowed_mime_types() -> Vec<String> {
    DEFAULT_ALLOWED_MIME_TYPES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            max_file_size_bytes: default_max_file_size_bytes(),
            max_file_count: default_max_file_count(),
            allowed_mime_types: default_allowed_mime_types(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Loads configuration from `path` (or the platform default), creating
    /// a default file if none exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Limits handed to the validator.
    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            max_file_size_bytes: self.max_file_size_bytes,
            max_file_count: self.max_file_count,
            allowed_mime_types: self.allowed_mime_types.clone(),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("imgdrop")
            .join("cli.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("imgdrop").join("cli.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/imgdrop/cli.toml"))
    }
}
