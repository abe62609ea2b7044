//! Configuration management

use crate::error::{Result, TagweaveError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the workspace metadata directory
pub const WORKSPACE_DIR: &str = ".tagweave";

pub const DEFAULT_COLOR: &str = "#4682b4";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Recorded as the author of new tag definitions
    pub author: String,
    /// Display color for new tag definitions without an explicit color
    #[serde(default = "default_color")]
    pub default_color: String,
    pub created: DateTime<Utc>,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Config {
            author: Self::detect_default_author(),
            default_color: default_color(),
            created: Utc::now(),
        }
    }

    /// Load config from .tagweave/config.toml in the given directory
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(WORKSPACE_DIR).join("config.toml");

        let contents = fs::read_to_string(&config_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TagweaveError::NotTagweaveDirectory(path.to_path_buf())
            } else {
                TagweaveError::Io(e)
            }
        })?;

        toml::from_str(&contents)
            .map_err(|e| TagweaveError::Config(format!("Failed to parse config.toml: {}", e)))
    }

    /// Save config to .tagweave/config.toml in the given directory
    pub fn save_to_dir(&self, path: &Path) -> Result<()> {
        let workspace_dir = path.join(WORKSPACE_DIR);
        let config_path = workspace_dir.join("config.toml");

        if !workspace_dir.exists() {
            fs::create_dir(&workspace_dir)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| TagweaveError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Author from TAGWEAVE_AUTHOR, then the login name
    fn detect_default_author() -> String {
        std::env::var("TAGWEAVE_AUTHOR")
            .or_else(|_| std::env::var("USER"))
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
