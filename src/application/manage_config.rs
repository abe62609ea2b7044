//! Config management use case

use crate::application::tag_manager::normalize_color;
use crate::error::{Result, TagweaveError};
use crate::infrastructure::{Config, FileSystemRepository, TaxonomyRepository};

/// Service for managing workspace configuration
pub struct ConfigService {
    repository: FileSystemRepository,
}

impl ConfigService {
    /// Create a new config service
    pub fn new(repository: FileSystemRepository) -> Self {
        ConfigService { repository }
    }

    /// Get a single config value
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.repository.load_config()?;

        match key {
            "author" => Ok(config.author.clone()),
            "default_color" => Ok(config.default_color.clone()),
            "created" => Ok(config.created.to_rfc3339()),
            _ => Err(TagweaveError::Config(format!(
                "Unknown config key: '{}'. Valid keys are: author, default_color, created",
                key
            ))),
        }
    }

    /// Set a config value, returning the value as stored
    pub fn set(&self, key: &str, value: &str) -> Result<String> {
        let mut config = self.repository.load_config()?;

        let stored = match key {
            "author" => {
                config.author = value.trim().to_string();
                config.author.clone()
            }
            "default_color" => {
                config.default_color = normalize_color(value)?;
                config.default_color.clone()
            }
            "created" => {
                return Err(TagweaveError::Config(
                    "Cannot modify 'created' field (read-only)".to_string(),
                ));
            }
            _ => {
                return Err(TagweaveError::Config(format!(
                    "Unknown config key: '{}'. Valid keys are: author, default_color",
                    key
                )));
            }
        };

        self.repository.save_config(&config)?;
        Ok(stored)
    }

    /// List all config values
    pub fn list(&self) -> Result<Config> {
        self.repository.load_config()
    }
}
