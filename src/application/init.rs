//! Initialize workspace use case

use crate::error::Result;
use crate::infrastructure::{Config, FileSystemRepository, TaxonomyRepository};
use std::fs;
use std::path::Path;
use tracing::info;

pub struct InitService;

impl InitService {
    /// Initialize a new tagweave workspace at the specified path.
    pub fn execute(path: &Path) -> Result<Config> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        let repo = FileSystemRepository::new(path.to_path_buf());
        repo.initialize()?;

        let config = Config::new();
        repo.save_config(&config)?;
        info!("initialized workspace at {}", path.display());

        Ok(config)
    }
}
