//! Exchange and synchronization of tagsets with TOML files

use crate::application::taxonomy::TaxonomyService;
use crate::domain::tags::{SyncOutcome, TagsetDefinition};
use crate::error::{Result, TagweaveError};
use crate::infrastructure::{FileSystemRepository, WORKSPACE_LIBRARY_ID};
use std::path::Path;
use tracing::info;

/// Result of comparing a stored tagset with an incoming copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub tagset_name: String,
    pub incoming_name: String,
    pub in_sync: bool,
    /// What a sync would change, or did change
    pub outcome: SyncOutcome,
    pub applied: bool,
}

pub struct SyncService {
    taxonomy: TaxonomyService,
}

impl SyncService {
    pub fn new(taxonomy: TaxonomyService) -> Self {
        SyncService { taxonomy }
    }

    pub fn open(repository: FileSystemRepository) -> Result<Self> {
        Ok(Self::new(TaxonomyService::open(repository)?))
    }

    /// Compare the stored tagset with the copy in `file` without changing anything
    pub fn status(&self, tagset_key: &str, file: &Path) -> Result<SyncReport> {
        let (local, incoming) = self.pair(tagset_key, file)?;
        let in_sync = local.is_synchronized(&incoming);
        let outcome = preview(local, &incoming)?;

        Ok(SyncReport {
            tagset_name: local.name().to_string(),
            incoming_name: incoming.name().to_string(),
            in_sync,
            outcome,
            applied: false,
        })
    }

    /// Merge the copy in `file` into the stored tagset
    pub fn sync(&mut self, tagset_key: &str, file: &Path, dry_run: bool) -> Result<SyncReport> {
        if dry_run {
            return self.status(tagset_key, file);
        }

        let (local, incoming) = self.pair(tagset_key, file)?;
        let tagset_name = local.name().to_string();
        let in_sync = local.is_synchronized(&incoming);

        let outcome = self
            .taxonomy
            .manager_mut()
            .synchronize(WORKSPACE_LIBRARY_ID, &incoming)?;
        if !outcome.is_empty() {
            self.taxonomy.save()?;
            info!("synchronized {} from {}", incoming, file.display());
        }

        Ok(SyncReport {
            tagset_name,
            incoming_name: incoming.name().to_string(),
            in_sync,
            applied: !outcome.is_empty(),
            outcome,
        })
    }

    /// Add a tagset from a file that is not yet part of the workspace
    pub fn import(&self, file: &Path) -> Result<TagsetDefinition> {
        self.taxonomy.repository().import_tagset(file)
    }

    pub fn export(&self, tagset_key: &str, file: &Path) -> Result<TagsetDefinition> {
        let uuid = self.taxonomy.tagset(tagset_key)?.uuid().to_string();
        self.taxonomy.repository().export_tagset(&uuid, file)
    }

    fn pair(&self, tagset_key: &str, file: &Path) -> Result<(&TagsetDefinition, TagsetDefinition)> {
        let local = self.taxonomy.tagset(tagset_key)?;
        let incoming = FileSystemRepository::read_tagset_file(file)?;
        if local.uuid() != incoming.uuid() {
            return Err(TagweaveError::IdentityMismatch {
                local: local.uuid().to_string(),
                incoming: incoming.uuid().to_string(),
            });
        }
        Ok((local, incoming))
    }
}

fn preview(local: &TagsetDefinition, incoming: &TagsetDefinition) -> Result<SyncOutcome> {
    let mut scratch = local.clone();
    scratch.synchronize_with(incoming)
}
