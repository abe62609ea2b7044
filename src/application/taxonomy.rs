//! Taxonomy editing use cases
//!
//! Loads the workspace library into a [`TagManager`], applies one edit
//! through the manager and writes the library back.

use crate::application::tag_manager::{normalize_color, TagManager, TagManagerEvent, TagManagerEventKind};
use crate::domain::property::{PropertyDefinition, SystemPropertyName};
use crate::domain::tags::{TagDefinition, TagLibrary, TagsetDefinition};
use crate::domain::version::Version;
use crate::error::{Result, TagweaveError};
use crate::infrastructure::{generate_id, Config, FileSystemRepository, TaxonomyRepository, WORKSPACE_LIBRARY_ID};
use tracing::debug;

/// One line of a tagset tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub depth: usize,
    pub path: String,
    pub definition: TagDefinition,
}

/// Options for a new tag definition
#[derive(Debug, Clone, Default)]
pub struct NewTag<'a> {
    pub name: &'a str,
    /// Uuid or name of the parent, none for a top level tag
    pub parent: Option<&'a str>,
    pub tag_type: Option<&'a str>,
    pub color: Option<&'a str>,
}

pub struct TaxonomyService {
    repository: FileSystemRepository,
    config: Config,
    manager: TagManager,
}

impl TaxonomyService {
    /// Load the workspace library and register it with a fresh manager
    pub fn open(repository: FileSystemRepository) -> Result<Self> {
        let config = repository.load_config()?;
        let library = repository.load_library()?;

        let mut manager = TagManager::new();
        manager.add_tag_library(library);
        for kind in [
            TagManagerEventKind::TagsetAdded,
            TagManagerEventKind::TagsetNameChanged,
            TagManagerEventKind::TagsetChanged,
            TagManagerEventKind::TagsetRemoved,
            TagManagerEventKind::TagDefinitionChanged,
        ] {
            manager.subscribe(kind, log_event);
        }

        Ok(TaxonomyService {
            repository,
            config,
            manager,
        })
    }

    pub fn repository(&self) -> &FileSystemRepository {
        &self.repository
    }

    pub fn manager_mut(&mut self) -> &mut TagManager {
        &mut self.manager
    }

    pub fn library(&self) -> Result<&TagLibrary> {
        self.manager
            .tag_library(WORKSPACE_LIBRARY_ID)
            .ok_or_else(|| TagweaveError::UnknownTagLibrary(WORKSPACE_LIBRARY_ID.to_string()))
    }

    /// Write the library back to the repository
    pub fn save(&self) -> Result<()> {
        self.repository.save_library(self.library()?)
    }

    /// All tagsets ordered by name
    pub fn tagsets(&self) -> Result<Vec<&TagsetDefinition>> {
        let mut tagsets: Vec<_> = self.library()?.iter().collect();
        tagsets.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.uuid().cmp(b.uuid())));
        Ok(tagsets)
    }

    /// Find a tagset by uuid or by name
    pub fn tagset(&self, key: &str) -> Result<&TagsetDefinition> {
        self.library()?
            .find_tagset_definition(key)
            .ok_or_else(|| TagweaveError::UnknownTagset(key.to_string()))
    }

    pub fn create_tagset(&mut self, name: &str) -> Result<TagsetDefinition> {
        let name = non_empty(name, "Tagset name")?;
        if self.library()?.iter().any(|tagset| tagset.name() == name) {
            return Err(TagweaveError::Config(format!(
                "A tagset named '{}' already exists",
                name
            )));
        }

        let tagset = TagsetDefinition::new(None, generate_id(), name, Version::new());
        self.manager
            .add_tagset_definition(WORKSPACE_LIBRARY_ID, tagset.clone())?;
        self.save()?;
        Ok(tagset)
    }

    pub fn rename_tagset(&mut self, key: &str, name: &str) -> Result<TagsetDefinition> {
        let name = non_empty(name, "Tagset name")?;
        let uuid = self.tagset(key)?.uuid().to_string();
        self.manager
            .set_tagset_definition_name(WORKSPACE_LIBRARY_ID, &uuid, name)?;
        self.save()?;
        Ok(self.tagset(&uuid)?.clone())
    }

    pub fn remove_tagset(&mut self, key: &str) -> Result<TagsetDefinition> {
        let uuid = self.tagset(key)?.uuid().to_string();
        let removed = self
            .manager
            .remove_tagset_definition(WORKSPACE_LIBRARY_ID, &uuid)?;
        self.save()?;
        Ok(removed)
    }

    /// Add a tag definition, colored with the configured default unless a
    /// color is given
    pub fn add_tag(&mut self, tagset_key: &str, tag: NewTag<'_>) -> Result<TagDefinition> {
        let name = non_empty(tag.name, "Tag name")?;
        let color = normalize_color(tag.color.unwrap_or(&self.config.default_color))?;
        let tagset = self.tagset(tagset_key)?;
        let parent_uuid = match tag.parent {
            Some(parent) => resolve_tag(tagset, parent)?.uuid().to_string(),
            None => String::new(),
        };
        let tagset_uuid = tagset.uuid().to_string();

        let uuid = generate_id();
        let mut definition = TagDefinition::new(uuid.clone(), name, parent_uuid, Version::new())
            .with_color(&color)
            .with_type(tag.tag_type.unwrap_or_default());
        definition.add_system_property_definition(PropertyDefinition::new(
            format!("{}#{}", uuid, SystemPropertyName::Author),
            SystemPropertyName::Author.as_str(),
            vec![self.config.author.clone()],
        ));

        self.manager
            .add_tag_definition(WORKSPACE_LIBRARY_ID, &tagset_uuid, definition)?;
        self.save()?;
        self.tagset(&tagset_uuid)?
            .tag_definition(&uuid)
            .cloned()
            .ok_or(TagweaveError::UnknownTagDefinition(uuid))
    }

    /// Remove a tag and its descendants, returning everything removed
    pub fn remove_tag(&mut self, tagset_key: &str, tag_key: &str) -> Result<Vec<TagDefinition>> {
        let tagset = self.tagset(tagset_key)?;
        let tag_uuid = resolve_tag(tagset, tag_key)?.uuid().to_string();
        let tagset_uuid = tagset.uuid().to_string();

        let removed = self
            .manager
            .remove_tag_definition(WORKSPACE_LIBRARY_ID, &tagset_uuid, &tag_uuid)?;
        self.save()?;
        Ok(removed)
    }

    /// Returns false if the tag already had that color
    pub fn set_color(&mut self, tagset_key: &str, tag_key: &str, color: &str) -> Result<bool> {
        let tagset = self.tagset(tagset_key)?;
        let definition = resolve_tag(tagset, tag_key)?;
        let (tag_uuid, tag_type) = (definition.uuid().to_string(), definition.tag_type().to_string());
        let tagset_uuid = tagset.uuid().to_string();

        let changed = self.manager.set_tag_definition_type_and_color(
            WORKSPACE_LIBRARY_ID,
            &tagset_uuid,
            &tag_uuid,
            &tag_type,
            color,
        )?;
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    /// Tags of a tagset in pre-order, siblings ordered by name
    pub fn tree(&self, tagset_key: &str) -> Result<Vec<TreeEntry>> {
        let tagset = self.tagset(tagset_key)?;
        let mut entries = Vec::with_capacity(tagset.len());
        collect_tree(tagset, "", 0, &mut entries)?;
        Ok(entries)
    }
}

fn collect_tree(
    tagset: &TagsetDefinition,
    parent_uuid: &str,
    depth: usize,
    entries: &mut Vec<TreeEntry>,
) -> Result<()> {
    let mut children = tagset.direct_children(parent_uuid);
    children.sort_by(|a, b| a.name().cmp(b.name()));

    for child in children {
        entries.push(TreeEntry {
            depth,
            path: tagset.tag_path(child)?,
            definition: child.clone(),
        });
        collect_tree(tagset, child.uuid(), depth + 1, entries)?;
    }
    Ok(())
}

/// Find a tag by uuid, then by a unique name
fn resolve_tag<'a>(tagset: &'a TagsetDefinition, key: &str) -> Result<&'a TagDefinition> {
    if let Some(definition) = tagset.tag_definition(key) {
        return Ok(definition);
    }

    let mut matches = tagset.iter().filter(|definition| definition.name() == key);
    match (matches.next(), matches.next()) {
        (Some(definition), None) => Ok(definition),
        (Some(_), Some(_)) => Err(TagweaveError::Config(format!(
            "Tag name '{}' is ambiguous in tagset '{}'. Use the tag uuid instead.",
            key,
            tagset.name()
        ))),
        _ => Err(TagweaveError::UnknownTagDefinition(key.to_string())),
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TagweaveError::Config(format!("{} cannot be empty", what)));
    }
    Ok(value)
}

fn log_event(event: &TagManagerEvent) {
    match event.tagset() {
        Some(tagset) => debug!("{:?} on {}", event.kind, tagset),
        None => debug!("{:?}", event.kind),
    }
}
