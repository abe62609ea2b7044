//! Tag libraries: the tagsets used by one collection

use crate::domain::tags::{TagDefinition, TagsetDefinition};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregates the tagsets of one annotation collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLibrary {
    id: String,
    name: String,
    tagsets: BTreeMap<String, TagsetDefinition>,
}

impl TagLibrary {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        TagLibrary {
            id: id.into(),
            name: name.into(),
            tagsets: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.tagsets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagsetDefinition> {
        self.tagsets.values()
    }

    pub fn tagset_definition(&self, uuid: &str) -> Option<&TagsetDefinition> {
        self.tagsets.get(uuid)
    }

    pub(crate) fn tagset_definition_mut(&mut self, uuid: &str) -> Option<&mut TagsetDefinition> {
        self.tagsets.get_mut(uuid)
    }

    /// Find a tagset by uuid first, then by exact name
    pub fn find_tagset_definition(&self, key: &str) -> Option<&TagsetDefinition> {
        self.tagsets
            .get(key)
            .or_else(|| self.tagsets.values().find(|t| t.name() == key))
    }

    pub fn add(&mut self, tagset: TagsetDefinition) {
        self.tagsets.insert(tagset.uuid().to_string(), tagset);
    }

    pub fn remove(&mut self, uuid: &str) -> Option<TagsetDefinition> {
        self.tagsets.remove(uuid)
    }

    /// Swap in a newer copy of a tagset, returning the previous one
    pub fn replace(&mut self, tagset: TagsetDefinition) -> Option<TagsetDefinition> {
        self.tagsets.insert(tagset.uuid().to_string(), tagset)
    }

    /// The tagset owning the definition with the given uuid
    pub fn tagset_of(&self, tag_uuid: &str) -> Option<&TagsetDefinition> {
        self.tagsets
            .values()
            .find(|tagset| tagset.has_tag_definition(tag_uuid))
    }

    pub fn tag_definition(&self, tag_uuid: &str) -> Option<&TagDefinition> {
        self.tagset_of(tag_uuid)
            .and_then(|tagset| tagset.tag_definition(tag_uuid))
    }

    /// All descendants of a definition, in pre-order. Empty if no tagset owns it.
    pub fn children(&self, definition: &TagDefinition) -> Vec<&TagDefinition> {
        self.tagset_of(definition.uuid())
            .map(|tagset| tagset.children(definition.uuid()))
            .unwrap_or_default()
    }

    pub fn child_ids(&self, definition: &TagDefinition) -> BTreeSet<String> {
        self.tagset_of(definition.uuid())
            .map(|tagset| tagset.child_ids(definition.uuid()))
            .unwrap_or_default()
    }
}
