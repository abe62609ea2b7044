//! User markup collections: tag references anchored in one document

use crate::domain::tags::{SyncOutcome, TagDefinition, TagInstance, TagLibrary, TagsetDefinition};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// Half-open character range `[start, end)` inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Range { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}

/// Descriptive metadata of a document or collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInfoSet {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub publisher: String,
}

impl ContentInfoSet {
    pub fn titled(title: impl Into<String>) -> Self {
        ContentInfoSet {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A tag instance anchored at a range of a source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReference {
    tag_instance: TagInstance,
    range: Range,
    target: String,
}

impl TagReference {
    pub fn new(tag_instance: TagInstance, target: impl Into<String>, range: Range) -> Self {
        TagReference {
            tag_instance,
            range,
            target: target.into(),
        }
    }

    pub fn tag_instance(&self) -> &TagInstance {
        &self.tag_instance
    }

    pub fn tag_instance_mut(&mut self) -> &mut TagInstance {
        &mut self.tag_instance
    }

    pub fn tag_definition(&self) -> &TagDefinition {
        self.tag_instance.tag_definition()
    }

    pub fn range(&self) -> Range {
        self.range
    }

    /// Id of the source document this reference points into
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Lightweight handle to a collection, held by source documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMarkupCollectionReference {
    pub id: String,
    pub content_info_set: ContentInfoSet,
}

impl UserMarkupCollectionReference {
    pub fn new(id: impl Into<String>, content_info_set: ContentInfoSet) -> Self {
        UserMarkupCollectionReference {
            id: id.into(),
            content_info_set,
        }
    }

    pub fn name(&self) -> &str {
        &self.content_info_set.title
    }
}

/// The user's annotations of one document together with the tag library
/// they were made against
#[derive(Debug, Clone)]
pub struct UserMarkupCollection {
    id: String,
    content_info_set: ContentInfoSet,
    tag_library: TagLibrary,
    tag_references: Vec<TagReference>,
}

impl UserMarkupCollection {
    pub fn new(id: impl Into<String>, content_info_set: ContentInfoSet) -> Self {
        let id = id.into();
        let tag_library = TagLibrary::new(id.clone(), content_info_set.title.clone());
        Self::with_library(id, content_info_set, tag_library, Vec::new())
    }

    pub fn with_library(
        id: impl Into<String>,
        content_info_set: ContentInfoSet,
        tag_library: TagLibrary,
        tag_references: Vec<TagReference>,
    ) -> Self {
        UserMarkupCollection {
            id: id.into(),
            content_info_set,
            tag_library,
            tag_references,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.content_info_set.title
    }

    pub fn content_info_set(&self) -> &ContentInfoSet {
        &self.content_info_set
    }

    pub fn tag_library(&self) -> &TagLibrary {
        &self.tag_library
    }

    pub fn tag_library_mut(&mut self) -> &mut TagLibrary {
        &mut self.tag_library
    }

    pub fn is_empty(&self) -> bool {
        self.tag_references.is_empty()
    }

    pub fn reference(&self) -> UserMarkupCollectionReference {
        UserMarkupCollectionReference::new(self.id.clone(), self.content_info_set.clone())
    }

    pub fn tag_references(&self) -> &[TagReference] {
        &self.tag_references
    }

    pub fn add_tag_references(&mut self, tag_references: impl IntoIterator<Item = TagReference>) {
        self.tag_references.extend(tag_references);
    }

    /// Remove the references of one tag instance, returning how many went away
    pub fn remove_tag_instance(&mut self, instance_uuid: &str) -> usize {
        let before = self.tag_references.len();
        self.tag_references
            .retain(|tr| tr.tag_instance().uuid() != instance_uuid);
        before - self.tag_references.len()
    }

    /// Returns true if the reference was part of this collection
    pub fn remove_tag_reference(&mut self, tag_reference: &TagReference) -> bool {
        match self.tag_references.iter().position(|tr| tr == tag_reference) {
            Some(index) => {
                self.tag_references.remove(index);
                true
            }
            None => false,
        }
    }

    /// References of `definition` and, if requested, of all its descendants
    /// according to this collection's tag library
    pub fn tag_references_for(
        &self,
        definition: &TagDefinition,
        include_descendants: bool,
    ) -> Vec<&TagReference> {
        let mut tag_definition_ids = BTreeSet::new();
        tag_definition_ids.insert(definition.uuid().to_string());

        if include_descendants {
            tag_definition_ids.extend(self.tag_library.child_ids(definition));
        }

        self.tag_references
            .iter()
            .filter(|tr| tag_definition_ids.contains(tr.tag_definition().uuid()))
            .collect()
    }

    pub fn children(&self, definition: &TagDefinition) -> Vec<&TagDefinition> {
        self.tag_library.children(definition)
    }

    /// Rebind every reference to the definitions of `tagset`.
    ///
    /// References whose definition the tagset no longer has are removed after
    /// the scan. Returns the number of removed references.
    pub fn update(&mut self, tagset: &TagsetDefinition) -> usize {
        let mut to_be_removed = Vec::new();

        for (index, tr) in self.tag_references.iter_mut().enumerate() {
            let tag_uuid = tr.tag_definition().uuid();
            match tagset.tag_definition(tag_uuid) {
                Some(refreshed) => {
                    let refreshed = refreshed.clone();
                    tr.tag_instance_mut().set_tag_definition(refreshed);
                }
                None => to_be_removed.push(index),
            }
        }

        let removed = to_be_removed.len();
        if removed > 0 {
            let mut index = 0;
            self.tag_references.retain(|_| {
                let keep = to_be_removed.binary_search(&index).is_err();
                index += 1;
                keep
            });
            info!("removed {} stale tag references from {}", removed, self);
        }
        debug!("updated {} against {}", self, tagset);

        removed
    }

    /// Synchronize this collection's copy of a tagset with an incoming copy,
    /// then rebind the references. A tagset this library does not know is
    /// added as is.
    pub fn synchronize_tagset(&mut self, incoming: &TagsetDefinition) -> Result<SyncOutcome> {
        let outcome = match self.tag_library.tagset_definition_mut(incoming.uuid()) {
            Some(local) => local.synchronize_with(incoming)?,
            None => {
                self.tag_library.add(incoming.copy());
                SyncOutcome {
                    added: incoming.iter().map(|d| d.uuid().to_string()).collect(),
                    ..SyncOutcome::default()
                }
            }
        };

        if let Some(local) = self.tag_library.tagset_definition(incoming.uuid()) {
            let local = local.clone();
            self.update(&local);
        }

        Ok(outcome)
    }
}

impl fmt::Display for UserMarkupCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::version::Version;

    fn tagset() -> TagsetDefinition {
        let mut tagset = TagsetDefinition::new(None, "tset-1", "People", Version::new());
        tagset.add_tag_definition(TagDefinition::new("tag-1", "Person", "", Version::new()));
        tagset.add_tag_definition(TagDefinition::new("tag-2", "Character", "tag-1", Version::new()));
        tagset.add_tag_definition(TagDefinition::new("tag-3", "Narrator", "", Version::new()));
        tagset
    }

    fn reference(tagset: &TagsetDefinition, instance: &str, tag: &str, start: usize) -> TagReference {
        let definition = tagset.tag_definition(tag).unwrap().clone();
        TagReference::new(
            TagInstance::new(instance, definition),
            "doc-1",
            Range::new(start, start + 5),
        )
    }

    fn collection() -> UserMarkupCollection {
        let tagset = tagset();
        let mut collection = UserMarkupCollection::new("umc-1", ContentInfoSet::titled("Notes"));
        collection.add_tag_references(vec![
            reference(&tagset, "ti-1", "tag-1", 0),
            reference(&tagset, "ti-2", "tag-2", 10),
            reference(&tagset, "ti-3", "tag-3", 20),
            reference(&tagset, "ti-4", "tag-2", 30),
        ]);
        collection.tag_library_mut().add(tagset);
        collection
    }

    fn instance_ids(references: &[&TagReference]) -> Vec<String> {
        references
            .iter()
            .map(|tr| tr.tag_instance().uuid().to_string())
            .collect()
    }

    #[test]
    fn references_with_descendants_are_a_superset() {
        let collection = collection();
        let person = collection.tag_library().tag_definition("tag-1").unwrap().clone();

        let direct = collection.tag_references_for(&person, false);
        let deep = collection.tag_references_for(&person, true);

        assert_eq!(instance_ids(&direct), vec!["ti-1"]);
        assert_eq!(instance_ids(&deep), vec!["ti-1", "ti-2", "ti-4"]);
    }

    #[test]
    fn references_of_leaf_are_equal_either_way() {
        let collection = collection();
        let narrator = collection.tag_library().tag_definition("tag-3").unwrap().clone();

        assert_eq!(
            collection.tag_references_for(&narrator, false),
            collection.tag_references_for(&narrator, true)
        );
    }

    #[test]
    fn update_drops_references_of_removed_definitions() {
        let mut collection = collection();
        let mut upstream = tagset();
        upstream.remove("tag-2");

        let removed = collection.update(&upstream);

        assert_eq!(removed, 2);
        let remaining: Vec<&TagReference> = collection.tag_references().iter().collect();
        assert_eq!(instance_ids(&remaining), vec!["ti-1", "ti-3"]);
    }

    #[test]
    fn update_rebinds_to_refreshed_definitions() {
        let mut collection = collection();
        let mut upstream = tagset();
        upstream.tag_definition_mut("tag-2").unwrap().set_name("Figure");

        assert_eq!(collection.update(&upstream), 0);

        let figure_refs: Vec<&TagReference> = collection
            .tag_references()
            .iter()
            .filter(|tr| tr.tag_definition().uuid() == "tag-2")
            .collect();
        assert_eq!(figure_refs.len(), 2);
        assert!(figure_refs.iter().all(|tr| tr.tag_definition().name() == "Figure"));
    }

    #[test]
    fn synchronize_tagset_updates_library_and_references() {
        let mut collection = collection();
        let mut upstream = collection.tag_library().tagset_definition("tset-1").unwrap().copy();
        upstream.remove("tag-3");
        upstream.refresh_version();

        let outcome = collection.synchronize_tagset(&upstream).unwrap();

        assert_eq!(outcome.removed, vec!["tag-3".to_string()]);
        assert!(collection.tag_library().tag_definition("tag-3").is_none());
        assert_eq!(collection.tag_references().len(), 3);
    }

    #[test]
    fn remove_tag_instance_counts_removed() {
        let mut collection = collection();
        assert_eq!(collection.remove_tag_instance("ti-2"), 1);
        assert_eq!(collection.remove_tag_instance("ti-2"), 0);
        assert!(!collection.is_empty());
    }

    #[test]
    fn remove_single_reference() {
        let mut collection = collection();
        let first = collection.tag_references()[0].clone();

        assert!(collection.remove_tag_reference(&first));
        assert!(!collection.remove_tag_reference(&first));
        assert_eq!(collection.tag_references().len(), 3);
    }

    #[test]
    fn range_length() {
        assert_eq!(Range::new(3, 8).len(), 5);
        assert!(Range::new(8, 3).is_empty());
    }
}
