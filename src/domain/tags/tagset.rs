//! Tagsets: versioned forests of tag definitions
//!
//! A tagset owns its tag definitions in an arena keyed by uuid. Parent links
//! are uuids, and a derived child index maps every parent uuid (the empty
//! string for roots) to the uuids of its direct children. Every mutation in
//! this module keeps the index the exact inverse of the parent links.
//!
//! Two tagsets with the same uuid are copies of the same logical taxonomy and
//! can be reconciled with [`TagsetDefinition::synchronize_with`].

use crate::domain::tags::TagDefinition;
use crate::domain::version::Version;
use crate::error::{Result, TagweaveError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

/// A named, versioned forest of tag definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TagsetRecord", into = "TagsetRecord")]
pub struct TagsetDefinition {
    repository_id: Option<i64>,
    uuid: String,
    name: String,
    version: Version,
    definitions: BTreeMap<String, TagDefinition>,
    child_index: BTreeMap<String, BTreeSet<String>>,
}

/// What a call to [`TagsetDefinition::synchronize_with`] changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Tagset metadata (name and version) was taken from the incoming side
    pub renamed: bool,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    pub added: Vec<String>,
}

impl SyncOutcome {
    pub fn is_empty(&self) -> bool {
        !self.renamed && self.updated.is_empty() && self.removed.is_empty() && self.added.is_empty()
    }
}

/// Per-definition differences between a local copy and an incoming copy
#[derive(Debug, Default)]
struct TagsetDiff {
    updated: Vec<String>,
    removed: Vec<String>,
    added: Vec<String>,
}

impl TagsetDiff {
    fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty() && self.added.is_empty()
    }
}

impl TagsetDefinition {
    pub fn new(
        repository_id: Option<i64>,
        uuid: impl Into<String>,
        name: impl Into<String>,
        version: Version,
    ) -> Self {
        TagsetDefinition {
            repository_id,
            uuid: uuid.into(),
            name: name.into(),
            version,
            definitions: BTreeMap::new(),
            child_index: BTreeMap::new(),
        }
    }

    /// Deep copy for use as an independent fork. The repository id is not copied.
    pub fn copy(&self) -> Self {
        TagsetDefinition {
            repository_id: None,
            ..self.clone()
        }
    }

    pub fn repository_id(&self) -> Option<i64> {
        self.repository_id
    }

    pub fn set_repository_id(&mut self, repository_id: Option<i64>) {
        self.repository_id = repository_id;
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.version = Version::new();
    }

    pub(crate) fn refresh_version(&mut self) {
        self.version = Version::new();
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagDefinition> {
        self.definitions.values()
    }

    pub fn has_tag_definition(&self, uuid: &str) -> bool {
        self.definitions.contains_key(uuid)
    }

    pub fn tag_definition(&self, uuid: &str) -> Option<&TagDefinition> {
        self.definitions.get(uuid)
    }

    pub(crate) fn tag_definition_mut(&mut self, uuid: &str) -> Option<&mut TagDefinition> {
        self.definitions.get_mut(uuid)
    }

    /// True if an identical definition is stored in this tagset
    pub fn contains(&self, definition: &TagDefinition) -> bool {
        self.definitions.get(definition.uuid()) == Some(definition)
    }

    /// Insert or overwrite a definition and index it under its parent.
    ///
    /// No cycle detection is performed.
    pub fn add_tag_definition(&mut self, definition: TagDefinition) {
        let uuid = definition.uuid().to_string();
        let parent_uuid = definition.parent_uuid().to_string();

        if let Some(previous) = self.definitions.insert(uuid.clone(), definition) {
            if previous.parent_uuid() != parent_uuid {
                self.unlink_child(previous.parent_uuid(), &uuid);
            }
        }

        self.child_index.entry(parent_uuid).or_default().insert(uuid);
    }

    /// Remove a definition and all of its descendants, deepest first.
    ///
    /// Returns the removed definitions in removal order. Unknown uuids remove
    /// nothing.
    pub fn remove(&mut self, uuid: &str) -> Vec<TagDefinition> {
        let mut removed = Vec::new();
        self.remove_into(uuid, &mut removed);
        removed
    }

    fn remove_into(&mut self, uuid: &str, removed: &mut Vec<TagDefinition>) {
        let children: Vec<String> = self
            .child_index
            .get(uuid)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();

        for child in children {
            self.remove_into(&child, removed);
        }

        self.child_index.remove(uuid);
        if let Some(definition) = self.definitions.remove(uuid) {
            self.unlink_child(definition.parent_uuid(), uuid);
            debug!("removed {} from {}", definition, self);
            removed.push(definition);
        }
    }

    fn unlink_child(&mut self, parent_uuid: &str, child_uuid: &str) {
        if let Some(siblings) = self.child_index.get_mut(parent_uuid) {
            siblings.remove(child_uuid);
            if siblings.is_empty() {
                self.child_index.remove(parent_uuid);
            }
        }
    }

    /// Top level definitions
    pub fn root_definitions(&self) -> Vec<&TagDefinition> {
        self.direct_children("")
    }

    pub fn direct_children(&self, uuid: &str) -> Vec<&TagDefinition> {
        self.child_index
            .get(uuid)
            .into_iter()
            .flatten()
            .filter_map(|child| self.definitions.get(child))
            .collect()
    }

    /// All descendants in pre-order: each child is followed by its own subtree
    pub fn children(&self, uuid: &str) -> Vec<&TagDefinition> {
        let mut children = Vec::new();
        self.collect_children(uuid, &mut children);
        children
    }

    fn collect_children<'a>(&'a self, uuid: &str, children: &mut Vec<&'a TagDefinition>) {
        for child in self.direct_children(uuid) {
            children.push(child);
            self.collect_children(child.uuid(), children);
        }
    }

    /// Uuids of all descendants
    pub fn child_ids(&self, uuid: &str) -> BTreeSet<String> {
        self.children(uuid)
            .into_iter()
            .map(|child| child.uuid().to_string())
            .collect()
    }

    /// True if `ancestor` is `uuid` itself or lies on its parent chain.
    ///
    /// A parent chain that loops without reaching a root counts as a match.
    pub fn is_ancestor(&self, ancestor: &str, uuid: &str) -> bool {
        let mut current = uuid;
        for _ in 0..=self.definitions.len() {
            if current == ancestor {
                return true;
            }
            match self.definitions.get(current) {
                Some(definition) if !definition.is_root() => current = definition.parent_uuid(),
                _ => return false,
            }
        }
        true
    }

    /// Path from the top level definition down to `definition`, e.g. `/Person/Figure`
    pub fn tag_path(&self, definition: &TagDefinition) -> Result<String> {
        let mut segments = vec![definition.name()];
        let mut current = definition;

        while !current.is_root() {
            if segments.len() > self.definitions.len() {
                return Err(TagweaveError::CyclicAncestry {
                    tag: definition.uuid().to_string(),
                    parent: definition.parent_uuid().to_string(),
                });
            }
            let parent = self.definitions.get(current.parent_uuid()).ok_or_else(|| {
                TagweaveError::MissingAncestor {
                    tag: current.uuid().to_string(),
                    parent: current.parent_uuid().to_string(),
                }
            })?;
            segments.push(parent.name());
            current = parent;
        }

        Ok(segments.iter().rev().map(|name| format!("/{}", name)).collect())
    }

    fn diff(&self, other: &TagsetDefinition) -> TagsetDiff {
        let mut diff = TagsetDiff::default();

        for (uuid, local) in &self.definitions {
            match other.definitions.get(uuid) {
                Some(incoming) if incoming.version() != local.version() => {
                    diff.updated.push(uuid.clone())
                }
                Some(_) => {}
                None => diff.removed.push(uuid.clone()),
            }
        }

        diff.added = other
            .definitions
            .keys()
            .filter(|uuid| !self.definitions.contains_key(*uuid))
            .cloned()
            .collect();

        diff
    }

    /// True if both copies carry the same version and the same definitions at
    /// the same versions, i.e. [`synchronize_with`](Self::synchronize_with)
    /// would change nothing.
    pub fn is_synchronized(&self, other: &TagsetDefinition) -> bool {
        self.version == other.version && self.diff(other).is_empty()
    }

    /// Merge `other`, a copy of the same taxonomy, into this tagset.
    ///
    /// Tagset metadata is taken from `other` when the versions differ.
    /// Definitions known on both sides are patched in place when their
    /// versions differ, definitions missing from `other` are removed together
    /// with their descendants, and definitions only `other` knows are copied
    /// in. Afterwards `self.is_synchronized(other)` holds.
    ///
    /// Fails without touching either side if the uuids differ.
    pub fn synchronize_with(&mut self, other: &TagsetDefinition) -> Result<SyncOutcome> {
        if self.uuid != other.uuid {
            return Err(TagweaveError::IdentityMismatch {
                local: self.uuid.clone(),
                incoming: other.uuid.clone(),
            });
        }

        let diff = self.diff(other);
        let mut outcome = SyncOutcome::default();

        if self.version != other.version {
            self.name = other.name.clone();
            self.version = other.version.clone();
            outcome.renamed = true;
        }

        // Patch before removing so a definition moved away from a deleted
        // parent upstream is re-parented instead of cascaded away.
        for uuid in diff.updated {
            if let Some(incoming) = other.definitions.get(&uuid) {
                info!("synching {} with {}", uuid, incoming);
                self.patch_definition(incoming);
                outcome.updated.push(uuid);
            }
        }

        for uuid in diff.removed {
            if !self.definitions.contains_key(&uuid) {
                continue;
            }
            info!("removing {} from {} because of synch", uuid, self);
            outcome
                .removed
                .extend(self.remove(&uuid).into_iter().map(|d| d.uuid().to_string()));
        }

        for uuid in diff.added {
            if let Some(incoming) = other.definitions.get(&uuid) {
                info!("adding {} to {} because of synch", incoming, self);
                self.add_tag_definition(incoming.clone());
                outcome.added.push(uuid);
            }
        }

        Ok(outcome)
    }

    fn patch_definition(&mut self, incoming: &TagDefinition) {
        let Some(local) = self.definitions.get_mut(incoming.uuid()) else {
            return;
        };

        let previous_parent = local.parent_uuid().to_string();
        local.synchronize_with(incoming);

        if previous_parent != incoming.parent_uuid() {
            self.unlink_child(&previous_parent, incoming.uuid());
            self.child_index
                .entry(incoming.parent_uuid().to_string())
                .or_default()
                .insert(incoming.uuid().to_string());
        }
    }

    pub(crate) fn check_parents(&self) -> Result<()> {
        for definition in self.definitions.values() {
            if !definition.is_root() && !self.definitions.contains_key(definition.parent_uuid()) {
                return Err(TagweaveError::MissingAncestor {
                    tag: definition.uuid().to_string(),
                    parent: definition.parent_uuid().to_string(),
                });
            }
        }
        for definition in self.definitions.values() {
            if !definition.is_root() && self.is_ancestor(definition.uuid(), definition.parent_uuid()) {
                return Err(TagweaveError::CyclicAncestry {
                    tag: definition.uuid().to_string(),
                    parent: definition.parent_uuid().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for TagsetDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TAGSET_DEF[{},#{},{}]", self.name, self.uuid, self.version)
    }
}

impl<'a> IntoIterator for &'a TagsetDefinition {
    type Item = &'a TagDefinition;
    type IntoIter = std::collections::btree_map::Values<'a, String, TagDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.definitions.values()
    }
}

/// Serialized shape of a tagset; the child index is rebuilt on load
#[derive(Debug, Serialize, Deserialize)]
struct TagsetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repository_id: Option<i64>,
    uuid: String,
    name: String,
    version: Version,
    #[serde(default, rename = "tag")]
    tags: Vec<TagDefinition>,
}

impl TryFrom<TagsetRecord> for TagsetDefinition {
    type Error = TagweaveError;

    fn try_from(record: TagsetRecord) -> Result<Self> {
        let mut tagset =
            TagsetDefinition::new(record.repository_id, record.uuid, record.name, record.version);
        for tag in record.tags {
            tagset.add_tag_definition(tag);
        }
        tagset.check_parents()?;
        Ok(tagset)
    }
}

impl From<TagsetDefinition> for TagsetRecord {
    fn from(tagset: TagsetDefinition) -> Self {
        TagsetRecord {
            repository_id: tagset.repository_id,
            uuid: tagset.uuid,
            name: tagset.name,
            version: tagset.version,
            tags: tagset.definitions.into_values().collect(),
        }
    }
}
