//! Tag manager: the mutation gateway for taxonomies
//!
//! Every taxonomy edit goes through [`TagManager`]. Each mutating call edits
//! the target entity, refreshes the versions it touched and then notifies
//! the subscribers of exactly one [`TagManagerEventKind`].
//!
//! Subscribers are plain callbacks. They receive owned snapshots of the old
//! and new state and re-derive their own state from them; they must not call
//! back into the manager.

use crate::domain::tags::{SyncOutcome, TagDefinition, TagLibrary, TagsetDefinition};
use crate::error::{Result, TagweaveError};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;
use tracing::{debug, info};

fn color_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^#?([0-9a-fA-F]{6})$").unwrap())
}

/// Validate a `#RRGGBB` color, returning it lowercased with the leading `#`
pub fn normalize_color(input: &str) -> Result<String> {
    color_regex()
        .captures(input.trim())
        .map(|captures| format!("#{}", captures[1].to_ascii_lowercase()))
        .ok_or_else(|| TagweaveError::InvalidColor(input.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagManagerEventKind {
    TagsetAdded,
    TagsetNameChanged,
    TagsetChanged,
    TagsetRemoved,
    /// Used for additions, removals and edits of tag definitions
    TagDefinitionChanged,
}

/// One side of a change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    Tagset {
        library_id: String,
        tagset: TagsetDefinition,
    },
    Name(String),
    TagDefinition {
        tagset_uuid: String,
        definition: TagDefinition,
    },
    TypeAndColor {
        tag_type: String,
        color: Option<String>,
    },
}

/// Change notification: an empty `old` means something was added, an empty
/// `new` means something was removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagManagerEvent {
    pub kind: TagManagerEventKind,
    pub old: Option<EventPayload>,
    pub new: Option<EventPayload>,
}

impl TagManagerEvent {
    fn new(kind: TagManagerEventKind, old: Option<EventPayload>, new: Option<EventPayload>) -> Self {
        TagManagerEvent { kind, old, new }
    }

    /// The tagset carried by the new side, falling back to the old side
    pub fn tagset(&self) -> Option<&TagsetDefinition> {
        [self.new.as_ref(), self.old.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|payload| match payload {
                EventPayload::Tagset { tagset, .. } => Some(tagset),
                _ => None,
            })
    }
}

pub type Subscriber = Box<dyn FnMut(&TagManagerEvent) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registry of active tag libraries and single entry point for taxonomy edits
#[derive(Default)]
pub struct TagManager {
    tag_libraries: BTreeMap<String, TagLibrary>,
    subscribers: HashMap<TagManagerEventKind, Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: u64,
}

impl TagManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tag_library(&mut self, tag_library: TagLibrary) {
        debug!("registering tag library {}", tag_library.id());
        self.tag_libraries
            .insert(tag_library.id().to_string(), tag_library);
    }

    pub fn remove_tag_library(&mut self, library_id: &str) -> Option<TagLibrary> {
        self.tag_libraries.remove(library_id)
    }

    pub fn tag_library(&self, library_id: &str) -> Option<&TagLibrary> {
        self.tag_libraries.get(library_id)
    }

    pub fn tag_libraries(&self) -> impl Iterator<Item = &TagLibrary> {
        self.tag_libraries.values()
    }

    pub fn subscribe(
        &mut self,
        kind: TagManagerEventKind,
        subscriber: impl FnMut(&TagManagerEvent) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers
            .entry(kind)
            .or_default()
            .push((id, Box::new(subscriber)));
        id
    }

    /// Returns false if no such subscription was registered for `kind`
    pub fn unsubscribe(&mut self, kind: TagManagerEventKind, id: SubscriptionId) -> bool {
        let Some(subscribers) = self.subscribers.get_mut(&kind) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|(subscription, _)| *subscription != id);
        before != subscribers.len()
    }

    fn emit(&mut self, event: TagManagerEvent) {
        info!("{:?}", event.kind);
        if let Some(subscribers) = self.subscribers.get_mut(&event.kind) {
            for (_, subscriber) in subscribers.iter_mut() {
                subscriber(&event);
            }
        }
    }

    fn library_mut(&mut self, library_id: &str) -> Result<&mut TagLibrary> {
        self.tag_libraries
            .get_mut(library_id)
            .ok_or_else(|| TagweaveError::UnknownTagLibrary(library_id.to_string()))
    }

    fn tagset_mut(&mut self, library_id: &str, tagset_uuid: &str) -> Result<&mut TagsetDefinition> {
        self.library_mut(library_id)?
            .tagset_definition_mut(tagset_uuid)
            .ok_or_else(|| TagweaveError::UnknownTagset(tagset_uuid.to_string()))
    }

    pub fn add_tagset_definition(&mut self, library_id: &str, tagset: TagsetDefinition) -> Result<()> {
        self.library_mut(library_id)?.add(tagset.clone());
        self.emit(TagManagerEvent::new(
            TagManagerEventKind::TagsetAdded,
            None,
            Some(EventPayload::Tagset {
                library_id: library_id.to_string(),
                tagset,
            }),
        ));
        Ok(())
    }

    pub fn set_tagset_definition_name(
        &mut self,
        library_id: &str,
        tagset_uuid: &str,
        name: &str,
    ) -> Result<()> {
        let tagset = self.tagset_mut(library_id, tagset_uuid)?;
        let old_name = tagset.name().to_string();
        tagset.set_name(name);
        let tagset = tagset.clone();

        self.emit(TagManagerEvent::new(
            TagManagerEventKind::TagsetNameChanged,
            Some(EventPayload::Name(old_name)),
            Some(EventPayload::Tagset {
                library_id: library_id.to_string(),
                tagset,
            }),
        ));
        Ok(())
    }

    pub fn remove_tagset_definition(
        &mut self,
        library_id: &str,
        tagset_uuid: &str,
    ) -> Result<TagsetDefinition> {
        let tagset = self
            .library_mut(library_id)?
            .remove(tagset_uuid)
            .ok_or_else(|| TagweaveError::UnknownTagset(tagset_uuid.to_string()))?;

        self.emit(TagManagerEvent::new(
            TagManagerEventKind::TagsetRemoved,
            Some(EventPayload::Tagset {
                library_id: library_id.to_string(),
                tagset: tagset.clone(),
            }),
            None,
        ));
        Ok(tagset)
    }

    /// Add a definition below an existing parent (or as a root), or
    /// overwrite the definition with the same uuid.
    ///
    /// The stored definition always gets a fresh version. Placing a
    /// definition below itself or one of its descendants is rejected.
    pub fn add_tag_definition(
        &mut self,
        library_id: &str,
        tagset_uuid: &str,
        mut definition: TagDefinition,
    ) -> Result<()> {
        let tagset = self.tagset_mut(library_id, tagset_uuid)?;
        if !definition.is_root() {
            if !tagset.has_tag_definition(definition.parent_uuid()) {
                return Err(TagweaveError::UnknownTagDefinition(
                    definition.parent_uuid().to_string(),
                ));
            }
            if tagset.is_ancestor(definition.uuid(), definition.parent_uuid()) {
                return Err(TagweaveError::CyclicAncestry {
                    tag: definition.uuid().to_string(),
                    parent: definition.parent_uuid().to_string(),
                });
            }
        }

        definition.refresh_version();
        tagset.add_tag_definition(definition.clone());
        tagset.refresh_version();

        self.emit(TagManagerEvent::new(
            TagManagerEventKind::TagDefinitionChanged,
            None,
            Some(EventPayload::TagDefinition {
                tagset_uuid: tagset_uuid.to_string(),
                definition,
            }),
        ));
        Ok(())
    }

    /// Remove a definition and its descendants. Returns everything removed,
    /// the requested definition last.
    pub fn remove_tag_definition(
        &mut self,
        library_id: &str,
        tagset_uuid: &str,
        tag_uuid: &str,
    ) -> Result<Vec<TagDefinition>> {
        let tagset = self.tagset_mut(library_id, tagset_uuid)?;
        let removed = tagset.remove(tag_uuid);
        let Some(definition) = removed.last().cloned() else {
            return Err(TagweaveError::UnknownTagDefinition(tag_uuid.to_string()));
        };
        tagset.refresh_version();

        self.emit(TagManagerEvent::new(
            TagManagerEventKind::TagDefinitionChanged,
            Some(EventPayload::TagDefinition {
                tagset_uuid: tagset_uuid.to_string(),
                definition,
            }),
            None,
        ));
        Ok(removed)
    }

    /// Change type and display color. Emits only if something changed;
    /// returns whether it did.
    pub fn set_tag_definition_type_and_color(
        &mut self,
        library_id: &str,
        tagset_uuid: &str,
        tag_uuid: &str,
        tag_type: &str,
        color: &str,
    ) -> Result<bool> {
        let color = normalize_color(color)?;
        let tagset = self.tagset_mut(library_id, tagset_uuid)?;
        let definition = tagset
            .tag_definition_mut(tag_uuid)
            .ok_or_else(|| TagweaveError::UnknownTagDefinition(tag_uuid.to_string()))?;

        let old_type = definition.tag_type().to_string();
        let old_color = definition.color().map(str::to_string);
        let mut changed = false;

        if old_type != tag_type {
            definition.set_tag_type(tag_type);
            changed = true;
        }
        if old_color.as_deref() != Some(color.as_str()) {
            definition.set_color(&color);
            changed = true;
        }

        if !changed {
            debug!("type and color of {} unchanged", tag_uuid);
            return Ok(false);
        }

        let definition = definition.clone();
        tagset.refresh_version();

        self.emit(TagManagerEvent::new(
            TagManagerEventKind::TagDefinitionChanged,
            Some(EventPayload::TypeAndColor {
                tag_type: old_type,
                color: old_color,
            }),
            Some(EventPayload::TagDefinition {
                tagset_uuid: tagset_uuid.to_string(),
                definition,
            }),
        ));
        Ok(true)
    }

    /// Replace a tagset of a library wholesale with a copy retrieved elsewhere
    pub fn update(&mut self, library_id: &str, tagset: TagsetDefinition) -> Result<()> {
        let previous = self.library_mut(library_id)?.replace(tagset.clone());

        self.emit(TagManagerEvent::new(
            TagManagerEventKind::TagsetChanged,
            previous.map(|tagset| EventPayload::Tagset {
                library_id: library_id.to_string(),
                tagset,
            }),
            Some(EventPayload::Tagset {
                library_id: library_id.to_string(),
                tagset,
            }),
        ));
        Ok(())
    }

    /// Merge an incoming copy into the library's copy of the same tagset.
    ///
    /// Nothing happens and nothing is emitted if both are already in sync.
    pub fn synchronize(&mut self, library_id: &str, incoming: &TagsetDefinition) -> Result<SyncOutcome> {
        incoming.check_parents()?;
        let tagset = self.tagset_mut(library_id, incoming.uuid())?;
        if tagset.is_synchronized(incoming) {
            debug!("{} is already synchronized", tagset);
            return Ok(SyncOutcome::default());
        }

        let before = tagset.clone();
        let outcome = tagset.synchronize_with(incoming)?;
        let after = tagset.clone();

        self.emit(TagManagerEvent::new(
            TagManagerEventKind::TagsetChanged,
            Some(EventPayload::Tagset {
                library_id: library_id.to_string(),
                tagset: before,
            }),
            Some(EventPayload::Tagset {
                library_id: library_id.to_string(),
                tagset: after,
            }),
        ));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::version::Version;
    use std::sync::{Arc, Mutex};

    const LIB: &str = "lib-1";
    const TSET: &str = "tset-1";

    fn manager() -> TagManager {
        let mut library = TagLibrary::new(LIB, "Library");
        let mut tagset = TagsetDefinition::new(None, TSET, "People", Version::new());
        tagset.add_tag_definition(TagDefinition::new("tag-1", "Person", "", Version::new()));
        tagset.add_tag_definition(TagDefinition::new("tag-2", "Character", "tag-1", Version::new()));
        library.add(tagset);

        let mut manager = TagManager::new();
        manager.add_tag_library(library);
        manager
    }

    fn record(
        manager: &mut TagManager,
        kind: TagManagerEventKind,
    ) -> Arc<Mutex<Vec<TagManagerEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        manager.subscribe(kind, move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    fn tagset(manager: &TagManager) -> &TagsetDefinition {
        manager.tag_library(LIB).unwrap().tagset_definition(TSET).unwrap()
    }

    #[test]
    fn normalize_color_accepts_hex() {
        assert_eq!(normalize_color("#1F77B4").unwrap(), "#1f77b4");
        assert_eq!(normalize_color("1f77b4").unwrap(), "#1f77b4");
        assert!(normalize_color("blue").is_err());
        assert!(normalize_color("#12345").is_err());
    }

    #[test]
    fn add_tag_definition_emits_with_empty_old_side() {
        let mut manager = manager();
        let events = record(&mut manager, TagManagerEventKind::TagDefinitionChanged);
        let before = tagset(&manager).version().clone();

        manager
            .add_tag_definition(LIB, TSET, TagDefinition::new("tag-3", "Villain", "tag-2", Version::new()))
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].old.is_none());
        assert!(matches!(
            &events[0].new,
            Some(EventPayload::TagDefinition { definition, .. }) if definition.uuid() == "tag-3"
        ));
        assert_ne!(tagset(&manager).version(), &before);
    }

    #[test]
    fn add_tag_definition_rejects_unknown_parent() {
        let mut manager = manager();
        let events = record(&mut manager, TagManagerEventKind::TagDefinitionChanged);

        let result = manager.add_tag_definition(
            LIB,
            TSET,
            TagDefinition::new("tag-3", "Villain", "tag-missing", Version::new()),
        );

        assert!(matches!(result, Err(TagweaveError::UnknownTagDefinition(_))));
        assert!(events.lock().unwrap().is_empty());
        assert!(!tagset(&manager).has_tag_definition("tag-3"));
    }

    #[test]
    fn add_tag_definition_rejects_cycles() {
        let mut manager = manager();
        let events = record(&mut manager, TagManagerEventKind::TagDefinitionChanged);
        let before = tagset(&manager).clone();

        let below_child =
            manager.add_tag_definition(LIB, TSET, TagDefinition::new("tag-1", "Person", "tag-2", Version::new()));
        let below_itself =
            manager.add_tag_definition(LIB, TSET, TagDefinition::new("tag-2", "Character", "tag-2", Version::new()));

        assert!(matches!(below_child, Err(TagweaveError::CyclicAncestry { .. })));
        assert!(matches!(below_itself, Err(TagweaveError::CyclicAncestry { .. })));
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(tagset(&manager), &before);
        assert_eq!(tagset(&manager).root_definitions().len(), 1);
    }

    #[test]
    fn synchronize_rejects_cyclic_incoming() {
        let mut manager = manager();
        let events = record(&mut manager, TagManagerEventKind::TagsetChanged);
        let before = tagset(&manager).clone();

        let mut incoming = before.copy();
        incoming.add_tag_definition(TagDefinition::new("tag-1", "Person", "tag-2", Version::new()));

        assert!(matches!(
            manager.synchronize(LIB, &incoming),
            Err(TagweaveError::CyclicAncestry { .. })
        ));
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(tagset(&manager), &before);
    }

    #[test]
    fn overwrite_refreshes_definition_version() {
        let mut manager = manager();
        let mut fork = tagset(&manager).copy();
        let stale = tagset(&manager).tag_definition("tag-2").unwrap().version().clone();

        manager
            .add_tag_definition(LIB, TSET, TagDefinition::new("tag-2", "Figure", "tag-1", stale.clone()))
            .unwrap();

        let upstream = tagset(&manager).clone();
        assert_ne!(upstream.tag_definition("tag-2").unwrap().version(), &stale);
        assert!(!fork.is_synchronized(&upstream));

        fork.synchronize_with(&upstream).unwrap();
        assert_eq!(fork.tag_definition("tag-2").unwrap().name(), "Figure");
        assert!(fork.is_synchronized(&upstream));
    }

    #[test]
    fn remove_tag_definition_emits_with_empty_new_side() {
        let mut manager = manager();
        let events = record(&mut manager, TagManagerEventKind::TagDefinitionChanged);

        let removed = manager.remove_tag_definition(LIB, TSET, "tag-1").unwrap();

        assert_eq!(removed.len(), 2);
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].new.is_none());
        assert!(matches!(
            &events[0].old,
            Some(EventPayload::TagDefinition { definition, .. }) if definition.uuid() == "tag-1"
        ));
        assert!(tagset(&manager).is_empty());
    }

    #[test]
    fn remove_unknown_tag_definition_fails() {
        let mut manager = manager();
        let result = manager.remove_tag_definition(LIB, TSET, "tag-99");
        assert!(matches!(result, Err(TagweaveError::UnknownTagDefinition(_))));
    }

    #[test]
    fn type_and_color_change_is_suppressed_when_unchanged() {
        let mut manager = manager();
        let events = record(&mut manager, TagManagerEventKind::TagDefinitionChanged);

        assert!(manager
            .set_tag_definition_type_and_color(LIB, TSET, "tag-1", "entity", "#FF0000")
            .unwrap());
        assert!(!manager
            .set_tag_definition_type_and_color(LIB, TSET, "tag-1", "entity", "#ff0000")
            .unwrap());

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].old,
            Some(EventPayload::TypeAndColor {
                tag_type: String::new(),
                color: None
            })
        );
        let definition = tagset(&manager).tag_definition("tag-1").unwrap();
        assert_eq!(definition.color(), Some("#ff0000"));
        assert_eq!(definition.tag_type(), "entity");
    }

    #[test]
    fn tagset_lifecycle_events() {
        let mut manager = manager();
        let added = record(&mut manager, TagManagerEventKind::TagsetAdded);
        let renamed = record(&mut manager, TagManagerEventKind::TagsetNameChanged);
        let removed = record(&mut manager, TagManagerEventKind::TagsetRemoved);

        manager
            .add_tagset_definition(LIB, TagsetDefinition::new(None, "tset-2", "Places", Version::new()))
            .unwrap();
        manager
            .set_tagset_definition_name(LIB, "tset-2", "Locations")
            .unwrap();
        manager.remove_tagset_definition(LIB, "tset-2").unwrap();

        assert_eq!(added.lock().unwrap().len(), 1);
        let renamed = renamed.lock().unwrap();
        assert_eq!(renamed[0].old, Some(EventPayload::Name("Places".to_string())));
        assert_eq!(renamed[0].tagset().map(|t| t.name()), Some("Locations"));
        let removed = removed.lock().unwrap();
        assert!(removed[0].new.is_none());
        assert!(manager.tag_library(LIB).unwrap().tagset_definition("tset-2").is_none());
    }

    #[test]
    fn unknown_library_and_tagset_fail_without_events() {
        let mut manager = manager();
        let events = record(&mut manager, TagManagerEventKind::TagsetNameChanged);

        assert!(matches!(
            manager.set_tagset_definition_name("lib-x", TSET, "x"),
            Err(TagweaveError::UnknownTagLibrary(_))
        ));
        assert!(matches!(
            manager.set_tagset_definition_name(LIB, "tset-x", "x"),
            Err(TagweaveError::UnknownTagset(_))
        ));
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut manager = manager();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let id = manager.subscribe(TagManagerEventKind::TagsetNameChanged, move |_| {
            *sink.lock().unwrap() += 1;
        });

        manager.set_tagset_definition_name(LIB, TSET, "A").unwrap();
        assert!(manager.unsubscribe(TagManagerEventKind::TagsetNameChanged, id));
        assert!(!manager.unsubscribe(TagManagerEventKind::TagsetNameChanged, id));
        manager.set_tagset_definition_name(LIB, TSET, "B").unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn subscribers_only_see_their_kind() {
        let mut manager = manager();
        let changed = record(&mut manager, TagManagerEventKind::TagsetChanged);

        manager.set_tagset_definition_name(LIB, TSET, "Renamed").unwrap();

        assert!(changed.lock().unwrap().is_empty());
    }

    #[test]
    fn update_replaces_wholesale_and_reports_previous() {
        let mut manager = manager();
        let events = record(&mut manager, TagManagerEventKind::TagsetChanged);
        let replacement = TagsetDefinition::new(None, TSET, "People v2", Version::new());

        manager.update(LIB, replacement).unwrap();

        assert!(tagset(&manager).is_empty());
        let events = events.lock().unwrap();
        assert!(matches!(
            &events[0].old,
            Some(EventPayload::Tagset { tagset, .. }) if tagset.len() == 2
        ));
        assert_eq!(events[0].tagset().map(|t| t.name()), Some("People v2"));
    }

    #[test]
    fn synchronize_skips_when_in_sync() {
        let mut manager = manager();
        let events = record(&mut manager, TagManagerEventKind::TagsetChanged);
        let same = tagset(&manager).copy();

        let outcome = manager.synchronize(LIB, &same).unwrap();

        assert!(outcome.is_empty());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn synchronize_merges_and_emits_once() {
        let mut manager = manager();
        let events = record(&mut manager, TagManagerEventKind::TagsetChanged);
        let mut upstream = tagset(&manager).copy();
        upstream.tag_definition_mut("tag-2").unwrap().set_name("Figure");
        upstream.refresh_version();

        let outcome = manager.synchronize(LIB, &upstream).unwrap();

        assert_eq!(outcome.updated, vec!["tag-2".to_string()]);
        assert_eq!(events.lock().unwrap().len(), 1);
        assert!(tagset(&manager).is_synchronized(&upstream));
    }

    #[test]
    fn manager_can_be_shared_behind_one_lock() {
        let shared = Arc::new(Mutex::new(manager()));
        let worker = Arc::clone(&shared);

        std::thread::spawn(move || {
            worker
                .lock()
                .unwrap()
                .set_tagset_definition_name(LIB, TSET, "From thread")
                .unwrap();
        })
        .join()
        .unwrap();

        let manager = shared.lock().unwrap();
        assert_eq!(tagset(&manager).name(), "From thread");
    }
}
