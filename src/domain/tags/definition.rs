//! Tag definitions: the nodes of a tagset

use crate::domain::property::{PropertyDefinition, SystemPropertyName};
use crate::domain::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One node of a taxonomy.
///
/// The parent is referenced by uuid; an empty `parent_uuid` marks a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefinition {
    uuid: String,
    #[serde(default)]
    parent_uuid: String,
    name: String,
    #[serde(default)]
    tag_type: String,
    version: Version,
    #[serde(default)]
    system_property_definitions: BTreeMap<String, PropertyDefinition>,
    #[serde(default)]
    user_defined_property_definitions: BTreeMap<String, PropertyDefinition>,
}

impl TagDefinition {
    pub fn new(
        uuid: impl Into<String>,
        name: impl Into<String>,
        parent_uuid: impl Into<String>,
        version: Version,
    ) -> Self {
        TagDefinition {
            uuid: uuid.into(),
            parent_uuid: parent_uuid.into(),
            name: name.into(),
            tag_type: String::new(),
            version,
            system_property_definitions: BTreeMap::new(),
            user_defined_property_definitions: BTreeMap::new(),
        }
    }

    /// Builder-style display color for a definition that is not registered yet
    pub fn with_color(mut self, color: &str) -> Self {
        self.apply_color(color);
        self
    }

    pub fn with_type(mut self, tag_type: impl Into<String>) -> Self {
        self.tag_type = tag_type.into();
        self
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn parent_uuid(&self) -> &str {
        &self.parent_uuid
    }

    pub fn is_root(&self) -> bool {
        self.parent_uuid.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag_type(&self) -> &str {
        &self.tag_type
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Display color, the first value of the `display_color` system property
    pub fn color(&self) -> Option<&str> {
        self.color_definition().and_then(PropertyDefinition::first_value)
    }

    pub fn system_property_definitions(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.system_property_definitions.values()
    }

    pub fn user_defined_property_definitions(
        &self,
    ) -> impl Iterator<Item = &PropertyDefinition> {
        self.user_defined_property_definitions.values()
    }

    pub fn add_system_property_definition(&mut self, definition: PropertyDefinition) {
        self.system_property_definitions
            .insert(definition.uuid.clone(), definition);
    }

    pub fn add_user_defined_property_definition(&mut self, definition: PropertyDefinition) {
        self.user_defined_property_definitions
            .insert(definition.uuid.clone(), definition);
    }

    /// Look up a property definition in the system set first, then the user set
    pub fn property_definition(&self, uuid: &str) -> Option<&PropertyDefinition> {
        self.system_property_definitions
            .get(uuid)
            .or_else(|| self.user_defined_property_definitions.get(uuid))
    }

    pub fn has_system_property_definition(&self, uuid: &str) -> bool {
        self.system_property_definitions.contains_key(uuid)
    }

    pub fn has_user_defined_property_definition(&self, uuid: &str) -> bool {
        self.user_defined_property_definitions.contains_key(uuid)
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.version = Version::new();
    }

    pub(crate) fn set_tag_type(&mut self, tag_type: impl Into<String>) {
        self.tag_type = tag_type.into();
        self.version = Version::new();
    }

    pub(crate) fn refresh_version(&mut self) {
        self.version = Version::new();
    }

    pub(crate) fn set_color(&mut self, color: &str) {
        self.apply_color(color);
        self.version = Version::new();
    }

    fn color_definition(&self) -> Option<&PropertyDefinition> {
        self.system_property_definitions
            .values()
            .find(|pd| pd.name == SystemPropertyName::DisplayColor.as_str())
    }

    fn apply_color(&mut self, color: &str) {
        let existing = self
            .system_property_definitions
            .values_mut()
            .find(|pd| pd.name == SystemPropertyName::DisplayColor.as_str());

        match existing {
            Some(definition) => definition.possible_values = vec![color.to_string()],
            None => {
                let uuid = format!("{}#{}", self.uuid, SystemPropertyName::DisplayColor);
                self.add_system_property_definition(PropertyDefinition::new(
                    uuid,
                    SystemPropertyName::DisplayColor.as_str(),
                    vec![color.to_string()],
                ));
            }
        }
    }

    /// Patch this definition in place so it mirrors `other`.
    ///
    /// The uuid is kept; name, type, parent, version and both property
    /// definition sets are taken from `other`.
    pub fn synchronize_with(&mut self, other: &TagDefinition) {
        self.name = other.name.clone();
        self.tag_type = other.tag_type.clone();
        self.parent_uuid = other.parent_uuid.clone();
        self.version = other.version.clone();
        synchronize_definitions(
            &mut self.system_property_definitions,
            &other.system_property_definitions,
        );
        synchronize_definitions(
            &mut self.user_defined_property_definitions,
            &other.user_defined_property_definitions,
        );
    }
}

fn synchronize_definitions(
    local: &mut BTreeMap<String, PropertyDefinition>,
    incoming: &BTreeMap<String, PropertyDefinition>,
) {
    local.retain(|uuid, _| incoming.contains_key(uuid));

    for (uuid, definition) in incoming {
        match local.get_mut(uuid) {
            Some(existing) => existing.synchronize_with(definition),
            None => {
                local.insert(uuid.clone(), definition.clone());
            }
        }
    }
}

impl fmt::Display for TagDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TAG_DEF[{},#{},{}]", self.name, self.uuid, self.version)
    }
}
