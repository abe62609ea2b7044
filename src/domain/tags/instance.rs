//! Tag instances and property reconciliation

use crate::domain::property::{Property, PropertyValueList};
use crate::domain::tags::TagDefinition;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// A concrete annotation of a tag definition, carrying property values.
///
/// The instance holds a snapshot of the definition it was created against.
/// System properties are tool-managed; user defined properties hold user data
/// and their values are never rewritten by synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInstance {
    uuid: String,
    tag_definition: TagDefinition,
    system_properties: BTreeMap<String, Property>,
    user_defined_properties: BTreeMap<String, Property>,
}

impl TagInstance {
    /// System properties start with the first legal value of their
    /// definition, user defined properties start empty.
    pub fn new(uuid: impl Into<String>, tag_definition: TagDefinition) -> Self {
        let system_properties = tag_definition
            .system_property_definitions()
            .map(|pd| {
                let values = pd
                    .first_value()
                    .map(PropertyValueList::single)
                    .unwrap_or_default();
                (pd.uuid.clone(), Property::new(pd.clone(), values))
            })
            .collect();

        let user_defined_properties = tag_definition
            .user_defined_property_definitions()
            .map(|pd| (pd.uuid.clone(), Property::new(pd.clone(), PropertyValueList::new())))
            .collect();

        TagInstance {
            uuid: uuid.into(),
            tag_definition,
            system_properties,
            user_defined_properties,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn tag_definition(&self) -> &TagDefinition {
        &self.tag_definition
    }

    /// Rebind to a refreshed copy of the definition and reconcile properties
    pub fn set_tag_definition(&mut self, tag_definition: TagDefinition) {
        self.tag_definition = tag_definition;
        self.synchronize_properties();
    }

    pub fn add_system_property(&mut self, property: Property) {
        self.system_properties
            .insert(property.definition().uuid.clone(), property);
    }

    pub fn add_user_defined_property(&mut self, property: Property) {
        self.user_defined_properties
            .insert(property.definition().uuid.clone(), property);
    }

    /// Set the values of an existing user defined property.
    /// Returns false if the instance has no such property.
    pub fn set_user_defined_values(&mut self, uuid: &str, values: PropertyValueList) -> bool {
        match self.user_defined_properties.get_mut(uuid) {
            Some(property) => {
                property.set_values(values);
                true
            }
            None => false,
        }
    }

    pub fn system_property(&self, uuid: &str) -> Option<&Property> {
        self.system_properties.get(uuid)
    }

    pub fn user_defined_property(&self, uuid: &str) -> Option<&Property> {
        self.user_defined_properties.get(uuid)
    }

    pub fn system_properties(&self) -> impl Iterator<Item = &Property> {
        self.system_properties.values()
    }

    pub fn user_defined_properties(&self) -> impl Iterator<Item = &Property> {
        self.user_defined_properties.values()
    }

    /// System properties first, then user defined ones
    pub fn property(&self, uuid: &str) -> Option<&Property> {
        self.system_property(uuid)
            .or_else(|| self.user_defined_property(uuid))
    }

    /// Reconcile the properties with the bound definition.
    ///
    /// System properties: drop those without a definition, refresh the rest.
    /// User defined properties: drop those without a definition and add empty
    /// ones for new definitions; existing values stay as they are.
    pub fn synchronize_properties(&mut self) {
        let definition = &self.tag_definition;

        self.system_properties.retain(|uuid, property| {
            match definition.property_definition(uuid) {
                Some(pd) => {
                    property.synchronize(pd);
                    true
                }
                None => {
                    debug!("dropping system property {} of {}", uuid, self.uuid);
                    false
                }
            }
        });

        self.user_defined_properties
            .retain(|uuid, _| definition.has_user_defined_property_definition(uuid));

        for pd in definition.user_defined_property_definitions() {
            if !self.user_defined_properties.contains_key(&pd.uuid) {
                self.user_defined_properties.insert(
                    pd.uuid.clone(),
                    Property::new(pd.clone(), PropertyValueList::new()),
                );
            }
        }
    }
}

impl fmt::Display for TagInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TAGINSTANCE[#{},{}]", self.uuid, self.tag_definition)
    }
}
