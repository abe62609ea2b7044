//! Property definitions and property values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the tool-managed system properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemPropertyName {
    /// Display color of a tag, `#RRGGBB`
    DisplayColor,
    /// Author of a tag instance
    Author,
}

impl SystemPropertyName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemPropertyName::DisplayColor => "display_color",
            SystemPropertyName::Author => "author",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "display_color" => Some(SystemPropertyName::DisplayColor),
            "author" => Some(SystemPropertyName::Author),
            _ => None,
        }
    }
}

impl fmt::Display for SystemPropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of a single configurable attribute of a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub uuid: String,
    pub name: String,
    /// Legal values, in order. The first one is the default.
    #[serde(default)]
    pub possible_values: Vec<String>,
}

impl PropertyDefinition {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>, possible_values: Vec<String>) -> Self {
        PropertyDefinition {
            uuid: uuid.into(),
            name: name.into(),
            possible_values,
        }
    }

    pub fn first_value(&self) -> Option<&str> {
        self.possible_values.first().map(String::as_str)
    }

    /// Adopt the name and value domain of an upstream copy, keeping the uuid
    pub fn synchronize_with(&mut self, other: &PropertyDefinition) {
        self.name = other.name.clone();
        self.possible_values = other.possible_values.clone();
    }
}

/// Values held by a property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyValueList(Vec<String>);

impl PropertyValueList {
    pub fn new() -> Self {
        PropertyValueList(Vec::new())
    }

    pub fn single(value: impl Into<String>) -> Self {
        PropertyValueList(vec![value.into()])
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn first_value(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for PropertyValueList {
    fn from(values: Vec<String>) -> Self {
        PropertyValueList(values)
    }
}

/// An instantiated property: a definition snapshot plus held values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    definition: PropertyDefinition,
    values: PropertyValueList,
}

impl Property {
    pub fn new(definition: PropertyDefinition, values: PropertyValueList) -> Self {
        Property { definition, values }
    }

    pub fn definition(&self) -> &PropertyDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn values(&self) -> &PropertyValueList {
        &self.values
    }

    pub fn set_values(&mut self, values: PropertyValueList) {
        self.values = values;
    }

    /// Refresh the definition snapshot, never the held values
    pub fn synchronize(&mut self, definition: &PropertyDefinition) {
        self.definition = definition.clone();
    }
}
