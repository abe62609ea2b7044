//! Domain layer - Tag taxonomy model and synchronization

pub mod markup;
pub mod property;
pub mod source;
pub mod tags;
pub mod version;

pub use markup::{ContentInfoSet, Range, TagReference, UserMarkupCollection};
pub use property::{Property, PropertyDefinition, PropertyValueList, SystemPropertyName};
pub use tags::{SyncOutcome, TagDefinition, TagInstance, TagLibrary, TagsetDefinition};
pub use version::Version;
