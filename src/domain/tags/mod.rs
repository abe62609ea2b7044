//! Tag system

pub mod definition;
pub mod instance;
pub mod library;
pub mod tagset;

// Re-export main types
pub use definition::TagDefinition;
pub use instance::TagInstance;
pub use library::TagLibrary;
pub use tagset::{SyncOutcome, TagsetDefinition};
