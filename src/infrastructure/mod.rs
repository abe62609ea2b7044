//! Infrastructure layer - External I/O and persistence

pub mod config;
pub mod content;
pub mod ids;
pub mod repository;

pub use config::Config;
pub use content::FileContentHandler;
pub use ids::generate_id;
pub use repository::{FileSystemRepository, TaxonomyRepository, WORKSPACE_LIBRARY_ID};
