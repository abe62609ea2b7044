//! Application layer - Use cases and orchestration

pub mod init;
pub mod manage_config;
pub mod synchronize;
pub mod tag_manager;
pub mod taxonomy;

pub use init::InitService;
pub use manage_config::ConfigService;
pub use synchronize::{SyncReport, SyncService};
pub use tag_manager::{
    normalize_color, EventPayload, SubscriptionId, TagManager, TagManagerEvent, TagManagerEventKind,
};
pub use taxonomy::{NewTag, TaxonomyService, TreeEntry};
