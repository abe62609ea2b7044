//! Error types for tagweave

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tagweave
#[derive(Debug, Error)]
pub enum TagweaveError {
    #[error("Cannot synchronize tagset #{local} with tagset #{incoming}: uuids differ")]
    IdentityMismatch { local: String, incoming: String },

    #[error("Tag definition #{tag} references missing parent #{parent}")]
    MissingAncestor { tag: String, parent: String },

    #[error("Tag definition #{tag} cannot be placed below #{parent}: it would become its own ancestor")]
    CyclicAncestry { tag: String, parent: String },

    #[error("Unknown tag library: {0}")]
    UnknownTagLibrary(String),

    #[error("Unknown tagset: {0}")]
    UnknownTagset(String),

    #[error("Unknown tag definition: {0}")]
    UnknownTagDefinition(String),

    #[error("Not a tagweave directory: {0}")]
    NotTagweaveDirectory(PathBuf),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl TagweaveError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TagweaveError::NotTagweaveDirectory(_) => 2,
            TagweaveError::UnknownTagLibrary(_)
            | TagweaveError::UnknownTagset(_)
            | TagweaveError::UnknownTagDefinition(_) => 3,
            TagweaveError::IdentityMismatch { .. } => 4,
            TagweaveError::MissingAncestor { .. } | TagweaveError::CyclicAncestry { .. } => 5,
            _ => 1,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            TagweaveError::NotTagweaveDirectory(path) => {
                format!(
                    "Not a tagweave directory: {}\n\n\
                    Suggestions:\n\
                    • Run 'tagweave init' in this directory to create a new workspace\n\
                    • Navigate to an existing tagweave directory\n\
                    • Set TAGWEAVE_ROOT environment variable to your workspace path",
                    path.display()
                )
            }
            TagweaveError::UnknownTagset(id) => {
                format!(
                    "Unknown tagset: '{}'\n\n\
                    Suggestions:\n\
                    • Use 'tagweave tagset list' to see available tagsets\n\
                    • Tagsets can be referenced by uuid or by exact name",
                    id
                )
            }
            TagweaveError::UnknownTagDefinition(id) => {
                format!(
                    "Unknown tag definition: '{}'\n\n\
                    Suggestions:\n\
                    • Use 'tagweave tree <tagset>' to see the tags of a tagset\n\
                    • Tags can be referenced by uuid or by exact name",
                    id
                )
            }
            TagweaveError::IdentityMismatch { local, incoming } => {
                format!(
                    "{}\n\n\
                    Only copies of the same tagset can be synchronized.\n\
                    Local uuid:    {}\n\
                    Incoming uuid: {}\n\
                    Use 'tagweave import' to add an unrelated tagset instead",
                    self, local, incoming
                )
            }
            TagweaveError::InvalidColor(color) => {
                format!(
                    "Invalid color: '{}'\n\n\
                    Expected format: #RRGGBB\n\
                    Example: tagweave tag color Places Harbour '#1f77b4'",
                    color
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Result type using TagweaveError
pub type Result<T> = std::result::Result<T, TagweaveError>;
