//! Source documents (content access and file type detection)

pub mod document;
pub mod file_type;

pub use document::{InMemoryContentHandler, SourceContentHandler, SourceDocument, SourceDocumentInfo};
pub use file_type::FileType;
