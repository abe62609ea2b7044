//! Source content loaded from the file system

use crate::domain::markup::ContentInfoSet;
use crate::domain::source::{FileType, SourceContentHandler, SourceDocumentInfo};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads a plain text file on first access and keeps it until unloaded
#[derive(Debug, Clone)]
pub struct FileContentHandler {
    path: PathBuf,
    info: SourceDocumentInfo,
    content: Option<String>,
}

impl FileContentHandler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let title = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let info = SourceDocumentInfo {
            content_info_set: ContentInfoSet::titled(title),
            file_type: FileType::from_path(&path),
            uri: path.display().to_string(),
        };
        FileContentHandler {
            path,
            info,
            content: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SourceContentHandler for FileContentHandler {
    fn source_document_info(&self) -> &SourceDocumentInfo {
        &self.info
    }

    fn content(&mut self) -> Result<String> {
        if let Some(content) = &self.content {
            return Ok(content.clone());
        }
        debug!("loading {}", self.path.display());
        let content = fs::read_to_string(&self.path)?;
        self.content = Some(content.clone());
        Ok(content)
    }

    fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    fn unload(&mut self) {
        self.content = None;
    }
}
