//! Source documents and their content handlers

use crate::domain::markup::{ContentInfoSet, Range, UserMarkupCollectionReference};
use crate::domain::source::FileType;
use crate::error::Result;

/// Metadata of a source document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDocumentInfo {
    pub content_info_set: ContentInfoSet,
    pub file_type: FileType,
    /// Where the content comes from, e.g. a file path
    pub uri: String,
}

/// Loads and holds the text of a source document
pub trait SourceContentHandler {
    fn source_document_info(&self) -> &SourceDocumentInfo;

    /// Full text, loading it first if needed
    fn content(&mut self) -> Result<String>;

    fn is_loaded(&self) -> bool;

    fn unload(&mut self);
}

/// Content handler over text that is already in memory
///
/// The text is held for the handler's whole life, so `unload` only resets
/// the loaded flag and never frees memory.
#[derive(Debug, Clone)]
pub struct InMemoryContentHandler {
    info: SourceDocumentInfo,
    content: String,
    loaded: bool,
}

impl InMemoryContentHandler {
    pub fn new(info: SourceDocumentInfo, content: impl Into<String>) -> Self {
        InMemoryContentHandler {
            info,
            content: content.into(),
            loaded: true,
        }
    }
}

impl SourceContentHandler for InMemoryContentHandler {
    fn source_document_info(&self) -> &SourceDocumentInfo {
        &self.info
    }

    fn content(&mut self) -> Result<String> {
        self.loaded = true;
        Ok(self.content.clone())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn unload(&mut self) {
        self.loaded = false;
    }
}

/// A text managed by a content handler, with the collections attached to it
pub struct SourceDocument {
    id: String,
    handler: Box<dyn SourceContentHandler>,
    user_markup_collection_refs: Vec<UserMarkupCollectionReference>,
    length: Option<usize>,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, handler: Box<dyn SourceContentHandler>) -> Self {
        SourceDocument {
            id: id.into(),
            handler,
            user_markup_collection_refs: Vec::new(),
            length: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Title if there is one, the id otherwise
    pub fn title(&self) -> &str {
        let title = &self.handler.source_document_info().content_info_set.title;
        if title.is_empty() {
            &self.id
        } else {
            title
        }
    }

    pub fn info(&self) -> &SourceDocumentInfo {
        self.handler.source_document_info()
    }

    pub fn content(&mut self) -> Result<String> {
        self.handler.content()
    }

    /// Text inside `range`, in characters, clamped to the document length
    pub fn content_in(&mut self, range: Range) -> Result<String> {
        let content = self.content()?;
        let length = content.chars().count();
        let start = range.start.min(length);
        let end = range.end.min(length);
        if start >= end {
            return Ok(String::new());
        }
        Ok(content.chars().skip(start).take(end - start).collect())
    }

    /// Length in characters, computed once
    pub fn length(&mut self) -> Result<usize> {
        if let Some(length) = self.length {
            return Ok(length);
        }
        let length = self.content()?.chars().count();
        self.length = Some(length);
        Ok(length)
    }

    pub fn is_loaded(&self) -> bool {
        self.handler.is_loaded()
    }

    pub fn unload(&mut self) {
        self.handler.unload();
    }

    pub fn add_user_markup_collection_reference(&mut self, reference: UserMarkupCollectionReference) {
        self.user_markup_collection_refs.push(reference);
    }

    pub fn user_markup_collection_refs(&self) -> &[UserMarkupCollectionReference] {
        &self.user_markup_collection_refs
    }

    pub fn user_markup_collection_reference(&self, id: &str) -> Option<&UserMarkupCollectionReference> {
        self.user_markup_collection_refs.iter().find(|r| r.id == id)
    }

    /// Returns true if the reference had been attached
    pub fn remove_user_markup_collection_reference(&mut self, id: &str) -> bool {
        let before = self.user_markup_collection_refs.len();
        self.user_markup_collection_refs.retain(|r| r.id != id);
        before != self.user_markup_collection_refs.len()
    }
}

impl PartialEq for SourceDocument {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SourceDocument {}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("id", &self.id)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
