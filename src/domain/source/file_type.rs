//! File types of source documents

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The type of a source file: pdf, html, text...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Doc,
    Pdf,
    Xpdf,
    Html,
    Htm,
    Rtf,
    /// Everything that is none of the others
    #[default]
    Text,
    Xml,
    /// Recognised but not offered for import
    Tei,
    Docx,
    Zip,
}

const ALL: [FileType; 11] = [
    FileType::Doc,
    FileType::Pdf,
    FileType::Xpdf,
    FileType::Html,
    FileType::Htm,
    FileType::Rtf,
    FileType::Text,
    FileType::Xml,
    FileType::Tei,
    FileType::Docx,
    FileType::Zip,
];

impl FileType {
    pub fn mime_type(&self) -> &'static str {
        match self {
            FileType::Doc => "application/msword",
            FileType::Pdf => "application/pdf",
            FileType::Xpdf => "application/x-pdf",
            FileType::Html | FileType::Htm => "text/html",
            FileType::Rtf => "application/rtf",
            FileType::Text => "text/plain",
            FileType::Xml => "application/xml",
            FileType::Tei => "application/tei+xml",
            FileType::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileType::Zip => "application/zip",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            FileType::Doc => "doc",
            FileType::Pdf => "pdf",
            FileType::Xpdf => "xpdf",
            FileType::Html => "html",
            FileType::Htm => "htm",
            FileType::Rtf => "rtf",
            FileType::Text => "text",
            FileType::Xml => "xml",
            FileType::Tei => "tei",
            FileType::Docx => "docx",
            FileType::Zip => "zip",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, FileType::Tei)
    }

    /// Guess the type from the characters after the last dot, defaulting to text
    pub fn from_file_name(file_name: &str) -> Self {
        let extension = match file_name.rfind('.') {
            Some(index) if index + 1 < file_name.len() => &file_name[index + 1..],
            _ => return FileType::Text,
        };

        ALL.iter()
            .copied()
            .find(|t| t.extension().eq_ignore_ascii_case(extension))
            .unwrap_or(FileType::Text)
    }

    pub fn from_path(path: &Path) -> Self {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(Self::from_file_name)
            .unwrap_or_default()
    }

    /// First type with the given mime type, defaulting to text
    pub fn from_mime_type(mime_type: &str) -> Self {
        ALL.iter()
            .copied()
            .find(|t| t.mime_type() == mime_type)
            .unwrap_or(FileType::Text)
    }

    pub fn active_file_types() -> Vec<FileType> {
        ALL.iter().copied().filter(FileType::is_active).collect()
    }
}
