/// Shared data structures for the application state
///
/// These structs represent the directory listing that flows between
/// the scanner and the UI layer.
use std::path::PathBuf;

use crate::error::Result;

/// A file in the browsed directory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle {
    /// Full path to the file
    pub path: PathBuf,
    /// Filename only (e.g., "DSCF0001.RAF")
    pub name: String,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self { path, name }
    }

    /// Filename with the last `.ext` removed; names without a dot are kept whole
    pub fn basename(&self) -> &str {
        match self.name.rfind('.') {
            Some(dot) => &self.name[..dot],
            None => &self.name,
        }
    }

    /// Read the whole file
    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// A primary file and the sidecars sharing its basename
#[derive(Debug, Clone, PartialEq)]
pub struct FileItem {
    pub handle: FileHandle,
    /// Sniffed MIME type (None if unknown)
    pub mime_type: Option<String>,
    /// Sorted by name, empty for sidecars themselves
    pub sidecars: Vec<FileItem>,
}

impl FileItem {
    pub fn new(handle: FileHandle, mime_type: Option<String>) -> Self {
        Self {
            handle,
            mime_type,
            sidecars: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.handle.name
    }

    /// Image or video content
    pub fn is_media(&self) -> bool {
        self.mime_type
            .as_deref()
            .map(|m| m.starts_with("image/") || m.starts_with("video/"))
            .unwrap_or(false)
    }
}
