//! Core type definitions for ctxpack

use serde::{Deserialize, Serialize};

/// A file as read from the source tree, before any preprocessing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFile {
    /// Path relative to the source root, `/`-separated
    pub path: String,
    /// File content exactly as read
    pub content: String,
}

impl RawFile {
    /// Create a new raw file
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self { path: path.into(), content: content.into() }
    }
}

/// A file whose content may have been transformed by preprocessing
///
/// Shares its path universe with [`RawFile`]. This is what gets rendered
/// into the artifact and measured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFile {
    /// Path relative to the source root, `/`-separated
    pub path: String,
    /// Content to render
    pub content: String,
}

impl ProcessedFile {
    /// Create a new processed file
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self { path: path.into(), content: content.into() }
    }

    /// Get file extension, if the file name has one
    pub fn extension(&self) -> Option<&str> {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Some(ext),
            _ => None,
        }
    }
}

impl From<RawFile> for ProcessedFile {
    fn from(raw: RawFile) -> Self {
        Self { path: raw.path, content: raw.content }
    }
}

/// Coarse progress notification hook
///
/// Purely observational: implementations must not rely on being called in
/// any particular order across threads.
pub type ProgressCallback<'a> = dyn Fn(&str) + Sync + 'a;

/// A progress callback that ignores every message
pub fn no_progress(_message: &str) {}
