//! Uploaded file types.

use serde::{Deserialize, Serialize};

/// A file accepted by the intake, tagged for syntax highlighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub content: String,
    /// Display language tag (e.g. `python`, `diff`, `text`).
    pub language: String,
}

impl UploadedFile {
    /// Size in bytes of the UTF-8 content.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// A file as submitted to the review endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedFile {
    pub name: String,
    pub content: String,
}

impl SubmittedFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl From<&UploadedFile> for SubmittedFile {
    fn from(file: &UploadedFile) -> Self {
        Self::new(file.name.clone(), file.content.clone())
    }
}
