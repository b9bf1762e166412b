//! Markdown document source.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Errors that can occur when reading a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Markdown file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read markdown file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The markdown text of a document to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: Option<PathBuf>,
    content: String,
}

impl Document {
    /// Creates a document from in-memory text.
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            path: None,
            content: content.into(),
        }
    }

    /// Reads a markdown file.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::NotFound` if the file does not exist and
    /// `DocumentError::Io` for any other read failure.
    pub fn read(path: &Path) -> Result<Self, DocumentError> {
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                DocumentError::NotFound(path.to_path_buf())
            } else {
                DocumentError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        info!(path = %path.display(), chars = content.chars().count(), "Read markdown document");
        Ok(Self {
            path: Some(path.to_path_buf()),
            content,
        })
    }

    /// Returns the markdown text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the file the document was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true if there is no text to interpret.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_returns_file_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("paper.md");
        fs::write(&path, "# Title\n\nBody").unwrap();

        let document = Document::read(&path).unwrap();
        assert_eq!(document.content(), "# Title\n\nBody");
        assert_eq!(document.path(), Some(path.as_path()));
        assert!(!document.is_empty());
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = Document::read(&dir.path().join("missing.md"));

        let error = result.unwrap_err();
        assert!(matches!(error, DocumentError::NotFound(_)));
        assert!(error.to_string().contains("missing.md"));
    }

    #[test]
    fn empty_file_is_an_empty_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.md");
        fs::write(&path, "").unwrap();

        assert!(Document::read(&path).unwrap().is_empty());
    }
}
