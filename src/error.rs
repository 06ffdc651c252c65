use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The file extension does not map to any supported source format.
    #[error("Unsupported format: {filename} (expected .epub, .pdf, .md or .markdown)")]
    UnsupportedFormat { filename: String },

    /// The source was recognized but could not be parsed.
    #[error("Failed to process {}: {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    /// No persisted artifact exists at the given location.
    #[error("No saved document at {}", .path.display())]
    NotFound { path: PathBuf },

    /// A persisted artifact exists but cannot be read back.
    #[error("Corrupt artifact at {}: {reason}", .path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    #[error("File operation failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Format {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::CorruptArtifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
