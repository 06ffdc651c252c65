use crate::document::{format_timestamp, Document};
use crate::error::{Error, Result};
use crate::{epub_reader, markdown_reader, pdf_reader};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::info;

/// The fixed set of formats the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Epub,
    Pdf,
    Markdown,
}

impl SourceFormat {
    /// Selects the format from the original filename's extension.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());

        match extension.as_deref() {
            Some("epub") => Ok(SourceFormat::Epub),
            Some("pdf") => Ok(SourceFormat::Pdf),
            Some("md") | Some("markdown") => Ok(SourceFormat::Markdown),
            _ => Err(Error::UnsupportedFormat {
                filename: filename.to_string(),
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::Epub => "EPUB",
            SourceFormat::Pdf => "PDF",
            SourceFormat::Markdown => "Markdown",
        }
    }

    fn extract(self, source: &Source) -> Result<Document> {
        match self {
            SourceFormat::Epub => epub_reader::extract(source),
            SourceFormat::Pdf => pdf_reader::extract(source),
            SourceFormat::Markdown => markdown_reader::extract(source),
        }
    }
}

/// Everything an extractor needs to know about the file it is converting.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    /// Where the bytes are; may be a staging file with an unrelated name.
    pub path: &'a Path,
    /// The name the user knows the file by.
    pub filename: &'a str,
    pub title_hint: &'a str,
    pub processed_at: &'a str,
}

impl Source<'_> {
    pub fn file_stem(&self) -> &str {
        Path::new(self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

/// Converts `path` into a [`Document`], timestamped now.
pub fn ingest(path: &Path, original_filename: &str, title_hint: &str) -> Result<Document> {
    ingest_at(path, original_filename, title_hint, Utc::now())
}

/// Like [`ingest`], with the processing timestamp supplied by the caller.
pub fn ingest_at(
    path: &Path,
    original_filename: &str,
    title_hint: &str,
    processed_at: DateTime<Utc>,
) -> Result<Document> {
    let format = SourceFormat::from_filename(original_filename)?;
    let processed_at = format_timestamp(processed_at);
    let source = Source {
        path,
        filename: original_filename,
        title_hint,
        processed_at: &processed_at,
    };

    let document = format.extract(&source)?;
    info!(
        format = format.name(),
        file = original_filename,
        sections = document.spine.len(),
        images = document.images.len(),
        "Processed document"
    );
    Ok(document)
}
