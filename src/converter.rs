use crate::document::Document;
use crate::error::{Error, Result};
use crate::library;
use crate::reader;
use crate::store;
use std::path::{Path, PathBuf};
use tracing::info;

/// What to import and where to put it.
#[derive(Debug, Clone)]
pub struct ImportRequest<'a> {
    pub input: &'a Path,
    /// Name the extractor is chosen by; defaults to the input's file name.
    pub original_filename: Option<&'a str>,
    /// Defaults to the file stem.
    pub title: Option<&'a str>,
    /// Artifact directory; defaults to `{library}/{stem}_data`.
    pub output: Option<&'a Path>,
    pub library: &'a Path,
}

pub struct Imported {
    pub dir: PathBuf,
    pub document: Document,
}

/// Ingests one file and saves it into the library.
pub fn import(request: &ImportRequest) -> Result<Imported> {
    let filename = match request.original_filename {
        Some(name) => name.to_string(),
        None => request
            .input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::format(request.input, "input has no file name"))?,
    };

    let stem = Path::new(&filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let dir = resolve_output_path(request, &stem);
    let title = request.title.unwrap_or(&stem);

    let document = reader::ingest(request.input, &filename, title)?;
    store::save(&document, &dir)?;

    info!(
        "Converted {} sections{} to {}",
        document.spine.len(),
        if document.images.is_empty() {
            String::new()
        } else {
            format!(" and {} images", document.images.len())
        },
        dir.display()
    );

    Ok(Imported { dir, document })
}

fn resolve_output_path(request: &ImportRequest, stem: &str) -> PathBuf {
    match request.output {
        Some(path) => path.to_path_buf(),
        None => request.library.join(library::data_dir_name(stem)),
    }
}
