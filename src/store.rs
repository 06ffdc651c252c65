//! On-disk form of a [`Document`].
//!
//! Each document owns one directory holding `book.json` and an optional
//! `images/` folder. `book.json` starts with a format name and version so a
//! reader can reject artifacts it does not understand instead of misparsing
//! them.

use crate::document::{Document, Metadata, Section, TocNode};
use crate::error::{Error, Result};
use crate::image::{self, StoredImage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ARTIFACT_FILE: &str = "book.json";
pub const FORMAT_NAME: &str = "reader3-document";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct ArtifactRef<'a> {
    format: &'a str,
    format_version: u32,
    source_file: &'a str,
    processed_at: &'a str,
    metadata: &'a Metadata,
    spine: &'a [Section],
    toc: &'a [TocNode],
    images: Vec<StoredImage>,
}

#[derive(Deserialize)]
struct Header {
    format: String,
    format_version: u32,
}

#[derive(Deserialize)]
struct Artifact {
    source_file: String,
    processed_at: String,
    metadata: Metadata,
    spine: Vec<Section>,
    toc: Vec<TocNode>,
    images: Vec<StoredImage>,
}

pub fn artifact_path(dir: &Path) -> PathBuf {
    dir.join(ARTIFACT_FILE)
}

/// Writes `document` into `dir`, replacing any previous artifact there.
pub fn save(document: &Document, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let images = image::write_images(&document.images, dir)?;
    let artifact = ArtifactRef {
        format: FORMAT_NAME,
        format_version: FORMAT_VERSION,
        source_file: &document.source_file,
        processed_at: &document.processed_at,
        metadata: &document.metadata,
        spine: &document.spine,
        toc: &document.toc,
        images,
    };

    let mut json = serde_json::to_vec_pretty(&artifact).map_err(|e| {
        Error::io(dir, std::io::Error::new(ErrorKind::InvalidData, e))
    })?;
    json.push(b'\n');

    // Only book.json is replaced by rename. Images are rewritten in place
    // first, so an interrupted save can leave an artifact whose images no
    // longer match; load reports that as corrupt.
    let path = artifact_path(dir);
    let tmp = dir.join(format!("{}.tmp", ARTIFACT_FILE));
    fs::write(&tmp, &json).map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, &path).map_err(|e| Error::io(&path, e))?;

    info!(
        path = %path.display(),
        sections = document.spine.len(),
        images = document.images.len(),
        "Saved document"
    );
    Ok(())
}

/// Reads the artifact in `dir`.
///
/// Returns [`Error::NotFound`] when there is none and
/// [`Error::CorruptArtifact`] when it cannot be decoded.
pub fn load(dir: &Path) -> Result<Document> {
    let path = artifact_path(dir);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            return Err(Error::NotFound { path })
        }
        Err(e) => return Err(Error::io(&path, e)),
    };

    let header: Header = serde_json::from_slice(&bytes)
        .map_err(|e| Error::corrupt(&path, format!("unreadable header: {}", e)))?;
    if header.format != FORMAT_NAME {
        return Err(Error::corrupt(&path, format!("unknown format {:?}", header.format)));
    }
    if header.format_version != FORMAT_VERSION {
        return Err(Error::corrupt(
            &path,
            format!(
                "format version {} is not supported (expected {})",
                header.format_version, FORMAT_VERSION
            ),
        ));
    }

    let artifact: Artifact =
        serde_json::from_slice(&bytes).map_err(|e| Error::corrupt(&path, e))?;

    let document = Document {
        metadata: artifact.metadata,
        spine: artifact.spine,
        toc: artifact.toc,
        images: image::read_images(&artifact.images, dir)?,
        source_file: artifact.source_file,
        processed_at: artifact.processed_at,
    };

    document.check_invariants().map_err(|e| match e {
        Error::Format { reason, .. } => Error::corrupt(&path, reason),
        other => other,
    })?;

    debug!(path = %path.display(), "Loaded document");
    Ok(document)
}
