use crate::document::Document;
use crate::error::{Error, Result};
use crate::store;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

/// Directory-name suffix that marks a persisted document.
pub const DATA_DIR_SUFFIX: &str = "_data";

/// One library entry, enough to list a document without opening it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSummary {
    /// Name of the document's directory under the library root
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub section_count: usize,
}

impl BookSummary {
    fn new(id: String, document: &Document) -> Self {
        Self {
            id,
            title: document.metadata.title.clone(),
            authors: document.metadata.authors.clone(),
            section_count: document.spine.len(),
        }
    }

    pub fn author_line(&self) -> String {
        if self.authors.is_empty() {
            "Unknown Author".to_string()
        } else {
            self.authors.join(", ")
        }
    }
}

/// Directory name for a document imported from a file called `base_name`.
pub fn data_dir_name(base_name: &str) -> String {
    format!("{}{}", base_name, DATA_DIR_SUFFIX)
}

/// Lists every loadable document under `root`, ordered by directory name.
/// Entries that fail to load are logged and skipped.
pub fn scan(root: &Path) -> Result<Vec<BookSummary>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(root, e)),
    };

    let mut dirs: Vec<(String, std::path::PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            name.ends_with(DATA_DIR_SUFFIX).then(|| (name, entry.path()))
        })
        .collect();
    dirs.sort();

    let mut books = Vec::new();
    for (id, path) in dirs {
        match store::load(&path) {
            Ok(document) => books.push(BookSummary::new(id, &document)),
            Err(e) => warn!(id = %id, "Skipping library entry: {}", e),
        }
    }

    Ok(books)
}

/// Loads one document by its library id. Unlike [`scan`], every failure
/// is returned to the caller.
pub fn open(root: &Path, id: &str) -> Result<Document> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(Error::NotFound {
            path: root.join(id),
        });
    }
    store::load(&root.join(id))
}
