use crate::document::ImageMap;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Sub-directory of an artifact holding image payloads.
pub const IMAGES_DIR: &str = "images";

/// Where one image payload lives inside an artifact directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    /// Key in [`ImageMap`]
    pub reference: String,
    /// File name under `images/`
    pub file: String,
    pub size: u64,
}

/// Writes every image under `output_dir/images/`, replacing whatever was
/// there. Files are numbered in map order so the same map always yields the
/// same names.
pub fn write_images(images: &ImageMap, output_dir: &Path) -> Result<Vec<StoredImage>> {
    let images_dir = output_dir.join(IMAGES_DIR);
    if images_dir.exists() {
        fs::remove_dir_all(&images_dir).map_err(|e| Error::io(&images_dir, e))?;
    }

    if images.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(&images_dir).map_err(|e| Error::io(&images_dir, e))?;

    let mut stored = Vec::with_capacity(images.len());
    for (index, (reference, data)) in images.iter().enumerate() {
        let file = format!("{:04}-{}", index, clean_filename(reference));
        let dest = images_dir.join(&file);

        fs::write(&dest, data).map_err(|e| Error::io(&dest, e))?;

        stored.push(StoredImage {
            reference: reference.clone(),
            file,
            size: data.len() as u64,
        });
    }

    Ok(stored)
}

/// Reads back the payloads listed in an artifact. Missing, misplaced or
/// resized files mean the artifact is corrupt.
pub fn read_images(stored: &[StoredImage], output_dir: &Path) -> Result<ImageMap> {
    let images_dir = output_dir.join(IMAGES_DIR);
    let mut images = ImageMap::new();

    for entry in stored {
        if entry.file.is_empty() || entry.file.contains(['/', '\\']) || entry.file.starts_with('.') {
            return Err(Error::corrupt(
                output_dir,
                format!("invalid image file name {:?}", entry.file),
            ));
        }

        let path = images_dir.join(&entry.file);
        let data = fs::read(&path).map_err(|e| {
            Error::corrupt(output_dir, format!("cannot read image {}: {}", entry.file, e))
        })?;

        if data.len() as u64 != entry.size {
            return Err(Error::corrupt(
                output_dir,
                format!(
                    "image {} is {} bytes, expected {}",
                    entry.file,
                    data.len(),
                    entry.size
                ),
            ));
        }

        images.insert(entry.reference.clone(), data);
    }

    Ok(images)
}

fn clean_filename(href: &str) -> String {
    Path::new(href)
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .filter(|f| !f.starts_with('.'))
        .unwrap_or_else(|| "image.bin".to_string())
}
