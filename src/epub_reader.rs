use crate::document::{self, choose_title, strip_fragment, Document, ImageMap, SpineBuilder, TocNode};
use crate::error::{Error, Result};
use crate::markdown;
use crate::reader::Source;
use rbook::prelude::*;
use rbook::Epub;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct EpubData {
    epub: Epub,
    path: PathBuf,
}

struct RawChapter {
    href: String,
    html_content: String,
}

impl EpubData {
    pub fn open(path: &Path) -> Result<Self> {
        let epub = Epub::options()
            .strict(false)
            .open(path)
            .map_err(|e| Error::format(path, format!("not a readable EPUB archive: {}", e)))?;
        Ok(Self {
            epub,
            path: path.to_path_buf(),
        })
    }

    fn chapters(&self) -> Result<Vec<RawChapter>> {
        let mut chapters = Vec::new();
        let mut reader = self.epub.reader();

        while let Some(result) = reader.read_next() {
            let data = result
                .map_err(|e| Error::format(&self.path, format!("failed to read chapter content: {}", e)))?;
            let html_content = data.content().to_string();

            // Skip empty or near-empty content
            if html_content.trim().is_empty() {
                continue;
            }

            let key = data.manifest_entry().resource().key().value().map(archive_path);
            let href = key.unwrap_or_default();

            chapters.push(RawChapter { href, html_content });
        }

        Ok(chapters)
    }

    /// Navigation entries in document order, paired with their depth.
    fn toc_entries(&self) -> Vec<(usize, TocNode)> {
        let Some(root) = self.epub.toc().contents() else {
            return Vec::new();
        };

        root.children()
            .flatten()
            .map(|entry| {
                let href = entry
                    .resource()
                    .and_then(|r| r.key().value().map(|v| archive_path(strip_fragment(v))))
                    .unwrap_or_default();
                (entry.depth(), TocNode::new(entry.label().trim(), href))
            })
            .collect()
    }

    fn images(&self) -> Result<ImageMap> {
        let mut images = ImageMap::new();
        for entry in self.epub.manifest().images() {
            // Get the resource path from the manifest entry
            let href = archive_path(entry.resource().key().value().unwrap_or("unknown"));

            let bytes = entry
                .read_bytes()
                .map_err(|e| Error::format(&self.path, format!("failed to read image {}: {}", href, e)))?;

            images.insert(href, bytes);
        }

        Ok(images)
    }

    fn metadata(&self, source: &Source) -> document::Metadata {
        let meta = self.epub.metadata();
        let package_title = meta.title().map(|t| t.value().to_string());
        let title = choose_title([
            package_title.as_deref(),
            Some(source.title_hint),
            Some(source.file_stem()),
        ]);

        let mut metadata = document::Metadata::new(title, source.processed_at);
        metadata.authors = meta
            .creators()
            .map(|c| c.value().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if let Some(language) = meta.languages().next() {
            let language = language.value().trim();
            if !language.is_empty() {
                metadata.language = language.to_string();
            }
        }
        metadata.description = meta.descriptions().next().map(|d| d.value().to_string());
        metadata.publisher = meta.publishers().next().map(|p| p.value().to_string());
        metadata.identifiers = meta.identifiers().map(|i| i.value().to_string()).collect();
        metadata.subjects = meta.tags().map(|t| t.value().to_string()).collect();
        metadata
    }
}

pub fn extract(source: &Source) -> Result<Document> {
    let epub = EpubData::open(source.path)?;

    let toc_entries = epub.toc_entries();
    let mut toc_titles: HashMap<&str, &str> = HashMap::new();
    for (_, node) in &toc_entries {
        if !node.file_href.is_empty() {
            toc_titles.entry(node.file_href.as_str()).or_insert(node.title.as_str());
        }
    }

    let mut spine = SpineBuilder::new();
    for chapter in epub.chapters()? {
        let md = markdown::html_to_markdown(&chapter.html_content);
        let text = markdown::markdown_to_text(&md);

        let title = toc_titles
            .get(strip_fragment(&chapter.href))
            .map(|t| t.to_string())
            .or_else(|| markdown::extract_title_from_markdown(&md))
            .unwrap_or_default();

        let id = Path::new(&chapter.href)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let order = spine.push(&id, chapter.href, title, chapter.html_content, text);
        debug!(order, "Extracted EPUB chapter");
    }

    if spine.is_empty() {
        return Err(Error::format(source.path, "no readable content documents in the spine"));
    }

    let document = Document {
        metadata: epub.metadata(source),
        spine: spine.finish(),
        toc: build_toc_tree(toc_entries),
        images: epub.images()?,
        source_file: source.filename.to_string(),
        processed_at: source.processed_at.to_string(),
    };
    document.check_invariants()?;
    Ok(document)
}

/// rbook resolves resources to absolute keys (`/OEBPS/ch1.xhtml`); the
/// model keeps the path as stored in the archive.
fn archive_path(key: &str) -> String {
    key.trim_start_matches('/').to_string()
}

/// Rebuilds a tree from depth-first `(depth, node)` pairs.
fn build_toc_tree(entries: Vec<(usize, TocNode)>) -> Vec<TocNode> {
    let mut roots = Vec::new();
    let mut stack: Vec<(usize, TocNode)> = Vec::new();

    for (depth, node) in entries {
        close_deeper(&mut stack, &mut roots, depth);
        stack.push((depth, node));
    }
    close_deeper(&mut stack, &mut roots, 0);

    roots
}

fn close_deeper(stack: &mut Vec<(usize, TocNode)>, roots: &mut Vec<TocNode>, depth: usize) {
    while stack.last().is_some_and(|(d, _)| *d >= depth) {
        if let Some((_, node)) = stack.pop() {
            match stack.last_mut() {
                Some((_, parent)) => parent.children.push(node),
                None => roots.push(node),
            }
        }
    }
}
