use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const DEFAULT_LANGUAGE: &str = "en";

/// Image payloads keyed by their reference inside the source document.
pub type ImageMap = BTreeMap<String, Vec<u8>>;

/// Shared metadata representation across all input formats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub language: String,
    /// Empty means the author is unknown.
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: String,
    pub identifiers: Vec<String>,
    pub subjects: Vec<String>,
}

impl Metadata {
    /// Metadata with every optional field empty. The publication date
    /// starts out as the processing timestamp.
    pub fn new(title: impl Into<String>, processed_at: &str) -> Self {
        Self {
            title: title.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            authors: Vec::new(),
            description: None,
            publisher: None,
            publication_date: processed_at.to_string(),
            identifiers: Vec::new(),
            subjects: Vec::new(),
        }
    }
}

/// One readable unit of the spine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub href: String,
    pub title: String,
    /// HTML suitable for direct display
    pub content: String,
    /// Plain text of `content`
    pub text: String,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocNode {
    pub title: String,
    /// Href of the target section. Empty or unmatched for group headings.
    pub file_href: String,
    pub children: Vec<TocNode>,
}

impl TocNode {
    pub fn new(title: impl Into<String>, file_href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            file_href: file_href.into(),
            children: Vec::new(),
        }
    }

    /// Spine index this node points at, if any.
    pub fn target(&self, index: &HashMap<&str, usize>) -> Option<usize> {
        if self.file_href.is_empty() {
            return None;
        }
        index.get(strip_fragment(&self.file_href)).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub metadata: Metadata,
    pub spine: Vec<Section>,
    pub toc: Vec<TocNode>,
    pub images: ImageMap,
    pub source_file: String,
    pub processed_at: String,
}

impl Document {
    /// Maps each section href to its spine index. Build it once and reuse
    /// it for every TOC lookup.
    pub fn href_index(&self) -> HashMap<&str, usize> {
        self.spine
            .iter()
            .enumerate()
            .map(|(i, section)| (strip_fragment(&section.href), i))
            .collect()
    }

    /// Verifies the spine invariants every extractor must uphold.
    pub fn check_invariants(&self) -> Result<()> {
        let fail =
            |reason: String| -> Result<()> { Err(Error::format(&self.source_file, reason)) };

        if self.metadata.title.trim().is_empty() {
            return fail("document title is empty".to_string());
        }
        if self.spine.is_empty() {
            return fail("no readable sections".to_string());
        }

        let mut ids = HashSet::new();
        for (i, section) in self.spine.iter().enumerate() {
            if section.order != i {
                return fail(format!(
                    "section {:?} has order {} at position {}",
                    section.id, section.order, i
                ));
            }
            if !ids.insert(section.id.as_str()) {
                return fail(format!("duplicate section id {:?}", section.id));
            }
            if section.title.trim().is_empty() {
                return fail(format!("section {:?} has no title", section.id));
            }
        }
        Ok(())
    }
}

/// Assembles a spine, assigning `order` from position and keeping ids unique.
#[derive(Debug, Default)]
pub struct SpineBuilder {
    sections: Vec<Section>,
    ids: HashSet<String>,
}

impl SpineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn push(
        &mut self,
        id: &str,
        href: impl Into<String>,
        title: impl Into<String>,
        content: String,
        text: String,
    ) -> usize {
        let order = self.sections.len();
        let id = self.unique_id(id);

        let title = title.into();
        let title = if title.trim().is_empty() {
            format!("Section {}", order + 1)
        } else {
            title.trim().to_string()
        };

        self.sections.push(Section {
            id,
            href: href.into(),
            title,
            content,
            text,
            order,
        });
        order
    }

    pub fn finish(self) -> Vec<Section> {
        self.sections
    }

    fn unique_id(&mut self, id: &str) -> String {
        let base = if id.trim().is_empty() {
            "section".to_string()
        } else {
            id.trim().to_string()
        };

        let mut candidate = base.clone();
        let mut n = 2;
        while self.ids.contains(&candidate) {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        self.ids.insert(candidate.clone());
        candidate
    }
}

/// Removes a trailing `#fragment` from an href.
pub fn strip_fragment(href: &str) -> &str {
    href.split('#').next().unwrap_or(href)
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// First non-blank candidate, or "Untitled".
pub(crate) fn choose_title<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or("Untitled")
        .to_string()
}
