use crate::document::{self, choose_title, Document, ImageMap, SpineBuilder};
use crate::error::{Error, Result};
use crate::reader::Source;
use pulldown_cmark::{html, Options, Parser};
use std::fs;

const INTRODUCTION: &str = "Introduction";

/// A run of lines that ends where the next split heading begins.
struct Block<'a> {
    /// `None` for the content before the first heading.
    heading: Option<String>,
    lines: Vec<&'a str>,
}

impl Block<'_> {
    fn slice(&self) -> String {
        self.lines.concat()
    }
}

struct Outline<'a> {
    blocks: Vec<Block<'a>>,
    /// Text of the first heading, if it is level one.
    leading_title: Option<String>,
}

pub fn extract(source: &Source) -> Result<Document> {
    let bytes = fs::read(source.path).map_err(|e| Error::io(source.path, e))?;
    let input = String::from_utf8(bytes)
        .map_err(|e| Error::format(source.path, format!("not valid UTF-8 text: {}", e)))?;
    let input = input.strip_prefix('\u{feff}').unwrap_or(&input);

    let document = build_document(input, source);
    document.check_invariants()?;
    Ok(document)
}

fn build_document(input: &str, source: &Source) -> Document {
    let outline = split_headings(input);

    let title = match outline.leading_title.as_deref() {
        Some(heading) => heading.to_string(),
        None => choose_title([Some(source.title_hint), Some(source.file_stem())]),
    };

    let mut spine = SpineBuilder::new();
    let has_headings = outline.blocks.iter().any(|b| b.heading.is_some());

    if !has_headings {
        push_section(&mut spine, &title, input.to_string(), render_html(input));
    } else {
        for block in &outline.blocks {
            let slice = block.slice();
            let section_title = match &block.heading {
                Some(heading) => heading.as_str(),
                None if slice.trim().is_empty() => continue,
                None => INTRODUCTION,
            };
            let html = render_html(&slice);
            push_section(&mut spine, section_title, slice.trim().to_string(), html);
        }
    }

    Document {
        metadata: document::Metadata::new(title, source.processed_at),
        spine: spine.finish(),
        toc: Vec::new(),
        images: ImageMap::new(),
        source_file: source.filename.to_string(),
        processed_at: source.processed_at.to_string(),
    }
}

fn push_section(spine: &mut SpineBuilder, title: &str, text: String, content: String) {
    let id = format!("section-{}", spine.len());
    spine.push(&id, id.clone(), title, content, text);
}

/// Splits at level one and two ATX headings outside fenced code.
fn split_headings(input: &str) -> Outline<'_> {
    let mut blocks = vec![Block {
        heading: None,
        lines: Vec::new(),
    }];
    let mut leading_title = None;
    let mut seen_heading = false;
    let mut fence: Option<(char, usize)> = None;

    for line in input.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);

        if let Some(marker) = fence_marker(bare) {
            fence = match fence {
                None => Some(marker),
                Some((c, len)) if marker.0 == c && marker.1 >= len => None,
                open => open,
            };
        } else if fence.is_none() {
            if let Some((level, text)) = split_heading(bare) {
                if !seen_heading && level == 1 && !text.is_empty() {
                    leading_title = Some(text.to_string());
                }
                seen_heading = true;
                blocks.push(Block {
                    heading: Some(text.to_string()),
                    lines: Vec::new(),
                });
                continue;
            }
        }

        if let Some(block) = blocks.last_mut() {
            block.lines.push(line);
        }
    }

    Outline {
        blocks,
        leading_title,
    }
}

/// `# Title` or `## Title`. Deeper levels and `#tag` are not split points.
fn split_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 2 {
        return None;
    }

    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }

    Some((level, strip_closing_hashes(rest.trim())))
}

/// Drops an optional closing `##` sequence, which must follow a space.
fn strip_closing_hashes(text: &str) -> &str {
    let without = text.trim_end_matches('#');
    if without.is_empty() {
        ""
    } else if without.ends_with([' ', '\t']) {
        without.trim_end()
    } else {
        text
    }
}

fn fence_marker(line: &str) -> Option<(char, usize)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let trimmed = &line[indent..];
    let c = trimmed.chars().next().filter(|&c| c == '`' || c == '~')?;
    let len = trimmed.chars().take_while(|&x| x == c).count();
    (len >= 3).then_some((c, len))
}

fn render_html(md: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(md, options));
    out
}
