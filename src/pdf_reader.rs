use crate::document::{self, choose_title, Document, ImageMap, Section, SpineBuilder};
use crate::error::{Error, Result};
use crate::reader::Source;
use chrono::NaiveDate;
use lopdf::Object;
use tracing::{debug, warn};

/// Consecutive pages folded into one section.
pub const PAGES_PER_SECTION: usize = 10;

const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Default)]
struct PdfInfo {
    title: Option<String>,
    author: Option<String>,
    subject: Option<String>,
    keywords: Option<String>,
    creation_date: Option<String>,
}

pub fn extract(source: &Source) -> Result<Document> {
    let pdf = lopdf::Document::load(source.path)
        .map_err(|e| Error::format(source.path, format!("cannot open PDF: {}", e)))?;

    let pages = page_texts(&pdf);
    if pages.is_empty() {
        return Err(Error::format(source.path, "document has no pages"));
    }
    debug!(pages = pages.len(), "Extracted PDF page text");

    let info = read_info(&pdf);
    let document = Document {
        metadata: build_metadata(&info, source),
        spine: group_pages(&pages),
        toc: Vec::new(),
        images: ImageMap::new(),
        source_file: source.filename.to_string(),
        processed_at: source.processed_at.to_string(),
    };
    document.check_invariants()?;
    Ok(document)
}

/// Text of every page in page order. Pages without extractable text
/// (scans, unsupported encodings) come back empty.
fn page_texts(pdf: &lopdf::Document) -> Vec<String> {
    pdf.get_pages()
        .keys()
        .map(|&number| match pdf.extract_text(&[number]) {
            Ok(text) => text.trim_end().to_string(),
            Err(e) => {
                warn!(page = number, "No text extracted from PDF page: {}", e);
                String::new()
            }
        })
        .collect()
}

/// Folds pages into sections of `PAGES_PER_SECTION`, the last one shorter.
fn group_pages(pages: &[String]) -> Vec<Section> {
    let mut spine = SpineBuilder::new();

    for (index, chunk) in pages.chunks(PAGES_PER_SECTION).enumerate() {
        let first = index * PAGES_PER_SECTION + 1;
        let last = first + chunk.len() - 1;
        let href = format!("pages-{}-{}", first, last);

        let text = chunk.join("\n\n");
        let content = format!(
            "<div class=\"pdf-pages\" style=\"white-space: pre-wrap;\">{}</div>",
            escape_html(&text)
        );

        spine.push(&href, href.clone(), format!("Pages {}-{}", first, last), content, text);
    }

    spine.finish()
}

fn build_metadata(info: &PdfInfo, source: &Source) -> document::Metadata {
    let title = choose_title([
        Some(source.title_hint),
        info.title.as_deref(),
        Some(source.file_stem()),
    ]);

    let mut metadata = document::Metadata::new(title, source.processed_at);
    metadata.authors = match info.author.as_deref().map(str::trim) {
        Some(author) if !author.is_empty() => vec![author.to_string()],
        _ => vec![UNKNOWN_AUTHOR.to_string()],
    };
    metadata.subjects = info
        .subject
        .iter()
        .chain(info.keywords.iter())
        .flat_map(|s| s.split([',', ';']))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if let Some(date) = info.creation_date.as_deref().and_then(parse_pdf_date) {
        metadata.publication_date = date;
    }
    metadata
}

fn read_info(pdf: &lopdf::Document) -> PdfInfo {
    let info = match pdf.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => pdf.get_object(*id).ok(),
        Ok(object) => Some(object),
        Err(_) => None,
    };

    let Some(Object::Dictionary(dict)) = info else {
        return PdfInfo::default();
    };

    let get_string = |key: &[u8]| -> Option<String> {
        match dict.get(key).ok()? {
            Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
            _ => None,
        }
    };

    PdfInfo {
        title: get_string(b"Title"),
        author: get_string(b"Author"),
        subject: get_string(b"Subject"),
        keywords: get_string(b"Keywords"),
        creation_date: get_string(b"CreationDate"),
    }
}

/// PDF text strings are UTF-16BE when they carry a BOM, otherwise
/// PDFDocEncoding, which is close enough to Latin-1 for metadata.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
}

/// `D:YYYYMMDDHHmmSS...` to `YYYY-MM-DD`. Month and day default to 1.
fn parse_pdf_date(raw: &str) -> Option<String> {
    let digits: String = raw
        .trim()
        .trim_start_matches("D:")
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.len() < 4 {
        return None;
    }

    let field = |range: std::ops::Range<usize>, default: u32| -> Option<u32> {
        match digits.get(range) {
            Some(s) => s.parse().ok(),
            None => Some(default),
        }
    };
    let year = digits[..4].parse().ok()?;
    let month = field(4..6, 1)?;
    let day = field(6..8, 1)?;

    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
