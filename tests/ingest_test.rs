mod common;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use reader3::{ingest, ingest_at, store, Document, Error};
use std::fs;
use tempfile::TempDir;

fn assert_contiguous(document: &Document) {
    for (i, section) in document.spine.iter().enumerate() {
        assert_eq!(section.order, i, "section {} out of order", section.id);
    }
}

#[test]
fn test_epub_sections_toc_and_images() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.epub");
    common::write_epub(&path);

    let book = ingest(&path, "test.epub", "hint").expect("Failed to read EPUB");

    assert_eq!(book.metadata.title, "Test Book");
    assert_eq!(book.metadata.authors, ["Jane Doe"]);
    assert_eq!(book.metadata.language, "fr");
    assert_eq!(book.source_file, "test.epub");

    assert_eq!(book.spine.len(), 2);
    assert_contiguous(&book);
    assert_eq!(book.spine[0].href, "OEBPS/text/ch1.xhtml");
    assert_eq!(book.spine[1].href, "OEBPS/text/ch2.xhtml");
    assert_eq!(book.spine[0].title, "Chapter One");
    assert_eq!(book.spine[1].title, "Chapter Two");
    assert!(book.spine[0].content.contains("<p>It was a dark night.</p>"));
    assert!(book.spine[0].text.contains("It was a dark night."));
    assert!(!book.spine[0].text.contains("<p>"));

    assert_eq!(book.images.len(), 1);
    let (reference, data) = book.images.iter().next().unwrap();
    assert_eq!(reference.as_str(), "OEBPS/images/fig.png");
    assert_eq!(data.as_slice(), common::PNG_BYTES);
}

#[test]
fn test_epub_nested_toc_and_unmatched_entry() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.epub");
    common::write_epub(&path);

    let book = ingest(&path, "test.epub", "").unwrap();
    let index = book.href_index();

    let titles: Vec<_> = book.toc.iter().map(|node| node.title.as_str()).collect();
    assert_eq!(titles, ["Part One", "Chapter Two", "Lost Chapter"]);

    let part = &book.toc[0];
    assert_eq!(part.target(&index), None);
    assert_eq!(part.children.len(), 1);
    assert_eq!(part.children[0].title, "Chapter One");
    assert_eq!(part.children[0].target(&index), Some(0));

    assert_eq!(book.toc[1].target(&index), Some(1));
    assert!(book.toc[1].children.is_empty());
    // Points at a file that is not in the spine
    assert_eq!(book.toc[2].target(&index), None);
}

#[test]
fn test_epub_round_trip_keeps_images() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.epub");
    common::write_epub(&path);

    let book = ingest(&path, "test.epub", "").unwrap();
    let dir = temp.path().join("test_data");
    store::save(&book, &dir).unwrap();

    assert_eq!(store::load(&dir).unwrap(), book);
}

#[test]
fn test_broken_epub_is_format_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.epub");
    fs::write(&path, b"PK\x03\x04 definitely not an archive").unwrap();

    assert!(matches!(
        ingest(&path, "broken.epub", "Broken"),
        Err(Error::Format { .. })
    ));
}

#[test]
fn test_pdf_groups_pages_by_ten() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("report.pdf");
    common::write_pdf(&path, 25, None);

    let doc = ingest(&path, "report.pdf", "Quarterly Report").unwrap();

    let titles: Vec<_> = doc.spine.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["Pages 1-10", "Pages 11-20", "Pages 21-25"]);
    assert_contiguous(&doc);
    assert_eq!(doc.metadata.title, "Quarterly Report");
    assert_eq!(doc.metadata.authors, ["Unknown"]);
    assert!(doc.toc.is_empty());
    assert!(doc.images.is_empty());
}

#[test]
fn test_pdf_author_from_info() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("paper.pdf");
    common::write_pdf(&path, 3, Some("Grace Hopper"));

    let doc = ingest(&path, "paper.pdf", "").unwrap();

    assert_eq!(doc.metadata.authors, ["Grace Hopper"]);
    assert_eq!(doc.metadata.title, "paper");
    assert_eq!(doc.spine.len(), 1);
    assert_eq!(doc.spine[0].title, "Pages 1-3");
}

#[test]
fn test_pdf_without_pages_is_format_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("empty.pdf");
    common::write_pdf(&path, 0, None);

    assert!(matches!(
        ingest(&path, "empty.pdf", "Empty"),
        Err(Error::Format { .. })
    ));
}

#[test]
fn test_unreadable_pdf_is_format_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("fake.pdf");
    fs::write(&path, "this is not a pdf").unwrap();

    assert!(matches!(
        ingest(&path, "fake.pdf", "Fake"),
        Err(Error::Format { .. })
    ));
}

#[test]
fn test_markdown_title_heading_and_section() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("doc.md");
    fs::write(&path, "# Title\n\nIntro text\n\n## Section A\n\nBody A").unwrap();

    let doc = ingest(&path, "doc.md", "hint").unwrap();

    assert_eq!(doc.metadata.title, "Title");
    assert_eq!(doc.spine.len(), 2);
    assert_eq!(doc.spine[1].title, "Section A");
    assert_eq!(doc.spine[1].text, "Body A");
    assert_contiguous(&doc);
}

#[test]
fn test_markdown_invalid_utf8_is_format_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("latin1.md");
    fs::write(&path, [b'#', b' ', 0xE9, 0xFF, b'\n']).unwrap();

    assert!(matches!(
        ingest(&path, "latin1.md", "x"),
        Err(Error::Format { .. })
    ));
}

#[test]
fn test_unsupported_extension() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("notes.txt");
    fs::write(&path, "hello").unwrap();

    assert!(matches!(
        ingest(&path, "notes.txt", "Notes"),
        Err(Error::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_reprocessing_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let epub = temp.path().join("test.epub");
    common::write_epub(&epub);
    let markdown = temp.path().join("notes.md");
    fs::write(&markdown, "Lead\n\n# One\n\nfirst\n\n## Two\n\n| a |\n|---|\n| b |\n").unwrap();

    for (path, name) in [(&epub, "test.epub"), (&markdown, "notes.md")] {
        let first_dir = temp.path().join("first");
        let second_dir = temp.path().join("second");

        store::save(&ingest_at(path, name, "Hint", at).unwrap(), &first_dir).unwrap();
        store::save(&ingest_at(path, name, "Hint", at).unwrap(), &second_dir).unwrap();

        assert_eq!(
            fs::read(store::artifact_path(&first_dir)).unwrap(),
            fs::read(store::artifact_path(&second_dir)).unwrap(),
            "{} artifacts differ",
            name
        );
        fs::remove_dir_all(&first_dir).unwrap();
        fs::remove_dir_all(&second_dir).unwrap();
    }
}

#[test]
fn test_processed_at_is_injected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a.md");
    fs::write(&path, "text").unwrap();
    let at = Utc.with_ymd_and_hms(2020, 6, 15, 8, 30, 0).unwrap();

    let doc = ingest_at(&path, "a.md", "A", at).unwrap();

    assert_eq!(doc.processed_at, "2020-06-15T08:30:00Z");
    assert_eq!(doc.metadata.publication_date, "2020-06-15T08:30:00Z");
}
