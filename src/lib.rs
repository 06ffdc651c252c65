//! Normalizes EPUB, PDF and Markdown documents into one reading model.
//!
//! Each source is turned into a [`Document`]: metadata, an ordered spine of
//! [`Section`]s and an optional table of contents. Documents are saved as
//! one directory per document with [`store::save`], reloaded with
//! [`store::load`], and listed with [`library::scan`].
//!
//! ```no_run
//! use std::path::Path;
//!
//! let document = reader3::ingest(Path::new("book.epub"), "book.epub", "Book")?;
//! reader3::store::save(&document, Path::new("library/book_data"))?;
//! for summary in reader3::library::scan(Path::new("library"))? {
//!     println!("{} ({} sections)", summary.title, summary.section_count);
//! }
//! # Ok::<(), reader3::Error>(())
//! ```

pub mod converter;
pub mod document;
pub mod epub_reader;
pub mod error;
pub mod image;
pub mod library;
pub mod markdown;
pub mod markdown_reader;
pub mod metadata;
pub mod pdf_reader;
pub mod reader;
pub mod store;

pub use document::{Document, ImageMap, Metadata, Section, TocNode};
pub use error::{Error, Result};
pub use library::BookSummary;
pub use reader::{ingest, ingest_at, SourceFormat};
