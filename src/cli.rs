use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Normalize EPUB, PDF and Markdown files into a readable library
#[derive(Parser, Debug)]
#[command(name = "reader3", version, about)]
pub struct Cli {
    /// Library directory holding one `<name>_data` folder per document
    #[arg(short, long, global = true, env = "READER3_LIBRARY", default_value = ".")]
    pub library: PathBuf,

    /// Show debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process a document and add it to the library
    Ingest {
        /// Path to an .epub, .pdf, .md or .markdown file
        input: PathBuf,

        /// Title to use when the document does not provide one.
        /// Defaults to the file name without extension.
        #[arg(short, long)]
        title: Option<String>,

        /// Artifact directory. Defaults to `<library>/<name>_data`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the documents in the library
    List,

    /// Show metadata, table of contents and sections of a document
    Show {
        /// Library id, e.g. `my-book_data`
        id: String,
    },

    /// Print one section of a document
    Read {
        /// Library id, e.g. `my-book_data`
        id: String,

        /// Zero-based section index
        #[arg(default_value_t = 0)]
        index: usize,

        /// Print the HTML content instead of plain text
        #[arg(long, default_value_t = false)]
        html: bool,
    },
}
