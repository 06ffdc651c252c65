mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use reader3::converter::{self, ImportRequest};
use reader3::{library, metadata, Document, TocNode};
use std::collections::HashMap;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    match &cli.command {
        Command::Ingest {
            input,
            title,
            output,
        } => {
            let imported = converter::import(&ImportRequest {
                input,
                original_filename: None,
                title: title.as_deref(),
                output: output.as_deref(),
                library: &cli.library,
            })
            .with_context(|| format!("Failed to import {}", input.display()))?;
            println!(
                "Processed: {} -> {}",
                imported.document.metadata.title,
                imported.dir.display()
            );
        }
        Command::List => list(&cli.library)?,
        Command::Show { id } => show(&open(&cli.library, id)?),
        Command::Read { id, index, html } => read(&open(&cli.library, id)?, *index, *html)?,
    }

    Ok(())
}

fn open(library_root: &Path, id: &str) -> Result<Document> {
    library::open(library_root, id).with_context(|| format!("Could not load book {}", id))
}

fn list(library_root: &Path) -> Result<()> {
    let mut books = library::scan(library_root)
        .with_context(|| format!("Failed to scan {}", library_root.display()))?;

    if books.is_empty() {
        println!("No books in the library yet. Add one with `reader3 ingest <file>`.");
        return Ok(());
    }

    books.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
    for book in &books {
        println!("{}", book.title);
        println!("  {}", book.author_line());
        println!("  {} sections  [{}]", book.section_count, book.id);
    }
    Ok(())
}

fn show(document: &Document) {
    print!("{}", metadata::format_metadata(&document.metadata));

    let index = document.href_index();
    if !document.toc.is_empty() {
        println!("\n## Table of Contents\n");
        print_toc(&document.toc, &index, 0);
    }

    println!("\n## Sections\n");
    for section in &document.spine {
        println!("{:>4}. {}", section.order, section.title);
    }
}

fn print_toc(nodes: &[TocNode], index: &HashMap<&str, usize>, depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        match node.target(index) {
            Some(i) => println!("{}- {} (section {})", indent, node.title, i),
            None => println!("{}- {}", indent, node.title),
        }
        print_toc(&node.children, index, depth + 1);
    }
}

fn read(document: &Document, index: usize, html: bool) -> Result<()> {
    let Some(section) = document.spine.get(index) else {
        bail!(
            "Section {} not found ({} has {} sections)",
            index,
            document.metadata.title,
            document.spine.len()
        );
    };

    println!("Section {} of {}: {}\n", index + 1, document.spine.len(), section.title);
    if html {
        println!("{}", section.content);
    } else {
        println!("{}", section.text);
    }
    Ok(())
}
