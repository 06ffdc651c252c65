use pulldown_cmark::{Event, Options, Parser, TagEnd};

pub fn html_to_markdown(html: &str) -> String {
    clean_markdown(&html2md::rewrite_html(html, false))
}

pub fn markdown_to_text(md: &str) -> String {
    let mut text = String::new();

    for event in Parser::new_ext(md, Options::ENABLE_TABLES) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Heading(_)) => {
                text.push_str("\n\n");
            }
            Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock)
            | Event::End(TagEnd::BlockQuote(_))
            | Event::End(TagEnd::TableHead)
            | Event::End(TagEnd::TableRow) => text.push('\n'),
            Event::End(TagEnd::TableCell) => text.push('\t'),
            _ => {}
        }
    }

    clean_markdown(&text)
}

pub fn clean_markdown(md: &str) -> String {
    let mut result = md.to_string();

    // Trim trailing whitespace per line
    result = result
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");

    // Collapse 3+ consecutive newlines to 2
    while result.contains("\n\n\n") {
        result = result.replace("\n\n\n", "\n\n");
    }

    // Ensure single trailing newline
    let trimmed = result.trim().to_string();
    if trimmed.is_empty() {
        String::new()
    } else {
        trimmed + "\n"
    }
}

/// First `# ` heading of a Markdown document.
pub fn extract_title_from_markdown(md: &str) -> Option<String> {
    for line in md.lines() {
        let trimmed = line.trim();
        if let Some(title) = trimmed.strip_prefix("# ") {
            let title = title.trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}
