use crate::document::Metadata;

/// Markdown header describing a document, for terminal display.
pub fn format_metadata(metadata: &Metadata) -> String {
    let mut lines = Vec::new();

    lines.push(format!("# {}", metadata.title));
    lines.push(String::new());

    if metadata.authors.is_empty() {
        lines.push("**Author:** Unknown Author".to_string());
    } else {
        lines.push(format!("**Author:** {}", metadata.authors.join(", ")));
    }

    if let Some(publisher) = &metadata.publisher {
        lines.push(format!("**Publisher:** {}", publisher));
    }

    lines.push(format!("**Language:** {}", metadata.language));
    lines.push(format!("**Published:** {}", metadata.publication_date));

    if !metadata.identifiers.is_empty() {
        lines.push(format!("**Identifiers:** {}", metadata.identifiers.join(", ")));
    }

    if !metadata.subjects.is_empty() {
        lines.push(format!("**Subjects:** {}", metadata.subjects.join(", ")));
    }

    if let Some(description) = &metadata.description {
        lines.push(String::new());
        lines.push(format!("> {}", description.trim()));
    }

    lines.push(String::new());
    lines.push("---".to_string());

    lines.join("\n") + "\n"
}
