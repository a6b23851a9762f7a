//! Rendering a [`NoteRecord`] as markdown with a metadata header.

use std::fmt::Write as _;

use super::NoteRecord;

/// Characters that force a header value into double quotes.
const YAML_SPECIAL: &[char] = &[
    ':', '#', '[', ']', '{', '}', '|', '>', '&', '*', '!', ',', '\'', '"', '?', '@', '`',
];

/// Quotes a header value when it contains YAML-significant characters or
/// starts with `-`, `%` or a space.
#[must_use]
pub fn escape_yaml(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    if value.contains(YAML_SPECIAL) || value.starts_with(['-', '%', ' ']) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        return format!("\"{escaped}\"");
    }
    value.to_string()
}

fn push_list<'a>(out: &mut String, key: &str, items: impl IntoIterator<Item = &'a str>) {
    let _ = writeln!(out, "{key}:");
    for item in items {
        let _ = writeln!(out, "  - {}", escape_yaml(item));
    }
}

/// Renders `note` as a complete markdown document.
///
/// Header fields appear in a fixed order; `published_date` is omitted when
/// unknown.
#[must_use]
pub fn render_note(note: &NoteRecord) -> String {
    let mut out = String::from("---\n");

    push_list(&mut out, "type", [note.content_type.as_str()]);
    let _ = writeln!(out, "title: {}", escape_yaml(&note.title));
    let _ = writeln!(out, "link: {}", note.link);
    let _ = writeln!(out, "source: {}", note.source);
    push_list(&mut out, "author", note.authors.iter().map(String::as_str));
    let _ = writeln!(out, "description: {}", escape_yaml(&note.description));
    if note.related_to.is_empty() {
        out.push_str("related_to:\n");
    } else {
        let _ = writeln!(out, "related_to: {}", escape_yaml(&note.related_to));
    }
    push_list(&mut out, "category", note.category.iter().map(String::as_str));
    push_list(&mut out, "tags", note.tags.iter().map(String::as_str));
    let _ = writeln!(out, "created: {}", note.created);
    if let Some(published) = &note.published_date {
        let _ = writeln!(out, "published_date: {published}");
    }

    out.push_str("---\n\n");
    out.push_str(&note.body);
    out.push('\n');
    out
}
