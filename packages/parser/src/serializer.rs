//! Serializer: the parser's structural inverse.
//!
//! Emission depends only on the canonical structured fields, never on
//! `raw_title`/`raw_description`, so serialize-then-parse is idempotent.

use crate::ast::{Document, Heading};
use crate::content::attributed_string_to_raw_text;
use crate::timestamp::render_timestamp;

/// Serialize a `Document` back to markup text
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();

    let config_lines: Vec<&str> = doc
        .todo_keyword_sets
        .iter()
        .filter(|set| !set.config_line.is_empty())
        .map(|set| set.config_line.as_str())
        .collect();
    for line in &config_lines {
        out.push_str(line);
        out.push('\n');
    }
    if !config_lines.is_empty() {
        out.push('\n');
    }

    for heading in &doc.headings {
        serialize_heading(heading, &mut out);
    }

    out
}

fn serialize_heading(heading: &Heading, out: &mut String) {
    for _ in 0..heading.nesting_level {
        out.push('*');
    }
    out.push(' ');

    if let Some(keyword) = &heading.title_line.todo_keyword {
        out.push_str(keyword);
        out.push(' ');
    }

    out.push_str(&attributed_string_to_raw_text(&heading.title_line.title));

    if !heading.title_line.tags.is_empty() {
        out.push_str(" :");
        out.push_str(&heading.title_line.tags.join(":"));
        out.push(':');
    }
    out.push('\n');

    if !heading.planning_items.is_empty() {
        let rendered: Vec<String> = heading
            .planning_items
            .iter()
            .map(|item| format!("{}: {}", item.kind.keyword(), render_timestamp(&item.timestamp)))
            .collect();
        out.push_str(&rendered.join(" "));
        out.push('\n');
    }

    if !heading.property_list_items.is_empty() {
        out.push_str(":PROPERTIES:\n");
        for item in &heading.property_list_items {
            out.push(':');
            out.push_str(&item.property);
            out.push(':');
            let value = attributed_string_to_raw_text(&item.value);
            if !value.is_empty() {
                out.push(' ');
                out.push_str(&value);
            }
            out.push('\n');
        }
        out.push_str(":END:\n");
    }

    if !heading.log_book_entries.is_empty() {
        out.push_str(":LOGBOOK:\n");
        for entry in &heading.log_book_entries {
            out.push_str(entry.raw());
            out.push('\n');
        }
        out.push_str(":END:\n");
    }

    let body = attributed_string_to_raw_text(&heading.description);
    out.push_str(&body);
    if !body.is_empty() && !body.ends_with('\n') {
        out.push('\n');
    }
}
