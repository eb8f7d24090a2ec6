//! Markup parser: raw text in, `Document` out.
//!
//! The parser is total: malformed constructs degrade to plain text and
//! input with no matchable heading line yields an empty heading list. It
//! never returns an error.

use crate::ast::{
    default_keyword_set, Document, Heading, LogEntry, PlanningItem, PlanningType,
    PropertyListItem, Timestamp, TitleLine, TodoKeywordSet,
};
use crate::content::{attributed_string_to_raw_text, parse_inline_markup, parse_markup};
use crate::id_generator::IdGenerator;
use crate::timestamp::{timestamp_from_captures, TIMESTAMP_PATTERN};
use regex::Regex;
use std::sync::LazyLock;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\*+) (.*)$").unwrap());

static TODO_CONFIG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\+(?:TODO|TYP_TODO):\s*(.*)$").unwrap());

static TAGS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +(:(?:[^\s:]+:)+) *$").unwrap());

static PLANNING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(SCHEDULED|DEADLINE|CLOSED):\s*{}",
        TIMESTAMP_PATTERN
    ))
    .unwrap()
});

static PROPERTY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*:([^:\s]+):(?:\s+(.*))?$").unwrap());

static INLINE_TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TIMESTAMP_PATTERN).unwrap());

/// Parse a complete source text into a `Document`
pub fn parse(source: &str) -> Document {
    let mut gen = IdGenerator::new(source);
    let keyword_sets = parse_keyword_sets(source);
    let headings = parse_headings(source, &keyword_sets, &mut gen);

    let mut doc = Document {
        headings,
        todo_keyword_sets: keyword_sets,
        id_generator: gen,
    };
    for index in 0..doc.headings.len() {
        crate::cookies::recompute_cookies_at(&mut doc, index);
    }
    doc
}

/// Parse a fragment into standalone headings using an existing document's
/// keyword configuration and id mint. Used for capture insertion.
pub fn parse_headings(
    source: &str,
    keyword_sets: &[TodoKeywordSet],
    gen: &mut IdGenerator,
) -> Vec<Heading> {
    let lines: Vec<&str> = source.split('\n').collect();

    // heading boundaries: (line index, level, title text)
    let mut bounds: Vec<(usize, usize, &str)> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = HEADING_RE.captures(line) {
            bounds.push((i, caps[1].len(), caps.get(2).unwrap().as_str()));
        }
    }

    let mut headings = Vec::with_capacity(bounds.len());
    for (b, &(start, level, title_raw)) in bounds.iter().enumerate() {
        let end = bounds
            .get(b + 1)
            .map(|&(next, _, _)| next)
            .unwrap_or(lines.len());
        let section = &lines[start + 1..end];
        headings.push(parse_heading(title_raw, level, section, keyword_sets, gen));
    }

    headings
}

/// `#+TODO:`/`#+TYP_TODO:` lines in the preamble (before the first heading);
/// absent any, the builtin TODO/DONE cycle applies
fn parse_keyword_sets(source: &str) -> Vec<TodoKeywordSet> {
    let mut sets = Vec::new();

    for line in source.split('\n') {
        if HEADING_RE.is_match(line) {
            break;
        }
        if let Some(caps) = TODO_CONFIG_RE.captures(line) {
            sets.push(parse_todo_config(line, &caps[1], sets.is_empty()));
        }
    }

    if sets.is_empty() {
        sets.push(default_keyword_set());
    }
    sets
}

fn parse_todo_config(config_line: &str, body: &str, default: bool) -> TodoKeywordSet {
    let mut keywords = Vec::new();
    let mut completed_from = None;

    for word in body.split_whitespace() {
        if word == "|" {
            completed_from = Some(keywords.len());
            continue;
        }
        // strip fast-access selectors like TODO(t!)
        let keyword = word.split('(').next().unwrap_or(word);
        if !keyword.is_empty() {
            keywords.push(keyword.to_string());
        }
    }

    // without a separator the last keyword is the completed one
    let completed_from = completed_from.unwrap_or_else(|| keywords.len().saturating_sub(1));
    let completed_keywords = keywords[completed_from..].to_vec();

    TodoKeywordSet {
        keywords,
        completed_keywords,
        config_line: config_line.to_string(),
        default,
    }
}

fn parse_heading(
    title_raw: &str,
    level: usize,
    section: &[&str],
    keyword_sets: &[TodoKeywordSet],
    gen: &mut IdGenerator,
) -> Heading {
    let id = gen.new_id();
    let title_line = parse_title_line(title_raw, keyword_sets, gen);

    let mut idx = 0;

    let mut planning_items = Vec::new();
    while idx < section.len() && is_planning_line(section[idx]) {
        for caps in PLANNING_RE.captures_iter(section[idx]) {
            let kind = match &caps[1] {
                "SCHEDULED" => PlanningType::Scheduled,
                "DEADLINE" => PlanningType::Deadline,
                _ => PlanningType::Closed,
            };
            let timestamp = timestamp_from_captures(&caps, gen.new_id());
            planning_items.push(PlanningItem {
                id: gen.new_id(),
                kind,
                timestamp,
            });
        }
        idx += 1;
    }

    let mut property_list_items = Vec::new();
    if idx < section.len() && section[idx].trim() == ":PROPERTIES:" {
        idx += 1;
        while idx < section.len() && section[idx].trim() != ":END:" {
            if let Some(caps) = PROPERTY_RE.captures(section[idx]) {
                property_list_items.push(PropertyListItem {
                    property: caps[1].to_string(),
                    value: parse_inline_markup(
                        caps.get(2).map(|m| m.as_str()).unwrap_or(""),
                        gen,
                    ),
                });
            }
            idx += 1;
        }
        if idx < section.len() {
            idx += 1; // :END:
        }
    }

    let mut log_book_entries = Vec::new();
    if idx < section.len() && section[idx].trim() == ":LOGBOOK:" {
        idx += 1;
        while idx < section.len() && section[idx].trim() != ":END:" {
            log_book_entries.push(parse_log_entry(section[idx], gen));
            idx += 1;
        }
        if idx < section.len() {
            idx += 1; // :END:
        }
    }

    let rest = &section[idx..];
    let raw_description = if rest.iter().all(|l| l.is_empty()) {
        String::new()
    } else {
        let mut raw = rest.join("\n");
        raw.push('\n');
        raw
    };
    let description = parse_markup(&raw_description, gen);

    Heading {
        id,
        nesting_level: level,
        title_line,
        planning_items,
        property_list_items,
        log_book_entries,
        description,
        raw_description,
        opened: false,
    }
}

fn is_planning_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    ["SCHEDULED:", "DEADLINE:", "CLOSED:"]
        .iter()
        .any(|kw| trimmed.starts_with(kw))
        && PLANNING_RE.is_match(line)
}

fn parse_log_entry(line: &str, gen: &mut IdGenerator) -> LogEntry {
    let trimmed = line.trim_start();
    if trimmed.starts_with("CLOCK:") {
        let stamps: Vec<Timestamp> = INLINE_TIMESTAMP_RE
            .captures_iter(line)
            .map(|caps| timestamp_from_captures(&caps, gen.new_id()))
            .collect();
        let mut stamps = stamps.into_iter();
        if let Some(start) = stamps.next() {
            return LogEntry::Clock {
                id: gen.new_id(),
                start,
                end: stamps.next(),
                raw: line.to_string(),
            };
        }
    }
    LogEntry::Note {
        id: gen.new_id(),
        raw: line.to_string(),
    }
}

/// Sub-parse of a heading's title text: leading todo keyword (only when it
/// belongs to a configured set), trailing `:tag:tag:` group, inline markup
/// in what remains. `raw_title` is set to the canonical projection of the
/// parsed title.
pub fn parse_title_line(
    raw: &str,
    keyword_sets: &[TodoKeywordSet],
    gen: &mut IdGenerator,
) -> TitleLine {
    let mut rest = raw;

    let mut tags = Vec::new();
    if let Some(caps) = TAGS_RE.captures(rest) {
        tags = caps[1]
            .split(':')
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect();
        rest = &rest[..caps.get(0).unwrap().start()];
    }

    let mut todo_keyword = None;
    if let Some(first) = rest.split_whitespace().next() {
        if keyword_sets.iter().any(|set| set.contains(first)) && rest.starts_with(first) {
            todo_keyword = Some(first.to_string());
            rest = rest[first.len()..].strip_prefix(' ').unwrap_or("");
        }
    }

    let title = parse_inline_markup(rest, gen);
    let raw_title = attributed_string_to_raw_text(&title);

    TitleLine {
        todo_keyword,
        tags,
        raw_title,
        title,
    }
}
