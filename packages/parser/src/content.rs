//! Body-content tokenizer and its inverse projection.
//!
//! The tokenizer turns a raw text region into `Part`s: tables, lists
//! (recursively, since item content can hold nested lists and tables),
//! links, timestamps, completion cookies and plain text runs.
//! `attributed_string_to_raw_text` is the canonical projection back to
//! markup text and is total over every variant.

use crate::ast::{
    AttributedString, CheckboxState, ListData, ListItem, Part, TableCell, TableData, TableRow,
};
use crate::id_generator::IdGenerator;
use crate::timestamp::{render_timestamp, timestamp_from_captures, TIMESTAMP_PATTERN};
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<link>\[\[(?P<link_uri>[^\[\]]*)\](?:\[(?P<link_title>[^\[\]]*)\])?\])|(?P<ts>{})|(?P<fraction>\[(?P<frac_done>\d*)/(?P<frac_total>\d*)\])|(?P<percent>\[(?P<pct>\d*)%\])",
        TIMESTAMP_PATTERN
    ))
    .unwrap()
});

static LIST_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>[ \t]*)(?:(?P<bullet>[-+*])|(?P<number>\d+)(?P<term>[.)]))(?: (?P<rest>.*))?$")
        .unwrap()
});

static FORCE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[@(\d+)\] ?").unwrap());

static CHECKBOX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[( |X|x|-)\](?: +|$)").unwrap());

/// Parse inline markup only (links, timestamps, cookies, text).
/// Used for heading titles, table cells and property values.
pub fn parse_inline_markup(raw: &str, gen: &mut IdGenerator) -> AttributedString {
    let mut parts = Vec::new();
    let mut last = 0;

    for caps in INLINE_RE.captures_iter(raw) {
        let whole = caps.get(0).unwrap();
        if whole.start() > last {
            parts.push(Part::Text {
                contents: raw[last..whole.start()].to_string(),
            });
        }

        if caps.name("link").is_some() {
            parts.push(Part::Link {
                uri: caps["link_uri"].to_string(),
                title: caps.name("link_title").map(|m| m.as_str().to_string()),
            });
        } else if caps.name("ts").is_some() {
            parts.push(Part::Timestamp(timestamp_from_captures(
                &caps,
                gen.new_id(),
            )));
        } else if caps.name("fraction").is_some() {
            parts.push(Part::FractionCookie {
                done: caps["frac_done"].parse().ok(),
                total: caps["frac_total"].parse().ok(),
            });
        } else {
            parts.push(Part::PercentageCookie {
                percent: caps["pct"].parse().ok(),
            });
        }

        last = whole.end();
    }

    if last < raw.len() {
        parts.push(Part::Text {
            contents: raw[last..].to_string(),
        });
    }

    parts
}

/// Parse a raw text region into block and inline parts
pub fn parse_markup(raw: &str, gen: &mut IdGenerator) -> AttributedString {
    let lines: Vec<&str> = raw.split('\n').collect();
    let mut parts = Vec::new();
    let mut plain: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if is_table_line(line) {
            flush_plain(&mut plain, &mut parts, gen, true);
            let (table, consumed) = parse_table(&lines[i..], gen);
            parts.push(Part::Table(table));
            i += consumed;
        } else if is_list_line(line) {
            flush_plain(&mut plain, &mut parts, gen, true);
            let (list, consumed) = parse_list(&lines[i..], gen);
            parts.push(Part::List(list));
            i += consumed;
        } else {
            plain.push(line);
            i += 1;
        }
    }

    flush_plain(&mut plain, &mut parts, gen, false);
    parts
}

fn flush_plain(
    plain: &mut Vec<&str>,
    parts: &mut Vec<Part>,
    gen: &mut IdGenerator,
    block_follows: bool,
) {
    if plain.is_empty() {
        return;
    }
    let mut text = plain.join("\n");
    if block_follows {
        // restore the newline that separated the text from the block line
        text.push('\n');
    }
    plain.clear();
    if !text.is_empty() {
        parts.extend(parse_inline_markup(&text, gen));
    }
}

fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

fn is_list_line(line: &str) -> bool {
    match LIST_ITEM_RE.captures(line) {
        // an unindented `*` run is a heading, not a bullet
        Some(caps) => !(caps.name("bullet").map(|b| b.as_str()) == Some("*")
            && caps["indent"].is_empty()),
        None => false,
    }
}

fn parse_table(lines: &[&str], gen: &mut IdGenerator) -> (TableData, usize) {
    let id = gen.new_id();
    let mut rows = Vec::new();
    let mut consumed = 0;

    for line in lines {
        let trimmed = line.trim_start();
        if !trimmed.starts_with('|') {
            break;
        }
        consumed += 1;
        if trimmed.starts_with("|-") {
            // horizontal separator rows carry no data
            continue;
        }

        let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
        let inner = inner.strip_suffix('|').unwrap_or(inner);
        let row_id = gen.new_id();
        let cells = inner
            .split('|')
            .map(|raw| {
                let raw = raw.trim();
                TableCell {
                    id: gen.new_id(),
                    raw_contents: raw.to_string(),
                    contents: parse_inline_markup(raw, gen),
                }
            })
            .collect();
        rows.push(TableRow { id: row_id, cells });
    }

    // ragged source rows are padded so every row has the same cell count
    let width = rows.iter().map(|row| row.cells.len()).max().unwrap_or(0);
    for row in &mut rows {
        while row.cells.len() < width {
            row.cells.push(TableCell {
                id: gen.new_id(),
                raw_contents: String::new(),
                contents: Vec::new(),
            });
        }
    }

    (TableData { id, rows }, consumed)
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn parse_list(lines: &[&str], gen: &mut IdGenerator) -> (ListData, usize) {
    let first = LIST_ITEM_RE.captures(lines[0]).unwrap();
    let base_indent = first["indent"].len();
    let is_ordered = first.name("number").is_some();
    let bullet_character = first
        .name("bullet")
        .and_then(|b| b.as_str().chars().next())
        .unwrap_or('-');
    let number_terminator_character = first
        .name("term")
        .and_then(|t| t.as_str().chars().next())
        .unwrap_or('.');

    let id = gen.new_id();
    let mut items: Vec<ListItem> = Vec::new();
    // raw content lines of the item currently being built
    let mut pending: Vec<(String, Option<u32>)> = Vec::new();
    let mut content: Vec<Vec<&str>> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.trim().is_empty() {
            // a blank line stays in the list only when deeper content follows
            let next = lines[i + 1..].iter().find(|l| !l.trim().is_empty());
            match next {
                Some(l) if indent_width(l) > base_indent => {
                    if let Some(last) = content.last_mut() {
                        last.push(line);
                    }
                    i += 1;
                    continue;
                }
                _ => break,
            }
        }

        if is_list_line(line) && indent_width(line) == base_indent {
            pending.push(parse_item_head(line));
            content.push(Vec::new());
            i += 1;
            continue;
        }

        if indent_width(line) > base_indent && !pending.is_empty() {
            content.last_mut().unwrap().push(line);
            i += 1;
            continue;
        }

        break;
    }

    for ((head, force_number), content_lines) in pending.into_iter().zip(content) {
        let contents = parse_item_contents(&content_lines, gen);
        let (title_raw, is_checkbox, checkbox_state) = split_checkbox(&head);
        items.push(ListItem {
            id: gen.new_id(),
            title_line: parse_inline_markup(&title_raw, gen),
            contents,
            is_checkbox,
            checkbox_state,
            force_number,
        });
    }

    (
        ListData {
            id,
            is_ordered,
            bullet_character,
            number_terminator_character,
            items,
        },
        i,
    )
}

/// Split a bullet line into (rest-after-counter, force number)
fn parse_item_head(line: &str) -> (String, Option<u32>) {
    let caps = LIST_ITEM_RE.captures(line).unwrap();
    let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("");

    match FORCE_NUMBER_RE.captures(rest) {
        Some(counter) => {
            let force = counter[1].parse().ok();
            (rest[counter.get(0).unwrap().end()..].to_string(), force)
        }
        None => (rest.to_string(), None),
    }
}

fn split_checkbox(rest: &str) -> (String, bool, Option<CheckboxState>) {
    match CHECKBOX_RE.captures(rest) {
        Some(caps) => {
            let state = match &caps[1] {
                "X" | "x" => CheckboxState::Checked,
                "-" => CheckboxState::Partial,
                _ => CheckboxState::Unchecked,
            };
            let title = rest[caps.get(0).unwrap().end()..].to_string();
            (title, true, Some(state))
        }
        None => (rest.to_string(), false, None),
    }
}

fn parse_item_contents(content_lines: &[&str], gen: &mut IdGenerator) -> AttributedString {
    if content_lines.iter().all(|l| l.trim().is_empty()) {
        return Vec::new();
    }
    let dedent = content_lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_width(l))
        .min()
        .unwrap_or(0);
    let dedented: Vec<&str> = content_lines
        .iter()
        .map(|l| &l[dedent.min(indent_width(l))..])
        .collect();
    parse_markup(&dedented.join("\n"), gen)
}

/// Canonical projection of attributed content back to raw markup text
pub fn attributed_string_to_raw_text(parts: &[Part]) -> String {
    let mut out = String::new();
    for part in parts {
        render_part(part, &mut out);
    }
    out
}

fn render_part(part: &Part, out: &mut String) {
    match part {
        Part::Text { contents } => out.push_str(contents),

        Part::Link { uri, title } => match title {
            Some(title) => write!(out, "[[{}][{}]]", uri, title).unwrap(),
            None => write!(out, "[[{}]]", uri).unwrap(),
        },

        Part::Timestamp(ts) => out.push_str(&render_timestamp(ts)),

        Part::FractionCookie { done, total } => {
            let done = done.map(|d| d.to_string()).unwrap_or_default();
            let total = total.map(|t| t.to_string()).unwrap_or_default();
            write!(out, "[{}/{}]", done, total).unwrap();
        }

        Part::PercentageCookie { percent } => {
            let percent = percent.map(|p| p.to_string()).unwrap_or_default();
            write!(out, "[{}%]", percent).unwrap();
        }

        Part::Table(table) => render_table(table, out),

        Part::List(list) => render_list(list, out),
    }
}

/// Tables render column-aligned: each column is padded to the widest
/// rendered cell in that column across all rows.
fn render_table(table: &TableData, out: &mut String) {
    let rendered: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| attributed_string_to_raw_text(&cell.contents))
                .collect()
        })
        .collect();

    let columns = rendered.iter().map(|row| row.len()).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in &rendered {
        for (c, cell) in row.iter().enumerate() {
            widths[c] = widths[c].max(cell.chars().count());
        }
    }

    for row in &rendered {
        out.push('|');
        for (c, cell) in row.iter().enumerate() {
            let pad = widths[c] - cell.chars().count();
            out.push(' ');
            out.push_str(cell);
            for _ in 0..pad {
                out.push(' ');
            }
            out.push_str(" |");
        }
        out.push('\n');
    }
}

fn render_list(list: &ListData, out: &mut String) {
    // a `*` bullet at column 0 would read back as a heading
    let base_indent = if !list.is_ordered && list.bullet_character == '*' {
        " "
    } else {
        ""
    };
    let mut counter = 0u32;

    for item in &list.items {
        counter = item.force_number.unwrap_or(counter + 1);

        let bullet = if list.is_ordered {
            format!("{}{}", counter, list.number_terminator_character)
        } else {
            list.bullet_character.to_string()
        };

        out.push_str(base_indent);
        out.push_str(&bullet);
        out.push(' ');
        if let Some(force) = item.force_number {
            write!(out, "[@{}] ", force).unwrap();
        }
        if item.is_checkbox {
            let marker = match item.checkbox_state {
                Some(CheckboxState::Checked) => "[X]",
                Some(CheckboxState::Partial) => "[-]",
                _ => "[ ]",
            };
            out.push_str(marker);
            out.push(' ');
        }
        out.push_str(&attributed_string_to_raw_text(&item.title_line));
        out.push('\n');

        if !item.contents.is_empty() {
            let content_indent = format!("{}{}", base_indent, " ".repeat(bullet.len() + 1));
            let content = attributed_string_to_raw_text(&item.contents);
            for line in content.split('\n') {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(&content_indent);
                    out.push_str(line);
                    out.push('\n');
                }
            }
            // the content block's own trailing newline was just emitted
            if content.ends_with('\n') {
                out.pop();
            }
        }
    }
}
