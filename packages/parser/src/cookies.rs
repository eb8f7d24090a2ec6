//! Completion-cookie recomputation.
//!
//! A heading's `[n/m]` and `[n%]` cookies reflect its children's completion
//! state. The eligible children are the todo-bearing direct subheadings
//! when any exist, otherwise the direct checkbox items of the lists in the
//! heading's own body. Recomputation is idempotent and runs after parsing
//! and after every mutation that can change a child's completion state or a
//! parent's child set.

use crate::ast::{AttributedString, CheckboxState, Document, Part};
use crate::content::attributed_string_to_raw_text;

/// Recompute the cookies in the heading's title and re-derive its raw title
pub fn recompute_cookies_at(doc: &mut Document, index: usize) {
    let todo_children: Vec<usize> = doc
        .direct_subheading_indices(index)
        .into_iter()
        .filter(|&i| doc.headings[i].title_line.todo_keyword.is_some())
        .collect();

    let (done, total) = if !todo_children.is_empty() {
        let total = todo_children.len() as u32;
        let done = todo_children
            .iter()
            .filter(|&&i| {
                doc.headings[i]
                    .title_line
                    .todo_keyword
                    .as_deref()
                    .is_some_and(|k| doc.is_completed_keyword(k))
            })
            .count() as u32;
        (done, total)
    } else {
        checkbox_counts(&doc.headings[index].description)
    };

    let heading = &mut doc.headings[index];
    update_cookie_parts(&mut heading.title_line.title, done, total);
    heading.title_line.raw_title = attributed_string_to_raw_text(&heading.title_line.title);
}

/// (checked, total) over the direct checkbox items of top-level lists
pub fn checkbox_counts(parts: &[Part]) -> (u32, u32) {
    let mut done = 0;
    let mut total = 0;
    for part in parts {
        if let Part::List(list) = part {
            for item in &list.items {
                if item.is_checkbox {
                    total += 1;
                    if item.checkbox_state == Some(CheckboxState::Checked) {
                        done += 1;
                    }
                }
            }
        }
    }
    (done, total)
}

/// Rewrite every cookie part in place from the given counts
pub fn update_cookie_parts(parts: &mut AttributedString, done: u32, total: u32) {
    for part in parts {
        match part {
            Part::FractionCookie {
                done: d,
                total: t,
            } => {
                *d = Some(done);
                *t = Some(total);
            }
            Part::PercentageCookie { percent } => {
                *percent = Some(if total == 0 { 0 } else { done * 100 / total });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_parse_computes_parent_cookie() {
        let doc = parse("* Parent [/]\n** TODO One\n** DONE Two\n");
        assert_eq!(doc.headings[0].title_line.raw_title, "Parent [1/2]");
    }

    #[test]
    fn test_percentage_cookie() {
        let doc = parse("* Parent [%]\n** DONE One\n** TODO Two\n** TODO Three\n");
        assert_eq!(doc.headings[0].title_line.raw_title, "Parent [33%]");
    }

    #[test]
    fn test_percentage_cookie_without_children() {
        let doc = parse("* Parent [%]\n");
        assert_eq!(doc.headings[0].title_line.raw_title, "Parent [0%]");
    }

    #[test]
    fn test_checkbox_fallback_when_no_todo_children() {
        let doc = parse("* Parent [/]\n- [X] one\n- [ ] two\n- plain item\n");
        assert_eq!(doc.headings[0].title_line.raw_title, "Parent [1/2]");
    }

    #[test]
    fn test_todo_children_win_over_checkboxes() {
        let doc = parse("* Parent [/]\n- [X] box\n** TODO Child\n");
        assert_eq!(doc.headings[0].title_line.raw_title, "Parent [0/1]");
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut doc = parse("* Parent [/]\n** DONE One\n** TODO Two\n");
        let once = doc.clone();
        recompute_cookies_at(&mut doc, 0);
        assert_eq!(once, doc);
    }
}
