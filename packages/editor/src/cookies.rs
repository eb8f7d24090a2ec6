//! Checkbox advancement with upward cascade.
//!
//! Only leaf checkbox items can be toggled directly. After a toggle, every
//! ancestor list item re-derives its own state from its direct checkbox
//! children (all checked, none checked, or partial) and refreshes the
//! cookies in its title line. The owning heading's cookies are recomputed
//! last, so a `[/]` on the heading tracks its body checkboxes.

pub(crate) use orgdown_parser::cookies::recompute_cookies_at;

use orgdown_parser::ast::{CheckboxState, Document, ListItem, Part};
use orgdown_parser::content::attributed_string_to_raw_text;
use orgdown_parser::cookies::{checkbox_counts, update_cookie_parts};

use crate::mutations::MutationError;

/// Toggle a leaf checkbox and cascade the state change upward.
pub(crate) fn advance_checkbox(doc: &mut Document, list_item_id: &str) -> Result<(), MutationError> {
    let index = (0..doc.headings.len())
        .find(|&i| contains_item(&doc.headings[i].description, list_item_id))
        .ok_or_else(|| MutationError::ListItemNotFound(list_item_id.to_string()))?;

    toggle_in_parts(&mut doc.headings[index].description, list_item_id)?;

    let heading = &mut doc.headings[index];
    heading.raw_description = attributed_string_to_raw_text(&heading.description);
    recompute_cookies_at(doc, index);
    Ok(())
}

fn contains_item(parts: &[Part], target: &str) -> bool {
    parts.iter().any(|part| {
        if let Part::List(list) = part {
            list.items
                .iter()
                .any(|item| item.id == target || contains_item(&item.contents, target))
        } else {
            false
        }
    })
}

/// Returns Ok(true) once the target has been toggled somewhere below.
fn toggle_in_parts(parts: &mut [Part], target: &str) -> Result<bool, MutationError> {
    for part in parts {
        let Part::List(list) = part else { continue };
        for item in &mut list.items {
            if item.id == target {
                if !item.is_checkbox {
                    return Err(MutationError::NotALeafCheckbox(target.to_string()));
                }
                let (_, child_total) = checkbox_counts(&item.contents);
                if child_total > 0 {
                    return Err(MutationError::NotALeafCheckbox(target.to_string()));
                }
                item.checkbox_state = Some(match item.checkbox_state {
                    Some(CheckboxState::Checked) => CheckboxState::Unchecked,
                    _ => CheckboxState::Checked,
                });
                return Ok(true);
            }
            if toggle_in_parts(&mut item.contents, target)? {
                refresh_parent_item(item);
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Re-derive an ancestor item's checkbox state and title cookies from its
/// direct checkbox children.
fn refresh_parent_item(item: &mut ListItem) {
    let (done, total) = checkbox_counts(&item.contents);
    if total == 0 {
        return;
    }
    if item.is_checkbox {
        item.checkbox_state = Some(if done == total {
            CheckboxState::Checked
        } else if done == 0 {
            CheckboxState::Unchecked
        } else {
            CheckboxState::Partial
        });
    }
    update_cookie_parts(&mut item.title_line, done, total);
}
