//! # Document mutations
//!
//! High-level semantic operations on outline documents.
//!
//! Every mutation is a synchronous, total value transform: `apply_mutation`
//! takes the current `Document` and returns a new one. A mutation that
//! references a missing id, an invalid reorder target or an out-of-range
//! index returns the input unchanged — the UI may race user actions against
//! an already-stale id (a heading just deleted), so resolution failures are
//! policy, not errors.
//!
//! ## Structural rules
//!
//! - Reorders move a heading *and its whole contiguous subtree* as one block.
//! - Indent/outdent adjust `nesting_level` on the affected range; outdent is
//!   clamped at level 1; indent opens the new parent so the moved heading
//!   stays visible.
//! - Any operation that can change a child's completion state or a parent's
//!   child set recomputes the affected parents' completion cookies.

use crate::cookies::{advance_checkbox, recompute_cookies_at};
use crate::table::{self, TableEdit};
use orgdown_parser::ast::{Document, Heading, Part, PlanningItem, PlanningType, Timestamp};
use orgdown_parser::content::attributed_string_to_raw_text;
use orgdown_parser::{parse_headings, parse_markup, parse_title_line};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Where a dragged heading lands relative to its target sibling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropPosition {
    Above,
    Below,
}

/// Semantic mutations (intent-preserving operations)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Swap a heading's block with its previous sibling's block
    MoveUp { heading_id: String },

    /// Swap a heading's block with its next sibling's block
    MoveDown { heading_id: String },

    /// Splice a heading's block before/after an arbitrary same-level sibling
    MoveToPosition {
        heading_id: String,
        target_id: String,
        position: DropPosition,
    },

    /// Outdent a single heading (children are left in place)
    MoveLeft { heading_id: String },

    /// Indent a single heading under the nearest eligible parent
    MoveRight { heading_id: String },

    /// Outdent a heading together with all its descendants
    MoveSubtreeLeft { heading_id: String },

    /// Indent a heading together with all its descendants
    MoveSubtreeRight { heading_id: String },

    /// Create an empty heading as the last child of a parent
    AddHeading { parent_id: String },

    /// Delete a heading and its whole subtree as one block
    RemoveHeading { heading_id: String },

    /// Cycle the todo keyword through its keyword set, wrapping to none
    AdvanceTodo { heading_id: String },

    /// Re-parse a user-entered title line
    UpdateTitle {
        heading_id: String,
        raw_title: String,
    },

    /// Re-parse a user-entered body
    UpdateDescription {
        heading_id: String,
        raw_description: String,
    },

    /// Flip a heading's fold state
    ToggleOpened { heading_id: String },

    /// Recompute a heading's completion cookies from its children
    RecomputeCookies { heading_id: String },

    /// Toggle a leaf checkbox and cascade state/cookies up ancestor items
    AdvanceCheckbox { list_item_id: String },

    InsertTableRow { cell_id: String },
    RemoveTableRow { cell_id: String },
    InsertTableColumn { cell_id: String },
    RemoveTableColumn { cell_id: String },
    MoveTableRowUp { cell_id: String },
    MoveTableRowDown { cell_id: String },
    MoveTableColumnLeft { cell_id: String },
    MoveTableColumnRight { cell_id: String },
    SetCellValue { cell_id: String, value: String },

    /// Parse a fragment and splice it as a child of the path-addressed parent
    InsertCapture {
        target_path: Vec<String>,
        content: String,
        prepend: bool,
    },

    /// Replace the timestamp with the given id, wherever it lives
    SetTimestamp {
        timestamp_id: String,
        timestamp: Timestamp,
    },

    /// Replace (or create) a planning item's timestamp by planning type
    SetPlanningTimestamp {
        heading_id: String,
        kind: PlanningType,
        timestamp: Timestamp,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("heading not found: {0}")]
    HeadingNotFound(String),

    #[error("list item not found: {0}")]
    ListItemNotFound(String),

    #[error("table cell not found: {0}")]
    CellNotFound(String),

    #[error("timestamp not found: {0}")]
    TimestampNotFound(String),

    #[error("no sibling in that direction")]
    NoSibling,

    #[error("target is not a same-level sibling: {0}")]
    InvalidTarget(String),

    #[error("path did not resolve")]
    PathNotFound,

    #[error("fragment contained no headings")]
    NothingToInsert,

    #[error("row or column index out of range")]
    OutOfRange,

    #[error("item is not a leaf checkbox: {0}")]
    NotALeafCheckbox(String),
}

/// Apply a mutation, returning the new document.
///
/// On any resolution failure the input document is returned unchanged.
pub fn apply_mutation(doc: &Document, mutation: &Mutation) -> Document {
    let mut next = doc.clone();
    match mutation.apply(&mut next) {
        Ok(()) => next,
        Err(err) => {
            debug!(?mutation, %err, "mutation rejected");
            doc.clone()
        }
    }
}

impl Mutation {
    /// Apply in place; callers wanting the no-op policy use `apply_mutation`
    pub fn apply(&self, doc: &mut Document) -> Result<(), MutationError> {
        match self {
            Mutation::MoveUp { heading_id } => apply_move_up(doc, heading_id),
            Mutation::MoveDown { heading_id } => apply_move_down(doc, heading_id),
            Mutation::MoveToPosition {
                heading_id,
                target_id,
                position,
            } => apply_move_to_position(doc, heading_id, target_id, *position),
            Mutation::MoveLeft { heading_id } => apply_indent(doc, heading_id, false, -1),
            Mutation::MoveRight { heading_id } => apply_indent(doc, heading_id, false, 1),
            Mutation::MoveSubtreeLeft { heading_id } => apply_indent(doc, heading_id, true, -1),
            Mutation::MoveSubtreeRight { heading_id } => apply_indent(doc, heading_id, true, 1),
            Mutation::AddHeading { parent_id } => apply_add_heading(doc, parent_id),
            Mutation::RemoveHeading { heading_id } => apply_remove_heading(doc, heading_id),
            Mutation::AdvanceTodo { heading_id } => apply_advance_todo(doc, heading_id),
            Mutation::UpdateTitle {
                heading_id,
                raw_title,
            } => apply_update_title(doc, heading_id, raw_title),
            Mutation::UpdateDescription {
                heading_id,
                raw_description,
            } => apply_update_description(doc, heading_id, raw_description),
            Mutation::ToggleOpened { heading_id } => {
                let heading = doc
                    .heading_mut(heading_id)
                    .ok_or_else(|| MutationError::HeadingNotFound(heading_id.clone()))?;
                heading.opened = !heading.opened;
                Ok(())
            }
            Mutation::RecomputeCookies { heading_id } => {
                let index = resolve(doc, heading_id)?;
                recompute_cookies_at(doc, index);
                Ok(())
            }
            Mutation::AdvanceCheckbox { list_item_id } => advance_checkbox(doc, list_item_id),
            Mutation::InsertTableRow { cell_id } => table::edit(doc, cell_id, TableEdit::InsertRow),
            Mutation::RemoveTableRow { cell_id } => table::edit(doc, cell_id, TableEdit::RemoveRow),
            Mutation::InsertTableColumn { cell_id } => {
                table::edit(doc, cell_id, TableEdit::InsertColumn)
            }
            Mutation::RemoveTableColumn { cell_id } => {
                table::edit(doc, cell_id, TableEdit::RemoveColumn)
            }
            Mutation::MoveTableRowUp { cell_id } => table::edit(doc, cell_id, TableEdit::MoveRowUp),
            Mutation::MoveTableRowDown { cell_id } => {
                table::edit(doc, cell_id, TableEdit::MoveRowDown)
            }
            Mutation::MoveTableColumnLeft { cell_id } => {
                table::edit(doc, cell_id, TableEdit::MoveColumnLeft)
            }
            Mutation::MoveTableColumnRight { cell_id } => {
                table::edit(doc, cell_id, TableEdit::MoveColumnRight)
            }
            Mutation::SetCellValue { cell_id, value } => {
                table::edit(doc, cell_id, TableEdit::SetValue(value.clone()))
            }
            Mutation::InsertCapture {
                target_path,
                content,
                prepend,
            } => apply_insert_capture(doc, target_path, content, *prepend),
            Mutation::SetTimestamp {
                timestamp_id,
                timestamp,
            } => apply_set_timestamp(doc, timestamp_id, timestamp),
            Mutation::SetPlanningTimestamp {
                heading_id,
                kind,
                timestamp,
            } => apply_set_planning_timestamp(doc, heading_id, *kind, timestamp),
        }
    }
}

fn resolve(doc: &Document, heading_id: &str) -> Result<usize, MutationError> {
    doc.heading_index(heading_id)
        .ok_or_else(|| MutationError::HeadingNotFound(heading_id.to_string()))
}

fn apply_move_up(doc: &mut Document, heading_id: &str) -> Result<(), MutationError> {
    let index = resolve(doc, heading_id)?;
    let prev = doc.previous_sibling(index).ok_or(MutationError::NoSibling)?;
    let parent = doc.parent(index);
    let end = doc.subtree_range(index).end;

    // the previous sibling's block is exactly prev..index by contiguity
    doc.headings[prev..end].rotate_left(index - prev);

    if let Some(parent) = parent {
        recompute_cookies_at(doc, parent);
    }
    Ok(())
}

fn apply_move_down(doc: &mut Document, heading_id: &str) -> Result<(), MutationError> {
    let index = resolve(doc, heading_id)?;
    let next = doc.next_sibling(index).ok_or(MutationError::NoSibling)?;
    let parent = doc.parent(index);
    let next_end = doc.subtree_range(next).end;

    doc.headings[index..next_end].rotate_left(next - index);

    if let Some(parent) = parent {
        recompute_cookies_at(doc, parent);
    }
    Ok(())
}

fn apply_move_to_position(
    doc: &mut Document,
    heading_id: &str,
    target_id: &str,
    position: DropPosition,
) -> Result<(), MutationError> {
    let source = resolve(doc, heading_id)?;
    let target = resolve(doc, target_id)?;
    if source == target {
        return Err(MutationError::InvalidTarget(target_id.to_string()));
    }
    // only same-level siblings under the same parent are valid drop targets
    if doc.headings[source].nesting_level != doc.headings[target].nesting_level
        || doc.parent(source) != doc.parent(target)
    {
        return Err(MutationError::InvalidTarget(target_id.to_string()));
    }

    let parent = doc.parent(source);
    let range = doc.subtree_range(source);
    let block: Vec<Heading> = doc.headings.drain(range).collect();

    // target may have shifted after the drain
    let target = doc
        .heading_index(target_id)
        .ok_or_else(|| MutationError::HeadingNotFound(target_id.to_string()))?;
    let at = match position {
        DropPosition::Above => target,
        DropPosition::Below => doc.subtree_range(target).end,
    };
    doc.headings.splice(at..at, block);

    if let Some(parent) = parent {
        recompute_cookies_at(doc, parent);
    }
    Ok(())
}

fn apply_indent(
    doc: &mut Document,
    heading_id: &str,
    whole_subtree: bool,
    delta: i32,
) -> Result<(), MutationError> {
    let index = resolve(doc, heading_id)?;
    if delta < 0 && doc.headings[index].nesting_level == 1 {
        // outdent is clamped at level 1
        return Ok(());
    }

    let old_parent = doc.parent(index);
    let range = if whole_subtree {
        doc.subtree_range(index)
    } else {
        index..index + 1
    };
    for i in range {
        let level = &mut doc.headings[i].nesting_level;
        *level = (*level as i32 + delta).max(1) as usize;
    }

    let new_parent = doc.parent(index);
    if delta > 0 {
        if let Some(new_parent) = new_parent {
            // keep the indented heading visible
            doc.headings[new_parent].opened = true;
        }
    }

    for parent in [old_parent, new_parent].into_iter().flatten() {
        recompute_cookies_at(doc, parent);
    }
    Ok(())
}

fn apply_add_heading(doc: &mut Document, parent_id: &str) -> Result<(), MutationError> {
    let parent = resolve(doc, parent_id)?;
    let level = doc.headings[parent].nesting_level + 1;
    let id = doc.id_generator.new_id();
    let at = doc.subtree_range(parent).end;

    doc.headings.insert(at, Heading::empty(id, level));
    recompute_cookies_at(doc, parent);
    Ok(())
}

fn apply_remove_heading(doc: &mut Document, heading_id: &str) -> Result<(), MutationError> {
    let index = resolve(doc, heading_id)?;
    let parent = doc.parent(index);

    let range = doc.subtree_range(index);
    doc.headings.drain(range);

    if let Some(parent) = parent {
        recompute_cookies_at(doc, parent);
    }
    Ok(())
}

fn apply_advance_todo(doc: &mut Document, heading_id: &str) -> Result<(), MutationError> {
    let index = resolve(doc, heading_id)?;
    let current = doc.headings[index].title_line.todo_keyword.clone();
    let set = doc.keyword_set_for(current.as_deref());

    let next = match &current {
        None => set.keywords.first().cloned(),
        Some(keyword) => match set.keywords.iter().position(|k| k == keyword) {
            Some(i) if i + 1 < set.keywords.len() => Some(set.keywords[i + 1].clone()),
            // past the last keyword the cycle wraps to none
            _ => None,
        },
    };

    doc.headings[index].title_line.todo_keyword = next;

    if let Some(parent) = doc.parent(index) {
        recompute_cookies_at(doc, parent);
    }
    Ok(())
}

fn apply_update_title(
    doc: &mut Document,
    heading_id: &str,
    raw_title: &str,
) -> Result<(), MutationError> {
    let index = resolve(doc, heading_id)?;
    let mut gen = doc.id_generator.clone();
    let title_line = parse_title_line(raw_title, &doc.todo_keyword_sets, &mut gen);
    doc.id_generator = gen;
    doc.headings[index].title_line = title_line;

    // the new title may carry a cookie, and a keyword change moves the
    // parent's done count
    recompute_cookies_at(doc, index);
    if let Some(parent) = doc.parent(index) {
        recompute_cookies_at(doc, parent);
    }
    Ok(())
}

fn apply_update_description(
    doc: &mut Document,
    heading_id: &str,
    raw_description: &str,
) -> Result<(), MutationError> {
    let index = resolve(doc, heading_id)?;
    let mut gen = doc.id_generator.clone();
    let description = parse_markup(raw_description, &mut gen);
    doc.id_generator = gen;

    let heading = &mut doc.headings[index];
    heading.description = description;
    heading.raw_description = attributed_string_to_raw_text(&heading.description);

    // checkbox fallback counts may have changed
    recompute_cookies_at(doc, index);
    Ok(())
}

fn apply_insert_capture(
    doc: &mut Document,
    target_path: &[String],
    content: &str,
    prepend: bool,
) -> Result<(), MutationError> {
    let parent = doc
        .heading_index_by_path(target_path)
        .ok_or(MutationError::PathNotFound)?;

    let mut gen = doc.id_generator.clone();
    let mut fragment = parse_headings(content, &doc.todo_keyword_sets, &mut gen);
    if fragment.is_empty() {
        return Err(MutationError::NothingToInsert);
    }
    doc.id_generator = gen;

    // re-level the fragment so its root sits directly under the parent
    let base = fragment[0].nesting_level;
    let target_level = doc.headings[parent].nesting_level + 1;
    for heading in &mut fragment {
        let shifted = heading.nesting_level as i32 - base as i32 + target_level as i32;
        heading.nesting_level = shifted.max(1) as usize;
    }

    let at = if prepend {
        parent + 1
    } else {
        doc.subtree_range(parent).end
    };
    doc.headings.splice(at..at, fragment);

    recompute_cookies_at(doc, parent);
    Ok(())
}

fn apply_set_timestamp(
    doc: &mut Document,
    timestamp_id: &str,
    timestamp: &Timestamp,
) -> Result<(), MutationError> {
    for index in 0..doc.headings.len() {
        let heading = &mut doc.headings[index];

        for item in &mut heading.planning_items {
            if item.timestamp.id == timestamp_id {
                item.timestamp = with_id(timestamp, timestamp_id);
                return Ok(());
            }
        }

        for item in &mut heading.property_list_items {
            if replace_timestamp_in_parts(&mut item.value, timestamp_id, timestamp) {
                return Ok(());
            }
        }

        if replace_timestamp_in_parts(&mut heading.title_line.title, timestamp_id, timestamp) {
            heading.title_line.raw_title =
                attributed_string_to_raw_text(&heading.title_line.title);
            return Ok(());
        }

        if replace_timestamp_in_parts(&mut heading.description, timestamp_id, timestamp) {
            heading.raw_description = attributed_string_to_raw_text(&heading.description);
            return Ok(());
        }
    }
    Err(MutationError::TimestampNotFound(timestamp_id.to_string()))
}

fn with_id(timestamp: &Timestamp, id: &str) -> Timestamp {
    let mut ts = timestamp.clone();
    ts.id = id.to_string();
    ts
}

/// Replace the timestamp with `target_id` anywhere in a part sequence,
/// descending into lists and table cells. Cell raw contents are resynced
/// when the replacement happened inside one.
fn replace_timestamp_in_parts(parts: &mut [Part], target_id: &str, new: &Timestamp) -> bool {
    for part in parts {
        match part {
            Part::Timestamp(ts) if ts.id == target_id => {
                *ts = with_id(new, target_id);
                return true;
            }
            Part::Table(table) => {
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        if replace_timestamp_in_parts(&mut cell.contents, target_id, new) {
                            cell.raw_contents = attributed_string_to_raw_text(&cell.contents);
                            return true;
                        }
                    }
                }
            }
            Part::List(list) => {
                for item in &mut list.items {
                    if replace_timestamp_in_parts(&mut item.title_line, target_id, new)
                        || replace_timestamp_in_parts(&mut item.contents, target_id, new)
                    {
                        return true;
                    }
                }
            }
            _ => {}
        }
    }
    false
}

fn apply_set_planning_timestamp(
    doc: &mut Document,
    heading_id: &str,
    kind: PlanningType,
    timestamp: &Timestamp,
) -> Result<(), MutationError> {
    let index = resolve(doc, heading_id)?;
    let item_id = doc.id_generator.new_id();
    let ts_id = doc.id_generator.new_id();
    let heading = &mut doc.headings[index];

    match heading.planning_items.iter_mut().find(|i| i.kind == kind) {
        Some(item) => {
            let keep = item.timestamp.id.clone();
            item.timestamp = with_id(timestamp, &keep);
        }
        None => heading.planning_items.push(PlanningItem {
            id: item_id,
            kind,
            timestamp: with_id(timestamp, &ts_id),
        }),
    }
    Ok(())
}
