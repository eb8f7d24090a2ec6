//! Flat-tree navigation queries.
//!
//! The heading list is flat and ordered; tree structure is implicit in
//! `nesting_level` plus the subtree contiguity invariant: all descendants
//! of the heading at index `i` occupy the contiguous range after `i`, up to
//! the next heading whose level is `<=` that heading's level. Every query
//! here is an index scan over the affected region.

use crate::ast::{AttributedString, Document, Heading, Part};
use std::ops::Range;

/// Whether a path segment names this heading, with completion cookies in
/// the title ignored
fn title_matches(heading: &Heading, segment: &str) -> bool {
    let raw = heading.title_line.raw_title.trim();
    let segment = segment.trim();
    if raw == segment {
        return true;
    }
    let stripped: String = heading
        .title_line
        .title
        .iter()
        .filter(|part| {
            !matches!(
                part,
                Part::FractionCookie { .. } | Part::PercentageCookie { .. }
            )
        })
        .map(|part| crate::content::attributed_string_to_raw_text(std::slice::from_ref(part)))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
        == segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Document {
    pub fn heading_index(&self, heading_id: &str) -> Option<usize> {
        self.headings.iter().position(|h| h.id == heading_id)
    }

    /// Index range of a heading's whole block: itself plus all descendants
    pub fn subtree_range(&self, index: usize) -> Range<usize> {
        let level = self.headings[index].nesting_level;
        let mut end = index + 1;
        while end < self.headings.len() && self.headings[end].nesting_level > level {
            end += 1;
        }
        index..end
    }

    /// All descendants of a heading, in document order
    pub fn subheadings(&self, heading_id: &str) -> &[Heading] {
        match self.heading_index(heading_id) {
            Some(index) => {
                let range = self.subtree_range(index);
                &self.headings[index + 1..range.end]
            }
            None => &[],
        }
    }

    /// Indices of the direct children only
    pub fn direct_subheading_indices(&self, index: usize) -> Vec<usize> {
        let level = self.headings[index].nesting_level;
        self.subtree_range(index)
            .skip(1)
            .filter(|&i| self.headings[i].nesting_level == level + 1)
            .collect()
    }

    /// Nearest preceding heading with level exactly one less
    pub fn direct_parent(&self, index: usize) -> Option<usize> {
        let level = self.headings[index].nesting_level;
        (0..index)
            .rev()
            .find(|&i| self.headings[i].nesting_level == level - 1)
    }

    /// Nearest preceding heading with strictly lower level
    pub fn parent(&self, index: usize) -> Option<usize> {
        let level = self.headings[index].nesting_level;
        (0..index)
            .rev()
            .find(|&i| self.headings[i].nesting_level < level)
    }

    /// Nearest preceding same-level heading, `None` if an ancestor is hit first
    pub fn previous_sibling(&self, index: usize) -> Option<usize> {
        let level = self.headings[index].nesting_level;
        for i in (0..index).rev() {
            let other = self.headings[i].nesting_level;
            if other == level {
                return Some(i);
            }
            if other < level {
                return None;
            }
        }
        None
    }

    /// Next same-level heading after this heading's subtree, if any
    pub fn next_sibling(&self, index: usize) -> Option<usize> {
        let level = self.headings[index].nesting_level;
        let end = self.subtree_range(index).end;
        match self.headings.get(end) {
            Some(h) if h.nesting_level == level => Some(end),
            _ => None,
        }
    }

    /// A heading is visible iff every ancestor is opened
    pub fn is_visible(&self, heading_id: &str) -> bool {
        let Some(index) = self.heading_index(heading_id) else {
            return false;
        };
        let mut current = index;
        while let Some(ancestor) = self.parent(current) {
            if !self.headings[ancestor].opened {
                return false;
            }
            current = ancestor;
        }
        true
    }

    pub fn next_visible(&self, heading_id: &str) -> Option<&Heading> {
        let index = self.heading_index(heading_id)?;
        self.headings[index + 1..]
            .iter()
            .find(|h| self.is_visible(&h.id))
    }

    pub fn previous_visible(&self, heading_id: &str) -> Option<&Heading> {
        let index = self.heading_index(heading_id)?;
        self.headings[..index]
            .iter()
            .rev()
            .find(|h| self.is_visible(&h.id))
    }

    /// Resolve a breadcrumb path of title strings, one level at a time: the
    /// first element among level-1 headings, each subsequent element among
    /// the prior match's direct subheadings. Completion cookies in a title
    /// are ignored, so "Groceries" finds "Groceries [1/2]".
    pub fn heading_index_by_path<S: AsRef<str>>(&self, path: &[S]) -> Option<usize> {
        let mut segments = path.iter();
        let first = segments.next()?;

        let mut current = (0..self.headings.len())
            .find(|&i| self.headings[i].nesting_level == 1 && title_matches(&self.headings[i], first.as_ref()))?;

        for segment in segments {
            current = self
                .direct_subheading_indices(current)
                .into_iter()
                .find(|&i| title_matches(&self.headings[i], segment.as_ref()))?;
        }

        Some(current)
    }

    /// Nearest property value found walking from the heading up through its
    /// ancestors
    pub fn inherited_property(&self, index: usize, name: &str) -> Option<&AttributedString> {
        let mut current = index;
        loop {
            if let Some(value) = self.headings[current].property(name) {
                return Some(value);
            }
            current = self.parent(current)?;
        }
    }
}
