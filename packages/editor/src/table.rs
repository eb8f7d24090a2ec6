//! Structural table edits addressed by cell id.
//!
//! Every edit resolves a reference cell anywhere in a heading's body
//! (including tables nested inside list items), applies the change to the
//! owning table, and resynthesizes the heading's raw body text. Tables are
//! kept rectangular; removing the last row or column removes the table.

use orgdown_parser::ast::{Document, Part, TableCell, TableData, TableRow};
use orgdown_parser::content::attributed_string_to_raw_text;
use orgdown_parser::{parse_inline_markup, IdGenerator};

use crate::mutations::MutationError;

#[derive(Debug, Clone)]
pub(crate) enum TableEdit {
    InsertRow,
    RemoveRow,
    InsertColumn,
    RemoveColumn,
    MoveRowUp,
    MoveRowDown,
    MoveColumnLeft,
    MoveColumnRight,
    SetValue(String),
}

pub(crate) fn edit(doc: &mut Document, cell_id: &str, edit: TableEdit) -> Result<(), MutationError> {
    let index = (0..doc.headings.len())
        .find(|&i| contains_cell(&doc.headings[i].description, cell_id))
        .ok_or_else(|| MutationError::CellNotFound(cell_id.to_string()))?;

    let mut gen = doc.id_generator.clone();
    let table = find_table_mut(&mut doc.headings[index].description, cell_id)
        .ok_or_else(|| MutationError::CellNotFound(cell_id.to_string()))?;
    apply_edit(table, cell_id, &edit, &mut gen)?;
    doc.id_generator = gen;

    prune_empty_tables(&mut doc.headings[index].description);
    let heading = &mut doc.headings[index];
    heading.raw_description = attributed_string_to_raw_text(&heading.description);
    Ok(())
}

fn apply_edit(
    table: &mut TableData,
    cell_id: &str,
    edit: &TableEdit,
    gen: &mut IdGenerator,
) -> Result<(), MutationError> {
    let (row, col) = locate(table, cell_id).ok_or_else(|| {
        MutationError::CellNotFound(cell_id.to_string())
    })?;
    let width = table.rows.first().map(|r| r.cells.len()).unwrap_or(0);
    debug_assert!(table.rows.iter().all(|r| r.cells.len() == width));

    match edit {
        TableEdit::InsertRow => {
            let cells = (0..width).map(|_| empty_cell(gen)).collect();
            let new_row = TableRow {
                id: gen.new_id(),
                cells,
            };
            table.rows.insert(row + 1, new_row);
        }
        TableEdit::RemoveRow => {
            table.rows.remove(row);
        }
        TableEdit::InsertColumn => {
            for r in &mut table.rows {
                r.cells.insert(col + 1, empty_cell(gen));
            }
        }
        TableEdit::RemoveColumn => {
            for r in &mut table.rows {
                r.cells.remove(col);
            }
            if width == 1 {
                table.rows.clear();
            }
        }
        TableEdit::MoveRowUp => {
            if row == 0 {
                return Err(MutationError::OutOfRange);
            }
            table.rows.swap(row - 1, row);
        }
        TableEdit::MoveRowDown => {
            if row + 1 >= table.rows.len() {
                return Err(MutationError::OutOfRange);
            }
            table.rows.swap(row, row + 1);
        }
        TableEdit::MoveColumnLeft => {
            if col == 0 {
                return Err(MutationError::OutOfRange);
            }
            for r in &mut table.rows {
                r.cells.swap(col - 1, col);
            }
        }
        TableEdit::MoveColumnRight => {
            if col + 1 >= width {
                return Err(MutationError::OutOfRange);
            }
            for r in &mut table.rows {
                r.cells.swap(col, col + 1);
            }
        }
        TableEdit::SetValue(value) => {
            // pipes and newlines would re-parse as extra cells or rows
            let value = value.replace(['|', '\n'], " ").trim().to_string();
            let cell = &mut table.rows[row].cells[col];
            cell.contents = parse_inline_markup(&value, gen);
            cell.raw_contents = value;
        }
    }
    Ok(())
}

fn locate(table: &TableData, cell_id: &str) -> Option<(usize, usize)> {
    table.rows.iter().enumerate().find_map(|(r, row)| {
        row.cells
            .iter()
            .position(|c| c.id == cell_id)
            .map(|c| (r, c))
    })
}

fn empty_cell(gen: &mut IdGenerator) -> TableCell {
    TableCell {
        id: gen.new_id(),
        raw_contents: String::new(),
        contents: Vec::new(),
    }
}

fn contains_cell(parts: &[Part], cell_id: &str) -> bool {
    parts.iter().any(|part| match part {
        Part::Table(table) => table
            .rows
            .iter()
            .any(|r| r.cells.iter().any(|c| c.id == cell_id)),
        Part::List(list) => list
            .items
            .iter()
            .any(|item| contains_cell(&item.contents, cell_id)),
        _ => false,
    })
}

fn find_table_mut<'a>(parts: &'a mut [Part], cell_id: &str) -> Option<&'a mut TableData> {
    for part in parts {
        match part {
            Part::Table(table) => {
                if table
                    .rows
                    .iter()
                    .any(|r| r.cells.iter().any(|c| c.id == cell_id))
                {
                    return Some(table);
                }
            }
            Part::List(list) => {
                for item in &mut list.items {
                    if let Some(table) = find_table_mut(&mut item.contents, cell_id) {
                        return Some(table);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn prune_empty_tables(parts: &mut Vec<Part>) {
    parts.retain(|part| !matches!(part, Part::Table(table) if table.rows.is_empty()));
    for part in parts {
        if let Part::List(list) = part {
            for item in &mut list.items {
                prune_empty_tables(&mut item.contents);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgdown_parser::{parse, serialize};

    fn cell_id(doc: &Document, row: usize, col: usize) -> String {
        for part in &doc.headings[0].description {
            if let Part::Table(table) = part {
                return table.rows[row].cells[col].id.clone();
            }
        }
        panic!("no table");
    }

    fn table(doc: &Document) -> &TableData {
        for part in &doc.headings[0].description {
            if let Part::Table(table) = part {
                return table;
            }
        }
        panic!("no table");
    }

    const TWO_BY_TWO: &str = "* Data\n| a | b |\n| c | d |\n";

    #[test]
    fn test_insert_row_below_reference() {
        let mut doc = parse(TWO_BY_TWO);
        let id = cell_id(&doc, 0, 0);
        edit(&mut doc, &id, TableEdit::InsertRow).unwrap();
        let t = table(&doc);
        assert_eq!(t.rows.len(), 3);
        assert!(t.rows[1].cells.iter().all(|c| c.raw_contents.is_empty()));
        assert_eq!(t.rows[2].cells[0].raw_contents, "c");
    }

    #[test]
    fn test_insert_column_stays_rectangular() {
        let mut doc = parse(TWO_BY_TWO);
        let id = cell_id(&doc, 0, 0);
        edit(&mut doc, &id, TableEdit::InsertColumn).unwrap();
        let t = table(&doc);
        assert!(t.rows.iter().all(|r| r.cells.len() == 3));
        assert_eq!(t.rows[0].cells[2].raw_contents, "b");
        assert!(t.rows[0].cells[1].raw_contents.is_empty());
    }

    #[test]
    fn test_fresh_ids_on_insert() {
        let mut doc = parse(TWO_BY_TWO);
        let before: Vec<String> = table(&doc)
            .rows
            .iter()
            .flat_map(|r| r.cells.iter().map(|c| c.id.clone()))
            .collect();
        let id = cell_id(&doc, 0, 0);
        edit(&mut doc, &id, TableEdit::InsertRow).unwrap();
        for cell in &table(&doc).rows[1].cells {
            assert!(!before.contains(&cell.id));
        }
    }

    #[test]
    fn test_remove_last_column_drops_table() {
        let mut doc = parse("* Data\n| only |\n| one |\n");
        let id = cell_id(&doc, 0, 0);
        edit(&mut doc, &id, TableEdit::RemoveColumn).unwrap();
        assert!(doc.headings[0]
            .description
            .iter()
            .all(|p| !matches!(p, Part::Table(_))));
        assert!(!serialize(&doc).contains('|'));
    }

    #[test]
    fn test_move_row_at_edge_is_rejected() {
        let mut doc = parse(TWO_BY_TWO);
        let id = cell_id(&doc, 0, 0);
        let err = edit(&mut doc, &id, TableEdit::MoveRowUp).unwrap_err();
        assert!(matches!(err, MutationError::OutOfRange));
    }

    #[test]
    fn test_move_column_right() {
        let mut doc = parse(TWO_BY_TWO);
        let id = cell_id(&doc, 0, 0);
        edit(&mut doc, &id, TableEdit::MoveColumnRight).unwrap();
        let t = table(&doc);
        assert_eq!(t.rows[0].cells[0].raw_contents, "b");
        assert_eq!(t.rows[1].cells[1].raw_contents, "c");
    }

    #[test]
    fn test_set_value_reparses_contents() {
        let mut doc = parse(TWO_BY_TWO);
        let id = cell_id(&doc, 1, 1);
        edit(&mut doc, &id, TableEdit::SetValue("[[https://x.dev][x]]".into())).unwrap();
        let t = table(&doc);
        assert!(matches!(t.rows[1].cells[1].contents[0], Part::Link { .. }));
        assert!(doc.headings[0].raw_description.contains("[[https://x.dev][x]]"));
    }

    #[test]
    fn test_set_value_sanitizes_cell_delimiters() {
        let mut doc = parse(TWO_BY_TWO);
        let id = cell_id(&doc, 0, 0);
        edit(&mut doc, &id, TableEdit::SetValue("x | y".into())).unwrap();
        assert_eq!(table(&doc).rows[0].cells[0].raw_contents, "x   y");

        let reparsed = parse(&serialize(&doc));
        let Part::Table(t) = &reparsed.headings[0].description[0] else {
            panic!("expected table");
        };
        assert!(t.rows.iter().all(|r| r.cells.len() == 2));
    }

    #[test]
    fn test_edit_table_nested_in_list() {
        let mut doc = parse("* Data\n- item\n  | a | b |\n");
        let id = {
            let Part::List(list) = &doc.headings[0].description[0] else {
                panic!("expected list");
            };
            let Part::Table(t) = &list.items[0].contents[0] else {
                panic!("expected nested table");
            };
            t.rows[0].cells[0].id.clone()
        };
        edit(&mut doc, &id, TableEdit::InsertRow).unwrap();
        let Part::List(list) = &doc.headings[0].description[0] else {
            panic!("expected list");
        };
        let Part::Table(t) = &list.items[0].contents[0] else {
            panic!("expected nested table");
        };
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn test_unknown_cell_is_an_error() {
        let mut doc = parse(TWO_BY_TWO);
        let err = edit(&mut doc, "missing", TableEdit::RemoveRow).unwrap_err();
        assert!(matches!(err, MutationError::CellNotFound(_)));
    }
}
