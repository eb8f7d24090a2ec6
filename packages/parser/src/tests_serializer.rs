//! Serializer tests: structural round trip and canonical emission

use crate::parser::parse;
use crate::serializer::serialize;

/// Compare two documents structurally, ignoring ids
fn assert_same_structure(a: &crate::ast::Document, b: &crate::ast::Document) {
    assert_eq!(a.todo_keyword_sets, b.todo_keyword_sets);
    assert_eq!(a.headings.len(), b.headings.len());
    for (ha, hb) in a.headings.iter().zip(&b.headings) {
        assert_eq!(ha.nesting_level, hb.nesting_level);
        assert_eq!(ha.title_line.todo_keyword, hb.title_line.todo_keyword);
        assert_eq!(ha.title_line.tags, hb.title_line.tags);
        assert_eq!(ha.title_line.raw_title, hb.title_line.raw_title);
        assert_eq!(
            crate::content::attributed_string_to_raw_text(&ha.description),
            crate::content::attributed_string_to_raw_text(&hb.description)
        );
        assert_eq!(ha.planning_items.len(), hb.planning_items.len());
        assert_eq!(ha.property_list_items.len(), hb.property_list_items.len());
        assert_eq!(ha.log_book_entries.len(), hb.log_book_entries.len());
    }
}

#[test]
fn test_round_trip_simple() {
    let source = "* One\nbody\n** Two :tag:\n* TODO Three\n";
    let doc = parse(source);
    let reparsed = parse(&serialize(&doc));
    assert_same_structure(&doc, &reparsed);
}

#[test]
fn test_round_trip_full_heading() {
    let source = "\
#+TODO: NEXT | FINISHED

* NEXT Call [[https://example.com][them]] :phone:work:
SCHEDULED: <2026-01-07 Wed 9:00 .+1d/4d>
:PROPERTIES:
:STYLE: habit
:END:
:LOGBOOK:
CLOCK: [2026-01-06 Tue 9:00]--[2026-01-06 Tue 9:30] =>  0:30
- State \"FINISHED\"  from \"NEXT\"  [2026-01-06 Tue 9:30]
:END:
Notes with a [1/2] cookie.

- [X] first
- [ ] second
";
    let doc = parse(source);
    let reparsed = parse(&serialize(&doc));
    assert_same_structure(&doc, &reparsed);
}

#[test]
fn test_serialize_is_idempotent() {
    let source = "\
* One [/]
SCHEDULED: <2026-01-07 Wed>
Text with [[link]].

| product | qty |
| apples  | 3 |
** TODO Two
";
    let once = serialize(&parse(source));
    let twice = serialize(&parse(&once));
    assert_eq!(once, twice);
}

#[test]
fn test_tables_serialize_aligned() {
    let doc = parse("* T\n| product | qty |\n| apples | 300 |\n");
    let out = serialize(&doc);
    assert!(out.contains("| product | qty |\n| apples  | 300 |\n"));
}

#[test]
fn test_config_lines_reemitted() {
    let source = "#+TODO: OPEN | SHUT\n\n* OPEN Door\n";
    let out = serialize(&parse(source));
    assert!(out.starts_with("#+TODO: OPEN | SHUT\n"));
    let reparsed = parse(&out);
    assert_eq!(reparsed.todo_keyword_sets[0].keywords, vec!["OPEN", "SHUT"]);
}

#[test]
fn test_serializer_uses_structured_fields_not_raw() {
    let mut doc = parse("* Title\n");
    // desynchronize raw_title on purpose; emission must follow `title`
    doc.headings[0].title_line.raw_title = "stale".to_string();
    let out = serialize(&doc);
    assert!(out.starts_with("* Title\n"));
}

#[test]
fn test_planning_line_emission() {
    let doc = parse("* T\nDEADLINE: <2026-02-01 Sun> SCHEDULED: <2026-01-07 Wed>\n");
    let out = serialize(&doc);
    assert!(out.contains("DEADLINE: <2026-02-01 Sun> SCHEDULED: <2026-01-07 Wed>\n"));
}

#[test]
fn test_empty_document() {
    let doc = parse("");
    assert_eq!(serialize(&doc), "");
}
