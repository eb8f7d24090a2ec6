//! Parser tests: heading extraction, title sub-parse, drawers, degradation

use crate::ast::{CheckboxState, LogEntry, Part, PlanningType};
use crate::parser::parse;

#[test]
fn test_heading_levels_and_order() {
    let doc = parse("* One\n** Two\n*** Three\n* Four\n");
    let levels: Vec<usize> = doc.headings.iter().map(|h| h.nesting_level).collect();
    assert_eq!(levels, vec![1, 2, 3, 1]);
}

#[test]
fn test_default_todo_keywords() {
    let doc = parse("* TODO Write tests\n* DONE Ship\n* Plain\n");
    assert_eq!(
        doc.headings[0].title_line.todo_keyword.as_deref(),
        Some("TODO")
    );
    assert_eq!(
        doc.headings[1].title_line.todo_keyword.as_deref(),
        Some("DONE")
    );
    assert_eq!(doc.headings[2].title_line.todo_keyword, None);
    assert_eq!(doc.headings[0].title_line.raw_title, "Write tests");
}

#[test]
fn test_configured_todo_keywords() {
    let source = "#+TODO: NEXT(n) WAITING | FINISHED CANCELLED\n\n* NEXT Task\n* TODO Not a keyword here\n";
    let doc = parse(source);

    let set = &doc.todo_keyword_sets[0];
    assert_eq!(set.keywords, vec!["NEXT", "WAITING", "FINISHED", "CANCELLED"]);
    assert_eq!(set.completed_keywords, vec!["FINISHED", "CANCELLED"]);
    assert!(set.default);
    assert_eq!(set.config_line, "#+TODO: NEXT(n) WAITING | FINISHED CANCELLED");

    assert_eq!(
        doc.headings[0].title_line.todo_keyword.as_deref(),
        Some("NEXT")
    );
    // TODO is not in the configured set, so it stays in the title
    assert_eq!(doc.headings[1].title_line.todo_keyword, None);
    assert!(doc.headings[1]
        .title_line
        .raw_title
        .starts_with("TODO Not"));
}

#[test]
fn test_config_without_separator_marks_last_completed() {
    let doc = parse("#+TODO: OPEN CLOSED\n\n* OPEN x\n");
    let set = &doc.todo_keyword_sets[0];
    assert_eq!(set.completed_keywords, vec!["CLOSED"]);
}

#[test]
fn test_tags() {
    let doc = parse("* Heading with tags :work:urgent:\n");
    let title = &doc.headings[0].title_line;
    assert_eq!(title.tags, vec!["work", "urgent"]);
    assert_eq!(title.raw_title, "Heading with tags");
}

#[test]
fn test_title_keyword_requires_membership_and_position() {
    let doc = parse("* My TODO list\n");
    // keyword must be the first token
    assert_eq!(doc.headings[0].title_line.todo_keyword, None);
    assert_eq!(doc.headings[0].title_line.raw_title, "My TODO list");
}

#[test]
fn test_planning_items_single_line() {
    let doc = parse("* Task\nSCHEDULED: <2026-01-07 Wed> DEADLINE: <2026-01-10 Sat>\n");
    let items = &doc.headings[0].planning_items;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].kind, PlanningType::Scheduled);
    assert_eq!(items[0].timestamp.day, Some(7));
    assert_eq!(items[1].kind, PlanningType::Deadline);
    assert_eq!(items[1].timestamp.day, Some(10));
    assert!(doc.headings[0].raw_description.is_empty());
}

#[test]
fn test_closed_planning_item() {
    let doc = parse("* DONE Task\nCLOSED: [2026-01-07 Wed 11:30]\n");
    let item = &doc.headings[0].planning_items[0];
    assert_eq!(item.kind, PlanningType::Closed);
    assert!(!item.timestamp.is_active);
}

#[test]
fn test_property_drawer() {
    let source = "\
* Habit
SCHEDULED: <2026-01-07 Wed .+1d>
:PROPERTIES:
:STYLE: habit
:CATEGORY: health
:END:
Body text.
";
    let doc = parse(source);
    let heading = &doc.headings[0];
    assert_eq!(heading.property_list_items.len(), 2);
    assert_eq!(heading.property_list_items[0].property, "STYLE");
    assert_eq!(
        crate::content::attributed_string_to_raw_text(&heading.property_list_items[0].value),
        "habit"
    );
    assert_eq!(heading.raw_description, "Body text.\n");
}

#[test]
fn test_logbook_clock_and_notes() {
    let source = "\
* Task
:LOGBOOK:
CLOCK: [2026-01-07 Wed 9:00]--[2026-01-07 Wed 10:00] =>  1:00
- State \"DONE\"       from \"TODO\"       [2026-01-07 Wed 10:00]
:END:
";
    let doc = parse(source);
    let entries = &doc.headings[0].log_book_entries;
    assert_eq!(entries.len(), 2);

    let LogEntry::Clock { start, end, .. } = &entries[0] else {
        panic!("expected clock entry");
    };
    assert_eq!(start.start_hour, Some(9));
    assert_eq!(end.as_ref().unwrap().start_hour, Some(10));

    let LogEntry::Note { raw, .. } = &entries[1] else {
        panic!("expected note entry");
    };
    assert!(raw.contains("State \"DONE\""));
}

#[test]
fn test_description_with_blocks() {
    let source = "\
* Heading
Some text before.

- [ ] a task
- [X] a done task

| a | b |
| c | d |
";
    let doc = parse(source);
    let description = &doc.headings[0].description;
    assert!(description
        .iter()
        .any(|p| matches!(p, Part::List(l) if l.items.len() == 2)));
    assert!(description
        .iter()
        .any(|p| matches!(p, Part::Table(t) if t.rows.len() == 2)));

    let Part::List(list) = description
        .iter()
        .find(|p| matches!(p, Part::List(_)))
        .unwrap()
    else {
        unreachable!()
    };
    assert_eq!(list.items[1].checkbox_state, Some(CheckboxState::Checked));
}

#[test]
fn test_unparseable_input_yields_no_headings() {
    let doc = parse("no stars here\njust prose\n");
    assert!(doc.headings.is_empty());
    assert_eq!(doc.todo_keyword_sets.len(), 1);
}

#[test]
fn test_star_run_without_space_is_not_a_heading() {
    let doc = parse("*not a heading\n* real heading\n");
    assert_eq!(doc.headings.len(), 1);
    assert_eq!(doc.headings[0].title_line.raw_title, "real heading");
}

#[test]
fn test_title_projection_matches_raw_title() {
    let source = "* TODO Call [[https://example.com][them]] at <2026-01-07 Wed 9:00> [1/2] :phone:\n";
    let doc = parse(source);
    let title_line = &doc.headings[0].title_line;
    assert_eq!(
        crate::content::attributed_string_to_raw_text(&title_line.title),
        title_line.raw_title
    );
    assert!(title_line
        .title
        .iter()
        .any(|p| matches!(p, Part::Link { .. })));
    assert!(title_line
        .title
        .iter()
        .any(|p| matches!(p, Part::Timestamp(_))));
}

#[test]
fn test_document_json_round_trip() {
    let doc = parse("* TODO A [1/2] :t:\nSCHEDULED: <2026-01-07 Wed>\n- [ ] item\n");
    let json = serde_json::to_string(&doc).unwrap();
    let back: crate::ast::Document = serde_json::from_str(&json).unwrap();
    assert_eq!(doc, back);
}

#[test]
fn test_heading_ids_are_unique() {
    let doc = parse("* a\n** b\n** c\n* d\n");
    let mut ids: Vec<&str> = doc.headings.iter().map(|h| h.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
