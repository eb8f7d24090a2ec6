use crate::id_generator::IdGenerator;
use serde::{Deserialize, Serialize};

/// Inline/body content: an ordered sequence of parts
pub type AttributedString = Vec<Part>;

/// Root document node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub headings: Vec<Heading>,
    /// Workflow keyword configuration; the first set is the default.
    /// Invariant: never empty.
    pub todo_keyword_sets: Vec<TodoKeywordSet>,
    /// Id mint for nodes created after parse (capture, new rows/cells, ...).
    pub id_generator: IdGenerator,
}

/// One outline node, introduced in source by a run of `*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Opaque, process-unique, stable across edits
    pub id: String,
    /// Depth, >= 1; structural relationships are derived from this plus
    /// document order (subtree contiguity), never from stored pointers
    pub nesting_level: usize,
    pub title_line: TitleLine,
    pub planning_items: Vec<PlanningItem>,
    pub property_list_items: Vec<PropertyListItem>,
    pub log_book_entries: Vec<LogEntry>,
    pub description: AttributedString,
    /// Kept byte-consistent with `description` after every mutation
    pub raw_description: String,
    /// Fold state; mutated only by toggle operations
    pub opened: bool,
}

/// Parsed title line of a heading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleLine {
    pub todo_keyword: Option<String>,
    pub tags: Vec<String>,
    /// Canonical projection of `title`
    pub raw_title: String,
    pub title: AttributedString,
}

/// A configured workflow keyword cycle (`#+TODO: TODO | DONE`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoKeywordSet {
    pub keywords: Vec<String>,
    pub completed_keywords: Vec<String>,
    pub config_line: String,
    pub default: bool,
}

impl TodoKeywordSet {
    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    pub fn is_completed(&self, keyword: &str) -> bool {
        self.completed_keywords.iter().any(|k| k == keyword)
    }
}

/// Content part (tagged union shared by parser, serializer and editor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Part {
    /// Plain text run
    Text { contents: String },

    /// `[[uri][title]]` or `[[uri]]`
    Link { uri: String, title: Option<String> },

    /// `|`-delimited table
    Table(TableData),

    /// Plain or ordered list, possibly with checkboxes
    List(ListData),

    /// `<...>` or `[...]` timestamp
    Timestamp(Timestamp),

    /// `[n/m]` completion cookie
    FractionCookie {
        done: Option<u32>,
        total: Option<u32>,
    },

    /// `[n%]` completion cookie
    PercentageCookie { percent: Option<u32> },
}

/// Table contents; every row has the same cell count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub id: String,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub id: String,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub id: String,
    pub raw_contents: String,
    pub contents: AttributedString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListData {
    pub id: String,
    pub is_ordered: bool,
    /// `-`, `+` or `*` for plain lists
    pub bullet_character: char,
    /// `.` or `)` for ordered lists
    pub number_terminator_character: char,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: String,
    pub title_line: AttributedString,
    /// Nested content below the bullet line (can hold nested lists/tables)
    pub contents: AttributedString,
    pub is_checkbox: bool,
    pub checkbox_state: Option<CheckboxState>,
    /// `[@n]` counter override
    pub force_number: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckboxState {
    Checked,
    Unchecked,
    Partial,
}

/// Org timestamp, e.g. `<2026-01-07 Wed 9:00-10:30 .+1d/4d -2d>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    pub id: String,
    /// `<...>` is active, `[...]` inactive
    pub is_active: bool,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub day_name: Option<String>,
    pub start_hour: Option<u32>,
    pub start_minute: Option<u32>,
    pub end_hour: Option<u32>,
    pub end_minute: Option<u32>,
    pub repeater_type: Option<RepeaterType>,
    pub repeater_value: Option<u32>,
    pub repeater_unit: Option<TimeUnit>,
    /// Habit deadline interval (`/4d` after the repeater)
    pub repeater_deadline_value: Option<u32>,
    pub repeater_deadline_unit: Option<TimeUnit>,
    pub delay_type: Option<DelayType>,
    pub delay_value: Option<u32>,
    pub delay_unit: Option<TimeUnit>,
}

impl Timestamp {
    /// Timestamp with only an id and activity flag set
    pub fn empty(id: String, is_active: bool) -> Self {
        Self {
            id,
            is_active,
            year: None,
            month: None,
            day: None,
            day_name: None,
            start_hour: None,
            start_minute: None,
            end_hour: None,
            end_minute: None,
            repeater_type: None,
            repeater_value: None,
            repeater_unit: None,
            repeater_deadline_value: None,
            repeater_deadline_unit: None,
            delay_type: None,
            delay_value: None,
            delay_unit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeaterType {
    /// `+`
    Cumulate,
    /// `++`
    CatchUp,
    /// `.+`
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelayType {
    /// `-`
    All,
    /// `--`
    First,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanningType {
    Scheduled,
    Deadline,
    Closed,
}

impl PlanningType {
    pub fn keyword(&self) -> &'static str {
        match self {
            PlanningType::Scheduled => "SCHEDULED",
            PlanningType::Deadline => "DEADLINE",
            PlanningType::Closed => "CLOSED",
        }
    }
}

/// `SCHEDULED:`/`DEADLINE:`/`CLOSED:` line entry below a heading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningItem {
    pub id: String,
    pub kind: PlanningType,
    pub timestamp: Timestamp,
}

/// `:PROPERTIES:` drawer entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyListItem {
    pub property: String,
    pub value: AttributedString,
}

/// `:LOGBOOK:` drawer entry; keeps the raw line for reliable round-trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LogEntry {
    Clock {
        id: String,
        start: Timestamp,
        end: Option<Timestamp>,
        raw: String,
    },
    Note {
        id: String,
        raw: String,
    },
}

impl LogEntry {
    pub fn raw(&self) -> &str {
        match self {
            LogEntry::Clock { raw, .. } | LogEntry::Note { raw, .. } => raw,
        }
    }
}

impl Document {
    pub fn heading(&self, heading_id: &str) -> Option<&Heading> {
        self.headings.iter().find(|h| h.id == heading_id)
    }

    pub fn heading_mut(&mut self, heading_id: &str) -> Option<&mut Heading> {
        self.headings.iter_mut().find(|h| h.id == heading_id)
    }

    /// The keyword set a heading's todo keyword cycles through.
    /// Headings without a keyword use the default (first) set.
    pub fn keyword_set_for(&self, todo_keyword: Option<&str>) -> &TodoKeywordSet {
        match todo_keyword {
            Some(keyword) => self
                .todo_keyword_sets
                .iter()
                .find(|set| set.contains(keyword))
                .unwrap_or(&self.todo_keyword_sets[0]),
            None => &self.todo_keyword_sets[0],
        }
    }

    /// Whether a keyword counts as completed in any configured set
    pub fn is_completed_keyword(&self, keyword: &str) -> bool {
        self.todo_keyword_sets
            .iter()
            .any(|set| set.is_completed(keyword))
    }
}

impl Heading {
    /// Heading with the given id and level and nothing else
    pub fn empty(id: String, nesting_level: usize) -> Self {
        Self {
            id,
            nesting_level,
            title_line: TitleLine {
                todo_keyword: None,
                tags: Vec::new(),
                raw_title: String::new(),
                title: Vec::new(),
            },
            planning_items: Vec::new(),
            property_list_items: Vec::new(),
            log_book_entries: Vec::new(),
            description: Vec::new(),
            raw_description: String::new(),
            opened: false,
        }
    }

    pub fn planning_item(&self, kind: PlanningType) -> Option<&PlanningItem> {
        self.planning_items.iter().find(|item| item.kind == kind)
    }

    /// Value of an own (not inherited) property, case-insensitive on the key
    pub fn property(&self, name: &str) -> Option<&AttributedString> {
        self.property_list_items
            .iter()
            .find(|item| item.property.eq_ignore_ascii_case(name))
            .map(|item| &item.value)
    }
}

/// The builtin `TODO`/`DONE` cycle used when no `#+TODO:` line configures one
pub fn default_keyword_set() -> TodoKeywordSet {
    TodoKeywordSet {
        keywords: vec!["TODO".to_string(), "DONE".to_string()],
        completed_keywords: vec!["DONE".to_string()],
        config_line: String::new(),
        default: true,
    }
}
