//! Org timestamp scanning and rendering.
//!
//! Timestamps appear in angle (`<...>`, active) or square (`[...]`,
//! inactive) brackets: a date, an optional day name, an optional
//! `H:MM[-H:MM]` time range, an optional repeater (`+`, `++` or `.+` with a
//! value/unit and, for habits, a `/value unit` deadline interval), and an
//! optional delay (`-` or `--`).

use crate::ast::{DelayType, RepeaterType, TimeUnit, Timestamp};
use regex::{Captures, Regex};
use std::fmt::Write;
use std::sync::LazyLock;

/// Unanchored timestamp pattern, embeddable in larger alternations.
/// Group names are prefixed `ts_` to avoid collisions.
pub(crate) const TIMESTAMP_PATTERN: &str = concat!(
    r"(?P<ts_open>[<\[])",
    r"(?P<ts_year>\d{4})-(?P<ts_month>\d{2})-(?P<ts_day>\d{2})",
    r"(?: (?P<ts_dayname>[^\s\d>\]]+))?",
    r"(?: (?P<ts_sh>\d{1,2}):(?P<ts_sm>\d{2})(?:-(?P<ts_eh>\d{1,2}):(?P<ts_em>\d{2}))?)?",
    r"(?: (?P<ts_rtype>\+\+|\.\+|\+)(?P<ts_rval>\d+)(?P<ts_runit>[hdwmy])",
    r"(?:/(?P<ts_rdval>\d+)(?P<ts_rdunit>[hdwmy]))?)?",
    r"(?: (?P<ts_dtype>--|-)(?P<ts_dval>\d+)(?P<ts_dunit>[hdwmy]))?",
    r"[>\]]",
);

static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{}$", TIMESTAMP_PATTERN)).unwrap());

fn parse_unit(unit: &str) -> Option<TimeUnit> {
    match unit {
        "h" => Some(TimeUnit::Hour),
        "d" => Some(TimeUnit::Day),
        "w" => Some(TimeUnit::Week),
        "m" => Some(TimeUnit::Month),
        "y" => Some(TimeUnit::Year),
        _ => None,
    }
}

fn unit_char(unit: TimeUnit) -> char {
    match unit {
        TimeUnit::Hour => 'h',
        TimeUnit::Day => 'd',
        TimeUnit::Week => 'w',
        TimeUnit::Month => 'm',
        TimeUnit::Year => 'y',
    }
}

/// Build a `Timestamp` from a successful `TIMESTAMP_PATTERN` match.
///
/// Numeric groups always parse: the pattern only admits digit runs. The
/// captures may come from a larger alternation as long as the `ts_` groups
/// are present.
pub(crate) fn timestamp_from_captures(caps: &Captures, id: String) -> Timestamp {
    let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

    let mut ts = Timestamp::empty(id, caps.name("ts_open").map(|m| m.as_str()) == Some("<"));
    ts.year = caps
        .name("ts_year")
        .and_then(|m| m.as_str().parse::<i32>().ok());
    ts.month = num("ts_month");
    ts.day = num("ts_day");
    ts.day_name = caps.name("ts_dayname").map(|m| m.as_str().to_string());
    ts.start_hour = num("ts_sh");
    ts.start_minute = num("ts_sm");
    ts.end_hour = num("ts_eh");
    ts.end_minute = num("ts_em");

    if let Some(rtype) = caps.name("ts_rtype") {
        ts.repeater_type = Some(match rtype.as_str() {
            "++" => RepeaterType::CatchUp,
            ".+" => RepeaterType::Restart,
            _ => RepeaterType::Cumulate,
        });
        ts.repeater_value = num("ts_rval");
        ts.repeater_unit = caps.name("ts_runit").and_then(|m| parse_unit(m.as_str()));
        ts.repeater_deadline_value = num("ts_rdval");
        ts.repeater_deadline_unit = caps.name("ts_rdunit").and_then(|m| parse_unit(m.as_str()));
    }

    if let Some(dtype) = caps.name("ts_dtype") {
        ts.delay_type = Some(match dtype.as_str() {
            "--" => DelayType::First,
            _ => DelayType::All,
        });
        ts.delay_value = num("ts_dval");
        ts.delay_unit = caps.name("ts_dunit").and_then(|m| parse_unit(m.as_str()));
    }

    ts
}

/// Parse a string that is exactly one timestamp, `None` otherwise
pub fn parse_timestamp(raw: &str, id: String) -> Option<Timestamp> {
    TIMESTAMP_RE
        .captures(raw.trim())
        .map(|caps| timestamp_from_captures(&caps, id))
}

/// Render a timestamp back to its bracketed source form.
///
/// Minutes are zero-padded to two digits, hours are not; this matches the
/// common hand-written form (`9:00`, not `09:00`).
pub fn render_timestamp(ts: &Timestamp) -> String {
    let (open, close) = if ts.is_active { ('<', '>') } else { ('[', ']') };
    let mut out = String::new();
    out.push(open);

    if let (Some(year), Some(month), Some(day)) = (ts.year, ts.month, ts.day) {
        write!(out, "{:04}-{:02}-{:02}", year, month, day).unwrap();
    }
    if let Some(day_name) = &ts.day_name {
        write!(out, " {}", day_name).unwrap();
    }
    if let (Some(hour), Some(minute)) = (ts.start_hour, ts.start_minute) {
        write!(out, " {}:{:02}", hour, minute).unwrap();
        if let (Some(end_hour), Some(end_minute)) = (ts.end_hour, ts.end_minute) {
            write!(out, "-{}:{:02}", end_hour, end_minute).unwrap();
        }
    }
    if let (Some(rtype), Some(value), Some(unit)) =
        (ts.repeater_type, ts.repeater_value, ts.repeater_unit)
    {
        let marker = match rtype {
            RepeaterType::Cumulate => "+",
            RepeaterType::CatchUp => "++",
            RepeaterType::Restart => ".+",
        };
        write!(out, " {}{}{}", marker, value, unit_char(unit)).unwrap();
        if let (Some(dl_value), Some(dl_unit)) =
            (ts.repeater_deadline_value, ts.repeater_deadline_unit)
        {
            write!(out, "/{}{}", dl_value, unit_char(dl_unit)).unwrap();
        }
    }
    if let (Some(dtype), Some(value), Some(unit)) = (ts.delay_type, ts.delay_value, ts.delay_unit) {
        let marker = match dtype {
            DelayType::All => "-",
            DelayType::First => "--",
        };
        write!(out, " {}{}{}", marker, value, unit_char(unit)).unwrap();
    }

    out.push(close);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_date() {
        let ts = parse_timestamp("<2026-01-07 Wed>", "t-1".to_string()).unwrap();
        assert!(ts.is_active);
        assert_eq!(ts.year, Some(2026));
        assert_eq!(ts.month, Some(1));
        assert_eq!(ts.day, Some(7));
        assert_eq!(ts.day_name.as_deref(), Some("Wed"));
        assert_eq!(ts.start_hour, None);
    }

    #[test]
    fn test_parse_inactive_with_time_range() {
        let ts = parse_timestamp("[2026-01-07 Wed 9:00-10:30]", "t-1".to_string()).unwrap();
        assert!(!ts.is_active);
        assert_eq!(ts.start_hour, Some(9));
        assert_eq!(ts.start_minute, Some(0));
        assert_eq!(ts.end_hour, Some(10));
        assert_eq!(ts.end_minute, Some(30));
    }

    #[test]
    fn test_parse_habit_repeater_and_delay() {
        let ts = parse_timestamp("<2026-01-07 Wed .+1d/4d -2d>", "t-1".to_string()).unwrap();
        assert_eq!(ts.repeater_type, Some(RepeaterType::Restart));
        assert_eq!(ts.repeater_value, Some(1));
        assert_eq!(ts.repeater_unit, Some(TimeUnit::Day));
        assert_eq!(ts.repeater_deadline_value, Some(4));
        assert_eq!(ts.repeater_deadline_unit, Some(TimeUnit::Day));
        assert_eq!(ts.delay_type, Some(DelayType::All));
        assert_eq!(ts.delay_value, Some(2));
        assert_eq!(ts.delay_unit, Some(TimeUnit::Day));
    }

    #[test]
    fn test_parse_catch_up_repeater() {
        let ts = parse_timestamp("<2026-03-01 Sun ++2w>", "t-1".to_string()).unwrap();
        assert_eq!(ts.repeater_type, Some(RepeaterType::CatchUp));
        assert_eq!(ts.repeater_value, Some(2));
        assert_eq!(ts.repeater_unit, Some(TimeUnit::Week));
    }

    #[test]
    fn test_render_round_trips_structurally() {
        for raw in [
            "<2026-01-07 Wed>",
            "[2026-01-07]",
            "<2026-01-07 Wed 9:00>",
            "<2026-01-07 Wed 9:00-10:30 .+1d/4d>",
            "<2026-01-07 Wed +1m -2d>",
        ] {
            let ts = parse_timestamp(raw, "t-1".to_string()).unwrap();
            let rendered = render_timestamp(&ts);
            let reparsed = parse_timestamp(&rendered, "t-1".to_string()).unwrap();
            assert_eq!(ts, reparsed, "round trip failed for {}", raw);
            assert_eq!(rendered, raw);
        }
    }

    #[test]
    fn test_malformed_is_none() {
        assert!(parse_timestamp("<not a date>", "t-1".to_string()).is_none());
        assert!(parse_timestamp("2026-01-07", "t-1".to_string()).is_none());
    }
}
