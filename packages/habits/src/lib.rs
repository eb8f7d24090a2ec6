//! Habit scheduling.
//!
//! A habit is a heading with a `:STYLE: habit` property and a SCHEDULED
//! timestamp carrying a repeater. Given a reference day and a window around
//! it, [`habit_days`] classifies each day of the window from the habit's
//! repeat interval and its recorded completions.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orgdown_parser::ast::{Heading, LogEntry, PlanningType, TimeUnit, Timestamp};
use orgdown_parser::attributed_string_to_raw_text;

/// `- State "DONE" from "TODO" [2026-01-07 Wed]` in a logbook or body
static DONE_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"State\s+"DONE".*?\[(\d{4})-(\d{2})-(\d{2})"#).unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HabitStatus {
    /// Completed on this day
    Done,
    /// Past or current day inside the comfortable interval
    Scheduled,
    /// Inside the window where completion is expected
    DueSoon,
    /// Past the expected day with no completion yet
    Overdue,
    /// Past the expected day, but a later completion exists
    Missed,
    /// Day after the reference, not yet due
    Future,
    /// Before the habit's first scheduled day
    NotScheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitDay {
    pub date: NaiveDate,
    pub status: HabitStatus,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HabitError {
    #[error("heading has no `:STYLE: habit` property")]
    NotAHabit,

    #[error("heading has no scheduled repeater to derive days from")]
    NoRepeater,

    #[error("hourly repeaters cannot be mapped onto day cells")]
    HourlyRepeater,
}

/// Classify each day in `reference - preceding_days ..= reference + following_days`.
pub fn habit_days(
    heading: &Heading,
    reference: NaiveDate,
    preceding_days: u32,
    following_days: u32,
) -> Result<Vec<HabitDay>, HabitError> {
    let style = heading
        .property("STYLE")
        .map(|value| attributed_string_to_raw_text(value));
    if style.as_deref().map(str::trim) != Some("habit") {
        return Err(HabitError::NotAHabit);
    }

    let scheduled = heading
        .planning_item(PlanningType::Scheduled)
        .ok_or(HabitError::NoRepeater)?;
    let ts = &scheduled.timestamp;
    let (Some(value), Some(unit)) = (ts.repeater_value, ts.repeater_unit) else {
        return Err(HabitError::NoRepeater);
    };
    let min_days = interval_days(value, unit)?;
    let max_days = match (ts.repeater_deadline_value, ts.repeater_deadline_unit) {
        (Some(value), Some(unit)) => interval_days(value, unit)?.max(min_days),
        _ => min_days,
    };
    let start = timestamp_date(ts).ok_or(HabitError::NoRepeater)?;

    let completions = completion_dates(heading);

    let first = reference - Duration::days(i64::from(preceding_days));
    let total = i64::from(preceding_days) + i64::from(following_days) + 1;
    let days = (0..total)
        .map(|offset| {
            let date = first + Duration::days(offset);
            HabitDay {
                date,
                status: classify(date, reference, start, min_days, max_days, &completions),
            }
        })
        .collect();
    Ok(days)
}

fn classify(
    date: NaiveDate,
    reference: NaiveDate,
    start: NaiveDate,
    min_days: i64,
    max_days: i64,
    completions: &[NaiveDate],
) -> HabitStatus {
    if completions.binary_search(&date).is_ok() {
        return HabitStatus::Done;
    }

    let last = completions.iter().rev().find(|&&c| c < date).copied();
    let (due_from, expected) = match last {
        Some(c) => (c + Duration::days(min_days), c + Duration::days(max_days)),
        None => (start, start + Duration::days(max_days - min_days)),
    };

    if date > expected {
        if completions.iter().any(|&c| c > date) {
            HabitStatus::Missed
        } else {
            HabitStatus::Overdue
        }
    } else if date >= due_from {
        HabitStatus::DueSoon
    } else if date > reference {
        HabitStatus::Future
    } else if last.is_some() {
        HabitStatus::Scheduled
    } else {
        HabitStatus::NotScheduled
    }
}

fn interval_days(value: u32, unit: TimeUnit) -> Result<i64, HabitError> {
    let value = i64::from(value);
    match unit {
        TimeUnit::Hour => Err(HabitError::HourlyRepeater),
        TimeUnit::Day => Ok(value),
        TimeUnit::Week => Ok(value * 7),
        TimeUnit::Month => Ok(value * 30),
        TimeUnit::Year => Ok(value * 365),
    }
}

fn timestamp_date(ts: &Timestamp) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(ts.year?, ts.month?, ts.day?)
}

/// Completion days mined from `State "DONE"` transitions, sorted and
/// deduplicated. Clock entries never count as completions.
fn completion_dates(heading: &Heading) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = heading
        .log_book_entries
        .iter()
        .filter_map(|entry| match entry {
            LogEntry::Note { raw, .. } => Some(raw.as_str()),
            LogEntry::Clock { .. } => None,
        })
        .chain(heading.raw_description.lines())
        .filter_map(|line| {
            let caps = DONE_STATE_RE.captures(line)?;
            NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            )
        })
        .collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}
