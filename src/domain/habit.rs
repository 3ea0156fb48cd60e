use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{Result, TrackerError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub streak: i64,
    #[serde(default)]
    pub completed_today: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabit {
    pub name: String,
    #[serde(default)]
    pub streak: i64,
    #[serde(default)]
    pub completed_today: bool,
}

/// One row of habit history, unique per `(habit_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub habit_id: i64,
    pub date: String,
    pub completed: bool,
}

/// Wire shape of habit history: habit id (as a string) to date to completion.
pub type HabitHistoryMap = BTreeMap<String, BTreeMap<String, bool>>;

pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TrackerError::validation("habit name must not be empty"));
    }
    Ok(())
}

/// Checks that `date` is a calendar day in `YYYY-MM-DD` form.
pub fn validate_day(date: &str) -> Result<()> {
    // chrono accepts unpadded fields, so the date must also format back to itself
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) if parsed.format("%Y-%m-%d").to_string() == date => Ok(()),
        _ => Err(TrackerError::validation(format!("invalid date '{date}', expected YYYY-MM-DD"))),
    }
}

pub fn flatten_history(map: HabitHistoryMap) -> Result<Vec<HistoryEntry>> {
    let mut entries = Vec::new();
    for (habit_key, dates) in map {
        let habit_id: i64 = habit_key
            .parse()
            .map_err(|_| TrackerError::validation(format!("invalid habit id '{habit_key}'")))?;
        for (date, completed) in dates {
            validate_day(&date)?;
            entries.push(HistoryEntry { habit_id, date, completed });
        }
    }
    Ok(entries)
}

pub fn nest_history(entries: impl IntoIterator<Item = HistoryEntry>) -> HabitHistoryMap {
    let mut map = HabitHistoryMap::new();
    for entry in entries {
        map.entry(entry.habit_id.to_string())
            .or_default()
            .insert(entry.date, entry.completed);
    }
    map
}
