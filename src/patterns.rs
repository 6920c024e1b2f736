use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::{AttendanceTable, ClassifiedRecord, ClassifiedTable};

// Plain substring checks: AM/PM is not disambiguated, so "10:00 PM" counts as
// morning and "12:00" as last hour.
const MORNING_MARKERS: [&str; 2] = ["9:00", "10:00"];
const LAST_HOUR_MARKERS: [&str; 3] = ["2:00", "3:00", "4:00"];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn is_morning_slot(label: &str) -> bool {
    MORNING_MARKERS.iter().any(|marker| label.contains(marker))
}

pub fn is_last_hour_slot(label: &str) -> bool {
    LAST_HOUR_MARKERS.iter().any(|marker| label.contains(marker))
}

pub fn derive_weekday(date: NaiveDate) -> Weekday {
    date.weekday()
}

pub fn derive_month(date: NaiveDate) -> u32 {
    date.month()
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// English month name for 1..=12, empty for anything else.
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .copied()
        .unwrap_or("")
}

/// Derives slot and calendar fields for every record without touching the
/// loaded table.
pub fn classify(table: &AttendanceTable) -> ClassifiedTable<'_> {
    let rows = table
        .records
        .iter()
        .map(|record| ClassifiedRecord {
            record,
            is_morning: is_morning_slot(&record.time_slot),
            is_last_hour: is_last_hour_slot(&record.time_slot),
            weekday: derive_weekday(record.date),
            month: derive_month(record.date),
        })
        .collect();

    ClassifiedTable { rows }
}
