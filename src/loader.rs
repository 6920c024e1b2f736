use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::models::{AttendanceRecord, AttendanceTable};

pub const REQUIRED_COLUMNS: [&str; 4] = ["Student_ID", "Date", "Time_Slot", "Present"];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Student_ID")]
    student_id: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time_Slot")]
    time_slot: String,
    #[serde(rename = "Present")]
    present: String,
}

pub fn load_path(csv_path: &Path) -> Result<AttendanceTable, LoadError> {
    let file = std::fs::File::open(csv_path)?;
    let table = load_reader(file)?;
    if table.is_empty() {
        warn!(path = %csv_path.display(), "attendance file has no data rows");
    }
    info!(path = %csv_path.display(), rows = table.len(), "loaded attendance file");
    Ok(table)
}

pub fn load_reader<R: Read>(source: R) -> Result<AttendanceTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(LoadError::MissingColumn(column));
        }
    }

    let mut records = Vec::new();
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let line = index + 1;

        let date = parse_date(&row.date).ok_or_else(|| LoadError::InvalidDate {
            row: line,
            value: row.date.clone(),
        })?;
        let present = parse_present(&row.present).ok_or_else(|| LoadError::InvalidPresent {
            row: line,
            value: row.present.clone(),
        })?;

        records.push(AttendanceRecord {
            student_id: row.student_id,
            date,
            time_slot: row.time_slot,
            present,
        });
    }

    debug!(rows = records.len(), "parsed attendance rows");
    Ok(AttendanceTable::new(records))
}

/// First `rows` records, for a quick look at what was loaded.
pub fn preview(table: &AttendanceTable, rows: usize) -> &[AttendanceRecord] {
    &table.records[..rows.min(table.len())]
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
}

pub fn parse_present(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}
