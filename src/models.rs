use chrono::{NaiveDate, Weekday};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub present: bool,
}

impl AttendanceRecord {
    pub fn is_absent(&self) -> bool {
        !self.present
    }
}

/// Rows in file order. Never mutated after loading.
#[derive(Debug, Clone, Default)]
pub struct AttendanceTable {
    pub records: Vec<AttendanceRecord>,
}

impl AttendanceTable {
    pub fn new(records: Vec<AttendanceRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn absences(&self) -> impl Iterator<Item = &AttendanceRecord> {
        self.records.iter().filter(|record| record.is_absent())
    }
}

/// A record together with the fields derived from its date and time slot.
#[derive(Debug, Clone)]
pub struct ClassifiedRecord<'a> {
    pub record: &'a AttendanceRecord,
    pub is_morning: bool,
    pub is_last_hour: bool,
    pub weekday: Weekday,
    pub month: u32,
}

#[derive(Debug, Clone)]
pub struct ClassifiedTable<'a> {
    pub rows: Vec<ClassifiedRecord<'a>>,
}

impl<'a> ClassifiedTable<'a> {
    pub fn absences(&self) -> impl Iterator<Item = &ClassifiedRecord<'a>> {
        self.rows.iter().filter(|row| row.record.is_absent())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_students: usize,
    pub total_days: usize,
    pub most_absent_student: Option<String>,
    pub most_absent_day: Option<NaiveDate>,
    pub total_absences: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipperCount {
    pub student_id: String,
    pub absences: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: u32,
    pub name: String,
    pub absences: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotAbsences {
    pub morning: usize,
    pub last_hour: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayCount {
    pub weekday: String,
    pub absences: usize,
}
