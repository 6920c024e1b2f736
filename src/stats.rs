use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use chrono::NaiveDate;

use crate::models::{
    AttendanceTable, ClassifiedTable, MonthCount, SkipperCount, SlotAbsences, Summary,
    WeekdayCount,
};
use crate::patterns;

pub fn summarize(table: &AttendanceTable) -> Summary {
    let students: HashSet<&str> = table
        .records
        .iter()
        .map(|record| record.student_id.as_str())
        .collect();
    let days: HashSet<NaiveDate> = table.records.iter().map(|record| record.date).collect();

    let by_student = count_in_order(table.absences().map(|record| record.student_id.as_str()));
    let by_day = count_in_order(table.absences().map(|record| record.date));

    Summary {
        total_students: students.len(),
        total_days: days.len(),
        most_absent_student: most_frequent(&by_student).map(|id| id.to_string()),
        most_absent_day: most_frequent(&by_day),
        total_absences: table.absences().count(),
    }
}

/// Absences per month, January first. Months without absences are left out.
pub fn monthly_absence_counts(classified: &ClassifiedTable<'_>) -> Vec<MonthCount> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for row in classified.absences() {
        *counts.entry(row.month).or_insert(0) += 1;
    }

    let mut months: Vec<MonthCount> = counts
        .into_iter()
        .map(|(month, absences)| MonthCount {
            month,
            name: patterns::month_name(month).to_string(),
            absences,
        })
        .collect();
    months.sort_by_key(|entry| entry.month);
    months
}

/// The `k` months with the most absences; equal counts keep calendar order.
pub fn top_months(classified: &ClassifiedTable<'_>, k: usize) -> Vec<MonthCount> {
    let mut months = monthly_absence_counts(classified);
    months.sort_by(|a, b| b.absences.cmp(&a.absences));
    months.truncate(k);
    months
}

pub fn weekday_absence_counts(classified: &ClassifiedTable<'_>) -> Vec<WeekdayCount> {
    let mut counts: HashMap<chrono::Weekday, usize> = HashMap::new();
    for row in classified.absences() {
        *counts.entry(row.weekday).or_insert(0) += 1;
    }

    let mut days: Vec<(chrono::Weekday, usize)> = counts.into_iter().collect();
    days.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then(a.0.num_days_from_monday().cmp(&b.0.num_days_from_monday()))
    });

    days.into_iter()
        .map(|(weekday, absences)| WeekdayCount {
            weekday: patterns::weekday_name(weekday).to_string(),
            absences,
        })
        .collect()
}

/// Absence totals for the morning and last-hour slot categories.
pub fn slot_absence_counts(classified: &ClassifiedTable<'_>) -> SlotAbsences {
    classified
        .absences()
        .fold(SlotAbsences::default(), |mut totals, row| {
            if row.is_morning {
                totals.morning += 1;
            }
            if row.is_last_hour {
                totals.last_hour += 1;
            }
            totals
        })
}

pub fn top_k_skippers<F>(table: &AttendanceTable, slot_predicate: F, k: usize) -> Vec<SkipperCount>
where
    F: Fn(&str) -> bool,
{
    let counts = count_in_order(
        table
            .absences()
            .filter(|record| slot_predicate(record.time_slot.as_str()))
            .map(|record| record.student_id.as_str()),
    );

    let mut skippers: Vec<SkipperCount> = counts
        .into_iter()
        .map(|(student_id, absences)| SkipperCount {
            student_id: student_id.to_string(),
            absences,
        })
        .collect();
    // Stable: equal counts stay in order of first appearance.
    skippers.sort_by(|a, b| b.absences.cmp(&a.absences));
    skippers.truncate(k);
    skippers
}

/// Counts keys, keeping the order in which each key first appears.
fn count_in_order<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Copy,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key, 1));
            }
        }
    }

    counts
}

fn most_frequent<K: Copy>(counts: &[(K, usize)]) -> Option<K> {
    let mut best: Option<(K, usize)> = None;
    for &(key, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}
