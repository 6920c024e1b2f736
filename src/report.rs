use std::fmt::Write;

use serde::Serialize;

use crate::models::{
    AttendanceTable, MonthCount, SkipperCount, SlotAbsences, Summary, WeekdayCount,
};
use crate::patterns::{self, is_last_hour_slot, is_morning_slot};
use crate::stats;

const CHART_SKIPPERS: usize = 10;

/// Series behind each attendance chart, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSet {
    pub top_morning_skippers: Vec<SkipperCount>,
    pub top_last_hour_skippers: Vec<SkipperCount>,
    pub slot_absences: SlotAbsences,
    pub weekday_absences: Vec<WeekdayCount>,
    pub monthly_absences: Vec<MonthCount>,
}

impl ChartSet {
    pub fn build(table: &AttendanceTable) -> Self {
        let classified = patterns::classify(table);
        Self {
            top_morning_skippers: stats::top_k_skippers(table, is_morning_slot, CHART_SKIPPERS),
            top_last_hour_skippers: stats::top_k_skippers(
                table,
                is_last_hour_slot,
                CHART_SKIPPERS,
            ),
            slot_absences: stats::slot_absence_counts(&classified),
            weekday_absences: stats::weekday_absence_counts(&classified),
            monthly_absences: stats::monthly_absence_counts(&classified),
        }
    }
}

pub fn render_summary(summary: &Summary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "- Total students: {}", summary.total_students);
    let _ = writeln!(output, "- Total days: {}", summary.total_days);
    let _ = writeln!(
        output,
        "- Most absent student: {}",
        summary.most_absent_student.as_deref().unwrap_or("none")
    );
    let _ = writeln!(
        output,
        "- Day with most absences: {}",
        summary
            .most_absent_day
            .map(|date| date.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    let _ = writeln!(output, "- Total absences: {}", summary.total_absences);
    output
}

pub fn render_charts(charts: &ChartSet) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Top Morning Skippers (9:00 AM - 10:00 AM)");
    write_skippers(&mut output, &charts.top_morning_skippers);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Top Last Hour Skippers (2:00 PM - 4:00 PM)");
    write_skippers(&mut output, &charts.top_last_hour_skippers);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Absences by Slot");
    let _ = writeln!(output, "- Morning: {}", charts.slot_absences.morning);
    let _ = writeln!(output, "- Last hour: {}", charts.slot_absences.last_hour);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Absences by Weekday");
    if charts.weekday_absences.is_empty() {
        let _ = writeln!(output, "No absences recorded.");
    } else {
        for entry in &charts.weekday_absences {
            let _ = writeln!(output, "- {}: {}", entry.weekday, entry.absences);
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Monthly Absences");
    if charts.monthly_absences.is_empty() {
        let _ = writeln!(output, "No absences recorded.");
    } else {
        for entry in &charts.monthly_absences {
            let _ = writeln!(output, "- {}: {}", entry.name, entry.absences);
        }
    }

    output
}

pub fn build_report(source: &str, summary: &Summary, charts: &ChartSet) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Insights Report");
    let _ = writeln!(output, "Generated from {source}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    output.push_str(&render_summary(summary));
    let _ = writeln!(output);
    output.push_str(&render_charts(charts));

    output
}

fn write_skippers(output: &mut String, skippers: &[SkipperCount]) {
    if skippers.is_empty() {
        let _ = writeln!(output, "No skippers in this slot.");
        return;
    }
    for entry in skippers {
        let _ = writeln!(
            output,
            "- Student {}: {} absences",
            entry.student_id, entry.absences
        );
    }
}
