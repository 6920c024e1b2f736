//! Keyword rules that answer common attendance questions straight from the
//! table. Rules are tried in order; the first whose predicate matches answers.

use tracing::debug;

use crate::models::{AttendanceTable, ClassifiedTable};
use crate::patterns::{self, is_last_hour_slot, is_morning_slot};
use crate::stats;

const TOP_MONTHS: usize = 3;
const TOP_SKIPPERS: usize = 5;

/// Data a rule handler can draw on.
pub struct RuleContext<'a> {
    pub table: &'a AttendanceTable,
    pub classified: &'a ClassifiedTable<'a>,
}

pub struct Rule {
    pub name: &'static str,
    /// Receives the lowercased question.
    pub matches: fn(&str) -> bool,
    pub answer: fn(&RuleContext<'_>) -> String,
}

pub static RULES: [Rule; 6] = [
    Rule {
        name: "month_absences",
        matches: asks_month_absences,
        answer: month_absences,
    },
    Rule {
        name: "monday_absences",
        matches: asks_monday_absences,
        answer: monday_absences,
    },
    Rule {
        name: "most_absent_student",
        matches: asks_most_absent_student,
        answer: most_absent_student,
    },
    Rule {
        name: "total_absences",
        matches: asks_total_absences,
        answer: total_absences,
    },
    Rule {
        name: "morning_skippers",
        matches: asks_morning_skippers,
        answer: morning_skippers,
    },
    Rule {
        name: "last_hour_skippers",
        matches: asks_last_hour_skippers,
        answer: last_hour_skippers,
    },
];

fn asks_month_absences(q: &str) -> bool {
    q.contains("month") && q.contains("absence")
}

fn asks_monday_absences(q: &str) -> bool {
    q.contains("monday") && q.contains("absence")
}

fn asks_most_absent_student(q: &str) -> bool {
    q.contains("most absent student") || q.contains("student with most absences")
}

fn asks_total_absences(q: &str) -> bool {
    q.contains("total absences")
}

fn asks_morning_skippers(q: &str) -> bool {
    q.contains("top students skipping morning") || q.contains("morning hour skippers")
}

fn asks_last_hour_skippers(q: &str) -> bool {
    q.contains("top students skipping last hour") || q.contains("last hour skippers")
}

/// First rule whose predicate accepts `question`, if any.
pub fn matched_rule(question: &str) -> Option<&'static Rule> {
    let normalized = question.to_lowercase();
    RULES.iter().find(|rule| (rule.matches)(&normalized))
}

/// Text produced by a rule, tagged with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleAnswer {
    pub rule: &'static str,
    pub text: String,
}

/// Answers `question` from the table, or `None` when no rule applies.
pub fn answer_rule(question: &str, table: &AttendanceTable) -> Option<RuleAnswer> {
    let rule = matched_rule(question)?;
    debug!(rule = rule.name, "question matched rule");

    let classified = patterns::classify(table);
    let context = RuleContext {
        table,
        classified: &classified,
    };
    Some(RuleAnswer {
        rule: rule.name,
        text: (rule.answer)(&context),
    })
}

fn month_absences(ctx: &RuleContext<'_>) -> String {
    let top = stats::top_months(ctx.classified, TOP_MONTHS);
    if top.is_empty() {
        return "No absences were recorded in any month.".to_string();
    }

    let names: Vec<&str> = top.iter().map(|entry| entry.name.as_str()).collect();
    let counts: Vec<usize> = top.iter().map(|entry| entry.absences).collect();
    format!(
        "The months with the highest absences are: {} with absences: {:?}.",
        names.join(", "),
        counts
    )
}

fn monday_absences(ctx: &RuleContext<'_>) -> String {
    let count = ctx
        .classified
        .absences()
        .filter(|row| row.weekday == chrono::Weekday::Mon)
        .count();
    format!("There were {count} absences on Mondays.")
}

fn most_absent_student(ctx: &RuleContext<'_>) -> String {
    match stats::summarize(ctx.table).most_absent_student {
        Some(student) => format!("The student with the most absences is Student ID {student}."),
        None => "No student has any recorded absences.".to_string(),
    }
}

fn total_absences(ctx: &RuleContext<'_>) -> String {
    format!(
        "The total number of absences is {}.",
        ctx.table.absences().count()
    )
}

fn morning_skippers(ctx: &RuleContext<'_>) -> String {
    let skippers = stats::top_k_skippers(ctx.table, is_morning_slot, TOP_SKIPPERS);
    if skippers.is_empty() {
        return "There are no significant morning hour skippers.".to_string();
    }
    let ids: Vec<&str> = skippers.iter().map(|s| s.student_id.as_str()).collect();
    format!("The top students skipping morning hours are: {}.", ids.join(", "))
}

fn last_hour_skippers(ctx: &RuleContext<'_>) -> String {
    let skippers = stats::top_k_skippers(ctx.table, is_last_hour_slot, TOP_SKIPPERS);
    if skippers.is_empty() {
        return "There are no significant last-hour skippers.".to_string();
    }
    let ids: Vec<&str> = skippers.iter().map(|s| s.student_id.as_str()).collect();
    format!(
        "The top students skipping the last hours are: {}.",
        ids.join(", ")
    )
}
