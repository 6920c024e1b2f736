use std::fmt::Write;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::generator::{GenerationParams, TextGenerator};
use crate::models::{AttendanceTable, Summary};
use crate::router;

pub const MODEL_UNAVAILABLE: &str =
    "The language model is currently unavailable; try one of the built-in attendance questions instead.";
pub const MODEL_EMPTY: &str = "The language model returned no answer.";

const SPECIAL_TOKENS: [&str; 4] = ["<pad>", "</s>", "<s>", "<unk>"];

/// Answers questions no rule covers by handing the summary to a text model.
#[derive(Clone)]
pub struct FallbackResponder {
    // Inference runtimes are rarely safe to call concurrently.
    generator: Arc<Mutex<Box<dyn TextGenerator>>>,
    params: GenerationParams,
}

impl FallbackResponder {
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self::with_params(generator, GenerationParams::default())
    }

    pub fn with_params(generator: Box<dyn TextGenerator>, params: GenerationParams) -> Self {
        Self {
            generator: Arc::new(Mutex::new(generator)),
            params,
        }
    }

    pub async fn generate_reply(&self, summary: &Summary, question: &str) -> String {
        let prompt = build_prompt(summary, question);
        let result = {
            let generator = self.generator.lock().await;
            generator.generate(&prompt, &self.params).await
        };

        match result {
            Ok(text) => {
                let cleaned = strip_special_tokens(&text);
                if cleaned.is_empty() {
                    MODEL_EMPTY.to_string()
                } else {
                    cleaned
                }
            }
            Err(err) => {
                warn!(error = %err, "text model failed");
                MODEL_UNAVAILABLE.to_string()
            }
        }
    }
}

pub fn build_prompt(summary: &Summary, question: &str) -> String {
    let student = summary.most_absent_student.as_deref().unwrap_or("none");
    let day = summary
        .most_absent_day
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "none".to_string());

    let mut prompt = String::new();
    let _ = writeln!(prompt, "The attendance data summary is as follows:");
    let _ = writeln!(prompt, "- Total number of students: {}", summary.total_students);
    let _ = writeln!(prompt, "- Total number of days: {}", summary.total_days);
    let _ = writeln!(prompt, "- Student ID with most absences: {student}");
    let _ = writeln!(prompt, "- Date with the most absences: {day}");
    let _ = writeln!(prompt, "- Total number of absences: {}", summary.total_absences);
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "User's Question: {question}");
    let _ = write!(
        prompt,
        "Please analyze the patterns and provide a detailed and easy-to-understand answer."
    );
    prompt
}

pub fn strip_special_tokens(text: &str) -> String {
    let mut cleaned = text.to_string();
    for token in SPECIAL_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    cleaned.trim().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSource {
    Rule(&'static str),
    Model,
    Unanswered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub source: AnswerSource,
    pub text: String,
}

/// Tries the keyword rules first and only then the model, if one is given.
pub async fn answer_question(
    question: &str,
    table: &AttendanceTable,
    summary: &Summary,
    responder: Option<&FallbackResponder>,
) -> Answer {
    if let Some(answer) = router::answer_rule(question, table) {
        return Answer {
            source: AnswerSource::Rule(answer.rule),
            text: answer.text,
        };
    }

    match responder {
        Some(responder) => {
            info!("no rule matched; asking text model");
            Answer {
                source: AnswerSource::Model,
                text: responder.generate_reply(summary, question).await,
            }
        }
        None => Answer {
            source: AnswerSource::Unanswered,
            text: "No built-in rule covers that question.".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::models::AttendanceRecord;
    use crate::stats;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex as StdMutex;

    struct ScriptedGenerator {
        reply: Result<String, String>,
        prompts: Arc<StdMutex<Vec<String>>>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            prompt: &str,
            _params: &GenerationParams,
        ) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(GenerationError::Response)
        }
    }

    fn scripted(reply: Result<&str, &str>) -> (FallbackResponder, Arc<StdMutex<Vec<String>>>) {
        let prompts = Arc::new(StdMutex::new(Vec::new()));
        let generator = ScriptedGenerator {
            reply: reply.map(str::to_string).map_err(str::to_string),
            prompts: prompts.clone(),
        };
        (FallbackResponder::new(Box::new(generator)), prompts)
    }

    fn sample_summary() -> Summary {
        Summary {
            total_students: 4,
            total_days: 7,
            most_absent_student: Some("5".to_string()),
            most_absent_day: NaiveDate::from_ymd_opt(2024, 1, 1),
            total_absences: 3,
        }
    }

    fn sample_table() -> AttendanceTable {
        AttendanceTable::new(vec![
            AttendanceRecord {
                student_id: "5".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                time_slot: "9:00 AM".to_string(),
                present: false,
            },
            AttendanceRecord {
                student_id: "6".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                time_slot: "2:00 PM".to_string(),
                present: true,
            },
        ])
    }

    #[test]
    fn prompt_embeds_every_summary_field() {
        let prompt = build_prompt(&sample_summary(), "what is the weather");
        assert_eq!(
            prompt,
            "The attendance data summary is as follows:\n\
             - Total number of students: 4\n\
             - Total number of days: 7\n\
             - Student ID with most absences: 5\n\
             - Date with the most absences: 2024-01-01\n\
             - Total number of absences: 3\n\
             \n\
             User's Question: what is the weather\n\
             Please analyze the patterns and provide a detailed and easy-to-understand answer."
        );
    }

    #[test]
    fn prompt_marks_missing_absence_data() {
        let summary = Summary {
            total_students: 1,
            total_days: 1,
            most_absent_student: None,
            most_absent_day: None,
            total_absences: 0,
        };
        let prompt = build_prompt(&summary, "anything");
        assert!(prompt.contains("- Student ID with most absences: none\n"));
        assert!(prompt.contains("- Date with the most absences: none\n"));
    }

    #[test]
    fn special_tokens_are_removed() {
        assert_eq!(
            strip_special_tokens("<pad> Mondays are worst.</s>"),
            "Mondays are worst."
        );
        assert_eq!(strip_special_tokens("<pad></s>"), "");
    }

    #[tokio::test]
    async fn reply_is_cleaned_model_text() {
        let (responder, prompts) = scripted(Ok("<pad> Attendance dips on Mondays.</s>"));
        let reply = responder
            .generate_reply(&sample_summary(), "why?")
            .await;
        assert_eq!(reply, "Attendance dips on Mondays.");
        assert_eq!(prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn model_failure_degrades_gracefully() {
        let (responder, _) = scripted(Err("connection refused"));
        let reply = responder.generate_reply(&sample_summary(), "why?").await;
        assert_eq!(reply, MODEL_UNAVAILABLE);

        let (responder, _) = scripted(Ok("  <pad> "));
        let reply = responder.generate_reply(&sample_summary(), "why?").await;
        assert_eq!(reply, MODEL_EMPTY);
    }

    #[tokio::test]
    async fn rule_answers_skip_the_model() {
        let (responder, prompts) = scripted(Ok("model text"));
        let table = sample_table();
        let summary = stats::summarize(&table);

        let answer = answer_question("total absences?", &table, &summary, Some(&responder)).await;
        assert_eq!(answer.source, AnswerSource::Rule("total_absences"));
        assert_eq!(answer.text, "The total number of absences is 1.");
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unmatched_question_falls_back_with_summary_prompt() {
        let (responder, prompts) = scripted(Ok("It is sunny."));
        let table = sample_table();
        let summary = stats::summarize(&table);

        let answer =
            answer_question("what is the weather", &table, &summary, Some(&responder)).await;
        assert_eq!(answer.source, AnswerSource::Model);
        assert_eq!(answer.text, "It is sunny.");

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0], build_prompt(&summary, "what is the weather"));
    }

    #[tokio::test]
    async fn unmatched_question_without_model_is_unanswered() {
        let table = sample_table();
        let summary = stats::summarize(&table);
        let answer = answer_question("what is the weather", &table, &summary, None).await;
        assert_eq!(answer.source, AnswerSource::Unanswered);
    }
}
