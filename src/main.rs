use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod fallback;
mod generator;
mod loader;
mod models;
mod patterns;
mod report;
mod router;
mod stats;

use generator::{HttpTextGenerator, ModelConfig};
use models::AttendanceTable;

#[derive(Parser)]
#[command(name = "attendance-insights")]
#[command(about = "Attendance statistics and question answering over session CSVs", long_about = None)]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ModelArgs {
    /// Text generation endpoint used when no built-in rule answers
    #[arg(long, global = true, env = "ATTENDANCE_MODEL_URL", default_value = generator::DEFAULT_MODEL_URL)]
    model_url: String,
    /// Bearer token for the text generation endpoint
    #[arg(long, global = true, env = "ATTENDANCE_MODEL_TOKEN", hide_env_values = true)]
    model_token: Option<String>,
    /// Request timeout for the text generation endpoint, in seconds
    #[arg(
        long,
        global = true,
        env = "ATTENDANCE_MODEL_TIMEOUT_SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    model_timeout_secs: u64,
}

impl From<ModelArgs> for ModelConfig {
    fn from(args: ModelArgs) -> Self {
        Self {
            url: args.model_url,
            token: args.model_token,
            timeout_secs: args.model_timeout_secs,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the first rows of an attendance file
    Preview {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
    /// Print summary statistics
    Summary {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the chart series (skippers, weekday and monthly absences)
    Charts {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Ask a question about the attendance data
    Ask {
        #[arg(long)]
        csv: PathBuf,
        /// Only use the built-in rules
        #[arg(long)]
        no_fallback: bool,
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn load(csv: &Path) -> anyhow::Result<AttendanceTable> {
    loader::load_path(csv).with_context(|| format!("failed to load {}", csv.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let model_config = ModelConfig::from(cli.model);

    match cli.command {
        Commands::Preview { csv, rows } => {
            let table = load(&csv)?;
            println!("Student_ID,Date,Time_Slot,Present");
            for record in loader::preview(&table, rows) {
                println!(
                    "{},{},{},{}",
                    record.student_id,
                    record.date,
                    record.time_slot,
                    u8::from(record.present)
                );
            }
            println!("({} rows total)", table.len());
        }
        Commands::Summary { csv, json } => {
            let table = load(&csv)?;
            let summary = stats::summarize(&table);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Attendance summary:");
                print!("{}", report::render_summary(&summary));
            }
        }
        Commands::Charts { csv, json } => {
            let table = load(&csv)?;
            let charts = report::ChartSet::build(&table);
            if json {
                println!("{}", serde_json::to_string_pretty(&charts)?);
            } else {
                print!("{}", report::render_charts(&charts));
            }
        }
        Commands::Ask {
            csv,
            no_fallback,
            question,
        } => {
            let table = load(&csv)?;
            let summary = stats::summarize(&table);
            let question = question.join(" ");

            let responder = if no_fallback {
                None
            } else {
                let generator = HttpTextGenerator::from_config(&model_config)
                    .context("failed to build text model client")?;
                Some(fallback::FallbackResponder::new(Box::new(generator)))
            };

            let answer =
                fallback::answer_question(&question, &table, &summary, responder.as_ref()).await;
            match answer.source {
                fallback::AnswerSource::Rule(name) => info!(rule = name, "answered by rule"),
                fallback::AnswerSource::Model => info!("answered by text model"),
                fallback::AnswerSource::Unanswered => info!("question left unanswered"),
            }
            println!("{}", answer.text);
        }
        Commands::Report { csv, out } => {
            let table = load(&csv)?;
            let summary = stats::summarize(&table);
            let charts = report::ChartSet::build(&table);
            let report = report::build_report(&csv.display().to_string(), &summary, &charts);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
