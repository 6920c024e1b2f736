//! Error types for loading attendance data and talking to the text model.

use thiserror::Error;

/// Failures while reading an attendance CSV.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read attendance file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("row {row}: column Date has unparseable value {value:?}")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: column Present must be 0 or 1, got {value:?}")]
    InvalidPresent { row: usize, value: String },
}

/// Failures from the generative text model.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("request to text model failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("text model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected text model response: {0}")]
    Response(String),
}
