use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    /// Team name is not an exact key of the strength table.
    #[error("unknown team: {0}")]
    UnknownTeam(String),

    #[error("upstream returned http {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("model artifacts do not match: {0}")]
    ArtifactMismatch(String),

    #[error("schema drift in {}: expected [{expected}], found [{found}]", file.display())]
    SchemaDrift {
        file: PathBuf,
        expected: String,
        found: String,
    },

    #[error("invalid table data: {0}")]
    InvalidData(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PredictError>;
