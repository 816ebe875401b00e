// Core types: analysis results and error enums
use crate::plot::FigureFormat;
use crate::table::Table;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Answer returned by a query engine. Opaque to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisValue {
    Text(String),
    Number(f64),
    Table(Table),
    /// Rendered figure bytes (SVG, PNG, ...), as produced by the engine.
    Chart(Vec<u8>),
}

impl fmt::Display for AnalysisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisValue::Text(text) => write!(f, "{}", text),
            AnalysisValue::Number(n) => write!(f, "{}", n),
            AnalysisValue::Table(table) => write!(f, "{}", table.to_csv_string().trim_end()),
            AnalysisValue::Chart(bytes) => write!(f, "<chart, {} bytes>", bytes.len()),
        }
    }
}

impl From<&str> for AnalysisValue {
    fn from(text: &str) -> Self {
        AnalysisValue::Text(text.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("{0}")]
    Configuration(String),
    #[error("CSV file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("{0}")]
    State(String),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Plot(#[from] PlotError),
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV file has no header row")]
    MissingHeader,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API responded [{status}]: {body}")]
    Api { status: u16, body: String },
    #[error("model returned no answer")]
    EmptyResponse,
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("failed to write plot: {0}")]
    Io(#[from] std::io::Error),
    #[error("no open figure")]
    NoFigure,
    #[error("cannot save {stored:?} figure as {}", .path.display())]
    UnsupportedFormat {
        path: PathBuf,
        stored: Option<FigureFormat>,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read .env: {0}")]
    DotEnv(#[from] dotenvy::Error),
}
