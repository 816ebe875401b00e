// Query engine seam: natural-language questions over a table

pub mod openai;
pub mod prompt;

pub use openai::OpenAiEngine;

use crate::model::{AnalysisValue, EngineError};
use crate::table::Table;

/// A question bound to the table it is asked about. Built per call and
/// discarded afterwards.
#[derive(Debug, Clone, Copy)]
pub struct DataView<'a> {
    pub table: &'a Table,
    pub query: &'a str,
}

impl<'a> DataView<'a> {
    pub fn new(table: &'a Table, query: &'a str) -> Self {
        Self { table, query }
    }
}

#[async_trait::async_trait]
pub trait QueryEngine: Send + Sync {
    async fn chat(&self, view: &DataView<'_>) -> Result<AnalysisValue, EngineError>;
}
