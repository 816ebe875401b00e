pub mod analyzer;
pub mod config;
pub mod engine;
pub mod model;
pub mod plot;
pub mod table;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use analyzer::SalesAnalyzer;
pub use model::{AnalysisValue, AnalyzerError};
