// Analyzer module: the analysis session and its operations.

pub mod session;

pub use session::{SalesAnalyzer, DEFAULT_PLOT_FILE};
