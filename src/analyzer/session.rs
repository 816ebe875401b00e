use crate::config::CredentialSource;
use crate::engine::{DataView, QueryEngine};
use crate::model::{AnalysisValue, AnalyzerError, EngineError};
use crate::plot::PlotBackend;
use crate::table::{self, Table};
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_PLOT_FILE: &str = "analysis_plot.png";

/// One analysis workflow: a query engine bound at construction and the
/// table most recently loaded.
pub struct SalesAnalyzer<E: QueryEngine> {
    engine: E,
    table: Option<Table>,
}

impl<E: QueryEngine> SalesAnalyzer<E> {
    /// Looks up the credential `key_name` in `source` and builds the engine
    /// from it. `build` is not called when the credential is missing or blank.
    pub fn initialize<S, F>(source: &S, key_name: &str, build: F) -> Result<Self, AnalyzerError>
    where
        S: CredentialSource + ?Sized,
        F: FnOnce(String) -> Result<E, EngineError>,
    {
        let credential = source
            .credential(key_name)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AnalyzerError::Configuration(format!(
                    "API key not found. Please set {} in the environment or a .env file",
                    key_name
                ))
            })?;

        let engine = build(credential).map_err(|e| {
            AnalyzerError::Configuration(format!("failed to create query engine: {}", e))
        })?;
        Ok(Self::with_engine(engine))
    }

    pub fn with_engine(engine: E) -> Self {
        Self { engine, table: None }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The loaded table, if any. Present but empty after loading a header-only file.
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Parses the CSV at `path` and replaces the current table with it.
    /// On any error the current table is left as it was.
    pub fn load_data<P: AsRef<Path>>(&mut self, path: P) -> Result<(), AnalyzerError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalyzerError::NotFound(path.to_path_buf()));
        }

        info!("Loading data from {}", path.display());
        let table = table::load_csv(path)?;
        info!("Loaded {} rows, {} columns", table.len(), table.columns().len());
        self.table = Some(table);
        Ok(())
    }

    /// Asks the engine `query` about the loaded table.
    ///
    /// Engine failures are logged and come back as `Ok(None)`; only a missing
    /// table is an error.
    pub async fn analyze(&self, query: &str) -> Result<Option<AnalysisValue>, AnalyzerError> {
        let table = self.table.as_ref().ok_or_else(|| {
            AnalyzerError::State("No data loaded. Please load a CSV file first".to_string())
        })?;

        let view = DataView::new(table, query);
        match self.engine.chat(&view).await {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                error!("Error during analysis: {}", e);
                Ok(None)
            }
        }
    }

    /// Saves the open figure of `plots` to `filename` and closes it. Does
    /// nothing, silently, when no figure is open.
    ///
    /// Needs no loaded data; it lives on the session so callers drive the
    /// whole workflow through one handle.
    pub fn save_plot<B, P>(&self, plots: &mut B, filename: P) -> Result<(), AnalyzerError>
    where
        B: PlotBackend + ?Sized,
        P: AsRef<Path>,
    {
        if plots.open_figures().is_empty() {
            return Ok(());
        }
        let filename = filename.as_ref();
        plots.save(filename)?;
        plots.close();
        info!("Plot saved as {}", filename.display());
        Ok(())
    }

    pub fn save_default_plot<B: PlotBackend + ?Sized>(&self, plots: &mut B) -> Result<(), AnalyzerError> {
        self.save_plot(plots, DEFAULT_PLOT_FILE)
    }
}
