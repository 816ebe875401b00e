use crate::model::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name of the variable holding the API key.
    pub api_key_env: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    /// Honour HTTP(S)_PROXY from the environment.
    pub use_system_proxy: bool,
    /// Rows of the table shown to the model alongside the schema.
    pub preview_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            timeout_seconds: 60,
            use_system_proxy: true,
            preview_rows: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_path: String,
    pub plot_path: String,
    pub questions: Vec<String>,
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: "sample_sales_data.csv".to_string(),
            // Charts come back from the engine as SVG.
            plot_path: "analysis_plot.svg".to_string(),
            questions: vec!["What are the total sales by month?".to_string()],
            engine: EngineConfig::default(),
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Named slot a credential can be looked up in.
pub trait CredentialSource {
    fn credential(&self, name: &str) -> Option<String>;
}

/// Reads credentials from the process environment.
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn credential(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl CredentialSource for HashMap<String, String> {
    fn credential(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Variables read from a `.env` file. The process environment is left untouched.
#[derive(Default)]
pub struct DotEnvCredentials {
    vars: HashMap<String, String>,
}

impl DotEnvCredentials {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> =
            dotenvy::from_path_iter(path.as_ref())?.collect::<Result<_, dotenvy::Error>>()?;
        Ok(Self { vars })
    }
}

impl CredentialSource for DotEnvCredentials {
    fn credential(&self, name: &str) -> Option<String> {
        self.vars.credential(name)
    }
}

/// Looks in the first source, then falls back to the second.
impl<A: CredentialSource, B: CredentialSource> CredentialSource for (A, B) {
    fn credential(&self, name: &str) -> Option<String> {
        self.0.credential(name).or_else(|| self.1.credential(name))
    }
}
