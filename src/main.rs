use sales_analyzer::config::{load_config, AppConfig, DotEnvCredentials, EnvCredentials};
use sales_analyzer::engine::OpenAiEngine;
use sales_analyzer::model::AnalysisValue;
use sales_analyzer::plot::FigureStore;
use sales_analyzer::SalesAnalyzer;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "config.json";
const DOTENV_PATH: &str = ".env";

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = if Path::new(CONFIG_PATH).exists() {
        match load_config(CONFIG_PATH) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("Config load error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        info!("No {} found, using defaults", CONFIG_PATH);
        AppConfig::default()
    };

    // Positional arguments override the configured data file and questions.
    let mut args = std::env::args().skip(1);
    let data_path = args.next().unwrap_or_else(|| config.data_path.clone());
    let questions: Vec<String> = match args.collect::<Vec<_>>() {
        rest if rest.is_empty() => config.questions.clone(),
        rest => vec![rest.join(" ")],
    };

    // The process environment wins over `.env`.
    let dotenv = if Path::new(DOTENV_PATH).exists() {
        DotEnvCredentials::load(DOTENV_PATH).unwrap_or_else(|e| {
            warn!("Ignoring {}: {}", DOTENV_PATH, e);
            DotEnvCredentials::default()
        })
    } else {
        DotEnvCredentials::default()
    };
    let credentials = (EnvCredentials, dotenv);

    let engine_config = config.engine.clone();
    let mut analyzer = match SalesAnalyzer::initialize(&credentials, &engine_config.api_key_env, |key| {
        OpenAiEngine::new(key, &engine_config)
    }) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Query engine ready: {}", analyzer.engine().model());

    if let Err(e) = analyzer.load_data(&data_path) {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let mut figures = FigureStore::new();
    for question in &questions {
        info!("Asking: {}", question);
        match analyzer.analyze(question).await {
            Ok(Some(AnalysisValue::Chart(bytes))) => {
                let id = figures.push(bytes);
                println!("Chart #{} generated", id);
            }
            Ok(Some(answer)) => println!("{}", answer),
            Ok(None) => println!("No result"),
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    if let Err(e) = analyzer.save_plot(&mut figures, &config.plot_path) {
        warn!("Failed to save plot: {}", e);
    }

    print_usage();
    ExitCode::SUCCESS
}

fn print_usage() {
    println!("\nPlease provide the path to your CSV file when running the program.");
    println!("Example usage:");
    println!("1. Load data:  sales-analyzer sales_data.csv");
    println!("2. Analyze:    sales-analyzer sales_data.csv What are the total sales by month?");
    println!("3. Save plot:  ask for a chart; it is written to plot_path in {}", CONFIG_PATH);
}

