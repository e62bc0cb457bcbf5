//! biasctl - Risk Bias Detector console
//!
//! Asks an external language-model oracle whether security decisions are
//! biased, logs every answer and writes PDF reports on demand.

use std::path::PathBuf;

use bias_common::Config;
use biasctl::{bootstrap, errors};
use clap::Parser;
use tracing_subscriber::EnvFilter;

// Version is embedded at build time
const VERSION: &str = env!("BIAS_VERSION");

#[derive(Parser)]
#[command(name = "biasctl")]
#[command(about = "Risk Bias Detector - fairness assessment for security decisions", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Configuration file (default: ./files/detector.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(errors::EXIT_CONFIG_ERROR);
        }
    };
    init_tracing(&config.logging.level);
    tracing::info!("biasctl v{} starting", VERSION);

    match bootstrap::run(&config) {
        Ok(_) => std::process::exit(errors::EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(errors::exit_code_for(&e));
        }
    }
}
