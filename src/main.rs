use std::process::ExitCode;

use tokio::io::{self, BufReader};
use tokio::signal;
use tracing::{error, info};
use tradebolt::infrastructure::bootstrap;
use tradebolt::infrastructure::config::Config;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = if std::path::Path::new(&path).exists() {
        match Config::load(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config {path}: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        eprintln!("Config {path} not found, using defaults");
        Config::default()
    };

    config.init_logging();
    info!(config = %path, "tradebolt starting");

    let runtime = match bootstrap::build_runtime(&config) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Failed to build runtime");
            return ExitCode::FAILURE;
        }
    };

    let stdin = BufReader::new(io::stdin());
    let stdout = io::stdout();
    let feed = runtime.feed();

    let code = tokio::select! {
        result = feed.run(stdin, stdout) => {
            match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!(error = %e, "Fatal error");
                    ExitCode::FAILURE
                }
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            ExitCode::SUCCESS
        }
    };

    for id in runtime.accounts.account_ids() {
        if let Some(engine) = runtime.accounts.get(&id) {
            let stats = engine.stats();
            info!(
                account = %id,
                completed = stats.total_completed,
                win_rate = stats.win_rate,
                pnl = %stats.realized_pnl,
                "Final account stats"
            );
        }
    }
    info!("tradebolt stopped");
    code
}
