//! Entropy eater server binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `EATER_CONFIG` or `eater-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Bring the eater to life and serve commands
//! 4. On Ctrl-C, put the eater down nobly; if it dies of neglect, exit
//!    with a failure status

use std::process::ExitCode;

use eater_brain::Fate;
use eater_server::config::{EaterConfig, LoggingConfig};
use eater_status::StatusRegistry;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let loaded = EaterConfig::load();
    let logging = match &loaded {
        Ok((config, _)) => config.logging.clone(),
        Err(_) => LoggingConfig::default(),
    };
    init_tracing(&logging);

    let (config, path) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    match &path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        host = config.server.host,
        port = config.server.port,
        seed = ?config.brain.seed,
        max_postponed = config.fsm.max_postponed,
        "eater-server starting"
    );

    match eater_server::run(config, StatusRegistry::global()).await {
        Ok(Fate::Died(cause)) => {
            error!(%cause, "The eater died; exiting");
            ExitCode::FAILURE
        }
        Ok(fate) => {
            info!(?fate, "eater-server shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "eater-server failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
