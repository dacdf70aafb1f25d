//! Bring the eater to life and serve it until it dies or is stopped.

use std::sync::Arc;

use eater_brain::{Brain, BrainError, Fate};
use eater_status::StatusRegistry;
use tokio::sync::watch;
use tracing::{error, info};

use crate::config::EaterConfig;
use crate::server::{ServerError, start_server};
use crate::state::AppState;

/// Errors that can stop the server from running the eater.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The eater could not be built.
    #[error("brain error: {source}")]
    Brain {
        /// The underlying brain error.
        #[from]
        source: BrainError,
    },

    /// The server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: ServerError,
    },
}

/// Build the eater against `status` and serve commands until Ctrl-C or
/// until the eater dies.
///
/// An eater still alive when serving stops is shut down nobly. Returns
/// how its life ended.
pub async fn run(config: EaterConfig, status: &StatusRegistry) -> Result<Fate, StartupError> {
    let brain = Arc::new(Brain::from_config(config.brain, config.fsm, status)?);
    let state = Arc::new(AppState::new(Arc::clone(&brain)));

    let served = start_server(&config.server, state, shutdown_signal(brain.subscribe_fate())).await;
    if brain.is_alive() {
        brain.die_nobly();
    }
    served?;
    Ok(brain.fate())
}

/// Resolves on Ctrl-C or on the eater's death, whichever comes first.
async fn shutdown_signal(mut fate: watch::Receiver<Fate>) {
    let death = async move {
        if fate.wait_for(|fate| !fate.is_alive()).await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
        },
        () = death => info!("The eater is dead, shutting down"),
    }
}
