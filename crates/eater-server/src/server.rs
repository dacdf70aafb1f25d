//! Command server lifecycle management.
//!
//! Provides [`start_server`] which binds to a TCP port and runs the
//! Axum server until the given shutdown future resolves.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::router::build_router;
use crate::state::AppState;

/// Start the command server.
///
/// Binds to the configured address, builds the router, and serves
/// requests until `shutdown` resolves. In-flight requests are allowed
/// to finish.
///
/// # Errors
///
/// Returns an error if the address is invalid, the TCP listener cannot
/// bind, or the server encounters a fatal I/O error.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "Command server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("Command server stopped");
    Ok(())
}

/// Errors that can occur when starting or running the command server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use eater_brain::{Brain, BrainConfig, FixedRandom};
    use eater_fsm::FsmConfig;
    use eater_status::StatusRegistry;

    use super::*;

    #[tokio::test]
    async fn invalid_host_is_a_bind_error() {
        let status = StatusRegistry::create("test");
        let brain = Brain::new(
            BrainConfig::default(),
            FsmConfig::default(),
            &status,
            Arc::new(FixedRandom(0)),
        )
        .unwrap();
        let config = ServerConfig {
            host: "not an address".to_owned(),
            port: 1,
        };
        let state = Arc::new(AppState::new(Arc::new(brain)));
        let result = start_server(&config, state, async {}).await;
        assert!(matches!(result, Err(ServerError::Bind(_))));
    }
}
