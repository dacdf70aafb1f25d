//! Shared application state for the command server.

use std::sync::Arc;

use eater_brain::Brain;
use eater_status::StatusRegistry;

/// Name the server reports in the handshake.
pub const SERVER_NAME: &str = "entropy eater server";

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// The eater every command is delivered to.
    pub brain: Arc<Brain>,
}

impl AppState {
    /// Create application state around a running eater.
    pub const fn new(brain: Arc<Brain>) -> Self {
        Self { brain }
    }

    /// Registry the eater publishes its attributes to.
    pub fn status(&self) -> &StatusRegistry {
        self.brain.status()
    }
}
