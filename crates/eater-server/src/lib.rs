//! Command server for the entropy eater.
//!
//! An Axum HTTP server that delivers commands to a running [`Brain`]
//! and exposes its status attributes:
//!
//! - `POST /api/commands` takes a JSON [`CommandRequest`] and answers
//!   with a [`CommandResponse`] whose `status` is `0` or a negated errno
//! - `GET /status` and `GET /status/{name}` read the status registry
//!
//! [`startup::run`] ties the lifetime of the server to the eater's: the
//! server stops when the eater dies, and a stopped server puts a living
//! eater down nobly.
//!
//! [`Brain`]: eater_brain::Brain
//! [`CommandRequest`]: eater_types::CommandRequest
//! [`CommandResponse`]: eater_types::CommandResponse

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

pub use config::{ConfigError, EaterConfig, ServerConfig};
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use startup::{StartupError, run};
pub use state::AppState;
