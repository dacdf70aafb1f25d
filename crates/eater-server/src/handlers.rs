//! Endpoint handlers for the command server.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/commands` | Deliver a [`CommandRequest`] to the eater |
//! | `GET` | `/status` | All status attributes as a JSON object |
//! | `GET` | `/status/{name}` | One status attribute as text |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use eater_types::{CommandKind, CommandRequest, CommandResponse, HelloInfo, RpsSign, StatusSnapshot};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{AppState, SERVER_NAME};

/// Run one command against the eater.
///
/// Malformed bodies (including unknown commands) are rejected with
/// `-EINVAL` before anything reaches the eater.
pub async fn post_command(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Json(request) = payload?;
    let command = request.command;
    debug!(command = command.name(), "Command received");
    let response = execute(&state, request)?;
    debug!(command = command.name(), reply = %response.message, "Command done");
    Ok(Json(response))
}

fn execute(state: &AppState, request: CommandRequest) -> Result<CommandResponse, ApiError> {
    let brain = &state.brain;
    match request.command {
        CommandKind::Hello => {
            info!("hello from {SERVER_NAME}");
            let mut response = CommandResponse::ok(format!("hello from {SERVER_NAME}"));
            response.hello = Some(HelloInfo {
                server: SERVER_NAME.to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                started_at: brain.started_at(),
            });
            Ok(response)
        }
        CommandKind::Feed => {
            let food = request
                .food
                .ok_or_else(|| ApiError::InvalidArgument("feed requires food".to_owned()))?;
            let bytes = food.len();
            brain.feed(food)?;
            Ok(CommandResponse::ok(format!("ate {bytes} bytes")))
        }
        CommandKind::Sweep => {
            brain.sweep()?;
            Ok(CommandResponse::ok("swept"))
        }
        CommandKind::Disinfect => {
            brain.disinfect()?;
            Ok(CommandResponse::ok("disinfected"))
        }
        CommandKind::Cure => {
            brain.cure()?;
            Ok(CommandResponse::ok("cured"))
        }
        CommandKind::PlayRps => {
            let raw = request
                .rps_sign
                .ok_or_else(|| ApiError::InvalidArgument("play_rps requires rps_sign".to_owned()))?;
            let sign = RpsSign::from_u8(raw)
                .ok_or_else(|| ApiError::InvalidArgument(format!("rps_sign out of range: {raw}")))?;
            let outcome = brain.play_rps(sign)?;
            let mut response = CommandResponse::ok(outcome.verdict());
            response.rps = Some(outcome);
            Ok(response)
        }
    }
}

/// Every status attribute, sorted by name.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    Json(state.status().snapshot())
}

/// One status attribute, newline-terminated.
pub async fn get_status_attr(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<String, ApiError> {
    state.status().read(&name).ok_or(ApiError::NotFound(name))
}
