//! Error types for the command API.
//!
//! [`ApiError`] unifies every way a request can fail. Its
//! [`IntoResponse`] implementation answers with the same
//! [`CommandResponse`] body a successful command gets, carrying the
//! negated errno in `status`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eater_brain::BrainError;
use eater_fsm::{FsmError, PostponeError};
use eater_types::{CommandResponse, errno};
use tracing::warn;

/// Errors that can occur in the command API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body is not a valid command.
    #[error("malformed command: {0}")]
    Malformed(String),

    /// A required attribute is missing or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested status attribute does not exist.
    #[error("no such attribute: {0}")]
    NotFound(String),

    /// The eater refused or failed the command.
    #[error("{source}")]
    Brain {
        /// The underlying brain error.
        #[from]
        source: BrainError,
    },
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl ApiError {
    /// Errno (positive) reported to the client.
    pub const fn errno(&self) -> i32 {
        match self {
            Self::Malformed(_) | Self::InvalidArgument(_) => errno::EINVAL,
            Self::NotFound(_) => errno::ENOENT,
            Self::Brain { source } => brain_errno(source),
        }
    }

    /// HTTP status paired with [`errno`](Self::errno).
    pub const fn http_status(&self) -> StatusCode {
        match self.errno() {
            errno::EINVAL => StatusCode::BAD_REQUEST,
            errno::ENOENT => StatusCode::NOT_FOUND,
            errno::ESRCH => StatusCode::GONE,
            errno::ENOMEM => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

const fn brain_errno(error: &BrainError) -> i32 {
    match error {
        BrainError::Dead => errno::ESRCH,
        BrainError::EmptyFood => errno::EINVAL,
        BrainError::Fsm { source, .. } => match source {
            FsmError::Postpone {
                source: PostponeError::QueueFull { .. },
            } => errno::ENOMEM,
            FsmError::Stopped { .. } => errno::ESRCH,
            _ => errno::EIO,
        },
        BrainError::Status { .. } | BrainError::Unanswered { .. } => errno::EIO,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let errno = self.errno();
        if status.is_server_error() {
            warn!(error = %self, errno, "Command failed");
        }
        let body = CommandResponse::failure(errno, self.to_string());
        (status, axum::Json(body)).into_response()
    }
}
