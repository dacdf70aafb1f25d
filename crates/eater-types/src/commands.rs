//! Command requests and responses.
//!
//! A request names a command and carries optional attributes. Attributes
//! a command does not use are ignored; a command whose required attribute
//! is missing is rejected by the server with `-EINVAL`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::RpsOutcome;

/// The commands the eater understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Handshake; no attributes.
    Hello,
    /// Feed the eater; requires `food`.
    Feed,
    /// Clean up after the eater.
    Sweep,
    /// Clear an infection.
    Disinfect,
    /// Treat an illness.
    Cure,
    /// Play rock-paper-scissors; requires `rps_sign`.
    PlayRps,
}

impl CommandKind {
    /// Wire name of the command.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hello => "hello",
            Self::Feed => "feed",
            Self::Sweep => "sweep",
            Self::Disinfect => "disinfect",
            Self::Cure => "cure",
            Self::PlayRps => "play_rps",
        }
    }
}

/// A command sent to the eater.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Which command to run.
    pub command: CommandKind,
    /// Food bytes for [`CommandKind::Feed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<Vec<u8>>,
    /// Sign wire value for [`CommandKind::PlayRps`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rps_sign: Option<u8>,
}

impl CommandRequest {
    /// A request with no attributes.
    pub const fn bare(command: CommandKind) -> Self {
        Self {
            command,
            food: None,
            rps_sign: None,
        }
    }

    /// A feed request.
    pub const fn feed(food: Vec<u8>) -> Self {
        Self {
            command: CommandKind::Feed,
            food: Some(food),
            rps_sign: None,
        }
    }

    /// A rock-paper-scissors request.
    pub const fn play_rps(sign: u8) -> Self {
        Self {
            command: CommandKind::PlayRps,
            food: None,
            rps_sign: Some(sign),
        }
    }
}

/// Handshake payload returned by [`CommandKind::Hello`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloInfo {
    /// Server name.
    pub server: String,
    /// Server version.
    pub version: String,
    /// When the eater was born.
    pub started_at: DateTime<Utc>,
}

/// Reply to a [`CommandRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// `0` on success, a negated errno otherwise.
    pub status: i32,
    /// What the eater had to say.
    pub message: String,
    /// Game details for [`CommandKind::PlayRps`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rps: Option<RpsOutcome>,
    /// Handshake details for [`CommandKind::Hello`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hello: Option<HelloInfo>,
}

impl CommandResponse {
    /// A successful response with a message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: crate::errno::OK,
            message: message.into(),
            rps: None,
            hello: None,
        }
    }

    /// A failed response carrying a negated errno.
    pub fn failure(errno: i32, message: impl Into<String>) -> Self {
        Self {
            status: errno.saturating_neg(),
            message: message.into(),
            rps: None,
            hello: None,
        }
    }

    /// Whether the command succeeded.
    pub const fn is_ok(&self) -> bool {
        self.status == crate::errno::OK
    }
}

/// All status attributes keyed by name.
pub type StatusSnapshot = BTreeMap<String, String>;
