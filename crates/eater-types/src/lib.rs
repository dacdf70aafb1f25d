//! Shared wire types for the entropy eater.
//!
//! Everything that crosses the boundary between the command server and
//! its clients lives here so both sides agree on one definition.
//!
//! # Modules
//!
//! - [`enums`] -- Rock-paper-scissors signs and game results
//! - [`commands`] -- Command requests, responses, and the handshake payload
//! - [`errno`] -- Errno-style status codes carried in responses

pub mod commands;
pub mod enums;
pub mod errno;

pub use commands::{CommandKind, CommandRequest, CommandResponse, HelloInfo, StatusSnapshot};
pub use enums::{ParseSignError, RpsOutcome, RpsResult, RpsSign};
