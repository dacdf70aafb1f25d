//! Error types for the brain.

use eater_fsm::FsmError;

/// Errors surfaced by the fallible brain operations.
#[derive(Debug, thiserror::Error)]
pub enum BrainError {
    /// A domain state machine failed to start or to handle an event.
    #[error("{fsm}: {source}")]
    Fsm {
        /// Which state machine failed.
        fsm: &'static str,
        /// The underlying engine error.
        source: FsmError,
    },

    /// Registering a status attribute failed.
    #[error("status error: {source}")]
    Status {
        /// The underlying registry error.
        #[from]
        source: eater_status::StatusError,
    },

    /// Food must contain at least one byte.
    #[error("food must not be empty")]
    EmptyFood,

    /// A game was played but its result never came back.
    #[error("game was not resolved: {source}")]
    Unanswered {
        /// The reply channel error.
        source: tokio::sync::oneshot::error::TryRecvError,
    },

    /// The eater is no longer alive.
    #[error("the eater is dead")]
    Dead,
}

impl BrainError {
    /// Wrap an engine error with the name of the machine that raised it.
    pub const fn fsm(fsm: &'static str, source: FsmError) -> Self {
        Self::Fsm { fsm, source }
    }
}
