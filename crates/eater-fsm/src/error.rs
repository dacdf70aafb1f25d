//! Error types for the FSM engine.
//!
//! Programmer errors (out-of-range events or states, payload events on
//! the no-payload path) panic. Everything here is recoverable.

/// Failure to schedule a postponed event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostponeError {
    /// The postponed queue is at capacity or could not grow.
    #[error("postponed event queue is full (capacity {capacity})")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// `now + delay` is not representable.
    #[error("postpone delay overflows the clock")]
    DeadlineOverflow,
}

/// Errors that can occur when creating or driving an engine.
#[derive(Debug, thiserror::Error)]
pub enum FsmError {
    /// The state or event set is empty, or the name is unusable.
    #[error("invalid FSM definition for {name}: {reason}")]
    InvalidDefinition {
        /// FSM name.
        name: String,
        /// What is wrong with the definition.
        reason: String,
    },

    /// Registering or removing the state attribute failed.
    #[error("status attribute error: {source}")]
    Status {
        /// The underlying registry error.
        #[from]
        source: eater_status::StatusError,
    },

    /// A handler could not schedule a postponed event.
    #[error("postpone failed: {source}")]
    Postpone {
        /// The underlying scheduling error.
        #[from]
        source: PostponeError,
    },

    /// A handler refused the event.
    #[error("{fsm} rejected {event} in state {state}: {reason}")]
    Rejected {
        /// FSM name.
        fsm: String,
        /// Event name.
        event: &'static str,
        /// State the event arrived in.
        state: &'static str,
        /// Why the handler refused it.
        reason: String,
    },

    /// The engine has been cleaned up.
    #[error("FSM {name} is stopped")]
    Stopped {
        /// FSM name.
        name: String,
    },

    /// No Tokio runtime is available to drive postponed events.
    #[error("FSM {name} needs a Tokio runtime: {reason}")]
    NoRuntime {
        /// FSM name.
        name: String,
        /// Why the runtime lookup failed.
        reason: String,
    },
}
