//! Generic finite state machine engine.
//!
//! An [`Fsm`] owns a [`Machine`] (the domain handlers plus their context),
//! the current state, and a queue of postponed events. Every event, live
//! or postponed, is dispatched under one write lock, so handlers of a
//! single engine never run concurrently.
//!
//! # Postponed events
//!
//! Handlers schedule future events through the [`Timers`] handle passed
//! to [`Machine::handle`]. Each engine runs one background Tokio task
//! that sleeps until the earliest deadline, then fires due events in
//! deadline order (FIFO for equal deadlines). Cancellation takes the
//! same write lock as dispatch, so once [`Fsm::cancel_postponed_by_type`]
//! or [`Fsm::cancel_all_postponed`] returns, no cancelled event can fire.
//!
//! # Introspection
//!
//! Each engine registers a `<name>_state` attribute in the
//! [`StatusRegistry`](eater_status::StatusRegistry) holding the current
//! state name. [`Fsm::attribute`] builds further attributes that read
//! the machine context under the read lock.

pub mod config;
pub mod engine;
pub mod error;
pub mod machine;
pub mod timers;

pub use config::FsmConfig;
pub use engine::Fsm;
pub use error::{FsmError, PostponeError};
pub use machine::{FsmEvent, FsmState, Machine};
pub use timers::Timers;
