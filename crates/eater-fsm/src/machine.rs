//! Traits a domain implements to run on the engine.

use core::fmt;

use crate::error::FsmError;
use crate::timers::Timers;

/// A finite set of states.
///
/// `index` must be a bijection onto `0..COUNT` and `initial` must have
/// index `0`.
pub trait FsmState: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Number of states.
    const COUNT: usize;

    /// Dense index of this state.
    fn index(self) -> usize;

    /// Name shown in the status attribute.
    fn name(self) -> &'static str;

    /// The state a fresh engine starts in.
    fn initial() -> Self;
}

/// A finite set of event kinds, possibly carrying payloads.
pub trait FsmEvent: fmt::Debug + Send + Sync + 'static {
    /// Number of event kinds.
    const COUNT: usize;

    /// Dense index of the event kind, independent of any payload.
    fn index(&self) -> usize;

    /// Event kind name for logs.
    fn name(&self) -> &'static str;

    /// Whether this kind carries a payload. Payload events can only be
    /// dispatched through [`Fsm::emit`](crate::Fsm::emit) and can never
    /// be postponed.
    fn carries_payload(&self) -> bool;
}

/// Handlers and context of one domain state machine.
pub trait Machine: Send + Sync + 'static {
    /// State set.
    type State: FsmState;
    /// Event set.
    type Event: FsmEvent;

    /// Handle `event` arriving in `state` and return the next state.
    ///
    /// Runs under the engine's write lock. `timers` schedules or cancels
    /// this engine's postponed events. Returning an error leaves the
    /// state unchanged.
    fn handle(
        &mut self,
        state: Self::State,
        event: Self::Event,
        timers: &mut Timers<Self::Event>,
    ) -> Result<Self::State, FsmError>;
}
