//! The engine: state, lock, dispatch, and the postponed-event worker.

use std::sync::{Arc, Weak};
use std::time::Duration;

use eater_status::{StatusAttr, StatusRegistry};
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::config::FsmConfig;
use crate::error::{FsmError, PostponeError};
use crate::machine::{FsmEvent, FsmState, Machine};
use crate::timers::Timers;

/// Everything protected by the engine lock.
struct Core<M: Machine> {
    state: M::State,
    machine: M,
    timers: Timers<M::Event>,
    stopped: bool,
}

/// State shared between the handle and the worker task.
struct Shared<M: Machine> {
    name: String,
    core: RwLock<Core<M>>,
    wake: Notify,
}

impl<M: Machine> Shared<M> {
    /// Run one event through the handler and commit the result.
    fn dispatch(&self, core: &mut Core<M>, event: M::Event) -> Result<(), FsmError> {
        assert!(
            event.index() < <M::Event as FsmEvent>::COUNT,
            "{}: event index {} out of range",
            self.name,
            event.index()
        );
        let from = core.state;
        let event_name = event.name();
        let Core {
            state,
            machine,
            timers,
            ..
        } = core;

        let next = machine.handle(from, event, timers)?;
        assert!(
            next.index() < <M::State as FsmState>::COUNT,
            "{}: handler for {event_name} returned state index {} out of range",
            self.name,
            next.index()
        );
        *state = next;
        debug!(
            fsm = self.name.as_str(),
            event = event_name,
            from = from.name(),
            to = next.name(),
            "Event handled"
        );
        Ok(())
    }

    /// Fire the earliest postponed event if it is due.
    fn fire_due(&self) {
        let mut core = self.core.write();
        if core.stopped {
            return;
        }
        let Some(event) = core.timers.pop_due(Instant::now()) else {
            return;
        };
        let event_name = event.name();
        if let Err(e) = self.dispatch(&mut core, event) {
            error!(
                fsm = self.name.as_str(),
                event = event_name,
                error = %e,
                "Postponed event handler failed"
            );
        }
        // The worker re-reads the deadline on its next iteration.
        core.timers.take_rearm();
    }

    fn next_wake(&self) -> Wake {
        let core = self.core.read();
        if core.stopped {
            return Wake::Stop;
        }
        core.timers.next_deadline().map_or(Wake::Idle, Wake::At)
    }
}

/// What the worker waits for next.
enum Wake {
    Stop,
    Idle,
    At(Instant),
}

/// Worker loop: sleep until the earliest deadline or a wake-up, then fire.
async fn run_worker<M: Machine>(shared: Arc<Shared<M>>) {
    loop {
        match shared.next_wake() {
            Wake::Stop => break,
            Wake::Idle => shared.wake.notified().await,
            Wake::At(at) => {
                tokio::select! {
                    () = tokio::time::sleep_until(at) => {}
                    () = shared.wake.notified() => {}
                }
            }
        }
        shared.fire_due();
    }
    debug!(fsm = shared.name.as_str(), "Postponed event worker stopped");
}

/// A running state machine.
///
/// Dropping the engine cleans it up (see [`Fsm::cleanup`]).
pub struct Fsm<M: Machine> {
    shared: Arc<Shared<M>>,
    status: StatusRegistry,
    state_attr: String,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<M: Machine> Fsm<M> {
    /// Create an engine in the initial state and start its worker.
    ///
    /// Registers the `<name>_state` status attribute. Must be called
    /// from within a Tokio runtime.
    pub fn new(
        name: &str,
        machine: M,
        status: &StatusRegistry,
        config: FsmConfig,
    ) -> Result<Self, FsmError> {
        validate_definition::<M>(name, config)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| FsmError::NoRuntime {
            name: name.to_owned(),
            reason: e.to_string(),
        })?;

        let initial = <M::State as FsmState>::initial();
        assert_eq!(initial.index(), 0, "{name}: initial state must have index 0");

        let shared = Arc::new(Shared {
            name: name.to_owned(),
            core: RwLock::new(Core {
                state: initial,
                machine,
                timers: Timers::new(config.max_postponed),
                stopped: false,
            }),
            wake: Notify::new(),
        });

        let state_attr = format!("{name}_state");
        let weak = Arc::downgrade(&shared);
        status.register(StatusAttr::new(state_attr.clone(), move || {
            weak.upgrade()
                .map_or_else(String::new, |shared| shared.core.read().state.name().to_owned())
        }))?;

        let worker = runtime.spawn(run_worker(Arc::clone(&shared)));
        debug!(fsm = name, state = initial.name(), "FSM initialized");

        Ok(Self {
            shared,
            status: status.clone(),
            state_attr,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Engine name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Dispatch an event.
    ///
    /// If the handler fails the state is left unchanged and the error is
    /// returned.
    ///
    /// # Panics
    ///
    /// Panics if the event or the returned state is out of range.
    pub fn emit(&self, event: M::Event) -> Result<(), FsmError> {
        let (result, rearm) = {
            let mut core = self.shared.core.write();
            if core.stopped {
                return Err(self.stopped());
            }
            let result = self.shared.dispatch(&mut core, event);
            (result, core.timers.take_rearm())
        };
        if rearm {
            self.shared.wake.notify_one();
        }
        result
    }

    /// Dispatch an event that carries no payload.
    ///
    /// # Panics
    ///
    /// Panics if `event` carries a payload.
    pub fn emit_no_payload(&self, event: M::Event) -> Result<(), FsmError> {
        assert!(
            !event.carries_payload(),
            "{}: payload event {} sent without payload path",
            self.shared.name,
            event.name()
        );
        self.emit(event)
    }

    /// Schedule `event` to fire after `delay`.
    ///
    /// # Panics
    ///
    /// Panics if `event` carries a payload.
    pub fn postpone(&self, event: M::Event, delay: Duration) -> Result<(), PostponeError> {
        self.with_timers(|timers| timers.postpone(event, delay))
    }

    /// Cancel every pending postponed event.
    ///
    /// Waits for an in-flight firing to finish; nothing cancelled fires
    /// after this returns.
    pub fn cancel_all_postponed(&self) {
        self.with_timers(Timers::cancel_all);
    }

    /// Cancel every pending postponed event of the same kind as `event`.
    pub fn cancel_postponed_by_type(&self, event: &M::Event) {
        self.with_timers(|timers| timers.cancel_by_type(event));
    }

    /// Current state.
    pub fn state(&self) -> M::State {
        self.shared.core.read().state
    }

    /// Number of pending postponed events.
    pub fn pending_postponed(&self) -> usize {
        self.shared.core.read().timers.len()
    }

    /// Number of pending postponed events of the same kind as `event`.
    pub fn pending_of(&self, event: &M::Event) -> usize {
        self.shared.core.read().timers.count_of(event)
    }

    /// Deadline of the earliest pending postponed event.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.shared.core.read().timers.next_deadline()
    }

    /// Read the state and context under the read lock.
    pub fn inspect<R>(&self, f: impl FnOnce(M::State, &M) -> R) -> R {
        let core = self.shared.core.read();
        f(core.state, &core.machine)
    }

    /// Build a status attribute rendering this engine's context.
    ///
    /// The callback runs under the read lock and renders an empty value
    /// once the engine is gone.
    pub fn attribute<F>(&self, name: &str, render: F) -> StatusAttr
    where
        F: Fn(M::State, &M) -> String + Send + Sync + 'static,
    {
        let weak: Weak<Shared<M>> = Arc::downgrade(&self.shared);
        StatusAttr::new(name, move || {
            weak.upgrade().map_or_else(String::new, |shared| {
                let core = shared.core.read();
                render(core.state, &core.machine)
            })
        })
    }

    /// Whether [`Fsm::cleanup`] has run.
    pub fn is_stopped(&self) -> bool {
        self.shared.core.read().stopped
    }

    /// Stop the engine.
    ///
    /// Cancels all postponed events, stops the worker, and removes the
    /// state attribute. Later emits fail with [`FsmError::Stopped`].
    /// Calling it again does nothing.
    pub fn cleanup(&self) {
        {
            let mut core = self.shared.core.write();
            if core.stopped {
                return;
            }
            core.stopped = true;
            core.timers.cancel_all();
            core.timers.take_rearm();
        }
        self.shared.wake.notify_one();
        if let Some(worker) = self.worker.lock().take() {
            worker.abort();
        }
        if let Err(e) = self.status.unregister(&self.state_attr) {
            warn!(fsm = self.shared.name.as_str(), error = %e, "State attribute already gone");
        }
        debug!(fsm = self.shared.name.as_str(), "FSM cleaned up");
    }

    fn with_timers<R>(&self, f: impl FnOnce(&mut Timers<M::Event>) -> R) -> R {
        let (result, rearm) = {
            let mut core = self.shared.core.write();
            let result = f(&mut core.timers);
            (result, core.timers.take_rearm())
        };
        if rearm {
            self.shared.wake.notify_one();
        }
        result
    }

    fn stopped(&self) -> FsmError {
        FsmError::Stopped {
            name: self.shared.name.clone(),
        }
    }
}

impl<M: Machine> Drop for Fsm<M> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn validate_definition<M: Machine>(name: &str, config: FsmConfig) -> Result<(), FsmError> {
    let reason = if name.is_empty() {
        Some("empty name")
    } else if <M::State as FsmState>::COUNT == 0 {
        Some("no states")
    } else if <M::Event as FsmEvent>::COUNT == 0 {
        Some("no events")
    } else if config.max_postponed == 0 {
        Some("zero postponed capacity")
    } else {
        None
    };
    reason.map_or(Ok(()), |reason| {
        Err(FsmError::InvalidDefinition {
            name: name.to_owned(),
            reason: reason.to_owned(),
        })
    })
}
