//! Integration tests for the FSM engine.
//!
//! Timer tests run on a paused Tokio clock so deadlines are exact and
//! nothing depends on wall time. The concurrency tests use a
//! multi-threaded runtime and real threads.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use eater_fsm::{Fsm, FsmConfig, FsmError, FsmEvent, FsmState, Machine, PostponeError, Timers};
use eater_status::StatusRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lamp {
    Off,
    On,
    Broken,
}

impl FsmState for Lamp {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Broken => "broken",
        }
    }

    fn initial() -> Self {
        Self::Off
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Switch {
    Toggle,
    Blink,
    Flicker,
    Smash,
    Label(String),
    Refuse,
    Chain,
}

impl FsmEvent for Switch {
    const COUNT: usize = 7;

    fn index(&self) -> usize {
        match self {
            Self::Toggle => 0,
            Self::Blink => 1,
            Self::Flicker => 2,
            Self::Smash => 3,
            Self::Label(_) => 4,
            Self::Refuse => 5,
            Self::Chain => 6,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Toggle => "toggle",
            Self::Blink => "blink",
            Self::Flicker => "flicker",
            Self::Smash => "smash",
            Self::Label(_) => "label",
            Self::Refuse => "refuse",
            Self::Chain => "chain",
        }
    }

    fn carries_payload(&self) -> bool {
        matches!(self, Self::Label(_))
    }
}

/// Records every event and detects overlapping handler runs.
#[derive(Default)]
struct LampMachine {
    log: Vec<&'static str>,
    label: String,
    chain_left: u32,
    inside: Arc<AtomicBool>,
    overlaps: Arc<AtomicUsize>,
    handled: Arc<AtomicUsize>,
    dwell: Option<Duration>,
}

impl LampMachine {
    fn step(&mut self, state: Lamp, event: Switch, timers: &mut Timers<Switch>) -> Result<Lamp, FsmError> {
        if let Some(dwell) = self.dwell {
            std::thread::sleep(dwell);
        }
        self.log.push(event.name());
        self.handled.fetch_add(1, Ordering::SeqCst);

        match event {
            Switch::Toggle => Ok(match state {
                Lamp::Off => Lamp::On,
                Lamp::On => Lamp::Off,
                Lamp::Broken => Lamp::Broken,
            }),
            Switch::Blink | Switch::Flicker => Ok(state),
            Switch::Smash => Ok(Lamp::Broken),
            Switch::Label(text) => {
                self.label = text;
                Ok(state)
            }
            Switch::Refuse => Err(FsmError::Rejected {
                fsm: "lamp".to_owned(),
                event: "refuse",
                state: state.name(),
                reason: "not today".to_owned(),
            }),
            Switch::Chain => {
                if self.chain_left > 0 {
                    self.chain_left -= 1;
                    timers.postpone(Switch::Chain, Duration::from_secs(1))?;
                }
                Ok(state)
            }
        }
    }
}

impl Machine for LampMachine {
    type State = Lamp;
    type Event = Switch;

    fn handle(
        &mut self,
        state: Lamp,
        event: Switch,
        timers: &mut Timers<Switch>,
    ) -> Result<Lamp, FsmError> {
        if self.inside.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let result = self.step(state, event, timers);
        self.inside.store(false, Ordering::SeqCst);
        result
    }
}

fn lamp(status: &StatusRegistry) -> Fsm<LampMachine> {
    Fsm::new("lamp", LampMachine::default(), status, FsmConfig::default()).unwrap()
}

fn log_of(fsm: &Fsm<LampMachine>) -> Vec<&'static str> {
    fsm.inspect(|_, machine| machine.log.clone())
}

// ---------------------------------------------------------------------------
// Lifecycle and dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn starts_in_initial_state_with_state_attribute() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    assert_eq!(fsm.state(), Lamp::Off);
    assert_eq!(status.read("lamp_state").as_deref(), Some("off\n"));
}

#[tokio::test]
async fn emit_commits_new_state() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    fsm.emit_no_payload(Switch::Toggle).unwrap();
    assert_eq!(fsm.state(), Lamp::On);
    assert_eq!(status.read("lamp_state").as_deref(), Some("on\n"));
    fsm.emit(Switch::Label("desk".to_owned())).unwrap();
    assert_eq!(fsm.inspect(|_, m| m.label.clone()), "desk");
    assert_eq!(fsm.state(), Lamp::On);
}

#[tokio::test]
async fn handler_error_leaves_state_unchanged() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    fsm.emit(Switch::Toggle).unwrap();
    let err = fsm.emit(Switch::Refuse).unwrap_err();
    assert!(matches!(err, FsmError::Rejected { event: "refuse", .. }));
    assert_eq!(fsm.state(), Lamp::On);
}

#[tokio::test]
async fn context_attribute_reads_under_lock() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    status
        .register(fsm.attribute("lamp_events", |_, m| m.log.len().to_string()))
        .unwrap();
    fsm.emit(Switch::Blink).unwrap();
    fsm.emit(Switch::Blink).unwrap();
    assert_eq!(status.read("lamp_events").as_deref(), Some("2\n"));
}

#[tokio::test]
async fn duplicate_name_fails_to_register() {
    let status = StatusRegistry::create("test");
    let _first = lamp(&status);
    let second = Fsm::new("lamp", LampMachine::default(), &status, FsmConfig::default());
    assert!(matches!(second, Err(FsmError::Status { .. })));
}

#[tokio::test]
async fn zero_capacity_is_an_invalid_definition() {
    let status = StatusRegistry::create("test");
    let config = FsmConfig { max_postponed: 0 };
    let result = Fsm::new("lamp", LampMachine::default(), &status, config);
    assert!(matches!(result, Err(FsmError::InvalidDefinition { .. })));
    assert!(status.is_empty());
}

#[test]
fn new_outside_runtime_fails() {
    let status = StatusRegistry::create("test");
    let result = Fsm::new("lamp", LampMachine::default(), &status, FsmConfig::default());
    assert!(matches!(result, Err(FsmError::NoRuntime { .. })));
}

#[tokio::test]
async fn cleanup_stops_engine_and_removes_attribute() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    fsm.postpone(Switch::Blink, Duration::from_secs(5)).unwrap();
    fsm.cleanup();
    assert!(fsm.is_stopped());
    assert_eq!(fsm.pending_postponed(), 0);
    assert!(!status.contains("lamp_state"));
    assert!(matches!(fsm.emit(Switch::Toggle), Err(FsmError::Stopped { .. })));
    fsm.cleanup();
}

#[tokio::test]
async fn drop_removes_attribute() {
    let status = StatusRegistry::create("test");
    drop(lamp(&status));
    assert!(status.is_empty());
    assert!(status.destroy().is_ok());
}

#[tokio::test]
#[should_panic(expected = "sent without payload path")]
async fn payload_event_on_no_payload_path_panics() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    let _ = fsm.emit_no_payload(Switch::Label("x".to_owned()));
}

#[tokio::test]
#[should_panic(expected = "cannot be postponed")]
async fn postponing_payload_event_panics() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    let _ = fsm.postpone(Switch::Label("x".to_owned()), Duration::from_secs(1));
}

// ---------------------------------------------------------------------------
// State invariant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lopsided {
    Only,
    Phantom,
}

impl FsmState for Lopsided {
    const COUNT: usize = 1;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        "lopsided"
    }

    fn initial() -> Self {
        Self::Only
    }
}

struct PhantomMachine;

impl Machine for PhantomMachine {
    type State = Lopsided;
    type Event = Switch;

    fn handle(
        &mut self,
        _state: Lopsided,
        _event: Switch,
        _timers: &mut Timers<Switch>,
    ) -> Result<Lopsided, FsmError> {
        Ok(Lopsided::Phantom)
    }
}

#[tokio::test]
#[should_panic(expected = "out of range")]
async fn out_of_range_state_panics() {
    let status = StatusRegistry::create("test");
    let fsm = Fsm::new("phantom", PhantomMachine, &status, FsmConfig::default()).unwrap();
    let _ = fsm.emit(Switch::Toggle);
}

// ---------------------------------------------------------------------------
// Postponed events
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn postponed_events_fire_in_deadline_then_fifo_order() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    fsm.postpone(Switch::Smash, Duration::from_millis(30)).unwrap();
    fsm.postpone(Switch::Toggle, Duration::from_millis(10)).unwrap();
    fsm.postpone(Switch::Blink, Duration::from_millis(20)).unwrap();
    fsm.postpone(Switch::Flicker, Duration::from_millis(20)).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(log_of(&fsm), vec!["toggle", "blink", "flicker", "smash"]);
    assert_eq!(fsm.state(), Lamp::Broken);
    assert_eq!(fsm.pending_postponed(), 0);
}

#[tokio::test(start_paused = true)]
async fn postponed_event_waits_for_its_deadline() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    fsm.postpone(Switch::Toggle, Duration::from_secs(60)).unwrap();

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(fsm.state(), Lamp::Off);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(fsm.state(), Lamp::On);
}

#[tokio::test(start_paused = true)]
async fn earlier_postpone_rearms_the_worker() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    fsm.postpone(Switch::Smash, Duration::from_secs(60)).unwrap();
    tokio::task::yield_now().await;
    fsm.postpone(Switch::Toggle, Duration::from_secs(1)).unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(log_of(&fsm), vec!["toggle"]);
    assert_eq!(fsm.pending_postponed(), 1);
}

#[tokio::test(start_paused = true)]
async fn handlers_can_reschedule_themselves() {
    let status = StatusRegistry::create("test");
    let machine = LampMachine {
        chain_left: 3,
        ..LampMachine::default()
    };
    let fsm = Fsm::new("lamp", machine, &status, FsmConfig::default()).unwrap();
    fsm.emit(Switch::Chain).unwrap();

    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert_eq!(log_of(&fsm), vec!["chain"; 4]);
    assert_eq!(fsm.pending_postponed(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_by_type_prevents_firing() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    fsm.postpone(Switch::Toggle, Duration::from_secs(1)).unwrap();
    fsm.postpone(Switch::Blink, Duration::from_secs(2)).unwrap();
    fsm.postpone(Switch::Toggle, Duration::from_secs(3)).unwrap();
    assert_eq!(fsm.pending_of(&Switch::Toggle), 2);

    fsm.cancel_postponed_by_type(&Switch::Toggle);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(log_of(&fsm), vec!["blink"]);
    assert_eq!(fsm.state(), Lamp::Off);
}

#[tokio::test(start_paused = true)]
async fn cancel_all_prevents_firing() {
    let status = StatusRegistry::create("test");
    let fsm = lamp(&status);
    fsm.postpone(Switch::Toggle, Duration::from_secs(1)).unwrap();
    fsm.postpone(Switch::Smash, Duration::from_secs(2)).unwrap();
    fsm.cancel_all_postponed();
    assert_eq!(fsm.next_deadline(), None);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(log_of(&fsm).is_empty());
}

#[tokio::test(start_paused = true)]
async fn full_queue_surfaces_to_handler_caller() {
    let status = StatusRegistry::create("test");
    let machine = LampMachine {
        chain_left: 1,
        ..LampMachine::default()
    };
    let config = FsmConfig { max_postponed: 1 };
    let fsm = Fsm::new("lamp", machine, &status, config).unwrap();
    fsm.postpone(Switch::Blink, Duration::from_secs(60)).unwrap();

    let err = fsm.emit(Switch::Chain).unwrap_err();
    assert!(matches!(
        err,
        FsmError::Postpone {
            source: PostponeError::QueueFull { capacity: 1 }
        }
    ));
    assert_eq!(
        fsm.postpone(Switch::Blink, Duration::from_secs(1)),
        Err(PostponeError::QueueFull { capacity: 1 })
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn handlers_never_overlap() {
    let status = StatusRegistry::create("test");
    let overlaps = Arc::new(AtomicUsize::new(0));
    let handled = Arc::new(AtomicUsize::new(0));
    let machine = LampMachine {
        overlaps: Arc::clone(&overlaps),
        handled: Arc::clone(&handled),
        dwell: Some(Duration::from_micros(50)),
        ..LampMachine::default()
    };
    let fsm = Fsm::new("lamp", machine, &status, FsmConfig { max_postponed: 1024 }).unwrap();

    for _ in 0..100 {
        fsm.postpone(Switch::Blink, Duration::ZERO).unwrap();
    }
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    fsm.emit(Switch::Toggle).unwrap();
                    let _ = status.read("lamp_state");
                }
            });
        }
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(handled.load(Ordering::SeqCst), 500);
    assert_eq!(fsm.state(), Lamp::Off);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn nothing_fires_after_cancel_returns() {
    let status = StatusRegistry::create("test");
    let handled = Arc::new(AtomicUsize::new(0));
    let machine = LampMachine {
        handled: Arc::clone(&handled),
        dwell: Some(Duration::from_micros(200)),
        ..LampMachine::default()
    };
    let fsm = Fsm::new("lamp", machine, &status, FsmConfig { max_postponed: 1024 }).unwrap();

    for _ in 0..200 {
        fsm.postpone(Switch::Blink, Duration::ZERO).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(5)).await;
    fsm.cancel_postponed_by_type(&Switch::Blink);
    let at_cancel = handled.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handled.load(Ordering::SeqCst), at_cancel);
    assert_eq!(fsm.pending_postponed(), 0);
}
