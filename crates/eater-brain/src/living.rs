//! Living state machine: health, illness, and death.
//!
//! An illness progresses Alive -> Ill -> VeryIll -> Dead unless cured.
//! While Ill the illness is revised after a while (the eater may get
//! better by itself); while VeryIll death is already scheduled.
//!
//! Death is terminal. It cancels every pending Living event and is
//! published as a [`Fate`] on a watch channel, so the process hosting
//! the eater can decide what to do with the body.

use core::fmt;
use std::sync::Arc;

use eater_fsm::{Fsm, FsmConfig, FsmError, FsmEvent, FsmState, Machine, Timers};
use eater_status::StatusRegistry;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::assert_emitted;
use crate::config::BrainConfig;
use crate::error::BrainError;
use crate::random::{RandomSource, jittered};

/// Engine name, also the status attribute prefix.
pub const LIVING_FSM: &str = "living_fsm";

/// What killed the eater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    /// The entropy balance fell to the critical low.
    Starvation,
    /// The entropy balance rose to the critical high.
    Overeating,
    /// Nobody played with it for too long.
    Depression,
    /// An untreated illness.
    Illness,
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starvation => write!(f, "starvation"),
            Self::Overeating => write!(f, "overeating"),
            Self::Depression => write!(f, "depression"),
            Self::Illness => write!(f, "illness"),
        }
    }
}

/// How the eater's life has turned out so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    /// Still going.
    Alive,
    /// Shut down cleanly.
    DiedNobly,
    /// Killed by neglect.
    Died(DeathCause),
}

impl Fate {
    /// Whether the eater is still alive.
    pub const fn is_alive(self) -> bool {
        matches!(self, Self::Alive)
    }
}

/// Living states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivingState {
    /// Healthy.
    Alive,
    /// Ill; the illness will be revised.
    Ill,
    /// Seriously ill; death is scheduled.
    VeryIll,
    /// Terminal.
    Dead,
}

impl FsmState for LivingState {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Alive => "LIVING_STATE_ALIVE",
            Self::Ill => "LIVING_STATE_ILL",
            Self::VeryIll => "LIVING_STATE_VERY_ILL",
            Self::Dead => "LIVING_STATE_DEAD",
        }
    }

    fn initial() -> Self {
        Self::Alive
    }
}

/// Living events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivingEvent {
    /// Catch an illness, or get worse.
    FallIll,
    /// Decide whether an illness passes by itself.
    ReviseIllness,
    /// Treatment.
    CureIllness,
    /// Clean shutdown.
    DieNobly,
    /// Scheduled death from illness.
    Die,
    /// Death with a known cause.
    DieOf(DeathCause),
}

impl FsmEvent for LivingEvent {
    const COUNT: usize = 6;

    fn index(&self) -> usize {
        match self {
            Self::FallIll => 0,
            Self::ReviseIllness => 1,
            Self::CureIllness => 2,
            Self::DieNobly => 3,
            Self::Die => 4,
            Self::DieOf(_) => 5,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::FallIll => "LIVING_EVENT_FALL_ILL",
            Self::ReviseIllness => "LIVING_EVENT_REVISE_ILLNESS",
            Self::CureIllness => "LIVING_EVENT_CURE_ILLNESS",
            Self::DieNobly => "LIVING_EVENT_DIE_NOBLY",
            Self::Die => "LIVING_EVENT_DIE",
            Self::DieOf(_) => "LIVING_EVENT_DIE_OF",
        }
    }

    fn carries_payload(&self) -> bool {
        matches!(self, Self::DieOf(_))
    }
}

/// Handlers and context of the Living machine.
pub struct LivingMachine {
    config: Arc<BrainConfig>,
    random: Arc<dyn RandomSource>,
    fate: watch::Sender<Fate>,
}

impl LivingMachine {
    fn schedule_revise(&self, timers: &mut Timers<LivingEvent>) -> Result<(), FsmError> {
        let delay = jittered(
            self.random.as_ref(),
            self.config.illness_revise(),
            self.config.time_deviation_pct,
        );
        timers.postpone(LivingEvent::ReviseIllness, delay)?;
        Ok(())
    }

    fn schedule_death(&self, timers: &mut Timers<LivingEvent>) -> Result<(), FsmError> {
        let delay = jittered(
            self.random.as_ref(),
            self.config.illness_death(),
            self.config.time_deviation_pct,
        );
        timers.cancel_by_type(&LivingEvent::ReviseIllness);
        timers.postpone(LivingEvent::Die, delay)?;
        Ok(())
    }

    fn die(&self, cause: DeathCause, timers: &mut Timers<LivingEvent>) -> LivingState {
        timers.cancel_all();
        error!(%cause, "you've been an awful owner; I'm dying in agony.");
        self.fate.send_replace(Fate::Died(cause));
        LivingState::Dead
    }

    fn fall_ill(
        &self,
        state: LivingState,
        timers: &mut Timers<LivingEvent>,
    ) -> Result<LivingState, FsmError> {
        match state {
            LivingState::Alive => {
                info!("I don't feel well");
                self.schedule_revise(timers)?;
                Ok(LivingState::Ill)
            }
            LivingState::Ill => {
                info!("I feel much worse now");
                self.schedule_death(timers)?;
                Ok(LivingState::VeryIll)
            }
            LivingState::VeryIll => Ok(self.die(DeathCause::Illness, timers)),
            LivingState::Dead => Ok(state),
        }
    }

    fn revise_illness(
        &self,
        state: LivingState,
        timers: &mut Timers<LivingEvent>,
    ) -> Result<LivingState, FsmError> {
        if state != LivingState::Ill {
            return Ok(state);
        }
        if self.random.coin_flip() {
            info!("I got better by myself");
            Ok(LivingState::Alive)
        } else {
            info!("the illness is getting worse");
            self.schedule_death(timers)?;
            Ok(LivingState::VeryIll)
        }
    }

    fn cure_illness(
        &self,
        state: LivingState,
        timers: &mut Timers<LivingEvent>,
    ) -> Result<LivingState, FsmError> {
        match state {
            LivingState::Ill => {
                info!("thank you; I feel fine now");
                timers.cancel_by_type(&LivingEvent::ReviseIllness);
                Ok(LivingState::Alive)
            }
            LivingState::VeryIll => {
                info!("thank you; I feel a bit better");
                timers.cancel_by_type(&LivingEvent::Die);
                self.schedule_revise(timers)?;
                Ok(LivingState::Ill)
            }
            LivingState::Alive | LivingState::Dead => {
                info!("I'm not ill");
                Ok(state)
            }
        }
    }
}

impl Machine for LivingMachine {
    type State = LivingState;
    type Event = LivingEvent;

    fn handle(
        &mut self,
        state: LivingState,
        event: LivingEvent,
        timers: &mut Timers<LivingEvent>,
    ) -> Result<LivingState, FsmError> {
        if state == LivingState::Dead {
            debug!(event = event.name(), "Event ignored after death");
            return Ok(state);
        }
        match event {
            LivingEvent::FallIll => self.fall_ill(state, timers),
            LivingEvent::ReviseIllness => self.revise_illness(state, timers),
            LivingEvent::CureIllness => self.cure_illness(state, timers),
            LivingEvent::DieNobly => {
                timers.cancel_all();
                info!("it was a great experience, Sir!");
                self.fate.send_replace(Fate::DiedNobly);
                Ok(LivingState::Dead)
            }
            LivingEvent::Die => Ok(self.die(DeathCause::Illness, timers)),
            LivingEvent::DieOf(cause) => Ok(self.die(cause, timers)),
        }
    }
}

/// The Living state machine.
pub struct Living {
    fsm: Fsm<LivingMachine>,
    fate: watch::Receiver<Fate>,
}

impl Living {
    /// Start the machine in [`LivingState::Alive`].
    pub fn new(
        config: Arc<BrainConfig>,
        random: Arc<dyn RandomSource>,
        status: &StatusRegistry,
        fsm_config: FsmConfig,
    ) -> Result<Self, BrainError> {
        let (tx, rx) = watch::channel(Fate::Alive);
        let machine = LivingMachine {
            config,
            random,
            fate: tx,
        };
        let fsm = Fsm::new(LIVING_FSM, machine, status, fsm_config)
            .map_err(|e| BrainError::fsm(LIVING_FSM, e))?;
        Ok(Self { fsm, fate: rx })
    }

    /// Catch an illness, or get worse if already ill.
    pub fn fall_ill(&self) {
        assert_emitted("fall_ill", self.fsm.emit_no_payload(LivingEvent::FallIll));
    }

    /// Treat an illness.
    pub fn cure_illness(&self) -> Result<(), BrainError> {
        self.fsm
            .emit_no_payload(LivingEvent::CureIllness)
            .map_err(|e| BrainError::fsm(LIVING_FSM, e))
    }

    /// Kill the eater.
    pub fn die(&self, cause: DeathCause) {
        assert_emitted("die", self.fsm.emit(LivingEvent::DieOf(cause)));
    }

    /// Shut the eater down cleanly.
    pub fn die_nobly(&self) {
        assert_emitted("die_nobly", self.fsm.emit_no_payload(LivingEvent::DieNobly));
    }

    /// Current state.
    pub fn state(&self) -> LivingState {
        self.fsm.state()
    }

    /// Current fate.
    pub fn fate(&self) -> Fate {
        *self.fate.borrow()
    }

    /// Whether the eater is alive.
    pub fn is_alive(&self) -> bool {
        self.fate().is_alive()
    }

    /// Watch for the eater's death.
    pub fn subscribe(&self) -> watch::Receiver<Fate> {
        self.fate.clone()
    }

    /// The underlying engine.
    pub const fn fsm(&self) -> &Fsm<LivingMachine> {
        &self.fsm
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::random::FixedRandom;

    fn living(status: &StatusRegistry, random: u64) -> Living {
        Living::new(
            Arc::new(BrainConfig::default()),
            Arc::new(FixedRandom(random)),
            status,
            FsmConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn starts_alive() {
        let status = StatusRegistry::create("test");
        let living = living(&status, 0);
        assert_eq!(living.state(), LivingState::Alive);
        assert_eq!(living.fate(), Fate::Alive);
        assert_eq!(
            status.read("living_fsm_state").as_deref(),
            Some("LIVING_STATE_ALIVE\n")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn illness_progresses_to_death_when_untreated() {
        let status = StatusRegistry::create("test");
        let living = living(&status, 0);

        living.fall_ill();
        assert_eq!(living.state(), LivingState::Ill);
        assert_eq!(living.fsm().pending_of(&LivingEvent::ReviseIllness), 1);

        // Revise fires after 30 minutes; the coin says "no self-cure".
        tokio::time::sleep(Duration::from_secs(30 * 60 + 1)).await;
        assert_eq!(living.state(), LivingState::VeryIll);
        assert_eq!(living.fsm().pending_of(&LivingEvent::Die), 1);

        tokio::time::sleep(Duration::from_secs(30 * 60)).await;
        assert_eq!(living.state(), LivingState::Dead);
        assert_eq!(living.fate(), Fate::Died(DeathCause::Illness));
        assert_eq!(living.fsm().pending_postponed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn illness_may_pass_by_itself() {
        let status = StatusRegistry::create("test");
        let living = living(&status, 1);
        living.fall_ill();
        tokio::time::sleep(Duration::from_secs(2 * 60 * 60)).await;
        assert_eq!(living.state(), LivingState::Alive);
        assert_eq!(living.fsm().pending_postponed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_illness_replaces_revise_with_death() {
        let status = StatusRegistry::create("test");
        let living = living(&status, 0);
        living.fall_ill();
        living.fall_ill();
        assert_eq!(living.state(), LivingState::VeryIll);
        assert_eq!(living.fsm().pending_of(&LivingEvent::ReviseIllness), 0);
        assert_eq!(living.fsm().pending_of(&LivingEvent::Die), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn third_illness_kills_immediately() {
        let status = StatusRegistry::create("test");
        let living = living(&status, 0);
        living.fall_ill();
        living.fall_ill();
        living.fall_ill();
        assert_eq!(living.state(), LivingState::Dead);
        assert_eq!(living.fate(), Fate::Died(DeathCause::Illness));
    }

    #[tokio::test(start_paused = true)]
    async fn cure_steps_back_one_stage() {
        let status = StatusRegistry::create("test");
        let living = living(&status, 0);
        living.fall_ill();
        living.fall_ill();

        living.cure_illness().unwrap();
        assert_eq!(living.state(), LivingState::Ill);
        assert_eq!(living.fsm().pending_of(&LivingEvent::Die), 0);
        assert_eq!(living.fsm().pending_of(&LivingEvent::ReviseIllness), 1);

        living.cure_illness().unwrap();
        assert_eq!(living.state(), LivingState::Alive);
        assert_eq!(living.fsm().pending_postponed(), 0);

        living.cure_illness().unwrap();
        assert_eq!(living.state(), LivingState::Alive);
    }

    #[tokio::test(start_paused = true)]
    async fn death_is_terminal_and_published() {
        let status = StatusRegistry::create("test");
        let living = living(&status, 0);
        let mut fate = living.subscribe();
        living.fall_ill();

        living.die(DeathCause::Starvation);
        fate.changed().await.unwrap();
        assert_eq!(*fate.borrow(), Fate::Died(DeathCause::Starvation));
        assert_eq!(living.fsm().pending_postponed(), 0);

        living.fall_ill();
        living.cure_illness().unwrap();
        living.die(DeathCause::Overeating);
        assert_eq!(living.state(), LivingState::Dead);
        assert_eq!(living.fate(), Fate::Died(DeathCause::Starvation));
    }

    #[tokio::test(start_paused = true)]
    async fn die_nobly_is_a_clean_shutdown() {
        let status = StatusRegistry::create("test");
        let living = living(&status, 0);
        living.fall_ill();
        living.die_nobly();
        assert_eq!(living.state(), LivingState::Dead);
        assert_eq!(living.fate(), Fate::DiedNobly);
        assert!(!living.is_alive());
        assert_eq!(living.fsm().pending_postponed(), 0);
    }
}
