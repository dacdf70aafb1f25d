//! Sanitation state machine.
//!
//! Every meal is followed by a bathroom visit. Visits pile up until the
//! owner sweeps. Once the place turns insanitary the eater gets infected
//! and rolls a dice at regular intervals to see whether it falls ill,
//! until disinfected.

use std::sync::Arc;

use eater_fsm::{Fsm, FsmConfig, FsmError, FsmEvent, FsmState, Machine, Timers};
use eater_status::StatusRegistry;
use tracing::{debug, info, warn};

use crate::config::BrainConfig;
use crate::error::BrainError;
use crate::living::Living;
use crate::random::{RandomSource, jittered};

/// Engine name, also the status attribute prefix.
pub const SANITATION_FSM: &str = "sanitation_fsm";

/// Status attribute holding the bathroom visit count.
pub const BATHROOM_COUNT_ATTR: &str = "bathroom_count";

/// Status attribute holding the infection flag.
pub const INFECTED_ATTR: &str = "infected";

/// Sanitation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitationState {
    /// Clean.
    Normal,
    /// Needs a sweep.
    Dirty,
    /// Dangerous.
    Insanitary,
}

impl FsmState for SanitationState {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Normal => "SANITATION_STATE_NORMAL",
            Self::Dirty => "SANITATION_STATE_DIRTY",
            Self::Insanitary => "SANITATION_STATE_INSANITARY",
        }
    }

    fn initial() -> Self {
        Self::Normal
    }
}

/// Sanitation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitationEvent {
    /// The eater has just had a meal.
    JustEaten,
    /// Nature calls.
    GoToBathroom,
    /// The owner cleans up once.
    Sweep,
    /// The owner disinfects.
    Disinfect,
    /// Decide whether the infection makes the eater ill.
    InfectionDiceRoll,
}

impl FsmEvent for SanitationEvent {
    const COUNT: usize = 5;

    fn index(&self) -> usize {
        *self as usize
    }

    fn name(&self) -> &'static str {
        match self {
            Self::JustEaten => "SANITATION_EVENT_JUST_EATEN",
            Self::GoToBathroom => "SANITATION_EVENT_GO_TO_BATHROOM",
            Self::Sweep => "SANITATION_EVENT_SWEEP",
            Self::Disinfect => "SANITATION_EVENT_DISINFECT",
            Self::InfectionDiceRoll => "SANITATION_EVENT_INFECTION_DICE_ROLL",
        }
    }

    fn carries_payload(&self) -> bool {
        false
    }
}

/// Handlers and context of the Sanitation machine.
pub struct SanitationMachine {
    config: Arc<BrainConfig>,
    random: Arc<dyn RandomSource>,
    living: Arc<Living>,
    bathroom_count: u32,
    infected: bool,
}

impl SanitationMachine {
    /// Bathroom visits not yet swept.
    pub const fn bathroom_count(&self) -> u32 {
        self.bathroom_count
    }

    /// Whether the eater carries an infection.
    pub const fn infected(&self) -> bool {
        self.infected
    }

    fn classify(&self) -> SanitationState {
        if self.bathroom_count >= self.config.bathroom_insanitary {
            SanitationState::Insanitary
        } else if self.bathroom_count >= self.config.bathroom_dirty {
            SanitationState::Dirty
        } else {
            SanitationState::Normal
        }
    }

    fn schedule(
        &self,
        timers: &mut Timers<SanitationEvent>,
        event: SanitationEvent,
        base: std::time::Duration,
    ) -> Result<(), FsmError> {
        let delay = jittered(self.random.as_ref(), base, self.config.time_deviation_pct);
        timers.postpone(event, delay)?;
        Ok(())
    }

    fn go_to_bathroom(
        &mut self,
        state: SanitationState,
        timers: &mut Timers<SanitationEvent>,
    ) -> Result<SanitationState, FsmError> {
        self.bathroom_count = self.bathroom_count.saturating_add(1);
        let next = self.classify();
        if next != state && next == SanitationState::Insanitary && !self.infected {
            self.infected = true;
            self.schedule(
                timers,
                SanitationEvent::InfectionDiceRoll,
                self.config.infection_dice_roll_delay(),
            )?;
        }
        Ok(next)
    }

    fn sweep(&mut self, state: SanitationState) -> SanitationState {
        match state {
            SanitationState::Normal => {
                info!("thanks, but this is not needed now");
            }
            SanitationState::Dirty | SanitationState::Insanitary => {
                info!("thank you; you're just in time here");
                self.bathroom_count = self.bathroom_count.saturating_sub(1);
            }
        }
        self.classify()
    }

    fn disinfect(&mut self, state: SanitationState, timers: &mut Timers<SanitationEvent>) {
        match state {
            SanitationState::Insanitary => info!("this will not help"),
            SanitationState::Normal | SanitationState::Dirty => {
                if self.infected {
                    info!("thank you; it was just what I needed");
                    self.infected = false;
                    timers.cancel_by_type(&SanitationEvent::InfectionDiceRoll);
                } else {
                    info!("it's not needed");
                }
            }
        }
    }

    fn infection_dice_roll(&self, timers: &mut Timers<SanitationEvent>) -> Result<(), FsmError> {
        if !self.living.is_alive() {
            debug!("Infection dice stopped; the eater is gone");
            return Ok(());
        }
        if self.random.coin_flip() {
            info!(
                "I fell ill in this insanitary conditions. \
                 You should have taken care of me better."
            );
            self.living.fall_ill();
        }
        self.schedule(
            timers,
            SanitationEvent::InfectionDiceRoll,
            self.config.infection_dice_roll_delay(),
        )
    }
}

impl Machine for SanitationMachine {
    type State = SanitationState;
    type Event = SanitationEvent;

    fn handle(
        &mut self,
        state: SanitationState,
        event: SanitationEvent,
        timers: &mut Timers<SanitationEvent>,
    ) -> Result<SanitationState, FsmError> {
        match event {
            SanitationEvent::JustEaten => {
                self.schedule(
                    timers,
                    SanitationEvent::GoToBathroom,
                    self.config.go_to_bathroom_delay(),
                )?;
                Ok(state)
            }
            SanitationEvent::GoToBathroom => self.go_to_bathroom(state, timers),
            SanitationEvent::Sweep => Ok(self.sweep(state)),
            SanitationEvent::Disinfect => {
                self.disinfect(state, timers);
                Ok(state)
            }
            SanitationEvent::InfectionDiceRoll => {
                self.infection_dice_roll(timers)?;
                Ok(state)
            }
        }
    }
}

/// The Sanitation state machine.
pub struct Sanitation {
    fsm: Fsm<SanitationMachine>,
    status: StatusRegistry,
}

impl Sanitation {
    /// Start the machine in [`SanitationState::Normal`].
    pub fn new(
        config: Arc<BrainConfig>,
        random: Arc<dyn RandomSource>,
        living: Arc<Living>,
        status: &StatusRegistry,
        fsm_config: FsmConfig,
    ) -> Result<Self, BrainError> {
        let machine = SanitationMachine {
            config,
            random,
            living,
            bathroom_count: 0,
            infected: false,
        };
        let fsm = Fsm::new(SANITATION_FSM, machine, status, fsm_config)
            .map_err(|e| BrainError::fsm(SANITATION_FSM, e))?;
        status.register_many([
            fsm.attribute(BATHROOM_COUNT_ATTR, |_, machine| machine.bathroom_count().to_string()),
            fsm.attribute(INFECTED_ATTR, |_, machine| machine.infected().to_string()),
        ])?;
        Ok(Self {
            fsm,
            status: status.clone(),
        })
    }

    /// Tell the machine a meal has just been eaten.
    ///
    /// Fails only if the bathroom visit cannot be scheduled.
    pub fn just_eaten(&self) -> Result<(), BrainError> {
        self.fsm
            .emit_no_payload(SanitationEvent::JustEaten)
            .map_err(|e| BrainError::fsm(SANITATION_FSM, e))
    }

    /// Clean up one bathroom visit.
    pub fn sweep(&self) -> Result<(), BrainError> {
        self.fsm
            .emit_no_payload(SanitationEvent::Sweep)
            .map_err(|e| BrainError::fsm(SANITATION_FSM, e))
    }

    /// Clear an infection, unless the place is still insanitary.
    pub fn disinfect(&self) -> Result<(), BrainError> {
        self.fsm
            .emit_no_payload(SanitationEvent::Disinfect)
            .map_err(|e| BrainError::fsm(SANITATION_FSM, e))
    }

    /// Current state.
    pub fn state(&self) -> SanitationState {
        self.fsm.state()
    }

    /// Bathroom visits not yet swept.
    pub fn bathroom_count(&self) -> u32 {
        self.fsm.inspect(|_, machine| machine.bathroom_count())
    }

    /// Whether the eater carries an infection.
    pub fn infected(&self) -> bool {
        self.fsm.inspect(|_, machine| machine.infected())
    }

    /// The underlying engine.
    pub const fn fsm(&self) -> &Fsm<SanitationMachine> {
        &self.fsm
    }
}

impl Drop for Sanitation {
    fn drop(&mut self) {
        if let Err(e) = self.status.unregister_many([BATHROOM_COUNT_ATTR, INFECTED_ATTR]) {
            warn!(error = %e, "Sanitation attributes already gone");
        }
    }
}
