//! Social state machine: mood.
//!
//! Mood drops a step every demotion period unless the owner keeps
//! playing rock-paper-scissors. Every game restarts the demotion clock,
//! and enough games lift the mood a step. A depressed eater left alone
//! for another period dies.

use std::sync::Arc;

use eater_fsm::{Fsm, FsmConfig, FsmError, FsmEvent, FsmState, Machine, Timers};
use eater_status::StatusRegistry;
use eater_types::{RpsOutcome, RpsSign};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::BrainConfig;
use crate::error::BrainError;
use crate::living::{DeathCause, Living};
use crate::random::{RandomSource, jittered};
use crate::rps::{random_sign, rps_get_winner};

/// Engine name, also the status attribute prefix.
pub const SOCIAL_FSM: &str = "social_fsm";

/// Status attribute holding the games played toward the next promotion.
pub const RPS_COUNT_ATTR: &str = "rps_count";

/// Social states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialState {
    /// Content.
    Normal,
    /// Cheerful.
    Happy,
    /// Lonely; one more demotion is fatal.
    Depressed,
}

impl FsmState for SocialState {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Normal => "SOCIAL_STATE_NORMAL",
            Self::Happy => "SOCIAL_STATE_HAPPY",
            Self::Depressed => "SOCIAL_STATE_DEPRESSED",
        }
    }

    fn initial() -> Self {
        Self::Normal
    }
}

/// Social events.
#[derive(Debug)]
pub enum SocialEvent {
    /// The demotion clock ran out.
    ReviseState,
    /// The owner plays a game.
    PlayRps {
        /// The owner's sign.
        sign: RpsSign,
        /// Where to send the resolved game.
        reply: Option<oneshot::Sender<RpsOutcome>>,
    },
}

impl FsmEvent for SocialEvent {
    const COUNT: usize = 2;

    fn index(&self) -> usize {
        match self {
            Self::ReviseState => 0,
            Self::PlayRps { .. } => 1,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ReviseState => "SOCIAL_EVENT_REVISE_STATE",
            Self::PlayRps { .. } => "SOCIAL_EVENT_PLAY_RPS",
        }
    }

    fn carries_payload(&self) -> bool {
        matches!(self, Self::PlayRps { .. })
    }
}

/// Handlers and context of the Social machine.
pub struct SocialMachine {
    config: Arc<BrainConfig>,
    random: Arc<dyn RandomSource>,
    living: Arc<Living>,
    rps_count: u32,
}

impl SocialMachine {
    /// Games played toward the next promotion.
    pub const fn rps_count(&self) -> u32 {
        self.rps_count
    }

    fn schedule_revise(&self, timers: &mut Timers<SocialEvent>) -> Result<(), FsmError> {
        let delay = jittered(
            self.random.as_ref(),
            self.config.social_demotion(),
            self.config.time_deviation_pct,
        );
        timers.postpone(SocialEvent::ReviseState, delay)?;
        Ok(())
    }

    fn revise_state(
        &self,
        state: SocialState,
        timers: &mut Timers<SocialEvent>,
    ) -> Result<SocialState, FsmError> {
        if !self.living.is_alive() {
            debug!("Mood clock stopped; the eater is gone");
            return Ok(state);
        }
        let next = match state {
            SocialState::Happy => SocialState::Normal,
            SocialState::Normal => SocialState::Depressed,
            SocialState::Depressed => {
                info!("Depression killed me.");
                self.living.die(DeathCause::Depression);
                return Ok(SocialState::Depressed);
            }
        };
        self.schedule_revise(timers)?;
        Ok(next)
    }

    fn play(&self, user_sign: RpsSign) -> RpsOutcome {
        let eater_sign = random_sign(self.random.as_ref());
        let outcome = RpsOutcome {
            user_sign,
            eater_sign,
            result: rps_get_winner(user_sign, eater_sign),
        };
        info!("your choice: {user_sign}");
        info!("my choice:   {eater_sign}");
        info!("{}", outcome.verdict());
        outcome
    }

    fn play_rps(
        &mut self,
        state: SocialState,
        sign: RpsSign,
        reply: Option<oneshot::Sender<RpsOutcome>>,
        timers: &mut Timers<SocialEvent>,
    ) -> Result<SocialState, FsmError> {
        let outcome = self.play(sign);
        if let Some(reply) = reply
            && reply.send(outcome).is_err()
        {
            debug!("Game result receiver dropped");
        }

        timers.cancel_by_type(&SocialEvent::ReviseState);
        self.schedule_revise(timers)?;

        self.rps_count = self.rps_count.saturating_add(1);
        if self.rps_count < self.config.rps_promote_count {
            return Ok(state);
        }
        let next = match state {
            SocialState::Happy => {
                self.rps_count = self.config.rps_promote_count;
                SocialState::Happy
            }
            SocialState::Normal => {
                self.rps_count = 0;
                info!("Life is a miracle");
                SocialState::Happy
            }
            SocialState::Depressed => {
                self.rps_count = 0;
                info!("I'm much better now");
                SocialState::Normal
            }
        };
        Ok(next)
    }
}

impl Machine for SocialMachine {
    type State = SocialState;
    type Event = SocialEvent;

    fn handle(
        &mut self,
        state: SocialState,
        event: SocialEvent,
        timers: &mut Timers<SocialEvent>,
    ) -> Result<SocialState, FsmError> {
        match event {
            SocialEvent::ReviseState => self.revise_state(state, timers),
            SocialEvent::PlayRps { sign, reply } => self.play_rps(state, sign, reply, timers),
        }
    }
}

/// The Social state machine.
pub struct Social {
    fsm: Fsm<SocialMachine>,
    status: StatusRegistry,
}

impl Social {
    /// Start the machine in [`SocialState::Normal`] and arm the demotion clock.
    pub fn new(
        config: Arc<BrainConfig>,
        random: Arc<dyn RandomSource>,
        living: Arc<Living>,
        status: &StatusRegistry,
        fsm_config: FsmConfig,
    ) -> Result<Self, BrainError> {
        let demotion = jittered(
            random.as_ref(),
            config.social_demotion(),
            config.time_deviation_pct,
        );
        let machine = SocialMachine {
            config,
            random,
            living,
            rps_count: 0,
        };
        let fsm = Fsm::new(SOCIAL_FSM, machine, status, fsm_config)
            .map_err(|e| BrainError::fsm(SOCIAL_FSM, e))?;
        fsm.postpone(SocialEvent::ReviseState, demotion)
            .map_err(|e| BrainError::fsm(SOCIAL_FSM, e.into()))?;
        status.register(fsm.attribute(RPS_COUNT_ATTR, |_, machine| {
            machine.rps_count().to_string()
        }))?;
        Ok(Self {
            fsm,
            status: status.clone(),
        })
    }

    /// Play a game of rock-paper-scissors with the eater.
    pub fn play_rps(&self, sign: RpsSign) -> Result<RpsOutcome, BrainError> {
        let (tx, mut rx) = oneshot::channel();
        self.fsm
            .emit(SocialEvent::PlayRps {
                sign,
                reply: Some(tx),
            })
            .map_err(|e| BrainError::fsm(SOCIAL_FSM, e))?;
        rx.try_recv()
            .map_err(|source| BrainError::Unanswered { source })
    }

    /// Current state.
    pub fn state(&self) -> SocialState {
        self.fsm.state()
    }

    /// Games played toward the next promotion.
    pub fn rps_count(&self) -> u32 {
        self.fsm.inspect(|_, machine| machine.rps_count())
    }

    /// The underlying engine.
    pub const fn fsm(&self) -> &Fsm<SocialMachine> {
        &self.fsm
    }
}

impl Drop for Social {
    fn drop(&mut self) {
        if let Err(e) = self.status.unregister(RPS_COUNT_ATTR) {
            warn!(error = %e, "RPS count attribute already gone");
        }
    }
}
