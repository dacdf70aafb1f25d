//! Feeding state machine: the entropy balance.
//!
//! Food raises the balance by its entropy estimate times its length.
//! Every meal time the eater burns a (jittered) amount of entropy. The
//! balance is classified into a state with half-threshold bands; reaching
//! either critical threshold kills the eater.

use std::sync::Arc;

use eater_fsm::{Fsm, FsmConfig, FsmError, FsmEvent, FsmState, Machine, Timers};
use eater_status::StatusRegistry;
use tracing::{debug, info, warn};

use crate::assert_emitted;
use crate::config::BrainConfig;
use crate::entropy::entropy_estimate;
use crate::error::BrainError;
use crate::living::{DeathCause, Living};
use crate::random::{RandomSource, deviate, jittered};

/// Engine name, also the status attribute prefix.
pub const FEEDING_FSM: &str = "feeding_fsm";

/// Status attribute holding the entropy balance.
pub const ENTROPY_BALANCE_ATTR: &str = "entropy_balance";

/// Feeding states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedingState {
    /// Balance within the comfortable band.
    Normal,
    /// Balance below half the critical low.
    Hungry,
    /// Balance above half the critical high.
    Overeaten,
}

impl FsmState for FeedingState {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::Normal => "FEEDING_STATE_NORMAL",
            Self::Hungry => "FEEDING_STATE_HUNGRY",
            Self::Overeaten => "FEEDING_STATE_OVEREATEN",
        }
    }

    fn initial() -> Self {
        Self::Normal
    }
}

/// Feeding events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedingEvent {
    /// Reset the balance and start the meal clock.
    Init,
    /// A meal time has come.
    FeedingTime,
    /// Food arrived.
    Feed(Vec<u8>),
}

impl FsmEvent for FeedingEvent {
    const COUNT: usize = 3;

    fn index(&self) -> usize {
        match self {
            Self::Init => 0,
            Self::FeedingTime => 1,
            Self::Feed(_) => 2,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Init => "FEEDING_EVENT_INIT",
            Self::FeedingTime => "FEEDING_EVENT_FEEDING_TIME",
            Self::Feed(_) => "FEEDING_EVENT_FEED",
        }
    }

    fn carries_payload(&self) -> bool {
        matches!(self, Self::Feed(_))
    }
}

/// Handlers and context of the Feeding machine.
pub struct FeedingMachine {
    config: Arc<BrainConfig>,
    random: Arc<dyn RandomSource>,
    living: Arc<Living>,
    entropy_balance: i64,
}

impl FeedingMachine {
    /// Current entropy balance.
    pub const fn entropy_balance(&self) -> i64 {
        self.entropy_balance
    }

    fn classify(&self) -> FeedingState {
        let high = self.config.entropy_critically_high.checked_div(2).unwrap_or(0);
        let low = self.config.entropy_critically_low.checked_div(2).unwrap_or(0);
        if self.entropy_balance > high {
            FeedingState::Overeaten
        } else if self.entropy_balance < low {
            FeedingState::Hungry
        } else {
            FeedingState::Normal
        }
    }

    fn schedule_meal(&self, timers: &mut Timers<FeedingEvent>) -> Result<(), FsmError> {
        let delay = jittered(
            self.random.as_ref(),
            self.config.feeding_period(),
            self.config.time_deviation_pct,
        );
        timers.postpone(FeedingEvent::FeedingTime, delay)?;
        Ok(())
    }

    fn feeding_time(
        &mut self,
        state: FeedingState,
        timers: &mut Timers<FeedingEvent>,
    ) -> Result<FeedingState, FsmError> {
        if !self.living.is_alive() {
            debug!("Meal clock stopped; the eater is gone");
            return Ok(state);
        }
        info!("it's a good time to get some food");
        let required = deviate(
            self.random.as_ref(),
            self.config.hunger_entropy_required,
            self.config.entropy_deviation_pct,
        );
        let old_balance = self.entropy_balance;
        self.entropy_balance = self
            .entropy_balance
            .saturating_sub(i64::try_from(required).unwrap_or(i64::MAX));
        info!(
            old_balance,
            new_balance = self.entropy_balance,
            "Entropy balance changed"
        );

        if self.entropy_balance <= self.config.entropy_critically_low {
            warn!(
                balance = self.entropy_balance,
                "Entropy balance has fallen to the critically low level"
            );
            self.living.die(DeathCause::Starvation);
        } else {
            self.schedule_meal(timers)?;
        }
        Ok(self.classify())
    }

    fn feed(&mut self, state: FeedingState, food: &[u8]) -> Result<FeedingState, FsmError> {
        let Some(bits) = entropy_estimate(food) else {
            return Err(FsmError::Rejected {
                fsm: FEEDING_FSM.to_owned(),
                event: "FEEDING_EVENT_FEED",
                state: state.name(),
                reason: "empty food".to_owned(),
            });
        };
        let gain = i64::from(bits).saturating_mul(i64::try_from(food.len()).unwrap_or(i64::MAX));
        let old_balance = self.entropy_balance;
        self.entropy_balance = self.entropy_balance.saturating_add(gain);

        info!("thank you for all the food");
        info!(
            old_balance,
            new_balance = self.entropy_balance,
            bits_per_byte = bits,
            bytes = food.len(),
            "Entropy balance changed"
        );

        if self.entropy_balance >= self.config.entropy_critically_high {
            warn!(
                balance = self.entropy_balance,
                "Entropy balance has risen to the critically high level"
            );
            self.living.die(DeathCause::Overeating);
        }
        Ok(self.classify())
    }
}

impl Machine for FeedingMachine {
    type State = FeedingState;
    type Event = FeedingEvent;

    fn handle(
        &mut self,
        state: FeedingState,
        event: FeedingEvent,
        timers: &mut Timers<FeedingEvent>,
    ) -> Result<FeedingState, FsmError> {
        match event {
            FeedingEvent::Init => {
                self.entropy_balance = 0;
                self.schedule_meal(timers)?;
                Ok(FeedingState::Normal)
            }
            FeedingEvent::FeedingTime => self.feeding_time(state, timers),
            FeedingEvent::Feed(food) => self.feed(state, &food),
        }
    }
}

/// The Feeding state machine.
pub struct Feeding {
    fsm: Fsm<FeedingMachine>,
    status: StatusRegistry,
}

impl Feeding {
    /// Start the machine, reset the balance, and arm the meal clock.
    pub fn new(
        config: Arc<BrainConfig>,
        random: Arc<dyn RandomSource>,
        living: Arc<Living>,
        status: &StatusRegistry,
        fsm_config: FsmConfig,
    ) -> Result<Self, BrainError> {
        let machine = FeedingMachine {
            config,
            random,
            living,
            entropy_balance: 0,
        };
        let fsm = Fsm::new(FEEDING_FSM, machine, status, fsm_config)
            .map_err(|e| BrainError::fsm(FEEDING_FSM, e))?;
        fsm.emit_no_payload(FeedingEvent::Init)
            .map_err(|e| BrainError::fsm(FEEDING_FSM, e))?;
        status.register(fsm.attribute(ENTROPY_BALANCE_ATTR, |_, machine| {
            machine.entropy_balance().to_string()
        }))?;
        Ok(Self {
            fsm,
            status: status.clone(),
        })
    }

    /// Feed the eater.
    ///
    /// # Panics
    ///
    /// Panics if `food` is empty.
    pub fn feed(&self, food: Vec<u8>) {
        assert_emitted("feed", self.fsm.emit(FeedingEvent::Feed(food)));
    }

    /// Current state.
    pub fn state(&self) -> FeedingState {
        self.fsm.state()
    }

    /// Current entropy balance.
    pub fn entropy_balance(&self) -> i64 {
        self.fsm.inspect(|_, machine| machine.entropy_balance())
    }

    /// The underlying engine.
    pub const fn fsm(&self) -> &Fsm<FeedingMachine> {
        &self.fsm
    }
}

impl Drop for Feeding {
    fn drop(&mut self) {
        if let Err(e) = self.status.unregister(ENTROPY_BALANCE_ATTR) {
            warn!(error = %e, "Entropy balance attribute already gone");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::living::{Fate, LivingState};
    use crate::random::FixedRandom;

    const PERIOD: u64 = 30 * 60;

    struct Rig {
        status: StatusRegistry,
        living: Arc<Living>,
        feeding: Feeding,
    }

    fn rig(config: BrainConfig) -> Rig {
        let status = StatusRegistry::create("test");
        let config = Arc::new(config);
        let random: Arc<dyn RandomSource> = Arc::new(FixedRandom(0));
        let living = Arc::new(
            Living::new(Arc::clone(&config), Arc::clone(&random), &status, FsmConfig::default())
                .unwrap(),
        );
        let feeding = Feeding::new(
            config,
            random,
            Arc::clone(&living),
            &status,
            FsmConfig::default(),
        )
        .unwrap();
        Rig {
            status,
            living,
            feeding,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn init_resets_balance_and_arms_meal_clock() {
        let rig = rig(BrainConfig::default());
        assert_eq!(rig.feeding.state(), FeedingState::Normal);
        assert_eq!(rig.feeding.entropy_balance(), 0);
        assert_eq!(rig.feeding.fsm().pending_of(&FeedingEvent::FeedingTime), 1);
        assert_eq!(rig.status.read(ENTROPY_BALANCE_ATTR).as_deref(), Some("0\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_entropy_food_keeps_balance() {
        let rig = rig(BrainConfig::default());
        for _ in 0..10 {
            rig.feeding.feed(vec![0x55; 64]);
        }
        assert_eq!(rig.feeding.entropy_balance(), 0);
        assert_eq!(rig.feeding.state(), FeedingState::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn food_adds_entropy_times_length() {
        let rig = rig(BrainConfig::default());
        rig.feeding.feed(b"abababab".to_vec());
        assert_eq!(rig.feeding.entropy_balance(), 8);
        let all: Vec<u8> = (0..=u8::MAX).collect();
        rig.feeding.feed(all);
        assert_eq!(rig.feeding.entropy_balance(), 8 + 8 * 256);
    }

    #[tokio::test(start_paused = true)]
    async fn hunger_sets_in_and_then_starves() {
        let rig = rig(BrainConfig::default());

        tokio::time::sleep(Duration::from_secs(PERIOD * 4 + 1)).await;
        assert_eq!(rig.feeding.entropy_balance(), -4096);
        assert_eq!(rig.feeding.state(), FeedingState::Normal);

        tokio::time::sleep(Duration::from_secs(PERIOD)).await;
        assert_eq!(rig.feeding.entropy_balance(), -5120);
        assert_eq!(rig.feeding.state(), FeedingState::Hungry);
        assert_eq!(rig.living.state(), LivingState::Alive);

        tokio::time::sleep(Duration::from_secs(PERIOD * 5)).await;
        assert_eq!(rig.feeding.entropy_balance(), -10_240);
        assert_eq!(rig.living.fate(), Fate::Died(DeathCause::Starvation));
        assert_eq!(rig.feeding.fsm().pending_of(&FeedingEvent::FeedingTime), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn meal_clock_stops_once_the_eater_is_dead() {
        let rig = rig(BrainConfig::default());
        rig.living.die(DeathCause::Depression);

        tokio::time::sleep(Duration::from_secs(PERIOD * 3)).await;
        assert_eq!(rig.feeding.entropy_balance(), 0);
        assert_eq!(rig.feeding.fsm().pending_of(&FeedingEvent::FeedingTime), 0);
        assert_eq!(rig.living.fate(), Fate::Died(DeathCause::Depression));
    }

    #[tokio::test(start_paused = true)]
    async fn overeating_kills() {
        let rig = rig(BrainConfig::default());
        let meal: Vec<u8> = (0..=u8::MAX).collect();
        // 2048 per meal: Overeaten past 5000, dead at 10000.
        for _ in 0..3 {
            rig.feeding.feed(meal.clone());
        }
        assert_eq!(rig.feeding.state(), FeedingState::Overeaten);
        assert!(rig.living.is_alive());
        for _ in 0..2 {
            rig.feeding.feed(meal.clone());
        }
        assert_eq!(rig.feeding.entropy_balance(), 10_240);
        assert_eq!(rig.living.fate(), Fate::Died(DeathCause::Overeating));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_food_is_rejected_by_the_handler() {
        let rig = rig(BrainConfig::default());
        let err = rig.feeding.fsm().emit(FeedingEvent::Feed(Vec::new())).unwrap_err();
        assert!(matches!(err, FsmError::Rejected { .. }));
        assert_eq!(rig.feeding.entropy_balance(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_removes_attributes() {
        let rig = rig(BrainConfig::default());
        drop(rig.feeding);
        assert!(!rig.status.contains(ENTROPY_BALANCE_ATTR));
        assert!(!rig.status.contains("feeding_fsm_state"));
        assert!(rig.status.contains("living_fsm_state"));
    }
}
