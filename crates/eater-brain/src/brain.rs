//! Composition root: one eater made of four state machines.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eater_fsm::FsmConfig;
use eater_status::StatusRegistry;
use eater_types::{RpsOutcome, RpsSign};
use tokio::sync::watch;
use tracing::info;

use crate::config::BrainConfig;
use crate::error::BrainError;
use crate::feeding::Feeding;
use crate::living::{Fate, Living};
use crate::random::{RandomSource, SeededRandom, ThreadRandom};
use crate::sanitation::Sanitation;
use crate::social::Social;

/// The eater.
///
/// Living is built first because every other machine may kill the eater;
/// the fields are declared in reverse so drop tears Living down last.
pub struct Brain {
    social: Social,
    feeding: Feeding,
    sanitation: Sanitation,
    living: Arc<Living>,
    status: StatusRegistry,
    started_at: DateTime<Utc>,
}

impl Brain {
    /// Build every machine against `status`, drawing randomness from `random`.
    ///
    /// If any machine fails to start, those already built are stopped and
    /// their attributes removed before the error is returned.
    pub fn new(
        config: BrainConfig,
        fsm_config: FsmConfig,
        status: &StatusRegistry,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, BrainError> {
        let config = Arc::new(config);
        let living = Arc::new(Living::new(
            Arc::clone(&config),
            Arc::clone(&random),
            status,
            fsm_config,
        )?);
        let (sanitation, feeding, social) =
            match Self::build_dependents(&config, &random, &living, status, fsm_config) {
                Ok(parts) => parts,
                Err(e) => {
                    living.fsm().cleanup();
                    return Err(e);
                }
            };

        info!(registry = status.name(), "The entropy eater is born");
        Ok(Self {
            social,
            feeding,
            sanitation,
            living,
            status: status.clone(),
            started_at: Utc::now(),
        })
    }

    /// Build with the random source the config asks for: seeded if a seed
    /// is set, otherwise the thread RNG.
    pub fn from_config(
        config: BrainConfig,
        fsm_config: FsmConfig,
        status: &StatusRegistry,
    ) -> Result<Self, BrainError> {
        let random: Arc<dyn RandomSource> = match config.seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        };
        Self::new(config, fsm_config, status, random)
    }

    fn build_dependents(
        config: &Arc<BrainConfig>,
        random: &Arc<dyn RandomSource>,
        living: &Arc<Living>,
        status: &StatusRegistry,
        fsm_config: FsmConfig,
    ) -> Result<(Sanitation, Feeding, Social), BrainError> {
        let sanitation = Sanitation::new(
            Arc::clone(config),
            Arc::clone(random),
            Arc::clone(living),
            status,
            fsm_config,
        )?;
        let feeding = Feeding::new(
            Arc::clone(config),
            Arc::clone(random),
            Arc::clone(living),
            status,
            fsm_config,
        )?;
        let social = Social::new(
            Arc::clone(config),
            Arc::clone(random),
            Arc::clone(living),
            status,
            fsm_config,
        )?;
        Ok((sanitation, feeding, social))
    }

    fn ensure_alive(&self) -> Result<(), BrainError> {
        if self.living.is_alive() {
            Ok(())
        } else {
            Err(BrainError::Dead)
        }
    }

    /// Feed the eater, then schedule the resulting bathroom visit.
    pub fn feed(&self, food: Vec<u8>) -> Result<(), BrainError> {
        self.ensure_alive()?;
        if food.is_empty() {
            return Err(BrainError::EmptyFood);
        }
        self.feeding.feed(food);
        self.sanitation.just_eaten()
    }

    /// Clean up one bathroom visit.
    pub fn sweep(&self) -> Result<(), BrainError> {
        self.ensure_alive()?;
        self.sanitation.sweep()
    }

    /// Clear an infection.
    pub fn disinfect(&self) -> Result<(), BrainError> {
        self.ensure_alive()?;
        self.sanitation.disinfect()
    }

    /// Treat an illness.
    pub fn cure(&self) -> Result<(), BrainError> {
        self.ensure_alive()?;
        self.living.cure_illness()
    }

    /// Play a game of rock-paper-scissors.
    pub fn play_rps(&self, sign: RpsSign) -> Result<RpsOutcome, BrainError> {
        self.ensure_alive()?;
        self.social.play_rps(sign)
    }

    /// Shut the eater down cleanly and stop every clock.
    pub fn die_nobly(&self) {
        self.living.die_nobly();
        self.social.fsm().cancel_all_postponed();
        self.feeding.fsm().cancel_all_postponed();
        self.sanitation.fsm().cancel_all_postponed();
    }

    /// Current fate.
    pub fn fate(&self) -> Fate {
        self.living.fate()
    }

    /// Whether the eater is alive.
    pub fn is_alive(&self) -> bool {
        self.living.is_alive()
    }

    /// Watch for the eater's death.
    pub fn subscribe_fate(&self) -> watch::Receiver<Fate> {
        self.living.subscribe()
    }

    /// When the eater was born.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Registry the machines publish their attributes to.
    pub const fn status(&self) -> &StatusRegistry {
        &self.status
    }

    /// The Living machine.
    pub fn living(&self) -> &Living {
        &self.living
    }

    /// The Feeding machine.
    pub const fn feeding(&self) -> &Feeding {
        &self.feeding
    }

    /// The Sanitation machine.
    pub const fn sanitation(&self) -> &Sanitation {
        &self.sanitation
    }

    /// The Social machine.
    pub const fn social(&self) -> &Social {
        &self.social
    }
}

impl Drop for Brain {
    fn drop(&mut self) {
        // Worker tasks may still hold Living after their engines stop, so
        // stop it here rather than waiting for the last reference.
        self.social.fsm().cleanup();
        self.feeding.fsm().cleanup();
        self.sanitation.fsm().cleanup();
        self.living.fsm().cleanup();
        info!("The entropy eater is gone");
    }
}
