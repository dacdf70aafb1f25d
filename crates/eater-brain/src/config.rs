//! Tunables of the eater's behavior.
//!
//! Mirrors the `brain` section of `eater-config.yaml`. Every field has a
//! default, so an empty section yields a fully working eater. Durations
//! are in seconds and are jittered by the deviation percentages each
//! time a timer is armed.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for all four domain state machines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BrainConfig {
    /// Jitter applied to every timer, in percent (default: 10).
    #[serde(default = "default_time_deviation_pct")]
    pub time_deviation_pct: u32,

    /// Jitter applied to the hunger requirement, in percent (default: 10).
    #[serde(default = "default_entropy_deviation_pct")]
    pub entropy_deviation_pct: u32,

    /// Seconds between meals (default: 1800).
    #[serde(default = "default_feeding_period_secs")]
    pub feeding_period_secs: u64,

    /// Entropy consumed at each meal time (default: 1024).
    #[serde(default = "default_hunger_entropy_required")]
    pub hunger_entropy_required: u64,

    /// Balance at or below which the eater starves (default: -10000).
    #[serde(default = "default_entropy_critically_low")]
    pub entropy_critically_low: i64,

    /// Balance at or above which the eater overeats (default: 10000).
    #[serde(default = "default_entropy_critically_high")]
    pub entropy_critically_high: i64,

    /// Seconds between a meal and the bathroom visit (default: 300).
    #[serde(default = "default_go_to_bathroom_delay_secs")]
    pub go_to_bathroom_delay_secs: u64,

    /// Bathroom visits that make the place dirty (default: 1).
    #[serde(default = "default_bathroom_dirty")]
    pub bathroom_dirty: u32,

    /// Bathroom visits that make the place insanitary (default: 3).
    #[serde(default = "default_bathroom_insanitary")]
    pub bathroom_insanitary: u32,

    /// Seconds between infection dice rolls (default: 600).
    #[serde(default = "default_infection_dice_roll_delay_secs")]
    pub infection_dice_roll_delay_secs: u64,

    /// Seconds without play before mood drops a step (default: 3600).
    #[serde(default = "default_social_demotion_secs")]
    pub social_demotion_secs: u64,

    /// Games needed to lift mood a step (default: 3).
    #[serde(default = "default_rps_promote_count")]
    pub rps_promote_count: u32,

    /// Seconds until an illness is revised (default: 1800).
    #[serde(default = "default_illness_revise_secs")]
    pub illness_revise_secs: u64,

    /// Seconds a serious illness takes to kill (default: 1800).
    #[serde(default = "default_illness_death_secs")]
    pub illness_death_secs: u64,

    /// Seed for the random source; `None` draws from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl BrainConfig {
    /// Nominal meal period.
    pub const fn feeding_period(&self) -> Duration {
        Duration::from_secs(self.feeding_period_secs)
    }

    /// Nominal delay before a bathroom visit.
    pub const fn go_to_bathroom_delay(&self) -> Duration {
        Duration::from_secs(self.go_to_bathroom_delay_secs)
    }

    /// Nominal delay between infection dice rolls.
    pub const fn infection_dice_roll_delay(&self) -> Duration {
        Duration::from_secs(self.infection_dice_roll_delay_secs)
    }

    /// Nominal mood demotion period.
    pub const fn social_demotion(&self) -> Duration {
        Duration::from_secs(self.social_demotion_secs)
    }

    /// Nominal delay before an illness is revised.
    pub const fn illness_revise(&self) -> Duration {
        Duration::from_secs(self.illness_revise_secs)
    }

    /// Nominal delay before a serious illness kills.
    pub const fn illness_death(&self) -> Duration {
        Duration::from_secs(self.illness_death_secs)
    }
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            time_deviation_pct: default_time_deviation_pct(),
            entropy_deviation_pct: default_entropy_deviation_pct(),
            feeding_period_secs: default_feeding_period_secs(),
            hunger_entropy_required: default_hunger_entropy_required(),
            entropy_critically_low: default_entropy_critically_low(),
            entropy_critically_high: default_entropy_critically_high(),
            go_to_bathroom_delay_secs: default_go_to_bathroom_delay_secs(),
            bathroom_dirty: default_bathroom_dirty(),
            bathroom_insanitary: default_bathroom_insanitary(),
            infection_dice_roll_delay_secs: default_infection_dice_roll_delay_secs(),
            social_demotion_secs: default_social_demotion_secs(),
            rps_promote_count: default_rps_promote_count(),
            illness_revise_secs: default_illness_revise_secs(),
            illness_death_secs: default_illness_death_secs(),
            seed: None,
        }
    }
}

const fn default_time_deviation_pct() -> u32 {
    10
}

const fn default_entropy_deviation_pct() -> u32 {
    10
}

const fn default_feeding_period_secs() -> u64 {
    30 * 60
}

const fn default_hunger_entropy_required() -> u64 {
    1024
}

const fn default_entropy_critically_low() -> i64 {
    -10_000
}

const fn default_entropy_critically_high() -> i64 {
    10_000
}

const fn default_go_to_bathroom_delay_secs() -> u64 {
    5 * 60
}

const fn default_bathroom_dirty() -> u32 {
    1
}

const fn default_bathroom_insanitary() -> u32 {
    3
}

const fn default_infection_dice_roll_delay_secs() -> u64 {
    10 * 60
}

const fn default_social_demotion_secs() -> u64 {
    60 * 60
}

const fn default_rps_promote_count() -> u32 {
    3
}

const fn default_illness_revise_secs() -> u64 {
    30 * 60
}

const fn default_illness_death_secs() -> u64 {
    30 * 60
}
