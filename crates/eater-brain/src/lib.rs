//! The entropy eater's brain.
//!
//! Four domain state machines run on the [`eater_fsm`] engine:
//!
//! - [`living`] -- health, illness, and death
//! - [`feeding`] -- the entropy balance and the hunger clock
//! - [`sanitation`] -- bathroom visits, sweeping, and infection
//! - [`social`] -- mood, kept up by games of rock-paper-scissors
//!
//! [`Brain`] builds them in dependency order (Living first, since the
//! others may kill the eater) and tears them down in reverse.
//!
//! Supporting modules:
//!
//! - [`config`] -- timing and threshold tunables
//! - [`random`] -- the randomness seam used for jitter and dice rolls
//! - [`entropy`] -- Shannon entropy estimate of food
//! - [`rps`] -- rock-paper-scissors rules

pub mod brain;
pub mod config;
pub mod entropy;
pub mod error;
pub mod feeding;
pub mod living;
pub mod random;
pub mod rps;
pub mod sanitation;
pub mod social;

pub use brain::Brain;
pub use config::BrainConfig;
pub use error::BrainError;
pub use living::{DeathCause, Fate};
pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};

use eater_fsm::FsmError;

/// Panic unless an emit that cannot fail succeeded.
pub(crate) fn assert_emitted(what: &str, result: Result<(), FsmError>) {
    assert!(result.is_ok(), "{what} failed: {:?}", result.err());
}
