//! Engine tunables.

use serde::Deserialize;

/// Per-engine limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FsmConfig {
    /// Maximum number of pending postponed events (default: 64).
    ///
    /// Postponing beyond this fails with
    /// [`PostponeError::QueueFull`](crate::PostponeError::QueueFull).
    #[serde(default = "default_max_postponed")]
    pub max_postponed: usize,
}

impl Default for FsmConfig {
    fn default() -> Self {
        Self {
            max_postponed: default_max_postponed(),
        }
    }
}

const fn default_max_postponed() -> usize {
    64
}
