//! Enumerations shared by the brain, the server, and the CLI.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A rock-paper-scissors hand sign.
///
/// The discriminants are the on-wire values of the `rps_sign` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpsSign {
    /// Beats scissors.
    Rock = 0,
    /// Beats rock.
    Paper = 1,
    /// Beats paper.
    Scissors = 2,
}

impl RpsSign {
    /// Number of distinct signs.
    pub const COUNT: u8 = 3;

    /// All signs in wire order.
    pub const ALL: [Self; 3] = [Self::Rock, Self::Paper, Self::Scissors];

    /// Decode a wire value. Returns `None` for anything outside `0..=2`.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Rock),
            1 => Some(Self::Paper),
            2 => Some(Self::Scissors),
            _ => None,
        }
    }

    /// The wire value of this sign.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Lowercase sign name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissors => "scissors",
        }
    }

    /// The sign this one defeats.
    pub const fn beats(self) -> Self {
        match self {
            Self::Rock => Self::Scissors,
            Self::Paper => Self::Rock,
            Self::Scissors => Self::Paper,
        }
    }
}

impl fmt::Display for RpsSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown sign name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSignError(pub String);

impl fmt::Display for ParseSignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sign '{}' (expected rock, paper or scissors)", self.0)
    }
}

impl std::error::Error for ParseSignError {}

impl FromStr for RpsSign {
    type Err = ParseSignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" => Ok(Self::Rock),
            "paper" => Ok(Self::Paper),
            "scissors" => Ok(Self::Scissors),
            _ => Err(ParseSignError(s.to_owned())),
        }
    }
}

/// Outcome of a single game between two signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpsResult {
    /// The first sign won.
    WinnerFirst,
    /// The second sign won.
    WinnerSecond,
    /// Both signs were equal.
    Draw,
}

/// A resolved game between the owner and the eater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpsOutcome {
    /// The sign the owner played.
    pub user_sign: RpsSign,
    /// The sign the eater picked.
    pub eater_sign: RpsSign,
    /// Result with the owner as the first player.
    pub result: RpsResult,
}

impl RpsOutcome {
    /// Short verdict from the owner's point of view.
    pub const fn verdict(&self) -> &'static str {
        match self.result {
            RpsResult::WinnerFirst => "you won",
            RpsResult::WinnerSecond => "I won",
            RpsResult::Draw => "draw",
        }
    }
}
