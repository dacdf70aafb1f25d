//! Rock-paper-scissors rules.

use eater_types::{RpsResult, RpsSign};

use crate::random::RandomSource;

/// Decide a game between two signs.
pub const fn rps_get_winner(first: RpsSign, second: RpsSign) -> RpsResult {
    if first as u8 == second as u8 {
        RpsResult::Draw
    } else if first.beats() as u8 == second as u8 {
        RpsResult::WinnerFirst
    } else {
        RpsResult::WinnerSecond
    }
}

/// Pick a sign uniformly at random.
pub fn random_sign(random: &dyn RandomSource) -> RpsSign {
    match random.below(u64::from(RpsSign::COUNT)) {
        0 => RpsSign::Rock,
        1 => RpsSign::Paper,
        _ => RpsSign::Scissors,
    }
}
