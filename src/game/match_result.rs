//! Match result and final-outcome determination

use serde::{Deserialize, Serialize};

use crate::game::state::{MatchResult, Scoreboard, Side};

/// Reason why a match ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchEndReason {
    /// Attacker carried a ball into the enemy gate
    GateReached,
    /// Defender caught a carrier with no pass available
    DefenderCatch,
    /// Match clock ran out
    TimeExpired,
}

/// Record of one finished match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_index: u32,
    pub result: MatchResult,
    pub reason: MatchEndReason,
    /// Seconds played before the end
    pub elapsed: f32,
    pub attacker: Side,
}

/// Final game outcome from the cumulative score. Higher wins, level is a draw.
pub fn determine_outcome(score: &Scoreboard) -> MatchResult {
    match score.leader() {
        Some(side) => MatchResult::win_for(side),
        None => MatchResult::Draw,
    }
}

/// Result of a single match given the way it ended.
/// `winner` is ignored for `TimeExpired`, which is always a draw.
pub fn result_for(reason: MatchEndReason, winner: Side) -> MatchResult {
    match reason {
        MatchEndReason::TimeExpired => MatchResult::Draw,
        MatchEndReason::GateReached | MatchEndReason::DefenderCatch => MatchResult::win_for(winner),
    }
}

/// Points awarded for a match result: the winner gets one, a draw gives both sides one
pub fn award(score: &mut Scoreboard, result: MatchResult) {
    match result.winner() {
        Some(side) => score.award(side),
        None => {
            score.award(Side::Player);
            score.award(Side::Enemy);
        }
    }
}
