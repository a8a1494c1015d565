//! Top-level match state machine
//!
//! Owns the match record, the cumulative score and both energy pools. Terminal
//! reports from the field come in through `report_gate_reached` and
//! `report_defender_catch`; the clock draw comes out of `tick`.

use tracing::{info, warn};

use crate::config::{EnergyConfig, MatchConfig};
use crate::game::energy::EnergyPool;
use crate::game::match_result::{self, MatchEndReason, MatchSummary};
use crate::game::state::{MatchPhase, MatchRecord, MatchResult, Role, Scoreboard, Side};

/// What happens after `end_match`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTransition {
    /// Another match follows after the configured delay
    NextMatch(u32),
    /// Last match played; final outcome from the cumulative score
    GameFinished(MatchResult),
}

#[derive(Debug, Clone)]
pub struct MatchController {
    config: MatchConfig,
    record: MatchRecord,
    score: Scoreboard,
    energy: [EnergyPool; 2],
    /// End reason recorded alongside the result
    pending_reason: Option<MatchEndReason>,
    history: Vec<MatchSummary>,
    final_outcome: Option<MatchResult>,
}

impl MatchController {
    pub fn new(config: MatchConfig, energy: &EnergyConfig) -> Self {
        let record = MatchRecord::new(1, config.effective_duration());
        Self {
            config,
            record,
            score: Scoreboard::default(),
            energy: [
                EnergyPool::from_config(Side::Player, energy),
                EnergyPool::from_config(Side::Enemy, energy),
            ],
            pending_reason: None,
            history: Vec::new(),
            final_outcome: None,
        }
    }

    pub fn record(&self) -> &MatchRecord {
        &self.record
    }

    pub fn phase(&self) -> MatchPhase {
        self.record.phase
    }

    pub fn is_playing(&self) -> bool {
        self.record.is_playing()
    }

    pub fn match_index(&self) -> u32 {
        self.record.match_index
    }

    pub fn total_matches(&self) -> u32 {
        self.config.total_matches
    }

    pub fn score(&self) -> Scoreboard {
        self.score
    }

    pub fn history(&self) -> &[MatchSummary] {
        &self.history
    }

    pub fn final_outcome(&self) -> Option<MatchResult> {
        self.final_outcome
    }

    pub fn is_finished(&self) -> bool {
        self.final_outcome.is_some()
    }

    pub fn energy(&self, side: Side) -> &EnergyPool {
        &self.energy[side.index()]
    }

    pub fn energy_mut(&mut self, side: Side) -> &mut EnergyPool {
        &mut self.energy[side.index()]
    }

    pub fn role_of(&self, side: Side) -> Role {
        Role::for_match(self.record.match_index, side)
    }

    pub fn attacking_side(&self) -> Side {
        Role::attacking_side(self.record.match_index)
    }

    /// Seconds left on the clock
    pub fn remaining_time(&self) -> f32 {
        self.record.remaining()
    }

    /// Fraction of the match clock used, in `[0, 1]`
    pub fn match_progress(&self) -> f32 {
        if self.record.duration > 0.0 {
            (1.0 - self.record.remaining() / self.record.duration).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// "Match i/N"
    pub fn match_label(&self) -> String {
        format!("Match {}/{}", self.record.match_index, self.config.total_matches)
    }

    /// Reset record and pools for match `index` and start playing.
    /// Rosters and balls are the caller's job.
    pub fn begin_match(&mut self, index: u32) {
        self.record = MatchRecord::new(index, self.config.effective_duration());
        for pool in self.energy.iter_mut() {
            pool.reset();
        }
        self.pending_reason = None;
        self.record.phase = MatchPhase::Playing;
        info!(
            "{} started, {} attacks, {:.0}s on the clock",
            self.match_label(),
            self.attacking_side(),
            self.record.duration
        );
    }

    /// Per-tick clock and economy. Decrement first, then check, so the tick
    /// that reaches zero is the tick that ends the match.
    pub fn tick(&mut self, dt: f32) -> Option<MatchEndReason> {
        if !self.is_playing() {
            return None;
        }
        self.record.elapsed = (self.record.elapsed + dt.max(0.0)).min(self.record.duration);
        for pool in self.energy.iter_mut() {
            pool.regenerate(dt);
        }
        if self.record.remaining() <= 0.0 && self.record.result.is_none() {
            self.settle(MatchResult::Draw, MatchEndReason::TimeExpired);
            return Some(MatchEndReason::TimeExpired);
        }
        None
    }

    /// A ball reached `scoring_side`'s target gate. Only the attacking side scores.
    pub fn report_gate_reached(&mut self, scoring_side: Side) -> Option<MatchResult> {
        if !self.accepting_reports("gate reached") {
            return None;
        }
        if self.role_of(scoring_side) != Role::Attacker {
            warn!("{} reached a gate while defending, ignored", scoring_side);
            return None;
        }
        let result = MatchResult::win_for(scoring_side);
        self.settle(result, MatchEndReason::GateReached);
        Some(result)
    }

    /// A defender caught a carrier with nobody to pass to. No role check.
    pub fn report_defender_catch(&mut self, defending_side: Side) -> Option<MatchResult> {
        if !self.accepting_reports("defender catch") {
            return None;
        }
        let result = MatchResult::win_for(defending_side);
        self.settle(result, MatchEndReason::DefenderCatch);
        Some(result)
    }

    fn accepting_reports(&self, what: &str) -> bool {
        if self.is_playing() && self.record.result.is_none() {
            true
        } else {
            warn!("Ignoring {} report, match {} already decided", what, self.record.match_index);
            false
        }
    }

    fn settle(&mut self, result: MatchResult, reason: MatchEndReason) {
        self.record.result = Some(result);
        self.pending_reason = Some(reason);
        match_result::award(&mut self.score, result);
    }

    /// Close the decided match. Returns None when there is no result to close.
    pub fn end_match(&mut self) -> Option<MatchTransition> {
        let result = self.record.result?;
        if self.record.phase == MatchPhase::GameOver {
            return None;
        }
        let reason = self.pending_reason.unwrap_or(MatchEndReason::TimeExpired);
        self.record.phase = MatchPhase::GameOver;
        self.history.push(MatchSummary {
            match_index: self.record.match_index,
            result,
            reason,
            elapsed: self.record.elapsed,
            attacker: self.attacking_side(),
        });
        info!(
            "{} ended: {:?} ({:?}), score {}-{}",
            self.match_label(),
            result,
            reason,
            self.score.player,
            self.score.enemy
        );

        if self.record.match_index < self.config.total_matches {
            Some(MatchTransition::NextMatch(self.record.match_index + 1))
        } else {
            let outcome = match_result::determine_outcome(&self.score);
            self.final_outcome = Some(outcome);
            info!("Game finished: {:?}", outcome);
            Some(MatchTransition::GameFinished(outcome))
        }
    }

    /// Reason the current match was decided, if it has been
    pub fn end_reason(&self) -> Option<MatchEndReason> {
        self.pending_reason
    }
}

/// "M Minute S Second", or "S Second" under a minute
pub fn format_time(seconds: f32) -> String {
    let total = seconds.max(0.0);
    let minutes = (total / 60.0).floor() as u32;
    let secs = (total % 60.0).floor() as u32;
    if minutes > 0 {
        format!("{} Minute {} Second", minutes, secs)
    } else {
        format!("{} Second", secs)
    }
}
