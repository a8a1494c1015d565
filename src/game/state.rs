//! Core identity and match-record types
//!
//! Sides, roles, match phases, per-match records and the cumulative scoreboard.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed team identity for the whole game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Player, Side::Enemy];

    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }

    /// Stable array index (Player = 0, Enemy = 1)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Enemy => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => write!(f, "Player"),
            Side::Enemy => write!(f, "Enemy"),
        }
    }
}

/// Per-match role, swaps every match
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Attacker,
    Defender,
}

impl Role {
    pub fn other(self) -> Role {
        match self {
            Role::Attacker => Role::Defender,
            Role::Defender => Role::Attacker,
        }
    }

    /// Role of `side` in match `match_index` (1-based).
    /// Odd matches put the Player side on attack.
    pub fn for_match(match_index: u32, side: Side) -> Role {
        let player_role = if match_index % 2 == 1 {
            Role::Attacker
        } else {
            Role::Defender
        };
        match side {
            Side::Player => player_role,
            Side::Enemy => player_role.other(),
        }
    }

    /// Side that attacks in match `match_index`
    pub fn attacking_side(match_index: u32) -> Side {
        if Role::for_match(match_index, Side::Player) == Role::Attacker {
            Side::Player
        } else {
            Side::Enemy
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Attacker => write!(f, "Attacker"),
            Role::Defender => write!(f, "Defender"),
        }
    }
}

/// Unique soldier identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoldierId(pub u64);

/// Unique ball identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BallId(pub u64);

/// Monotonic id source for soldiers and balls. Ids are never reused.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    pub fn next_soldier(&mut self) -> SoldierId {
        SoldierId(self.bump())
    }

    pub fn next_ball(&mut self) -> BallId {
        BallId(self.bump())
    }
}

/// Match phase
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MatchPhase {
    /// Match being set up
    #[default]
    Preparing,
    /// Match in progress
    Playing,
    /// Match ended (final only after the last match)
    GameOver,
}

/// Outcome of a single match
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchResult {
    PlayerWin,
    EnemyWin,
    Draw,
}

impl MatchResult {
    pub fn win_for(side: Side) -> Self {
        match side {
            Side::Player => MatchResult::PlayerWin,
            Side::Enemy => MatchResult::EnemyWin,
        }
    }

    pub fn winner(self) -> Option<Side> {
        match self {
            MatchResult::PlayerWin => Some(Side::Player),
            MatchResult::EnemyWin => Some(Side::Enemy),
            MatchResult::Draw => None,
        }
    }
}

/// Record of the match currently being played
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    /// 1-based match index
    pub match_index: u32,
    /// Configured duration in seconds
    pub duration: f32,
    /// Seconds elapsed while playing (clamped to `duration`)
    pub elapsed: f32,
    pub phase: MatchPhase,
    pub result: Option<MatchResult>,
}

impl MatchRecord {
    pub fn new(match_index: u32, duration: f32) -> Self {
        Self {
            match_index,
            duration,
            elapsed: 0.0,
            phase: MatchPhase::Preparing,
            result: None,
        }
    }

    /// Seconds left on the match clock
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    pub fn is_playing(&self) -> bool {
        self.phase == MatchPhase::Playing
    }

    /// Once a result is set and the phase is GameOver the record no longer changes
    pub fn is_settled(&self) -> bool {
        self.phase == MatchPhase::GameOver && self.result.is_some()
    }
}

/// Cumulative game score
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scoreboard {
    pub player: u32,
    pub enemy: u32,
}

impl Scoreboard {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player,
            Side::Enemy => self.enemy,
        }
    }

    pub fn award(&mut self, side: Side) {
        match side {
            Side::Player => self.player += 1,
            Side::Enemy => self.enemy += 1,
        }
    }

    /// Leading side, or None when level
    pub fn leader(&self) -> Option<Side> {
        use std::cmp::Ordering;
        match self.player.cmp(&self.enemy) {
            Ordering::Greater => Some(Side::Player),
            Ordering::Less => Some(Side::Enemy),
            Ordering::Equal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_assignment_by_parity() {
        for index in 1..=9 {
            let player = Role::for_match(index, Side::Player);
            let enemy = Role::for_match(index, Side::Enemy);
            assert_ne!(player, enemy, "exactly one attacker in match {}", index);
            if index % 2 == 1 {
                assert_eq!(player, Role::Attacker);
            } else {
                assert_eq!(enemy, Role::Attacker);
            }
        }
    }

    #[test]
    fn test_attacking_side_alternates() {
        assert_eq!(Role::attacking_side(1), Side::Player);
        assert_eq!(Role::attacking_side(2), Side::Enemy);
        assert_eq!(Role::attacking_side(3), Side::Player);
    }

    #[test]
    fn test_side_opponent_and_index() {
        assert_eq!(Side::Player.opponent(), Side::Enemy);
        assert_eq!(Side::Enemy.opponent().index(), 0);
    }

    #[test]
    fn test_match_record_remaining() {
        let mut record = MatchRecord::new(1, 10.0);
        record.elapsed = 4.0;
        assert!((record.remaining() - 6.0).abs() < 0.0001);
        record.elapsed = 12.0;
        assert_eq!(record.remaining(), 0.0);
        assert!(!record.is_settled());
    }

    #[test]
    fn test_scoreboard_leader() {
        let mut score = Scoreboard::default();
        assert_eq!(score.leader(), None);
        score.award(Side::Enemy);
        assert_eq!(score.leader(), Some(Side::Enemy));
        score.award(Side::Player);
        score.award(Side::Player);
        assert_eq!(score.get(Side::Player), 2);
        assert_eq!(score.leader(), Some(Side::Player));
    }

    #[test]
    fn test_id_allocator_never_reuses() {
        let mut ids = IdAllocator::new();
        let a = ids.next_soldier();
        let b = ids.next_ball();
        let c = ids.next_soldier();
        assert_ne!(a.0, b.0);
        assert!(c > a);
    }

    #[test]
    fn test_match_result_winner() {
        assert_eq!(MatchResult::win_for(Side::Enemy).winner(), Some(Side::Enemy));
        assert_eq!(MatchResult::Draw.winner(), None);
    }
}
