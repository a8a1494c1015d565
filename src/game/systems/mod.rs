//! Per-tick behavior systems
//!
//! Agents decide from an immutable `WorldView` in parallel; the game loop then
//! applies the resulting `Intent`s one at a time. Nothing here mutates shared
//! state.

pub mod attacker;
pub mod ball_physics;
pub mod catch;
pub mod defender;

use rayon::prelude::*;

use crate::config::SoldierConfig;
use crate::game::ball::BallArena;
use crate::game::roster::TeamRoster;
use crate::game::soldier::{Soldier, SoldierState};
use crate::game::state::{BallId, Role, Side, SoldierId};
use crate::util::vec2::Vec2;

/// Read-only snapshot handed to decision functions
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    pub rosters: &'a [TeamRoster; 2],
    pub balls: &'a BallArena,
    pub soldier: &'a SoldierConfig,
}

impl<'a> WorldView<'a> {
    pub fn roster(&self, side: Side) -> &'a TeamRoster {
        &self.rosters[side.index()]
    }
}

/// What one agent wants to do this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Walk (or stand) with an optional state change
    Move {
        position: Vec2,
        facing: Vec2,
        state: SoldierState,
    },
    /// Pick up a free ball in range
    PickUp(BallId),
    /// Attacker without a ball touched its fence
    TouchFence,
    /// Carrier touched the gate
    TouchGate(BallId),
    /// Chasing defender within catch distance
    Catch(SoldierId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intent {
    pub side: Side,
    pub soldier: SoldierId,
    pub action: Action,
}

impl Intent {
    /// Catches resolve after every movement of the tick
    fn apply_pass(&self) -> u8 {
        match self.action {
            Action::Catch(_) => 1,
            _ => 0,
        }
    }
}

/// Single-agent decision
pub fn decide(soldier: &Soldier, view: &WorldView<'_>, dt: f32) -> Option<Intent> {
    if soldier.is_inert() {
        return None;
    }
    let action = match soldier.role {
        Role::Attacker => attacker::decide(soldier, view, dt),
        Role::Defender => defender::decide(soldier, view, dt),
    }?;
    Some(Intent {
        side: soldier.side,
        soldier: soldier.id,
        action,
    })
}

/// Decide for every soldier on both sides in parallel.
/// The returned list is in application order: movement before catches, then by id.
pub fn decide_all(view: &WorldView<'_>, dt: f32) -> Vec<Intent> {
    let mut intents: Vec<Intent> = view
        .rosters
        .par_iter()
        .flat_map(|roster| {
            roster
                .soldiers()
                .par_values()
                .filter_map(|soldier| decide(soldier, view, dt))
                .collect::<Vec<_>>()
        })
        .collect();
    intents.sort_by_key(|i| (i.apply_pass(), i.soldier));
    intents
}
