//! Soldier agents
//!
//! One struct for both roles; `state` carries the role-specific branch.
//!
//! Attacker: `Activating -> Seeking -> ChasingBall -> CarryingToGate`, with
//! `Incapacitated` after being caught. Defender: `Activating -> Standby ->
//! Chasing -> Incapacitated -> Returning -> Standby`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::state::{BallId, Role, Side, SoldierId};
use crate::game::structures::{StructureRef, StructureRegistry, StructureType};
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SoldierState {
    /// Inert spawn delay
    Activating,
    /// Attacker without a ball: scans for a free ball while walking to its fence
    Seeking,
    /// Attacker closing on a specific free ball
    ChasingBall(BallId),
    /// Attacker heading for the enemy gate with a ball
    CarryingToGate,
    /// Defender idle at its post, detection active
    Standby,
    /// Defender pursuing a carrier
    Chasing(SoldierId),
    /// Defender walking back to its post
    Returning,
    /// Post-catch inert time, either role
    Incapacitated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Soldier {
    pub id: SoldierId,
    pub side: Side,
    pub role: Role,
    pub position: Vec2,
    pub height: f32,
    /// Unit heading on the ground plane
    pub facing: Vec2,
    /// Post a defender returns to
    pub spawn_position: Vec2,
    pub state: SoldierState,
    pub held_ball: Option<BallId>,
    /// Simulation time when the current incapacitation ends
    pub incapacitated_until: Option<f32>,
    pub target_gate: Option<StructureRef>,
    pub target_fence: Option<StructureRef>,
}

impl Soldier {
    pub fn new(id: SoldierId, side: Side, role: Role, position: Vec2, height: f32) -> Self {
        // Face the far end of the field
        let facing = match side {
            Side::Player => Vec2::FORWARD,
            Side::Enemy => -Vec2::FORWARD,
        };
        Self {
            id,
            side,
            role,
            position,
            height,
            facing,
            spawn_position: position,
            state: SoldierState::Activating,
            held_ball: None,
            incapacitated_until: None,
            target_gate: None,
            target_fence: None,
        }
    }

    /// Inert soldiers neither move, detect, catch nor receive passes
    #[inline]
    pub fn is_inert(&self) -> bool {
        matches!(
            self.state,
            SoldierState::Activating | SoldierState::Incapacitated
        )
    }

    #[inline]
    pub fn is_incapacitated(&self) -> bool {
        self.state == SoldierState::Incapacitated
    }

    #[inline]
    pub fn is_carrying(&self) -> bool {
        self.held_ball.is_some()
    }

    /// Default active state for the current role
    pub fn idle_state(&self) -> SoldierState {
        match self.role {
            Role::Attacker if self.held_ball.is_some() => SoldierState::CarryingToGate,
            Role::Attacker => SoldierState::Seeking,
            Role::Defender => SoldierState::Standby,
        }
    }

    /// Look up gate and fence for the current role
    pub fn resolve_targets<R: Rng + ?Sized>(&mut self, registry: &StructureRegistry, rng: &mut R) {
        self.target_gate = registry.find_target(self.role, self.side, StructureType::Gate, rng);
        self.target_fence = registry.find_target(self.role, self.side, StructureType::Fence, rng);
    }

    /// Activation delay over: pick targets and start acting
    pub fn activate<R: Rng + ?Sized>(&mut self, registry: &StructureRegistry, rng: &mut R) {
        if self.state != SoldierState::Activating {
            return;
        }
        self.resolve_targets(registry, rng);
        self.state = self.idle_state();
    }

    /// Role flip while alive. Active soldiers restart in the new role's default state.
    pub fn set_role<R: Rng + ?Sized>(
        &mut self,
        role: Role,
        registry: &StructureRegistry,
        rng: &mut R,
    ) {
        if self.role == role {
            return;
        }
        self.role = role;
        if self.state == SoldierState::Activating {
            return;
        }
        self.resolve_targets(registry, rng);
        if !self.is_incapacitated() {
            self.state = self.idle_state();
        }
    }

    /// Freeze for `duration` seconds starting at `now`
    pub fn incapacitate(&mut self, now: f32, duration: f32) {
        self.state = SoldierState::Incapacitated;
        self.incapacitated_until = Some(now + duration);
    }

    /// Inert time over. Defenders walk back to their post, attackers resume.
    pub fn recover(&mut self) {
        if self.state != SoldierState::Incapacitated {
            return;
        }
        self.incapacitated_until = None;
        self.state = match self.role {
            Role::Defender => SoldierState::Returning,
            Role::Attacker => self.idle_state(),
        };
    }

    /// Step toward `target` by at most `max_step`, turning to face it
    pub fn step_toward(&self, target: Vec2, max_step: f32) -> (Vec2, Vec2) {
        let heading = self.position.direction_to(target);
        let facing = if heading.is_zero(1e-6) {
            self.facing
        } else {
            heading
        };
        (self.position.move_toward(target, max_step), facing)
    }
}
