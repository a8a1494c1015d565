//! Ball entities and the possession protocol
//!
//! A ball is `Free`, `Held` by exactly one soldier, or `InFlight` toward a
//! designated receiver while a directed-pass window is open. Every transition
//! goes through `BallArena`, which rejects anything that would give a ball a
//! second holder.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::game::state::{BallId, Side, SoldierId};
use crate::util::vec2::Vec2;

/// Who, if anyone, owns the ball
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Possession {
    /// Loose on the ground, eligible for autonomous pickup
    Free,
    /// Carried by one soldier
    Held(SoldierId),
    /// Directed pass in progress, only `target` may receive it
    InFlight { target: SoldierId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    /// Roster that spawned the ball
    pub owner_side: Side,
    pub position: Vec2,
    pub height: f32,
    pub velocity: Vec2,
    pub possession: Possession,
}

impl Ball {
    pub fn new(id: BallId, owner_side: Side, position: Vec2, height: f32) -> Self {
        Self {
            id,
            owner_side,
            position,
            height,
            velocity: Vec2::ZERO,
            possession: Possession::Free,
        }
    }

    pub fn holder(&self) -> Option<SoldierId> {
        match self.possession {
            Possession::Held(id) => Some(id),
            _ => None,
        }
    }

    /// No holder and no open pass window
    #[inline]
    pub fn is_free(&self) -> bool {
        self.possession == Possession::Free
    }

    #[inline]
    pub fn is_in_flight(&self) -> bool {
        matches!(self.possession, Possession::InFlight { .. })
    }
}

/// Possession protocol violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PossessionError {
    #[error("ball {0:?} does not exist")]
    UnknownBall(BallId),
    #[error("ball {ball:?} is already held by {holder:?}")]
    AlreadyHeld { ball: BallId, holder: SoldierId },
    #[error("ball {ball:?} is in flight to {target:?}")]
    ReservedForPass { ball: BallId, target: SoldierId },
    #[error("soldier {soldier:?} does not hold ball {ball:?}")]
    NotHolder { ball: BallId, soldier: SoldierId },
    #[error("ball {0:?} has no pass in progress")]
    NoPassInProgress(BallId),
}

/// Live balls indexed by id, owned by the simulation root
#[derive(Debug, Clone, Default)]
pub struct BallArena {
    balls: HashMap<BallId, Ball>,
}

impl BallArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ball: Ball) {
        self.balls.insert(ball.id, ball);
    }

    pub fn remove(&mut self, id: BallId) -> Option<Ball> {
        self.balls.remove(&id)
    }

    pub fn get(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(&id)
    }

    pub fn get_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.balls.get_mut(&id)
    }

    pub fn values(&self) -> impl Iterator<Item = &Ball> {
        self.balls.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Ball> {
        self.balls.values_mut()
    }

    pub fn ids(&self) -> Vec<BallId> {
        self.balls.keys().copied().collect()
    }

    pub(crate) fn inner_mut(&mut self) -> &mut HashMap<BallId, Ball> {
        &mut self.balls
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    pub fn clear(&mut self) {
        self.balls.clear();
    }

    /// Free -> Held, or InFlight -> Held when `soldier` is the pass target.
    /// Range checks are the caller's job; this only guards the single-holder rule.
    pub fn pickup(&mut self, id: BallId, soldier: SoldierId) -> Result<(), PossessionError> {
        let ball = self
            .balls
            .get_mut(&id)
            .ok_or(PossessionError::UnknownBall(id))?;
        match ball.possession {
            Possession::Free => {}
            Possession::InFlight { target } if target == soldier => {}
            Possession::InFlight { target } => {
                return Err(PossessionError::ReservedForPass { ball: id, target });
            }
            Possession::Held(holder) => {
                return Err(PossessionError::AlreadyHeld { ball: id, holder });
            }
        }
        ball.possession = Possession::Held(soldier);
        ball.velocity = Vec2::ZERO;
        Ok(())
    }

    /// Held -> Free (or InFlight when `target` is set) with an impulse.
    /// Unit mass, so the impulse becomes the velocity directly.
    pub fn throw(
        &mut self,
        id: BallId,
        soldier: SoldierId,
        direction: Vec2,
        force: f32,
        max_speed: f32,
        target: Option<SoldierId>,
    ) -> Result<(), PossessionError> {
        let ball = self
            .balls
            .get_mut(&id)
            .ok_or(PossessionError::UnknownBall(id))?;
        if ball.possession != Possession::Held(soldier) {
            return Err(PossessionError::NotHolder { ball: id, soldier });
        }
        ball.velocity = (direction.normalize() * force).clamp_length(max_speed);
        ball.possession = match target {
            Some(target) => Possession::InFlight { target },
            None => Possession::Free,
        };
        Ok(())
    }

    /// Drop a held ball in place without an impulse
    pub fn release(&mut self, id: BallId, soldier: SoldierId) -> Result<(), PossessionError> {
        let ball = self
            .balls
            .get_mut(&id)
            .ok_or(PossessionError::UnknownBall(id))?;
        if ball.possession != Possession::Held(soldier) {
            return Err(PossessionError::NotHolder { ball: id, soldier });
        }
        ball.possession = Possession::Free;
        Ok(())
    }

    /// Close an expired pass window. The ball stays where it is, Free.
    pub fn expire_pass(&mut self, id: BallId) -> Result<(), PossessionError> {
        let ball = self
            .balls
            .get_mut(&id)
            .ok_or(PossessionError::UnknownBall(id))?;
        if !ball.is_in_flight() {
            return Err(PossessionError::NoPassInProgress(id));
        }
        ball.possession = Possession::Free;
        Ok(())
    }
}
