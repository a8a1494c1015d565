//! Per-side team roster
//!
//! Owns the side's soldiers and tracks the balls it spawned this match.
//! Spawn admission runs the pause, energy and geometry checks in order and
//! refunds the energy charge when a later check fails.

use hashbrown::HashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::{ConfigError, RosterConfig};
use crate::game::ball::{Ball, BallArena};
use crate::game::constants::ball::SPAWN_LIFT;
use crate::game::energy::EnergyPool;
use crate::game::scheduler::{Scheduler, Task, TaskOwner};
use crate::game::soldier::Soldier;
use crate::game::spatial::SpatialQuery;
use crate::game::state::{BallId, IdAllocator, Role, Side, SoldierId};
use crate::game::structures::StructureRegistry;
use crate::util::vec2::Vec2;

/// Why a spawn request was refused
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SpawnRejection {
    Paused,
    NotPlaying,
    /// No spawn area configured; permanent
    RosterDisabled,
    InsufficientEnergy,
    /// Spatial query found no surface under the point (energy refunded)
    NoSurface,
    /// Point outside the spawn rectangle (energy refunded)
    OutsideSpawnArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    Spawned(SoldierId),
    Rejected(SpawnRejection),
}

impl SpawnOutcome {
    pub fn is_spawned(&self) -> bool {
        matches!(self, SpawnOutcome::Spawned(_))
    }
}

/// Everything a spawn request needs from outside the roster
pub struct SpawnContext<'a> {
    pub paused: bool,
    pub playing: bool,
    pub energy: &'a mut EnergyPool,
    pub spatial: &'a dyn SpatialQuery,
    pub ids: &'a mut IdAllocator,
    pub scheduler: &'a mut Scheduler,
    pub activation_delay: f32,
}

#[derive(Debug, Clone)]
pub struct TeamRoster {
    side: Side,
    role: Role,
    config: RosterConfig,
    soldiers: HashMap<SoldierId, Soldier>,
    /// Balls spawned this match that are still alive
    balls: Vec<BallId>,
    spawned_balls_this_match: bool,
    disabled: bool,
}

impl TeamRoster {
    /// New roster. A missing spawn area disables the roster for the whole session.
    pub fn new(side: Side, role: Role, config: RosterConfig) -> Self {
        let disabled = config.spawn_area.is_none();
        if disabled {
            error!("{}, roster disabled", ConfigError::MissingSpawnArea(side));
        }
        Self {
            side,
            role,
            config,
            soldiers: HashMap::new(),
            balls: Vec::new(),
            spawned_balls_this_match: false,
            disabled,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    pub fn soldiers(&self) -> &HashMap<SoldierId, Soldier> {
        &self.soldiers
    }

    pub fn soldier(&self, id: SoldierId) -> Option<&Soldier> {
        self.soldiers.get(&id)
    }

    pub fn soldier_mut(&mut self, id: SoldierId) -> Option<&mut Soldier> {
        self.soldiers.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.soldiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.soldiers.is_empty()
    }

    pub fn live_ball_count(&self) -> usize {
        self.balls.len()
    }

    pub fn has_spawned_balls(&self) -> bool {
        self.spawned_balls_this_match
    }

    /// Admit a new soldier at `point` if the match, energy and geometry allow it
    pub fn request_spawn(&mut self, point: Vec2, ctx: SpawnContext<'_>) -> SpawnOutcome {
        if ctx.paused {
            return self.reject(SpawnRejection::Paused);
        }
        if !ctx.playing {
            return self.reject(SpawnRejection::NotPlaying);
        }
        let area = match (self.disabled, self.config.spawn_area) {
            (false, Some(area)) => area,
            _ => return self.reject(SpawnRejection::RosterDisabled),
        };

        let cost = self.config.spawn_cost;
        if !ctx.energy.try_consume(cost) {
            return self.reject(SpawnRejection::InsufficientEnergy);
        }

        let height = match ctx.spatial.surface_height(point) {
            Some(height) => height,
            None => {
                ctx.energy.refund(cost);
                return self.reject(SpawnRejection::NoSurface);
            }
        };
        if !area.contains(point) {
            ctx.energy.refund(cost);
            return self.reject(SpawnRejection::OutsideSpawnArea);
        }

        let id = ctx.ids.next_soldier();
        self.soldiers
            .insert(id, Soldier::new(id, self.side, self.role, point, height));
        ctx.scheduler.schedule(
            ctx.activation_delay,
            TaskOwner::Soldier(id),
            Task::ActivateSoldier(id),
        );
        debug!(
            "{} soldier {:?} spawned at ({:.2}, {:.2}) as {}",
            self.side, id, point.x, point.y, self.role
        );
        SpawnOutcome::Spawned(id)
    }

    fn reject(&self, reason: SpawnRejection) -> SpawnOutcome {
        debug!("{} spawn rejected: {:?}", self.side, reason);
        SpawnOutcome::Rejected(reason)
    }

    /// Match-start hook. The attacking roster clears every ball on the field and
    /// schedules this match's staggered ball spawns.
    pub fn on_match_start(&mut self, balls: &mut BallArena, scheduler: &mut Scheduler) -> bool {
        if self.role != Role::Attacker || self.spawned_balls_this_match {
            return false;
        }
        for id in balls.ids() {
            scheduler.cancel_owner(TaskOwner::Ball(id));
        }
        balls.clear();
        self.balls.clear();
        scheduler.cancel_owner(TaskOwner::Roster(self.side));

        if self.disabled {
            warn!("{} roster disabled, no balls spawned", self.side);
            return false;
        }
        for i in 0..self.config.balls_per_match {
            scheduler.schedule(
                i as f32 * self.config.ball_spawn_delay,
                TaskOwner::Roster(self.side),
                Task::SpawnBall(self.side),
            );
        }
        self.spawned_balls_this_match = true;
        true
    }

    /// One scheduled ball spawn at a random point of the spawn area
    pub fn spawn_ball<R: Rng + ?Sized>(
        &mut self,
        balls: &mut BallArena,
        ids: &mut IdAllocator,
        spatial: &dyn SpatialQuery,
        rng: &mut R,
    ) -> Option<BallId> {
        let area = self.config.spawn_area?;
        let point = area.random_point(rng);
        let ground = spatial
            .surface_height(point)
            .unwrap_or(self.config.spawn_height);
        let id = ids.next_ball();
        balls.insert(Ball::new(id, self.side, point, ground + SPAWN_LIFT));
        self.balls.push(id);
        debug!("{} roster spawned ball {:?}", self.side, id);
        Some(id)
    }

    /// Forget a ball that left play
    pub fn forget_ball(&mut self, id: BallId) {
        self.balls.retain(|b| *b != id);
    }

    /// Propagate a role change to every soldier and re-arm ball spawning
    pub fn on_role_changed<R: Rng + ?Sized>(
        &mut self,
        role: Role,
        registry: &StructureRegistry,
        rng: &mut R,
    ) {
        self.role = role;
        self.spawned_balls_this_match = false;
        self.balls.clear();
        for soldier in self.soldiers.values_mut() {
            soldier.set_role(role, registry, rng);
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_soldier(&mut self, soldier: Soldier) {
        self.soldiers.insert(soldier.id, soldier);
    }

    /// Remove one soldier and cancel its pending tasks
    pub fn remove_soldier(&mut self, id: SoldierId, scheduler: &mut Scheduler) -> Option<Soldier> {
        scheduler.cancel_owner(TaskOwner::Soldier(id));
        self.soldiers.remove(&id)
    }

    /// Destroy every soldier. Returns the removed ids in ascending order.
    pub fn clear_all_soldiers(&mut self, scheduler: &mut Scheduler) -> Vec<SoldierId> {
        let mut ids: Vec<SoldierId> = self.soldiers.keys().copied().collect();
        ids.sort();
        for id in &ids {
            scheduler.cancel_owner(TaskOwner::Soldier(*id));
        }
        self.soldiers.clear();
        ids
    }
}
