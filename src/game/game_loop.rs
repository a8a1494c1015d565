//! Simulation root
//!
//! `GameLoop` owns every piece of mutable state and runs one fixed-order step
//! per `tick`: drain input, (stop here when paused), advance the scheduler,
//! match clock and economy, agent decide/apply, ball kinematics, event flush.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SimConfig;
use crate::game::ball::{BallArena, Possession};
use crate::game::events::{DestroyReason, EventBus, GameEvent, PresentationSink};
use crate::game::input_buffer::{InputBuffer, InputCommand, InputSender};
use crate::game::match_controller::{MatchController, MatchTransition};
use crate::game::roster::{SpawnContext, SpawnOutcome, TeamRoster};
use crate::game::scheduler::{Scheduler, Task, TaskOwner};
use crate::game::spatial::{FlatGround, SpatialQuery};
use crate::game::state::{BallId, IdAllocator, MatchPhase, Role, Side, SoldierId};
use crate::game::structures::StructureRegistry;
use crate::game::systems::catch::{self, BallDisposition};
use crate::game::systems::{self, ball_physics, defender, Action, Intent, WorldView};
use crate::util::vec2::Vec2;

/// Slack when counting down the pass window in fixed poll steps
const PASS_WINDOW_EPSILON: f32 = 1e-4;

pub struct GameLoop {
    session_id: Uuid,
    config: SimConfig,
    tick: u64,
    paused: bool,
    started: bool,
    /// Side that cursor spawns apply to
    spawn_side: Side,
    rng: StdRng,
    ids: IdAllocator,
    registry: StructureRegistry,
    spatial: Box<dyn SpatialQuery>,
    controller: MatchController,
    rosters: [TeamRoster; 2],
    balls: BallArena,
    scheduler: Scheduler,
    events: EventBus,
    input: InputBuffer,
}

impl GameLoop {
    /// Standard field on flat ground
    pub fn new(config: SimConfig) -> Self {
        Self::with_world(
            config,
            StructureRegistry::standard_field(),
            Box::new(FlatGround::default()),
        )
    }

    pub fn with_world(
        config: SimConfig,
        registry: StructureRegistry,
        spatial: Box<dyn SpatialQuery>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let rosters = [
            TeamRoster::new(
                Side::Player,
                Role::for_match(1, Side::Player),
                config.roster(Side::Player).clone(),
            ),
            TeamRoster::new(
                Side::Enemy,
                Role::for_match(1, Side::Enemy),
                config.roster(Side::Enemy).clone(),
            ),
        ];
        let controller = MatchController::new(config.matches.clone(), &config.energy);
        Self {
            session_id: Uuid::new_v4(),
            config,
            tick: 0,
            paused: false,
            started: false,
            spawn_side: Side::Player,
            rng,
            ids: IdAllocator::new(),
            registry,
            spatial,
            controller,
            rosters,
            balls: BallArena::new(),
            scheduler: Scheduler::new(),
            events: EventBus::new(),
            input: InputBuffer::default(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn spawn_side(&self) -> Side {
        self.spawn_side
    }

    pub fn controller(&self) -> &MatchController {
        &self.controller
    }

    pub fn roster(&self, side: Side) -> &TeamRoster {
        &self.rosters[side.index()]
    }

    pub fn balls(&self) -> &BallArena {
        &self.balls
    }

    pub fn registry(&self) -> &StructureRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn is_finished(&self) -> bool {
        self.controller.is_finished()
    }

    pub fn soldier_count(&self) -> usize {
        self.rosters.iter().map(|r| r.len()).sum()
    }

    /// Register a presentation sink. Sinks receive events in registration order.
    pub fn subscribe(&mut self, sink: Box<dyn PresentationSink>) {
        self.events.subscribe(sink);
    }

    pub fn input_sender(&self) -> InputSender {
        self.input.sender()
    }

    /// Queue a command for the next tick (non-blocking)
    pub fn queue_input(&self, command: InputCommand) -> bool {
        self.input.try_submit(command)
    }

    /// Begin match 1. Later calls are no-ops.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!(
            session = %self.session_id,
            "Game starting: {} matches",
            self.controller.total_matches()
        );
        self.initialize_match(1);
    }

    /// Run one simulation step and return the events it produced
    pub fn tick(&mut self, dt: f32) -> Vec<GameEvent> {
        self.tick += 1;

        self.process_input();

        if !self.paused {
            for task in self.scheduler.advance(dt) {
                self.run_task(task);
            }

            if self.controller.tick(dt).is_some() {
                self.finish_match();
            }

            if self.controller.is_playing() {
                self.update_agents(dt);
            }

            ball_physics::update(&mut self.balls, &self.config.ball, dt);
            self.sync_held_balls();
        }

        self.events.flush()
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        info!(session = %self.session_id, paused = self.paused, "Pause toggled");
        self.events.push(GameEvent::PauseChanged {
            paused: self.paused,
        });
    }

    /// Spawn admission for `side` at a ground point
    pub fn request_spawn(&mut self, side: Side, point: Vec2) -> SpawnOutcome {
        let ctx = SpawnContext {
            paused: self.paused,
            playing: self.controller.is_playing(),
            energy: self.controller.energy_mut(side),
            spatial: self.spatial.as_ref(),
            ids: &mut self.ids,
            scheduler: &mut self.scheduler,
            activation_delay: self.config.soldier.activation_delay,
        };
        let outcome = self.rosters[side.index()].request_spawn(point, ctx);

        match outcome {
            SpawnOutcome::Spawned(id) => {
                if let Some(soldier) = self.rosters[side.index()].soldier(id) {
                    self.events.push(GameEvent::SoldierSpawned {
                        side,
                        soldier: id,
                        role: soldier.role,
                        position: soldier.position,
                        height: soldier.height,
                    });
                }
            }
            SpawnOutcome::Rejected(reason) => {
                self.events.push(GameEvent::SpawnRejected { side, reason });
            }
        }
        outcome
    }

    fn process_input(&mut self) {
        for command in self.input.drain() {
            match command {
                InputCommand::TogglePause => self.toggle_pause(),
                InputCommand::SwitchSpawnSide => {
                    self.spawn_side = self.spawn_side.opponent();
                    debug!("Cursor spawns now for {} side", self.spawn_side);
                }
                InputCommand::Spawn { side, point } => {
                    self.request_spawn(side, point);
                }
                InputCommand::SpawnAtCursor { point } => {
                    let side = self.spawn_side;
                    self.request_spawn(side, point);
                }
            }
        }
    }

    /// Clear the field, assign roles by parity and start match `index`
    fn initialize_match(&mut self, index: u32) {
        for side in Side::ALL {
            let removed = self.rosters[side.index()].clear_all_soldiers(&mut self.scheduler);
            for soldier in removed {
                self.events.push(GameEvent::SoldierDestroyed {
                    side,
                    soldier,
                    reason: DestroyReason::MatchCleared,
                });
            }
        }
        self.scheduler.cancel_owner(TaskOwner::Match);

        self.controller.begin_match(index);

        for side in Side::ALL {
            let role = self.controller.role_of(side);
            let roster = &mut self.rosters[side.index()];
            if roster.role() != role {
                roster.on_role_changed(role, &self.registry, &mut self.rng);
                self.events.push(GameEvent::RoleChanged { side, role });
            }
        }

        let attacker = self.controller.attacking_side();
        self.events.push(GameEvent::MatchStarted {
            match_index: index,
            total_matches: self.controller.total_matches(),
            attacker,
            duration: self.controller.record().duration,
        });

        for roster in self.rosters.iter_mut() {
            roster.on_match_start(&mut self.balls, &mut self.scheduler);
        }

        info!(
            session = %self.session_id,
            "{} initialized, {} attacking",
            self.controller.match_label(),
            attacker
        );
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::ActivateSoldier(id) => {
                let Some(side) = self.side_of(id) else {
                    return;
                };
                let registry = &self.registry;
                let rng = &mut self.rng;
                if let Some(soldier) = self.rosters[side.index()].soldier_mut(id) {
                    soldier.activate(registry, rng);
                    debug!("Soldier {:?} active as {}", id, soldier.role);
                    self.events
                        .push(GameEvent::SoldierActivated { side, soldier: id });
                }
            }
            Task::EndIncapacitation(id) => {
                if let Some(side) = self.side_of(id) {
                    if let Some(soldier) = self.rosters[side.index()].soldier_mut(id) {
                        soldier.recover();
                    }
                }
            }
            Task::SpawnBall(side) => {
                // May be left over in the same batch as a match change
                if !self.controller.is_playing() || self.controller.attacking_side() != side {
                    return;
                }
                let spawned = self.rosters[side.index()].spawn_ball(
                    &mut self.balls,
                    &mut self.ids,
                    self.spatial.as_ref(),
                    &mut self.rng,
                );
                if let Some(ball) = spawned.and_then(|id| self.balls.get(id)) {
                    self.events.push(GameEvent::BallSpawned {
                        ball: ball.id,
                        position: ball.position,
                        height: ball.height,
                    });
                }
            }
            Task::PassCheck {
                ball,
                target,
                remaining,
            } => self.poll_pass(ball, target, remaining),
            Task::StartNextMatch => {
                if self.controller.phase() == MatchPhase::GameOver && !self.controller.is_finished() {
                    let next = self.controller.match_index() + 1;
                    self.initialize_match(next);
                }
            }
        }
    }

    /// Parallel decide from a snapshot, then sequential apply
    fn update_agents(&mut self, dt: f32) {
        let intents = {
            let view = WorldView {
                rosters: &self.rosters,
                balls: &self.balls,
                soldier: &self.config.soldier,
            };
            systems::decide_all(&view, dt)
        };

        for intent in intents {
            if !self.controller.is_playing() {
                break;
            }
            self.apply_intent(intent);
        }
    }

    fn apply_intent(&mut self, intent: Intent) {
        let Intent {
            side,
            soldier: id,
            action,
        } = intent;
        match action {
            Action::Move {
                position,
                facing,
                state,
            } => {
                if let Some(soldier) = self.rosters[side.index()].soldier_mut(id) {
                    if soldier.is_inert() {
                        return;
                    }
                    soldier.position = position;
                    soldier.facing = facing;
                    soldier.state = state;
                }
            }
            Action::PickUp(ball) => self.apply_pickup(side, id, ball),
            Action::TouchFence => {
                debug!("{} attacker {:?} reached the fence without a ball", side, id);
                self.destroy_soldier(side, id, DestroyReason::ReachedFence);
            }
            Action::TouchGate(ball) => self.deliver_ball(side, id, ball),
            Action::Catch(target) => self.apply_catch(side, id, target),
        }
    }

    fn apply_pickup(&mut self, side: Side, id: SoldierId, ball: BallId) {
        let Some(soldier) = self.rosters[side.index()].soldier_mut(id) else {
            return;
        };
        if soldier.is_inert() || soldier.held_ball.is_some() {
            return;
        }
        match self.balls.pickup(ball, id) {
            Ok(()) => {
                soldier.held_ball = Some(ball);
                soldier.state = soldier.idle_state();
                debug!("Soldier {:?} picked up ball {:?}", id, ball);
                self.events
                    .push(GameEvent::BallPickedUp { ball, soldier: id });
            }
            Err(e) => {
                // Someone earlier in the apply order got it first
                debug!("Pickup by {:?} failed: {}", id, e);
                soldier.state = soldier.idle_state();
            }
        }
    }

    fn deliver_ball(&mut self, side: Side, id: SoldierId, ball: BallId) {
        let carrying = self.rosters[side.index()]
            .soldier(id)
            .map_or(false, |s| s.held_ball == Some(ball));
        if !carrying {
            return;
        }
        self.remove_ball(ball);
        self.destroy_soldier(side, id, DestroyReason::DeliveredBall);
        info!(session = %self.session_id, "{} delivered ball {:?} to the gate", side, ball);
        if self.controller.report_gate_reached(side).is_some() {
            self.finish_match();
        }
    }

    fn apply_catch(&mut self, defending_side: Side, defender_id: SoldierId, target: SoldierId) {
        let caught_side = defending_side.opponent();
        let defender_ready = self.rosters[defending_side.index()]
            .soldier(defender_id)
            .map_or(false, |d| !d.is_inert());
        let target_valid = self.rosters[caught_side.index()]
            .soldier(target)
            .map_or(false, defender::is_valid_target);
        if !defender_ready || !target_valid {
            return;
        }

        let now = self.scheduler.now();
        let soldier_config = &self.config.soldier;
        if let Some(defender) = self.rosters[defending_side.index()].soldier_mut(defender_id) {
            defender.incapacitate(now, soldier_config.defender_inactive_time);
        }
        self.scheduler.schedule(
            soldier_config.defender_inactive_time,
            TaskOwner::Soldier(defender_id),
            Task::EndIncapacitation(defender_id),
        );
        if let Some(caught) = self.rosters[caught_side.index()].soldier_mut(target) {
            caught.incapacitate(now, soldier_config.attacker_inactive_time);
        }
        self.scheduler.schedule(
            soldier_config.attacker_inactive_time,
            TaskOwner::Soldier(target),
            Task::EndIncapacitation(target),
        );
        debug!("Defender {:?} caught {:?}", defender_id, target);
        self.events.push(GameEvent::CatchOccurred {
            defender: defender_id,
            attacker: target,
        });

        let disposition = {
            let roster = &self.rosters[caught_side.index()];
            match roster.soldier(target) {
                Some(caught) => catch::dispose_ball(caught, roster, &self.config.pass),
                None => return,
            }
        };

        match disposition {
            BallDisposition::PassTo { ally, direction } => {
                let force = self.config.pass.force;
                if let Some(ball) = self.throw_ball(caught_side, target, direction, force, Some(ally)) {
                    self.scheduler.schedule(
                        0.0,
                        TaskOwner::Ball(ball),
                        Task::PassCheck {
                            ball,
                            target: ally,
                            remaining: self.config.pass.max_time,
                        },
                    );
                }
            }
            BallDisposition::DefenderWins => {
                info!(
                    session = %self.session_id,
                    "{} defender caught the carrier with no pass available",
                    defending_side
                );
                if self.controller.report_defender_catch(defending_side).is_some() {
                    self.finish_match();
                }
            }
            BallDisposition::ThrowForward { direction } => {
                let force = self.config.ball.throw_force;
                self.throw_ball(caught_side, target, direction, force, None);
            }
        }
    }

    /// Throw the ball `id` holds. Returns the thrown ball.
    fn throw_ball(
        &mut self,
        side: Side,
        id: SoldierId,
        direction: Vec2,
        force: f32,
        target: Option<SoldierId>,
    ) -> Option<BallId> {
        let soldier = self.rosters[side.index()].soldier_mut(id)?;
        let ball = soldier.held_ball.take()?;
        let origin = soldier.position;
        if let Some(b) = self.balls.get_mut(ball) {
            b.position = origin;
        }
        if let Err(e) = self.balls.throw(
            ball,
            id,
            direction,
            force,
            self.config.ball.max_speed,
            target,
        ) {
            warn!("Throw by {:?} rejected: {}", id, e);
            return None;
        }
        self.events.push(GameEvent::BallThrown {
            ball,
            soldier: id,
            directed: target.is_some(),
            target,
        });
        Some(ball)
    }

    /// One poll of a directed-pass window
    fn poll_pass(&mut self, ball: BallId, target: SoldierId, remaining: f32) {
        let ball_position = match self.balls.get(ball) {
            Some(b) if b.possession == Possession::InFlight { target } => b.position,
            _ => return,
        };
        let receiver_side = self.side_of(target);
        let in_reach = receiver_side
            .and_then(|side| self.rosters[side.index()].soldier(target))
            .map_or(false, |s| {
                !s.is_inert()
                    && s.held_ball.is_none()
                    && catch::within_catch_radius(s.position, ball_position, &self.config.pass)
            });

        if let Some(side) = receiver_side.filter(|_| in_reach) {
            if self.balls.pickup(ball, target).is_ok() {
                if let Some(soldier) = self.rosters[side.index()].soldier_mut(target) {
                    soldier.held_ball = Some(ball);
                    soldier.state = soldier.idle_state();
                }
                debug!("Pass completed to {:?}", target);
                self.events.push(GameEvent::PassCompleted {
                    ball,
                    receiver: target,
                });
            }
            return;
        }

        let remaining = remaining - self.config.pass.check_interval;
        if receiver_side.is_some() && remaining > PASS_WINDOW_EPSILON {
            self.scheduler.schedule(
                self.config.pass.check_interval,
                TaskOwner::Ball(ball),
                Task::PassCheck {
                    ball,
                    target,
                    remaining,
                },
            );
        } else if self.balls.expire_pass(ball).is_ok() {
            debug!("Pass window for ball {:?} expired", ball);
            self.events.push(GameEvent::PassExpired { ball });
        }
    }

    fn destroy_soldier(&mut self, side: Side, id: SoldierId, reason: DestroyReason) {
        let Some(soldier) = self.rosters[side.index()].remove_soldier(id, &mut self.scheduler) else {
            return;
        };
        if let Some(ball) = soldier.held_ball {
            // Delivered balls are already gone
            let _ = self.balls.release(ball, id);
        }
        self.events.push(GameEvent::SoldierDestroyed {
            side,
            soldier: id,
            reason,
        });
    }

    fn remove_ball(&mut self, id: BallId) {
        self.scheduler.cancel_owner(TaskOwner::Ball(id));
        self.balls.remove(id);
        for roster in self.rosters.iter_mut() {
            roster.forget_ball(id);
        }
    }

    /// Close the decided match and schedule what follows
    fn finish_match(&mut self) {
        let transition = match self.controller.end_match() {
            Some(transition) => transition,
            None => return,
        };
        let record = self.controller.record();
        let score = self.controller.score();
        self.events.push(GameEvent::ScoreChanged { score });
        if let (Some(result), Some(reason)) = (record.result, self.controller.end_reason()) {
            self.events.push(GameEvent::MatchEnded {
                match_index: record.match_index,
                result,
                reason,
            });
        }

        match transition {
            MatchTransition::NextMatch(next) => {
                debug!("Match {} starts in {:.1}s", next, self.config.matches.next_match_delay);
                self.scheduler.schedule(
                    self.config.matches.next_match_delay,
                    TaskOwner::Match,
                    Task::StartNextMatch,
                );
            }
            MatchTransition::GameFinished(outcome) => {
                info!(
                    session = %self.session_id,
                    "Game over: {:?}, final score {}-{}",
                    outcome,
                    score.player,
                    score.enemy
                );
                self.events.push(GameEvent::GameFinished { outcome, score });
            }
        }
    }

    /// Carried balls ride with their holder
    fn sync_held_balls(&mut self) {
        let rosters = &self.rosters;
        for ball in self.balls.values_mut() {
            if let Possession::Held(holder) = ball.possession {
                if let Some(soldier) = rosters.iter().find_map(|r| r.soldier(holder)) {
                    ball.position = soldier.position;
                }
            }
        }
    }

    fn side_of(&self, id: SoldierId) -> Option<Side> {
        Side::ALL
            .into_iter()
            .find(|side| self.rosters[side.index()].soldier(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::ChannelSink;
    use crate::game::match_result::MatchEndReason;
    use crate::game::roster::SpawnRejection;
    use crate::game::soldier::{Soldier, SoldierState};
    use crate::game::state::{MatchResult, Scoreboard};

    const DT: f32 = 1.0 / 30.0;

    fn test_config() -> SimConfig {
        SimConfig {
            seed: Some(42),
            ..SimConfig::default()
        }
    }

    fn started(config: SimConfig) -> GameLoop {
        let mut game = GameLoop::new(config);
        game.start();
        game
    }

    /// Tick until an event matches or `max_ticks` pass; returns everything seen
    fn run_until(
        game: &mut GameLoop,
        max_ticks: usize,
        pred: impl Fn(&GameEvent) -> bool,
    ) -> Vec<GameEvent> {
        let mut seen = Vec::new();
        for _ in 0..max_ticks {
            let events = game.tick(DT);
            let hit = events.iter().any(&pred);
            seen.extend(events);
            if hit {
                break;
            }
        }
        seen
    }

    /// Active soldier placed directly on the field
    fn place(game: &mut GameLoop, side: Side, position: Vec2) -> SoldierId {
        let id = game.ids.next_soldier();
        let role = game.rosters[side.index()].role();
        let mut soldier = Soldier::new(id, side, role, position, 0.0);
        soldier.activate(&game.registry, &mut game.rng);
        game.rosters[side.index()].insert_soldier(soldier);
        id
    }

    fn soldier_mut(game: &mut GameLoop, side: Side, id: SoldierId) -> &mut Soldier {
        game.rosters[side.index()].soldier_mut(id).unwrap()
    }

    /// New ball already held by `id`
    fn hand_ball(game: &mut GameLoop, side: Side, id: SoldierId) -> BallId {
        let position = game.rosters[side.index()].soldier(id).unwrap().position;
        let ball = game.ids.next_ball();
        game.balls
            .insert(crate::game::ball::Ball::new(ball, side, position, 0.0));
        game.balls.pickup(ball, id).unwrap();
        let soldier = soldier_mut(game, side, id);
        soldier.held_ball = Some(ball);
        soldier.state = SoldierState::CarryingToGate;
        ball
    }

    fn attackers_in_play(game: &GameLoop) -> usize {
        Side::ALL
            .iter()
            .filter(|s| game.roster(**s).role() == Role::Attacker)
            .count()
    }

    #[test]
    fn test_draws_advance_with_roles_swapped() {
        let mut config = test_config();
        config.matches.duration = 1.0;
        let mut game = started(config);
        assert_eq!(game.roster(Side::Player).role(), Role::Attacker);

        let events = run_until(&mut game, 100, |e| matches!(e, GameEvent::MatchEnded { .. }));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::MatchEnded {
                match_index: 1,
                result: MatchResult::Draw,
                reason: MatchEndReason::TimeExpired
            }
        )));
        assert_eq!(game.controller().score(), Scoreboard { player: 1, enemy: 1 });
        assert_eq!(game.controller().phase(), MatchPhase::GameOver);

        let events = run_until(&mut game, 100, |e| matches!(e, GameEvent::MatchStarted { .. }));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::MatchStarted {
                match_index: 2,
                attacker: Side::Enemy,
                ..
            }
        )));
        assert_eq!(game.roster(Side::Enemy).role(), Role::Attacker);
        assert_eq!(game.roster(Side::Player).role(), Role::Defender);
        assert!(game.controller().is_playing());

        let events = run_until(&mut game, 1000, |e| matches!(e, GameEvent::GameFinished { .. }));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::GameFinished {
                outcome: MatchResult::Draw,
                ..
            }
        )));
        assert_eq!(game.controller().score(), Scoreboard { player: 3, enemy: 3 });
        assert!(game.is_finished());
    }

    #[test]
    fn test_exactly_one_attacker_whole_game() {
        let mut config = test_config();
        config.matches.duration = 0.5;
        config.matches.next_match_delay = 0.2;
        let mut game = started(config);
        for _ in 0..500 {
            game.tick(DT);
            if game.controller().is_playing() {
                assert_eq!(attackers_in_play(&game), 1);
                let attacker = game.controller().attacking_side();
                assert_eq!(game.roster(attacker).role(), Role::Attacker);
            }
            if game.is_finished() {
                break;
            }
        }
        assert!(game.is_finished());
    }

    #[test]
    fn test_gate_delivery_scores_immediately() {
        let mut game = started(test_config());
        let carrier = place(&mut game, Side::Player, Vec2::new(0.0, 13.5));
        hand_ball(&mut game, Side::Player, carrier);

        let events = game.tick(DT);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::MatchEnded {
                result: MatchResult::PlayerWin,
                reason: MatchEndReason::GateReached,
                ..
            }
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::SoldierDestroyed {
                reason: DestroyReason::DeliveredBall,
                ..
            }
        )));
        assert_eq!(game.controller().score(), Scoreboard { player: 1, enemy: 0 });
        assert!(game.controller().remaining_time() > 100.0);
        assert!(game.roster(Side::Player).soldier(carrier).is_none());
    }

    #[test]
    fn test_defender_catch_without_ally_wins_match() {
        let mut game = started(test_config());
        let carrier = place(&mut game, Side::Player, Vec2::new(0.0, 8.0));
        hand_ball(&mut game, Side::Player, carrier);
        let defender = place(&mut game, Side::Enemy, Vec2::new(0.5, 8.0));

        let events = game.tick(DT);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::CatchOccurred { defender: d, attacker: a } if *d == defender && *a == carrier
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::MatchEnded {
                result: MatchResult::EnemyWin,
                reason: MatchEndReason::DefenderCatch,
                ..
            }
        )));
        assert_eq!(game.controller().score(), Scoreboard { player: 0, enemy: 1 });
    }

    #[test]
    fn test_catch_incapacitates_both_then_defender_returns() {
        let mut game = started(test_config());
        let carrier = place(&mut game, Side::Player, Vec2::new(0.0, 8.0));
        hand_ball(&mut game, Side::Player, carrier);
        // A teammate in the pass band keeps the match going
        let ally = place(&mut game, Side::Player, Vec2::new(0.0, 18.0));
        soldier_mut(&mut game, Side::Player, ally).target_fence = None;
        let defender = place(&mut game, Side::Enemy, Vec2::new(0.5, 8.0));

        game.tick(DT);
        assert!(game.controller().is_playing());
        let d = game.roster(Side::Enemy).soldier(defender).unwrap();
        let c = game.roster(Side::Player).soldier(carrier).unwrap();
        assert!(d.is_incapacitated());
        assert!(c.is_incapacitated());
        assert!(c.held_ball.is_none());

        // Attacker recovers after 2s, defender after 3s
        for _ in 0..65 {
            game.tick(DT);
        }
        assert!(!game.roster(Side::Player).soldier(carrier).unwrap().is_incapacitated());
        assert!(game.roster(Side::Enemy).soldier(defender).unwrap().is_incapacitated());
        for _ in 0..35 {
            game.tick(DT);
        }
        let d = game.roster(Side::Enemy).soldier(defender).unwrap();
        assert!(matches!(
            d.state,
            SoldierState::Returning | SoldierState::Standby | SoldierState::Chasing(_)
        ));
    }

    #[test]
    fn test_directed_pass_caught_inside_window() {
        let mut config = test_config();
        config.pass.max_time = 1.0;
        let mut game = started(config);
        let carrier = place(&mut game, Side::Player, Vec2::new(0.0, 5.0));
        hand_ball(&mut game, Side::Player, carrier);
        // Carrier steps toward the gate before the catch resolves
        let ally = place(&mut game, Side::Player, Vec2::new(0.0, 8.5));
        // Stand still so only the ball closes the gap
        soldier_mut(&mut game, Side::Player, ally).target_fence = None;
        soldier_mut(&mut game, Side::Player, ally).target_gate = None;
        place(&mut game, Side::Enemy, Vec2::new(0.5, 5.0));

        let events = run_until(&mut game, 45, |e| {
            matches!(e, GameEvent::PassCompleted { .. } | GameEvent::PassExpired { .. })
        });
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::BallThrown { directed: true, target: Some(t), .. } if *t == ally)));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PassCompleted { receiver, .. } if *receiver == ally)));
        let receiver = game.roster(Side::Player).soldier(ally).unwrap();
        let ball = receiver.held_ball.unwrap();
        assert_eq!(game.balls().get(ball).unwrap().holder(), Some(ally));
        assert!(game.controller().is_playing());
    }

    #[test]
    fn test_directed_pass_expires_out_of_reach() {
        let mut game = started(test_config());
        let carrier = place(&mut game, Side::Player, Vec2::new(0.0, 5.0));
        let ball = hand_ball(&mut game, Side::Player, carrier);
        let ally = place(&mut game, Side::Player, Vec2::new(0.0, 15.0));
        soldier_mut(&mut game, Side::Player, ally).target_fence = None;
        place(&mut game, Side::Enemy, Vec2::new(0.5, 5.0));

        let events = run_until(&mut game, 30, |e| {
            matches!(e, GameEvent::PassCompleted { .. } | GameEvent::PassExpired { .. })
        });
        assert!(events.iter().any(|e| *e == GameEvent::PassExpired { ball }));
        assert!(game.balls().get(ball).unwrap().is_free());
        assert!(game.roster(Side::Player).soldier(ally).unwrap().held_ball.is_none());
        // Window lasts no longer than configured
        let polls = game.scheduler().pending_for(TaskOwner::Ball(ball));
        assert_eq!(polls, 0);
    }

    #[test]
    fn test_spawn_outside_bounds_refunds_energy() {
        let mut game = started(test_config());
        game.controller.energy_mut(Side::Player).regenerate(4.0); // exactly one spawn
        let outcome = game.request_spawn(Side::Player, Vec2::new(0.0, 8.0));
        assert_eq!(
            outcome,
            SpawnOutcome::Rejected(SpawnRejection::OutsideSpawnArea)
        );
        assert!((game.controller().energy(Side::Player).current() - 2.0).abs() < 0.0001);
        assert!(game.roster(Side::Player).is_empty());
        let events = game.tick(DT);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::SpawnRejected {
                side: Side::Player,
                reason: SpawnRejection::OutsideSpawnArea
            }
        )));
    }

    #[test]
    fn test_spawn_through_input_and_activation_delay() {
        let mut game = started(test_config());
        game.controller.energy_mut(Side::Enemy).regenerate(4.0);
        assert!(game.queue_input(InputCommand::SwitchSpawnSide));
        assert!(game.queue_input(InputCommand::SpawnAtCursor {
            point: Vec2::new(0.0, 8.0)
        }));
        let events = game.tick(DT);
        let id = events
            .iter()
            .find_map(|e| match e {
                GameEvent::SoldierSpawned {
                    side: Side::Enemy,
                    soldier,
                    role: Role::Defender,
                    ..
                } => Some(*soldier),
                _ => None,
            })
            .unwrap();
        assert_eq!(game.spawn_side(), Side::Enemy);

        for _ in 0..85 {
            game.tick(DT);
        }
        assert_eq!(
            game.roster(Side::Enemy).soldier(id).unwrap().state,
            SoldierState::Activating
        );
        let events = run_until(&mut game, 10, |e| matches!(e, GameEvent::SoldierActivated { .. }));
        assert!(events
            .iter()
            .any(|e| *e == GameEvent::SoldierActivated { side: Side::Enemy, soldier: id }));
        assert_eq!(
            game.roster(Side::Enemy).soldier(id).unwrap().state,
            SoldierState::Standby
        );
    }

    #[test]
    fn test_pause_freezes_clock_energy_and_timers() {
        let mut game = started(test_config());
        game.tick(DT);
        let elapsed = game.controller().record().elapsed;
        let energy = game.controller().energy(Side::Player).current();
        let now = game.scheduler().now();

        game.queue_input(InputCommand::TogglePause);
        let events = game.tick(DT);
        assert!(events.contains(&GameEvent::PauseChanged { paused: true }));
        for _ in 0..30 {
            game.tick(DT);
        }
        assert!(game.is_paused());
        assert_eq!(game.controller().record().elapsed, elapsed);
        assert_eq!(game.controller().energy(Side::Player).current(), energy);
        assert_eq!(game.scheduler().now(), now);
        assert_eq!(
            game.request_spawn(Side::Player, Vec2::new(0.0, -8.0)),
            SpawnOutcome::Rejected(SpawnRejection::Paused)
        );

        game.queue_input(InputCommand::TogglePause);
        game.tick(DT);
        assert!(!game.is_paused());
        assert!(game.controller().record().elapsed > elapsed);
    }

    #[test]
    fn test_balls_spawn_staggered_in_attacker_area() {
        let mut game = started(test_config());
        game.tick(DT);
        assert_eq!(game.balls().len(), 1);
        for _ in 0..15 {
            game.tick(DT);
        }
        assert_eq!(game.balls().len(), 2);
        for _ in 0..15 {
            game.tick(DT);
        }
        assert_eq!(game.balls().len(), 3);
        assert_eq!(game.roster(Side::Player).live_ball_count(), 3);
        let area = game.roster(Side::Player).config().spawn_area.unwrap();
        assert!(game.balls().values().all(|b| area.contains(b.position)));
    }

    #[test]
    fn test_fence_contact_destroys_attacker() {
        let mut game = started(test_config());
        let id = place(&mut game, Side::Player, Vec2::ZERO);
        let fence = game.roster(Side::Player).soldier(id).unwrap().target_fence.unwrap();
        soldier_mut(&mut game, Side::Player, id).position = fence.position;
        let events = game.tick(DT);
        assert!(events.iter().any(|e| *e
            == GameEvent::SoldierDestroyed {
                side: Side::Player,
                soldier: id,
                reason: DestroyReason::ReachedFence
            }));
        assert!(game.roster(Side::Player).soldier(id).is_none());
        assert!(game.controller().is_playing());
    }

    #[test]
    fn test_next_match_clears_soldiers_and_tasks() {
        let mut config = test_config();
        config.matches.duration = 0.5;
        let mut game = started(config);
        game.controller.energy_mut(Side::Player).regenerate(4.0);
        let outcome = game.request_spawn(Side::Player, Vec2::new(0.0, -8.0));
        let SpawnOutcome::Spawned(id) = outcome else {
            panic!("spawn failed: {:?}", outcome);
        };
        let events = run_until(&mut game, 200, |e| {
            matches!(e, GameEvent::MatchStarted { match_index: 2, .. })
        });
        assert_eq!(game.controller().match_index(), 2);
        assert!(events.iter().any(|e| *e
            == GameEvent::SoldierDestroyed {
                side: Side::Player,
                soldier: id,
                reason: DestroyReason::MatchCleared
            }));
        assert_eq!(game.soldier_count(), 0);
        assert_eq!(game.scheduler().pending_for(TaskOwner::Soldier(id)), 0);
        // Pool was reset, only the first tick's regeneration remains
        assert!(game.controller().energy(Side::Player).current() < 0.1);
    }

    #[test]
    fn test_spawn_rejected_between_matches() {
        let mut config = test_config();
        config.matches.duration = 0.1;
        let mut game = started(config);
        run_until(&mut game, 20, |e| matches!(e, GameEvent::MatchEnded { .. }));
        assert_eq!(
            game.request_spawn(Side::Player, Vec2::new(0.0, -8.0)),
            SpawnOutcome::Rejected(SpawnRejection::NotPlaying)
        );
    }

    #[test]
    fn test_events_reach_channel_sink() {
        let mut game = GameLoop::new(test_config());
        let (sink, receiver) = ChannelSink::bounded(64);
        game.subscribe(Box::new(sink));
        game.start();
        let returned = game.tick(DT);
        let received: Vec<GameEvent> = receiver.try_iter().collect();
        assert_eq!(received, returned);
        assert!(matches!(
            received.first(),
            Some(GameEvent::MatchStarted { match_index: 1, .. })
        ));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let mut game = started(test_config());
            game.tick(DT);
            let mut positions: Vec<(u64, Vec2)> =
                game.balls().values().map(|b| (b.id.0, b.position)).collect();
            positions.sort_by_key(|p| p.0);
            positions
        };
        assert_eq!(run(), run());
    }
}
