use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::constants::{ball, energy, matches, pass, soldier};
use crate::game::state::Side;
use crate::util::rect::Rect;
use crate::util::vec2::Vec2;

/// Match timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Normal match duration in seconds
    pub duration: f32,
    /// Short duration used when `debug_mode` is on
    pub debug_duration: f32,
    pub debug_mode: bool,
    /// Number of matches in one game
    pub total_matches: u32,
    /// Delay before the next match starts
    pub next_match_delay: f32,
}

impl MatchConfig {
    /// Duration actually applied to a new match
    pub fn effective_duration(&self) -> f32 {
        if self.debug_mode {
            self.debug_duration
        } else {
            self.duration
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            duration: matches::DURATION,
            debug_duration: matches::DEBUG_DURATION,
            debug_mode: false,
            total_matches: matches::TOTAL,
            next_match_delay: matches::NEXT_MATCH_DELAY,
        }
    }
}

/// Energy pool tuning (shared by both sides)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyConfig {
    pub max: f32,
    /// Regeneration per second
    pub regen_rate: f32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max: energy::MAX,
            regen_rate: energy::REGEN_RATE,
        }
    }
}

/// Soldier movement, detection and catch tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoldierConfig {
    pub activation_delay: f32,
    pub auto_move_speed: f32,
    pub carrying_speed: f32,
    pub chase_speed: f32,
    pub return_speed: f32,
    pub return_threshold: f32,
    pub detection_radius: f32,
    pub catch_distance: f32,
    pub defender_inactive_time: f32,
    pub attacker_inactive_time: f32,
    pub pickup_range: f32,
    pub ball_detection_range: f32,
    pub structure_contact_radius: f32,
}

impl Default for SoldierConfig {
    fn default() -> Self {
        Self {
            activation_delay: soldier::ACTIVATION_DELAY,
            auto_move_speed: soldier::AUTO_MOVE_SPEED,
            carrying_speed: soldier::CARRYING_SPEED,
            chase_speed: soldier::CHASE_SPEED,
            return_speed: soldier::RETURN_SPEED,
            return_threshold: soldier::RETURN_THRESHOLD,
            detection_radius: soldier::DETECTION_RADIUS,
            catch_distance: soldier::CATCH_DISTANCE,
            defender_inactive_time: soldier::DEFENDER_INACTIVE_TIME,
            attacker_inactive_time: soldier::ATTACKER_INACTIVE_TIME,
            pickup_range: soldier::PICKUP_RANGE,
            ball_detection_range: soldier::BALL_DETECTION_RANGE,
            structure_contact_radius: soldier::STRUCTURE_CONTACT_RADIUS,
        }
    }
}

/// Directed pass tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassConfig {
    pub force: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub catch_radius: f32,
    pub max_time: f32,
    pub check_interval: f32,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            force: pass::FORCE,
            min_distance: pass::MIN_DISTANCE,
            max_distance: pass::MAX_DISTANCE,
            catch_radius: pass::CATCH_RADIUS,
            max_time: pass::MAX_TIME,
            check_interval: pass::CHECK_INTERVAL,
        }
    }
}

/// Loose-ball kinematics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallConfig {
    pub throw_force: f32,
    pub max_speed: f32,
    pub ground_drag: f32,
    pub rest_speed: f32,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            throw_force: ball::THROW_FORCE,
            max_speed: ball::MAX_SPEED,
            ground_drag: ball::GROUND_DRAG,
            rest_speed: ball::REST_SPEED,
        }
    }
}

/// Per-side roster settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    pub spawn_cost: f32,
    /// Spawn-area bounds; None disables the roster
    pub spawn_area: Option<Rect>,
    /// Fallback ground height for ball spawns when the spatial query misses
    pub spawn_height: f32,
    pub balls_per_match: u32,
    pub ball_spawn_delay: f32,
}

impl RosterConfig {
    /// Default roster for `side` on the standard field
    pub fn standard(side: Side) -> Self {
        let center = match side {
            Side::Player => Vec2::new(0.0, -8.0),
            Side::Enemy => Vec2::new(0.0, 8.0),
        };
        Self {
            spawn_cost: energy::SPAWN_COST,
            spawn_area: Some(Rect::centered(center, 12.0, 4.0)),
            spawn_height: 0.0,
            balls_per_match: ball::PER_MATCH,
            ball_spawn_delay: ball::SPAWN_DELAY,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub matches: MatchConfig,
    pub energy: EnergyConfig,
    pub soldier: SoldierConfig,
    pub pass: PassConfig,
    pub ball: BallConfig,
    /// Indexed by `Side::index()`
    pub rosters: [RosterConfig; 2],
    /// RNG seed for reproducible runs (None = entropy)
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            matches: MatchConfig::default(),
            energy: EnergyConfig::default(),
            soldier: SoldierConfig::default(),
            pass: PassConfig::default(),
            ball: BallConfig::default(),
            rosters: [
                RosterConfig::standard(Side::Player),
                RosterConfig::standard(Side::Enemy),
            ],
            seed: None,
        }
    }
}

fn env_value<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

impl SimConfig {
    pub fn roster(&self, side: Side) -> &RosterConfig {
        &self.rosters[side.index()]
    }

    pub fn roster_mut(&mut self, side: Side) -> &mut RosterConfig {
        &mut self.rosters[side.index()]
    }

    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(duration) = env_value::<f32>("GATERUSH_MATCH_DURATION") {
            if duration > 0.0 {
                config.matches.duration = duration;
            } else {
                tracing::warn!("GATERUSH_MATCH_DURATION must be > 0, using default");
            }
        }

        if let Some(total) = env_value::<u32>("GATERUSH_TOTAL_MATCHES") {
            if (1..=99).contains(&total) {
                config.matches.total_matches = total;
            } else {
                tracing::warn!("GATERUSH_TOTAL_MATCHES must be 1-99, using default");
            }
        }

        if let Some(debug) = env_value::<bool>("GATERUSH_DEBUG_MODE") {
            config.matches.debug_mode = debug;
        }

        if let Some(max) = env_value::<f32>("GATERUSH_MAX_ENERGY") {
            if max > 0.0 {
                config.energy.max = max;
            } else {
                tracing::warn!("GATERUSH_MAX_ENERGY must be > 0, using default");
            }
        }

        if let Some(rate) = env_value::<f32>("GATERUSH_REGEN_RATE") {
            if rate >= 0.0 {
                config.energy.regen_rate = rate;
            } else {
                tracing::warn!("GATERUSH_REGEN_RATE must be >= 0, using default");
            }
        }

        if let Some(cost) = env_value::<f32>("GATERUSH_SPAWN_COST") {
            if cost >= 0.0 {
                for roster in config.rosters.iter_mut() {
                    roster.spawn_cost = cost;
                }
            } else {
                tracing::warn!("GATERUSH_SPAWN_COST must be >= 0, using default");
            }
        }

        if let Some(balls) = env_value::<u32>("GATERUSH_BALLS_PER_MATCH") {
            for roster in config.rosters.iter_mut() {
                roster.balls_per_match = balls;
            }
        }

        if let Some(seed) = env_value::<u64>("GATERUSH_SEED") {
            config.seed = Some(seed);
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.matches.total_matches == 0 {
            return Err(ConfigError::NoMatches);
        }
        if self.matches.effective_duration() <= 0.0 {
            return Err(ConfigError::NonPositive("match duration"));
        }
        if self.matches.next_match_delay < 0.0 {
            return Err(ConfigError::Negative("next match delay"));
        }
        if self.energy.max <= 0.0 {
            return Err(ConfigError::NonPositive("max energy"));
        }
        if self.energy.regen_rate < 0.0 {
            return Err(ConfigError::Negative("energy regeneration rate"));
        }
        if self.pass.min_distance > self.pass.max_distance {
            return Err(ConfigError::PassBandInverted {
                min: self.pass.min_distance,
                max: self.pass.max_distance,
            });
        }
        if self.pass.check_interval <= 0.0 {
            return Err(ConfigError::NonPositive("catch check interval"));
        }
        if self.pass.catch_radius >= self.soldier.pickup_range {
            return Err(ConfigError::CatchRadiusNotTighter {
                catch_radius: self.pass.catch_radius,
                pickup_range: self.soldier.pickup_range,
            });
        }
        for side in Side::ALL {
            let roster = self.roster(side);
            if roster.spawn_cost < 0.0 {
                return Err(ConfigError::Negative("spawn cost"));
            }
            if let Some(area) = roster.spawn_area {
                if !area.is_valid() {
                    return Err(ConfigError::InvertedSpawnArea(side));
                }
            }
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("total_matches must be at least 1")]
    NoMatches,
    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    #[error("min pass distance {min} exceeds max pass distance {max}")]
    PassBandInverted { min: f32, max: f32 },
    #[error("catch radius {catch_radius} must be tighter than pickup range {pickup_range}")]
    CatchRadiusNotTighter { catch_radius: f32, pickup_range: f32 },
    #[error("spawn area for {0} side has min > max")]
    InvertedSpawnArea(Side),
    #[error("no spawn area configured for {0} side")]
    MissingSpawnArea(Side),
}
