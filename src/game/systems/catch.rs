//! Catch resolution helpers
//!
//! After a catch the ball either goes to the caught soldier's nearest eligible
//! teammate, ends the match as a defender win, or is thrown forward.

use crate::config::PassConfig;
use crate::game::roster::TeamRoster;
use crate::game::soldier::Soldier;
use crate::game::state::{Role, SoldierId};
use crate::util::vec2::Vec2;

/// What happens to the caught soldier's ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BallDisposition {
    /// Directed pass to a teammate
    PassTo { ally: SoldierId, direction: Vec2 },
    /// Nobody to pass to and the caught soldier was attacking
    DefenderWins,
    /// Nobody to pass to, throw along the facing
    ThrowForward { direction: Vec2 },
}

/// Nearest teammate of `caught` inside the pass band. Inert teammates and
/// teammates already carrying a ball are skipped.
pub fn find_pass_target<'a>(
    caught: &Soldier,
    roster: &'a TeamRoster,
    pass: &PassConfig,
) -> Option<&'a Soldier> {
    let min_sq = pass.min_distance * pass.min_distance;
    let max_sq = pass.max_distance * pass.max_distance;
    roster
        .soldiers()
        .values()
        .filter(|s| s.id != caught.id && !s.is_inert() && s.held_ball.is_none())
        .map(|s| (s, caught.position.distance_sq_to(s.position)))
        .filter(|(_, d)| *d >= min_sq && *d <= max_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(s, _)| s)
}

pub fn dispose_ball(caught: &Soldier, roster: &TeamRoster, pass: &PassConfig) -> BallDisposition {
    match find_pass_target(caught, roster, pass) {
        Some(ally) => BallDisposition::PassTo {
            ally: ally.id,
            direction: caught.position.direction_to(ally.position),
        },
        None if caught.role == Role::Attacker => BallDisposition::DefenderWins,
        None => BallDisposition::ThrowForward {
            direction: caught.facing,
        },
    }
}

/// Directed catch test, strict like the pickup rule it mirrors
#[inline]
pub fn within_catch_radius(receiver: Vec2, ball: Vec2, pass: &PassConfig) -> bool {
    receiver.distance_to(ball) < pass.catch_radius
}
