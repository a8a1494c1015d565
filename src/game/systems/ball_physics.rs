use rayon::prelude::*;

use crate::config::BallConfig;
use crate::game::ball::{BallArena, Possession};

/// Integrate loose balls.
/// Exponential ground drag (velocity *= 1 - drag * dt), speed cap, then rest snap.
/// Held balls are moved with their holder by the game loop, not here.
pub fn update(balls: &mut BallArena, config: &BallConfig, dt: f32) {
    let drag_factor = (1.0 - config.ground_drag * dt).max(0.0);

    balls.inner_mut().par_values_mut().for_each(|ball| {
        if matches!(ball.possession, Possession::Held(_)) {
            return;
        }

        ball.velocity *= drag_factor;
        ball.velocity = ball.velocity.clamp_length(config.max_speed);

        if ball.velocity.length() < config.rest_speed {
            ball.velocity = crate::util::vec2::Vec2::ZERO;
            return;
        }

        ball.position += ball.velocity * dt;
    });
}
