//! Per-side regenerating energy pool
//!
//! `current` stays inside `[0, max]` and only changes through
//! `regenerate`, `try_consume`, `refund` and the per-match `reset`.

use serde::{Deserialize, Serialize};

use crate::config::EnergyConfig;
use crate::game::state::Side;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyPool {
    side: Side,
    current: f32,
    max: f32,
    regen_rate: f32,
}

impl EnergyPool {
    /// New pool, starts empty
    pub fn new(side: Side, max: f32, regen_rate: f32) -> Self {
        Self {
            side,
            current: 0.0,
            max: max.max(0.0),
            regen_rate: regen_rate.max(0.0),
        }
    }

    pub fn from_config(side: Side, config: &EnergyConfig) -> Self {
        Self::new(side, config.max, config.regen_rate)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Fill fraction in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// Add `regen_rate * dt`, clamped to max
    pub fn regenerate(&mut self, dt: f32) {
        if dt <= 0.0 || self.current >= self.max {
            return;
        }
        self.current = (self.current + self.regen_rate * dt).min(self.max);
    }

    /// Atomic check-then-subtract. No mutation on failure.
    pub fn try_consume(&mut self, amount: f32) -> bool {
        if amount < 0.0 {
            return false;
        }
        if self.current >= amount {
            self.current = (self.current - amount).max(0.0);
            true
        } else {
            false
        }
    }

    /// Return energy after a rejected spawn, clamped to max
    pub fn refund(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        self.current = (self.current + amount).min(self.max);
    }

    /// Start-of-match reset
    pub fn reset(&mut self) {
        self.current = 0.0;
    }
}
