use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Ground-plane vector. `x` is world X, `y` is world Z; height never enters the rules.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    /// Facing of a soldier that has never moved (world +Z)
    pub const FORWARD: Vec2 = Vec2 { x: 0.0, y: 1.0 };

    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn length_sq(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn normalize(&self) -> Self {
        match self.length() {
            len if len > 0.0 => Vec2::new(self.x / len, self.y / len),
            _ => Self::ZERO,
        }
    }

    #[inline]
    pub fn distance_to(&self, other: Vec2) -> f32 {
        (*self - other).length()
    }

    #[inline]
    pub fn distance_sq_to(&self, other: Vec2) -> f32 {
        (*self - other).length_sq()
    }

    /// Unit vector pointing from `self` toward `target` (zero when coincident)
    #[inline]
    pub fn direction_to(&self, target: Vec2) -> Self {
        (target - *self).normalize()
    }

    /// Step toward `target` by at most `max_step`, never overshooting.
    pub fn move_toward(&self, target: Vec2, max_step: f32) -> Self {
        let delta = target - *self;
        let dist = delta.length();
        if dist <= max_step || dist <= f32::EPSILON {
            target
        } else {
            *self + delta * (max_step / dist)
        }
    }

    pub fn clamp_length(&self, max: f32) -> Self {
        let len = self.length();
        if len > max && len > 0.0 {
            *self * (max / len)
        } else {
            *self
        }
    }

    pub fn lerp(&self, other: Vec2, t: f32) -> Self {
        *self + (other - *self) * t
    }

    /// Both components within `epsilon` of zero
    pub fn is_zero(&self, epsilon: f32) -> bool {
        self.x.abs() < epsilon && self.y.abs() < epsilon
    }

    /// Component-wise comparison with tolerance
    pub fn approx_eq(&self, other: Vec2, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

macro_rules! impl_componentwise {
    ($op:ident, $fn:ident, $assign_op:ident, $assign_fn:ident, $sym:tt) => {
        impl $op for Vec2 {
            type Output = Vec2;
            #[inline]
            fn $fn(self, rhs: Vec2) -> Vec2 {
                Vec2::new(self.x $sym rhs.x, self.y $sym rhs.y)
            }
        }

        impl $assign_op for Vec2 {
            #[inline]
            fn $assign_fn(&mut self, rhs: Vec2) {
                *self = *self $sym rhs;
            }
        }
    };
}

impl_componentwise!(Add, add, AddAssign, add_assign, +);
impl_componentwise!(Sub, sub, SubAssign, sub_assign, -);

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, k: f32) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }
}

impl MulAssign<f32> for Vec2 {
    #[inline]
    fn mul_assign(&mut self, k: f32) {
        *self = *self * k;
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}
