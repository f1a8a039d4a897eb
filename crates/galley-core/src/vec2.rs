//! Minimal 2-D fixed-point vector for floor-plan positions.
//!
//! The core never renders; positions exist so that items track their
//! attachment anchors and NPCs can walk waypoint routes deterministically.

use crate::fixed::{sqrt_fixed, Fixed64};
use serde::{Deserialize, Serialize};

/// A 2-D point/vector on the kitchen floor plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: Fixed64,
    pub y: Fixed64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 {
        x: Fixed64::ZERO,
        y: Fixed64::ZERO,
    };

    pub fn new(x: Fixed64, y: Fixed64) -> Self {
        Self { x, y }
    }

    /// Construct from f64 coordinates. Initialization only.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self {
            x: Fixed64::from_num(x),
            y: Fixed64::from_num(y),
        }
    }

    pub fn distance(self, other: Vec2) -> Fixed64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        sqrt_fixed(dx * dx + dy * dy)
    }

    /// Step from `self` toward `target` by at most `max_delta`.
    ///
    /// Arrives exactly at `target` when the remaining distance is within
    /// `max_delta`, so a mover can never oscillate around its goal.
    pub fn move_towards(self, target: Vec2, max_delta: Fixed64) -> Vec2 {
        let dist = self.distance(target);
        if dist <= max_delta || dist == Fixed64::ZERO {
            return target;
        }
        let t = max_delta / dist;
        Vec2 {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;

    #[test]
    fn distance_along_axis() {
        let a = Vec2::from_f64(0.0, 0.0);
        let b = Vec2::from_f64(3.0, 4.0);
        assert_eq!(a.distance(b), f64_to_fixed64(5.0));
    }

    #[test]
    fn move_towards_snaps_within_range() {
        let a = Vec2::from_f64(0.0, 0.0);
        let b = Vec2::from_f64(0.5, 0.0);
        assert_eq!(a.move_towards(b, f64_to_fixed64(1.0)), b);
    }

    #[test]
    fn move_towards_partial_step() {
        let a = Vec2::from_f64(0.0, 0.0);
        let b = Vec2::from_f64(10.0, 0.0);
        let stepped = a.move_towards(b, f64_to_fixed64(2.0));
        // The fractional ratio rounds in the last fixed-point bit, so compare
        // within a tolerance rather than bit-exactly.
        let err = (stepped.x - f64_to_fixed64(2.0)).abs();
        assert!(err < f64_to_fixed64(1e-6), "stepped.x = {}", stepped.x);
        assert_eq!(stepped.y, Fixed64::ZERO);
    }

    #[test]
    fn move_towards_same_point_is_stable() {
        let a = Vec2::from_f64(1.0, 1.0);
        assert_eq!(a.move_towards(a, f64_to_fixed64(3.0)), a);
    }
}
