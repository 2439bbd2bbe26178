//! Circling: orbit the pursued agent around a fixed center by summing two
//! unit vectors, one toward the pursued/center midpoint and one toward the
//! pursued agent.
//!
//! The sum is deliberately left unnormalized, so the step length varies
//! between 0 and 2 with the angle between the two components.

use bevy::math::Vec2;
use micromegas_tracing::prelude::*;

use super::{Locomotion, Steering, chase_toward};

/// Target for a ghost at `position`. Opposing components cancel out and
/// leave the ghost where it is.
pub fn target(position: Vec2, pursued: Vec2, center: Vec2) -> Vec2 {
    let midpoint = (pursued + center) / 2.0;
    let toward_midpoint = (midpoint - position).normalize_or_zero();
    let toward_pursued = (pursued - position).normalize_or_zero();
    position + toward_midpoint + toward_pursued
}

#[span_fn]
pub fn steer(pursued: Vec2, center: Vec2, loco: &mut impl Locomotion, speed: f32) -> Steering {
    let target = target(loco.position(), pursued, center);
    let steering = chase_toward(loco, target, speed);
    loco.update_animation();
    steering
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chase::testing::FakeMotor;

    #[test]
    fn sum_of_unit_vectors_is_not_renormalized() {
        let s = Vec2::new(1.0, 1.0);
        let p = Vec2::new(5.0, 4.0);
        let c = Vec2::new(-3.0, 8.0);
        let expected = s + ((p + c) / 2.0 - s).normalize() + (p - s).normalize();

        let t = target(s, p, c);

        assert!((t - expected).length() < 1e-5);
    }

    #[test]
    fn aligned_components_step_two_units() {
        // Midpoint and pursued both lie along +x
        let t = target(Vec2::ZERO, Vec2::new(4.0, 0.0), Vec2::new(2.0, 0.0));
        assert!((t - Vec2::new(2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn opposing_components_hold_position() {
        // Midpoint at (-1, 0) is behind the ghost, pursued at (1, 0) ahead
        let s = Vec2::ZERO;
        let t = target(s, Vec2::new(1.0, 0.0), Vec2::new(-3.0, 0.0));
        assert!(t.is_finite());
        assert!((t - s).length() < 1e-5);
    }

    #[test]
    fn ghost_on_pursued_and_center_does_not_produce_nan() {
        let p = Vec2::new(2.0, 2.0);
        assert_eq!(target(p, p, p), p);
    }

    #[test]
    fn steer_chases_orbit_point_and_animates() {
        let mut motor = FakeMotor::at(Vec2::ZERO);
        steer(Vec2::new(4.0, 0.0), Vec2::new(2.0, 0.0), &mut motor, 5.0);
        let (target, speed) = motor.last_chase.unwrap();
        assert!((target - Vec2::new(2.0, 0.0)).length() < 1e-5);
        assert_eq!(speed, 5.0);
        assert_eq!(motor.animation_updates, 1);
    }
}
