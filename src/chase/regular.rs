//! Regular: head straight for the pursued agent.

use micromegas_tracing::prelude::*;

use super::{ChaseView, Locomotion, Steering, chase_toward};

#[span_fn]
pub fn steer(view: &ChaseView, loco: &mut impl Locomotion, speed: f32) -> Steering {
    chase_toward(loco, view.pursued, speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chase::testing::{FakeMotor, view};
    use bevy::math::Vec2;

    #[test]
    fn regular_targets_pursued_position() {
        let mut motor = FakeMotor::at(Vec2::new(5.0, 5.0));
        let steering = steer(&view(Vec2::new(1.0, 2.0)), &mut motor, 4.0);
        assert_eq!(motor.last_chase, Some((Vec2::new(1.0, 2.0), 4.0)));
        assert!(matches!(steering, Steering::Chase { .. }));
        // Animation is left to the locomotion layer
        assert_eq!(motor.animation_updates, 0);
    }
}
