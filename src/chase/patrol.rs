//! Patrol: forage between random pickups, falling back to a direct chase
//! once the maze is nearly cleared.

use bevy::math::Vec2;
use micromegas_tracing::prelude::*;
use rand::Rng;

use super::{Locomotion, PickupRegistry, Steering, WAYPOINT_REACHED, chase_toward};

/// Below this many remaining pickups the patrol degrades to a chase.
pub const PATROL_MIN_PICKUPS: usize = 20;

/// Pick the next patrol waypoint.
pub fn next_waypoint<P, R>(pursued: Vec2, pickups: &P, rng: &mut R) -> Vec2
where
    P: PickupRegistry,
    R: Rng + ?Sized,
{
    if pickups.count() < PATROL_MIN_PICKUPS {
        return pursued;
    }
    pickups.random_position(rng).unwrap_or(pursued)
}

#[span_fn]
pub fn steer<P, R>(
    waypoint: &mut Vec2,
    pursued: Vec2,
    pickups: &P,
    rng: &mut R,
    loco: &mut impl Locomotion,
    speed: f32,
) -> Steering
where
    P: PickupRegistry,
    R: Rng + ?Sized,
{
    if waypoint.distance(loco.position()) < WAYPOINT_REACHED {
        *waypoint = next_waypoint(pursued, pickups, rng);
        debug!("patrol waypoint -> ({:.1}, {:.1})", waypoint.x, waypoint.y);
    }

    let steering = chase_toward(loco, *waypoint, speed);
    loco.update_animation();
    steering
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chase::testing::{FakeMotor, ListedPickups};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn nineteen_pickups_falls_back_to_pursued() {
        let pickups = ListedPickups::row(19);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut motor = FakeMotor::at(Vec2::new(1.0, 1.0));
        let mut waypoint = Vec2::new(1.2, 1.0);
        let pursued = Vec2::new(9.0, 4.0);

        steer(&mut waypoint, pursued, &pickups, &mut rng, &mut motor, 4.0);

        assert_eq!(waypoint, pursued);
        assert_eq!(motor.last_chase, Some((pursued, 4.0)));
    }

    #[test]
    fn twenty_pickups_selects_a_pickup() {
        let pickups = ListedPickups::row(20);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let pursued = Vec2::new(9.0, 4.0);
        for _ in 0..10 {
            let mut motor = FakeMotor::at(Vec2::new(1.0, 1.0));
            let mut waypoint = Vec2::new(1.0, 1.0);

            steer(&mut waypoint, pursued, &pickups, &mut rng, &mut motor, 4.0);

            assert!(pickups.0.contains(&waypoint), "{waypoint:?} is not a pickup");
            assert_eq!(motor.last_chase.map(|(t, _)| t), Some(waypoint));
        }
    }

    #[test]
    fn keeps_waypoint_until_reached() {
        let pickups = ListedPickups::row(30);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut motor = FakeMotor::at(Vec2::ZERO);
        let mut waypoint = Vec2::new(0.5, 0.0);

        steer(&mut waypoint, Vec2::ONE, &pickups, &mut rng, &mut motor, 4.0);

        assert_eq!(waypoint, Vec2::new(0.5, 0.0));
        assert_eq!(motor.animation_updates, 1);
    }
}
