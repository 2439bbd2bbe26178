//! Random: wander the maze, picking a fresh open direction at every tile
//! center.

use micromegas_tracing::prelude::*;
use rand::Rng;

use super::{Locomotion, Steering};

#[span_fn]
pub fn steer<R: Rng + ?Sized>(loco: &mut impl Locomotion, speed: f32, rng: &mut R) -> Steering {
    let destination = loco.next_tile_destination();
    if !loco.try_move_to_tile_center(destination, speed) {
        return Steering::Idle;
    }

    let directions = loco.possible_directions();
    if directions.is_empty() {
        warn!(
            "random ghost boxed in at ({:.1}, {:.1})",
            loco.position().x,
            loco.position().y
        );
        return Steering::Idle;
    }

    let step = directions[rng.gen_range(0..directions.len())];
    let destination = loco.position() + step;
    loco.set_next_tile_destination(destination);
    loco.update_animation();

    Steering::TileStep { destination }
}
