//! Predictive: aim a few tiles ahead of where the pursued agent is going.

use bevy::math::Vec2;
use micromegas_tracing::prelude::*;

use super::{ChaseView, Locomotion, Steering, chase_toward};

/// How far ahead of the pursued agent to aim, in tiles.
pub const LEAD_TILES: f32 = 3.0;

/// Interception point. A pursued agent with no heading (next tile equal to
/// its position) yields its own position.
pub fn target(pursued: Vec2, pursued_next_tile: Vec2) -> Vec2 {
    let heading = (pursued_next_tile - pursued).normalize_or_zero();
    pursued + heading * LEAD_TILES
}

#[span_fn]
pub fn steer(view: &ChaseView, loco: &mut impl Locomotion, speed: f32) -> Steering {
    let steering = chase_toward(loco, target(view.pursued, view.pursued_next_tile), speed);
    loco.update_animation();
    steering
}
