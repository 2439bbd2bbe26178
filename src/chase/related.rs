//! Related: ambush ahead of the pursued agent, along the line from a
//! partner ghost through the pursued agent.

use bevy::math::Vec2;
use micromegas_tracing::prelude::*;

use super::{Locomotion, Steering, chase_toward};

/// Fraction of the partner offset added beyond the pursued agent.
pub const RELATED_OFFSET_DIVISOR: f32 = 4.0;

pub fn target(pursued: Vec2, related: Vec2) -> Vec2 {
    pursued + (pursued - related) / RELATED_OFFSET_DIVISOR
}

#[span_fn]
pub fn steer(pursued: Vec2, related: Vec2, loco: &mut impl Locomotion, speed: f32) -> Steering {
    chase_toward(loco, target(pursued, related), speed)
}
