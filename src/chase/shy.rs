//! Shy: chase from afar, back off to the scatter target up close.
//!
//! The threshold is hard, with no hysteresis. Two agents moving around
//! exactly `SHY_DISTANCE` apart make the ghost flip every tick.

use micromegas_tracing::prelude::*;

use super::{ChaseView, Locomotion, Steering, chase_toward};

pub const SHY_DISTANCE: f32 = 8.0;

#[span_fn]
pub fn steer(view: &ChaseView, loco: &mut impl Locomotion, speed: f32) -> Steering {
    let target = if loco.position().distance(view.pursued) >= SHY_DISTANCE {
        view.pursued
    } else {
        view.scatter
    };
    chase_toward(loco, target, speed)
}
