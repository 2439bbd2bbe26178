//! Follower: shadow the pursued agent by replaying its recorded trail.
//!
//! Until the first trail point is reached the ghost chases its waypoint
//! directly. After that it stops retargeting and feeds each trail point to
//! the tile-centering logic as the next tile destination.

use bevy::math::Vec2;
use micromegas_tracing::prelude::*;

use super::history::PositionHistory;
use super::{FollowState, Locomotion, Steering, WAYPOINT_REACHED, chase_toward};
use crate::error::ChaseError;

#[span_fn]
pub fn steer(
    waypoint: &mut Vec2,
    follow: &mut FollowState,
    history: &mut PositionHistory,
    loco: &mut impl Locomotion,
    speed: f32,
) -> Result<Steering, ChaseError> {
    let position = loco.position();

    if waypoint.distance(position) < WAYPOINT_REACHED {
        *waypoint = history.dequeue_front()?;
        if *follow == FollowState::NotStarted {
            debug!("follower picked up the trail, {} points behind", history.len());
        }
        *follow = FollowState::Following;
    }

    let steering = match follow {
        FollowState::NotStarted => chase_toward(loco, *waypoint, speed),
        FollowState::Following => {
            loco.move_ghost(position, speed);
            loco.set_next_tile_destination(*waypoint);
            Steering::Resume {
                from: position,
                speed,
            }
        }
    };

    loco.update_animation();
    Ok(steering)
}
