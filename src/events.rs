//! Lifecycle events raised by the host and observed by the chase layer.

use bevy::prelude::*;

/// A ghost walked out of the house. Its chase history starts over.
#[derive(Event, Debug, Clone, Copy)]
pub struct LeavingHouse {
    pub ghost: Entity,
}

/// The player walked over a pickup.
#[derive(Event, Debug, Clone, Copy)]
pub struct PickupCollected {
    pub remaining: usize,
}
