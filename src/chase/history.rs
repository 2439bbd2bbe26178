//! Position history of the pursued agent, recorded once per fixed tick.
//!
//! The follower strategy replays this queue as a delayed trail. Every
//! other strategy still pays for the append so that the trail already
//! exists if the ghost is later configured as a follower.

use std::collections::VecDeque;

use bevy::math::Vec2;

use crate::error::ChaseError;

/// Unbounded FIFO of observed positions.
#[derive(Debug, Clone, Default)]
pub struct PositionHistory {
    positions: VecDeque<Vec2>,
}

impl PositionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the position observed this tick.
    pub fn record(&mut self, position: Vec2) {
        self.positions.push_back(position);
    }

    /// Remove and return the oldest recorded position.
    ///
    /// The host records before it steers, so an empty queue here means the
    /// tick ordering is broken.
    pub fn dequeue_front(&mut self) -> Result<Vec2, ChaseError> {
        self.positions.pop_front().ok_or(ChaseError::EmptyHistory)
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn front(&self) -> Option<Vec2> {
        self.positions.front().copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
