//! Chase strategies. Each ghost runs exactly one of them per fixed tick
//! while it is out of the house.
//!
//! The strategies only compute where the ghost wants to go. Moving along
//! the maze is delegated to a [`Locomotion`] implementation, and the list
//! of pickups comes from a [`PickupRegistry`].

pub mod circling;
pub mod follower;
pub mod history;
pub mod patrol;
pub mod predictive;
pub mod random;
pub mod regular;
pub mod related;
pub mod shy;

use std::fmt;
use std::str::FromStr;

use bevy::prelude::*;
use micromegas_tracing::prelude::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::ChaseError;
use history::PositionHistory;

/// Distance under which a waypoint counts as reached.
pub const WAYPOINT_REACHED: f32 = 0.5;

/// The eight target-selection algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChaseStrategy {
    Regular,
    Random,
    Related,
    Shy,
    Predictive,
    Patrol,
    Circling,
    Follower,
}

impl ChaseStrategy {
    pub const ALL: [ChaseStrategy; 8] = [
        ChaseStrategy::Regular,
        ChaseStrategy::Random,
        ChaseStrategy::Related,
        ChaseStrategy::Shy,
        ChaseStrategy::Predictive,
        ChaseStrategy::Patrol,
        ChaseStrategy::Circling,
        ChaseStrategy::Follower,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChaseStrategy::Regular => "regular",
            ChaseStrategy::Random => "random",
            ChaseStrategy::Related => "related",
            ChaseStrategy::Shy => "shy",
            ChaseStrategy::Predictive => "predictive",
            ChaseStrategy::Patrol => "patrol",
            ChaseStrategy::Circling => "circling",
            ChaseStrategy::Follower => "follower",
        }
    }
}

impl fmt::Display for ChaseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChaseStrategy {
    type Err = ChaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ChaseStrategy::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| ChaseError::UnknownStrategy(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// Movement primitives provided by the host. Strategies never move the
/// ghost themselves.
pub trait Locomotion {
    fn position(&self) -> Vec2;

    /// Head for `point` at `speed`.
    fn chase_target(&mut self, point: Vec2, speed: f32);

    /// Keep moving toward the queued next tile without retargeting.
    fn move_ghost(&mut self, point: Vec2, speed: f32);

    /// Step toward the center of `destination`. Returns true once there.
    fn try_move_to_tile_center(&mut self, destination: Vec2, speed: f32) -> bool;

    /// Unit steps that are open from the current tile.
    fn possible_directions(&self) -> Vec<Vec2>;

    fn next_tile_destination(&self) -> Vec2;

    fn set_next_tile_destination(&mut self, destination: Vec2);

    fn update_animation(&mut self);
}

/// Read access to the remaining pickups.
pub trait PickupRegistry {
    fn count(&self) -> usize;

    fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec2>;
}

/// Snapshot of the other agents, taken once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaseView {
    pub pursued: Vec2,
    /// Tile the pursued agent is currently heading for.
    pub pursued_next_tile: Vec2,
    pub scatter: Vec2,
    pub related: Option<Vec2>,
    pub orbit_center: Vec2,
}

/// What a strategy asked the locomotion layer for this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Steering {
    Chase { target: Vec2, speed: f32 },
    Resume { from: Vec2, speed: f32 },
    TileStep { destination: Vec2 },
    Idle,
}

/// Issue a direct chase and describe it.
pub(crate) fn chase_toward(loco: &mut impl Locomotion, target: Vec2, speed: f32) -> Steering {
    loco.chase_target(target, speed);
    Steering::Chase { target, speed }
}

// ---------------------------------------------------------------------------
// Per-ghost state
// ---------------------------------------------------------------------------

/// Whether the follower has started replaying the recorded trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowState {
    #[default]
    NotStarted,
    Following,
}

/// Everything a ghost carries across ticks while chasing.
#[derive(Component, Debug)]
pub struct ChaseBrain {
    strategy: ChaseStrategy,
    run_speed: f32,
    history: PositionHistory,
    waypoint: Vec2,
    follow: FollowState,
    rng: ChaCha8Rng,
}

impl ChaseBrain {
    pub fn new(strategy: ChaseStrategy, run_speed: f32, seed: u64) -> Self {
        Self {
            strategy,
            run_speed,
            history: PositionHistory::new(),
            waypoint: Vec2::ZERO,
            follow: FollowState::NotStarted,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn strategy(&self) -> ChaseStrategy {
        self.strategy
    }

    pub fn run_speed(&self) -> f32 {
        self.run_speed
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    pub fn waypoint(&self) -> Vec2 {
        self.waypoint
    }

    pub fn follow_state(&self) -> FollowState {
        self.follow
    }

    pub fn has_started_path(&self) -> bool {
        self.follow == FollowState::Following
    }

    /// Seed the episode: record the pursued position once and pick the
    /// initial waypoint for the strategies that keep one.
    pub fn begin_episode(&mut self, pursued: Vec2, pickups: &impl PickupRegistry) {
        self.history.record(pursued);
        self.follow = FollowState::NotStarted;
        match self.strategy {
            ChaseStrategy::Patrol => {
                self.waypoint = patrol::next_waypoint(pursued, pickups, &mut self.rng);
            }
            ChaseStrategy::Follower => {
                // The seed was just recorded, so the queue cannot be empty.
                self.waypoint = self.history.dequeue_front().unwrap_or(pursued);
            }
            _ => self.waypoint = pursued,
        }
        debug!(
            "{} episode started, waypoint ({:.2}, {:.2})",
            self.strategy, self.waypoint.x, self.waypoint.y
        );
    }

    /// Record this tick's pursued position, whatever the strategy.
    pub fn record(&mut self, pursued: Vec2) {
        self.history.record(pursued);
    }

    /// House-exit hook: forget the trail and restart the follow state.
    pub fn leaving_house(&mut self) {
        self.history.clear();
        self.follow = FollowState::NotStarted;
    }

    /// Run the configured strategy for this tick.
    pub fn chase<L, P>(
        &mut self,
        view: &ChaseView,
        loco: &mut L,
        pickups: &P,
    ) -> Result<Steering, ChaseError>
    where
        L: Locomotion,
        P: PickupRegistry,
    {
        let speed = self.run_speed;
        let steering = match self.strategy {
            ChaseStrategy::Regular => regular::steer(view, loco, speed),
            ChaseStrategy::Random => random::steer(loco, speed, &mut self.rng),
            ChaseStrategy::Related => {
                let related = view.related.ok_or(ChaseError::MissingRelatedAgent)?;
                related::steer(view.pursued, related, loco, speed)
            }
            ChaseStrategy::Shy => shy::steer(view, loco, speed),
            ChaseStrategy::Predictive => predictive::steer(view, loco, speed),
            ChaseStrategy::Patrol => patrol::steer(
                &mut self.waypoint,
                view.pursued,
                pickups,
                &mut self.rng,
                loco,
                speed,
            ),
            ChaseStrategy::Circling => {
                circling::steer(view.pursued, view.orbit_center, loco, speed)
            }
            ChaseStrategy::Follower => follower::steer(
                &mut self.waypoint,
                &mut self.follow,
                &mut self.history,
                loco,
                speed,
            )?,
        };
        Ok(steering)
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------
