//! Tile-to-tile movement.
//!
//! `GridMotor` is the `Locomotion` the chase strategies drive. It only
//! records intent: a next tile destination plus a `MoveIntent`. The
//! `integrate_motion` system then advances each agent toward its next tile
//! once per fixed tick.

use bevy::prelude::*;
use micromegas_tracing::prelude::{span_fn, span_scope};

use crate::app_state::{SimState, TickSet};
use crate::chase::Locomotion;
use crate::components::*;
use crate::plugins::maze::MazeMap;

/// Distance under which an agent counts as sitting on a tile center.
pub const CENTER_EPSILON: f32 = 0.05;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            integrate_motion
                .in_set(TickSet::Motion)
                .run_if(in_state(SimState::Running)),
        );
    }
}

// ---------------------------------------------------------------------------
// Locomotion over ECS components
// ---------------------------------------------------------------------------

/// Borrowed view of one agent's movement components.
pub struct GridMotor<'a> {
    position: Vec2,
    next_tile: &'a mut NextTileDestination,
    intent: &'a mut MoveIntent,
    heading: &'a mut Heading,
    facing: &'a mut Facing,
    maze: &'a MazeMap,
    is_ghost: bool,
}

impl<'a> GridMotor<'a> {
    pub fn new(
        position: Vec2,
        next_tile: &'a mut NextTileDestination,
        intent: &'a mut MoveIntent,
        heading: &'a mut Heading,
        facing: &'a mut Facing,
        maze: &'a MazeMap,
        is_ghost: bool,
    ) -> Self {
        Self {
            position,
            next_tile,
            intent,
            heading,
            facing,
            maze,
            is_ghost,
        }
    }

    fn at_next_tile(&self) -> bool {
        self.position.distance(self.next_tile.0) < CENTER_EPSILON
    }

    fn tile(&self) -> GridPosition {
        GridPosition::containing(self.position)
    }

    /// Open directions, without the reverse of the current heading unless
    /// it is the only way out.
    pub fn forward_directions(&self) -> Vec<Direction> {
        let open = self.maze.open_directions(self.tile(), self.is_ghost);
        let Some(heading) = self.heading.0 else {
            return open;
        };
        let forward: Vec<_> = open
            .iter()
            .copied()
            .filter(|d| *d != heading.opposite())
            .collect();
        if forward.is_empty() { open } else { forward }
    }

    /// `destination` when it lies on this tile or an open neighbor, else
    /// the next open tile toward it. Mid-tile agents finish their current
    /// step first.
    fn one_step_toward(&self, destination: Vec2) -> Vec2 {
        let here = self.tile();
        let open = self.maze.open_directions(here, self.is_ghost);
        let target = GridPosition::containing(destination);
        let adjacent = target == here || open.iter().any(|d| here.step(*d) == target);
        if adjacent && self.position.distance(destination) <= 1.0 + CENTER_EPSILON {
            return destination;
        }
        if !self.at_next_tile() {
            return self.next_tile.0;
        }

        open.into_iter()
            .map(|d| here.step(d).center())
            .min_by(|a, b| {
                a.distance_squared(destination)
                    .total_cmp(&b.distance_squared(destination))
            })
            .unwrap_or(self.position)
    }

    /// Commit to the neighboring tile in `dir`.
    pub fn step_toward(&mut self, dir: Direction, speed: f32) {
        let tile = self.tile().step(dir);
        self.next_tile.0 = tile.center();
        self.heading.0 = Some(dir);
        *self.intent = MoveIntent::Advance { speed };
    }
}

impl Locomotion for GridMotor<'_> {
    fn position(&self) -> Vec2 {
        self.position
    }

    /// Greedy classic-ghost steering: at each tile center take the forward
    /// neighbor closest to `point`.
    fn chase_target(&mut self, point: Vec2, speed: f32) {
        if !self.at_next_tile() {
            *self.intent = MoveIntent::Advance { speed };
            return;
        }

        let here = self.tile();
        let best = self.forward_directions().into_iter().min_by(|a, b| {
            let da = here.step(*a).center().distance_squared(point);
            let db = here.step(*b).center().distance_squared(point);
            da.total_cmp(&db)
        });

        match best {
            Some(dir) => self.step_toward(dir, speed),
            None => *self.intent = MoveIntent::Hold,
        }
    }

    fn move_ghost(&mut self, _point: Vec2, speed: f32) {
        *self.intent = MoveIntent::Advance { speed };
    }

    fn try_move_to_tile_center(&mut self, destination: Vec2, speed: f32) -> bool {
        if self.position.distance(destination) < CENTER_EPSILON {
            return true;
        }
        self.next_tile.0 = destination;
        *self.intent = MoveIntent::Advance { speed };
        false
    }

    fn possible_directions(&self) -> Vec<Vec2> {
        self.maze
            .open_directions(self.tile(), self.is_ghost)
            .into_iter()
            .map(|d| d.vector())
            .collect()
    }

    fn next_tile_destination(&self) -> Vec2 {
        self.next_tile.0
    }

    fn set_next_tile_destination(&mut self, destination: Vec2) {
        let destination = self.one_step_toward(destination);
        if let Some(dir) = Direction::from_vector(destination - self.position) {
            self.heading.0 = Some(dir);
        }
        self.next_tile.0 = destination;
    }

    fn update_animation(&mut self) {
        let toward = Direction::from_vector(self.next_tile.0 - self.position);
        if let Some(dir) = toward.or(self.heading.0) {
            self.facing.0 = dir;
        }
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Position after moving from `from` toward `to` for `dt` seconds. Never
/// overshoots `to`.
pub fn advance(from: Vec2, to: Vec2, speed: f32, dt: f32) -> Vec2 {
    let remaining = to - from;
    let step = speed * dt;
    if remaining.length() <= step {
        to
    } else {
        from + remaining.normalize_or_zero() * step
    }
}

/// Advance every agent with an `Advance` intent toward its next tile, then
/// clear the intent. Strategies must re-issue movement every tick.
#[span_fn]
pub fn integrate_motion(
    time: Res<Time>,
    mut query: Query<(&mut Position, &NextTileDestination, &mut MoveIntent)>,
) {
    let dt = time.delta_secs();
    for (mut pos, next, mut intent) in &mut query {
        if let MoveIntent::Advance { speed } = *intent {
            pos.0 = advance(pos.0, next.0, speed, dt);
        }
        *intent = MoveIntent::Hold;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
