use bevy::prelude::*;

// ---------------------------------------------------------------------------
// Grid and spatial
// ---------------------------------------------------------------------------

/// Tile coordinates. Tile (x, y) has its center at world (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    /// Center of this tile in world units.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    /// Tile containing a world-space point.
    pub fn containing(point: Vec2) -> Self {
        GridPosition {
            x: point.x.round() as i32,
            y: point.y.round() as i32,
        }
    }

    pub fn step(&self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        GridPosition {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Cardinal direction for movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Grid offset for this direction. Rows grow downward.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Unit step in world units.
    pub fn vector(&self) -> Vec2 {
        let (dx, dy) = self.delta();
        Vec2::new(dx as f32, dy as f32)
    }

    /// Closest cardinal direction to a world-space vector, if it is not zero.
    pub fn from_vector(v: Vec2) -> Option<Direction> {
        if v.length_squared() < f32::EPSILON {
            return None;
        }
        Some(if v.x.abs() >= v.y.abs() {
            if v.x > 0.0 { Direction::Right } else { Direction::Left }
        } else if v.y > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        })
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// World-space position, one unit per tile.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec2);

/// Tile the agent is currently heading for.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct NextTileDestination(pub Vec2);

/// Tiles per second.
#[derive(Component, Debug, Clone, Copy)]
pub struct MoveSpeed(pub f32);

/// Movement requested this tick, consumed by the motion integrator.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub enum MoveIntent {
    #[default]
    Hold,
    /// Advance toward `NextTileDestination` at `speed` tiles per second.
    Advance { speed: f32 },
}

/// Last tile-to-tile direction taken. Used to avoid reversing.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Heading(pub Option<Direction>);

/// Direction the agent visually faces.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Facing(pub Direction);

// ---------------------------------------------------------------------------
// Entity markers
// ---------------------------------------------------------------------------

#[derive(Component, Debug)]
pub struct Player;

#[derive(Component, Debug)]
pub struct Ghost;

/// Display name from the roster.
#[derive(Component, Debug, Clone)]
pub struct GhostName(pub String);

/// Position in the configured roster. Release order follows it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RosterIndex(pub usize);

/// Marker: ghost is waiting inside the house for release.
#[derive(Component, Debug)]
pub struct InHouse;

/// Marker: the ghost's chase episode has not been seeded yet.
#[derive(Component, Debug)]
pub struct EpisodePending;

#[derive(Component, Debug)]
pub struct Pickup;

/// Where the shy strategy retreats to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScatterPoint {
    Fixed(Vec2),
    Agent(Entity),
}

/// Non-owning references to the other agents a ghost reacts to.
#[derive(Component, Debug, Clone, Copy)]
pub struct ChaseLinks {
    pub pursued: Entity,
    pub scatter: ScatterPoint,
    pub related: Option<Entity>,
    pub orbit_center: Vec2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_rounds_to_nearest_tile() {
        assert_eq!(GridPosition::containing(Vec2::new(2.4, 3.6)), GridPosition { x: 2, y: 4 });
        assert_eq!(GridPosition { x: 5, y: 1 }.center(), Vec2::new(5.0, 1.0));
    }

    #[test]
    fn from_vector_picks_dominant_axis() {
        assert_eq!(Direction::from_vector(Vec2::new(0.9, 0.2)), Some(Direction::Right));
        assert_eq!(Direction::from_vector(Vec2::new(0.1, -2.0)), Some(Direction::Up));
        assert_eq!(Direction::from_vector(Vec2::ZERO), None);
        for dir in Direction::ALL {
            assert_eq!(Direction::from_vector(dir.vector()), Some(dir));
            assert_eq!(dir.opposite().opposite(), dir);
        }
    }
}
