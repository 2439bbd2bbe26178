//! Maze loading and the walkability grid.
//!
//! Parses an ASCII map into a `MazeMap` resource and spawns one entity per
//! pickup. Tile (x, y) is centered on world point (x, y), so distances in
//! the chase strategies are measured in tiles.

use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_scope};

use crate::app_state::SimState;
use crate::components::{Direction, GridPosition, Pickup, Position};
use crate::resources::SimConfig;

pub struct MazePlugin;

impl Plugin for MazePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(SimState::Loading), load_maze);
        app.add_systems(OnExit(SimState::Running), despawn_maze_entities);
    }
}

// ---------------------------------------------------------------------------
// Tile types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileType {
    Wall,
    Floor,
    Pickup,
    HouseGate,
    PlayerSpawn,
    GhostSpawn,
}

impl TileType {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(TileType::Wall),
            '.' => Some(TileType::Pickup),
            ' ' => Some(TileType::Floor),
            'P' => Some(TileType::PlayerSpawn),
            'G' => Some(TileType::GhostSpawn),
            '-' => Some(TileType::HouseGate),
            _ => None,
        }
    }

    /// Whether agents can walk on this tile (floor-like).
    pub fn is_walkable_floor(&self) -> bool {
        matches!(
            self,
            TileType::Floor | TileType::Pickup | TileType::PlayerSpawn | TileType::GhostSpawn
        )
    }
}

// ---------------------------------------------------------------------------
// Maze map resource
// ---------------------------------------------------------------------------

/// Stores the parsed maze grid and spawn positions.
#[derive(Resource, Debug, Clone)]
pub struct MazeMap {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<Vec<TileType>>,
    pub player_spawn: GridPosition,
    pub ghost_spawns: Vec<GridPosition>,
    pub pickups: Vec<GridPosition>,
}

impl MazeMap {
    /// Parse an ASCII maze string into a MazeMap.
    pub fn parse(text: &str) -> Result<Self, String> {
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        if lines.is_empty() {
            return Err("Empty maze".to_string());
        }

        let height = lines.len();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        let mut tiles = Vec::with_capacity(height);
        let mut player_spawn = None;
        let mut ghost_spawns = Vec::new();
        let mut pickups = Vec::new();

        for (y, line) in lines.iter().enumerate() {
            let mut row = Vec::with_capacity(width);
            for (x, ch) in line.chars().enumerate() {
                let tile = TileType::from_char(ch).ok_or_else(|| {
                    format!("Unknown tile character '{}' at ({}, {})", ch, x, y)
                })?;

                let pos = GridPosition {
                    x: x as i32,
                    y: y as i32,
                };

                match tile {
                    TileType::PlayerSpawn => {
                        if player_spawn.is_some() {
                            return Err(format!("Multiple player spawns at ({}, {})", x, y));
                        }
                        player_spawn = Some(pos);
                    }
                    TileType::GhostSpawn => ghost_spawns.push(pos),
                    TileType::Pickup => pickups.push(pos),
                    _ => {}
                }

                row.push(tile);
            }
            // Pad short rows with Wall
            while row.len() < width {
                row.push(TileType::Wall);
            }
            tiles.push(row);
        }

        let player_spawn = player_spawn.ok_or("No player spawn ('P') found in maze")?;

        Ok(MazeMap {
            width,
            height,
            tiles,
            player_spawn,
            ghost_spawns,
            pickups,
        })
    }

    /// Get tile type at a position, or None if out of bounds.
    pub fn tile_at(&self, pos: GridPosition) -> Option<TileType> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        self.tiles.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Player cannot pass the house gate.
    pub fn is_walkable_for_player(&self, pos: GridPosition) -> bool {
        self.tile_at(pos).is_some_and(|t| t.is_walkable_floor())
    }

    /// Ghosts walk through the house gate.
    pub fn is_walkable_for_ghost(&self, pos: GridPosition) -> bool {
        self.tile_at(pos)
            .is_some_and(|t| t.is_walkable_floor() || t == TileType::HouseGate)
    }

    /// Tile just outside the house gate, where released ghosts appear.
    pub fn house_exit(&self) -> Option<GridPosition> {
        self.tiles.iter().enumerate().find_map(|(y, row)| {
            let x = row.iter().position(|t| *t == TileType::HouseGate)?;
            let gate = GridPosition {
                x: x as i32,
                y: y as i32,
            };
            Direction::ALL.into_iter().map(|d| gate.step(d)).find(|p| {
                self.tile_at(*p)
                    .is_some_and(|t| t.is_walkable_floor() && t != TileType::GhostSpawn)
            })
        })
    }

    /// Directions that lead to a walkable neighbor.
    pub fn open_directions(&self, pos: GridPosition, is_ghost: bool) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| {
                let next = pos.step(*dir);
                if is_ghost {
                    self.is_walkable_for_ghost(next)
                } else {
                    self.is_walkable_for_player(next)
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Marker components
// ---------------------------------------------------------------------------

/// Marker for entities that belong to the current maze.
#[derive(Component, Debug)]
pub struct MazeEntity;

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Parse the configured maze and spawn its pickups.
pub fn load_maze(mut commands: Commands, config: Res<SimConfig>) -> Result {
    span_scope!("maze_load");
    let text = config.maze_text()?;
    let maze = MazeMap::parse(&text)?;

    for pos in &maze.pickups {
        commands.spawn((Pickup, Position(pos.center()), MazeEntity));
    }

    info!(
        "maze loaded: {}x{}, {} pickups, {} ghost spawns",
        maze.width,
        maze.height,
        maze.pickups.len(),
        maze.ghost_spawns.len()
    );
    commands.insert_resource(maze);
    Ok(())
}

/// Despawn everything spawned for this maze.
fn despawn_maze_entities(mut commands: Commands, query: Query<Entity, With<MazeEntity>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
    commands.remove_resource::<MazeMap>();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
