pub mod ghosts;
pub mod maze;
pub mod movement;
pub mod pickups;
pub mod player;
pub mod telemetry;
