//! The pursued agent: a scripted wanderer that eats its way around the
//! maze, so the ghosts have something to chase in a headless run.

use bevy::prelude::*;
use micromegas_tracing::prelude::{span_fn, span_scope};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::app_state::{SimState, TickSet};
use crate::chase::Locomotion;
use crate::components::*;
use crate::plugins::maze::{MazeEntity, MazeMap, load_maze};
use crate::plugins::movement::GridMotor;
use crate::resources::SimConfig;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(SimState::Loading), spawn_player.after(load_maze));
        app.add_systems(
            FixedUpdate,
            wander_player
                .in_set(TickSet::Steer)
                .run_if(in_state(SimState::Running)),
        );
    }
}

/// The player's own random source.
#[derive(Component, Debug)]
pub struct PlayerRng(pub ChaCha8Rng);

/// Spawn the player entity at the maze's player spawn position.
#[span_fn]
pub fn spawn_player(mut commands: Commands, maze: Res<MazeMap>, config: Res<SimConfig>) {
    let start = maze.player_spawn.center();
    commands.spawn((
        Player,
        Position(start),
        NextTileDestination(start),
        MoveIntent::default(),
        Heading::default(),
        Facing(Direction::Left),
        MoveSpeed(config.player_speed),
        PlayerRng(ChaCha8Rng::seed_from_u64(config.seed)),
        MazeEntity,
    ));
}

/// At every tile center pick a random forward direction; otherwise keep
/// walking toward the current next tile.
#[allow(clippy::type_complexity)]
#[span_fn]
pub fn wander_player(
    maze: Res<MazeMap>,
    mut query: Query<
        (
            &Position,
            &MoveSpeed,
            &mut NextTileDestination,
            &mut MoveIntent,
            &mut Heading,
            &mut Facing,
            &mut PlayerRng,
        ),
        With<Player>,
    >,
) {
    for (pos, speed, mut next, mut intent, mut heading, mut facing, mut rng) in &mut query {
        let mut motor = GridMotor::new(
            pos.0,
            &mut next,
            &mut intent,
            &mut heading,
            &mut facing,
            &maze,
            false,
        );
        let destination = motor.next_tile_destination();
        if motor.try_move_to_tile_center(destination, speed.0) {
            let choices = motor.forward_directions();
            if choices.is_empty() {
                continue;
            }
            let dir = choices[rng.0.gen_range(0..choices.len())];
            motor.step_toward(dir, speed.0);
        }
        motor.update_animation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn setup_app(maze: &str) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.insert_resource(Time::<Fixed>::from_duration(Duration::from_millis(16)));
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(16)));
        app.insert_resource(SimConfig {
            maze: Some(maze.to_string()),
            ..Default::default()
        });
        app.init_state::<SimState>();
        app.add_systems(OnEnter(SimState::Loading), load_maze);
        app.add_plugins(PlayerPlugin);
        app.add_plugins(crate::plugins::movement::MovementPlugin);
        app.update();
        app
    }

    fn start_running(app: &mut App) {
        app.world_mut()
            .resource_mut::<NextState<SimState>>()
            .set(SimState::Running);
        app.update();
    }

    fn player_position(app: &mut App) -> Vec2 {
        let mut query = app.world_mut().query_filtered::<&Position, With<Player>>();
        query.single(app.world()).unwrap().0
    }

    #[test]
    fn player_spawns_on_spawn_tile() {
        let mut app = setup_app("#####\n#P..#\n#####");
        assert_eq!(player_position(&mut app), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn player_walks_down_the_only_corridor() {
        let mut app = setup_app("#######\n#P....#\n#######");
        start_running(&mut app);
        for _ in 0..60 {
            app.update();
        }
        let pos = player_position(&mut app);
        assert!(pos.x > 1.0, "player never left spawn: {pos:?}");
        assert_eq!(pos.y, 1.0);
    }

    #[test]
    fn player_never_enters_walls_or_gate() {
        let mut app = setup_app("#####\n#P-.#\n#.#.#\n#...#\n#####");
        let maze = app.world().resource::<MazeMap>().clone();
        start_running(&mut app);
        for _ in 0..300 {
            app.update();
            let tile = GridPosition::containing(player_position(&mut app));
            assert!(maze.is_walkable_for_player(tile), "player at {tile:?}");
        }
    }
}
