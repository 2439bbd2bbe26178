//! Ghost hosting: roster spawning, the chase episode lifecycle, house
//! release, and the per-tick dispatch into each ghost's `ChaseBrain`.

use std::collections::HashMap;

use bevy::ecs::entity::EntityHashMap;
use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_fn, span_scope, warn};

use crate::app_state::{SimState, TickSet};
use crate::chase::{ChaseBrain, ChaseStrategy, ChaseView};
use crate::components::*;
use crate::error::ChaseError;
use crate::events::LeavingHouse;
use crate::plugins::maze::{MazeEntity, MazeMap};
use crate::plugins::movement::GridMotor;
use crate::plugins::pickups::PickupField;
use crate::plugins::player::{spawn_player, wander_player};
use crate::resources::{SimConfig, ghost_seed};

pub struct GhostPlugin;

impl Plugin for GhostPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(SimState::Loading),
            (spawn_ghosts.after(spawn_player), init_house_release_timer),
        );
        app.add_systems(
            FixedUpdate,
            (
                begin_episodes.in_set(TickSet::BeginEpisode),
                record_pursued_positions.in_set(TickSet::Record),
                release_from_house.in_set(TickSet::Release),
                steer_ghosts.in_set(TickSet::Steer).after(wander_player),
            )
                .run_if(in_state(SimState::Running)),
        );
        app.add_observer(on_leaving_house);
        app.add_systems(OnExit(SimState::Running), remove_house_release_timer);
    }
}

/// Timer that controls when ghosts are released from the house.
#[derive(Resource)]
pub struct HouseReleaseTimer {
    pub timer: Timer,
}

/// Where another agent stood at the start of the steering pass.
#[derive(Debug, Clone, Copy)]
struct AgentSnapshot {
    position: Vec2,
    next_tile: Vec2,
}

/// Spawn the configured roster inside the house, then wire up the links
/// between ghosts once every name has an entity.
#[span_fn]
pub fn spawn_ghosts(
    mut commands: Commands,
    maze: Res<MazeMap>,
    config: Res<SimConfig>,
    player: Query<Entity, With<Player>>,
) -> Result {
    if config.ghosts.is_empty() {
        return Ok(());
    }
    if maze.ghost_spawns.is_empty() {
        return Err("maze has no ghost spawn ('G') for the roster".into());
    }
    let pursued = player.single()?;

    let mut by_name = HashMap::new();
    let mut spawned = Vec::with_capacity(config.ghosts.len());
    for (index, spec) in config.ghosts.iter().enumerate() {
        let strategy = spec.strategy()?;
        let start = maze.ghost_spawns[index % maze.ghost_spawns.len()].center();
        let entity = commands
            .spawn((
                Ghost,
                GhostName(spec.name.clone()),
                RosterIndex(index),
                ChaseBrain::new(strategy, spec.run_speed, ghost_seed(config.seed, index)),
                Position(start),
                NextTileDestination(start),
                MoveIntent::default(),
                Heading::default(),
                Facing(Direction::Up),
                InHouse,
                EpisodePending,
                MazeEntity,
            ))
            .id();
        by_name.insert(spec.name.as_str(), entity);
        spawned.push((entity, start));
        info!("spawned {} ({}) at ({}, {})", spec.name, strategy, start.x, start.y);
    }

    for ((entity, start), spec) in spawned.into_iter().zip(&config.ghosts) {
        let related = match &spec.related {
            Some(related) => Some(*by_name.get(related.as_str()).ok_or_else(|| {
                ChaseError::UnknownRelated {
                    ghost: spec.name.clone(),
                    related: related.clone(),
                }
            })?),
            None => None,
        };
        let scatter = match &spec.scatter_agent {
            Some(agent) => ScatterPoint::Agent(*by_name.get(agent.as_str()).ok_or_else(|| {
                ChaseError::UnknownScatterAgent {
                    ghost: spec.name.clone(),
                    agent: agent.clone(),
                }
            })?),
            None => ScatterPoint::Fixed(spec.scatter.map(Vec2::from_array).unwrap_or(start)),
        };
        commands.entity(entity).insert(ChaseLinks {
            pursued,
            scatter,
            related,
            orbit_center: Vec2::from_array(spec.center),
        });
    }
    Ok(())
}

/// Insert a fresh release timer from the config.
fn init_house_release_timer(mut commands: Commands, config: Res<SimConfig>) {
    commands.insert_resource(HouseReleaseTimer {
        timer: Timer::from_seconds(config.house_release_interval_secs, TimerMode::Repeating),
    });
}

fn remove_house_release_timer(mut commands: Commands) {
    commands.remove_resource::<HouseReleaseTimer>();
}

fn link_position(
    positions: &Query<&Position>,
    entity: Entity,
    ghost: &GhostName,
    link: &'static str,
) -> Result<Vec2, ChaseError> {
    positions
        .get(entity)
        .map(|p| p.0)
        .map_err(|_| ChaseError::MissingLink {
            ghost: ghost.0.clone(),
            link,
        })
}

/// Seed the chase episode of every ghost that has not started one. All of
/// a ghost's links must resolve before it may begin.
fn begin_episodes(
    mut commands: Commands,
    pickups: Res<PickupField>,
    positions: Query<&Position>,
    mut ghosts: Query<(Entity, &GhostName, &ChaseLinks, &mut ChaseBrain), With<EpisodePending>>,
) -> Result {
    for (entity, name, links, mut brain) in &mut ghosts {
        let pursued = link_position(&positions, links.pursued, name, "pursued")?;
        if let ScatterPoint::Agent(agent) = links.scatter {
            link_position(&positions, agent, name, "scatter")?;
        }
        match links.related {
            Some(related) => {
                link_position(&positions, related, name, "related")?;
            }
            None if brain.strategy() == ChaseStrategy::Related => {
                return Err(ChaseError::MissingRelatedAgent.into());
            }
            None => {}
        }
        brain.begin_episode(pursued, &*pickups);
        commands.entity(entity).remove::<EpisodePending>();
    }
    Ok(())
}

/// Every ghost, housed or not, appends its pursued agent's position.
#[allow(clippy::type_complexity)]
fn record_pursued_positions(
    positions: Query<&Position>,
    mut ghosts: Query<
        (&GhostName, &ChaseLinks, &mut ChaseBrain),
        (With<Ghost>, Without<EpisodePending>),
    >,
) -> Result {
    for (name, links, mut brain) in &mut ghosts {
        let pursued = link_position(&positions, links.pursued, name, "pursued")?;
        brain.record(pursued);
    }
    Ok(())
}

/// Release housed ghosts one at a time, in roster order.
fn release_from_house(
    time: Res<Time>,
    mut timer: ResMut<HouseReleaseTimer>,
    mut commands: Commands,
    housed: Query<(Entity, &RosterIndex), (With<Ghost>, With<InHouse>)>,
) {
    timer.timer.tick(time.delta());
    if !timer.timer.just_finished() {
        return;
    }

    if let Some((ghost, _)) = housed.iter().min_by_key(|(_, index)| **index) {
        commands.trigger(LeavingHouse { ghost });
    }
}

/// House exit: restart the chase state and place the ghost outside the gate.
///
/// The restarted trail is seeded with where the pursued agent stands now,
/// since this tick's record already ran and the ghost steers next.
#[allow(clippy::type_complexity)]
fn on_leaving_house(
    trigger: On<LeavingHouse>,
    mut commands: Commands,
    maze: Res<MazeMap>,
    pursued_positions: Query<&Position, Without<Ghost>>,
    mut ghosts: Query<
        (
            &GhostName,
            &ChaseLinks,
            &mut ChaseBrain,
            &mut Position,
            &mut NextTileDestination,
            &mut Heading,
        ),
        With<Ghost>,
    >,
) {
    let ghost = trigger.event().ghost;
    let Ok((name, links, mut brain, mut pos, mut next, mut heading)) = ghosts.get_mut(ghost)
    else {
        warn!("leaving-house event for unknown ghost {ghost:?}");
        return;
    };

    brain.leaving_house();
    match pursued_positions.get(links.pursued) {
        Ok(pursued) => brain.record(pursued.0),
        Err(_) => warn!("{} left the house with no pursued agent", name.0),
    }
    if let Some(exit) = maze.house_exit() {
        pos.0 = exit.center();
        next.0 = exit.center();
        heading.0 = None;
    }
    commands.entity(ghost).remove::<InHouse>();
    info!("{} left the house", name.0);
}

/// Snapshot every agent, then run each free ghost's strategy against it.
#[allow(clippy::type_complexity)]
fn steer_ghosts(
    maze: Res<MazeMap>,
    pickups: Res<PickupField>,
    mut queries: ParamSet<(
        Query<(Entity, &Position, Option<&NextTileDestination>), Or<(With<Player>, With<Ghost>)>>,
        Query<
            (
                &GhostName,
                &Position,
                &ChaseLinks,
                &mut ChaseBrain,
                &mut NextTileDestination,
                &mut MoveIntent,
                &mut Heading,
                &mut Facing,
            ),
            (With<Ghost>, Without<InHouse>, Without<EpisodePending>),
        >,
    )>,
) -> Result {
    span_scope!("steer_ghosts");

    let snapshot: EntityHashMap<AgentSnapshot> = queries
        .p0()
        .iter()
        .map(|(entity, pos, next)| {
            let snapshot = AgentSnapshot {
                position: pos.0,
                next_tile: next.map_or(pos.0, |n| n.0),
            };
            (entity, snapshot)
        })
        .collect();
    let lookup = |ghost: &GhostName, entity: Entity, link: &'static str| {
        snapshot
            .get(&entity)
            .copied()
            .ok_or_else(|| ChaseError::MissingLink {
                ghost: ghost.0.clone(),
                link,
            })
    };

    let mut ghosts = queries.p1();
    for (name, pos, links, mut brain, mut next, mut intent, mut heading, mut facing) in &mut ghosts
    {
        let pursued = lookup(name, links.pursued, "pursued")?;
        let scatter = match links.scatter {
            ScatterPoint::Fixed(point) => point,
            ScatterPoint::Agent(agent) => lookup(name, agent, "scatter")?.position,
        };
        let related = links
            .related
            .map(|related| lookup(name, related, "related"))
            .transpose()?
            .map(|s| s.position);
        let view = ChaseView {
            pursued: pursued.position,
            pursued_next_tile: pursued.next_tile,
            scatter,
            related,
            orbit_center: links.orbit_center,
        };

        let mut motor = GridMotor::new(
            pos.0,
            &mut next,
            &mut intent,
            &mut heading,
            &mut facing,
            &maze,
            true,
        );
        brain.chase(&view, &mut motor, &*pickups)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::configure_tick_sets;
    use crate::chase::PickupRegistry;
    use crate::plugins::maze::MazePlugin;
    use crate::plugins::movement::MovementPlugin;
    use crate::plugins::pickups::PickupPlugin;
    use crate::plugins::player::PlayerPlugin;
    use crate::resources::GhostSpec;
    use bevy::state::app::StatesPlugin;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    const TEST_MAZE: &str = "\
#########
#P......#
#.##-##.#
#.#GGG#.#
#.#####.#
#.......#
#########";

    /// Player spawn sits on the tile a released ghost is placed on.
    const SPAWN_AT_EXIT_MAZE: &str = "\
#########
#...P...#
#.##-##.#
#.#GGG#.#
#.#####.#
#.......#
#########";

    fn setup_app(ghosts: Vec<GhostSpec>, release_secs: f32) -> App {
        setup_app_with_maze(TEST_MAZE, ghosts, release_secs)
    }

    fn setup_app_with_maze(maze: &str, ghosts: Vec<GhostSpec>, release_secs: f32) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.insert_resource(Time::<Fixed>::from_duration(Duration::from_millis(16)));
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(16)));
        app.insert_resource(SimConfig {
            maze: Some(maze.to_string()),
            house_release_interval_secs: release_secs,
            ghosts,
            ..Default::default()
        });
        app.init_state::<SimState>();
        configure_tick_sets(&mut app);
        app.add_plugins((
            MazePlugin,
            MovementPlugin,
            PickupPlugin,
            PlayerPlugin,
            GhostPlugin,
        ));
        app.update();
        app
    }

    fn start_running(app: &mut App) {
        app.world_mut()
            .resource_mut::<NextState<SimState>>()
            .set(SimState::Running);
        app.update();
    }

    fn ghost(app: &mut App, name: &str) -> Entity {
        let mut query = app.world_mut().query::<(Entity, &GhostName)>();
        query
            .iter(app.world())
            .find(|(_, n)| n.0 == name)
            .map(|(e, _)| e)
            .unwrap()
    }

    fn brain(app: &App, entity: Entity) -> &ChaseBrain {
        app.world().get::<ChaseBrain>(entity).unwrap()
    }

    fn pair() -> Vec<GhostSpec> {
        vec![
            GhostSpec::new("blinky", ChaseStrategy::Regular, 4.0),
            GhostSpec::new("inky", ChaseStrategy::Related, 4.0).with_related("blinky"),
        ]
    }

    #[test]
    fn roster_spawns_in_house_with_links() {
        let mut app = setup_app(pair(), 100.0);
        let blinky = ghost(&mut app, "blinky");
        let inky = ghost(&mut app, "inky");
        let player = app
            .world_mut()
            .query_filtered::<Entity, With<Player>>()
            .single(app.world())
            .unwrap();

        for entity in [blinky, inky] {
            assert!(app.world().get::<InHouse>(entity).is_some());
            assert!(app.world().get::<EpisodePending>(entity).is_some());
            assert_eq!(app.world().get::<ChaseLinks>(entity).unwrap().pursued, player);
        }
        let links = app.world().get::<ChaseLinks>(inky).unwrap();
        assert_eq!(links.related, Some(blinky));
        assert_eq!(
            app.world().get::<Position>(blinky).unwrap().0,
            Vec2::new(3.0, 3.0)
        );
    }

    #[test]
    fn scatter_defaults_to_spawn_tile() {
        let ghosts = vec![
            GhostSpec::new("a", ChaseStrategy::Shy, 4.0),
            GhostSpec::new("b", ChaseStrategy::Shy, 4.0).with_scatter(7.0, 5.0),
        ];
        let mut app = setup_app(ghosts, 100.0);
        let a = ghost(&mut app, "a");
        let b = ghost(&mut app, "b");
        assert_eq!(
            app.world().get::<ChaseLinks>(a).unwrap().scatter,
            ScatterPoint::Fixed(Vec2::new(3.0, 3.0))
        );
        assert_eq!(
            app.world().get::<ChaseLinks>(b).unwrap().scatter,
            ScatterPoint::Fixed(Vec2::new(7.0, 5.0))
        );
    }

    #[test]
    fn first_running_tick_begins_episodes() {
        let mut app = setup_app(pair(), 100.0);
        start_running(&mut app);
        for _ in 0..3 {
            app.update();
        }
        let blinky = ghost(&mut app, "blinky");
        assert!(app.world().get::<EpisodePending>(blinky).is_none());
        assert!(!brain(&app, blinky).history().is_empty());
        assert!(app.world().resource::<PickupField>().count() > 0);
    }

    #[test]
    fn history_grows_every_tick_while_housed() {
        let mut app = setup_app(pair(), 100.0);
        start_running(&mut app);
        for _ in 0..5 {
            app.update();
        }
        let blinky = ghost(&mut app, "blinky");
        let before = brain(&app, blinky).history().len();
        for _ in 0..10 {
            app.update();
        }
        assert_eq!(brain(&app, blinky).history().len(), before + 10);
    }

    #[test]
    fn housed_ghosts_hold_still() {
        let mut app = setup_app(pair(), 100.0);
        start_running(&mut app);
        for _ in 0..30 {
            app.update();
        }
        let blinky = ghost(&mut app, "blinky");
        assert_eq!(
            app.world().get::<Position>(blinky).unwrap().0,
            Vec2::new(3.0, 3.0)
        );
    }

    #[test]
    fn release_follows_roster_order_and_resets_history() {
        let mut app = setup_app(pair(), 0.05);
        let blinky = ghost(&mut app, "blinky");
        let inky = ghost(&mut app, "inky");
        start_running(&mut app);

        let mut released = false;
        for _ in 0..50 {
            app.update();
            if app.world().get::<InHouse>(blinky).is_none() {
                released = true;
                break;
            }
        }
        assert!(released, "blinky never left the house");
        assert!(app.world().get::<InHouse>(inky).is_some());
        assert_eq!(brain(&app, blinky).history().len(), 1);
        assert!(brain(&app, inky).history().len() > 1);

        let pos = app.world().get::<Position>(blinky).unwrap().0;
        assert_eq!(GridPosition::containing(pos), GridPosition { x: 4, y: 1 });
    }

    #[test]
    fn released_ghosts_roam_the_maze() {
        let mut app = setup_app(pair(), 0.05);
        let maze = app.world().resource::<MazeMap>().clone();
        start_running(&mut app);
        for _ in 0..400 {
            app.update();
        }
        for name in ["blinky", "inky"] {
            let entity = ghost(&mut app, name);
            assert!(app.world().get::<InHouse>(entity).is_none());
            let tile = GridPosition::containing(app.world().get::<Position>(entity).unwrap().0);
            assert!(maze.is_walkable_for_ghost(tile), "{name} at {tile:?}");
        }
    }

    #[test]
    fn follower_picks_up_the_trail() {
        let ghosts = vec![GhostSpec::new("kinky", ChaseStrategy::Follower, 4.0)];
        let mut app = setup_app(ghosts, 0.05);
        let maze = app.world().resource::<MazeMap>().clone();
        let kinky = ghost(&mut app, "kinky");
        start_running(&mut app);
        for _ in 0..300 {
            app.update();
            let tile = GridPosition::containing(app.world().get::<Position>(kinky).unwrap().0);
            assert!(maze.is_walkable_for_ghost(tile), "kinky cut through a wall at {tile:?}");
        }
        assert!(brain(&app, kinky).has_started_path());
    }

    #[test]
    fn follower_released_onto_its_first_waypoint_keeps_a_trail() {
        let ghosts = vec![GhostSpec::new("kinky", ChaseStrategy::Follower, 4.0)];
        let mut app = setup_app_with_maze(SPAWN_AT_EXIT_MAZE, ghosts, 0.05);
        let kinky = ghost(&mut app, "kinky");
        assert_eq!(
            app.world().resource::<MazeMap>().house_exit(),
            Some(GridPosition { x: 4, y: 1 })
        );
        start_running(&mut app);

        let mut released_at = None;
        for tick in 0..120 {
            app.update();
            if released_at.is_none() && app.world().get::<InHouse>(kinky).is_none() {
                released_at = Some(tick);
            }
        }
        assert!(released_at.is_some(), "kinky never left the house");
        assert!(brain(&app, kinky).has_started_path());
    }

    #[test]
    fn scatter_agent_links_to_named_ghost() {
        let ghosts = vec![
            GhostSpec::new("blinky", ChaseStrategy::Regular, 4.0),
            GhostSpec::new("clyde", ChaseStrategy::Shy, 4.0).with_scatter_agent("blinky"),
        ];
        let mut app = setup_app(ghosts, 0.05);
        let blinky = ghost(&mut app, "blinky");
        let clyde = ghost(&mut app, "clyde");
        assert_eq!(
            app.world().get::<ChaseLinks>(clyde).unwrap().scatter,
            ScatterPoint::Agent(blinky)
        );

        start_running(&mut app);
        for _ in 0..200 {
            app.update();
        }
        assert!(app.world().get::<InHouse>(clyde).is_none());
        assert!(app.world().get::<EpisodePending>(clyde).is_none());
    }

    #[test]
    #[should_panic]
    fn missing_scatter_agent_is_fatal() {
        let ghosts = vec![
            GhostSpec::new("blinky", ChaseStrategy::Regular, 4.0),
            GhostSpec::new("clyde", ChaseStrategy::Shy, 4.0).with_scatter_agent("blinky"),
        ];
        let mut app = setup_app(ghosts, 100.0);
        let blinky = ghost(&mut app, "blinky");
        app.world_mut().despawn(blinky);
        start_running(&mut app);
        for _ in 0..3 {
            app.update();
        }
    }

    #[test]
    #[should_panic]
    fn missing_related_ghost_is_fatal() {
        let mut app = setup_app(pair(), 100.0);
        let blinky = ghost(&mut app, "blinky");
        app.world_mut().despawn(blinky);
        start_running(&mut app);
        for _ in 0..3 {
            app.update();
        }
    }
}
