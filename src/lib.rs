pub mod app_state;
pub mod chase;
pub mod components;
pub mod error;
pub mod events;
pub mod plugins;
pub mod resources;
pub mod tracing_bridge;

use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_fn, span_scope};

use app_state::{SimState, TickSet, configure_tick_sets};
use chase::ChaseBrain;
use components::{Ghost, GhostName, InHouse, Position};
use error::ChaseError;
use plugins::ghosts::{GhostPlugin, spawn_ghosts};
use plugins::maze::MazePlugin;
use plugins::movement::MovementPlugin;
use plugins::pickups::PickupPlugin;
use plugins::player::PlayerPlugin;
use plugins::telemetry::TelemetryPlugin;
use resources::{SimConfig, TickCount};

/// The whole headless simulation. Expects `MinimalPlugins` (or an
/// equivalent time and schedule runner setup) plus `StatesPlugin`.
pub struct GhostChasePlugin {
    config: SimConfig,
}

impl GhostChasePlugin {
    /// Fails on any config `SimConfig::validate` rejects.
    pub fn new(config: SimConfig) -> Result<Self, ChaseError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

impl Plugin for GhostChasePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone());
        app.insert_resource(Time::<Fixed>::from_hz(self.config.tick_hz));
        app.init_resource::<TickCount>();

        app.init_state::<SimState>();
        configure_tick_sets(app);

        app.add_plugins(MazePlugin);
        app.add_plugins(MovementPlugin);
        app.add_plugins(PickupPlugin);
        app.add_plugins(PlayerPlugin);
        app.add_plugins(GhostPlugin);
        app.add_plugins(TelemetryPlugin);

        app.add_systems(OnEnter(SimState::Loading), finish_loading.after(spawn_ghosts));
        app.add_systems(
            FixedUpdate,
            count_ticks
                .in_set(TickSet::Collect)
                .run_if(in_state(SimState::Running)),
        );
        app.add_systems(OnExit(SimState::Running), report_run);
        app.add_systems(OnEnter(SimState::Finished), exit_app);
    }
}

#[span_fn]
fn finish_loading(mut next: ResMut<NextState<SimState>>) {
    next.set(SimState::Running);
}

/// Advance the tick counter and stop once the configured run length is
/// reached. A zero run length never stops.
fn count_ticks(
    mut ticks: ResMut<TickCount>,
    config: Res<SimConfig>,
    mut next: ResMut<NextState<SimState>>,
) {
    ticks.0 += 1;
    if config.ticks > 0 && ticks.0 >= config.ticks {
        info!("run complete after {} ticks", ticks.0);
        next.set(SimState::Finished);
    }
}

/// Log where every ghost ended up. Runs before the maze is torn down.
#[span_fn]
fn report_run(ghosts: Query<(&GhostName, &ChaseBrain, &Position, Has<InHouse>), With<Ghost>>) {
    for (name, brain, pos, in_house) in &ghosts {
        info!(
            "{}: {} at ({:.2}, {:.2}), history {}, {}{}",
            name.0,
            brain.strategy(),
            pos.0.x,
            pos.0.y,
            brain.history().len(),
            if brain.has_started_path() { "following" } else { "chasing" },
            if in_house { ", in house" } else { "" },
        );
    }
}

fn exit_app(mut exit: MessageWriter<AppExit>) {
    exit.write(AppExit::Success);
}
