//! Tick-level telemetry: wraps the simulation loop with Micromegas
//! instrumentation.

use bevy::prelude::*;
use micromegas_tracing::prelude::{fmetric, imetric, span_scope};

use crate::app_state::{SimState, TickSet};
use crate::chase::ChaseBrain;
use crate::components::{Ghost, InHouse};

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Last, frame_telemetry);
        app.add_systems(
            FixedUpdate,
            tick_telemetry
                .in_set(TickSet::Collect)
                .run_if(in_state(SimState::Running)),
        );
    }
}

fn frame_telemetry(time: Res<Time>) {
    span_scope!("frame");
    let dt_ms = time.delta_secs_f64() * 1000.0;
    fmetric!("frame_time_ms", "ms", dt_ms);
}

/// Per-tick gauges of the ghost population.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GhostGauges {
    pub housed: u64,
    pub following: u64,
    pub longest_history: u64,
}

impl GhostGauges {
    pub fn measure<'a>(ghosts: impl IntoIterator<Item = (&'a ChaseBrain, bool)>) -> Self {
        let mut gauges = GhostGauges::default();
        for (brain, in_house) in ghosts {
            if in_house {
                gauges.housed += 1;
            }
            if brain.has_started_path() {
                gauges.following += 1;
            }
            gauges.longest_history = gauges.longest_history.max(brain.history().len() as u64);
        }
        gauges
    }
}

fn tick_telemetry(ghosts: Query<(&ChaseBrain, Has<InHouse>), With<Ghost>>) {
    span_scope!("tick_telemetry");
    let gauges = GhostGauges::measure(&ghosts);
    imetric!("ghosts_in_house", "count", gauges.housed);
    imetric!("ghosts_following", "count", gauges.following);
    imetric!("longest_history", "count", gauges.longest_history);
}
