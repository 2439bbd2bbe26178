use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};
use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::tasks::{ComputeTaskPool, TaskPoolBuilder};
use clap::Parser;
use ghost_chase::GhostChasePlugin;
use ghost_chase::resources::SimConfig;
use ghost_chase::tracing_bridge::MicromegasBridgeLayer;
use micromegas_telemetry_sink::TelemetryGuardBuilder;
use micromegas_telemetry_sink::tracing_interop::TracingCaptureLayer;
use micromegas_tracing::dispatch::{flush_thread_buffer, init_thread_stream, unregister_thread_stream};
use micromegas_tracing::levels::LevelFilter;
use micromegas_tracing::prelude::info;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

/// Headless ghost chase simulation.
#[derive(Parser, Debug)]
#[command(name = "ghost_chase", version, about)]
struct Cli {
    /// JSON simulation config. Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// ASCII maze file, overriding the config.
    #[arg(short, long)]
    maze: Option<PathBuf>,

    /// Fixed ticks to run. Zero runs until interrupted.
    #[arg(short, long)]
    ticks: Option<u32>,

    /// Seed for every random source.
    #[arg(short, long)]
    seed: Option<u64>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };
        if let Some(maze) = self.maze {
            config.maze = None;
            config.maze_file = Some(maze.display().to_string());
        }
        if let Some(ticks) = self.ticks {
            config.ticks = ticks;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;
    let plugin = GhostChasePlugin::new(config).context("invalid simulation config")?;
    let config = plugin.config();

    // Spans require MICROMEGAS_ENABLE_CPU_TRACING=true. Logs and metrics
    // are always collected.
    let _telemetry_guard = TelemetryGuardBuilder::default()
        .with_install_tracing_capture(false)
        .build()
        .context("failed to initialize telemetry")?;

    info!(
        "ghost_chase starting: {} ghosts, seed {}, {} ticks at {} Hz",
        config.ghosts.len(),
        config.seed,
        config.ticks,
        config.tick_hz
    );

    // Bevy emits its schedule spans through the global `tracing`
    // subscriber, so it has to be in place before the app is built.
    let log_layer = TracingCaptureLayer {
        max_level: LevelFilter::Info,
    };
    let subscriber = Registry::default()
        .with(MicromegasBridgeLayer)
        .with(log_layer);
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    // Must exist before App::new() so TaskPoolPlugin keeps these callbacks.
    ComputeTaskPool::get_or_init(|| {
        TaskPoolBuilder::new()
            .on_thread_spawn(|| {
                init_thread_stream();
            })
            .on_thread_destroy(|| {
                flush_thread_buffer();
                unregister_thread_stream();
            })
            .build()
    });
    init_thread_stream();

    let frame = Duration::from_secs_f64(1.0 / plugin.config().tick_hz);
    let exit = App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(frame)))
        .add_plugins(StatesPlugin)
        .add_plugins(plugin)
        .run();

    flush_thread_buffer();
    match exit {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => Err(anyhow!("simulation exited with code {code}")),
    }
}
