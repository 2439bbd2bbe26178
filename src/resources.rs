use std::path::Path;

use anyhow::Context;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::chase::ChaseStrategy;
use crate::error::ChaseError;

/// Built-in maze used when the config names none.
pub const DEFAULT_MAZE: &str = include_str!("../assets/maps/arena.txt");

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Inline ASCII maze. Takes precedence over `maze_file`.
    pub maze: Option<String>,
    pub maze_file: Option<String>,
    pub seed: u64,
    pub tick_hz: f64,
    /// Fixed ticks to simulate before finishing. Zero runs forever.
    pub ticks: u32,
    pub player_speed: f32,
    pub house_release_interval_secs: f32,
    pub ghosts: Vec<GhostSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostSpec {
    pub name: String,
    pub strategy: String,
    #[serde(default = "default_run_speed")]
    pub run_speed: f32,
    /// Fixed retreat point for the shy strategy. Defaults to the spawn tile.
    #[serde(default)]
    pub scatter: Option<[f32; 2]>,
    #[serde(default)]
    pub center: [f32; 2],
    /// Name of the partner ghost for the related strategy.
    #[serde(default)]
    pub related: Option<String>,
    /// Name of a roster ghost to retreat toward instead of `scatter`.
    #[serde(default)]
    pub scatter_agent: Option<String>,
}

fn default_run_speed() -> f32 {
    4.0
}

impl GhostSpec {
    pub fn new(name: &str, strategy: ChaseStrategy, run_speed: f32) -> Self {
        Self {
            name: name.to_string(),
            strategy: strategy.name().to_string(),
            run_speed,
            scatter: None,
            center: [0.0, 0.0],
            related: None,
            scatter_agent: None,
        }
    }

    pub fn with_related(mut self, related: &str) -> Self {
        self.related = Some(related.to_string());
        self
    }

    pub fn with_center(mut self, x: f32, y: f32) -> Self {
        self.center = [x, y];
        self
    }

    pub fn with_scatter(mut self, x: f32, y: f32) -> Self {
        self.scatter = Some([x, y]);
        self
    }

    pub fn with_scatter_agent(mut self, agent: &str) -> Self {
        self.scatter_agent = Some(agent.to_string());
        self
    }

    pub fn strategy(&self) -> Result<ChaseStrategy, ChaseError> {
        self.strategy.parse()
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            maze: None,
            maze_file: None,
            seed: 0x5eed,
            tick_hz: 60.0,
            ticks: 1800,
            player_speed: 4.0,
            house_release_interval_secs: 1.0,
            ghosts: vec![
                GhostSpec::new("blinky", ChaseStrategy::Regular, 4.2),
                GhostSpec::new("inky", ChaseStrategy::Related, 3.8).with_related("blinky"),
                GhostSpec::new("pinky", ChaseStrategy::Predictive, 4.0),
                GhostSpec::new("clyde", ChaseStrategy::Shy, 3.6).with_scatter(1.0, 19.0),
                GhostSpec::new("sue", ChaseStrategy::Random, 3.5),
                GhostSpec::new("funky", ChaseStrategy::Patrol, 3.6),
                GhostSpec::new("spunky", ChaseStrategy::Circling, 3.8).with_center(9.0, 9.0),
                GhostSpec::new("kinky", ChaseStrategy::Follower, 4.0),
            ],
        }
    }
}

impl SimConfig {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: SimConfig = serde_json::from_str(text).context("invalid config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("failed to load config {}", path.display()))
    }

    /// Reject roster mistakes and unusable timing or speed values before
    /// anything is spawned.
    pub fn validate(&self) -> Result<(), ChaseError> {
        positive("tick_hz", self.tick_hz)?;
        positive(
            "house_release_interval_secs",
            self.house_release_interval_secs.into(),
        )?;
        non_negative("player_speed", self.player_speed.into())?;

        for ghost in &self.ghosts {
            let strategy = ghost.strategy()?;
            non_negative(&format!("{}.run_speed", ghost.name), ghost.run_speed.into())?;
            match &ghost.related {
                Some(related) => {
                    if !self.has_ghost(related) {
                        return Err(ChaseError::UnknownRelated {
                            ghost: ghost.name.clone(),
                            related: related.clone(),
                        });
                    }
                }
                None if strategy == ChaseStrategy::Related => {
                    return Err(ChaseError::MissingRelatedAgent);
                }
                None => {}
            }
            if let Some(agent) = &ghost.scatter_agent
                && !self.has_ghost(agent)
            {
                return Err(ChaseError::UnknownScatterAgent {
                    ghost: ghost.name.clone(),
                    agent: agent.clone(),
                });
            }
        }
        Ok(())
    }

    fn has_ghost(&self, name: &str) -> bool {
        self.ghosts.iter().any(|g| g.name == name)
    }

    /// ASCII maze text: inline, from file, or the built-in arena.
    pub fn maze_text(&self) -> anyhow::Result<String> {
        if let Some(text) = &self.maze {
            return Ok(text.clone());
        }
        match &self.maze_file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read maze file {path}")),
            None => Ok(DEFAULT_MAZE.to_string()),
        }
    }
}

fn positive(field: &str, value: f64) -> Result<(), ChaseError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ChaseError::InvalidSetting {
            field: field.to_string(),
            value,
        })
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ChaseError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ChaseError::InvalidSetting {
            field: field.to_string(),
            value,
        })
    }
}

/// Per-ghost RNG seed derived from the simulation seed.
pub fn ghost_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

// ---------------------------------------------------------------------------
// Run bookkeeping
// ---------------------------------------------------------------------------

/// Fixed ticks simulated so far.
#[derive(Resource, Debug, Default)]
pub struct TickCount(pub u32);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
