use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, States)]
pub enum SimState {
    #[default]
    Loading,
    Running,
    Finished,
}

/// Ordering of the per-tick simulation work inside `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickSet {
    /// Seed chase episodes for newly spawned ghosts.
    BeginEpisode,
    /// Every ghost records its pursued agent's position.
    Record,
    /// House release and other lifecycle transitions.
    Release,
    /// Pursued agent and ghosts pick their movement.
    Steer,
    /// Movement intents are integrated.
    Motion,
    /// Pickups collected, tick bookkeeping.
    Collect,
}

/// Chain the tick sets in order inside `FixedUpdate`.
pub fn configure_tick_sets(app: &mut App) {
    app.configure_sets(
        FixedUpdate,
        (
            TickSet::BeginEpisode,
            TickSet::Record,
            TickSet::Release,
            TickSet::Steer,
            TickSet::Motion,
            TickSet::Collect,
        )
            .chain(),
    );
}
