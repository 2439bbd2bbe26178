//! Pickups: the registry patrol ghosts forage from, and collection by the
//! player.

use bevy::prelude::*;
use micromegas_tracing::prelude::{imetric, info};
use rand::Rng;

use crate::app_state::{SimState, TickSet};
use crate::chase::PickupRegistry;
use crate::components::{Pickup, Player, Position};
use crate::events::PickupCollected;

/// How close the player must get to a pickup to collect it.
pub const PICKUP_RADIUS: f32 = 0.5;

pub struct PickupPlugin;

impl Plugin for PickupPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PickupField>();
        app.add_systems(OnEnter(SimState::Running), index_pickups);
        app.add_systems(
            FixedUpdate,
            collect_pickups
                .in_set(TickSet::Collect)
                .run_if(in_state(SimState::Running)),
        );
        app.add_observer(on_pickup_collected);
    }
}

/// Remaining pickups, indexed for uniform random selection.
#[derive(Resource, Debug, Default)]
pub struct PickupField {
    entries: Vec<(Entity, Vec2)>,
}

impl PickupField {
    pub fn from_entries(entries: Vec<(Entity, Vec2)>) -> Self {
        Self { entries }
    }

    /// Remove a collected pickup. Order is not preserved.
    pub fn remove(&mut self, entity: Entity) -> bool {
        match self.entries.iter().position(|(e, _)| *e == entity) {
            Some(index) => {
                self.entries.swap_remove(index);
                true
            }
            None => false,
        }
    }
}

impl PickupRegistry for PickupField {
    fn count(&self) -> usize {
        self.entries.len()
    }

    fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec2> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.entries[rng.gen_range(0..self.entries.len())].1)
    }
}

/// Build the registry from the pickups spawned with the maze.
pub fn index_pickups(mut commands: Commands, query: Query<(Entity, &Position), With<Pickup>>) {
    let entries: Vec<_> = query.iter().map(|(e, pos)| (e, pos.0)).collect();
    info!("indexed {} pickups", entries.len());
    commands.insert_resource(PickupField::from_entries(entries));
}

/// Despawn pickups the player walks over.
fn collect_pickups(
    mut commands: Commands,
    mut field: ResMut<PickupField>,
    player_query: Query<&Position, With<Player>>,
    pickup_query: Query<(Entity, &Position), With<Pickup>>,
) {
    let Ok(player_pos) = player_query.single() else {
        return;
    };
    for (entity, pickup_pos) in &pickup_query {
        if player_pos.0.distance(pickup_pos.0) < PICKUP_RADIUS && field.remove(entity) {
            commands.entity(entity).despawn();
            commands.trigger(PickupCollected {
                remaining: field.count(),
            });
        }
    }
}

fn on_pickup_collected(trigger: On<PickupCollected>) {
    imetric!("pickups_remaining", "count", trigger.event().remaining as u64);
}
