//! Interfaces to the world outside the engine.
//!
//! The engine never owns positions. It asks a [`WorldQuery`] where actors
//! are, writes movement intent through a [`MovementSink`], and hands death
//! rewards to a [`RewardSink`]. [`Arena`] is a minimal in-memory world used
//! by the headless driver and by tests.

use ahash::AHashMap;
use bestiary_common::{coords, numeric, EntityId, ItemTypeId, Vec2};
use serde::{Deserialize, Serialize};

/// Read access to actor positions.
pub trait WorldQuery {
    /// Position of an actor, if it exists.
    fn position_of(&self, id: EntityId) -> Option<Vec2>;

    /// Distance between two actors, if both exist.
    fn distance_between(&self, a: EntityId, b: EntityId) -> Option<f32> {
        Some(coords::distance(self.position_of(a)?, self.position_of(b)?))
    }
}

/// Write access for movement intent.
pub trait MovementSink {
    /// Set an actor's velocity (world units per second).
    fn set_velocity(&mut self, id: EntityId, velocity: Vec2);

    /// Teleport an actor.
    fn set_position(&mut self, id: EntityId, position: Vec2);

    /// An actor entered the simulation at `position`.
    fn spawn_body(&mut self, id: EntityId, position: Vec2) {
        self.set_position(id, position);
    }

    /// An actor left the simulation.
    fn despawn_body(&mut self, _id: EntityId) {}
}

/// Combined world access lent to creatures during a tick.
pub trait WorldAccess: WorldQuery + MovementSink {}

impl<T: WorldQuery + MovementSink> WorldAccess for T {}

/// One row of a species loot table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    /// Item dropped.
    pub item: ItemTypeId,
    /// Drop probability (0.0-1.0).
    #[serde(default = "default_loot_chance")]
    pub chance: f32,
    /// Minimum quantity when dropped.
    #[serde(default = "default_quantity")]
    pub min: u32,
    /// Maximum quantity when dropped.
    #[serde(default = "default_quantity")]
    pub max: u32,
}

fn default_loot_chance() -> f32 {
    1.0
}

fn default_quantity() -> u32 {
    1
}

impl LootEntry {
    /// A guaranteed single drop.
    #[must_use]
    pub fn new(item: ItemTypeId) -> Self {
        Self {
            item,
            chance: 1.0,
            min: 1,
            max: 1,
        }
    }

    /// Set drop chance.
    #[must_use]
    pub fn with_chance(mut self, chance: f32) -> Self {
        self.chance = numeric::probability(chance, 0.0, "loot chance");
        self
    }

    /// Set quantity range.
    #[must_use]
    pub fn with_quantity(mut self, min: u32, max: u32) -> Self {
        self.min = min.min(max);
        self.max = max.max(min);
        self
    }
}

/// Receives death rewards.
pub trait RewardSink {
    /// Roll a loot table into dropped items.
    fn roll_loot(&mut self, table: &[LootEntry]) -> Vec<ItemTypeId>;

    /// Grant gold and experience to the player.
    fn grant_reward(&mut self, gold: u32, xp: u32);
}

/// Position and velocity of one actor in an [`Arena`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Body {
    /// Current position.
    pub position: Vec2,
    /// Current velocity (world units per second).
    pub velocity: Vec2,
}

/// In-memory world with straight-line movement.
#[derive(Debug, Clone, Default)]
pub struct Arena {
    bodies: AHashMap<EntityId, Body>,
}

impl Arena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an actor at rest.
    pub fn insert(&mut self, id: EntityId, position: Vec2) {
        self.bodies.insert(
            id,
            Body {
                position,
                velocity: Vec2::ZERO,
            },
        );
    }

    /// Remove an actor.
    pub fn remove(&mut self, id: EntityId) -> Option<Body> {
        self.bodies.remove(&id)
    }

    /// Body of an actor.
    #[must_use]
    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Current velocity of an actor.
    #[must_use]
    pub fn velocity_of(&self, id: EntityId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.velocity)
    }

    /// Number of actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Move every body along its velocity for `delta` milliseconds.
    pub fn integrate(&mut self, delta: f32) {
        let seconds = numeric::non_negative(delta, 0.0, "integrate delta") / 1000.0;
        for body in self.bodies.values_mut() {
            body.position += body.velocity * seconds;
        }
    }
}

impl WorldQuery for Arena {
    fn position_of(&self, id: EntityId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.position)
    }
}

impl MovementSink for Arena {
    fn set_velocity(&mut self, id: EntityId, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = if velocity.is_finite() {
                velocity
            } else {
                tracing::warn!("non-finite velocity for {id}, stopping");
                Vec2::ZERO
            };
        }
    }

    fn set_position(&mut self, id: EntityId, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = position;
        }
    }

    fn spawn_body(&mut self, id: EntityId, position: Vec2) {
        self.insert(id, position);
    }

    fn despawn_body(&mut self, id: EntityId) {
        self.remove(id);
    }
}
