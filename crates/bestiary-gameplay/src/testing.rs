//! Test doubles and a single-creature harness.
//!
//! Used by unit tests, the integration tests and anyone embedding the engine
//! who wants a deterministic sandbox.

use bestiary_common::{EntityId, ItemTypeId, Vec2};

use crate::attributes::AttributeSet;
use crate::behavior::{Frame, Temperament, TickContext};
use crate::combat::{CombatResolver, DamageResult, PlayerActor};
use crate::config::BehaviorConfig;
use crate::creature::{Creature, CreatureCore, SpeciesInfo};
use crate::events::EventBus;
use crate::profile::BehaviorProfile;
use crate::rng::CombatRng;
use crate::world::{Arena, LootEntry, RewardSink, WorldQuery};

/// Reward sink that drops every guaranteed entry and records grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingRewards {
    /// Every `(gold, xp)` grant, in order.
    pub grants: Vec<(u32, u32)>,
    /// Every item dropped, in order.
    pub dropped: Vec<ItemTypeId>,
}

impl RewardSink for RecordingRewards {
    fn roll_loot(&mut self, table: &[LootEntry]) -> Vec<ItemTypeId> {
        let items: Vec<ItemTypeId> = table
            .iter()
            .filter(|entry| entry.chance >= 1.0)
            .flat_map(|entry| std::iter::repeat(entry.item).take(entry.min as usize))
            .collect();
        self.dropped.extend(items.iter().copied());
        items
    }

    fn grant_reward(&mut self, gold: u32, xp: u32) {
        self.grants.push((gold, xp));
    }
}

/// Species data for ad-hoc creatures.
#[must_use]
pub fn test_species(key: &str) -> SpeciesInfo {
    SpeciesInfo {
        key: key.to_string(),
        name: key.to_string(),
        loot: Vec::new(),
        gold_reward: 0,
        xp_reward: 0,
        is_boss: false,
        sprite_key: key.to_string(),
        scale: 1.0,
    }
}

/// An aggressive creature with the given profile and attributes.
#[must_use]
pub fn creature_with(profile: BehaviorProfile, attributes: AttributeSet, spawn: Vec2) -> Creature {
    let core = CreatureCore::new(test_species("test"), Temperament::Aggressive, attributes, spawn);
    Creature::new(core, profile)
}

/// Player, world and services for driving one creature by hand.
#[derive(Debug)]
pub struct Harness {
    /// Player actor, placed at the origin.
    pub player: PlayerActor,
    /// Combat resolver.
    pub resolver: CombatResolver,
    /// Positions.
    pub world: Arena,
    /// Reward recorder.
    pub rewards: RecordingRewards,
    /// Random source.
    pub rng: CombatRng,
    /// Events.
    pub events: EventBus,
    /// State machine constants.
    pub behavior: BehaviorConfig,
}

impl Harness {
    /// A 100 hp player with 10 damage and no crits, at the origin.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let player = PlayerActor::new(AttributeSet::new(100, 10, 0, 100.0).with_crit(0.0, 2.0));
        let mut world = Arena::new();
        world.insert(player.id, Vec2::ZERO);

        Self {
            player,
            resolver: CombatResolver::default(),
            world,
            rewards: RecordingRewards::default(),
            rng: CombatRng::new(seed),
            events: EventBus::default(),
            behavior: BehaviorConfig::default(),
        }
    }

    /// Put a creature in the world at its spawn point.
    pub fn place(&mut self, creature: &Creature) {
        self.world.insert(creature.id(), creature.core().spawn_point());
    }

    /// Distance from an actor to the player.
    #[must_use]
    pub fn distance(&self, id: EntityId) -> f32 {
        self.world
            .distance_between(id, self.player.id)
            .unwrap_or(f32::INFINITY)
    }

    /// Frame for `id` at `now`.
    #[must_use]
    pub fn frame(&self, id: EntityId, now: f32, delta: f32) -> Frame {
        Frame::new(now, delta, self.distance(id))
    }

    /// Borrow everything as a tick context.
    pub fn cx(&mut self) -> TickContext<'_> {
        TickContext {
            target: &mut self.player,
            resolver: &mut self.resolver,
            world: &mut self.world,
            rewards: &mut self.rewards,
            rng: &mut self.rng,
            events: &self.events,
            behavior: &self.behavior,
        }
    }

    /// One full tick for one creature, then move bodies.
    pub fn step(&mut self, creature: &mut Creature, now: f32, delta: f32) -> Frame {
        self.resolver.tick(delta);
        let frame = self.frame(creature.id(), now, delta);
        creature.tick_statuses(&mut self.cx(), frame);
        creature.update(&mut self.cx(), frame);
        self.world.integrate(delta);
        frame
    }

    /// Deal `amount` straight to a creature and run its damage reaction.
    pub fn hit(&mut self, creature: &mut Creature, amount: u32, now: f32) -> DamageResult {
        let dealt = creature.core_mut().attributes.apply_damage(amount as f32);
        let result = DamageResult {
            amount_dealt: dealt,
            performed: true,
            killed: creature.core().attributes.is_dead(),
            ..DamageResult::default()
        };
        let frame = self.frame(creature.id(), now, 0.0);
        creature.receive_hit(&mut self.cx(), frame, &result);
        result
    }
}
