//! Reference simulation driver.
//!
//! An [`Encounter`] owns one player actor, the creature population (updated
//! in insertion order), the combat resolver, the random source and the event
//! bus. The host keeps the world and the reward sink and lends them to each
//! call.
//!
//! A tick runs in this order:
//! 1. Resolver cooldowns advance
//! 2. Player status effects tick
//! 3. Each creature ticks its status effects, then its behavior
//! 4. The player counter-attacks its retaliation target
//! 5. Creatures past their death delay are removed

use bestiary_common::{numeric, EntityId, Vec2};
use tracing::{debug, info};

use crate::behavior::{Frame, TickContext};
use crate::combat::{CombatResolver, DamageResult, PlayerActor};
use crate::config::{BehaviorConfig, EngineTuning};
use crate::creature::Creature;
use crate::events::{AttackKind, CombatEvent, EventBus, EventHandler};
use crate::rng::CombatRng;
use crate::species::{CreatureFactory, RegistryResult};
use crate::status::{ApplyOutcome, StatusEvent, StatusKind};
use crate::world::{RewardSink, WorldAccess};

/// One player against a population of creatures.
#[derive(Debug)]
pub struct Encounter {
    creatures: Vec<Creature>,
    player: PlayerActor,
    resolver: CombatResolver,
    rng: CombatRng,
    events: EventBus,
    behavior: BehaviorConfig,
}

impl Encounter {
    /// Create an empty encounter.
    #[must_use]
    pub fn new(mut tuning: EngineTuning, player: PlayerActor, seed: u64) -> Self {
        tuning.validate();
        Self {
            creatures: Vec::new(),
            player,
            resolver: CombatResolver::new(tuning.combat),
            rng: CombatRng::new(seed),
            events: EventBus::default(),
            behavior: tuning.behavior,
        }
    }

    /// Use an event bus with a different capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.events = EventBus::new(capacity);
        self
    }

    // ========================================================================
    // Population
    // ========================================================================

    /// Add a creature and place its body at the spawn point.
    pub fn spawn<W: WorldAccess>(&mut self, creature: Creature, world: &mut W) -> EntityId {
        let id = creature.id();
        world.spawn_body(id, creature.core().spawn_point());
        self.events.publish(CombatEvent::CreatureSpawned {
            id,
            species: creature.core().species().key.clone(),
        });
        debug!("{} ({}) joined the encounter", id, creature.core().species().key);
        self.creatures.push(creature);
        id
    }

    /// Spawn a registered species at `position`.
    pub fn spawn_species<W: WorldAccess>(
        &mut self,
        factory: &CreatureFactory<'_>,
        key: &str,
        position: Vec2,
        world: &mut W,
    ) -> RegistryResult<EntityId> {
        let creature = factory.spawn(key, position, &mut self.rng)?;
        Ok(self.spawn(creature, world))
    }

    /// Remove a creature immediately, dead or alive.
    pub fn despawn<W: WorldAccess>(&mut self, id: EntityId, world: &mut W) -> Option<Creature> {
        let index = self.creatures.iter().position(|c| c.id() == id)?;
        let creature = self.creatures.remove(index);
        if self.resolver.retaliation_target() == Some(id) {
            self.resolver.disarm_retaliation();
        }
        world.despawn_body(id);
        self.events.publish(CombatEvent::CreatureRemoved { id });
        Some(creature)
    }

    /// Creature by ID.
    #[must_use]
    pub fn creature(&self, id: EntityId) -> Option<&Creature> {
        self.creatures.iter().find(|c| c.id() == id)
    }

    /// Mutable creature by ID.
    pub fn creature_mut(&mut self, id: EntityId) -> Option<&mut Creature> {
        self.creatures.iter_mut().find(|c| c.id() == id)
    }

    /// All creatures, in insertion order.
    #[must_use]
    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    /// Creatures not yet dead.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.creatures.iter().filter(|c| !c.is_dead()).count()
    }

    /// Player actor.
    #[must_use]
    pub fn player(&self) -> &PlayerActor {
        &self.player
    }

    /// Mutable player actor.
    pub fn player_mut(&mut self) -> &mut PlayerActor {
        &mut self.player
    }

    /// Combat resolver.
    #[must_use]
    pub fn resolver(&self) -> &CombatResolver {
        &self.resolver
    }

    /// State machine constants.
    #[must_use]
    pub fn behavior_config(&self) -> &BehaviorConfig {
        &self.behavior
    }

    /// Whether the player has been defeated.
    #[must_use]
    pub fn is_player_defeated(&self) -> bool {
        self.player.attributes.is_dead()
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Take every pending event.
    pub fn drain_events(&self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    /// Feed every pending event to `handler`. Returns how many were handled.
    pub fn dispatch(&self, handler: &mut dyn EventHandler) -> usize {
        let events = self.events.drain();
        for event in &events {
            handler.handle(event);
        }
        events.len()
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// The player attacks a creature with its own damage stat.
    pub fn player_attack<W: WorldAccess, R: RewardSink>(
        &mut self,
        target: EntityId,
        now: f32,
        world: &mut W,
        rewards: &mut R,
    ) -> DamageResult {
        if self.player.attributes.is_dead() {
            return DamageResult::not_performed();
        }
        let Some(creature) = self.creatures.iter_mut().find(|c| c.id() == target) else {
            return DamageResult::not_performed();
        };
        if creature.is_dead() {
            return DamageResult::not_performed();
        }

        let result = self.resolver.resolve(
            &self.player.attributes,
            &mut creature.core_mut().attributes,
            self.player.attributes.damage as f32,
            &mut self.rng,
        );
        self.events.publish(CombatEvent::AttackResolved {
            attacker: self.player.id,
            defender: target,
            kind: AttackKind::Player,
            result,
        });

        let distance = world
            .distance_between(target, self.player.id)
            .unwrap_or(f32::INFINITY);
        let mut cx = TickContext {
            target: &mut self.player,
            resolver: &mut self.resolver,
            world,
            rewards,
            rng: &mut self.rng,
            events: &self.events,
            behavior: &self.behavior,
        };
        creature.receive_hit(&mut cx, Frame::new(now, 0.0, distance), &result);
        result
    }

    /// Apply a status effect to a creature.
    pub fn apply_status_to_creature(
        &mut self,
        id: EntityId,
        kind: StatusKind,
        damage_per_tick: u32,
        duration: f32,
        interval: f32,
        source: Option<EntityId>,
    ) -> ApplyOutcome {
        let Some(creature) = self.creatures.iter_mut().find(|c| c.id() == id) else {
            return ApplyOutcome::Discarded;
        };
        creature.apply_status(&self.events, kind, damage_per_tick, duration, interval, source)
    }

    /// Apply a status effect to the player.
    pub fn apply_status_to_player(
        &mut self,
        kind: StatusKind,
        damage_per_tick: u32,
        duration: f32,
        interval: f32,
        source: Option<EntityId>,
    ) -> ApplyOutcome {
        if self.player.attributes.is_dead() {
            return ApplyOutcome::Discarded;
        }
        let outcome = self
            .player
            .statuses
            .apply(kind, damage_per_tick, duration, interval, source);
        self.events.publish(CombatEvent::StatusApplied {
            target: self.player.id,
            kind,
            outcome,
        });
        outcome
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the encounter by `delta` milliseconds ending at `now`.
    pub fn tick<W: WorldAccess, R: RewardSink>(
        &mut self,
        now: f32,
        delta: f32,
        world: &mut W,
        rewards: &mut R,
    ) {
        let delta = numeric::non_negative(delta, 0.0, "tick delta");
        self.resolver.tick(delta);
        self.tick_player_statuses(delta);

        for creature in &mut self.creatures {
            let distance = world
                .distance_between(creature.id(), self.player.id)
                .unwrap_or(f32::INFINITY);
            let frame = Frame::new(now, delta, distance);
            let mut cx = TickContext {
                target: &mut self.player,
                resolver: &mut self.resolver,
                world: &mut *world,
                rewards: &mut *rewards,
                rng: &mut self.rng,
                events: &self.events,
                behavior: &self.behavior,
            };
            creature.tick_statuses(&mut cx, frame);
            creature.update(&mut cx, frame);
        }

        self.retaliate(now, world, rewards);
        self.remove_expired(now, world);
    }

    fn tick_player_statuses(&mut self, delta: f32) {
        let player_id = self.player.id;
        for event in self.player.statuses.update(delta) {
            match event {
                StatusEvent::Tick {
                    kind,
                    damage,
                    source,
                } => {
                    if self.player.attributes.is_dead() {
                        continue;
                    }
                    let dealt = self
                        .resolver
                        .apply_status_damage(&mut self.player.attributes, damage);
                    self.events.publish(CombatEvent::StatusTicked {
                        target: player_id,
                        kind,
                        damage: dealt,
                        source,
                    });
                    if self.player.attributes.is_dead() {
                        info!("player {} succumbed to {:?}", player_id, kind);
                        self.events.publish(CombatEvent::PlayerDefeated {
                            id: player_id,
                            by: source,
                        });
                    }
                },
                StatusEvent::Expired { kind } => {
                    self.events.publish(CombatEvent::StatusExpired {
                        target: player_id,
                        kind,
                    });
                },
            }
        }
    }

    fn retaliate<W: WorldAccess, R: RewardSink>(&mut self, now: f32, world: &mut W, rewards: &mut R) {
        let Some(target) = self.resolver.retaliation_target() else {
            return;
        };
        let Some(creature) = self.creatures.iter_mut().find(|c| c.id() == target) else {
            self.resolver.disarm_retaliation();
            return;
        };

        let distance = world
            .distance_between(target, self.player.id)
            .unwrap_or(f32::INFINITY);
        let Some(result) = self.resolver.try_retaliate(
            &self.player,
            target,
            &mut creature.core_mut().attributes,
            distance,
            &mut self.rng,
        ) else {
            return;
        };

        self.events.publish(CombatEvent::AttackResolved {
            attacker: self.player.id,
            defender: target,
            kind: AttackKind::Retaliation,
            result,
        });

        let mut cx = TickContext {
            target: &mut self.player,
            resolver: &mut self.resolver,
            world,
            rewards,
            rng: &mut self.rng,
            events: &self.events,
            behavior: &self.behavior,
        };
        creature.receive_hit(&mut cx, Frame::new(now, 0.0, distance), &result);
    }

    fn remove_expired<W: WorldAccess>(&mut self, now: f32, world: &mut W) {
        let mut removed = Vec::new();
        self.creatures.retain(|creature| {
            if creature.ready_for_removal(now) {
                removed.push(creature.id());
                false
            } else {
                true
            }
        });

        for id in removed {
            world.despawn_body(id);
            self.events.publish(CombatEvent::CreatureRemoved { id });
            debug!("{} removed after death delay", id);
        }
    }
}
