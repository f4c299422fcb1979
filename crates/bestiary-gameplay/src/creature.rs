//! Creatures: shared state, movement helpers and the per-tick update.
//!
//! This module provides:
//! - [`CreatureCore`], the profile-independent state of a creature
//! - The generic state handlers used by [`Behavior`] default methods
//! - [`Creature`], which pairs a core with its [`BehaviorProfile`] and
//!   dispatches updates, damage reactions, status ticks and death

use bestiary_common::{coords, numeric, EntityId, ItemTypeId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::attributes::AttributeSet;
use crate::behavior::{Behavior, Frame, Temperament, TickContext};
use crate::combat::{AttackPacing, AttackRequest, CooldownGate, DamageResult};
use crate::events::{AttackKind, CombatEvent, EventBus};
use crate::profile::BehaviorProfile;
use crate::state::{BehaviorState, StateMachine};
use crate::status::{ApplyOutcome, StatusEffectTable, StatusEvent, StatusKind};
use crate::world::LootEntry;

/// Species data carried by every creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesInfo {
    /// Registry key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Loot table rolled on death.
    pub loot: Vec<LootEntry>,
    /// Gold granted on death.
    pub gold_reward: u32,
    /// Experience granted on death.
    pub xp_reward: u32,
    /// Boss flag.
    pub is_boss: bool,
    /// Sprite key for the renderer.
    pub sprite_key: String,
    /// Render scale.
    pub scale: f32,
}

/// Boss that waits on its throne until approached or hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThroneGuard {
    /// Distance at which the guard wakes.
    pub wake_radius: f32,
    /// Whether the guard has left the throne.
    pub awake: bool,
}

/// Profile-independent state of a creature.
#[derive(Debug, Clone)]
pub struct CreatureCore {
    id: EntityId,
    species: SpeciesInfo,
    temperament: Temperament,
    /// Combat attributes.
    pub attributes: AttributeSet,
    /// Active status effects.
    pub statuses: StatusEffectTable,
    fsm: StateMachine,
    spawn_point: Vec2,
    wander_target: Option<Vec2>,
    aggro: bool,
    attack_range: f32,
    pacing: AttackPacing,
    throne: Option<ThroneGuard>,
    removal_at: Option<f32>,
}

impl CreatureCore {
    /// Create a core at full health, idle at `spawn_point`.
    #[must_use]
    pub fn new(
        species: SpeciesInfo,
        temperament: Temperament,
        attributes: AttributeSet,
        spawn_point: Vec2,
    ) -> Self {
        Self {
            id: EntityId::new(),
            species,
            temperament,
            attributes,
            statuses: StatusEffectTable::new(),
            fsm: StateMachine::default(),
            spawn_point,
            wander_target: None,
            aggro: false,
            attack_range: 50.0,
            pacing: AttackPacing::default(),
            throne: None,
            removal_at: None,
        }
    }

    /// Set melee range.
    #[must_use]
    pub fn with_attack_range(mut self, range: f32) -> Self {
        self.attack_range = numeric::non_negative(range, 50.0, "attack range");
        self
    }

    /// Set attack pacing.
    #[must_use]
    pub fn with_pacing(mut self, pacing: AttackPacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Guard a throne until the player comes within `wake_radius`.
    #[must_use]
    pub fn with_throne_guard(mut self, wake_radius: f32) -> Self {
        self.throne = Some(ThroneGuard {
            wake_radius,
            awake: false,
        });
        self
    }

    /// Use a specific ID.
    #[must_use]
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Creature ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Species data.
    #[must_use]
    pub fn species(&self) -> &SpeciesInfo {
        &self.species
    }

    /// Temperament.
    #[must_use]
    pub const fn temperament(&self) -> Temperament {
        self.temperament
    }

    /// Current behavior state.
    #[must_use]
    pub const fn state(&self) -> BehaviorState {
        self.fsm.current()
    }

    /// The state machine.
    #[must_use]
    pub fn state_machine(&self) -> &StateMachine {
        &self.fsm
    }

    /// Spawn point.
    #[must_use]
    pub const fn spawn_point(&self) -> Vec2 {
        self.spawn_point
    }

    /// Current wander destination.
    #[must_use]
    pub const fn wander_target(&self) -> Option<Vec2> {
        self.wander_target
    }

    /// Whether the creature has been provoked and auto-attacks.
    #[must_use]
    pub const fn is_aggro(&self) -> bool {
        self.aggro
    }

    /// Melee range.
    #[must_use]
    pub const fn attack_range(&self) -> f32 {
        self.attack_range
    }

    /// Attack pacing.
    #[must_use]
    pub const fn pacing(&self) -> AttackPacing {
        self.pacing
    }

    /// Throne guard, if any.
    #[must_use]
    pub const fn throne(&self) -> Option<ThroneGuard> {
        self.throne
    }

    /// Time at which a dead creature leaves the simulation.
    #[must_use]
    pub const fn removal_at(&self) -> Option<f32> {
        self.removal_at
    }

    /// Whether the creature is dead (state or health).
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.fsm.is_dead() || self.attributes.is_dead()
    }

    // ========================================================================
    // Senses
    // ========================================================================

    /// Whether the player is within the detection radius.
    #[must_use]
    pub fn detects(&self, distance: f32) -> bool {
        self.attributes
            .detection_radius
            .is_some_and(|radius| distance <= radius)
    }

    /// Whether the temperament allows engaging the player at `distance`.
    #[must_use]
    pub fn is_hostile_at(&self, distance: f32) -> bool {
        match self.temperament {
            Temperament::Passive => false,
            Temperament::Neutral => {
                self.aggro
                    || self
                        .attributes
                        .aggro_radius
                        .is_some_and(|radius| distance <= radius)
            },
            Temperament::Aggressive => true,
        }
    }

    /// Distance to travel before a flee is over.
    #[must_use]
    pub fn flee_radius(&self, cx: &TickContext<'_>) -> f32 {
        self.attributes
            .flee_radius
            .or(self.attributes.detection_radius)
            .unwrap_or(cx.behavior.default_flee_radius)
    }

    /// Current position.
    #[must_use]
    pub fn position(&self, cx: &TickContext<'_>) -> Option<Vec2> {
        cx.world.position_of(self.id)
    }

    /// Player position.
    #[must_use]
    pub fn target_position(&self, cx: &TickContext<'_>) -> Option<Vec2> {
        cx.world.position_of(cx.target.id)
    }

    /// Whether the creature strayed beyond its return radius.
    #[must_use]
    pub fn beyond_return_radius(&self, cx: &TickContext<'_>) -> bool {
        match (self.attributes.return_radius, self.position(cx)) {
            (Some(radius), Some(position)) => position.distance(self.spawn_point) > radius,
            _ => false,
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Transition and publish the change. Returns whether it happened.
    pub fn change_state(&mut self, cx: &TickContext<'_>, next: BehaviorState, now: f32) -> bool {
        match self.fsm.change_state(next, now) {
            Some(transition) => {
                debug!(
                    "{} {} -> {}",
                    self.id, transition.from, transition.to
                );
                cx.events.publish(CombatEvent::StateChanged {
                    id: self.id,
                    from: transition.from,
                    to: transition.to,
                    at: now,
                });
                true
            },
            None => false,
        }
    }

    /// Mark as provoked and move into `next` unless already engaged.
    pub fn react_to_damage(&mut self, cx: &TickContext<'_>, next: BehaviorState, now: f32) {
        self.aggro = true;
        self.wake();
        if next == BehaviorState::Fleeing || !self.state().is_engaged() {
            self.change_state(cx, next, now);
        }
    }

    /// Drop the provoked flag.
    pub fn calm_down(&mut self) {
        self.aggro = false;
    }

    /// Leave the throne.
    pub fn wake(&mut self) {
        if let Some(throne) = self.throne.as_mut() {
            if !throne.awake {
                debug!("{} leaves its throne", self.id);
                throne.awake = true;
            }
        }
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Set velocity.
    pub fn set_velocity(&self, cx: &mut TickContext<'_>, velocity: Vec2) {
        cx.world.set_velocity(self.id, velocity);
    }

    /// Zero velocity.
    pub fn stop(&self, cx: &mut TickContext<'_>) {
        self.set_velocity(cx, Vec2::ZERO);
    }

    /// Velocity along `direction`. Never non-finite.
    fn heading(&self, direction: Vec2, multiplier: f32) -> Vec2 {
        let multiplier = numeric::non_negative(multiplier, 1.0, "speed multiplier");
        let velocity = direction * self.attributes.speed * multiplier;
        if velocity.is_finite() {
            velocity
        } else {
            warn!("{} produced non-finite velocity {}, stopping", self.id, velocity);
            Vec2::ZERO
        }
    }

    /// Head for `point` at speed times `multiplier`.
    pub fn move_toward(&self, cx: &mut TickContext<'_>, point: Vec2, multiplier: f32) {
        if let Some(position) = self.position(cx) {
            let velocity = self.heading(coords::direction_to(position, point), multiplier);
            self.set_velocity(cx, velocity);
        }
    }

    /// Head away from `threat` at speed times `multiplier`.
    pub fn move_away(&self, cx: &mut TickContext<'_>, threat: Vec2, multiplier: f32) {
        if let Some(position) = self.position(cx) {
            let velocity = self.heading(coords::direction_away(position, threat), multiplier);
            self.set_velocity(cx, velocity);
        }
    }

    /// Head for the player.
    pub fn chase_target(&self, cx: &mut TickContext<'_>, multiplier: f32) {
        if let Some(target) = self.target_position(cx) {
            self.move_toward(cx, target, multiplier);
        }
    }

    // ========================================================================
    // Generic handlers
    // ========================================================================

    /// Pick a wander destination and start walking.
    pub fn begin_wander(&mut self, cx: &mut TickContext<'_>, now: f32) {
        let destination = cx
            .rng
            .point_within(self.spawn_point, cx.behavior.wander_radius);
        self.wander_target = Some(destination);
        self.change_state(cx, BehaviorState::Wandering, now);
    }

    /// Idle: stand still, wander once the idle time is up.
    pub fn idle_tick(&mut self, cx: &mut TickContext<'_>, frame: Frame) {
        self.stop(cx);
        if self.fsm.state_timer() >= cx.behavior.idle_duration {
            self.begin_wander(cx, frame.now);
        }
    }

    /// Wandering: walk to the destination, idle on arrival or timeout.
    pub fn wander_tick(&mut self, cx: &mut TickContext<'_>, frame: Frame) {
        let Some(destination) = self.wander_target else {
            self.begin_wander(cx, frame.now);
            return;
        };

        let arrived = self
            .position(cx)
            .map_or(true, |p| p.distance(destination) < cx.behavior.arrival_distance);

        if arrived || self.fsm.state_timer() >= cx.behavior.wander_timeout {
            self.wander_target = None;
            self.stop(cx);
            self.change_state(cx, BehaviorState::Idle, frame.now);
        } else {
            self.move_toward(cx, destination, 1.0);
        }
    }

    /// Fleeing: run until the flee radius is cleared.
    pub fn flee_tick(&mut self, cx: &mut TickContext<'_>, frame: Frame, multiplier: f32) {
        if frame.distance > self.flee_radius(cx) {
            self.stop(cx);
            self.calm_down();
            self.change_state(cx, BehaviorState::Idle, frame.now);
            return;
        }

        if let Some(threat) = self.target_position(cx) {
            let multiplier = cx.behavior.flee_speed_multiplier * multiplier;
            self.move_away(cx, threat, multiplier);
        }
    }

    /// Chasing: attack when in range, give up past the return radius.
    pub fn chase_tick(&mut self, cx: &mut TickContext<'_>, frame: Frame, multiplier: f32) {
        if cx.target.attributes.is_dead() || self.beyond_return_radius(cx) {
            self.change_state(cx, BehaviorState::Returning, frame.now);
            return;
        }

        if frame.distance <= self.attack_range {
            self.stop(cx);
            self.change_state(cx, BehaviorState::Attacking, frame.now);
            return;
        }

        self.chase_target(cx, multiplier);
    }

    /// Returning: walk to spawn. Returns true on arrival.
    pub fn return_tick(&mut self, cx: &mut TickContext<'_>, frame: Frame, multiplier: f32) -> bool {
        let arrived = self
            .position(cx)
            .map_or(true, |p| p.distance(self.spawn_point) < cx.behavior.arrival_distance);

        if arrived {
            self.stop(cx);
            self.calm_down();
            self.change_state(cx, BehaviorState::Idle, frame.now);
        } else {
            self.move_toward(cx, self.spawn_point, multiplier);
        }
        arrived
    }

    // ========================================================================
    // Attacks
    // ========================================================================

    /// Standard globally gated melee attack.
    pub fn melee(&mut self, cx: &mut TickContext<'_>, frame: Frame) -> DamageResult {
        self.attack(cx, frame.now, 1.0, CooldownGate::Global, AttackKind::Melee)
    }

    /// Attack the player with `multiplier` times base damage.
    pub fn attack(
        &mut self,
        cx: &mut TickContext<'_>,
        now: f32,
        multiplier: f32,
        gate: CooldownGate,
        kind: AttackKind,
    ) -> DamageResult {
        let request = AttackRequest::new(
            self.id,
            self.attributes.damage as f32 * multiplier,
            self.pacing,
        )
        .with_gate(gate);

        let result = cx
            .resolver
            .creature_attack(&request, &self.attributes, cx.target, cx.rng);

        if !result.performed {
            cx.events.publish(CombatEvent::AttackRejected { attacker: self.id });
            return result;
        }

        debug!("{} {:?} at {:.0}ms: {:?}", self.id, kind, now, result);
        cx.events.publish(CombatEvent::AttackResolved {
            attacker: self.id,
            defender: cx.target.id,
            kind,
            result,
        });

        if result.killed {
            cx.events.publish(CombatEvent::PlayerDefeated {
                id: cx.target.id,
                by: Some(self.id),
            });
        }
        result
    }

    /// Apply a status effect to the player, attributed to this creature.
    pub fn afflict_target(
        &self,
        cx: &mut TickContext<'_>,
        kind: StatusKind,
        damage_per_tick: u32,
        duration: f32,
        interval: f32,
    ) -> ApplyOutcome {
        let outcome =
            cx.target
                .statuses
                .apply(kind, damage_per_tick, duration, interval, Some(self.id));
        cx.events.publish(CombatEvent::StatusApplied {
            target: cx.target.id,
            kind,
            outcome,
        });
        outcome
    }
}

/// A creature: shared core plus species behavior.
#[derive(Debug, Clone)]
pub struct Creature {
    core: CreatureCore,
    profile: BehaviorProfile,
}

impl Creature {
    /// Pair a core with a profile.
    #[must_use]
    pub fn new(core: CreatureCore, profile: BehaviorProfile) -> Self {
        Self { core, profile }
    }

    /// Creature ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.core.id()
    }

    /// Shared state.
    #[must_use]
    pub fn core(&self) -> &CreatureCore {
        &self.core
    }

    /// Mutable shared state.
    pub fn core_mut(&mut self) -> &mut CreatureCore {
        &mut self.core
    }

    /// Behavior profile.
    #[must_use]
    pub fn profile(&self) -> &BehaviorProfile {
        &self.profile
    }

    /// Current behavior state.
    #[must_use]
    pub const fn state(&self) -> BehaviorState {
        self.core.state()
    }

    /// Whether the creature is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.core.is_dead()
    }

    /// Hidden in ambush.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.profile.behavior().is_hidden()
    }

    /// Flying sub-mode.
    #[must_use]
    pub fn is_flying(&self) -> bool {
        self.profile.behavior().is_flying()
    }

    /// Enraged or raging.
    #[must_use]
    pub fn is_enraged(&self) -> bool {
        self.profile.behavior().is_enraged()
    }

    /// Whether the death delay has run out at `now`.
    #[must_use]
    pub fn ready_for_removal(&self, now: f32) -> bool {
        self.core.removal_at.is_some_and(|at| now >= at)
    }

    /// Advance one tick.
    pub fn update(&mut self, cx: &mut TickContext<'_>, frame: Frame) {
        if self.core.fsm.is_dead() {
            return;
        }
        if self.core.attributes.is_dead() {
            self.die(cx, frame.now);
            return;
        }

        self.core.fsm.advance(frame.delta);
        let behavior = self.profile.behavior_mut();
        behavior.on_tick(&mut self.core, cx, frame);

        if let Some(throne) = self.core.throne {
            if !throne.awake {
                if frame.distance <= throne.wake_radius || self.core.aggro {
                    self.core.wake();
                } else {
                    self.core.stop(cx);
                    return;
                }
            }
        }

        if self.core.statuses.is_incapacitated() {
            self.core.stop(cx);
            return;
        }

        match self.core.state() {
            BehaviorState::Idle => behavior.handle_idle(&mut self.core, cx, frame),
            BehaviorState::Wandering => behavior.handle_wandering(&mut self.core, cx, frame),
            BehaviorState::Fleeing => behavior.handle_fleeing(&mut self.core, cx, frame),
            BehaviorState::Chasing => behavior.handle_chasing(&mut self.core, cx, frame),
            BehaviorState::Attacking => behavior.handle_attacking(&mut self.core, cx, frame),
            BehaviorState::Returning => behavior.handle_returning(&mut self.core, cx, frame),
            BehaviorState::Dead => {},
        }

        if self.core.statuses.is_immobilized() {
            self.core.stop(cx);
        }
    }

    /// React to a hit that was already applied to this creature.
    pub fn receive_hit(&mut self, cx: &mut TickContext<'_>, frame: Frame, result: &DamageResult) {
        if self.core.fsm.is_dead() || !result.landed() {
            return;
        }
        if self.core.attributes.is_dead() {
            self.die(cx, frame.now);
            return;
        }

        self.profile
            .behavior_mut()
            .on_damaged(&mut self.core, cx, frame, result);
    }

    /// Apply a status effect to this creature.
    pub fn apply_status(
        &mut self,
        events: &EventBus,
        kind: StatusKind,
        damage_per_tick: u32,
        duration: f32,
        interval: f32,
        source: Option<EntityId>,
    ) -> ApplyOutcome {
        if self.is_dead() {
            return ApplyOutcome::Discarded;
        }
        let outcome = self
            .core
            .statuses
            .apply(kind, damage_per_tick, duration, interval, source);
        events.publish(CombatEvent::StatusApplied {
            target: self.id(),
            kind,
            outcome,
        });
        outcome
    }

    /// Advance status effects and apply their damage.
    pub fn tick_statuses(&mut self, cx: &mut TickContext<'_>, frame: Frame) {
        if self.core.fsm.is_dead() {
            return;
        }

        for event in self.core.statuses.update(frame.delta) {
            if self.core.fsm.is_dead() {
                break;
            }
            match event {
                StatusEvent::Tick {
                    kind,
                    damage,
                    source,
                } => {
                    let dealt = cx
                        .resolver
                        .apply_status_damage(&mut self.core.attributes, damage);
                    cx.events.publish(CombatEvent::StatusTicked {
                        target: self.id(),
                        kind,
                        damage: dealt,
                        source,
                    });
                    let result = DamageResult {
                        amount_dealt: dealt,
                        performed: true,
                        killed: self.core.attributes.is_dead(),
                        ..DamageResult::default()
                    };
                    self.receive_hit(cx, frame, &result);
                },
                StatusEvent::Expired { kind } => {
                    cx.events.publish(CombatEvent::StatusExpired {
                        target: self.id(),
                        kind,
                    });
                },
            }
        }
    }

    /// Enter the terminal state, pay out rewards and schedule removal.
    pub fn die(&mut self, cx: &mut TickContext<'_>, now: f32) {
        if !self.core.change_state(cx, BehaviorState::Dead, now) {
            return;
        }

        self.core.stop(cx);
        self.core.wander_target = None;
        self.core.calm_down();
        self.core.statuses.clear();
        self.profile.behavior_mut().on_death();

        if cx.resolver.retaliation_target() == Some(self.id()) {
            cx.resolver.disarm_retaliation();
        }

        let loot: Vec<ItemTypeId> = cx.rewards.roll_loot(&self.core.species.loot);
        let gold = self.core.species.gold_reward;
        let xp = self.core.species.xp_reward;
        cx.rewards.grant_reward(gold, xp);

        debug!("{} ({}) died", self.id(), self.core.species.key);
        cx.events.publish(CombatEvent::CreatureDied {
            id: self.id(),
            loot,
            gold,
            xp,
        });
        self.core.removal_at = Some(now + cx.behavior.death_delay);
    }
}
