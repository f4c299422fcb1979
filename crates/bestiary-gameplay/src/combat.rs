//! Combat resolution between creatures and the player actor.
//!
//! This module provides:
//! - Damage resolution (dodge, block, defense mitigation, variance, crit)
//! - The global population cooldown gating creature attacks on the player
//! - Status damage application (mitigated, never dodged)
//! - Player retaliation against the most recent attacker

use bestiary_common::{numeric, EntityId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes::AttributeSet;
use crate::config::CombatConfig;
use crate::rng::CombatRng;
use crate::status::StatusEffectTable;

/// Outcome of one resolved (or rejected) attack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResult {
    /// Health actually removed from the defender.
    pub amount_dealt: u32,
    /// Whether the attacker rolled a critical hit.
    pub was_critical: bool,
    /// Whether the defender dodged.
    pub was_dodged: bool,
    /// Whether the defender blocked part of the hit.
    pub was_blocked: bool,
    /// False when the attack was rejected (cooldown, dead defender).
    pub performed: bool,
    /// Whether this hit brought the defender to zero health.
    pub killed: bool,
}

impl DamageResult {
    /// A rejected attack.
    #[must_use]
    pub const fn not_performed() -> Self {
        Self {
            amount_dealt: 0,
            was_critical: false,
            was_dodged: false,
            was_blocked: false,
            performed: false,
            killed: false,
        }
    }

    /// Whether the hit connected and removed health.
    #[must_use]
    pub const fn landed(&self) -> bool {
        self.performed && self.amount_dealt > 0
    }
}

/// The player-controlled actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerActor {
    /// Player handle.
    pub id: EntityId,
    /// Player attributes.
    pub attributes: AttributeSet,
    /// Active status effects on the player.
    pub statuses: StatusEffectTable,
}

impl PlayerActor {
    /// Create a player with a fresh ID and no status effects.
    #[must_use]
    pub fn new(attributes: AttributeSet) -> Self {
        Self {
            id: EntityId::new(),
            attributes,
            statuses: StatusEffectTable::new(),
        }
    }

    /// Use a specific ID.
    #[must_use]
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }
}

/// How fast an attacker swings, used to seed the global cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackPacing {
    /// Species attack cooldown (ms).
    pub base_cooldown: f32,
    /// Attack speed multiplier; higher is faster.
    pub attack_speed: f32,
    /// Boss attackers get a shorter cooldown.
    pub is_boss: bool,
}

impl Default for AttackPacing {
    fn default() -> Self {
        Self {
            base_cooldown: 1500.0,
            attack_speed: 1.0,
            is_boss: false,
        }
    }
}

/// Which cooldown an attack on the player is subject to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CooldownGate {
    /// Rejected while the global timer runs; seeds it when performed.
    Global,
    /// Ignores the global timer but still seeds it (ambush first strike).
    FirstStrike,
    /// Governed by an ability cooldown the attacker tracks itself.
    Independent,
}

/// A creature's request to hit the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackRequest {
    /// Attacking creature.
    pub attacker: EntityId,
    /// Damage before mitigation.
    pub base_damage: f32,
    /// Attacker pacing.
    pub pacing: AttackPacing,
    /// Cooldown gate.
    pub gate: CooldownGate,
}

impl AttackRequest {
    /// A standard, globally gated attack.
    #[must_use]
    pub fn new(attacker: EntityId, base_damage: f32, pacing: AttackPacing) -> Self {
        Self {
            attacker,
            base_damage,
            pacing,
            gate: CooldownGate::Global,
        }
    }

    /// Use a different cooldown gate.
    #[must_use]
    pub fn with_gate(mut self, gate: CooldownGate) -> Self {
        self.gate = gate;
        self
    }
}

/// Population-scoped combat service.
///
/// Owned by the simulation driver and lent to creatures during a tick. Holds
/// the only timers shared between creatures.
#[derive(Debug, Clone)]
pub struct CombatResolver {
    config: CombatConfig,
    global_cooldown: f32,
    retaliation_cooldown: f32,
    retaliation_target: Option<EntityId>,
}

impl Default for CombatResolver {
    fn default() -> Self {
        Self::new(CombatConfig::default())
    }
}

impl CombatResolver {
    /// Create a resolver with validated constants.
    #[must_use]
    pub fn new(mut config: CombatConfig) -> Self {
        config.validate();
        Self {
            config,
            global_cooldown: 0.0,
            retaliation_cooldown: 0.0,
            retaliation_target: None,
        }
    }

    /// Resolver constants.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Remaining global cooldown (ms).
    #[must_use]
    pub fn global_cooldown(&self) -> f32 {
        self.global_cooldown
    }

    /// Remaining retaliation cooldown (ms).
    #[must_use]
    pub fn retaliation_cooldown(&self) -> f32 {
        self.retaliation_cooldown
    }

    /// Whether a globally gated attack would be accepted now.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.global_cooldown <= 0.0
    }

    /// Advance both cooldowns.
    pub fn tick(&mut self, delta: f32) {
        let delta = numeric::non_negative(delta, 0.0, "resolver delta");
        self.global_cooldown = (self.global_cooldown - delta).max(0.0);
        self.retaliation_cooldown = (self.retaliation_cooldown - delta).max(0.0);
    }

    /// Defense mitigation: `max(1, damage - defense * effectiveness)`.
    #[must_use]
    pub fn mitigate(&self, damage: f32, defense: u32) -> f32 {
        (damage - defense as f32 * self.config.defense_effectiveness).max(1.0)
    }

    /// Resolve one hit and apply it to the defender.
    pub fn resolve(
        &self,
        attacker: &AttributeSet,
        defender: &mut AttributeSet,
        base_damage: f32,
        rng: &mut CombatRng,
    ) -> DamageResult {
        if defender.is_dead() {
            return DamageResult::not_performed();
        }

        let base = numeric::damage_amount(base_damage, "base damage") as f32;

        if rng.chance(defender.dodge_chance) {
            return DamageResult {
                was_dodged: true,
                performed: true,
                ..DamageResult::default()
            };
        }

        let was_blocked = rng.chance(defender.block_chance);
        let mut damage = if was_blocked {
            base * (1.0 - self.config.block_reduction)
        } else {
            base
        };

        damage = self.mitigate(damage, defender.defense);
        damage *= rng.variance(self.config.variance);

        let was_critical = rng.chance(attacker.crit_chance);
        if was_critical {
            damage *= attacker.crit_multiplier;
        }

        let amount = numeric::damage_amount(damage, "resolved damage");
        let amount_dealt = defender.apply_damage(amount as f32);

        DamageResult {
            amount_dealt,
            was_critical,
            was_dodged: false,
            was_blocked,
            performed: true,
            killed: defender.is_dead(),
        }
    }

    /// A creature attacks the player.
    ///
    /// Globally gated requests are rejected while the population cooldown
    /// runs. Any hit that removes health arms retaliation against the
    /// attacker.
    pub fn creature_attack(
        &mut self,
        request: &AttackRequest,
        attacker: &AttributeSet,
        player: &mut PlayerActor,
        rng: &mut CombatRng,
    ) -> DamageResult {
        if request.gate == CooldownGate::Global && !self.can_attack() {
            debug!(
                "attack by {} rejected, global cooldown {:.0}ms",
                request.attacker, self.global_cooldown
            );
            return DamageResult::not_performed();
        }

        let result = self.resolve(attacker, &mut player.attributes, request.base_damage, rng);
        if !result.performed {
            return result;
        }

        if request.gate != CooldownGate::Independent {
            self.global_cooldown = self.seed_cooldown(&request.pacing);
        }

        if result.amount_dealt > 0 {
            self.arm_retaliation(request.attacker);
        }

        debug!(
            "{} hit player for {} (crit: {}, dodged: {})",
            request.attacker, result.amount_dealt, result.was_critical, result.was_dodged
        );
        result
    }

    /// Global cooldown after a performed attack with the given pacing.
    #[must_use]
    pub fn seed_cooldown(&self, pacing: &AttackPacing) -> f32 {
        let base = numeric::positive(
            pacing.base_cooldown,
            self.config.default_attack_cooldown,
            "attack cooldown",
        );
        let speed = numeric::positive(pacing.attack_speed, 1.0, "attack speed");
        let boss = if pacing.is_boss {
            self.config.boss_cooldown_multiplier
        } else {
            1.0
        };

        (base / speed * boss).max(self.config.min_attack_cooldown)
    }

    /// Apply one status tick: defense mitigated, at least 1, never dodged.
    pub fn apply_status_damage(&self, defender: &mut AttributeSet, amount: u32) -> u32 {
        if defender.is_dead() || amount == 0 {
            return 0;
        }

        let mitigated = self.mitigate(amount as f32, defender.defense);
        let amount = numeric::damage_amount(mitigated, "status damage");
        defender.apply_damage(amount as f32)
    }

    /// Counter-attack `target` from now on.
    pub fn arm_retaliation(&mut self, target: EntityId) {
        if self.retaliation_target != Some(target) {
            debug!("retaliation armed against {}", target);
        }
        self.retaliation_target = Some(target);
    }

    /// Stop counter-attacking.
    pub fn disarm_retaliation(&mut self) {
        if let Some(target) = self.retaliation_target.take() {
            debug!("retaliation against {} disarmed", target);
        }
    }

    /// Current retaliation target.
    #[must_use]
    pub fn retaliation_target(&self) -> Option<EntityId> {
        self.retaliation_target
    }

    /// Attempt the player's counter-attack against `target`.
    ///
    /// Returns `None` when retaliation is not armed against `target` or the
    /// cooldown has not elapsed. Leaving range or a dead participant disarms.
    pub fn try_retaliate(
        &mut self,
        player: &PlayerActor,
        target: EntityId,
        target_attributes: &mut AttributeSet,
        distance: f32,
        rng: &mut CombatRng,
    ) -> Option<DamageResult> {
        if self.retaliation_target != Some(target) {
            return None;
        }

        let in_range = distance.is_finite() && distance <= self.config.retaliation_range;
        if !in_range || player.attributes.is_dead() || target_attributes.is_dead() {
            self.disarm_retaliation();
            return None;
        }

        if self.retaliation_cooldown > 0.0 {
            return None;
        }

        let result = self.resolve(
            &player.attributes,
            target_attributes,
            player.attributes.damage as f32,
            rng,
        );
        self.retaliation_cooldown = self.config.retaliation_cooldown;

        if result.killed {
            self.disarm_retaliation();
        }
        Some(result)
    }
}
