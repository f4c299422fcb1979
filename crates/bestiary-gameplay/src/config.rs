//! Tunable engine constants.
//!
//! Provides the resolver constants ([`CombatConfig`]) and the shared state
//! machine constants ([`BehaviorConfig`]). Both deserialize with defaults for
//! missing fields and are clamped to sensible ranges by `validate`.

use bestiary_common::{BestiaryError, BestiaryResult};
use serde::{Deserialize, Serialize};

/// Combat resolution constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Damage removed per point of defense.
    pub defense_effectiveness: f32,
    /// Uniform damage variance (0.15 = ±15%).
    pub variance: f32,
    /// Fraction of damage removed by a successful block.
    pub block_reduction: f32,
    /// Creature attack cooldown used when a species does not set one (ms).
    pub default_attack_cooldown: f32,
    /// Floor for the population attack cooldown (ms).
    pub min_attack_cooldown: f32,
    /// Cooldown multiplier for boss attackers.
    pub boss_cooldown_multiplier: f32,
    /// Maximum distance at which the player counter-attacks.
    pub retaliation_range: f32,
    /// Time between player counter-attacks (ms).
    pub retaliation_cooldown: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            defense_effectiveness: 0.5,
            variance: 0.15,
            block_reduction: 0.5,
            default_attack_cooldown: 1500.0,
            min_attack_cooldown: 300.0,
            boss_cooldown_multiplier: 0.8,
            retaliation_range: 60.0,
            retaliation_cooldown: 800.0,
        }
    }
}

impl CombatConfig {
    /// Clamp values to sensible ranges, replacing non-finite ones with defaults.
    pub fn validate(&mut self) {
        let defaults = Self::default();

        self.defense_effectiveness =
            finite_or(self.defense_effectiveness, defaults.defense_effectiveness).clamp(0.0, 10.0);
        self.variance = finite_or(self.variance, defaults.variance).clamp(0.0, 0.9);
        self.block_reduction =
            finite_or(self.block_reduction, defaults.block_reduction).clamp(0.0, 1.0);
        self.default_attack_cooldown =
            finite_or(self.default_attack_cooldown, defaults.default_attack_cooldown)
                .clamp(1.0, 60_000.0);
        self.min_attack_cooldown =
            finite_or(self.min_attack_cooldown, defaults.min_attack_cooldown).clamp(1.0, 60_000.0);
        self.boss_cooldown_multiplier =
            finite_or(self.boss_cooldown_multiplier, defaults.boss_cooldown_multiplier)
                .clamp(0.1, 10.0);
        self.retaliation_range =
            finite_or(self.retaliation_range, defaults.retaliation_range).max(0.0);
        self.retaliation_cooldown =
            finite_or(self.retaliation_cooldown, defaults.retaliation_cooldown).max(0.0);
    }
}

/// State machine constants shared by every profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Distance under which a destination counts as reached.
    pub arrival_distance: f32,
    /// Radius around the spawn point for wander destinations.
    pub wander_radius: f32,
    /// Give up a wander leg after this long (ms).
    pub wander_timeout: f32,
    /// Time spent idle before wandering (ms).
    pub idle_duration: f32,
    /// Speed multiplier while fleeing.
    pub flee_speed_multiplier: f32,
    /// Flee distance when neither flee nor detection radius is set.
    pub default_flee_radius: f32,
    /// Delay between death and removal from the simulation (ms).
    pub death_delay: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            arrival_distance: 10.0,
            wander_radius: 100.0,
            wander_timeout: 5000.0,
            idle_duration: 2000.0,
            flee_speed_multiplier: 1.5,
            default_flee_radius: 300.0,
            death_delay: 1000.0,
        }
    }
}

impl BehaviorConfig {
    /// Clamp values to sensible ranges, replacing non-finite ones with defaults.
    pub fn validate(&mut self) {
        let defaults = Self::default();

        self.arrival_distance =
            finite_or(self.arrival_distance, defaults.arrival_distance).max(0.1);
        self.wander_radius = finite_or(self.wander_radius, defaults.wander_radius).max(0.0);
        self.wander_timeout = finite_or(self.wander_timeout, defaults.wander_timeout).max(1.0);
        self.idle_duration = finite_or(self.idle_duration, defaults.idle_duration).max(0.0);
        self.flee_speed_multiplier =
            finite_or(self.flee_speed_multiplier, defaults.flee_speed_multiplier).clamp(0.1, 10.0);
        self.default_flee_radius =
            finite_or(self.default_flee_radius, defaults.default_flee_radius).max(0.0);
        self.death_delay = finite_or(self.death_delay, defaults.death_delay).max(0.0);
    }
}

/// Both engine sections, as they appear in a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    /// Resolver constants.
    pub combat: CombatConfig,
    /// State machine constants.
    pub behavior: BehaviorConfig,
}

impl EngineTuning {
    /// Parse from TOML and validate.
    pub fn from_toml_str(content: &str) -> BestiaryResult<Self> {
        let mut tuning: Self =
            toml::from_str(content).map_err(|e| BestiaryError::Serialization(e.to_string()))?;
        tuning.validate();
        Ok(tuning)
    }

    /// Validate both sections.
    pub fn validate(&mut self) {
        self.combat.validate();
        self.behavior.validate();
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        tracing::warn!("non-finite config value {value}, using {fallback}");
        fallback
    }
}
