//! Creature and player attribute sets.
//!
//! This module provides:
//! - Integer health with clamping on every mutation
//! - Damage, defense and speed stats
//! - Crit, dodge and block chances used by the combat resolver
//! - Optional behavior trigger radii (detection, aggro, flee, return)

use bestiary_common::numeric;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Fallback movement speed when a configured speed is unusable.
pub const DEFAULT_SPEED: f32 = 1.0;

/// Default critical hit chance.
pub const DEFAULT_CRIT_CHANCE: f32 = 0.05;

/// Default critical hit damage multiplier.
pub const DEFAULT_CRIT_MULTIPLIER: f32 = 2.0;

/// Numeric attributes of a combatant.
///
/// Health is private: it only changes through [`AttributeSet::apply_damage`]
/// and [`AttributeSet::heal`], which keep `0 <= health <= max_health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    health: u32,
    max_health: u32,
    /// Base damage per attack.
    pub damage: u32,
    /// Flat defense subtracted (scaled) from incoming hits.
    pub defense: u32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Critical hit chance (0.0-1.0).
    pub crit_chance: f32,
    /// Critical hit damage multiplier.
    pub crit_multiplier: f32,
    /// Chance to dodge an incoming hit entirely (0.0-1.0).
    pub dodge_chance: f32,
    /// Chance to block part of an incoming hit (0.0-1.0).
    pub block_chance: f32,
    /// Distance at which the target is noticed.
    pub detection_radius: Option<f32>,
    /// Distance at which a neutral creature turns hostile.
    pub aggro_radius: Option<f32>,
    /// Distance a fleeing creature wants between itself and the threat.
    pub flee_radius: Option<f32>,
    /// Maximum distance from spawn before giving up a chase.
    pub return_radius: Option<f32>,
}

impl AttributeSet {
    /// Creates an attribute set at full health.
    #[must_use]
    pub fn new(max_health: u32, damage: u32, defense: u32, speed: f32) -> Self {
        let max_health = if max_health == 0 {
            warn!("max_health of 0 is not allowed, using 1");
            1
        } else {
            max_health
        };

        Self {
            health: max_health,
            max_health,
            damage,
            defense,
            speed: numeric::positive(speed, DEFAULT_SPEED, "speed"),
            crit_chance: DEFAULT_CRIT_CHANCE,
            crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
            dodge_chance: 0.0,
            block_chance: 0.0,
            detection_radius: None,
            aggro_radius: None,
            flee_radius: None,
            return_radius: None,
        }
    }

    /// Sets crit chance and multiplier.
    #[must_use]
    pub fn with_crit(mut self, chance: f32, multiplier: f32) -> Self {
        self.crit_chance = numeric::probability(chance, DEFAULT_CRIT_CHANCE, "crit_chance");
        self.crit_multiplier =
            numeric::positive(multiplier, DEFAULT_CRIT_MULTIPLIER, "crit_multiplier");
        self
    }

    /// Sets dodge chance.
    #[must_use]
    pub fn with_dodge(mut self, chance: f32) -> Self {
        self.dodge_chance = numeric::probability(chance, 0.0, "dodge_chance");
        self
    }

    /// Sets block chance.
    #[must_use]
    pub fn with_block(mut self, chance: f32) -> Self {
        self.block_chance = numeric::probability(chance, 0.0, "block_chance");
        self
    }

    /// Sets detection radius.
    #[must_use]
    pub fn with_detection_radius(mut self, radius: f32) -> Self {
        self.detection_radius = sanitize_radius(radius, "detection_radius");
        self
    }

    /// Sets aggro radius.
    #[must_use]
    pub fn with_aggro_radius(mut self, radius: f32) -> Self {
        self.aggro_radius = sanitize_radius(radius, "aggro_radius");
        self
    }

    /// Sets flee radius.
    #[must_use]
    pub fn with_flee_radius(mut self, radius: f32) -> Self {
        self.flee_radius = sanitize_radius(radius, "flee_radius");
        self
    }

    /// Sets return radius.
    #[must_use]
    pub fn with_return_radius(mut self, radius: f32) -> Self {
        self.return_radius = sanitize_radius(radius, "return_radius");
        self
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Returns whether health has reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Returns health as a fraction of max health (0.0 to 1.0).
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            (self.health as f32 / self.max_health as f32).clamp(0.0, 1.0)
        }
    }

    /// Subtracts already-mitigated damage and returns the amount removed.
    ///
    /// Invalid amounts (NaN, infinite, negative) count as zero. The amount is
    /// floored to whole health points and never removes more than the
    /// remaining health.
    pub fn apply_damage(&mut self, raw_amount: f32) -> u32 {
        let amount = numeric::non_negative(raw_amount, numeric::HEALTH_FALLBACK, "damage");
        if self.is_dead() {
            return 0;
        }

        let amount = (amount.floor() as u32).min(self.health);
        self.health -= amount;
        amount
    }

    /// Restores health up to max health. Dead actors cannot be healed.
    pub fn heal(&mut self, amount: f32) {
        let amount = numeric::non_negative(amount, numeric::HEALTH_FALLBACK, "heal");
        if self.is_dead() {
            return;
        }

        let restored = self.health.saturating_add(amount.floor() as u32);
        self.health = restored.min(self.max_health);
    }
}

fn sanitize_radius(radius: f32, context: &str) -> Option<f32> {
    if radius.is_finite() && radius >= 0.0 {
        Some(radius)
    } else {
        warn!("invalid {context} {radius}, leaving it unset");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_starts_full() {
        let attrs = AttributeSet::new(40, 5, 2, 80.0);
        assert_eq!(attrs.health(), 40);
        assert_eq!(attrs.max_health(), 40);
        assert!(!attrs.is_dead());
        assert_eq!(attrs.health_fraction(), 1.0);
    }

    #[test]
    fn test_zero_max_health_clamped() {
        let attrs = AttributeSet::new(0, 5, 0, 10.0);
        assert_eq!(attrs.max_health(), 1);
    }

    #[test]
    fn test_invalid_speed_substituted() {
        let attrs = AttributeSet::new(10, 1, 0, f32::NAN);
        assert_eq!(attrs.speed, DEFAULT_SPEED);
    }

    #[test]
    fn test_apply_damage_returns_dealt() {
        let mut attrs = AttributeSet::new(20, 0, 0, 1.0);
        assert_eq!(attrs.apply_damage(7.9), 7);
        assert_eq!(attrs.health(), 13);
    }

    #[test]
    fn test_apply_damage_clamps_at_zero() {
        let mut attrs = AttributeSet::new(10, 0, 0, 1.0);
        assert_eq!(attrs.apply_damage(25.0), 10);
        assert!(attrs.is_dead());
        assert_eq!(attrs.apply_damage(5.0), 0);
    }

    #[test]
    fn test_apply_damage_invalid_is_zero() {
        let mut attrs = AttributeSet::new(10, 0, 0, 1.0);
        assert_eq!(attrs.apply_damage(f32::NAN), 0);
        assert_eq!(attrs.apply_damage(-4.0), 0);
        assert_eq!(attrs.apply_damage(f32::NEG_INFINITY), 0);
        assert_eq!(attrs.health(), 10);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut attrs = AttributeSet::new(30, 0, 0, 1.0);
        attrs.apply_damage(20.0);
        attrs.heal(5.0);
        assert_eq!(attrs.health(), 15);
        attrs.heal(100.0);
        assert_eq!(attrs.health(), 30);
    }

    #[test]
    fn test_heal_dead_noop() {
        let mut attrs = AttributeSet::new(5, 0, 0, 1.0);
        attrs.apply_damage(5.0);
        attrs.heal(3.0);
        assert!(attrs.is_dead());
    }

    #[test]
    fn test_radius_builders() {
        let attrs = AttributeSet::new(10, 1, 0, 1.0)
            .with_detection_radius(200.0)
            .with_return_radius(f32::NAN);
        assert_eq!(attrs.detection_radius, Some(200.0));
        assert_eq!(attrs.return_radius, None);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Damage(f32),
        Heal(f32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let amount = prop_oneof![
            -50.0f32..500.0,
            Just(f32::NAN),
            Just(f32::INFINITY),
            Just(f32::NEG_INFINITY),
        ];
        prop_oneof![
            amount.clone().prop_map(Op::Damage),
            amount.prop_map(Op::Heal),
        ]
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_bounds(max in 1u32..1000, ops in prop::collection::vec(op_strategy(), 0..64)) {
            let mut attrs = AttributeSet::new(max, 1, 0, 1.0);
            for op in ops {
                match op {
                    Op::Damage(amount) => { attrs.apply_damage(amount); },
                    Op::Heal(amount) => attrs.heal(amount),
                }
                prop_assert!(attrs.health() <= attrs.max_health());
            }
        }
    }
}
