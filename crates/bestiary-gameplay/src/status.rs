//! Timed status effects (damage over time and movement impairment).
//!
//! This module provides:
//! - Status kinds (poison, burn, frozen, stunned, pinned)
//! - Per-actor effect table with one entry per kind
//! - Stack rules: stronger replaces, equal extends, weaker is discarded
//! - Deterministic ticking driven by `delta` with overshoot carry-over

use bestiary_common::{numeric, EntityId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Smallest tick interval accepted, in milliseconds.
pub const MIN_TICK_INTERVAL: f32 = 1.0;

/// Types of status effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// Damage over time.
    Poison,
    /// Damage over time.
    Burn,
    /// Cannot move or act.
    Frozen,
    /// Cannot move or act.
    Stunned,
    /// Cannot move, can still act.
    Pinned,
}

impl StatusKind {
    /// Whether this effect stops movement.
    #[must_use]
    pub const fn immobilizes(self) -> bool {
        matches!(self, Self::Frozen | Self::Stunned | Self::Pinned)
    }

    /// Whether this effect prevents acting (state handlers are skipped).
    #[must_use]
    pub const fn incapacitates(self) -> bool {
        matches!(self, Self::Frozen | Self::Stunned)
    }

    /// Get display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Poison => "Poison",
            Self::Burn => "Burn",
            Self::Frozen => "Frozen",
            Self::Stunned => "Stunned",
            Self::Pinned => "Pinned",
        }
    }
}

/// An active status effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Effect type.
    pub kind: StatusKind,
    /// Damage dealt on every tick (before mitigation).
    pub damage_per_tick: u32,
    /// Duration the effect was applied with.
    pub total_duration: f32,
    /// Time between ticks.
    pub tick_interval: f32,
    /// Time left before expiry.
    pub remaining: f32,
    /// Time accumulated toward the next tick.
    pub since_last_tick: f32,
    /// Who applied the effect. Attribution only.
    pub source: Option<EntityId>,
}

impl StatusEffect {
    /// Create a new effect with full remaining duration.
    #[must_use]
    pub fn new(
        kind: StatusKind,
        damage_per_tick: u32,
        total_duration: f32,
        tick_interval: f32,
        source: Option<EntityId>,
    ) -> Self {
        let total_duration = numeric::non_negative(total_duration, 0.0, "status duration");
        Self {
            kind,
            damage_per_tick,
            total_duration,
            tick_interval: numeric::positive(tick_interval, 1000.0, "status tick interval")
                .max(MIN_TICK_INTERVAL),
            remaining: total_duration,
            since_last_tick: 0.0,
            source,
        }
    }

    /// Check if expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Total damage still to come if nothing else changes.
    #[must_use]
    pub fn remaining_damage(&self) -> u32 {
        let ticks = ((self.since_last_tick + self.remaining) / self.tick_interval).floor() as u32;
        ticks.saturating_mul(self.damage_per_tick)
    }
}

/// What happened when an effect was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyOutcome {
    /// No effect of this kind was active.
    Inserted,
    /// The new effect was stronger and replaced the old one.
    Replaced,
    /// Same strength: duration extended to the longer of the two.
    Extended,
    /// The new effect was weaker and ignored.
    Discarded,
}

/// Something that happened to an effect during [`StatusEffectTable::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEvent {
    /// One interval elapsed; `damage` is owed to the owner before mitigation.
    Tick {
        /// Effect type.
        kind: StatusKind,
        /// Damage before mitigation.
        damage: u32,
        /// Who applied the effect.
        source: Option<EntityId>,
    },
    /// The effect ran out and was removed.
    Expired {
        /// Effect type.
        kind: StatusKind,
    },
}

/// Per-actor collection of active status effects.
///
/// Effects are kept in application order and tick in that order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectTable {
    effects: Vec<StatusEffect>,
}

impl StatusEffectTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an effect, following the stacking rules.
    pub fn apply(
        &mut self,
        kind: StatusKind,
        damage_per_tick: u32,
        total_duration: f32,
        tick_interval: f32,
        source: Option<EntityId>,
    ) -> ApplyOutcome {
        let incoming =
            StatusEffect::new(kind, damage_per_tick, total_duration, tick_interval, source);

        let outcome = match self.effects.iter_mut().find(|e| e.kind == kind) {
            None => {
                self.effects.push(incoming);
                ApplyOutcome::Inserted
            },
            Some(existing) if incoming.damage_per_tick > existing.damage_per_tick => {
                *existing = incoming;
                ApplyOutcome::Replaced
            },
            Some(existing) if incoming.damage_per_tick == existing.damage_per_tick => {
                existing.remaining = existing.remaining.max(incoming.remaining);
                existing.source = incoming.source.or(existing.source);
                ApplyOutcome::Extended
            },
            Some(_) => ApplyOutcome::Discarded,
        };

        debug!("status {} applied: {:?}", kind.display_name(), outcome);
        outcome
    }

    /// Advance all effects by `delta` milliseconds.
    ///
    /// Only the part of `delta` that falls inside an effect's remaining
    /// lifetime counts toward its ticks, so a tick boundary landing exactly
    /// on expiry still fires and nothing fires after it.
    pub fn update(&mut self, delta: f32) -> Vec<StatusEvent> {
        let delta = numeric::non_negative(delta, 0.0, "status delta");
        let mut events = Vec::new();

        for effect in &mut self.effects {
            let active = delta.min(effect.remaining.max(0.0));
            effect.since_last_tick += active;
            effect.remaining -= delta;

            while effect.since_last_tick >= effect.tick_interval {
                effect.since_last_tick -= effect.tick_interval;
                if effect.damage_per_tick > 0 {
                    events.push(StatusEvent::Tick {
                        kind: effect.kind,
                        damage: effect.damage_per_tick,
                        source: effect.source,
                    });
                }
            }
        }

        self.effects.retain(|effect| {
            if effect.is_expired() {
                events.push(StatusEvent::Expired { kind: effect.kind });
                false
            } else {
                true
            }
        });

        events
    }

    /// Remove an effect by kind.
    pub fn remove(&mut self, kind: StatusKind) -> Option<StatusEffect> {
        let index = self.effects.iter().position(|e| e.kind == kind)?;
        Some(self.effects.remove(index))
    }

    /// Remove every effect.
    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Get the active effect of a kind.
    #[must_use]
    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    /// Check if an effect of this kind is active.
    #[must_use]
    pub fn has(&self, kind: StatusKind) -> bool {
        self.get(kind).is_some()
    }

    /// Whether any active effect stops movement.
    #[must_use]
    pub fn is_immobilized(&self) -> bool {
        self.effects.iter().any(|e| e.kind.immobilizes())
    }

    /// Whether any active effect prevents acting.
    #[must_use]
    pub fn is_incapacitated(&self) -> bool {
        self.effects.iter().any(|e| e.kind.incapacitates())
    }

    /// Iterate active effects in application order.
    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tick_damage(events: &[StatusEvent]) -> u32 {
        events
            .iter()
            .map(|e| match e {
                StatusEvent::Tick { damage, .. } => *damage,
                StatusEvent::Expired { .. } => 0,
            })
            .sum()
    }

    #[test]
    fn test_apply_inserts() {
        let mut table = StatusEffectTable::new();
        let outcome = table.apply(StatusKind::Poison, 3, 5000.0, 1000.0, None);
        assert_eq!(outcome, ApplyOutcome::Inserted);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_weaker_is_discarded() {
        let mut table = StatusEffectTable::new();
        table.apply(StatusKind::Poison, 3, 5000.0, 1000.0, None);
        let outcome = table.apply(StatusKind::Poison, 2, 9000.0, 1000.0, None);

        assert_eq!(outcome, ApplyOutcome::Discarded);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(StatusKind::Poison).map(|e| e.damage_per_tick), Some(3));
    }

    #[test]
    fn test_equal_extends() {
        let mut table = StatusEffectTable::new();
        table.apply(StatusKind::Poison, 3, 5000.0, 1000.0, None);
        table.update(3000.0);
        let outcome = table.apply(StatusKind::Poison, 3, 4000.0, 1000.0, None);

        assert_eq!(outcome, ApplyOutcome::Extended);
        assert_eq!(table.len(), 1);
        let remaining = table.get(StatusKind::Poison).map(|e| e.remaining);
        assert_eq!(remaining, Some(4000.0));
    }

    #[test]
    fn test_equal_shorter_keeps_longer() {
        let mut table = StatusEffectTable::new();
        table.apply(StatusKind::Burn, 2, 5000.0, 1000.0, None);
        table.apply(StatusKind::Burn, 2, 1000.0, 1000.0, None);
        assert_eq!(table.get(StatusKind::Burn).map(|e| e.remaining), Some(5000.0));
    }

    #[test]
    fn test_stronger_replaces() {
        let mut table = StatusEffectTable::new();
        let source = EntityId::from_raw(42);
        table.apply(StatusKind::Burn, 1, 5000.0, 500.0, None);
        table.update(250.0);
        let outcome = table.apply(StatusKind::Burn, 4, 2000.0, 1000.0, Some(source));

        assert_eq!(outcome, ApplyOutcome::Replaced);
        let effect = table.get(StatusKind::Burn).cloned();
        let effect = effect.expect("burn active");
        assert_eq!(effect.damage_per_tick, 4);
        assert_eq!(effect.remaining, 2000.0);
        assert_eq!(effect.since_last_tick, 0.0);
        assert_eq!(effect.source, Some(source));
    }

    #[test]
    fn test_poison_total_damage() {
        let mut table = StatusEffectTable::new();
        table.apply(StatusKind::Poison, 2, 5000.0, 1000.0, None);

        let mut total = 0;
        for _ in 0..5 {
            total += tick_damage(&table.update(1000.0));
        }

        assert_eq!(total, 10);
        assert!(!table.has(StatusKind::Poison));
    }

    #[test]
    fn test_overshoot_carried() {
        let mut table = StatusEffectTable::new();
        table.apply(StatusKind::Burn, 1, 10_000.0, 1000.0, None);

        assert_eq!(tick_damage(&table.update(1500.0)), 1);
        // 500 carried over, so 500 more reaches the next tick
        assert_eq!(tick_damage(&table.update(500.0)), 1);
        assert_eq!(tick_damage(&table.update(999.0)), 0);
    }

    #[test]
    fn test_large_delta_emits_each_tick_within_lifetime() {
        let mut table = StatusEffectTable::new();
        table.apply(StatusKind::Poison, 2, 3000.0, 1000.0, None);

        let events = table.update(10_000.0);
        assert_eq!(tick_damage(&events), 6);
        assert!(events.contains(&StatusEvent::Expired {
            kind: StatusKind::Poison
        }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_no_damage_after_expiry() {
        let mut table = StatusEffectTable::new();
        table.apply(StatusKind::Poison, 2, 1500.0, 1000.0, None);

        assert_eq!(tick_damage(&table.update(1000.0)), 2);
        // Expires at 1500; the boundary at 2000 is past the lifetime.
        assert_eq!(tick_damage(&table.update(1000.0)), 0);
        assert!(table.is_empty());
        assert!(table.update(1000.0).is_empty());
    }

    #[test]
    fn test_kinds_tick_independently() {
        let mut table = StatusEffectTable::new();
        table.apply(StatusKind::Poison, 2, 5000.0, 1000.0, None);
        table.apply(StatusKind::Burn, 5, 5000.0, 500.0, None);

        let events = table.update(1000.0);
        let poison = events
            .iter()
            .filter(|e| matches!(e, StatusEvent::Tick { kind: StatusKind::Poison, .. }))
            .count();
        let burn = events
            .iter()
            .filter(|e| matches!(e, StatusEvent::Tick { kind: StatusKind::Burn, .. }))
            .count();
        assert_eq!(poison, 1);
        assert_eq!(burn, 2);
    }

    #[test]
    fn test_impairing_kinds() {
        let mut table = StatusEffectTable::new();
        assert!(!table.is_immobilized());

        table.apply(StatusKind::Pinned, 0, 2000.0, 1000.0, None);
        assert!(table.is_immobilized());
        assert!(!table.is_incapacitated());

        table.apply(StatusKind::Stunned, 0, 2000.0, 1000.0, None);
        assert!(table.is_incapacitated());

        assert!(table.remove(StatusKind::Stunned).is_some());
        assert!(table.remove(StatusKind::Stunned).is_none());
        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn test_zero_damage_effects_emit_no_ticks() {
        let mut table = StatusEffectTable::new();
        table.apply(StatusKind::Frozen, 0, 3000.0, 1000.0, None);
        let events = table.update(2000.0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_invalid_interval_sanitized() {
        let effect = StatusEffect::new(StatusKind::Burn, 1, 1000.0, f32::NAN, None);
        assert_eq!(effect.tick_interval, 1000.0);
        let effect = StatusEffect::new(StatusKind::Burn, 1, 1000.0, 0.0001, None);
        assert_eq!(effect.tick_interval, MIN_TICK_INTERVAL);
    }

    proptest! {
        #[test]
        fn prop_one_entry_per_kind(applications in prop::collection::vec((0u32..6, 100.0f32..10_000.0), 1..20)) {
            let mut table = StatusEffectTable::new();
            let mut strongest = 0;
            for (damage, duration) in applications {
                table.apply(StatusKind::Poison, damage, duration, 1000.0, None);
                strongest = strongest.max(damage);
            }
            prop_assert_eq!(table.len(), 1);
            prop_assert_eq!(table.get(StatusKind::Poison).map(|e| e.damage_per_tick), Some(strongest));
        }
    }
}
