//! Brutes: enrage when hurt, smash with a long reach.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::behavior::{Behavior, Frame, TickContext};
use crate::combat::{CooldownGate, DamageResult};
use crate::creature::CreatureCore;
use crate::events::AttackKind;
use crate::state::BehaviorState;
use super::{check_tunables, Bound};

/// Brute tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BruteTuning {
    /// Enrages when hit below this health fraction.
    pub enrage_health_fraction: f32,
    /// Speed multiplier while enraged.
    pub enrage_speed_multiplier: f32,
    /// Enrage duration (ms).
    pub enrage_duration: f32,
    /// Smash cooldown (ms).
    pub smash_cooldown: f32,
    /// Chance to smash when not enraged.
    pub smash_chance: f32,
    /// Smash damage multiplier inside attack range.
    pub smash_multiplier: f32,
    /// Smash reach as a multiple of attack range.
    pub smash_reach: f32,
}

impl Default for BruteTuning {
    fn default() -> Self {
        Self {
            enrage_health_fraction: 0.5,
            enrage_speed_multiplier: 1.2,
            enrage_duration: 6000.0,
            smash_cooldown: 5000.0,
            smash_chance: 0.3,
            smash_multiplier: 2.0,
            smash_reach: 1.5,
        }
    }
}

impl BruteTuning {
    /// Checks every tunable is finite and in range.
    pub fn validate(&self) -> Result<(), String> {
        check_tunables(&[
            ("enrage_health_fraction", self.enrage_health_fraction, Bound::Fraction),
            ("enrage_speed_multiplier", self.enrage_speed_multiplier, Bound::Positive),
            ("enrage_duration", self.enrage_duration, Bound::Positive),
            ("smash_cooldown", self.smash_cooldown, Bound::Positive),
            ("smash_chance", self.smash_chance, Bound::Fraction),
            ("smash_multiplier", self.smash_multiplier, Bound::Positive),
            ("smash_reach", self.smash_reach, Bound::Positive),
        ])
    }
}

/// Runtime state of a brute.
#[derive(Debug, Clone, PartialEq)]
pub struct Brute {
    tuning: BruteTuning,
    enrage_remaining: f32,
    smash_cooldown: f32,
    smash_roll: Option<bool>,
}

impl Brute {
    /// Create a calm brute with smash ready.
    #[must_use]
    pub fn new(tuning: BruteTuning) -> Self {
        Self {
            tuning,
            enrage_remaining: 0.0,
            smash_cooldown: 0.0,
            smash_roll: None,
        }
    }

    /// Whether the smash is off cooldown.
    #[must_use]
    pub fn smash_ready(&self) -> bool {
        self.smash_cooldown <= 0.0
    }

    fn smash_reach(&self, core: &CreatureCore) -> f32 {
        core.attack_range() * self.tuning.smash_reach
    }

    /// Whether the next attack is a smash. Rolled once per approach.
    fn smash_decision(&mut self, cx: &mut TickContext<'_>) -> bool {
        if self.is_enraged() {
            return true;
        }
        let chance = self.tuning.smash_chance;
        *self.smash_roll.get_or_insert_with(|| cx.rng.chance(chance))
    }
}

impl Behavior for Brute {
    fn on_tick(&mut self, _core: &mut CreatureCore, _cx: &mut TickContext<'_>, frame: Frame) {
        self.enrage_remaining = (self.enrage_remaining - frame.delta).max(0.0);
        self.smash_cooldown = (self.smash_cooldown - frame.delta).max(0.0);
    }

    fn speed_multiplier(&self) -> f32 {
        if self.is_enraged() {
            self.tuning.enrage_speed_multiplier
        } else {
            1.0
        }
    }

    fn is_enraged(&self) -> bool {
        self.enrage_remaining > 0.0
    }

    fn handle_chasing(&mut self, core: &mut CreatureCore, cx: &mut TickContext<'_>, frame: Frame) {
        let in_reach = frame.distance <= self.smash_reach(core);
        if !in_reach || !self.smash_ready() {
            self.smash_roll = None;
        }

        if in_reach
            && self.smash_ready()
            && !cx.target.attributes.is_dead()
            && self.smash_decision(cx)
        {
            core.stop(cx);
            core.change_state(cx, BehaviorState::Attacking, frame.now);
            return;
        }
        core.chase_tick(cx, frame, self.speed_multiplier());
    }

    fn handle_attacking(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) {
        let in_range = frame.distance <= core.attack_range();
        let in_reach = frame.distance <= self.smash_reach(core);

        if in_reach {
            core.stop(cx);
        }

        let smash = in_reach && self.smash_ready() && self.smash_decision(cx);
        self.smash_roll = None;

        if smash {
            let multiplier = if in_range {
                self.tuning.smash_multiplier
            } else {
                1.0
            };
            let result = core.attack(
                cx,
                frame.now,
                multiplier,
                CooldownGate::Independent,
                AttackKind::Smash,
            );
            if result.performed {
                self.smash_cooldown = self.tuning.smash_cooldown;
            }
        } else if in_range {
            core.melee(cx, frame);
        }

        core.change_state(cx, BehaviorState::Chasing, frame.now);
    }

    fn on_damaged(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
        _result: &DamageResult,
    ) {
        if !self.is_enraged()
            && core.attributes.health_fraction() < self.tuning.enrage_health_fraction
        {
            debug!("{} is enraged", core.id());
            self.enrage_remaining = self.tuning.enrage_duration;
        }
        core.react_to_damage(cx, BehaviorState::Chasing, frame.now);
    }

    fn on_death(&mut self) {
        self.enrage_remaining = 0.0;
        self.smash_roll = None;
    }
}
