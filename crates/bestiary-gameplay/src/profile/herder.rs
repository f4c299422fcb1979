//! Herd animals: flee on sight, rage when cornered.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::behavior::{Behavior, Frame, TickContext};
use crate::combat::DamageResult;
use crate::creature::CreatureCore;
use crate::state::BehaviorState;
use super::{check_tunables, Bound};

/// Herder tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HerderTuning {
    /// Below this health fraction a hit may send the herder running.
    pub low_health_fraction: f32,
    /// Chance to flee when hit at low health.
    pub flee_chance: f32,
    /// Rage duration (ms).
    pub rage_duration: f32,
    /// Speed multiplier while raging.
    pub rage_speed_multiplier: f32,
}

impl Default for HerderTuning {
    fn default() -> Self {
        Self {
            low_health_fraction: 0.3,
            flee_chance: 0.8,
            rage_duration: 5000.0,
            rage_speed_multiplier: 1.3,
        }
    }
}

impl HerderTuning {
    /// Checks every tunable is finite and in range.
    pub fn validate(&self) -> Result<(), String> {
        check_tunables(&[
            ("low_health_fraction", self.low_health_fraction, Bound::Fraction),
            ("flee_chance", self.flee_chance, Bound::Fraction),
            ("rage_duration", self.rage_duration, Bound::Positive),
            ("rage_speed_multiplier", self.rage_speed_multiplier, Bound::Positive),
        ])
    }
}

/// Runtime state of a herder.
#[derive(Debug, Clone, PartialEq)]
pub struct Herder {
    tuning: HerderTuning,
    rage_remaining: f32,
}

impl Herder {
    /// Create a calm herder.
    #[must_use]
    pub fn new(tuning: HerderTuning) -> Self {
        Self {
            tuning,
            rage_remaining: 0.0,
        }
    }

    /// Rage time left (ms).
    #[must_use]
    pub fn rage_remaining(&self) -> f32 {
        self.rage_remaining
    }
}

impl Behavior for Herder {
    fn on_tick(&mut self, core: &mut CreatureCore, cx: &mut TickContext<'_>, frame: Frame) {
        if self.rage_remaining <= 0.0 {
            return;
        }

        self.rage_remaining -= frame.delta;
        if self.rage_remaining <= 0.0 {
            self.rage_remaining = 0.0;
            debug!("{} rage over", core.id());
            core.calm_down();
            core.change_state(cx, BehaviorState::Returning, frame.now);
        }
    }

    fn speed_multiplier(&self) -> f32 {
        if self.is_enraged() {
            self.tuning.rage_speed_multiplier
        } else {
            1.0
        }
    }

    fn flees(&self) -> bool {
        !self.is_enraged()
    }

    fn is_enraged(&self) -> bool {
        self.rage_remaining > 0.0
    }

    fn on_target_detected(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) -> bool {
        core.change_state(cx, BehaviorState::Fleeing, frame.now)
    }

    fn handle_attacking(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) {
        if frame.distance <= core.attack_range() {
            core.melee(cx, frame);
            if self.is_enraged() {
                let heading = cx.rng.direction();
                let velocity = heading * core.attributes.speed * self.speed_multiplier();
                core.set_velocity(cx, velocity);
            } else {
                core.stop(cx);
            }
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
        let low = core.attributes.health_fraction() < self.tuning.low_health_fraction;
        if low && cx.rng.chance(self.tuning.flee_chance) {
            self.rage_remaining = 0.0;
            core.react_to_damage(cx, BehaviorState::Fleeing, frame.now);
            return;
        }

        if !self.is_enraged() {
            debug!("{} enters rage", core.id());
        }
        self.rage_remaining = self.tuning.rage_duration;
        core.react_to_damage(cx, BehaviorState::Chasing, frame.now);
    }

    fn on_death(&mut self) {
        self.rage_remaining = 0.0;
    }
}
