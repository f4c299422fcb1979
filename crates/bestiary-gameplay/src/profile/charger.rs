//! Territorial chargers: rush the spot where the player stood.

use bestiary_common::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::behavior::{Behavior, Frame, TickContext};
use crate::combat::DamageResult;
use crate::creature::CreatureCore;
use crate::state::BehaviorState;
use super::{check_tunables, Bound};

/// Charger tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargerTuning {
    /// Chance to open with a charge on detection.
    pub detect_charge_chance: f32,
    /// Chance to charge when hit.
    pub damage_charge_chance: f32,
    /// Enrage duration after being hit (ms).
    pub enrage_duration: f32,
    /// Speed multiplier while enraged.
    pub enrage_speed_multiplier: f32,
    /// Speed multiplier during a charge.
    pub charge_speed_multiplier: f32,
    /// Distance at which the charge point counts as reached.
    pub charge_arrival_distance: f32,
}

impl Default for ChargerTuning {
    fn default() -> Self {
        Self {
            detect_charge_chance: 0.6,
            damage_charge_chance: 0.5,
            enrage_duration: 4000.0,
            enrage_speed_multiplier: 1.3,
            charge_speed_multiplier: 1.8,
            charge_arrival_distance: 10.0,
        }
    }
}

impl ChargerTuning {
    /// Checks every tunable is finite and in range.
    pub fn validate(&self) -> Result<(), String> {
        check_tunables(&[
            ("detect_charge_chance", self.detect_charge_chance, Bound::Fraction),
            ("damage_charge_chance", self.damage_charge_chance, Bound::Fraction),
            ("enrage_duration", self.enrage_duration, Bound::Positive),
            ("enrage_speed_multiplier", self.enrage_speed_multiplier, Bound::Positive),
            ("charge_speed_multiplier", self.charge_speed_multiplier, Bound::Positive),
            ("charge_arrival_distance", self.charge_arrival_distance, Bound::Positive),
        ])
    }
}

/// Runtime state of a charger.
#[derive(Debug, Clone, PartialEq)]
pub struct Charger {
    tuning: ChargerTuning,
    enrage_remaining: f32,
    charge_point: Option<Vec2>,
}

impl Charger {
    /// Create a calm charger.
    #[must_use]
    pub fn new(tuning: ChargerTuning) -> Self {
        Self {
            tuning,
            enrage_remaining: 0.0,
            charge_point: None,
        }
    }

    /// Where the current charge is headed.
    #[must_use]
    pub const fn charge_point(&self) -> Option<Vec2> {
        self.charge_point
    }

    fn start_charge(&mut self, core: &CreatureCore, cx: &TickContext<'_>) {
        if let Some(point) = core.target_position(cx) {
            debug!("{} charges toward {:?}", core.id(), point);
            self.charge_point = Some(point);
        }
    }
}

impl Behavior for Charger {
    fn on_tick(&mut self, _core: &mut CreatureCore, _cx: &mut TickContext<'_>, frame: Frame) {
        self.enrage_remaining = (self.enrage_remaining - frame.delta).max(0.0);
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

    fn on_target_detected(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) -> bool {
        if !core.is_hostile_at(frame.distance) {
            return false;
        }
        if cx.rng.chance(self.tuning.detect_charge_chance) {
            self.start_charge(core, cx);
        }
        core.change_state(cx, BehaviorState::Chasing, frame.now)
    }

    fn handle_chasing(&mut self, core: &mut CreatureCore, cx: &mut TickContext<'_>, frame: Frame) {
        if let Some(point) = self.charge_point {
            let reached = core
                .position(cx)
                .map_or(true, |p| p.distance(point) < self.tuning.charge_arrival_distance);

            if reached || frame.distance <= core.attack_range() {
                self.charge_point = None;
            } else {
                core.move_toward(cx, point, self.tuning.charge_speed_multiplier);
                return;
            }
        }

        core.chase_tick(cx, frame, self.speed_multiplier());
    }

    fn on_damaged(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
        _result: &DamageResult,
    ) {
        self.enrage_remaining = self.tuning.enrage_duration;
        if cx.rng.chance(self.tuning.damage_charge_chance) {
            self.start_charge(core, cx);
        }
        core.react_to_damage(cx, BehaviorState::Chasing, frame.now);
    }

    fn on_death(&mut self) {
        self.enrage_remaining = 0.0;
        self.charge_point = None;
    }
}
