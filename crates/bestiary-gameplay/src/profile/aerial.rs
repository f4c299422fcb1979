//! Aerial breathers: take off when hurt, breathe from range.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::behavior::{Behavior, Frame, TickContext};
use crate::combat::CooldownGate;
use crate::creature::CreatureCore;
use crate::events::AttackKind;
use crate::state::BehaviorState;
use super::{check_tunables, Bound};

/// Aerial tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AerialTuning {
    /// Takes off below this health fraction.
    pub flying_health_fraction: f32,
    /// Breath reach.
    pub breath_range: f32,
    /// Breath cooldown (ms).
    pub breath_cooldown: f32,
    /// Breath damage multiplier.
    pub breath_multiplier: f32,
    /// Fire breath reach.
    pub fire_breath_range: f32,
    /// Fire breath cooldown (ms).
    pub fire_breath_cooldown: f32,
    /// Fire breath damage multiplier inside attack range.
    pub fire_breath_multiplier: f32,
    /// Fraction of fire breath damage between attack range and fire range.
    pub fire_breath_falloff: f32,
}

impl Default for AerialTuning {
    fn default() -> Self {
        Self {
            flying_health_fraction: 0.7,
            breath_range: 250.0,
            breath_cooldown: 4000.0,
            breath_multiplier: 1.0,
            fire_breath_range: 150.0,
            fire_breath_cooldown: 2500.0,
            fire_breath_multiplier: 2.0,
            fire_breath_falloff: 0.5,
        }
    }
}

impl AerialTuning {
    /// Checks every tunable is finite and in range.
    pub fn validate(&self) -> Result<(), String> {
        check_tunables(&[
            ("flying_health_fraction", self.flying_health_fraction, Bound::Fraction),
            ("breath_range", self.breath_range, Bound::Positive),
            ("breath_cooldown", self.breath_cooldown, Bound::Positive),
            ("breath_multiplier", self.breath_multiplier, Bound::Positive),
            ("fire_breath_range", self.fire_breath_range, Bound::Positive),
            ("fire_breath_cooldown", self.fire_breath_cooldown, Bound::Positive),
            ("fire_breath_multiplier", self.fire_breath_multiplier, Bound::Positive),
            ("fire_breath_falloff", self.fire_breath_falloff, Bound::Fraction),
        ])
    }
}

/// Runtime state of an aerial breather.
#[derive(Debug, Clone, PartialEq)]
pub struct Aerial {
    tuning: AerialTuning,
    flying: bool,
    breath_cooldown: f32,
    fire_breath_cooldown: f32,
}

impl Aerial {
    /// Create a grounded breather with both abilities ready.
    #[must_use]
    pub fn new(tuning: AerialTuning) -> Self {
        Self {
            tuning,
            flying: false,
            breath_cooldown: 0.0,
            fire_breath_cooldown: 0.0,
        }
    }

    /// Remaining breath cooldown (ms).
    #[must_use]
    pub fn breath_cooldown(&self) -> f32 {
        self.breath_cooldown
    }

    /// Remaining fire breath cooldown (ms).
    #[must_use]
    pub fn fire_breath_cooldown(&self) -> f32 {
        self.fire_breath_cooldown
    }

    /// Use whichever ability is ready and in reach. Returns true if one fired.
    fn try_ability(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) -> bool {
        if self.fire_breath_cooldown <= 0.0 && frame.distance <= self.tuning.fire_breath_range {
            let multiplier = if frame.distance <= core.attack_range() {
                self.tuning.fire_breath_multiplier
            } else {
                self.tuning.fire_breath_multiplier * self.tuning.fire_breath_falloff
            };
            let result = core.attack(
                cx,
                frame.now,
                multiplier,
                CooldownGate::Independent,
                AttackKind::FireBreath,
            );
            if result.performed {
                self.fire_breath_cooldown = self.tuning.fire_breath_cooldown;
                return true;
            }
        }

        if self.breath_cooldown <= 0.0
            && core.is_aggro()
            && frame.distance <= self.tuning.breath_range
        {
            let result = core.attack(
                cx,
                frame.now,
                self.tuning.breath_multiplier,
                CooldownGate::Independent,
                AttackKind::Breath,
            );
            if result.performed {
                self.breath_cooldown = self.tuning.breath_cooldown;
                return true;
            }
        }

        false
    }
}

impl Behavior for Aerial {
    fn on_tick(&mut self, core: &mut CreatureCore, _cx: &mut TickContext<'_>, frame: Frame) {
        self.breath_cooldown = (self.breath_cooldown - frame.delta).max(0.0);
        self.fire_breath_cooldown = (self.fire_breath_cooldown - frame.delta).max(0.0);

        if !self.flying && core.attributes.health_fraction() < self.tuning.flying_health_fraction {
            debug!("{} takes to the air", core.id());
            self.flying = true;
        }
    }

    fn is_flying(&self) -> bool {
        self.flying
    }

    fn handle_chasing(&mut self, core: &mut CreatureCore, cx: &mut TickContext<'_>, frame: Frame) {
        if !cx.target.attributes.is_dead() {
            self.try_ability(core, cx, frame);
        }
        core.chase_tick(cx, frame, self.speed_multiplier());
    }

    fn handle_attacking(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) {
        if frame.distance <= core.attack_range() {
            core.stop(cx);
            if !self.try_ability(core, cx, frame) {
                core.melee(cx, frame);
            }
        }
        core.change_state(cx, BehaviorState::Chasing, frame.now);
    }

    fn on_death(&mut self) {
        self.flying = false;
    }
}
