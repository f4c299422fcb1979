//! Tactical ambushers: hide, strike first, retreat and hide again.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::behavior::{Behavior, Frame, TickContext};
use crate::combat::{CooldownGate, DamageResult};
use crate::creature::CreatureCore;
use crate::events::AttackKind;
use crate::rng::CombatRng;
use crate::state::BehaviorState;
use crate::status::StatusKind;
use super::{check_tunables, Bound};

/// Ambusher tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbusherTuning {
    /// Chance to set an ambush on detection instead of chasing.
    pub ambush_chance: f32,
    /// The ambush springs when the player comes this close.
    pub ambush_trigger_distance: f32,
    /// Give up an ambush after this long (ms).
    pub max_ambush_duration: f32,
    /// Damage multiplier of the opening strike.
    pub first_strike_multiplier: f32,
    /// Chance a spawned ambusher is poisonous.
    pub poisonous_chance: f32,
    /// Chance a landed hit poisons the player.
    pub poison_on_hit_chance: f32,
    /// Poison damage per tick.
    pub poison_damage: u32,
    /// Poison duration (ms).
    pub poison_duration: f32,
    /// Poison tick interval (ms).
    pub poison_interval: f32,
    /// Below this health fraction a hit sends the ambusher back to spawn.
    pub retreat_health_fraction: f32,
}

impl Default for AmbusherTuning {
    fn default() -> Self {
        Self {
            ambush_chance: 0.7,
            ambush_trigger_distance: 40.0,
            max_ambush_duration: 8000.0,
            first_strike_multiplier: 1.5,
            poisonous_chance: 0.5,
            poison_on_hit_chance: 0.3,
            poison_damage: 3,
            poison_duration: 5000.0,
            poison_interval: 1000.0,
            retreat_health_fraction: 0.4,
        }
    }
}

impl AmbusherTuning {
    /// Checks every tunable is finite and in range.
    pub fn validate(&self) -> Result<(), String> {
        check_tunables(&[
            ("ambush_chance", self.ambush_chance, Bound::Fraction),
            ("ambush_trigger_distance", self.ambush_trigger_distance, Bound::Positive),
            ("max_ambush_duration", self.max_ambush_duration, Bound::Positive),
            ("first_strike_multiplier", self.first_strike_multiplier, Bound::Positive),
            ("poisonous_chance", self.poisonous_chance, Bound::Fraction),
            ("poison_on_hit_chance", self.poison_on_hit_chance, Bound::Fraction),
            ("poison_duration", self.poison_duration, Bound::Positive),
            ("poison_interval", self.poison_interval, Bound::Positive),
            ("retreat_health_fraction", self.retreat_health_fraction, Bound::Fraction),
        ])
    }
}

/// Runtime state of an ambusher.
#[derive(Debug, Clone, PartialEq)]
pub struct Ambusher {
    tuning: AmbusherTuning,
    poisonous: bool,
    ambushing: bool,
    ambush_timer: f32,
    first_strike_ready: bool,
    retreating: bool,
}

impl Ambusher {
    /// Create an ambusher, rolling whether it is poisonous.
    pub fn spawn(tuning: AmbusherTuning, rng: &mut CombatRng) -> Self {
        let poisonous = rng.chance(tuning.poisonous_chance);
        Self::new(tuning, poisonous)
    }

    /// Create an ambusher with a fixed poison flag.
    #[must_use]
    pub fn new(tuning: AmbusherTuning, poisonous: bool) -> Self {
        Self {
            tuning,
            poisonous,
            ambushing: false,
            ambush_timer: 0.0,
            first_strike_ready: false,
            retreating: false,
        }
    }

    /// Whether hits may poison.
    #[must_use]
    pub const fn is_poisonous(&self) -> bool {
        self.poisonous
    }

    /// Whether the opening strike is pending.
    #[must_use]
    pub const fn first_strike_ready(&self) -> bool {
        self.first_strike_ready
    }

    /// Whether it is heading home to hide again.
    #[must_use]
    pub const fn is_retreating(&self) -> bool {
        self.retreating
    }

    fn enter_ambush(&mut self, core: &mut CreatureCore, cx: &mut TickContext<'_>, now: f32) {
        debug!("{} sets an ambush", core.id());
        self.ambushing = true;
        self.ambush_timer = 0.0;
        core.stop(cx);
        core.change_state(cx, BehaviorState::Idle, now);
    }

    fn hold_ambush(&mut self, core: &mut CreatureCore, cx: &mut TickContext<'_>, frame: Frame) {
        core.stop(cx);
        self.ambush_timer += frame.delta;

        // Spring only once the opener can reach.
        let trigger = self.tuning.ambush_trigger_distance.min(core.attack_range());
        if frame.distance <= trigger {
            debug!("{} springs the ambush", core.id());
            self.ambushing = false;
            self.first_strike_ready = true;
            core.change_state(cx, BehaviorState::Attacking, frame.now);
        } else if self.ambush_timer >= self.tuning.max_ambush_duration {
            debug!("{} abandons the ambush", core.id());
            self.ambushing = false;
        }
    }
}

impl Behavior for Ambusher {
    fn is_hidden(&self) -> bool {
        self.ambushing
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
        if cx.rng.chance(self.tuning.ambush_chance) {
            self.enter_ambush(core, cx, frame.now);
            true
        } else {
            core.change_state(cx, BehaviorState::Chasing, frame.now)
        }
    }

    fn handle_idle(&mut self, core: &mut CreatureCore, cx: &mut TickContext<'_>, frame: Frame) {
        if self.ambushing {
            self.hold_ambush(core, cx, frame);
            return;
        }
        if self.detect(core, cx, frame) {
            return;
        }
        core.idle_tick(cx, frame);
    }

    fn handle_attacking(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) {
        if frame.distance <= core.attack_range() {
            core.stop(cx);
            let result = if self.first_strike_ready {
                self.first_strike_ready = false;
                core.attack(
                    cx,
                    frame.now,
                    self.tuning.first_strike_multiplier,
                    CooldownGate::FirstStrike,
                    AttackKind::FirstStrike,
                )
            } else {
                core.melee(cx, frame)
            };

            if result.landed()
                && self.poisonous
                && cx.rng.chance(self.tuning.poison_on_hit_chance)
            {
                core.afflict_target(
                    cx,
                    StatusKind::Poison,
                    self.tuning.poison_damage,
                    self.tuning.poison_duration,
                    self.tuning.poison_interval,
                );
            }
        }
        core.change_state(cx, BehaviorState::Chasing, frame.now);
    }

    fn handle_returning(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) {
        let arrived = core.return_tick(cx, frame, self.speed_multiplier());
        if arrived && self.retreating {
            self.retreating = false;
            self.enter_ambush(core, cx, frame.now);
        }
    }

    fn on_damaged(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
        _result: &DamageResult,
    ) {
        self.ambushing = false;

        if core.attributes.health_fraction() < self.tuning.retreat_health_fraction {
            debug!("{} retreats to its lair", core.id());
            self.retreating = true;
            self.first_strike_ready = false;
            core.react_to_damage(cx, BehaviorState::Chasing, frame.now);
            core.change_state(cx, BehaviorState::Returning, frame.now);
            return;
        }

        core.react_to_damage(cx, BehaviorState::Chasing, frame.now);
    }

    fn on_death(&mut self) {
        self.ambushing = false;
        self.first_strike_ready = false;
        self.retreating = false;
    }
}
