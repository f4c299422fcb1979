//! Behavior handlers shared by every species profile.
//!
//! A profile implements [`Behavior`]; the default methods provide the
//! generic state machine (idle, wander, flee, chase, attack, return), so a
//! profile only overrides the handlers its decision tree changes.

use serde::{Deserialize, Serialize};

use crate::combat::{CombatResolver, DamageResult, PlayerActor};
use crate::config::BehaviorConfig;
use crate::creature::CreatureCore;
use crate::events::EventBus;
use crate::rng::CombatRng;
use crate::state::BehaviorState;
use crate::world::{RewardSink, WorldAccess};

/// How a species reacts to the player by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Temperament {
    /// Avoids the player.
    Passive,
    /// Ignores the player until provoked or crowded.
    #[default]
    Neutral,
    /// Attacks on sight.
    Aggressive,
}

/// Timing and distance for one creature update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Simulation time (ms).
    pub now: f32,
    /// Time since the previous update (ms).
    pub delta: f32,
    /// Distance from the creature to the player.
    pub distance: f32,
}

impl Frame {
    /// Create a frame.
    #[must_use]
    pub const fn new(now: f32, delta: f32, distance: f32) -> Self {
        Self {
            now,
            delta,
            distance,
        }
    }
}

/// Everything a creature may touch during its update.
pub struct TickContext<'a> {
    /// The player actor.
    pub target: &'a mut PlayerActor,
    /// Population combat service.
    pub resolver: &'a mut CombatResolver,
    /// World positions and movement.
    pub world: &'a mut dyn WorldAccess,
    /// Death reward receiver.
    pub rewards: &'a mut dyn RewardSink,
    /// Shared random source.
    pub rng: &'a mut CombatRng,
    /// Event output.
    pub events: &'a EventBus,
    /// Shared state machine constants.
    pub behavior: &'a BehaviorConfig,
}

/// Per-species behavior.
///
/// Every method receives the creature's shared state (`core`) separately
/// from the profile so profiles can keep their own timers and flags.
pub trait Behavior {
    /// Called every update before the state handler; advance profile timers here.
    fn on_tick(&mut self, _core: &mut CreatureCore, _cx: &mut TickContext<'_>, _frame: Frame) {}

    /// Movement speed multiplier from profile modes (rage, enrage).
    fn speed_multiplier(&self) -> f32 {
        1.0
    }

    /// Whether this profile runs away when fleeing is requested.
    fn flees(&self) -> bool {
        false
    }

    /// Hidden from the player (ambush).
    fn is_hidden(&self) -> bool {
        false
    }

    /// Airborne sub-mode.
    fn is_flying(&self) -> bool {
        false
    }

    /// Enraged or raging.
    fn is_enraged(&self) -> bool {
        false
    }

    /// Run the detection check for calm states. Returns true if it reacted.
    fn detect(&mut self, core: &mut CreatureCore, cx: &mut TickContext<'_>, frame: Frame) -> bool {
        if core.state().is_calm() && core.detects(frame.distance) {
            self.on_target_detected(core, cx, frame)
        } else {
            false
        }
    }

    /// React to the player entering the detection radius.
    fn on_target_detected(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) -> bool {
        if core.temperament() == Temperament::Passive {
            core.change_state(cx, BehaviorState::Fleeing, frame.now)
        } else if core.is_hostile_at(frame.distance) {
            core.change_state(cx, BehaviorState::Chasing, frame.now)
        } else {
            false
        }
    }

    /// Idle: look around, then start wandering.
    fn handle_idle(&mut self, core: &mut CreatureCore, cx: &mut TickContext<'_>, frame: Frame) {
        if self.detect(core, cx, frame) {
            return;
        }
        core.idle_tick(cx, frame);
    }

    /// Wandering: walk to a point near spawn.
    fn handle_wandering(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) {
        if self.detect(core, cx, frame) {
            return;
        }
        core.wander_tick(cx, frame);
    }

    /// Fleeing: run from the player, or turn and fight.
    fn handle_fleeing(&mut self, core: &mut CreatureCore, cx: &mut TickContext<'_>, frame: Frame) {
        if self.flees() {
            core.flee_tick(cx, frame, self.speed_multiplier());
        } else {
            core.change_state(cx, BehaviorState::Chasing, frame.now);
        }
    }

    /// Chasing: close in on the player.
    fn handle_chasing(&mut self, core: &mut CreatureCore, cx: &mut TickContext<'_>, frame: Frame) {
        core.chase_tick(cx, frame, self.speed_multiplier());
    }

    /// Attacking: one gated attack when in range, then back to chasing.
    fn handle_attacking(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) {
        if frame.distance <= core.attack_range() {
            core.stop(cx);
            core.melee(cx, frame);
        }
        core.change_state(cx, BehaviorState::Chasing, frame.now);
    }

    /// Returning: walk back to spawn.
    fn handle_returning(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
    ) {
        core.return_tick(cx, frame, self.speed_multiplier());
    }

    /// React to damage that removed health.
    fn on_damaged(
        &mut self,
        core: &mut CreatureCore,
        cx: &mut TickContext<'_>,
        frame: Frame,
        _result: &DamageResult,
    ) {
        let next = if core.temperament() == Temperament::Passive && self.flees() {
            BehaviorState::Fleeing
        } else {
            BehaviorState::Chasing
        };
        core.react_to_damage(cx, next, frame.now);
    }

    /// Cancel timers and sub-modes on death.
    fn on_death(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperament_serde_names() {
        let t: Temperament = serde_json::from_str("\"aggressive\"").expect("valid");
        assert_eq!(t, Temperament::Aggressive);
        assert_eq!(Temperament::default(), Temperament::Neutral);
    }

    #[test]
    fn test_frame_new() {
        let frame = Frame::new(1000.0, 16.0, 42.0);
        assert_eq!(frame.now, 1000.0);
        assert_eq!(frame.delta, 16.0);
        assert_eq!(frame.distance, 42.0);
    }
}
