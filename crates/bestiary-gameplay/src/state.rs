//! Per-creature behavior state machine.

use bestiary_common::numeric;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavior states of a creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorState {
    /// Standing around near spawn.
    #[default]
    Idle,
    /// Walking to a random point near spawn.
    Wandering,
    /// Running away from the target.
    Fleeing,
    /// Closing distance to the target.
    Chasing,
    /// In range, delivering an attack.
    Attacking,
    /// Walking back to spawn.
    Returning,
    /// Terminal.
    Dead,
}

impl BehaviorState {
    /// Whether the creature is calm (no target engaged).
    #[must_use]
    pub const fn is_calm(self) -> bool {
        matches!(self, Self::Idle | Self::Wandering)
    }

    /// Whether the creature is engaging the target.
    #[must_use]
    pub const fn is_engaged(self) -> bool {
        matches!(self, Self::Chasing | Self::Attacking)
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Wandering => "wandering",
            Self::Fleeing => "fleeing",
            Self::Chasing => "chasing",
            Self::Attacking => "attacking",
            Self::Returning => "returning",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A state change that actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Previous state.
    pub from: BehaviorState,
    /// New state.
    pub to: BehaviorState,
}

/// Current state plus its timers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    current: BehaviorState,
    state_timer: f32,
    last_state_change: f32,
}

impl StateMachine {
    /// Start in `Idle` at time `now`.
    #[must_use]
    pub fn new(now: f32) -> Self {
        Self {
            current: BehaviorState::Idle,
            state_timer: 0.0,
            last_state_change: now,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn current(&self) -> BehaviorState {
        self.current
    }

    /// Time spent in the current state (ms).
    #[must_use]
    pub const fn state_timer(&self) -> f32 {
        self.state_timer
    }

    /// Simulation time of the last transition.
    #[must_use]
    pub const fn last_state_change(&self) -> f32 {
        self.last_state_change
    }

    /// Whether the machine reached the terminal state.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current == BehaviorState::Dead
    }

    /// Move to `next`.
    ///
    /// No-op when already in `next` or dead. Returns the transition made.
    pub fn change_state(&mut self, next: BehaviorState, now: f32) -> Option<Transition> {
        if next == self.current || self.is_dead() {
            return None;
        }

        let transition = Transition {
            from: self.current,
            to: next,
        };
        self.current = next;
        self.state_timer = 0.0;
        self.last_state_change = now;
        Some(transition)
    }

    /// Advance the state timer.
    pub fn advance(&mut self, delta: f32) {
        self.state_timer += numeric::non_negative(delta, 0.0, "state delta");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let fsm = StateMachine::new(100.0);
        assert_eq!(fsm.current(), BehaviorState::Idle);
        assert_eq!(fsm.last_state_change(), 100.0);
    }

    #[test]
    fn test_change_state_resets_timer() {
        let mut fsm = StateMachine::new(0.0);
        fsm.advance(500.0);
        assert_eq!(fsm.state_timer(), 500.0);

        let transition = fsm.change_state(BehaviorState::Chasing, 500.0);
        assert_eq!(
            transition,
            Some(Transition {
                from: BehaviorState::Idle,
                to: BehaviorState::Chasing
            })
        );
        assert_eq!(fsm.state_timer(), 0.0);
        assert_eq!(fsm.last_state_change(), 500.0);
    }

    #[test]
    fn test_same_state_noop() {
        let mut fsm = StateMachine::new(0.0);
        fsm.advance(300.0);
        assert!(fsm.change_state(BehaviorState::Idle, 300.0).is_none());
        assert_eq!(fsm.state_timer(), 300.0);
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut fsm = StateMachine::new(0.0);
        fsm.change_state(BehaviorState::Dead, 10.0);

        for next in [
            BehaviorState::Idle,
            BehaviorState::Wandering,
            BehaviorState::Fleeing,
            BehaviorState::Chasing,
            BehaviorState::Attacking,
            BehaviorState::Returning,
        ] {
            assert!(fsm.change_state(next, 20.0).is_none());
            assert!(fsm.is_dead());
        }
    }

    #[test]
    fn test_advance_ignores_invalid() {
        let mut fsm = StateMachine::new(0.0);
        fsm.advance(f32::NAN);
        fsm.advance(-5.0);
        assert_eq!(fsm.state_timer(), 0.0);
    }
}
