//! # Bestiary Gameplay
//!
//! Creature behavior and combat resolution for the Bestiary engine.
//!
//! This crate provides:
//! - Attribute sets with clamped health
//! - Timed status effects (poison, burn, frozen, stunned, pinned)
//! - The combat resolver with a population-wide attack cooldown and player
//!   retaliation
//! - A per-creature behavior state machine
//! - Species behavior profiles (herder, predator, charger, ambusher, aerial,
//!   brute)
//! - A data-driven species registry and creature factory
//! - An encounter driver and an event bus for inter-system communication

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod attributes;
pub mod behavior;
pub mod combat;
pub mod config;
pub mod creature;
pub mod encounter;
pub mod events;
pub mod profile;
pub mod rng;
pub mod species;
pub mod state;
pub mod status;
pub mod testing;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::attributes::*;
    pub use crate::behavior::*;
    pub use crate::combat::*;
    pub use crate::config::*;
    pub use crate::creature::*;
    pub use crate::encounter::*;
    pub use crate::events::*;
    pub use crate::profile::*;
    pub use crate::rng::*;
    pub use crate::species::*;
    pub use crate::state::*;
    pub use crate::status::*;
    pub use crate::world::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use bestiary_common::Vec2;

    #[test]
    fn test_attribute_damage_clamps() {
        let mut attrs = AttributeSet::new(20, 5, 0, 50.0);
        assert_eq!(attrs.apply_damage(50.0), 20);
        assert!(attrs.is_dead());
        assert_eq!(attrs.apply_damage(5.0), 0);
    }

    #[test]
    fn test_state_machine_dead_is_terminal() {
        let mut fsm = StateMachine::new(0.0);
        assert!(fsm.change_state(BehaviorState::Dead, 10.0).is_some());
        assert!(fsm.change_state(BehaviorState::Idle, 20.0).is_none());
        assert!(fsm.is_dead());
    }

    #[test]
    fn test_registry_spawns_creature() {
        let mut registry = SpeciesRegistry::new();
        registry
            .register(SpeciesDefinition::new("wolf", "Wolf"))
            .expect("valid");

        let mut rng = CombatRng::new(1);
        let wolf = CreatureFactory::new(&registry)
            .spawn("wolf", Vec2::ZERO, &mut rng)
            .expect("spawn");
        assert_eq!(wolf.state(), BehaviorState::Idle);
        assert!(!wolf.is_dead());
    }
}
