//! Event bus carrying combat and behavior events to the driver.

use bestiary_common::{EntityId, ItemTypeId};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::combat::DamageResult;
use crate::state::BehaviorState;
use crate::status::{ApplyOutcome, StatusKind};

/// Which kind of attack produced a [`CombatEvent::AttackResolved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Standard, globally gated melee attack.
    Melee,
    /// Ambush opener.
    FirstStrike,
    /// Aerial ranged breath.
    Breath,
    /// Aerial short-range fire breath.
    FireBreath,
    /// Brute smash.
    Smash,
    /// Player counter-attack.
    Retaliation,
    /// Player-initiated attack.
    Player,
}

impl AttackKind {
    /// Whether the player was the attacker.
    #[must_use]
    pub const fn by_player(self) -> bool {
        matches!(self, Self::Retaliation | Self::Player)
    }
}

/// Events published by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Creature added to the encounter.
    CreatureSpawned {
        /// Creature ID
        id: EntityId,
        /// Species key
        species: String,
    },
    /// Behavior state transition.
    StateChanged {
        /// Creature ID
        id: EntityId,
        /// Previous state
        from: BehaviorState,
        /// New state
        to: BehaviorState,
        /// Simulation time of the change (ms)
        at: f32,
    },
    /// An attack was resolved.
    AttackResolved {
        /// Attacker
        attacker: EntityId,
        /// Defender
        defender: EntityId,
        /// Attack kind
        kind: AttackKind,
        /// Resolution outcome
        result: DamageResult,
    },
    /// A creature attack was refused by the global cooldown.
    AttackRejected {
        /// Attacker
        attacker: EntityId,
    },
    /// A status effect was applied.
    StatusApplied {
        /// Affected actor
        target: EntityId,
        /// Effect kind
        kind: StatusKind,
        /// Stacking outcome
        outcome: ApplyOutcome,
    },
    /// A status effect dealt damage.
    StatusTicked {
        /// Affected actor
        target: EntityId,
        /// Effect kind
        kind: StatusKind,
        /// Health removed after mitigation
        damage: u32,
        /// Who applied the effect
        source: Option<EntityId>,
    },
    /// A status effect ran out.
    StatusExpired {
        /// Affected actor
        target: EntityId,
        /// Effect kind
        kind: StatusKind,
    },
    /// A creature died.
    CreatureDied {
        /// Creature ID
        id: EntityId,
        /// Loot dropped
        loot: Vec<ItemTypeId>,
        /// Gold granted
        gold: u32,
        /// Experience granted
        xp: u32,
    },
    /// A creature left the simulation.
    CreatureRemoved {
        /// Creature ID
        id: EntityId,
    },
    /// The player reached zero health.
    PlayerDefeated {
        /// Player ID
        id: EntityId,
        /// Who landed the final hit, if known
        by: Option<EntityId>,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<CombatEvent>,
    /// Receiver for collecting events
    receiver: Receiver<CombatEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event. Dropped with a warning when the bus is full.
    pub fn publish(&self, event: CombatEvent) {
        if let Err(TrySendError::Full(event)) = self.sender.try_send(event) {
            warn!("event bus full, dropping {:?}", event);
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Typed event handler trait.
pub trait EventHandler {
    /// Handles an event.
    fn handle(&mut self, event: &CombatEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        let id = EntityId::new();

        bus.publish(CombatEvent::CreatureRemoved { id });
        bus.publish(CombatEvent::AttackRejected { attacker: id });
        assert_eq!(bus.pending_count(), 2);

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], CombatEvent::CreatureRemoved { id });
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        let id = EntityId::new();

        bus.publish(CombatEvent::CreatureRemoved { id });
        bus.publish(CombatEvent::CreatureRemoved { id });
        assert_eq!(bus.drain().len(), 1);
    }

    #[test]
    fn test_capacity_floor() {
        assert_eq!(EventBus::default().capacity(), 1024);

        let bus = EventBus::new(0);
        assert_eq!(bus.capacity(), 1);
        bus.publish(CombatEvent::PlayerDefeated {
            id: EntityId::new(),
            by: None,
        });
        assert_eq!(bus.pending_count(), 1);
    }
}
