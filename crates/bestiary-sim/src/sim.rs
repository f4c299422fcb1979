//! Headless encounter driver.
//!
//! Runs one configured encounter on a fixed timestep. The player stands at
//! the origin and swings at the nearest visible creature in reach; every
//! event is tallied into a [`SimReport`].

use bestiary_common::{EntityId, Vec2};
use bestiary_gameplay::{
    Arena, AttackKind, CombatEvent, CreatureFactory, Encounter, EventHandler, RegistryResult,
    SpeciesRegistry, WorldQuery,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::loot::BasicLootRoller;

/// Running totals built from engine events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTally {
    /// Creatures spawned
    pub spawned: u32,
    /// Behavior state transitions
    pub state_changes: u32,
    /// Attacks that removed health
    pub hits: u32,
    /// Attacks that were dodged
    pub dodges: u32,
    /// Attacks refused by the global cooldown
    pub rejected: u32,
    /// Critical hits
    pub criticals: u32,
    /// Player counter-attacks
    pub retaliations: u32,
    /// Health removed from the player by attacks
    pub damage_taken: u64,
    /// Health removed from creatures by attacks
    pub damage_dealt: u64,
    /// Status effects applied
    pub statuses_applied: u32,
    /// Health removed by status ticks
    pub status_damage: u64,
    /// Creatures killed
    pub deaths: u32,
    /// Creatures removed
    pub removals: u32,
    /// Whether the player was defeated
    pub player_defeated: bool,
}

impl EventHandler for EventTally {
    fn handle(&mut self, event: &CombatEvent) {
        match event {
            CombatEvent::CreatureSpawned { .. } => self.spawned += 1,
            CombatEvent::StateChanged { id, from, to, at } => {
                debug!("{} {} -> {} at {:.0}ms", id, from, to, at);
                self.state_changes += 1;
            },
            CombatEvent::AttackResolved { kind, result, .. } => {
                if result.was_dodged {
                    self.dodges += 1;
                } else if result.amount_dealt > 0 {
                    self.hits += 1;
                }
                if result.was_critical {
                    self.criticals += 1;
                }
                if *kind == AttackKind::Retaliation {
                    self.retaliations += 1;
                }
                let dealt = u64::from(result.amount_dealt);
                if kind.by_player() {
                    self.damage_dealt += dealt;
                } else {
                    self.damage_taken += dealt;
                }
            },
            CombatEvent::AttackRejected { .. } => self.rejected += 1,
            CombatEvent::StatusApplied { .. } => self.statuses_applied += 1,
            CombatEvent::StatusTicked { damage, .. } => {
                self.status_damage += u64::from(*damage);
            },
            CombatEvent::StatusExpired { .. } => {},
            CombatEvent::CreatureDied { id, loot, gold, xp } => {
                info!("{} died: {} items, {} gold, {} xp", id, loot.len(), gold, xp);
                self.deaths += 1;
            },
            CombatEvent::CreatureRemoved { .. } => self.removals += 1,
            CombatEvent::PlayerDefeated { by, .. } => {
                info!("Player defeated by {:?}", by);
                self.player_defeated = true;
            },
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimReport {
    /// Ticks executed
    pub ticks: u32,
    /// Simulated time (ms)
    pub elapsed_ms: f32,
    /// Player health at the end
    pub player_health: u32,
    /// Creatures still in the encounter
    pub creatures_left: usize,
    /// Gold granted
    pub gold: u64,
    /// Experience granted
    pub xp: u64,
    /// Items dropped
    pub items: usize,
    /// Event totals
    pub events: EventTally,
}

/// One configured encounter plus its world and reward sink.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    encounter: Encounter,
    world: Arena,
    rewards: BasicLootRoller,
    tally: EventTally,
    now: f32,
    ticks: u32,
    attack_timer: f32,
}

impl Simulation {
    /// Build the encounter and spawn the roster.
    pub fn new(config: SimConfig, registry: &SpeciesRegistry) -> RegistryResult<Self> {
        let mut encounter = Encounter::new(config.tuning(), config.player.actor(), config.seed);
        let player = encounter.player().id;

        let mut world = Arena::new();
        world.insert(player, Vec2::ZERO);

        let factory = CreatureFactory::new(registry);
        for entry in &config.roster {
            encounter.spawn_species(&factory, &entry.species, entry.position(), &mut world)?;
        }

        Ok(Self {
            rewards: BasicLootRoller::new(config.seed.rotate_left(17)),
            tally: EventTally::default(),
            config,
            encounter,
            world,
            now: 0.0,
            ticks: 0,
            attack_timer: 0.0,
        })
    }

    /// The encounter being driven.
    #[must_use]
    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    /// Event totals so far.
    #[must_use]
    pub fn tally(&self) -> &EventTally {
        &self.tally
    }

    /// Advance one tick.
    pub fn step(&mut self) {
        let delta = self.config.tick_ms;
        self.now += delta;

        self.player_turn(delta);
        self.encounter
            .tick(self.now, delta, &mut self.world, &mut self.rewards);
        self.world.integrate(delta);
        self.encounter.dispatch(&mut self.tally);
        self.ticks += 1;
    }

    /// Player defeated or no creatures left.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.encounter.is_player_defeated() || self.encounter.creatures().is_empty()
    }

    /// Run the configured number of ticks.
    pub fn run(&mut self) -> SimReport {
        info!(
            "Simulating {} creatures for up to {} ticks of {}ms (seed {})",
            self.encounter.creatures().len(),
            self.config.ticks,
            self.config.tick_ms,
            self.config.seed
        );

        for _ in 0..self.config.ticks {
            self.step();
            if self.config.stop_when_resolved && self.is_resolved() {
                break;
            }
        }

        let report = self.report();
        info!(
            "Finished after {} ticks: player at {} hp, {} creatures left, {} killed",
            report.ticks, report.player_health, report.creatures_left, report.events.deaths
        );
        report
    }

    /// Snapshot of the current outcome.
    #[must_use]
    pub fn report(&self) -> SimReport {
        SimReport {
            ticks: self.ticks,
            elapsed_ms: self.now,
            player_health: self.encounter.player().attributes.health(),
            creatures_left: self.encounter.creatures().len(),
            gold: self.rewards.gold(),
            xp: self.rewards.xp(),
            items: self.rewards.items().len(),
            events: self.tally.clone(),
        }
    }

    fn player_turn(&mut self, delta: f32) {
        let interval = self.config.player.attack_interval;
        if interval <= 0.0 || self.encounter.is_player_defeated() {
            return;
        }

        self.attack_timer = (self.attack_timer - delta).max(0.0);
        if self.attack_timer > 0.0 {
            return;
        }

        if let Some(target) = self.nearest_target() {
            self.encounter
                .player_attack(target, self.now, &mut self.world, &mut self.rewards);
            self.attack_timer = interval;
        }
    }

    fn nearest_target(&self) -> Option<EntityId> {
        let player = self.encounter.player().id;
        let reach = self.config.player.attack_range;

        self.encounter
            .creatures()
            .iter()
            .filter(|c| !c.is_dead() && !c.is_hidden())
            .filter_map(|c| {
                self.world
                    .distance_between(c.id(), player)
                    .map(|d| (c.id(), d))
            })
            .filter(|(_, d)| *d <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}
