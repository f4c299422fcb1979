//! Reward sink for the headless simulation.

use bestiary_common::ItemTypeId;
use bestiary_gameplay::{LootEntry, RewardSink};
use tracing::debug;

/// Rolls loot tables with a seeded RNG and keeps running totals.
#[derive(Debug, Clone)]
pub struct BasicLootRoller {
    rng: fastrand::Rng,
    gold: u64,
    xp: u64,
    items: Vec<ItemTypeId>,
}

impl BasicLootRoller {
    /// Create a roller with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            gold: 0,
            xp: 0,
            items: Vec::new(),
        }
    }

    /// Gold granted so far.
    #[must_use]
    pub const fn gold(&self) -> u64 {
        self.gold
    }

    /// Experience granted so far.
    #[must_use]
    pub const fn xp(&self) -> u64 {
        self.xp
    }

    /// Every item dropped so far.
    #[must_use]
    pub fn items(&self) -> &[ItemTypeId] {
        &self.items
    }

    fn roll_entry(&mut self, entry: &LootEntry) -> u32 {
        if entry.chance <= 0.0 || self.rng.f32() >= entry.chance {
            return 0;
        }
        let (min, max) = (entry.min.min(entry.max), entry.max.max(entry.min));
        self.rng.u32(min..=max)
    }
}

impl RewardSink for BasicLootRoller {
    fn roll_loot(&mut self, table: &[LootEntry]) -> Vec<ItemTypeId> {
        let mut dropped = Vec::new();
        for entry in table {
            let quantity = self.roll_entry(entry);
            dropped.extend(std::iter::repeat(entry.item).take(quantity as usize));
        }
        if !dropped.is_empty() {
            debug!("Dropped {} items", dropped.len());
        }
        self.items.extend(dropped.iter().copied());
        dropped
    }

    fn grant_reward(&mut self, gold: u32, xp: u32) {
        self.gold += u64::from(gold);
        self.xp += u64::from(xp);
    }
}
