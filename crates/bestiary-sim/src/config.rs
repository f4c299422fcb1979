//! Simulation configuration.
//!
//! Read from `bestiary.toml`. Holds the run parameters (seed, tick length and
//! count), where species files live, the player, the encounter roster and the
//! engine tuning sections. Missing fields take defaults; a missing or broken
//! file falls back to the default configuration.

use bestiary_common::Vec2;
use bestiary_gameplay::{AttributeSet, BehaviorConfig, CombatConfig, EngineTuning, PlayerActor};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "bestiary.toml";

/// The simulated player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Maximum health
    pub health: u32,
    /// Damage per attack
    pub damage: u32,
    /// Defense
    pub defense: u32,
    /// Movement speed (units per second)
    pub speed: f32,
    /// Critical hit chance
    pub crit_chance: f32,
    /// Dodge chance
    pub dodge_chance: f32,
    /// Block chance
    pub block_chance: f32,
    /// Reach of the player's own attacks
    pub attack_range: f32,
    /// Time between the player's own attacks (ms, 0 = never attack)
    pub attack_interval: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            health: 150,
            damage: 14,
            defense: 3,
            speed: 100.0,
            crit_chance: 0.1,
            dodge_chance: 0.05,
            block_chance: 0.1,
            attack_range: 60.0,
            attack_interval: 900.0,
        }
    }
}

impl PlayerConfig {
    /// Build the player actor.
    #[must_use]
    pub fn actor(&self) -> PlayerActor {
        PlayerActor::new(
            AttributeSet::new(self.health, self.damage, self.defense, self.speed)
                .with_crit(self.crit_chance, 2.0)
                .with_dodge(self.dodge_chance)
                .with_block(self.block_chance),
        )
    }
}

/// One creature in the encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Species key
    pub species: String,
    /// Spawn X
    pub x: f32,
    /// Spawn Y
    pub y: f32,
}

impl RosterEntry {
    /// Entry at a position.
    #[must_use]
    pub fn new(species: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            species: species.into(),
            x,
            y,
        }
    }

    /// Spawn position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Simulation configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Run ===
    /// RNG seed
    pub seed: u64,
    /// Length of one tick (ms)
    pub tick_ms: f32,
    /// Number of ticks to run
    pub ticks: u32,
    /// Stop early once every creature is gone or the player falls
    pub stop_when_resolved: bool,

    // === Data ===
    /// Directory holding species files
    pub species_dir: PathBuf,

    // === Actors ===
    /// The player
    pub player: PlayerConfig,
    /// Creatures to spawn, in update order
    pub roster: Vec<RosterEntry>,

    // === Engine ===
    /// Combat resolver constants
    pub combat: CombatConfig,
    /// Behavior state machine constants
    pub behavior: BehaviorConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x00B3_5714,
            tick_ms: 16.0,
            ticks: 3750, // one minute
            stop_when_resolved: true,

            species_dir: PathBuf::from("assets/species"),

            player: PlayerConfig::default(),
            roster: vec![
                RosterEntry::new("grey_wolf", 160.0, 0.0),
                RosterEntry::new("wild_boar", -180.0, 60.0),
                RosterEntry::new("cave_spider", 40.0, -150.0),
                RosterEntry::new("red_deer", -60.0, -90.0),
            ],

            combat: CombatConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from `bestiary.toml` in the working directory.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str::<Self>(&contents) {
                    Ok(mut config) => {
                        info!("Loaded config from {}", path.display());
                        config.validate();
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Run
        if !self.tick_ms.is_finite() {
            warn!("tick_ms {} is not finite, using 16", self.tick_ms);
            self.tick_ms = 16.0;
        }
        self.tick_ms = self.tick_ms.clamp(1.0, 1000.0);
        self.ticks = self.ticks.min(1_000_000);

        // Player
        self.player.health = self.player.health.max(1);
        if !self.player.attack_range.is_finite() {
            self.player.attack_range = PlayerConfig::default().attack_range;
        }
        self.player.attack_range = self.player.attack_range.max(0.0);
        if !self.player.attack_interval.is_finite() {
            self.player.attack_interval = PlayerConfig::default().attack_interval;
        }
        self.player.attack_interval = self.player.attack_interval.max(0.0);

        // Roster
        self.roster.retain(|entry| {
            let keep = entry.x.is_finite() && entry.y.is_finite();
            if !keep {
                warn!("Dropping roster entry {} with non-finite position", entry.species);
            }
            keep
        });

        // Engine
        self.combat.validate();
        self.behavior.validate();
    }

    /// Engine sections as one tuning block.
    #[must_use]
    pub fn tuning(&self) -> EngineTuning {
        EngineTuning {
            combat: self.combat.clone(),
            behavior: self.behavior.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.tick_ms, 16.0);
        assert_eq!(config.roster.len(), 4);
        assert_eq!(config.species_dir, PathBuf::from("assets/species"));
        assert_eq!(config.combat.min_attack_cooldown, 300.0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();
        config.tick_ms = 0.0;
        config.player.health = 0;
        config.player.attack_range = f32::NAN;
        config.roster.push(RosterEntry::new("ghost", f32::INFINITY, 0.0));
        config.combat.variance = 5.0;

        config.validate();

        assert_eq!(config.tick_ms, 1.0);
        assert_eq!(config.player.health, 1);
        assert_eq!(config.player.attack_range, 60.0);
        assert_eq!(config.roster.len(), 4);
        assert_eq!(config.combat.variance, 0.9);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("bestiary.toml");

        let mut config = SimConfig::default();
        config.seed = 12345;
        config.ticks = 10;
        config.roster = vec![RosterEntry::new("grey_wolf", 5.0, 6.0)];
        config.behavior.death_delay = 250.0;

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = SimConfig::load_from(&config_path);
        assert_eq!(loaded.seed, 12345);
        assert_eq!(loaded.ticks, 10);
        assert_eq!(loaded.roster, vec![RosterEntry::new("grey_wolf", 5.0, 6.0)]);
        assert_eq!(loaded.behavior.death_delay, 250.0);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = SimConfig::load_from("/nonexistent/path/bestiary.toml");
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_config_partial_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(
            &config_path,
            "seed = 7\n\n[player]\ndamage = 40\n\n[combat]\nretaliation_range = 80.0\n",
        )
        .expect("write");

        let config = SimConfig::load_from(&config_path);
        assert_eq!(config.seed, 7);
        assert_eq!(config.player.damage, 40);
        assert_eq!(config.player.health, 150);
        assert_eq!(config.combat.retaliation_range, 80.0);
        assert_eq!(config.roster.len(), 4);
    }

    #[test]
    fn test_config_invalid_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "seed = \"many\"").expect("write");

        let config = SimConfig::load_from(&config_path);
        assert_eq!(config, SimConfig::default());
    }
}
