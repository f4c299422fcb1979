//! Data-driven species definitions.
//!
//! Species are authored in TOML (or JSON) files:
//!
//! ```toml
//! default_species = "wolf"
//!
//! [schema]
//! major = 1
//! minor = 0
//! patch = 0
//!
//! [[species]]
//! key = "wolf"
//! name = "Grey Wolf"
//! temperament = "aggressive"
//!
//! [species.behavior]
//! profile = "predator"
//!
//! [species.attributes]
//! health = 40
//! damage = 8
//! speed = 90.0
//! detection_radius = 180.0
//! ```
//!
//! [`SpeciesRegistry`] validates and stores definitions; [`CreatureFactory`]
//! turns a definition into a live [`Creature`].

use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use bestiary_common::{SchemaVersion, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::attributes::{AttributeSet, DEFAULT_CRIT_CHANCE, DEFAULT_CRIT_MULTIPLIER};
use crate::behavior::Temperament;
use crate::combat::AttackPacing;
use crate::creature::{Creature, CreatureCore, SpeciesInfo};
use crate::profile::ProfileSpec;
use crate::rng::CombatRng;
use crate::world::LootEntry;

/// Errors from loading or querying species data.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Species directory or file not found.
    #[error("Species path not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read a species file.
    #[error("Failed to read species file: {0}")]
    Read(#[from] std::io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse species TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to parse JSON.
    #[error("Failed to parse species JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A definition failed validation.
    #[error("Invalid species {key}: {reason}")]
    Validation {
        /// Offending species key.
        key: String,
        /// What was wrong.
        reason: String,
    },

    /// The same key was registered twice.
    #[error("Duplicate species key: {0}")]
    DuplicateKey(String),

    /// No species with this key.
    #[error("Unknown species: {0}")]
    UnknownSpecies(String),

    /// Fallback requested but the registry has no default species.
    #[error("No default species registered")]
    NoDefaultSpecies,

    /// File written for an incompatible schema.
    #[error("Species schema mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build reads.
        expected: SchemaVersion,
        /// Version found in the file.
        actual: SchemaVersion,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

// ============================================================================
// Definitions
// ============================================================================

const fn default_health() -> u32 {
    50
}

const fn default_damage() -> u32 {
    5
}

const fn default_speed() -> f32 {
    60.0
}

const fn default_crit_chance() -> f32 {
    DEFAULT_CRIT_CHANCE
}

const fn default_crit_multiplier() -> f32 {
    DEFAULT_CRIT_MULTIPLIER
}

const fn default_scale() -> f32 {
    1.0
}

/// Authored attribute block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeTemplate {
    /// Maximum (and starting) health.
    #[serde(default = "default_health")]
    pub health: u32,
    /// Base damage per attack.
    #[serde(default = "default_damage")]
    pub damage: u32,
    /// Flat defense.
    #[serde(default)]
    pub defense: u32,
    /// Movement speed (units per second).
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Critical hit chance.
    #[serde(default = "default_crit_chance")]
    pub crit_chance: f32,
    /// Critical hit multiplier.
    #[serde(default = "default_crit_multiplier")]
    pub crit_multiplier: f32,
    /// Dodge chance.
    #[serde(default)]
    pub dodge_chance: f32,
    /// Block chance.
    #[serde(default)]
    pub block_chance: f32,
    /// Detection radius; a species without one only reacts to damage.
    #[serde(default)]
    pub detection_radius: Option<f32>,
    /// Aggro radius for neutral species.
    #[serde(default)]
    pub aggro_radius: Option<f32>,
    /// Flee radius.
    #[serde(default)]
    pub flee_radius: Option<f32>,
    /// Leash distance from spawn.
    #[serde(default)]
    pub return_radius: Option<f32>,
}

impl Default for AttributeTemplate {
    fn default() -> Self {
        Self {
            health: default_health(),
            damage: default_damage(),
            defense: 0,
            speed: default_speed(),
            crit_chance: DEFAULT_CRIT_CHANCE,
            crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
            dodge_chance: 0.0,
            block_chance: 0.0,
            detection_radius: None,
            aggro_radius: None,
            flee_radius: None,
            return_radius: None,
        }
    }
}

impl AttributeTemplate {
    /// Build a full-health attribute set, scaled by an optional boss modifier.
    #[must_use]
    pub fn build(&self, boss: Option<&BossModifier>) -> AttributeSet {
        let (health_mult, damage_mult) =
            boss.map_or((1.0, 1.0), |b| (b.health_multiplier, b.damage_multiplier));
        let health = scale_stat(self.health, health_mult).max(1);
        let damage = scale_stat(self.damage, damage_mult);

        let mut attributes = AttributeSet::new(health, damage, self.defense, self.speed)
            .with_crit(self.crit_chance, self.crit_multiplier)
            .with_dodge(self.dodge_chance)
            .with_block(self.block_chance);

        if let Some(radius) = self.detection_radius {
            attributes = attributes.with_detection_radius(radius);
        }
        if let Some(radius) = self.aggro_radius {
            attributes = attributes.with_aggro_radius(radius);
        }
        if let Some(radius) = self.flee_radius {
            attributes = attributes.with_flee_radius(radius);
        }
        if let Some(radius) = self.return_radius {
            attributes = attributes.with_return_radius(radius);
        }
        attributes
    }
}

fn scale_stat(value: u32, multiplier: f32) -> u32 {
    (value as f32 * multiplier).round() as u32
}

const fn default_health_multiplier() -> f32 {
    2.0
}

const fn default_damage_multiplier() -> f32 {
    1.5
}

const fn default_scale_multiplier() -> f32 {
    1.5
}

/// Boss variant applied at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossModifier {
    /// Health multiplier.
    #[serde(default = "default_health_multiplier")]
    pub health_multiplier: f32,
    /// Damage multiplier.
    #[serde(default = "default_damage_multiplier")]
    pub damage_multiplier: f32,
    /// Render scale multiplier.
    #[serde(default = "default_scale_multiplier")]
    pub scale_multiplier: f32,
    /// Wait on a throne until the player comes this close.
    #[serde(default)]
    pub throne_wake_radius: Option<f32>,
}

impl Default for BossModifier {
    fn default() -> Self {
        Self {
            health_multiplier: default_health_multiplier(),
            damage_multiplier: default_damage_multiplier(),
            scale_multiplier: default_scale_multiplier(),
            throne_wake_radius: None,
        }
    }
}

const fn default_attack_range() -> f32 {
    50.0
}

const fn default_attack_cooldown() -> f32 {
    1500.0
}

const fn default_attack_speed() -> f32 {
    1.0
}

/// Melee reach and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Melee range.
    #[serde(default = "default_attack_range")]
    pub range: f32,
    /// Species attack cooldown (ms).
    #[serde(default = "default_attack_cooldown")]
    pub cooldown: f32,
    /// Attack speed multiplier.
    #[serde(default = "default_attack_speed")]
    pub attack_speed: f32,
}

impl Default for AttackProfile {
    fn default() -> Self {
        Self {
            range: default_attack_range(),
            cooldown: default_attack_cooldown(),
            attack_speed: default_attack_speed(),
        }
    }
}

/// One species as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDefinition {
    /// Unique registry key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Default disposition toward the player.
    #[serde(default)]
    pub temperament: Temperament,
    /// Behavior profile and its tunables.
    #[serde(default)]
    pub behavior: ProfileSpec,
    /// Combat attributes.
    #[serde(default)]
    pub attributes: AttributeTemplate,
    /// Melee reach and pacing.
    #[serde(default)]
    pub attack: AttackProfile,
    /// Loot table.
    #[serde(default)]
    pub loot: Vec<LootEntry>,
    /// Sprite key for the renderer; defaults to the species key.
    #[serde(default)]
    pub sprite_key: Option<String>,
    /// Render scale.
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Gold granted on death.
    #[serde(default)]
    pub gold_reward: u32,
    /// Experience granted on death.
    #[serde(default)]
    pub xp_reward: u32,
    /// Boss flag.
    #[serde(default)]
    pub is_boss: bool,
    /// Boss scaling; implies `is_boss`.
    #[serde(default)]
    pub boss: Option<BossModifier>,
}

impl SpeciesDefinition {
    /// Minimal definition with default attributes and a predator profile.
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            temperament: Temperament::default(),
            behavior: ProfileSpec::default(),
            attributes: AttributeTemplate::default(),
            attack: AttackProfile::default(),
            loot: Vec::new(),
            sprite_key: None,
            scale: default_scale(),
            gold_reward: 0,
            xp_reward: 0,
            is_boss: false,
            boss: None,
        }
    }

    /// Set temperament.
    #[must_use]
    pub fn with_temperament(mut self, temperament: Temperament) -> Self {
        self.temperament = temperament;
        self
    }

    /// Set behavior profile.
    #[must_use]
    pub fn with_behavior(mut self, behavior: ProfileSpec) -> Self {
        self.behavior = behavior;
        self
    }

    /// Set attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeTemplate) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set boss scaling.
    #[must_use]
    pub fn with_boss(mut self, boss: BossModifier) -> Self {
        self.boss = Some(boss);
        self
    }

    /// Whether creatures of this species are bosses.
    #[must_use]
    pub fn is_boss(&self) -> bool {
        self.is_boss || self.boss.is_some()
    }

    /// Check authored values.
    pub fn validate(&self) -> RegistryResult<()> {
        let fail = |reason: String| -> RegistryResult<()> {
            Err(RegistryError::Validation {
                key: self.key.clone(),
                reason,
            })
        };

        if self.key.trim().is_empty() {
            return fail("key cannot be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return fail("name cannot be empty".to_string());
        }

        let attrs = &self.attributes;
        if attrs.health == 0 {
            return fail("health must be positive".to_string());
        }
        if !attrs.speed.is_finite() || attrs.speed <= 0.0 {
            return fail(format!("speed must be positive, got {}", attrs.speed));
        }
        for (name, value) in [
            ("crit_chance", attrs.crit_chance),
            ("dodge_chance", attrs.dodge_chance),
            ("block_chance", attrs.block_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return fail(format!("{name} must be between 0 and 1, got {value}"));
            }
        }
        for (name, radius) in [
            ("detection_radius", attrs.detection_radius),
            ("aggro_radius", attrs.aggro_radius),
            ("flee_radius", attrs.flee_radius),
            ("return_radius", attrs.return_radius),
        ] {
            if let Some(r) = radius {
                if !r.is_finite() || r < 0.0 {
                    return fail(format!("{name} must be non-negative, got {r}"));
                }
            }
        }

        if !self.attack.range.is_finite() || self.attack.range < 0.0 {
            return fail(format!("attack range must be non-negative, got {}", self.attack.range));
        }
        if !self.attack.cooldown.is_finite() || self.attack.cooldown <= 0.0 {
            return fail(format!("attack cooldown must be positive, got {}", self.attack.cooldown));
        }
        if !self.attack.attack_speed.is_finite() || self.attack.attack_speed <= 0.0 {
            return fail(format!(
                "attack speed must be positive, got {}",
                self.attack.attack_speed
            ));
        }

        if !self.scale.is_finite() || self.scale <= 0.0 {
            return fail(format!("scale must be positive, got {}", self.scale));
        }

        for entry in &self.loot {
            if !(0.0..=1.0).contains(&entry.chance) {
                return fail(format!("loot chance must be between 0 and 1, got {}", entry.chance));
            }
            if entry.min > entry.max {
                return fail(format!(
                    "loot quantity min {} exceeds max {}",
                    entry.min, entry.max
                ));
            }
        }

        if let Some(boss) = &self.boss {
            for (name, value) in [
                ("health_multiplier", boss.health_multiplier),
                ("damage_multiplier", boss.damage_multiplier),
                ("scale_multiplier", boss.scale_multiplier),
            ] {
                if !value.is_finite() || value <= 0.0 {
                    return fail(format!("boss {name} must be positive, got {value}"));
                }
            }
        }

        if let Err(reason) = self.behavior.validate() {
            return fail(format!("{} behavior: {reason}", self.behavior.name()));
        }

        Ok(())
    }

    /// Species data carried by a spawned creature.
    #[must_use]
    pub fn info(&self) -> SpeciesInfo {
        let scale = self.boss.as_ref().map_or(self.scale, |b| self.scale * b.scale_multiplier);
        SpeciesInfo {
            key: self.key.clone(),
            name: self.name.clone(),
            loot: self.loot.clone(),
            gold_reward: self.gold_reward,
            xp_reward: self.xp_reward,
            is_boss: self.is_boss(),
            sprite_key: self.sprite_key.clone().unwrap_or_else(|| self.key.clone()),
            scale,
        }
    }
}

/// A species file: optional schema, optional default, and the definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeciesFile {
    /// Format version.
    #[serde(default)]
    pub schema: SchemaVersion,
    /// Species used when a requested key is unknown.
    #[serde(default)]
    pub default_species: Option<String>,
    /// Definitions.
    #[serde(default)]
    pub species: Vec<SpeciesDefinition>,
}

// ============================================================================
// Registry
// ============================================================================

/// Validated species definitions, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SpeciesRegistry {
    by_key: AHashMap<String, SpeciesDefinition>,
    order: Vec<String>,
    default_key: Option<String>,
}

impl SpeciesRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Validates it and rejects duplicate keys.
    pub fn register(&mut self, definition: SpeciesDefinition) -> RegistryResult<()> {
        definition.validate()?;
        if self.by_key.contains_key(&definition.key) {
            return Err(RegistryError::DuplicateKey(definition.key));
        }

        debug!(
            "Registered species {} ({})",
            definition.key,
            definition.behavior.name()
        );
        self.order.push(definition.key.clone());
        self.by_key.insert(definition.key.clone(), definition);
        Ok(())
    }

    /// Look up a species.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SpeciesDefinition> {
        self.by_key.get(key)
    }

    /// Look up a species, failing on unknown keys.
    pub fn lookup(&self, key: &str) -> RegistryResult<&SpeciesDefinition> {
        self.get(key)
            .ok_or_else(|| RegistryError::UnknownSpecies(key.to_string()))
    }

    /// Whether a key is registered.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Choose the fallback species.
    pub fn set_default(&mut self, key: &str) -> RegistryResult<()> {
        if !self.contains(key) {
            return Err(RegistryError::UnknownSpecies(key.to_string()));
        }
        self.default_key = Some(key.to_string());
        Ok(())
    }

    /// Fallback species: the configured default, else the first registered.
    #[must_use]
    pub fn default_species(&self) -> Option<&SpeciesDefinition> {
        self.default_key
            .as_deref()
            .or_else(|| self.order.first().map(String::as_str))
            .and_then(|key| self.get(key))
    }

    /// Look up `key`, falling back to the default species.
    pub fn resolve_or_default(&self, key: &str) -> RegistryResult<&SpeciesDefinition> {
        if let Some(definition) = self.get(key) {
            return Ok(definition);
        }
        let fallback = self
            .default_species()
            .ok_or(RegistryError::NoDefaultSpecies)?;
        warn!(
            "{}, using default species {}",
            RegistryError::UnknownSpecies(key.to_string()),
            fallback.key
        );
        Ok(fallback)
    }

    /// Keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SpeciesDefinition> {
        self.order.iter().filter_map(|key| self.by_key.get(key))
    }

    /// Number of species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Parse and register a TOML species file. Returns the number added.
    pub fn load_toml_str(&mut self, content: &str) -> RegistryResult<usize> {
        let file: SpeciesFile = toml::from_str(content)?;
        self.add_file(file)
    }

    /// Parse and register a JSON species file. Returns the number added.
    pub fn load_json_str(&mut self, content: &str) -> RegistryResult<usize> {
        let file: SpeciesFile = serde_json::from_str(content)?;
        self.add_file(file)
    }

    /// Load one `.toml` or `.json` file.
    pub fn load_file(&mut self, path: &Path) -> RegistryResult<usize> {
        if !path.exists() {
            return Err(RegistryError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            self.load_json_str(&content)
        } else {
            self.load_toml_str(&content)
        }
    }

    /// Load every `.toml` and `.json` file in a directory, in file name order.
    ///
    /// Any malformed file aborts the load.
    pub fn load_dir(&mut self, dir: &Path) -> RegistryResult<usize> {
        if !dir.is_dir() {
            return Err(RegistryError::NotFound(dir.to_path_buf()));
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path
                .extension()
                .is_some_and(|ext| ext == "toml" || ext == "json")
            {
                paths.push(path);
            }
        }
        paths.sort();

        let mut count = 0;
        for path in &paths {
            let n = self.load_file(path).map_err(|e| {
                warn!("Failed to load species file {:?}: {}", path, e);
                e
            })?;
            debug!("Loaded {} species from {:?}", n, path);
            count += n;
        }

        info!("Loaded {} species from {:?}", count, dir);
        Ok(count)
    }

    fn add_file(&mut self, file: SpeciesFile) -> RegistryResult<usize> {
        if !SchemaVersion::SPECIES.can_read(&file.schema) {
            return Err(RegistryError::VersionMismatch {
                expected: SchemaVersion::SPECIES,
                actual: file.schema,
            });
        }

        let mut count = 0;
        for definition in file.species {
            self.register(definition)?;
            count += 1;
        }

        if let Some(key) = file.default_species {
            self.set_default(&key)?;
        }
        Ok(count)
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Builds creatures from registered species.
#[derive(Debug, Clone, Copy)]
pub struct CreatureFactory<'a> {
    registry: &'a SpeciesRegistry,
}

impl<'a> CreatureFactory<'a> {
    /// Factory over a registry.
    #[must_use]
    pub const fn new(registry: &'a SpeciesRegistry) -> Self {
        Self { registry }
    }

    /// Registry in use.
    #[must_use]
    pub const fn registry(&self) -> &'a SpeciesRegistry {
        self.registry
    }

    /// Spawn a creature of `key` at `position`, falling back to the default
    /// species for unknown keys.
    pub fn spawn(&self, key: &str, position: Vec2, rng: &mut CombatRng) -> RegistryResult<Creature> {
        let definition = self.registry.resolve_or_default(key)?;
        Ok(Self::build(definition, position, rng))
    }

    /// Build a creature straight from a definition.
    #[must_use]
    pub fn build(definition: &SpeciesDefinition, position: Vec2, rng: &mut CombatRng) -> Creature {
        let attributes = definition.attributes.build(definition.boss.as_ref());
        let pacing = AttackPacing {
            base_cooldown: definition.attack.cooldown,
            attack_speed: definition.attack.attack_speed,
            is_boss: definition.is_boss(),
        };

        let mut core = CreatureCore::new(
            definition.info(),
            definition.temperament,
            attributes,
            position,
        )
        .with_attack_range(definition.attack.range)
        .with_pacing(pacing);

        if let Some(radius) = definition.boss.as_ref().and_then(|b| b.throne_wake_radius) {
            core = core.with_throne_guard(radius);
        }

        let profile = definition.behavior.instantiate(rng);
        debug!(
            "Spawned {} {} at {:?}",
            definition.key,
            core.id(),
            position
        );
        Creature::new(core, profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{BehaviorProfile, ChargerTuning};
    use crate::state::BehaviorState;
    use bestiary_common::ItemTypeId;
    use std::io::Write;

    const PACK: &str = r#"
default_species = "wolf"

[[species]]
key = "wolf"
name = "Grey Wolf"
temperament = "aggressive"
gold_reward = 5
xp_reward = 12

[species.behavior]
profile = "predator"

[species.attributes]
health = 40
damage = 8
defense = 1
speed = 90.0
detection_radius = 180.0

[[species.loot]]
item = 7
chance = 0.5
min = 1
max = 2

[[species]]
key = "boar"
name = "Boar"

[species.behavior]
profile = "charger"
detect_charge_chance = 0.9

[species.attributes]
health = 80
damage = 20
defense = 2
speed = 100.0
detection_radius = 150.0

[species.attack]
range = 40.0
cooldown = 2000.0
"#;

    fn registry() -> SpeciesRegistry {
        let mut registry = SpeciesRegistry::new();
        registry.load_toml_str(PACK).expect("valid pack");
        registry
    }

    #[test]
    fn test_load_toml_pack() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["wolf", "boar"]);

        let wolf = registry.get("wolf").expect("wolf");
        assert_eq!(wolf.temperament, Temperament::Aggressive);
        assert_eq!(wolf.attributes.health, 40);
        assert_eq!(wolf.loot[0].item, ItemTypeId::new(7));
        assert_eq!(wolf.attack, AttackProfile::default());

        let boar = registry.get("boar").expect("boar");
        assert_eq!(boar.temperament, Temperament::Neutral);
        match &boar.behavior {
            ProfileSpec::Charger(tuning) => {
                assert_eq!(tuning.detect_charge_chance, 0.9);
                assert_eq!(tuning.damage_charge_chance, ChargerTuning::default().damage_charge_chance);
            },
            other => panic!("unexpected behavior {other:?}"),
        }
        assert_eq!(boar.attack.range, 40.0);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut registry = registry();
        let result = registry.register(SpeciesDefinition::new("wolf", "Another Wolf"));
        assert!(matches!(result, Err(RegistryError::DuplicateKey(key)) if key == "wolf"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut definition = SpeciesDefinition::new("ghost", "Ghost");
        definition.attributes.dodge_chance = 1.5;
        assert!(matches!(
            definition.validate(),
            Err(RegistryError::Validation { .. })
        ));

        let mut definition = SpeciesDefinition::new("", "Nameless");
        definition.attributes.health = 10;
        assert!(definition.validate().is_err());

        let mut definition = SpeciesDefinition::new("slug", "Slug");
        definition.attributes.speed = 0.0;
        assert!(definition.validate().is_err());

        let mut definition = SpeciesDefinition::new("rat", "Rat");
        definition.loot.push(LootEntry {
            item: ItemTypeId::new(1),
            chance: 1.0,
            min: 3,
            max: 1,
        });
        assert!(definition.validate().is_err());
    }

    #[test]
    fn test_behavior_tunables_validated() {
        let mut registry = SpeciesRegistry::new();
        let result = registry.load_toml_str(
            r#"
[[species]]
key = "boar"
name = "Boar"

[species.behavior]
profile = "charger"
charge_speed_multiplier = nan
"#,
        );
        assert!(
            matches!(&result, Err(RegistryError::Validation { key, reason })
                if key == "boar" && reason.contains("charge_speed_multiplier")),
            "{result:?}"
        );
        assert!(registry.is_empty());

        let definition = SpeciesDefinition::new("ogre", "Ogre").with_behavior(ProfileSpec::Brute(
            crate::profile::BruteTuning {
                smash_chance: 2.0,
                ..Default::default()
            },
        ));
        assert!(matches!(
            definition.validate(),
            Err(RegistryError::Validation { .. })
        ));
    }

    #[test]
    fn test_schema_major_mismatch() {
        let mut registry = SpeciesRegistry::new();
        let result = registry.load_toml_str(
            r#"
[schema]
major = 2
minor = 0
patch = 0

[[species]]
key = "wolf"
name = "Wolf"
"#,
        );
        assert!(matches!(result, Err(RegistryError::VersionMismatch { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_malformed_toml() {
        let mut registry = SpeciesRegistry::new();
        let result = registry.load_toml_str("[[species]]\nkey = ");
        assert!(matches!(result, Err(RegistryError::Parse(_))));
    }

    #[test]
    fn test_unknown_default_rejected() {
        let mut registry = SpeciesRegistry::new();
        let result = registry.load_toml_str(
            r#"
default_species = "dragon"

[[species]]
key = "wolf"
name = "Wolf"
"#,
        );
        assert!(matches!(result, Err(RegistryError::UnknownSpecies(key)) if key == "dragon"));
    }

    #[test]
    fn test_json_pack() {
        let mut registry = SpeciesRegistry::new();
        let count = registry
            .load_json_str(
                r#"{
                    "species": [{
                        "key": "hawk",
                        "name": "Hawk",
                        "behavior": { "profile": "aerial", "breath_range": 200.0 },
                        "attributes": { "health": 30, "speed": 120.0 }
                    }]
                }"#,
            )
            .expect("valid json");
        assert_eq!(count, 1);
        assert_eq!(registry.default_species().map(|d| d.key.as_str()), Some("hawk"));
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let registry = registry();
        let definition = registry.resolve_or_default("basilisk").expect("fallback");
        assert_eq!(definition.key, "wolf");
        assert!(matches!(
            registry.lookup("basilisk"),
            Err(RegistryError::UnknownSpecies(_))
        ));

        let empty = SpeciesRegistry::new();
        assert!(matches!(
            empty.resolve_or_default("wolf"),
            Err(RegistryError::NoDefaultSpecies)
        ));
    }

    #[test]
    fn test_factory_spawns_from_definition() {
        let registry = registry();
        let factory = CreatureFactory::new(&registry);
        let mut rng = CombatRng::new(3);

        let boar = factory
            .spawn("boar", Vec2::new(10.0, 20.0), &mut rng)
            .expect("spawn");
        assert_eq!(boar.core().species().key, "boar");
        assert_eq!(boar.core().attributes.health(), 80);
        assert_eq!(boar.core().attributes.max_health(), 80);
        assert_eq!(boar.core().attack_range(), 40.0);
        assert_eq!(boar.core().pacing().base_cooldown, 2000.0);
        assert_eq!(boar.core().spawn_point(), Vec2::new(10.0, 20.0));
        assert_eq!(boar.state(), BehaviorState::Idle);
        assert!(matches!(boar.profile(), BehaviorProfile::Charger(_)));

        let stray = factory
            .spawn("unknown", Vec2::ZERO, &mut rng)
            .expect("fallback");
        assert_eq!(stray.core().species().key, "wolf");
        assert_eq!(stray.core().species().sprite_key, "wolf");
    }

    #[test]
    fn test_boss_modifier_scales() {
        let mut template = AttributeTemplate::default();
        template.health = 100;
        template.damage = 10;

        let definition = SpeciesDefinition::new("king", "Wolf King")
            .with_attributes(template)
            .with_boss(BossModifier {
                throne_wake_radius: Some(120.0),
                ..BossModifier::default()
            });

        let mut rng = CombatRng::new(1);
        let king = CreatureFactory::build(&definition, Vec2::ZERO, &mut rng);
        let core = king.core();
        assert_eq!(core.attributes.max_health(), 200);
        assert_eq!(core.attributes.damage, 15);
        assert!(core.species().is_boss);
        assert!(core.pacing().is_boss);
        assert!((core.species().scale - 1.5).abs() < 1e-6);
        let throne = core.throne().expect("throne guard");
        assert_eq!(throne.wake_radius, 120.0);
        assert!(!throne.awake);
    }

    #[test]
    fn test_load_dir_with_tempfile() {
        let dir = tempfile::tempdir().expect("tempdir");

        let mut a = fs::File::create(dir.path().join("a_beasts.toml")).expect("create");
        a.write_all(PACK.as_bytes()).expect("write");

        let mut b = fs::File::create(dir.path().join("b_birds.json")).expect("create");
        b.write_all(br#"{"species":[{"key":"crow","name":"Crow"}]}"#)
            .expect("write");

        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let mut registry = SpeciesRegistry::new();
        let count = registry.load_dir(dir.path()).expect("load");
        assert_eq!(count, 3);
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["wolf", "boar", "crow"]);
        assert_eq!(registry.default_species().map(|d| d.key.as_str()), Some("wolf"));
    }

    #[test]
    fn test_load_dir_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut registry = SpeciesRegistry::new();
        let result = registry.load_dir(&dir.path().join("nope"));
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_load_dir_propagates_bad_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("bad.toml"), "[[species]]\nkey = 3").expect("write");

        let mut registry = SpeciesRegistry::new();
        assert!(registry.load_dir(dir.path()).is_err());
    }
}
