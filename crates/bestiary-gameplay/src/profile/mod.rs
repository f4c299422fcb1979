//! Species behavior profiles.
//!
//! [`ProfileSpec`] is the authored form (a `profile` tag plus tunables) read
//! from species files. [`BehaviorProfile`] is the runtime form carrying the
//! profile's timers and flags, and hands out the [`Behavior`] implementation
//! the creature dispatches through.

mod aerial;
mod ambusher;
mod brute;
mod charger;
mod herder;
mod predator;

pub use aerial::{Aerial, AerialTuning};
pub use ambusher::{Ambusher, AmbusherTuning};
pub use brute::{Brute, BruteTuning};
pub use charger::{Charger, ChargerTuning};
pub use herder::{Herder, HerderTuning};
pub use predator::Predator;

use serde::{Deserialize, Serialize};

use crate::behavior::Behavior;
use crate::rng::CombatRng;

/// Authored behavior of a species.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "profile", rename_all = "snake_case")]
pub enum ProfileSpec {
    /// Flee on threat, rage when cornered.
    Herder(HerderTuning),
    /// Chase on sight.
    #[default]
    Predator,
    /// Territorial charger.
    Charger(ChargerTuning),
    /// Tactical ambusher.
    Ambusher(AmbusherTuning),
    /// Aerial breather.
    Aerial(AerialTuning),
    /// Brute smasher.
    Brute(BruteTuning),
}

impl ProfileSpec {
    /// Tag name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Herder(_) => "herder",
            Self::Predator => "predator",
            Self::Charger(_) => "charger",
            Self::Ambusher(_) => "ambusher",
            Self::Aerial(_) => "aerial",
            Self::Brute(_) => "brute",
        }
    }

    /// Build the runtime profile. Spawn-time rolls draw from `rng`.
    pub fn instantiate(&self, rng: &mut CombatRng) -> BehaviorProfile {
        match self {
            Self::Herder(tuning) => BehaviorProfile::Herder(Herder::new(tuning.clone())),
            Self::Predator => BehaviorProfile::Predator(Predator),
            Self::Charger(tuning) => BehaviorProfile::Charger(Charger::new(tuning.clone())),
            Self::Ambusher(tuning) => {
                BehaviorProfile::Ambusher(Ambusher::spawn(tuning.clone(), rng))
            },
            Self::Aerial(tuning) => BehaviorProfile::Aerial(Aerial::new(tuning.clone())),
            Self::Brute(tuning) => BehaviorProfile::Brute(Brute::new(tuning.clone())),
        }
    }

    /// Checks the tunables. The error names the first bad field.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Herder(tuning) => tuning.validate(),
            Self::Predator => Ok(()),
            Self::Charger(tuning) => tuning.validate(),
            Self::Ambusher(tuning) => tuning.validate(),
            Self::Aerial(tuning) => tuning.validate(),
            Self::Brute(tuning) => tuning.validate(),
        }
    }
}

/// Range a tunable must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bound {
    /// Within `[0, 1]`.
    Fraction,
    /// Finite and greater than zero.
    Positive,
}

pub(crate) fn check_tunables(fields: &[(&str, f32, Bound)]) -> Result<(), String> {
    for &(name, value, bound) in fields {
        let ok = match bound {
            Bound::Fraction => (0.0..=1.0).contains(&value),
            Bound::Positive => value.is_finite() && value > 0.0,
        };
        if !ok {
            return Err(format!("{name} = {value} is out of range"));
        }
    }
    Ok(())
}

/// Runtime behavior of one creature.
#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorProfile {
    /// Herder.
    Herder(Herder),
    /// Predator.
    Predator(Predator),
    /// Territorial charger.
    Charger(Charger),
    /// Tactical ambusher.
    Ambusher(Ambusher),
    /// Aerial breather.
    Aerial(Aerial),
    /// Brute smasher.
    Brute(Brute),
}

impl BehaviorProfile {
    /// Handlers for this profile.
    #[must_use]
    pub fn behavior(&self) -> &dyn Behavior {
        match self {
            Self::Herder(b) => b,
            Self::Predator(b) => b,
            Self::Charger(b) => b,
            Self::Ambusher(b) => b,
            Self::Aerial(b) => b,
            Self::Brute(b) => b,
        }
    }

    /// Mutable handlers for this profile.
    pub fn behavior_mut(&mut self) -> &mut dyn Behavior {
        match self {
            Self::Herder(b) => b,
            Self::Predator(b) => b,
            Self::Charger(b) => b,
            Self::Ambusher(b) => b,
            Self::Aerial(b) => b,
            Self::Brute(b) => b,
        }
    }

    /// Tag name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Herder(_) => "herder",
            Self::Predator(_) => "predator",
            Self::Charger(_) => "charger",
            Self::Ambusher(_) => "ambusher",
            Self::Aerial(_) => "aerial",
            Self::Brute(_) => "brute",
        }
    }
}
