//! Predators: chase on sight, standard gated attacks.

use crate::behavior::Behavior;

/// A predator has no state beyond its core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predator;

impl Behavior for Predator {}
