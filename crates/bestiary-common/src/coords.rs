//! Planar vector helpers used for range checks and movement intent.
//!
//! Positions are owned by the host world; the engine only reads them through
//! a query interface and computes velocity vectors from them.

pub use glam::Vec2;

/// Distances below this are treated as "same point" when normalizing.
const EPSILON: f32 = 0.0001;

/// Returns the unit vector pointing from `from` to `to`, or zero when the
/// points coincide.
#[must_use]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    if delta.length() < EPSILON {
        Vec2::ZERO
    } else {
        delta.normalize()
    }
}

/// Returns the unit vector pointing away from `threat`.
///
/// When both points coincide there is no meaningful away direction, so an
/// arbitrary but stable one (+X) is used to keep a fleeing creature moving.
#[must_use]
pub fn direction_away(from: Vec2, threat: Vec2) -> Vec2 {
    let away = direction_to(threat, from);
    if away == Vec2::ZERO {
        Vec2::X
    } else {
        away
    }
}

/// Returns a unit vector for an angle in radians.
#[must_use]
pub fn unit_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_to_normalized() {
        let dir = direction_to(Vec2::ZERO, Vec2::new(3.0, 4.0));
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!((dir.x - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_direction_to_same_point() {
        assert_eq!(direction_to(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
    }

    #[test]
    fn test_direction_away_opposes_threat() {
        let away = direction_away(Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert!((away.x + 1.0).abs() < 1e-5);
        assert_eq!(direction_away(Vec2::ZERO, Vec2::ZERO), Vec2::X);
    }
}
