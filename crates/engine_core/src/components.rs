//! Common ECS components used across the sim.

use glam::Vec3;

/// Velocity component for moving entities.
///
/// In kinematic flight the linear part is authoritative; for
/// physics-driven bodies both parts are read-back mirrors of the
/// rigid body and exist for observability only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Velocity {
    pub fn new(linear: Vec3) -> Self {
        Self {
            linear,
            angular: Vec3::ZERO,
        }
    }
}

/// Health component for damageable entities.
#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Subtract exactly `amount`. The value may cross below zero at the
    /// moment of death; the entity is removed before anything reads it again.
    pub fn take_damage(&mut self, amount: f32) {
        self.current -= amount;
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Lifetime component for temporary entities (projectiles, debris).
#[derive(Debug, Clone, Copy)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Lifetime {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    /// Count down; returns true once the lifetime has expired.
    pub fn update(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_take_damage_subtracts_exact_amount() {
        let mut h = Health::new(100.0);
        h.take_damage(60.0);
        assert_eq!(h.current, 40.0);
        assert!(!h.is_dead());
        h.take_damage(50.0);
        assert_eq!(h.current, -10.0);
        assert!(h.is_dead());
    }

    #[test]
    fn health_dead_exactly_at_zero() {
        let mut h = Health::new(25.0);
        h.take_damage(25.0);
        assert!(h.is_dead());
    }

    #[test]
    fn lifetime_expires_after_duration() {
        let mut l = Lifetime::new(0.1);
        assert!(!l.update(0.05));
        assert!(l.update(0.06));
    }
}
