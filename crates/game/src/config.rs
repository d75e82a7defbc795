//! Sim configuration (tick rate, ship tuning, projectile spec).
//! Loaded from sim.ron at startup.

use serde::{Deserialize, Serialize};

use crate::projectile::ProjectileSpec;
use crate::ship::ShipSpec;

/// Persistent sim settings. Loaded from `sim.ron` in the current
/// directory; a missing or partial file falls back to defaults per field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Fixed simulation rate in ticks per second.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f32,
    /// Spec used for ships spawned from config.
    #[serde(default)]
    pub ship: ShipSpec,
    /// Spec used for every shot fired.
    #[serde(default)]
    pub projectile: ProjectileSpec,
}

fn default_tick_hz() -> f32 {
    60.0
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            ship: ShipSpec::default(),
            projectile: ProjectileSpec::default(),
        }
    }
}

impl SimConfig {
    /// Load config from `sim.ron`. If the file is missing or invalid,
    /// returns default config.
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Duration of one simulation tick in seconds.
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_hz
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("sim.ron")
}
