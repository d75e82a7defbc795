//! Ship types, tuning, and spawning.

use engine_core::{Health, Transform, Velocity};
use hecs::{Entity, World};
use physics::{PhysicsBody, PhysicsWorld};
use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;
use crate::movement::{KinematicMotion, PhysicsMotion, ShipMotion};

/// Flight model variant, chosen at spawn and fixed for the ship's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    /// The core integrates velocity and position itself.
    Kinematic,
    /// A rigid body flies the ship; the core steers it with velocity targets.
    Physics,
}

/// Per-type movement tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShipTuning {
    /// Kinematic mode: acceleration along the nose. Physics mode: the
    /// cruise speed the velocity target is set to.
    #[serde(default = "default_thrust_force")]
    pub thrust_force: f32,
    /// Roll rate in degrees per second.
    #[serde(default = "default_turn_speed")]
    pub turn_speed: f32,
    /// Per-tick velocity multiplier, (0, 1]. Closer to 1 = less drag.
    #[serde(default = "default_drag")]
    pub drag: f32,
    /// Hard speed clamp.
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    /// Smoothing rate toward the linear velocity target (per second).
    #[serde(default = "default_linear_smoothing")]
    pub linear_smoothing: f32,
    /// Smoothing rate toward the angular velocity target (per second).
    #[serde(default = "default_angular_smoothing")]
    pub angular_smoothing: f32,
    /// Clamp on the commanded roll rate, degrees per second.
    #[serde(default = "default_max_angular_speed")]
    pub max_angular_speed: f32,
}

fn default_thrust_force() -> f32 {
    1400.0
}
fn default_turn_speed() -> f32 {
    140.0
}
fn default_drag() -> f32 {
    0.985
}
fn default_max_speed() -> f32 {
    3000.0
}
fn default_linear_smoothing() -> f32 {
    3.0
}
fn default_angular_smoothing() -> f32 {
    6.0
}
fn default_max_angular_speed() -> f32 {
    720.0
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            thrust_force: default_thrust_force(),
            turn_speed: default_turn_speed(),
            drag: default_drag(),
            max_speed: default_max_speed(),
            linear_smoothing: default_linear_smoothing(),
            angular_smoothing: default_angular_smoothing(),
            max_angular_speed: default_max_angular_speed(),
        }
    }
}

/// Everything needed to spawn a ship of a given type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShipSpec {
    #[serde(default = "default_max_health")]
    pub max_health: f32,
    /// Hull capsule half height (along the nose).
    #[serde(default = "default_collider_half_height")]
    pub collider_half_height: f32,
    /// Hull capsule radius.
    #[serde(default = "default_collider_radius")]
    pub collider_radius: f32,
    /// Effect requested when the ship is destroyed. Optional: a ship
    /// without one just disappears.
    #[serde(default = "default_explosion_effect")]
    pub explosion_effect: Option<EffectKind>,
    #[serde(default)]
    pub tuning: ShipTuning,
}

fn default_max_health() -> f32 {
    100.0
}
fn default_collider_half_height() -> f32 {
    60.0
}
fn default_collider_radius() -> f32 {
    60.0
}
fn default_explosion_effect() -> Option<EffectKind> {
    Some(EffectKind::Explosion)
}

impl Default for ShipSpec {
    fn default() -> Self {
        Self {
            max_health: default_max_health(),
            collider_half_height: default_collider_half_height(),
            collider_radius: default_collider_radius(),
            explosion_effect: default_explosion_effect(),
            tuning: ShipTuning::default(),
        }
    }
}

/// Marker component for ship entities, carrying the per-ship effect
/// references.
#[derive(Debug, Clone, Copy)]
pub struct Ship {
    pub explosion_effect: Option<EffectKind>,
}

/// Tag: this ship is driven by the player's `ShipInput`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerControlBinding;

/// Spawn a ship: ECS entity, rigid body in the mode's body type, hull
/// collider tagged for contact events, and the matching flight model.
pub fn spawn_ship(
    world: &mut World,
    physics: &mut PhysicsWorld,
    spec: &ShipSpec,
    mode: MotionMode,
    transform: Transform,
) -> Entity {
    let entity = world.spawn((
        transform,
        Velocity::default(),
        Health::new(spec.max_health),
        Ship {
            explosion_effect: spec.explosion_effect,
        },
        spec.tuning,
    ));

    let body = match mode {
        MotionMode::Kinematic => physics.add_kinematic_body(&transform),
        MotionMode::Physics => physics.add_dynamic_body(&transform),
    };
    let tag = entity.to_bits().get();
    let collider =
        physics.add_ship_collider(body, spec.collider_half_height, spec.collider_radius, tag);
    if mode == MotionMode::Physics {
        physics.ensure_dynamic(body);
    }

    let motion = match mode {
        MotionMode::Kinematic => ShipMotion(Box::new(KinematicMotion)),
        MotionMode::Physics => ShipMotion(Box::new(PhysicsMotion::new())),
    };
    world
        .insert(entity, (PhysicsBody::with_collider(body, collider), motion))
        .ok();

    log::info!("spawned {:?} ship {:?}", mode, entity);
    entity
}
