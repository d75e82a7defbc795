//! Projectile lifecycle: fire, fly, hit, despawn.

use engine_core::{Lifetime, Transform, Velocity};
use glam::Vec3;
use hecs::{Entity, World};
use physics::{ContactStarted, PhysicsBody, PhysicsWorld};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::{EffectKind, EffectSink};
use crate::health::DamageEvent;
use crate::state::DespawnQueue;

/// Spawn-time failures. Surfaced to the caller, logged, never fatal.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("firing ship no longer exists")]
    FirerMissing,
}

/// Projectile parameters, shared by every shot of a weapon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectileSpec {
    #[serde(default = "default_damage")]
    pub damage: f32,
    /// Seconds until a shot that hit nothing despawns.
    #[serde(default = "default_life_time")]
    pub life_time: f32,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_radius")]
    pub radius: f32,
    /// Spawn offset in the firer's local axes: x along forward, y along
    /// right, z along up.
    #[serde(default = "default_muzzle_offset")]
    pub muzzle_offset: Vec3,
    #[serde(default = "default_muzzle_flash")]
    pub muzzle_flash: Option<EffectKind>,
    #[serde(default = "default_impact_effect")]
    pub impact_effect: Option<EffectKind>,
}

fn default_damage() -> f32 {
    10.0
}
fn default_life_time() -> f32 {
    5.0
}
fn default_speed() -> f32 {
    3000.0
}
fn default_radius() -> f32 {
    8.0
}
fn default_muzzle_offset() -> Vec3 {
    Vec3::new(0.0, 0.0, 150.0)
}
fn default_muzzle_flash() -> Option<EffectKind> {
    Some(EffectKind::MuzzleFlash)
}
fn default_impact_effect() -> Option<EffectKind> {
    Some(EffectKind::ProjectileImpact)
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            damage: default_damage(),
            life_time: default_life_time(),
            speed: default_speed(),
            radius: default_radius(),
            muzzle_offset: default_muzzle_offset(),
            muzzle_flash: default_muzzle_flash(),
            impact_effect: default_impact_effect(),
        }
    }
}

/// Live projectile state.
#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    pub damage: f32,
    /// Ship that fired the shot, for damage attribution.
    pub firer: Entity,
    /// Impact already handled; duplicate contact events are ignored.
    pub spent: bool,
    pub impact_effect: Option<EffectKind>,
}

/// Fire a shot from `firer`: spawn at the muzzle offset in the firer's
/// local axes, oriented like the firer, flying along its nose.
pub fn fire(
    world: &mut World,
    physics: &mut PhysicsWorld,
    effects: &mut dyn EffectSink,
    firer: Entity,
    spec: &ProjectileSpec,
) -> Result<Entity, SpawnError> {
    let (position, rotation, muzzle_velocity) = {
        let firer_transform = world
            .get::<&Transform>(firer)
            .map_err(|_| SpawnError::FirerMissing)?;
        let offset = spec.muzzle_offset;
        let position = firer_transform.position
            + firer_transform.forward() * offset.x
            + firer_transform.right() * offset.y
            + firer_transform.up() * offset.z;
        (
            position,
            firer_transform.rotation,
            firer_transform.up() * spec.speed,
        )
    };

    let transform = Transform::from_position_rotation(position, rotation);
    let entity = world.spawn((
        transform,
        Velocity::new(muzzle_velocity),
        Lifetime::new(spec.life_time),
        Projectile {
            damage: spec.damage,
            firer,
            spent: false,
            impact_effect: spec.impact_effect,
        },
    ));
    let tag = entity.to_bits().get();
    let body = physics.add_projectile_body(&transform, muzzle_velocity);
    let collider = physics.add_projectile_collider(body, spec.radius, tag);
    world
        .insert_one(entity, PhysicsBody::with_collider(body, collider))
        .ok();

    if let Some(kind) = spec.muzzle_flash {
        effects.play(kind, position, rotation);
    }
    log::debug!("ship {:?} fired projectile {:?}", firer, entity);
    Ok(entity)
}

/// Count down projectile lifetimes; expired shots despawn with no damage.
pub fn update_lifetimes(world: &mut World, despawn: &mut DespawnQueue, dt: f32) {
    for (entity, (lifetime, _)) in world.query_mut::<(&mut Lifetime, &Projectile)>() {
        if lifetime.update(dt) {
            log::debug!("projectile {:?} expired", entity);
            despawn.push(entity);
        }
    }
}

/// Resolve the tick's contacts: each side that is a live projectile
/// damages what it struck and retires. Duplicate events for the same
/// shot are no-ops.
pub fn handle_contacts(
    world: &mut World,
    effects: &mut dyn EffectSink,
    contacts: &[ContactStarted],
    damage_events: &mut Vec<DamageEvent>,
    despawn: &mut DespawnQueue,
) {
    for contact in contacts {
        resolve_hit(world, effects, contact.a, contact.b, damage_events, despawn);
        resolve_hit(world, effects, contact.b, contact.a, damage_events, despawn);
    }
}

fn resolve_hit(
    world: &mut World,
    effects: &mut dyn EffectSink,
    projectile_tag: u64,
    other_tag: u64,
    damage_events: &mut Vec<DamageEvent>,
    despawn: &mut DespawnQueue,
) {
    let Some(entity) = Entity::from_bits(projectile_tag) else {
        return;
    };
    let Ok(mut projectile) = world.get::<&mut Projectile>(entity) else {
        return;
    };
    if projectile.spent {
        return;
    }
    projectile.spent = true;
    let damage = projectile.damage;
    let firer = projectile.firer;
    let impact_effect = projectile.impact_effect;
    drop(projectile);

    // Damage whatever was struck, unless it is the shot itself or the
    // ship that fired it. Terrain and effect-less targets still consume
    // the shot below.
    if let Some(other) = Entity::from_bits(other_tag) {
        if other != entity && other != firer && world.contains(other) {
            damage_events.push(DamageEvent {
                target: other,
                amount: damage,
                instigator: Some(firer),
            });
        }
    }

    if let Some(kind) = impact_effect {
        if let Ok(transform) = world.get::<&Transform>(entity) {
            effects.play(kind, transform.position, transform.rotation);
        }
    }
    despawn.push(entity);
}
