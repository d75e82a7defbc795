//! Damage propagation and the destruction sequence.

use engine_core::{Health, Transform};
use hecs::{Entity, World};

use crate::effects::EffectSink;
use crate::ship::Ship;
use crate::state::DespawnQueue;

/// A damage request raised during the tick, applied in one pass.
#[derive(Debug, Clone, Copy)]
pub struct DamageEvent {
    pub target: Entity,
    pub amount: f32,
    /// Ship credited with the damage.
    pub instigator: Option<Entity>,
}

/// Apply queued damage. An entity crossing zero runs its destruction
/// sequence exactly once: effect request, then deferred removal.
pub fn apply_damage_events(
    world: &mut World,
    effects: &mut dyn EffectSink,
    events: &mut Vec<DamageEvent>,
    despawn: &mut DespawnQueue,
) {
    for event in events.drain(..) {
        // An entity already headed for removal is past taking damage.
        if despawn.contains(event.target) {
            continue;
        }
        let Ok(mut health) = world.get::<&mut Health>(event.target) else {
            continue;
        };
        health.take_damage(event.amount);
        let dead = health.is_dead();
        drop(health);

        log::debug!(
            "entity {:?} took {} damage from {:?}",
            event.target,
            event.amount,
            event.instigator
        );

        if dead && despawn.push(event.target) {
            destroy(world, effects, event.target);
        }
    }
}

/// One-shot destruction: request the configured explosion effect at the
/// entity's final pose. An entity without one just disappears.
fn destroy(world: &World, effects: &mut dyn EffectSink, entity: Entity) {
    let explosion = world
        .get::<&Ship>(entity)
        .ok()
        .and_then(|ship| ship.explosion_effect);
    if let Some(kind) = explosion {
        if let Ok(transform) = world.get::<&Transform>(entity) {
            effects.play(kind, transform.position, transform.rotation);
        }
    }
    log::info!("entity {:?} destroyed", entity);
}
