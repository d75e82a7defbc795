//! Per-tick routing of player commands into the flight model.

use engine_core::{Transform, Velocity};
use hecs::{Entity, World};
use input::ShipInput;
use physics::{PhysicsBody, PhysicsWorld};

use crate::movement::{MotionContext, ShipMotion};
use crate::ship::{PlayerControlBinding, ShipTuning};

/// Feed this tick's commands to every player-bound ship. Returns the
/// ships that requested a shot; firing spawns entities and must happen
/// after the query ends.
pub fn route(
    world: &mut World,
    physics: &mut PhysicsWorld,
    input: &mut ShipInput,
    dt: f32,
) -> Vec<Entity> {
    let axis = input.rotation_axis();
    let thrusting = input.is_thrusting();
    let fire = input.take_fire();

    let mut firers = Vec::new();
    for (entity, (motion, transform, velocity, tuning, body, _binding)) in world.query_mut::<(
        &mut ShipMotion,
        &mut Transform,
        &mut Velocity,
        &ShipTuning,
        &PhysicsBody,
        &PlayerControlBinding,
    )>() {
        let mut ctx = MotionContext {
            transform,
            velocity,
            tuning,
            body: body.rigid_body,
            physics: &mut *physics,
        };
        // Rotate every tick, even at zero input, so the flight model can
        // clear its angular target.
        motion.0.rotate(&mut ctx, axis, dt);
        if thrusting {
            motion.0.thrust(&mut ctx, dt);
        } else {
            motion.0.thrust_idle(&mut ctx);
        }
        if fire {
            firers.push(entity);
        }
    }
    firers
}
