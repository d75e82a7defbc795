//! Capability surface the movement core uses to drive physics bodies.

use engine_core::Vec3;
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::prelude::*;

use crate::physics_world::PhysicsWorld;

/// Pull-back applied after a swept move so the mover does not end the
/// tick embedded in the surface it hit.
const SWEEP_SKIN: f32 = 0.1;

/// Velocity access and swept movement on a rigid body.
///
/// The movement strategies talk to the physics engine only through this
/// trait; tests substitute an in-memory implementation.
pub trait PhysicsHandle {
    fn linear_velocity(&self, body: RigidBodyHandle) -> Vec3;
    fn set_linear_velocity(&mut self, body: RigidBodyHandle, velocity: Vec3);
    fn angular_velocity(&self, body: RigidBodyHandle) -> Vec3;
    fn set_angular_velocity(&mut self, body: RigidBodyHandle, velocity: Vec3);

    /// Move a kinematic body by `delta`, shortened by whatever the
    /// collision system finds in the way. Returns the applied delta.
    fn sweep_move(&mut self, body: RigidBodyHandle, delta: Vec3) -> Vec3;
}

impl PhysicsHandle for PhysicsWorld {
    fn linear_velocity(&self, body: RigidBodyHandle) -> Vec3 {
        self.rigid_body_set
            .get(body)
            .map(|b| {
                let v = b.linvel();
                Vec3::new(v.x, v.y, v.z)
            })
            .unwrap_or(Vec3::ZERO)
    }

    fn set_linear_velocity(&mut self, body: RigidBodyHandle, velocity: Vec3) {
        if let Some(b) = self.rigid_body_set.get_mut(body) {
            b.set_linvel(vector![velocity.x, velocity.y, velocity.z], true);
        }
    }

    fn angular_velocity(&self, body: RigidBodyHandle) -> Vec3 {
        self.rigid_body_set
            .get(body)
            .map(|b| {
                let v = b.angvel();
                Vec3::new(v.x, v.y, v.z)
            })
            .unwrap_or(Vec3::ZERO)
    }

    fn set_angular_velocity(&mut self, body: RigidBodyHandle, velocity: Vec3) {
        if let Some(b) = self.rigid_body_set.get_mut(body) {
            b.set_angvel(vector![velocity.x, velocity.y, velocity.z], true);
        }
    }

    fn sweep_move(&mut self, body: RigidBodyHandle, delta: Vec3) -> Vec3 {
        let dist = delta.length();
        if dist <= 1e-6 {
            return Vec3::ZERO;
        }
        let dir = delta / dist;

        let (collider, current) = match self.rigid_body_set.get(body) {
            Some(b) => (b.colliders().first().copied(), *b.translation()),
            None => return Vec3::ZERO,
        };

        let applied = match collider.and_then(|c| self.collider_set.get(c)) {
            Some(co) => {
                let shape = co.shared_shape().clone();
                let shape_pos = *co.position();
                let options = ShapeCastOptions {
                    max_time_of_impact: dist,
                    target_distance: 0.0,
                    stop_at_penetration: false,
                    compute_impact_geometry_on_penetration: false,
                };
                let filter = QueryFilter::default().exclude_rigid_body(body);
                match self.query_pipeline.cast_shape(
                    &self.rigid_body_set,
                    &self.collider_set,
                    &shape_pos,
                    &vector![dir.x, dir.y, dir.z],
                    &*shape,
                    options,
                    filter,
                ) {
                    Some((_, hit)) => dir * (hit.time_of_impact - SWEEP_SKIN).max(0.0),
                    None => delta,
                }
            }
            // No collider: nothing can block the move.
            None => delta,
        };

        if let Some(b) = self.rigid_body_set.get_mut(body) {
            let next = current + vector![applied.x, applied.y, applied.z];
            b.set_next_kinematic_translation(next);
        }
        applied
    }
}
