//! Physics world management with Rapier3D.

use engine_core::{Transform, Vec3};
use glam::Quat;
use rapier3d::crossbeam::channel::{unbounded, Receiver};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

use crate::collision::CollisionGroup;

/// A contact that started this step, identified by the collider tags
/// (`user_data`) each side was created with. Untagged scenery reports
/// as zero; a contact where neither side is tagged is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactStarted {
    pub a: u64,
    pub b: u64,
}

fn env_collision_groups() -> InteractionGroups {
    let (membership, filter) = CollisionGroup::environment();
    InteractionGroups::new(membership, filter)
}

fn ship_collision_groups() -> InteractionGroups {
    let (membership, filter) = CollisionGroup::ship();
    InteractionGroups::new(membership, filter)
}

fn projectile_collision_groups() -> InteractionGroups {
    let (membership, filter) = CollisionGroup::projectile();
    InteractionGroups::new(membership, filter)
}

fn isometry_from(transform: &Transform) -> Isometry3<Real> {
    let p = transform.position;
    let r = transform.rotation;
    Isometry3::from_parts(
        Translation3::new(p.x, p.y, p.z),
        UnitQuaternion::from_quaternion(Quaternion::new(r.w, r.x, r.y, r.z)),
    )
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
    event_collector: ChannelEventCollector,
    collision_events: Receiver<CollisionEvent>,
    contact_force_events: Receiver<ContactForceEvent>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world. Gravity is zero: ships and
    /// projectiles fly force-free in open space.
    pub fn new() -> Self {
        let (collision_send, collision_recv) = unbounded();
        let (force_send, force_recv) = unbounded();
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, 0.0, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: ChannelEventCollector::new(collision_send, force_send),
            collision_events: collision_recv,
            contact_force_events: force_recv,
        }
    }

    /// Step the physics simulation, collecting contact events.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );
    }

    /// Drain the contacts that started during the last step, mapped to
    /// collider tags. Stopped events are skipped, as are contacts where
    /// neither side carries a tag.
    pub fn drain_contacts(&mut self) -> Vec<ContactStarted> {
        // Force events are collected but unused; keep the channel empty.
        while self.contact_force_events.try_recv().is_ok() {}

        let mut contacts = Vec::new();
        while let Ok(event) = self.collision_events.try_recv() {
            if let CollisionEvent::Started(h1, h2, _) = event {
                let a = self.collider_tag(h1);
                let b = self.collider_tag(h2);
                if a != 0 || b != 0 {
                    contacts.push(ContactStarted { a, b });
                }
            }
        }
        contacts
    }

    fn collider_tag(&self, handle: ColliderHandle) -> u64 {
        self.collider_set
            .get(handle)
            .map(|c| c.user_data as u64)
            .unwrap_or(0)
    }

    /// Add a dynamic rigid body for a physics-driven ship.
    pub fn add_dynamic_body(&mut self, transform: &Transform) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::dynamic()
            .position(isometry_from(transform))
            .can_sleep(false)
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Add a kinematic rigid body for a core-integrated ship.
    pub fn add_kinematic_body(&mut self, transform: &Transform) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::kinematic_position_based()
            .position(isometry_from(transform))
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Add a dynamic body for a projectile: constant velocity, no
    /// gravity, CCD so fast shots cannot tunnel through a ship.
    pub fn add_projectile_body(&mut self, transform: &Transform, velocity: Vec3) -> RigidBodyHandle {
        let rigid_body = RigidBodyBuilder::dynamic()
            .position(isometry_from(transform))
            .linvel(vector![velocity.x, velocity.y, velocity.z])
            .gravity_scale(0.0)
            .ccd_enabled(true)
            .can_sleep(false)
            .build();
        self.rigid_body_set.insert(rigid_body)
    }

    /// Add a capsule collider for a ship hull, tagged for contact events.
    pub fn add_ship_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        half_height: f32,
        radius: f32,
        tag: u64,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::capsule_y(half_height, radius)
            .collision_groups(ship_collision_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(tag as u128)
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Add a sphere collider for a projectile, tagged for contact events.
    pub fn add_projectile_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        radius: f32,
        tag: u64,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::ball(radius)
            .collision_groups(projectile_collision_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(tag as u128)
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set)
    }

    /// Add a static cuboid collider for environment geometry (asteroid
    /// slab, station wall). No parent body, no tag: contacts against it
    /// report the scenery side as zero.
    pub fn add_static_cuboid(&mut self, translation: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(vector![translation.x, translation.y, translation.z])
            .collision_groups(env_collision_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.collider_set.insert(collider)
    }

    /// Get the transform of a rigid body.
    pub fn get_body_transform(&self, handle: RigidBodyHandle) -> Option<Transform> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            let rot = body.rotation();
            Transform {
                position: Vec3::new(pos.x, pos.y, pos.z),
                rotation: Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
                scale: Vec3::ONE,
            }
        })
    }

    /// True if the body is simulated by the solver (not kinematic).
    pub fn is_dynamic(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .get(handle)
            .map(|body| body.is_dynamic())
            .unwrap_or(false)
    }

    /// Re-assert that a body is dynamic. Physics-driven ships expect a
    /// simulated body; if the host spawned it in another mode, fix it
    /// here rather than failing.
    pub fn ensure_dynamic(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if !body.is_dynamic() {
                log::warn!("body {:?} was not simulating; switching to dynamic", handle);
                body.set_body_type(RigidBodyType::Dynamic, true);
            }
        }
    }

    /// Push a core-owned pose to a kinematic body so colliders follow
    /// the transform.
    pub fn set_kinematic_pose(&mut self, handle: RigidBodyHandle, transform: &Transform) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_next_kinematic_position(isometry_from(transform));
        }
    }

    /// Remove a rigid body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}
