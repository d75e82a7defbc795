//! Collision groups and filtering.

use rapier3d::prelude::*;

/// Collision groups for different entity types.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Static environment (station debris, asteroids)
    Environment = 1 << 0,
    /// Ships, both player and drone
    Ship = 1 << 1,
    /// Projectiles in flight
    Projectile = 1 << 2,
}

impl CollisionGroup {
    /// Create a collision group for environment.
    pub fn environment() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Environment as u32);
        let filter = Group::ALL;
        (membership, filter)
    }

    /// Create a collision group for ships.
    pub fn ship() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Ship as u32);
        let filter = Group::from_bits_retain(
            Self::Environment as u32 | Self::Ship as u32 | Self::Projectile as u32,
        );
        (membership, filter)
    }

    /// Create a collision group for projectiles. Projectiles do not
    /// collide with each other.
    pub fn projectile() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Projectile as u32);
        let filter = Group::from_bits_retain(Self::Environment as u32 | Self::Ship as u32);
        (membership, filter)
    }
}

/// Component linking an ECS entity to its physics handles.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub rigid_body: RigidBodyHandle,
    pub collider: Option<ColliderHandle>,
}

impl PhysicsBody {
    pub fn with_collider(rigid_body: RigidBodyHandle, collider: ColliderHandle) -> Self {
        Self {
            rigid_body,
            collider: Some(collider),
        }
    }
}
