//! Simulation state and the fixed-order tick pipeline.

use std::collections::HashSet;

use engine_core::{Transform, Velocity};
use hecs::{Entity, World};
use input::ShipInput;
use physics::{PhysicsBody, PhysicsWorld};

use crate::config::SimConfig;
use crate::control;
use crate::effects::EffectSink;
use crate::health::{self, DamageEvent};
use crate::movement::{MotionContext, ShipMotion};
use crate::projectile;
use crate::ship::{self, MotionMode, PlayerControlBinding, ShipSpec, ShipTuning};

/// Entities scheduled for removal. Scheduling is idempotent; the flush
/// between ticks is the only place entities and their physics bodies
/// actually disappear, so nothing mid-tick ever dangles.
#[derive(Default)]
pub struct DespawnQueue {
    pending: Vec<Entity>,
    seen: HashSet<Entity>,
}

impl DespawnQueue {
    /// Schedule `entity`; returns false if it was already scheduled.
    pub fn push(&mut self, entity: Entity) -> bool {
        if self.seen.insert(entity) {
            self.pending.push(entity);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.seen.contains(&entity)
    }

    pub(crate) fn flush(&mut self, world: &mut World, physics: &mut PhysicsWorld) {
        for entity in self.pending.drain(..) {
            if let Ok(body) = world.get::<&PhysicsBody>(entity) {
                let handle = body.rigid_body;
                drop(body);
                physics.remove_body(handle);
            }
            world.despawn(entity).ok();
            self.seen.remove(&entity);
        }
    }
}

/// The whole sim: ECS world, physics, player input, and tick plumbing.
pub struct SimState {
    pub world: World,
    pub physics: PhysicsWorld,
    pub input: ShipInput,
    pub config: SimConfig,
    effects: Box<dyn EffectSink>,
    despawn: DespawnQueue,
    damage_events: Vec<DamageEvent>,
    tick_count: u64,
}

impl SimState {
    pub fn new(config: SimConfig, effects: Box<dyn EffectSink>) -> Self {
        Self {
            world: World::new(),
            physics: PhysicsWorld::new(),
            input: ShipInput::new(),
            config,
            effects,
            despawn: DespawnQueue::default(),
            damage_events: Vec::new(),
            tick_count: 0,
        }
    }

    /// Spawn a ship from a spec.
    pub fn spawn_ship(
        &mut self,
        spec: &ShipSpec,
        mode: MotionMode,
        transform: Transform,
    ) -> Entity {
        ship::spawn_ship(&mut self.world, &mut self.physics, spec, mode, transform)
    }

    /// Mark a ship as driven by the player's `ShipInput`.
    pub fn bind_player(&mut self, entity: Entity) {
        self.world.insert_one(entity, PlayerControlBinding).ok();
    }

    /// Queue damage from outside the projectile path (ramming hazards,
    /// scripted events).
    pub fn queue_damage(&mut self, event: DamageEvent) {
        self.damage_events.push(event);
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Advance the simulation one fixed step.
    ///
    /// Order is fixed: flight models run before the solver (read back,
    /// smooth, write), damage resolves after contacts, and removal is
    /// deferred to the very end of the tick.
    pub fn tick(&mut self, dt: f32) {
        // 1. Flight models integrate (kinematic) or steer (physics).
        for (_, (motion, transform, velocity, tuning, body)) in self.world.query_mut::<(
            &mut ShipMotion,
            &mut Transform,
            &mut Velocity,
            &ShipTuning,
            &PhysicsBody,
        )>() {
            let mut ctx = MotionContext {
                transform,
                velocity,
                tuning,
                body: body.rigid_body,
                physics: &mut self.physics,
            };
            motion.0.tick(&mut ctx, dt);
        }

        // 2. Player commands, then any requested shots.
        let firers = control::route(&mut self.world, &mut self.physics, &mut self.input, dt);
        for firer in firers {
            if let Err(e) = projectile::fire(
                &mut self.world,
                &mut self.physics,
                self.effects.as_mut(),
                firer,
                &self.config.projectile,
            ) {
                log::warn!("fire request dropped: {}", e);
            }
        }

        // 3. Shots that outlived their fuse.
        projectile::update_lifetimes(&mut self.world, &mut self.despawn, dt);

        // 4. One solver step per tick.
        self.physics.step(dt);

        // 5. Pose sync: solver-owned bodies write back into transforms,
        //    core-owned transforms push into their kinematic bodies.
        for (_, (body, transform)) in self.world.query_mut::<(&PhysicsBody, &mut Transform)>() {
            if self.physics.is_dynamic(body.rigid_body) {
                if let Some(t) = self.physics.get_body_transform(body.rigid_body) {
                    transform.position = t.position;
                    transform.rotation = t.rotation;
                }
            } else {
                self.physics.set_kinematic_pose(body.rigid_body, transform);
            }
        }

        // 6. Contacts -> projectile hits -> damage -> destruction.
        let contacts = self.physics.drain_contacts();
        projectile::handle_contacts(
            &mut self.world,
            self.effects.as_mut(),
            &contacts,
            &mut self.damage_events,
            &mut self.despawn,
        );
        health::apply_damage_events(
            &mut self.world,
            self.effects.as_mut(),
            &mut self.damage_events,
            &mut self.despawn,
        );

        // 7. Deferred removal between ticks.
        self.despawn.flush(&mut self.world, &mut self.physics);
        self.tick_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::test_support::{EffectLog, RecordingEffects};
    use crate::effects::EffectKind;
    use crate::projectile::Projectile;
    use engine_core::{Health, Vec3};

    const DT: f32 = 1.0 / 60.0;

    fn sim() -> (SimState, EffectLog) {
        let (effects, log) = RecordingEffects::new();
        (SimState::new(SimConfig::default(), Box::new(effects)), log)
    }

    fn speed_of(state: &SimState, entity: Entity) -> f32 {
        state
            .world
            .get::<&Velocity>(entity)
            .map(|v| v.linear.length())
            .unwrap_or(0.0)
    }

    /// 60 then 50 damage: health crosses zero on the second hit and the
    /// destruction sequence runs exactly once.
    #[test]
    fn two_hits_cross_zero_and_destroy_exactly_once() {
        let (mut state, log) = sim();
        let ship = state.spawn_ship(
            &ShipSpec::default(),
            MotionMode::Kinematic,
            Transform::default(),
        );

        state.queue_damage(DamageEvent {
            target: ship,
            amount: 60.0,
            instigator: None,
        });
        state.tick(DT);
        assert_eq!(state.world.get::<&Health>(ship).unwrap().current, 40.0);

        state.queue_damage(DamageEvent {
            target: ship,
            amount: 50.0,
            instigator: None,
        });
        state.tick(DT);
        assert!(!state.world.contains(ship));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].0, EffectKind::Explosion);

        // Late damage against the removed entity is a no-op.
        state.queue_damage(DamageEvent {
            target: ship,
            amount: 10.0,
            instigator: None,
        });
        state.tick(DT);
        assert_eq!(log.borrow().len(), 1);
    }

    /// Holding thrust in kinematic mode converges on the drag/thrust
    /// steady state and never exceeds the clamp.
    #[test]
    fn kinematic_thrust_converges_monotonically_below_clamp() {
        let (mut state, _log) = sim();
        let ship = state.spawn_ship(
            &ShipSpec::default(),
            MotionMode::Kinematic,
            Transform::default(),
        );
        state.bind_player(ship);
        state.input.set_thrusting(true);

        let mut last = 0.0;
        for _ in 0..3000 {
            state.tick(DT);
            let speed = speed_of(&state, ship);
            assert!(speed <= 3000.0 + 1e-3);
            assert!(speed + 1e-3 >= last);
            last = speed;
        }
        // Steady state: thrust_force * dt / (1 - drag).
        let expected = 1400.0 * DT / (1.0 - 0.985);
        assert!((last - expected).abs() < expected * 0.01);
    }

    /// With enough thrust to saturate, the clamp holds speed at exactly
    /// max_speed.
    #[test]
    fn kinematic_thrust_saturates_at_exact_max_speed() {
        let (mut state, _log) = sim();
        let mut spec = ShipSpec::default();
        spec.tuning.thrust_force = 6000.0;
        let ship = state.spawn_ship(&spec, MotionMode::Kinematic, Transform::default());
        state.bind_player(ship);
        state.input.set_thrusting(true);

        // Observed speed includes the thrust added after the clamp ran,
        // so the post-tick ceiling is max_speed + thrust_force * dt.
        for _ in 0..2000 {
            state.tick(DT);
            assert!(speed_of(&state, ship) <= 3000.0 + 6000.0 * DT + 1e-2);
        }
        // With thrust released the clamp is the last thing to touch the
        // velocity: exactly max_speed.
        state.input.set_thrusting(false);
        state.tick(DT);
        let v = state.world.get::<&Velocity>(ship).unwrap().linear;
        assert!((v.length() - 3000.0).abs() < 0.1);
    }

    /// A physics-mode ship under thrust accelerates toward the cruise
    /// target without overshooting it.
    #[test]
    fn physics_ship_accelerates_toward_cruise_speed() {
        let (mut state, _log) = sim();
        let ship = state.spawn_ship(
            &ShipSpec::default(),
            MotionMode::Physics,
            Transform::default(),
        );
        state.bind_player(ship);
        state.input.set_thrusting(true);

        let mut last = 0.0;
        for _ in 0..240 {
            state.tick(DT);
            let speed = speed_of(&state, ship);
            assert!(speed <= 1400.0 + 1e-2);
            assert!(speed + 1e-2 >= last);
            last = speed;
        }
        assert!(last > 1300.0);
    }

    /// Full projectile flight with the real solver: fire, fly, hit,
    /// damage, despawn.
    #[test]
    fn fired_projectile_crosses_the_gap_and_damages_the_drone() {
        let (mut state, log) = sim();
        let player = state.spawn_ship(
            &ShipSpec::default(),
            MotionMode::Physics,
            Transform::default(),
        );
        state.bind_player(player);
        let drone = state.spawn_ship(
            &ShipSpec::default(),
            MotionMode::Kinematic,
            Transform::from_position(Vec3::new(0.0, 900.0, 0.0)),
        );

        state.input.trigger_fire();
        for _ in 0..120 {
            state.tick(DT);
        }

        assert_eq!(state.world.get::<&Health>(drone).unwrap().current, 90.0);
        assert_eq!(state.world.query::<&Projectile>().iter().count(), 0);
        assert_eq!(state.world.get::<&Health>(player).unwrap().current, 100.0);
        let impacts = log
            .borrow()
            .iter()
            .filter(|(k, _)| *k == EffectKind::ProjectileImpact)
            .count();
        assert_eq!(impacts, 1);
    }

    /// A coasting kinematic ship is stopped short of an obstacle by the
    /// swept move instead of passing through it.
    #[test]
    fn kinematic_swept_move_stops_at_obstacle() {
        let (mut state, _log) = sim();
        let ship = state.spawn_ship(
            &ShipSpec::default(),
            MotionMode::Kinematic,
            Transform::default(),
        );
        let blocker = state.spawn_ship(
            &ShipSpec::default(),
            MotionMode::Kinematic,
            Transform::from_position(Vec3::new(0.0, 900.0, 0.0)),
        );
        state
            .world
            .get::<&mut Velocity>(ship)
            .unwrap()
            .linear = Vec3::new(0.0, 3000.0, 0.0);

        for _ in 0..120 {
            state.tick(DT);
        }

        // Hulls are 120 units from center to tip; centers can close to
        // 660 before touching.
        let y = state.world.get::<&Transform>(ship).unwrap().position.y;
        assert!(y > 500.0);
        assert!(y <= 660.0 + 1.0);
        assert!(state.world.contains(blocker));
    }

    /// Untagged scenery consumes a shot: no damage anywhere, one impact
    /// effect, projectile gone.
    #[test]
    fn projectile_hitting_environment_is_consumed_without_damage() {
        let (mut state, log) = sim();
        let player = state.spawn_ship(
            &ShipSpec::default(),
            MotionMode::Physics,
            Transform::default(),
        );
        state.bind_player(player);
        state
            .physics
            .add_static_cuboid(Vec3::new(0.0, 600.0, 0.0), Vec3::new(500.0, 10.0, 500.0));

        state.input.trigger_fire();
        for _ in 0..60 {
            state.tick(DT);
        }

        assert_eq!(state.world.query::<&Projectile>().iter().count(), 0);
        assert_eq!(state.world.get::<&Health>(player).unwrap().current, 100.0);
        let impacts = log
            .borrow()
            .iter()
            .filter(|(k, _)| *k == EffectKind::ProjectileImpact)
            .count();
        assert_eq!(impacts, 1);
    }

    /// A shot into empty space expires on its fuse and damages nothing.
    #[test]
    fn missed_projectile_expires_without_damage() {
        let (mut state, log) = sim();
        let player = state.spawn_ship(
            &ShipSpec::default(),
            MotionMode::Physics,
            Transform::default(),
        );
        state.bind_player(player);

        state.input.trigger_fire();
        let ticks = (5.0 / DT) as u32 + 10;
        for _ in 0..ticks {
            state.tick(DT);
        }

        assert_eq!(state.world.query::<&Projectile>().iter().count(), 0);
        assert_eq!(state.world.get::<&Health>(player).unwrap().current, 100.0);
        let impacts = log
            .borrow()
            .iter()
            .filter(|(k, _)| *k == EffectKind::ProjectileImpact)
            .count();
        assert_eq!(impacts, 0);
    }
}
