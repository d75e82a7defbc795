//! Ship flight models: kinematic integration and physics-driven flight.
//!
//! Each ship carries exactly one `Motion` variant, picked at spawn.
//! `KinematicMotion` owns velocity and position outright and only asks
//! the collision system to shorten its swept moves. `PhysicsMotion`
//! leaves the body to the solver and steers it by smoothing the body's
//! velocity toward command targets every tick.

use engine_core::{Transform, Velocity, Vec3};
use physics::{PhysicsHandle, RigidBodyHandle};

use crate::ship::ShipTuning;

/// Below this squared speed a physics body counts as stationary; the
/// solver's static friction can hold it against a small velocity nudge.
const KICKSTART_SPEED_SQ: f32 = 1.0;
/// Fraction of the target steered toward while kick-starting.
const KICKSTART_TARGET_SCALE: f32 = 0.25;
/// Kick-start smoothing rate: this many times the tuned rate, with a floor.
const KICKSTART_RATE_MULT: f32 = 4.0;
const KICKSTART_MIN_RATE: f32 = 8.0;
/// Rotation input below this is treated as released.
const ROTATION_DEADZONE: f32 = 1e-4;

/// Exponential approach from `current` toward `target`: covers a fixed
/// fraction of the remaining gap per unit time, so it cannot overshoot.
fn lerp_exp(current: Vec3, target: Vec3, rate: f32, dt: f32) -> Vec3 {
    current + (target - current) * (1.0 - (-rate * dt).exp())
}

/// Everything a flight model may touch for one ship.
pub struct MotionContext<'a> {
    pub transform: &'a mut Transform,
    pub velocity: &'a mut Velocity,
    pub tuning: &'a ShipTuning,
    pub body: RigidBodyHandle,
    pub physics: &'a mut dyn PhysicsHandle,
}

/// A flight model.
pub trait Motion: Send + Sync {
    /// Per-tick integration or smoothing.
    fn tick(&mut self, ctx: &mut MotionContext, dt: f32);
    /// Apply the rotation axis for this tick.
    fn rotate(&mut self, ctx: &mut MotionContext, input: f32, dt: f32);
    /// Thrust is held this tick.
    fn thrust(&mut self, ctx: &mut MotionContext, dt: f32);
    /// Thrust is released this tick.
    fn thrust_idle(&mut self, ctx: &mut MotionContext);
}

/// Component wrapper for the boxed flight model.
pub struct ShipMotion(pub Box<dyn Motion>);

/// Core-integrated flight.
pub struct KinematicMotion;

impl Motion for KinematicMotion {
    fn tick(&mut self, ctx: &mut MotionContext, dt: f32) {
        let tuning = ctx.tuning;

        let mut v = ctx.velocity.linear * tuning.drag;
        let max_sq = tuning.max_speed * tuning.max_speed;
        if v.length_squared() > max_sq {
            // Hard clamp: exactly max_speed, direction unchanged.
            v = v.normalize() * tuning.max_speed;
        }
        ctx.velocity.linear = v;

        let applied = ctx.physics.sweep_move(ctx.body, v * dt);
        ctx.transform.translate(applied);
    }

    fn rotate(&mut self, ctx: &mut MotionContext, input: f32, dt: f32) {
        if input.abs() <= ROTATION_DEADZONE {
            return;
        }
        let angle = (input * ctx.tuning.turn_speed * dt).to_radians();
        ctx.transform.roll_local(angle);
    }

    fn thrust(&mut self, ctx: &mut MotionContext, dt: f32) {
        // The nose points along the hull's local up axis.
        let nose = ctx.transform.up();
        ctx.velocity.linear += nose * ctx.tuning.thrust_force * dt;
    }

    fn thrust_idle(&mut self, _ctx: &mut MotionContext) {}
}

/// Solver-driven flight steered through velocity targets.
pub struct PhysicsMotion {
    target_linear: Vec3,
    target_angular: Vec3,
}

impl PhysicsMotion {
    pub fn new() -> Self {
        Self {
            target_linear: Vec3::ZERO,
            target_angular: Vec3::ZERO,
        }
    }
}

impl Default for PhysicsMotion {
    fn default() -> Self {
        Self::new()
    }
}

impl Motion for PhysicsMotion {
    fn tick(&mut self, ctx: &mut MotionContext, dt: f32) {
        let tuning = ctx.tuning;

        // The solver's velocity is authoritative in this mode; mirror it
        // for observers before steering it.
        let linear = ctx.physics.linear_velocity(ctx.body);
        let angular = ctx.physics.angular_velocity(ctx.body);
        ctx.velocity.linear = linear;
        ctx.velocity.angular = angular;

        // A nearly-stationary body can stick in the solver. Steer toward
        // a reduced target at a raised rate until it breaks loose.
        let (lin_target, lin_rate) =
            if self.target_linear != Vec3::ZERO && linear.length_squared() < KICKSTART_SPEED_SQ {
                (
                    self.target_linear * KICKSTART_TARGET_SCALE,
                    (tuning.linear_smoothing * KICKSTART_RATE_MULT).max(KICKSTART_MIN_RATE),
                )
            } else {
                (self.target_linear, tuning.linear_smoothing)
            };

        ctx.physics
            .set_linear_velocity(ctx.body, lerp_exp(linear, lin_target, lin_rate, dt));
        ctx.physics.set_angular_velocity(
            ctx.body,
            lerp_exp(angular, self.target_angular, tuning.angular_smoothing, dt),
        );
    }

    fn rotate(&mut self, ctx: &mut MotionContext, input: f32, _dt: f32) {
        if input.abs() <= ROTATION_DEADZONE {
            // Let the smoother decay the body's spin.
            self.target_angular = Vec3::ZERO;
            return;
        }
        let max = ctx.tuning.max_angular_speed.to_radians();
        let rate = (-input * ctx.tuning.turn_speed).to_radians().clamp(-max, max);
        self.target_angular = ctx.transform.forward() * rate;
    }

    fn thrust(&mut self, ctx: &mut MotionContext, _dt: f32) {
        // Target speed, not a force: thrust_force doubles as the cruise
        // speed in this mode.
        self.target_linear = ctx.transform.up() * ctx.tuning.thrust_force;
    }

    fn thrust_idle(&mut self, _ctx: &mut MotionContext) {
        self.target_linear = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Transform;

    const DT: f32 = 1.0 / 60.0;

    /// Single-body stand-in for the physics engine.
    #[derive(Default)]
    struct MockPhysics {
        linear: Vec3,
        angular: Vec3,
    }

    impl PhysicsHandle for MockPhysics {
        fn linear_velocity(&self, _: RigidBodyHandle) -> Vec3 {
            self.linear
        }
        fn set_linear_velocity(&mut self, _: RigidBodyHandle, v: Vec3) {
            self.linear = v;
        }
        fn angular_velocity(&self, _: RigidBodyHandle) -> Vec3 {
            self.angular
        }
        fn set_angular_velocity(&mut self, _: RigidBodyHandle, v: Vec3) {
            self.angular = v;
        }
        fn sweep_move(&mut self, _: RigidBodyHandle, delta: Vec3) -> Vec3 {
            delta
        }
    }

    struct Rig {
        transform: Transform,
        velocity: Velocity,
        tuning: ShipTuning,
        physics: MockPhysics,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                transform: Transform::default(),
                velocity: Velocity::default(),
                tuning: ShipTuning::default(),
                physics: MockPhysics::default(),
            }
        }

        fn ctx(&mut self) -> MotionContext<'_> {
            MotionContext {
                transform: &mut self.transform,
                velocity: &mut self.velocity,
                tuning: &self.tuning,
                body: RigidBodyHandle::invalid(),
                physics: &mut self.physics,
            }
        }
    }

    #[test]
    fn kinematic_drag_decays_speed_monotonically_toward_zero() {
        let mut rig = Rig::new();
        rig.velocity.linear = Vec3::new(100.0, 0.0, 0.0);
        let mut motion = KinematicMotion;
        let mut last = rig.velocity.linear.length();
        for _ in 0..600 {
            motion.tick(&mut rig.ctx(), DT);
            let speed = rig.velocity.linear.length();
            assert!(speed < last);
            assert!(speed > 0.0);
            last = speed;
        }
    }

    #[test]
    fn kinematic_clamp_produces_exact_max_speed_same_direction() {
        let mut rig = Rig::new();
        rig.velocity.linear = Vec3::new(4000.0, 3000.0, 0.0);
        let mut motion = KinematicMotion;
        motion.tick(&mut rig.ctx(), DT);
        let v = rig.velocity.linear;
        assert!((v.length() - 3000.0).abs() < 1e-2);
        let dir = v.normalize();
        let expected = Vec3::new(4000.0, 3000.0, 0.0).normalize();
        assert!((dir - expected).length() < 1e-5);
    }

    #[test]
    fn kinematic_zero_max_speed_zeroes_velocity() {
        let mut rig = Rig::new();
        rig.tuning.max_speed = 0.0;
        rig.velocity.linear = Vec3::new(10.0, 0.0, 0.0);
        let mut motion = KinematicMotion;
        motion.tick(&mut rig.ctx(), DT);
        assert_eq!(rig.velocity.linear, Vec3::ZERO);
    }

    #[test]
    fn kinematic_zero_drag_stops_instantly() {
        let mut rig = Rig::new();
        rig.tuning.drag = 0.0;
        rig.velocity.linear = Vec3::new(500.0, 0.0, 0.0);
        let mut motion = KinematicMotion;
        motion.tick(&mut rig.ctx(), DT);
        assert_eq!(rig.velocity.linear, Vec3::ZERO);
    }

    #[test]
    fn kinematic_thrust_accelerates_along_nose() {
        let mut rig = Rig::new();
        let mut motion = KinematicMotion;
        motion.thrust(&mut rig.ctx(), DT);
        let expected = Vec3::Y * 1400.0 * DT;
        assert!((rig.velocity.linear - expected).length() < 1e-4);
    }

    #[test]
    fn kinematic_zero_rotation_input_is_a_noop() {
        let mut rig = Rig::new();
        let before = rig.transform.rotation;
        let mut motion = KinematicMotion;
        motion.rotate(&mut rig.ctx(), 0.0, DT);
        assert_eq!(rig.transform.rotation, before);
    }

    #[test]
    fn kinematic_positive_roll_turns_nose_toward_right() {
        let mut rig = Rig::new();
        let mut motion = KinematicMotion;
        // 140 deg/s for 90/140 s rolls exactly 90 degrees.
        motion.rotate(&mut rig.ctx(), 1.0, 90.0 / 140.0);
        assert!((rig.transform.up() - Vec3::X).length() < 1e-4);
        // Roll leaves the forward axis where it was.
        assert!((rig.transform.forward() - -Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn physics_tick_mirrors_body_velocity_before_steering() {
        let mut rig = Rig::new();
        rig.physics.linear = Vec3::new(120.0, 0.0, 0.0);
        let mut motion = PhysicsMotion::new();
        motion.tick(&mut rig.ctx(), DT);
        // The mirror holds the read-back value, not the steered one.
        assert_eq!(rig.velocity.linear, Vec3::new(120.0, 0.0, 0.0));
        assert_ne!(rig.physics.linear, Vec3::new(120.0, 0.0, 0.0));
    }

    #[test]
    fn physics_smoothing_contracts_toward_target_without_overshoot() {
        let mut rig = Rig::new();
        rig.physics.linear = Vec3::new(100.0, 0.0, 0.0);
        let mut motion = PhysicsMotion::new();
        motion.target_linear = Vec3::new(1000.0, 0.0, 0.0);
        let mut gap = (rig.physics.linear - motion.target_linear).length();
        for _ in 0..600 {
            motion.tick(&mut rig.ctx(), DT);
            let next_gap = (rig.physics.linear - motion.target_linear).length();
            assert!(next_gap < gap);
            assert!(rig.physics.linear.x <= 1000.0);
            gap = next_gap;
        }
        assert!(gap < 1.0);
    }

    #[test]
    fn physics_kickstart_engages_below_speed_threshold() {
        let mut rig = Rig::new();
        let mut motion = PhysicsMotion::new();
        motion.target_linear = Vec3::new(1000.0, 0.0, 0.0);
        motion.tick(&mut rig.ctx(), DT);
        // Reduced target at the raised rate: 250 * (1 - e^(-12 dt)).
        let rate = (3.0_f32 * KICKSTART_RATE_MULT).max(KICKSTART_MIN_RATE);
        let expected = 250.0 * (1.0 - (-rate * DT).exp());
        assert!((rig.physics.linear.x - expected).abs() < 1e-3);
        assert!(rig.physics.linear.x < 250.0);
    }

    #[test]
    fn physics_zero_rotation_input_zeroes_angular_target_in_one_call() {
        let mut rig = Rig::new();
        let mut motion = PhysicsMotion::new();
        motion.rotate(&mut rig.ctx(), 1.0, DT);
        assert_ne!(motion.target_angular, Vec3::ZERO);
        motion.rotate(&mut rig.ctx(), 0.0, DT);
        assert_eq!(motion.target_angular, Vec3::ZERO);
    }

    #[test]
    fn physics_turn_target_matches_turn_speed_with_negated_sign() {
        let mut rig = Rig::new();
        let mut motion = PhysicsMotion::new();
        motion.rotate(&mut rig.ctx(), 1.0, DT);
        let target = motion.target_angular;
        assert!((target.length() - 140.0_f32.to_radians()).abs() < 1e-5);
        // Negated relative to the kinematic branch: positive input spins
        // opposite the forward axis.
        assert!(target.dot(rig.transform.forward()) < 0.0);
    }

    #[test]
    fn physics_turn_rate_clamps_at_max_angular_speed() {
        let mut rig = Rig::new();
        rig.tuning.turn_speed = 10_000.0;
        let mut motion = PhysicsMotion::new();
        motion.rotate(&mut rig.ctx(), 1.0, DT);
        assert!((motion.target_angular.length() - 720.0_f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn physics_thrust_sets_cruise_target_and_idle_clears_it() {
        let mut rig = Rig::new();
        let mut motion = PhysicsMotion::new();
        motion.thrust(&mut rig.ctx(), DT);
        motion.thrust(&mut rig.ctx(), DT);
        // A target, not an accumulator.
        assert!((motion.target_linear - Vec3::Y * 1400.0).length() < 1e-4);
        motion.thrust_idle(&mut rig.ctx());
        assert_eq!(motion.target_linear, Vec3::ZERO);
    }
}
