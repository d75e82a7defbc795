//! Starskiff - headless flight and combat demo for the ship sim core.
//!
//! Runs a short scripted scenario against the real tick pipeline: a
//! physics-mode player ship thrusts toward a kinematic drone, puts
//! three shots into it, then rolls away. Effects and lifecycle events
//! land in the log.

mod config;
mod control;
mod effects;
mod health;
mod movement;
mod projectile;
mod ship;
mod state;

use anyhow::Result;
use engine_core::{Time, Transform, Vec3, Velocity};

use crate::config::SimConfig;
use crate::effects::LogEffects;
use crate::ship::MotionMode;
use crate::state::SimState;

/// Scenario length in sim seconds.
const SCENARIO_SECS: f32 = 5.0;
const DRONE_DISTANCE: f32 = 3000.0;
const DRONE_HEALTH: f32 = 30.0;

fn main() -> Result<()> {
    env_logger::init();

    let config = SimConfig::load();
    let dt = config.fixed_dt();
    let mut sim = SimState::new(config, Box::new(LogEffects));

    let player_spec = sim.config.ship;
    let player = sim.spawn_ship(&player_spec, MotionMode::Physics, Transform::default());
    sim.bind_player(player);

    let mut drone_spec = sim.config.ship;
    drone_spec.max_health = DRONE_HEALTH;
    let drone = sim.spawn_ship(
        &drone_spec,
        MotionMode::Kinematic,
        Transform::from_position(Vec3::new(0.0, DRONE_DISTANCE, 0.0)),
    );

    log::info!("scenario: thrust toward the drone, three shots, roll away");

    let mut time = Time::new();
    time.set_fixed_rate(sim.config.tick_hz as f64);
    let mut shots_fired = 0u32;
    let mut drone_down_at: Option<f32> = None;

    while sim.tick_count() as f32 * dt < SCENARIO_SECS {
        time.update();
        while time.should_fixed_update() {
            let t = sim.tick_count() as f32 * dt;

            // Script: thrust for the first 2.5 s, three shots from 1.0 s
            // on, then a roll once the guns are quiet.
            sim.input.set_thrusting(t < 2.5);
            sim.input
                .set_rotation_axis(if (3.0..4.0).contains(&t) { 1.0 } else { 0.0 });
            if shots_fired < 3 && t >= 1.0 + shots_fired as f32 * 0.25 {
                sim.input.trigger_fire();
                shots_fired += 1;
            }

            sim.tick(dt);

            if drone_down_at.is_none() && !sim.world.contains(drone) {
                let t_down = sim.tick_count() as f32 * dt;
                log::info!("drone destroyed at t={:.2}s", t_down);
                drone_down_at = Some(t_down);
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    let (position, speed) = {
        let transform = sim.world.get::<&Transform>(player)?;
        let velocity = sim.world.get::<&Velocity>(player)?;
        (transform.position, velocity.linear.length())
    };
    log::info!(
        "scenario done after {} ticks ({:.1}s wall): player at ({:.0}, {:.0}, {:.0}) moving {:.0} u/s, drone {}",
        sim.tick_count(),
        time.elapsed_seconds(),
        position.x,
        position.y,
        position.z,
        speed,
        match drone_down_at {
            Some(t) => format!("destroyed at t={:.2}s", t),
            None => "survived".to_string(),
        }
    );

    Ok(())
}
