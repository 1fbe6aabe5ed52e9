//! Single-robot force, motion and battery integration.
//!
//! Everything here is a pure numeric transformation of
//! `(robot spec, robot state, environment snapshot, dt)`. Degenerate inputs
//! (zero mass, wheel radius or voltage) produce zero for the dependent
//! quantity instead of an error.

mod battery;
mod collision;
mod forces;

use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentSnapshot;
use crate::geo::{normalize_heading, METERS_PER_DEGREE};
use crate::robot::{
    Acceleration, Position, RobotSpec, RobotState, Velocity, MAX_ANGULAR_SPEED_DEG_S,
    MAX_LINEAR_SPEED_MS,
};

pub use battery::{power_consumption_w, solar_charging_w, voltage_for_soc, BatteryStep};
pub use collision::{detect_collisions, Collision, CollisionSeverity};
pub use forces::{compute_forces, motor_force, ForceBreakdown, AIR_DENSITY_KG_M3, GRAVITY_MS2};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    pub collision_detection: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            collision_detection: true,
        }
    }
}

/// Result of integrating motion for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionStep {
    pub state: RobotState,
    pub forces: ForceBreakdown,
    pub collisions: Vec<Collision>,
}

#[derive(Debug, Clone, Default)]
pub struct PhysicsModel {
    config: PhysicsConfig,
}

impl PhysicsModel {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Integrate forces into acceleration, velocity, position and heading.
    ///
    /// Angular acceleration is taken from `state.acceleration`, where the
    /// steering controller leaves it; only the linear component is derived
    /// from the force balance.
    pub fn step_motion(
        &self,
        spec: &RobotSpec,
        state: &RobotState,
        environment: &EnvironmentSnapshot,
        dt: f64,
    ) -> MotionStep {
        let forces = compute_forces(spec, state, environment);
        let acceleration = Acceleration {
            linear_ms2: if spec.mass_kg > 0.0 {
                forces.net_force_n / spec.mass_kg
            } else {
                0.0
            },
            angular_deg_per_s2: state.acceleration.angular_deg_per_s2,
        };

        let velocity = integrate_velocity(&state.velocity, &acceleration, dt);
        let position = integrate_position(&state.position, &velocity, environment, dt);

        let collisions = if self.config.collision_detection {
            detect_collisions(
                position.lat,
                position.lon,
                spec.half_length_m(),
                &environment.terrain.obstacles,
                environment.clock,
            )
        } else {
            Vec::new()
        };

        let mut next = state.clone();
        next.position = position;
        next.velocity = velocity;
        next.acceleration = acceleration;
        MotionStep {
            state: next,
            forces,
            collisions,
        }
    }

    /// Energy balance of the battery pack over `dt` seconds.
    pub fn step_battery(
        &self,
        spec: &RobotSpec,
        state: &RobotState,
        environment: &EnvironmentSnapshot,
        dt: f64,
    ) -> BatteryStep {
        battery::integrate(spec, state, environment, dt)
    }
}

fn integrate_velocity(velocity: &Velocity, acceleration: &Acceleration, dt: f64) -> Velocity {
    Velocity {
        linear_ms: (velocity.linear_ms + acceleration.linear_ms2 * dt)
            .clamp(0.0, MAX_LINEAR_SPEED_MS),
        angular_deg_per_s: (velocity.angular_deg_per_s + acceleration.angular_deg_per_s2 * dt)
            .clamp(-MAX_ANGULAR_SPEED_DEG_S, MAX_ANGULAR_SPEED_DEG_S),
    }
}

/// Local tangent-plane step. Displacement uses the heading held at the start
/// of the tick; the new heading applies from the next tick on.
fn integrate_position(
    position: &Position,
    velocity: &Velocity,
    environment: &EnvironmentSnapshot,
    dt: f64,
) -> Position {
    let distance_m = velocity.linear_ms * dt;
    let heading = position.heading_deg.to_radians();

    let lat_change = distance_m * heading.cos() / METERS_PER_DEGREE;
    let meters_per_degree_lon = METERS_PER_DEGREE * position.lat.to_radians().cos();
    let lon_change = if meters_per_degree_lon.abs() > f64::EPSILON {
        distance_m * heading.sin() / meters_per_degree_lon
    } else {
        0.0
    };

    let lat = position.lat + lat_change;
    let lon = position.lon + lon_change;
    let altitude_m = if distance_m > 0.0 {
        environment.terrain_height(lat, lon)
    } else {
        position.altitude_m
    };

    Position {
        lat,
        lon,
        altitude_m,
        heading_deg: normalize_heading(position.heading_deg + velocity.angular_deg_per_s * dt),
    }
}
