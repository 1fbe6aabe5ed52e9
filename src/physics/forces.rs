use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentSnapshot;
use crate::robot::{Actuators, RobotSpec, RobotState};

pub const GRAVITY_MS2: f64 = 9.81;
pub const AIR_DENSITY_KG_M3: f64 = 1.225;

/// Longitudinal forces acting on the robot during one tick, in newtons.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceBreakdown {
    pub motor_force_n: f64,
    pub rolling_resistance_n: f64,
    pub drag_force_n: f64,
    pub gravity_force_n: f64,
    pub wind_force_n: f64,
    pub net_force_n: f64,
}

/// Traction from both drive motors; zero for a non-positive wheel radius.
pub fn motor_force(actuators: &Actuators, wheel_radius_m: f64) -> f64 {
    if wheel_radius_m <= 0.0 {
        return 0.0;
    }
    (actuators.left_motor.torque_nm + actuators.right_motor.torque_nm) / wheel_radius_m
}

pub fn compute_forces(
    spec: &RobotSpec,
    state: &RobotState,
    environment: &EnvironmentSnapshot,
) -> ForceBreakdown {
    let frontal_area = spec.frontal_area_m2();
    let speed = state.velocity.linear_ms;

    let motor_force_n = motor_force(&state.actuators, spec.wheel_radius_m);
    let rolling_resistance_n = spec.rolling_resistance * spec.mass_kg * GRAVITY_MS2;
    let drag_force_n =
        0.5 * AIR_DENSITY_KG_M3 * spec.drag_coefficient * frontal_area * speed * speed;
    let gravity_force_n =
        spec.mass_kg * GRAVITY_MS2 * environment.terrain.slope_avg_deg.to_radians().sin();

    let wind = &environment.weather;
    let relative_wind = (wind.wind_direction_deg - state.position.heading_deg).to_radians();
    let wind_force_n = 0.5
        * AIR_DENSITY_KG_M3
        * frontal_area
        * wind.wind_speed_ms
        * wind.wind_speed_ms
        * relative_wind.cos();

    ForceBreakdown {
        motor_force_n,
        rolling_resistance_n,
        drag_force_n,
        gravity_force_n,
        wind_force_n,
        net_force_n: motor_force_n - rolling_resistance_n - drag_force_n - gravity_force_n
            + wind_force_n,
    }
}
