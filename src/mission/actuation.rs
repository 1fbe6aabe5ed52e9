use std::f64::consts::PI;

use crate::geo::normalize_signed;
use crate::robot::{Motor, RobotSpec, RobotState, MAX_STEERING_ANGLE_DEG};

use super::decision::Command;

const SPEED_GAIN: f64 = 10.0;
const MAX_MOTOR_TORQUE_NM: f64 = 40.0;
const HEADING_GAIN: f64 = 0.3;
const BLADE_RPM: f64 = 850.0;
const BLADE_POWER_W: f64 = 1200.0;
/// First-order response of the yaw rate towards the steering target, per second.
pub const YAW_RESPONSE_PER_S: f64 = 2.0;

/// Push a command into the actuator records.
///
/// Motor torque, RPM and power are derived from the speed error and the
/// current wheel speed. The steering angle is turned into an angular
/// acceleration so the physics step of length `dt` can rotate the robot.
pub fn apply_command(spec: &RobotSpec, state: &mut RobotState, command: &Command, dt: f64) {
    let speed = state.velocity.linear_ms;
    let torque_nm =
        ((command.target_speed_ms - speed) * SPEED_GAIN).clamp(0.0, MAX_MOTOR_TORQUE_NM);
    let rpm = wheel_rpm(speed, spec.wheel_radius_m);
    let motor = Motor {
        torque_nm,
        rpm,
        power_w: torque_nm * rpm * 2.0 * PI / 60.0,
    };
    state.actuators.left_motor = motor;
    state.actuators.right_motor = motor;

    let blade = &mut state.actuators.blade;
    blade.active = command.blade_active;
    if blade.active {
        blade.rpm = BLADE_RPM;
        blade.power_w = BLADE_POWER_W;
    } else {
        blade.rpm = 0.0;
        blade.power_w = 0.0;
    }

    let heading_error = normalize_signed(command.target_heading_deg - state.position.heading_deg);
    let angle_deg =
        (heading_error * HEADING_GAIN).clamp(-MAX_STEERING_ANGLE_DEG, MAX_STEERING_ANGLE_DEG);
    state.actuators.steering.angle_deg = angle_deg;
    state.actuators.steering.servo_position_percent =
        50.0 + angle_deg / MAX_STEERING_ANGLE_DEG * 50.0;

    let target_yaw_rate = yaw_rate_deg_per_s(speed, angle_deg, spec.dimensions_m.length);
    state.acceleration.angular_deg_per_s2 =
        yaw_acceleration(state.velocity.angular_deg_per_s, target_yaw_rate, dt);
}

/// Angular acceleration that moves the yaw rate from `current` towards
/// `target` along the exact first-order lag over `dt`. One integration step
/// of `current + a * dt` never overshoots the target, whatever the timestep.
pub fn yaw_acceleration(current_deg_per_s: f64, target_deg_per_s: f64, dt: f64) -> f64 {
    let error = target_deg_per_s - current_deg_per_s;
    if dt <= 0.0 {
        return error * YAW_RESPONSE_PER_S;
    }
    error * (1.0 - (-YAW_RESPONSE_PER_S * dt).exp()) / dt
}

pub fn wheel_rpm(speed_ms: f64, wheel_radius_m: f64) -> f64 {
    if wheel_radius_m <= 0.0 {
        return 0.0;
    }
    speed_ms / wheel_radius_m * 60.0 / (2.0 * PI)
}

/// Kinematic bicycle model.
pub fn yaw_rate_deg_per_s(speed_ms: f64, steering_angle_deg: f64, length_m: f64) -> f64 {
    if length_m <= 0.0 {
        return 0.0;
    }
    (speed_ms * steering_angle_deg.to_radians().tan() / length_m).to_degrees()
}
