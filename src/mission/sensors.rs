use rand::Rng;

use crate::environment::EnvironmentSnapshot;
use crate::geo::{normalize_heading, METERS_PER_DEGREE};
use crate::rng::RngExt;
use crate::robot::RobotState;

const CAMERA_OBJECTS_AT_FULL_DENSITY: f64 = 15.0;

/// Refresh every fitted sensor from the true state. Absent sensors are
/// skipped and consume no randomness.
pub fn update_sensors<R: Rng>(
    state: &mut RobotState,
    environment: &EnvironmentSnapshot,
    rng: &mut R,
) {
    let position = state.position;

    if let Some(gps) = state.sensors.gps.as_mut() {
        if gps.fix {
            let noise_m = gps.noise_m.abs();
            let north = rng.uniform(-noise_m, noise_m);
            let east = rng.uniform(-noise_m, noise_m);
            gps.lat = position.lat + north / METERS_PER_DEGREE;
            let meters_per_degree_lon = METERS_PER_DEGREE * position.lat.to_radians().cos();
            gps.lon = if meters_per_degree_lon.abs() > f64::EPSILON {
                position.lon + east / meters_per_degree_lon
            } else {
                position.lon
            };
        }
    }

    if let Some(imu) = state.sensors.imu.as_mut() {
        let noise = imu.gyro_noise_deg_per_s.abs();
        imu.yaw_deg = normalize_heading(position.heading_deg + rng.uniform(-noise, noise));
    }

    if let Some(lidar) = state.sensors.lidar.as_mut() {
        lidar.obstacles_detected = environment
            .obstacles_near(position.lat, position.lon, lidar.range_m)
            .len();
    }

    if let Some(camera) = state.sensors.camera_front.as_mut() {
        let density = environment.plant_density(position.lat, position.lon);
        camera.objects_detected = (density * CAMERA_OBJECTS_AT_FULL_DENSITY) as u32;
    }
}
