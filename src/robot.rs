//! Typed records for a simulated robot: its fixed physical constants and the
//! mutable state advanced each tick.

use serde::{Deserialize, Serialize};

use crate::error::{check_finite, check_positive, check_range, ValidationError};
use crate::geo::GeoPoint;

pub const MAX_LINEAR_SPEED_MS: f64 = 3.0;
pub const MAX_ANGULAR_SPEED_DEG_S: f64 = 45.0;
pub const MAX_STEERING_ANGLE_DEG: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    pub robot_id: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub physics: RobotSpec,
    pub state: RobotState,
}

fn default_kind() -> String {
    "microbot".to_string()
}

impl Robot {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.robot_id.trim().is_empty() {
            return Err(ValidationError::Empty("robot_id"));
        }
        self.physics.validate()?;
        self.state.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub length: f64,
}

/// Physical constants; never change during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotSpec {
    pub mass_kg: f64,
    pub wheel_radius_m: f64,
    pub drag_coefficient: f64,
    pub rolling_resistance: f64,
    pub dimensions_m: Dimensions,
}

impl RobotSpec {
    pub fn frontal_area_m2(&self) -> f64 {
        self.dimensions_m.width * self.dimensions_m.height
    }

    /// Top surface, covered by solar panels.
    pub fn panel_area_m2(&self) -> f64 {
        self.dimensions_m.length * self.dimensions_m.width
    }

    /// Half the length; used as the collision radius.
    pub fn half_length_m(&self) -> f64 {
        self.dimensions_m.length / 2.0
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_positive("physics.mass_kg", self.mass_kg)?;
        check_positive("physics.wheel_radius_m", self.wheel_radius_m)?;
        check_range("physics.drag_coefficient", self.drag_coefficient, 0.0, f64::MAX)?;
        check_range("physics.rolling_resistance", self.rolling_resistance, 0.0, 1.0)?;
        check_range("physics.dimensions_m.width", self.dimensions_m.width, 0.0, f64::MAX)?;
        check_range("physics.dimensions_m.height", self.dimensions_m.height, 0.0, f64::MAX)?;
        check_range("physics.dimensions_m.length", self.dimensions_m.length, 0.0, f64::MAX)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub altitude_m: f64,
    pub heading_deg: f64,
}

impl Position {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub linear_ms: f64,
    #[serde(default)]
    pub angular_deg_per_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Acceleration {
    pub linear_ms2: f64,
    pub angular_deg_per_s2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    pub soc_percent: f64,
    pub voltage_v: f64,
    #[serde(default)]
    pub current_a: f64,
    pub temperature_c: f64,
    pub capacity_ah: f64,
    #[serde(default)]
    pub charging: bool,
    #[serde(default)]
    pub cycles: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Motor {
    pub torque_nm: f64,
    pub rpm: f64,
    pub power_w: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Blade {
    pub active: bool,
    pub rpm: f64,
    pub power_w: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Steering {
    pub angle_deg: f64,
    pub servo_position_percent: f64,
}

impl Default for Steering {
    fn default() -> Self {
        Self {
            angle_deg: 0.0,
            servo_position_percent: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Actuators {
    #[serde(default)]
    pub left_motor: Motor,
    #[serde(default)]
    pub right_motor: Motor,
    #[serde(default)]
    pub blade: Blade,
    #[serde(default)]
    pub steering: Steering,
}

fn default_gps_noise() -> f64 {
    0.02
}

fn default_gyro_noise() -> f64 {
    0.1
}

fn default_fix() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsSensor {
    #[serde(default = "default_gps_noise")]
    pub noise_m: f64,
    #[serde(default = "default_fix")]
    pub fix: bool,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuSensor {
    #[serde(default = "default_gyro_noise")]
    pub gyro_noise_deg_per_s: f64,
    #[serde(default)]
    pub yaw_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LidarSensor {
    pub range_m: f64,
    #[serde(default)]
    pub obstacles_detected: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraSensor {
    #[serde(default)]
    pub objects_detected: u32,
}

/// Sensors are optional; a robot without one simply gets no readings for it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sensors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsSensor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imu: Option<ImuSensor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lidar: Option<LidarSensor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_front: Option<CameraSensor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    #[default]
    Idle,
    Harvesting,
    Transporting,
    Charging,
    /// Any status string this simulator does not know; treated like idle.
    /// The original text is not kept and serialises back as `"unknown"`.
    #[serde(other)]
    Unknown,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Harvesting => "harvesting",
            Self::Transporting => "transporting",
            Self::Charging => "charging",
            Self::Unknown => "unknown",
        }
    }
}

fn default_area_remaining() -> f64 {
    5.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub status: MissionStatus,
    #[serde(default)]
    pub progress_percent: f64,
    #[serde(default)]
    pub area_covered_ha: f64,
    #[serde(default = "default_area_remaining")]
    pub area_remaining_ha: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    #[default]
    Healthy,
    Warning,
    Critical,
}

fn default_cpu() -> f64 {
    40.0
}

fn default_memory() -> f64 {
    50.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    #[serde(default = "default_cpu")]
    pub cpu_usage_percent: f64,
    #[serde(default = "default_memory")]
    pub memory_usage_percent: f64,
    #[serde(default)]
    pub uptime_hours: f64,
    #[serde(default)]
    pub overall_status: HealthStatus,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            cpu_usage_percent: default_cpu(),
            memory_usage_percent: default_memory(),
            uptime_hours: 0.0,
            overall_status: HealthStatus::Healthy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotState {
    pub position: Position,
    #[serde(default)]
    pub velocity: Velocity,
    #[serde(default)]
    pub acceleration: Acceleration,
    pub battery: Battery,
    #[serde(default)]
    pub actuators: Actuators,
    #[serde(default)]
    pub sensors: Sensors,
    pub mission: Mission,
    #[serde(default)]
    pub health: Health,
}

impl RobotState {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let position = &self.position;
        check_range("position.lat", position.lat, -90.0, 90.0)?;
        check_range("position.lon", position.lon, -180.0, 180.0)?;
        check_finite("position.altitude_m", position.altitude_m)?;
        check_range("position.heading_deg", position.heading_deg, 0.0, 360.0)?;
        if position.heading_deg >= 360.0 {
            return Err(ValidationError::OutOfRange {
                field: "position.heading_deg",
                value: position.heading_deg,
                min: 0.0,
                max: 360.0,
            });
        }

        check_range(
            "velocity.linear_ms",
            self.velocity.linear_ms,
            0.0,
            MAX_LINEAR_SPEED_MS,
        )?;
        check_range(
            "velocity.angular_deg_per_s",
            self.velocity.angular_deg_per_s,
            -MAX_ANGULAR_SPEED_DEG_S,
            MAX_ANGULAR_SPEED_DEG_S,
        )?;

        let battery = &self.battery;
        check_range("battery.soc_percent", battery.soc_percent, 0.0, 100.0)?;
        check_positive("battery.voltage_v", battery.voltage_v)?;
        check_positive("battery.capacity_ah", battery.capacity_ah)?;
        check_finite("battery.temperature_c", battery.temperature_c)?;

        check_range(
            "actuators.steering.angle_deg",
            self.actuators.steering.angle_deg,
            -MAX_STEERING_ANGLE_DEG,
            MAX_STEERING_ANGLE_DEG,
        )?;
        if let Some(lidar) = &self.sensors.lidar {
            check_range("sensors.lidar.range_m", lidar.range_m, 0.0, f64::MAX)?;
        }

        check_range(
            "mission.progress_percent",
            self.mission.progress_percent,
            0.0,
            100.0,
        )?;
        check_range("mission.area_covered_ha", self.mission.area_covered_ha, 0.0, f64::MAX)?;
        check_range(
            "mission.area_remaining_ha",
            self.mission.area_remaining_ha,
            0.0,
            f64::MAX,
        )?;

        check_range("health.cpu_usage_percent", self.health.cpu_usage_percent, 0.0, 100.0)?;
        check_range(
            "health.memory_usage_percent",
            self.health.memory_usage_percent,
            0.0,
            100.0,
        )?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn harvester() -> Robot {
        Robot {
            robot_id: "MICROBOT-002".into(),
            kind: "microbot".into(),
            physics: RobotSpec {
                mass_kg: 180.0,
                wheel_radius_m: 0.35,
                drag_coefficient: 0.8,
                rolling_resistance: 0.015,
                dimensions_m: Dimensions {
                    width: 0.8,
                    height: 1.0,
                    length: 1.2,
                },
            },
            state: RobotState {
                position: Position {
                    lat: -22.7150,
                    lon: -47.6500,
                    altitude_m: 595.0,
                    heading_deg: 45.0,
                },
                velocity: Velocity {
                    linear_ms: 1.0,
                    angular_deg_per_s: 0.0,
                },
                acceleration: Acceleration::default(),
                battery: Battery {
                    soc_percent: 72.0,
                    voltage_v: 49.3,
                    current_a: -20.0,
                    temperature_c: 32.0,
                    capacity_ah: 100.0,
                    charging: false,
                    cycles: 120,
                },
                actuators: Actuators::default(),
                sensors: Sensors {
                    gps: Some(GpsSensor {
                        noise_m: 0.02,
                        fix: true,
                        lat: 0.0,
                        lon: 0.0,
                    }),
                    imu: Some(ImuSensor {
                        gyro_noise_deg_per_s: 0.1,
                        yaw_deg: 45.0,
                    }),
                    lidar: Some(LidarSensor {
                        range_m: 30.0,
                        obstacles_detected: 0,
                    }),
                    camera_front: Some(CameraSensor::default()),
                },
                mission: Mission {
                    status: MissionStatus::Harvesting,
                    progress_percent: 40.0,
                    area_covered_ha: 2.0,
                    area_remaining_ha: 3.0,
                    destination: None,
                },
                health: Health {
                    cpu_usage_percent: 70.0,
                    memory_usage_percent: 55.0,
                    uptime_hours: 12.0,
                    overall_status: HealthStatus::Healthy,
                },
            },
        }
    }
}
