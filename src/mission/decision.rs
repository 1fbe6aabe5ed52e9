use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentSnapshot;
use crate::geo::{bearing_deg, haversine_m};
use crate::robot::{MissionStatus, RobotState};

pub const LOW_BATTERY_STOP_PERCENT: f64 = 20.0;
pub const CHARGE_COMPLETE_PERCENT: f64 = 80.0;
pub const TRANSPORT_SPEED_MS: f64 = 2.2;
/// Transport progress is measured against this nominal trip length.
pub const ASSUMED_TRIP_M: f64 = 1000.0;
pub const ARRIVAL_RADIUS_M: f64 = 5.0;
const HARVEST_BASE_SPEED_MS: f64 = 1.5;
const HARVEST_DENSITY_SLOWDOWN: f64 = 0.8;

/// What the controller decided to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionAction {
    EmergencyStopLowBattery,
    Charging,
    Harvesting,
    Transporting,
    Idle,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub target_speed_ms: f64,
    pub target_heading_deg: f64,
    pub blade_active: bool,
    pub action: MissionAction,
}

impl Command {
    fn hold(state: &RobotState, action: MissionAction) -> Self {
        Self {
            target_speed_ms: 0.0,
            target_heading_deg: state.position.heading_deg,
            blade_active: false,
            action,
        }
    }
}

/// Clear the charging flag once the pack is full enough. Returns true when
/// the transition happened.
pub fn complete_charge_if_full(state: &mut RobotState) -> bool {
    if state.battery.charging && state.battery.soc_percent >= CHARGE_COMPLETE_PERCENT {
        state.battery.charging = false;
        state.mission.status = MissionStatus::Idle;
        true
    } else {
        false
    }
}

/// Harvest speed: denser cane means a slower pass.
pub fn harvest_speed(plant_density: f64) -> f64 {
    HARVEST_BASE_SPEED_MS - plant_density * HARVEST_DENSITY_SLOWDOWN
}

/// Decision table, first matching rule wins:
///
/// | condition                      | action                         |
/// |--------------------------------|--------------------------------|
/// | SOC < 20 % and not charging    | emergency stop                 |
/// | charging                       | hold, finish charge at 80 %    |
/// | harvesting                     | density-dependent speed, blade |
/// | transporting                   | 2.2 m/s towards destination    |
/// | idle / unknown                 | hold                           |
pub fn decide(state: &mut RobotState, environment: &EnvironmentSnapshot) -> Command {
    if state.battery.soc_percent < LOW_BATTERY_STOP_PERCENT && !state.battery.charging {
        return Command::hold(state, MissionAction::EmergencyStopLowBattery);
    }

    if state.battery.charging {
        complete_charge_if_full(state);
        return Command::hold(state, MissionAction::Charging);
    }

    match state.mission.status {
        MissionStatus::Harvesting => {
            let density = environment.plant_density(state.position.lat, state.position.lon);
            Command {
                target_speed_ms: harvest_speed(density),
                target_heading_deg: state.position.heading_deg,
                blade_active: true,
                action: MissionAction::Harvesting,
            }
        }
        MissionStatus::Transporting => {
            let target_heading_deg = match &state.mission.destination {
                Some(destination) => bearing_deg(&state.position.point(), destination),
                None => state.position.heading_deg,
            };
            Command {
                target_speed_ms: TRANSPORT_SPEED_MS,
                target_heading_deg,
                blade_active: false,
                action: MissionAction::Transporting,
            }
        }
        MissionStatus::Idle | MissionStatus::Charging => Command::hold(state, MissionAction::Idle),
        MissionStatus::Unknown => Command::hold(state, MissionAction::Unknown),
    }
}

/// Harvest area and transport distance bookkeeping after motion. Returns the
/// status the robot had when it arrived at its destination, if it did.
pub fn update_progress(
    state: &mut RobotState,
    dt: f64,
    work_width_m: f64,
) -> Option<MissionStatus> {
    let speed = state.velocity.linear_ms;
    let mission = &mut state.mission;
    match mission.status {
        MissionStatus::Harvesting if speed > 0.1 => {
            let area_ha = speed * work_width_m * dt / 10_000.0;
            mission.area_covered_ha += area_ha;
            mission.area_remaining_ha = (mission.area_remaining_ha - area_ha).max(0.0);
            let total = mission.area_covered_ha + mission.area_remaining_ha;
            mission.progress_percent = if total > 0.0 {
                mission.area_covered_ha / total * 100.0
            } else {
                0.0
            };
            None
        }
        MissionStatus::Transporting => {
            let destination = mission.destination?;
            let distance_m = haversine_m(
                state.position.lat,
                state.position.lon,
                destination.lat,
                destination.lon,
            );
            mission.progress_percent = ((1.0 - distance_m / ASSUMED_TRIP_M) * 100.0).max(0.0);
            if distance_m < ARRIVAL_RADIUS_M {
                mission.status = MissionStatus::Idle;
                mission.progress_percent = 100.0;
                return Some(MissionStatus::Transporting);
            }
            None
        }
        _ => None,
    }
}
