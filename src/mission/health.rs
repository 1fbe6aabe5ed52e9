use rand::Rng;

use crate::rng::RngExt;
use crate::robot::{HealthStatus, MissionStatus, RobotState};

const CPU_MIN_PERCENT: f64 = 20.0;
const CPU_MAX_PERCENT: f64 = 95.0;
const MEMORY_MIN_PERCENT: f64 = 40.0;
const MEMORY_MAX_PERCENT: f64 = 90.0;

/// Workload baseline and noise band per mission status.
fn cpu_profile(status: MissionStatus) -> (f64, f64, f64) {
    match status {
        MissionStatus::Harvesting => (70.0, -5.0, 10.0),
        MissionStatus::Transporting => (40.0, -5.0, 5.0),
        MissionStatus::Idle | MissionStatus::Charging | MissionStatus::Unknown => (30.0, -5.0, 5.0),
    }
}

pub fn overall_status(state: &RobotState) -> HealthStatus {
    let battery = &state.battery;
    if battery.soc_percent < 20.0 {
        HealthStatus::Critical
    } else if battery.soc_percent < 40.0 || battery.temperature_c > 50.0 {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    }
}

pub fn update_health<R: Rng>(state: &mut RobotState, dt: f64, rng: &mut R) {
    let (baseline, low, high) = cpu_profile(state.mission.status);
    let cpu = baseline + rng.uniform(low, high);
    let memory_step = rng.uniform(-0.5, 1.0) * dt;
    let status = overall_status(state);

    let health = &mut state.health;
    health.cpu_usage_percent = cpu.clamp(CPU_MIN_PERCENT, CPU_MAX_PERCENT);
    health.memory_usage_percent =
        (health.memory_usage_percent + memory_step).clamp(MEMORY_MIN_PERCENT, MEMORY_MAX_PERCENT);
    health.uptime_hours += dt / 3600.0;
    health.overall_status = status;
}
