use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentSnapshot;
use crate::robot::{Battery, RobotSpec, RobotState};

const BASELINE_POWER_W: f64 = 50.0;
const MAX_COMPUTE_POWER_W: f64 = 30.0;
const PANEL_EFFICIENCY: f64 = 0.20;
const THERMAL_LOSS_FRACTION: f64 = 0.1;
const THERMAL_RELAXATION_PER_S: f64 = 0.01;
const MAX_BATTERY_TEMPERATURE_C: f64 = 70.0;
const NOMINAL_VOLTAGE_V: f64 = 48.0;
/// Voltage swing across the full SOC range (45 V at empty, 51 V at full).
const VOLTAGE_RANGE_V: f64 = 6.0;

/// Outcome of one battery integration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryStep {
    pub battery: Battery,
    pub power_consumption_w: f64,
    pub power_solar_w: f64,
    pub power_net_w: f64,
    pub energy_change_wh: f64,
}

/// Electrical load of motors, blade, baseline electronics and compute.
pub fn power_consumption_w(state: &RobotState) -> f64 {
    let actuators = &state.actuators;
    let blade = if actuators.blade.active {
        actuators.blade.power_w
    } else {
        0.0
    };
    let compute = state.health.cpu_usage_percent / 100.0 * MAX_COMPUTE_POWER_W;
    actuators.left_motor.power_w
        + actuators.right_motor.power_w
        + blade
        + BASELINE_POWER_W
        + compute
}

pub fn solar_charging_w(spec: &RobotSpec, irradiance_w_per_m2: f64) -> f64 {
    irradiance_w_per_m2 * spec.panel_area_m2() * PANEL_EFFICIENCY
}

pub fn voltage_for_soc(soc_percent: f64) -> f64 {
    NOMINAL_VOLTAGE_V + (soc_percent - 50.0) * (VOLTAGE_RANGE_V / 100.0)
}

pub fn integrate(
    spec: &RobotSpec,
    state: &RobotState,
    environment: &EnvironmentSnapshot,
    dt: f64,
) -> BatteryStep {
    let battery = &state.battery;

    let power_consumption_w = power_consumption_w(state);
    let power_solar_w = if battery.charging {
        solar_charging_w(spec, environment.solar.irradiance_w_per_m2)
    } else {
        0.0
    };
    let power_net_w = power_solar_w - power_consumption_w;
    let energy_change_wh = power_net_w * dt / 3600.0;

    let capacity_wh = battery.capacity_ah * battery.voltage_v;
    let soc_change = if capacity_wh > 0.0 {
        energy_change_wh / capacity_wh * 100.0
    } else {
        0.0
    };
    let soc_percent = (battery.soc_percent + soc_change).clamp(0.0, 100.0);

    let current_a = if battery.voltage_v > 0.0 {
        power_net_w / battery.voltage_v
    } else {
        0.0
    };

    let ambient = environment.weather.temperature_c;
    let heat_rise = power_net_w.abs() * THERMAL_LOSS_FRACTION / 1000.0;
    let cooling = (battery.temperature_c - ambient) * THERMAL_RELAXATION_PER_S;
    let floor = (ambient - 5.0).min(MAX_BATTERY_TEMPERATURE_C);
    let temperature_c = (battery.temperature_c + (heat_rise - cooling) * dt)
        .clamp(floor, MAX_BATTERY_TEMPERATURE_C);

    BatteryStep {
        battery: Battery {
            soc_percent,
            voltage_v: voltage_for_soc(soc_percent),
            current_a,
            temperature_c,
            capacity_ah: battery.capacity_ah,
            charging: battery.charging,
            cycles: battery.cycles,
        },
        power_consumption_w,
        power_solar_w,
        power_net_w,
        energy_change_wh,
    }
}
