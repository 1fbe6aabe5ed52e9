use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::robot::RobotState;

const BATTERY_CRITICAL_PERCENT: f64 = 20.0;
const BATTERY_LOW_PERCENT: f64 = 50.0;
const BATTERY_TEMPERATURE_HIGH_C: f64 = 50.0;
const CPU_HIGH_PERCENT: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    BatteryCritical,
    BatteryLow,
    TemperatureHigh,
    CpuHigh,
}

impl AlertKind {
    pub fn severity(&self) -> AlertSeverity {
        match self {
            Self::BatteryCritical => AlertSeverity::Critical,
            Self::BatteryLow | Self::TemperatureHigh | Self::CpuHigh => AlertSeverity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub threshold: f64,
    pub current_value: f64,
    pub timestamp: NaiveDateTime,
}

impl Alert {
    fn new(
        kind: AlertKind,
        message: String,
        threshold: f64,
        current_value: f64,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            message,
            threshold,
            current_value,
            timestamp,
        }
    }
}

/// Alerts implied by the current state. Nothing is remembered between calls,
/// so a condition that persists is reported again on every tick.
pub fn check_alerts(state: &RobotState, timestamp: NaiveDateTime) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let battery = &state.battery;

    if battery.soc_percent < BATTERY_CRITICAL_PERCENT {
        alerts.push(Alert::new(
            AlertKind::BatteryCritical,
            format!("Battery critical: {:.1}%", battery.soc_percent),
            BATTERY_CRITICAL_PERCENT,
            battery.soc_percent,
            timestamp,
        ));
    } else if battery.soc_percent < BATTERY_LOW_PERCENT && !battery.charging {
        alerts.push(Alert::new(
            AlertKind::BatteryLow,
            format!("Battery low: {:.1}%", battery.soc_percent),
            BATTERY_LOW_PERCENT,
            battery.soc_percent,
            timestamp,
        ));
    }

    if battery.temperature_c > BATTERY_TEMPERATURE_HIGH_C {
        alerts.push(Alert::new(
            AlertKind::TemperatureHigh,
            format!("Battery temperature high: {:.1}°C", battery.temperature_c),
            BATTERY_TEMPERATURE_HIGH_C,
            battery.temperature_c,
            timestamp,
        ));
    }

    let cpu = state.health.cpu_usage_percent;
    if cpu > CPU_HIGH_PERCENT {
        alerts.push(Alert::new(
            AlertKind::CpuHigh,
            format!("CPU usage high: {cpu:.1}%"),
            CPU_HIGH_PERCENT,
            cpu,
            timestamp,
        ));
    }

    alerts
}
