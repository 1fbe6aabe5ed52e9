//! Per-robot control loop.
//!
//! A [`MissionController`] owns one robot's state and its random stream. Each
//! call to [`MissionController::step`] runs the full tick in a fixed order:
//!
//! 1. decide a [`Command`] from mission status and battery
//! 2. apply it to the actuators
//! 3. integrate motion, then the battery
//! 4. refresh sensors and mission progress
//! 5. update health, statistics and alerts
//!
//! The order matters for reproducibility: sensors and health draw from the
//! controller's generator, always in the same sequence.

mod actuation;
mod alerts;
mod decision;
mod health;
mod sensors;
mod statistics;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::environment::EnvironmentSnapshot;
use crate::physics::{BatteryStep, Collision, ForceBreakdown, PhysicsModel};
use crate::rng::SimRng;
use crate::robot::{MissionStatus, Robot, RobotState};

pub use actuation::{
    apply_command, wheel_rpm, yaw_acceleration, yaw_rate_deg_per_s, YAW_RESPONSE_PER_S,
};
pub use alerts::{check_alerts, Alert, AlertKind, AlertSeverity};
pub use decision::{
    complete_charge_if_full, decide, harvest_speed, update_progress, Command, MissionAction,
    ARRIVAL_RADIUS_M, ASSUMED_TRIP_M, CHARGE_COMPLETE_PERCENT, LOW_BATTERY_STOP_PERCENT,
    TRANSPORT_SPEED_MS,
};
pub use health::{overall_status, update_health};
pub use sensors::update_sensors;
pub use statistics::RunStatistics;

/// Swath cut by the blade in one pass.
pub const WORK_WIDTH_M: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicsReport {
    pub forces: ForceBreakdown,
    pub collisions: Vec<Collision>,
}

/// Everything one robot produced during a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub robot_id: String,
    pub action: MissionAction,
    pub robot: RobotState,
    pub physics: PhysicsReport,
    pub battery: BatteryStep,
    pub alerts: Vec<Alert>,
    pub statistics: RunStatistics,
}

pub struct MissionController {
    robot: Robot,
    physics: PhysicsModel,
    rng: SimRng,
    statistics: RunStatistics,
    stopped_for_battery: bool,
}

impl MissionController {
    pub fn new(robot: Robot, physics: PhysicsModel, rng: SimRng) -> Self {
        let statistics = RunStatistics {
            area_harvested_ha: robot.state.mission.area_covered_ha,
            mission_progress_percent: robot.state.mission.progress_percent,
            ..RunStatistics::default()
        };
        Self {
            robot,
            physics,
            rng,
            statistics,
            stopped_for_battery: false,
        }
    }

    pub fn robot_id(&self) -> &str {
        &self.robot.robot_id
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn state(&self) -> &RobotState {
        &self.robot.state
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    pub fn step(&mut self, environment: &EnvironmentSnapshot, dt: f64) -> TickReport {
        let spec = &self.robot.physics;
        let robot_id = self.robot.robot_id.as_str();
        let mut state = self.robot.state.clone();

        let status_before = state.mission.status;
        let command = decide(&mut state, environment);
        self.stopped_for_battery =
            log_decision(robot_id, self.stopped_for_battery, status_before, &state, &command);
        apply_command(spec, &mut state, &command, dt);

        let motion = self.physics.step_motion(spec, &state, environment, dt);
        let mut state = motion.state;
        let battery = self.physics.step_battery(spec, &state, environment, dt);
        state.battery = battery.battery.clone();
        if complete_charge_if_full(&mut state) {
            info!(robot = robot_id, soc = state.battery.soc_percent, "charge complete, robot idle");
        }

        update_sensors(&mut state, environment, &mut self.rng);
        if let Some(previous) = update_progress(&mut state, dt, WORK_WIDTH_M) {
            info!(
                robot = robot_id,
                from = previous.as_str(),
                "destination reached, robot idle"
            );
        }
        update_health(&mut state, dt, &mut self.rng);

        self.statistics.area_harvested_ha = state.mission.area_covered_ha;
        self.statistics.record_tick(
            state.velocity.linear_ms,
            dt,
            battery.energy_change_wh,
            motion.collisions.len(),
            state.mission.progress_percent,
        );

        let alerts = check_alerts(&state, environment.clock);
        for alert in alerts.iter().filter(|a| a.severity == AlertSeverity::Critical) {
            warn!(robot = robot_id, kind = ?alert.kind, "{}", alert.message);
        }
        for collision in &motion.collisions {
            warn!(
                robot = robot_id,
                object = %collision.object,
                distance_m = collision.distance_m,
                severity = ?collision.severity,
                "collision"
            );
        }

        self.robot.state = state.clone();
        TickReport {
            robot_id: robot_id.to_string(),
            action: command.action,
            robot: state,
            physics: PhysicsReport {
                forces: motion.forces,
                collisions: motion.collisions,
            },
            battery,
            alerts,
            statistics: self.statistics.clone(),
        }
    }
}

/// Returns whether the robot is held by the low-battery stop after this tick.
fn log_decision(
    robot_id: &str,
    was_stopped: bool,
    status_before: MissionStatus,
    state: &RobotState,
    command: &Command,
) -> bool {
    let emergency = command.action == MissionAction::EmergencyStopLowBattery;
    if emergency && !was_stopped {
        info!(robot = robot_id, soc = state.battery.soc_percent, "emergency stop, battery low");
    }

    if status_before != state.mission.status {
        info!(
            robot = robot_id,
            from = status_before.as_str(),
            to = state.mission.status.as_str(),
            "mission status changed"
        );
    }
    debug!(
        robot = robot_id,
        action = ?command.action,
        target_speed_ms = command.target_speed_ms,
        target_heading_deg = command.target_heading_deg,
        "command"
    );
    emergency
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::fixtures::field;
    use crate::geo::GeoPoint;
    use crate::physics::PhysicsConfig;
    use crate::rng::RngManager;
    use crate::robot::fixtures::harvester;

    fn controller(robot: Robot, seed: u64) -> MissionController {
        MissionController::new(
            robot,
            PhysicsModel::new(PhysicsConfig::default()),
            RngManager::new(seed).fork("robot"),
        )
    }

    #[test]
    fn charging_finishes_within_the_tick() {
        let mut robot = harvester();
        robot.state.battery.soc_percent = 79.0;
        robot.state.battery.charging = true;
        robot.state.mission.status = MissionStatus::Charging;
        robot.state.velocity.linear_ms = 0.0;
        let mut env = field();
        env.solar.irradiance_w_per_m2 = 1000.0;

        let mut controller = controller(robot, 1);
        // half an hour of full sun on the panel
        let report = controller.step(&env, 1800.0);
        assert!(
            report.robot.battery.soc_percent >= 80.0,
            "soc {}",
            report.robot.battery.soc_percent
        );
        assert!(!report.robot.battery.charging);
        assert_eq!(report.robot.mission.status, MissionStatus::Idle);
        assert_eq!(report.action, MissionAction::Charging);
    }

    #[test]
    fn emergency_stop_keeps_status() {
        let mut robot = harvester();
        robot.state.battery.soc_percent = 15.0;
        let env = field();
        let mut controller = controller(robot, 1);
        let report = controller.step(&env, 0.1);
        assert_eq!(report.action, MissionAction::EmergencyStopLowBattery);
        assert_eq!(report.robot.mission.status, MissionStatus::Harvesting);
        assert_eq!(report.robot.actuators.left_motor.torque_nm, 0.0);
        assert!(!report.robot.actuators.blade.active);
        assert!(report.robot.velocity.linear_ms < 1.0);
        assert!(report
            .alerts
            .iter()
            .any(|alert| alert.kind == AlertKind::BatteryCritical));
    }

    #[test]
    fn harvesting_tick_accounts_everything() {
        let robot = harvester();
        let env = field();
        let start = robot.state.clone();
        let mut controller = controller(robot, 5);
        let report = controller.step(&env, 0.1);

        assert_eq!(report.action, MissionAction::Harvesting);
        assert!(report.robot.actuators.blade.active);
        assert!(report.robot.mission.area_covered_ha > start.mission.area_covered_ha);
        assert!(report.robot.battery.soc_percent < start.battery.soc_percent);
        assert_eq!(report.statistics.total_timesteps, 1);
        assert_eq!(report.statistics.area_harvested_ha, report.robot.mission.area_covered_ha);
        assert!(report.statistics.energy_consumed_kwh > 0.0);
        assert_eq!(report.robot, *controller.state());
        let uptime_gain = report.robot.health.uptime_hours - start.health.uptime_hours;
        assert!((uptime_gain - 0.1 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn transport_reaches_destination() {
        let mut robot = harvester();
        robot.state.mission.status = MissionStatus::Transporting;
        robot.state.mission.progress_percent = 0.0;
        robot.state.velocity.linear_ms = 0.0;
        robot.state.position.heading_deg = 0.0;
        // 30 m due north
        let destination = GeoPoint::new(
            robot.state.position.lat + 30.0 / 111_000.0,
            robot.state.position.lon,
        );
        robot.state.mission.destination = Some(destination);
        let env = field();

        let mut controller = controller(robot, 9);
        let mut arrived = false;
        for _ in 0..1000 {
            let report = controller.step(&env, 0.1);
            if report.robot.mission.status == MissionStatus::Idle {
                assert_eq!(report.robot.mission.progress_percent, 100.0);
                arrived = true;
                break;
            }
        }
        assert!(arrived, "robot never arrived");
        assert!(controller.state().position.point().distance_to(&destination) < 5.0);
    }

    #[test]
    fn same_seed_same_trajectory() {
        let env = field();
        let mut a = controller(harvester(), 77);
        let mut b = controller(harvester(), 77);
        for _ in 0..50 {
            assert_eq!(a.step(&env, 0.1), b.step(&env, 0.1));
        }
    }

    #[test]
    fn idle_robot_stays_put() {
        let mut robot = harvester();
        robot.state.mission.status = MissionStatus::Idle;
        robot.state.velocity.linear_ms = 0.0;
        let env = field();
        let start = robot.state.position;
        let mut controller = controller(robot, 2);
        for _ in 0..10 {
            controller.step(&env, 0.1);
        }
        assert_eq!(controller.state().position.lat, start.lat);
        assert_eq!(controller.state().position.lon, start.lon);
        assert_eq!(controller.statistics().distance_traveled_km, 0.0);
    }
}
