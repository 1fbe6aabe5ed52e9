use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::{
    engine::{Engine, EngineBuilder, EngineSettings},
    environment::{
        EnvironmentConfig, EnvironmentSnapshot, Plantation, PrecipitationModel, Solar, Terrain,
        Weather,
    },
    error::{check_positive, ValidationError},
    logging::LoggingSettings,
    physics::PhysicsConfig,
    robot::Robot,
};

pub const DEFAULT_TICKS: u64 = 600;

fn default_timestep_seconds() -> f64 {
    0.1
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub simulation: SimulationConfig,
    pub environment: EnvironmentSetup,
    pub robots: Vec<Robot>,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_timestep_seconds")]
    pub timestep_seconds: f64,
    #[serde(default = "default_enabled")]
    pub collision_detection: bool,
    #[serde(default = "default_enabled")]
    pub weather_simulation: bool,
    #[serde(default = "default_enabled")]
    pub solar_simulation: bool,
    #[serde(default)]
    pub precipitation_model: PrecipitationModel,
    #[serde(default)]
    pub parallel_robots: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep_seconds: default_timestep_seconds(),
            collision_detection: true,
            weather_simulation: true,
            solar_simulation: true,
            precipitation_model: PrecipitationModel::default(),
            parallel_robots: false,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_positive("simulation.timestep_seconds", self.timestep_seconds)
    }

    pub fn environment_config(&self) -> EnvironmentConfig {
        EnvironmentConfig {
            weather_simulation: self.weather_simulation,
            solar_simulation: self.solar_simulation,
            precipitation_model: self.precipitation_model,
        }
    }

    pub fn physics_config(&self) -> PhysicsConfig {
        PhysicsConfig {
            collision_detection: self.collision_detection,
        }
    }
}

/// Initial environment record. The clock starts at `start`, or at midnight of
/// `solar.date` when no start is given.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentSetup {
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    pub weather: Weather,
    pub solar: Solar,
    pub terrain: Terrain,
    pub plantation: Plantation,
}

impl EnvironmentSetup {
    pub fn snapshot(&self) -> EnvironmentSnapshot {
        let clock = self
            .start
            .unwrap_or_else(|| self.solar.date.and_time(NaiveTime::MIN));
        EnvironmentSnapshot {
            clock,
            weather: self.weather.clone(),
            solar: self.solar.clone(),
            terrain: self.terrain.clone(),
            plantation: self.plantation.clone(),
        }
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml(&data)
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Parse and validate a scenario document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let scenario: Scenario =
            serde_yaml::from_str(text).context("Failed to parse scenario YAML")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        if self.robots.is_empty() {
            return Err(ValidationError::Empty("robots"));
        }
        self.simulation.validate()?;
        self.environment.snapshot().validate()?;

        let mut seen = HashSet::new();
        for robot in &self.robots {
            if !seen.insert(robot.robot_id.as_str()) {
                return Err(ValidationError::DuplicateRobotId(robot.robot_id.clone()));
            }
            robot.validate()?;
        }
        Ok(())
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(DEFAULT_TICKS)
    }

    pub fn engine_settings(&self, seed_override: Option<u64>) -> EngineSettings {
        EngineSettings {
            scenario_name: self.name.clone(),
            seed: seed_override.unwrap_or(self.seed),
            timestep_seconds: self.simulation.timestep_seconds,
            environment: self.simulation.environment_config(),
            physics: self.simulation.physics_config(),
            parallel_robots: self.simulation.parallel_robots,
        }
    }

    pub fn build_engine(&self, seed_override: Option<u64>) -> Result<Engine, ValidationError> {
        let mut builder = EngineBuilder::new(
            self.engine_settings(seed_override),
            self.environment.snapshot(),
        );
        for robot in &self.robots {
            builder.push_robot(robot.clone());
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name: minimal
seed: 7
environment:
  weather:
    temperature_c: 25.0
    humidity_percent: 70.0
    wind_speed_ms: 2.0
    wind_direction_deg: 180.0
    cloud_cover_percent: 30.0
  solar:
    latitude: -22.715
  terrain:
    bounds: { lat_min: -22.720, lat_max: -22.710, lon_min: -47.655, lon_max: -47.645 }
    elevation: { min_m: 580.0, max_m: 610.0 }
  plantation:
    maturity: { avg_percent: 80.0 }
robots:
  - robot_id: MB-1
    physics:
      mass_kg: 180.0
      wheel_radius_m: 0.35
      drag_coefficient: 0.8
      rolling_resistance: 0.015
      dimensions_m: { width: 0.8, height: 1.0, length: 1.2 }
    state:
      position: { lat: -22.715, lon: -47.650, altitude_m: 595.0, heading_deg: 0.0 }
      battery:
        soc_percent: 90.0
        voltage_v: 50.4
        current_a: 0.0
        temperature_c: 30.0
        capacity_ah: 100.0
        charging: false
      mission:
        status: idle
"#;

    #[test]
    fn defaults_fill_the_gaps() {
        let scenario = Scenario::from_yaml(MINIMAL).expect("minimal scenario parses");
        assert_eq!(scenario.ticks(None), DEFAULT_TICKS);
        assert_eq!(scenario.ticks(Some(5)), 5);
        assert_eq!(scenario.simulation.timestep_seconds, 0.1);
        assert!(scenario.simulation.collision_detection);
        assert_eq!(scenario.simulation.precipitation_model, PrecipitationModel::TimeNormalized);
        assert_eq!(scenario.robots[0].kind, "microbot");
        assert_eq!(scenario.robots[0].state.mission.area_remaining_ha, 5.0);
        assert_eq!(scenario.logging, LoggingSettings::default());

        let snapshot = scenario.environment.snapshot();
        assert_eq!(snapshot.clock.to_string(), "2026-02-20 00:00:00");
        assert!(snapshot.terrain.obstacles.is_empty());
    }

    #[test]
    fn seed_override_reaches_engine() {
        let scenario = Scenario::from_yaml(MINIMAL).expect("minimal scenario parses");
        assert_eq!(scenario.engine_settings(None).seed, 7);
        assert_eq!(scenario.engine_settings(Some(99)).seed, 99);
        let engine = scenario.build_engine(None).expect("engine builds");
        assert_eq!(engine.controllers().len(), 1);
    }

    #[test]
    fn rejects_bad_timestep() {
        let text = MINIMAL.replace("seed: 7", "seed: 7\nsimulation:\n  timestep_seconds: 0.0");
        let err = Scenario::from_yaml(&text).unwrap_err();
        assert!(err.to_string().contains("timestep_seconds"), "{err}");
    }

    #[test]
    fn rejects_duplicate_robots() {
        let scenario = Scenario::from_yaml(MINIMAL).expect("minimal scenario parses");
        let mut doubled = scenario.clone();
        doubled.robots.push(scenario.robots[0].clone());
        assert_eq!(
            doubled.validate(),
            Err(ValidationError::DuplicateRobotId("MB-1".into()))
        );
    }

    #[test]
    fn rejects_out_of_range_state() {
        let text = MINIMAL.replace("soc_percent: 90.0", "soc_percent: 140.0");
        assert!(Scenario::from_yaml(&text).is_err());
    }
}
