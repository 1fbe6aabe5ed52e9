//! Tick orchestration.
//!
//! Every tick advances the environment once and then steps each robot
//! against the same read-only snapshot. Robots never see each other, so they
//! can be stepped on the rayon pool without changing the result.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::environment::{
    EnvironmentConfig, EnvironmentModel, EnvironmentSnapshot, EnvironmentSummary,
};
use crate::error::{check_positive, ValidationError};
use crate::mission::{MissionController, RunStatistics, TickReport};
use crate::physics::{PhysicsConfig, PhysicsModel};
use crate::rng::RngManager;
use crate::robot::Robot;

pub const ENVIRONMENT_STREAM: &str = "environment";

pub fn robot_stream(robot_id: &str) -> String {
    format!("robot/{robot_id}")
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub timestep_seconds: f64,
    pub environment: EnvironmentConfig,
    pub physics: PhysicsConfig,
    pub parallel_robots: bool,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    environment: EnvironmentSnapshot,
    robots: Vec<Robot>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings, environment: EnvironmentSnapshot) -> Self {
        Self {
            settings,
            environment,
            robots: Vec::new(),
        }
    }

    pub fn with_robot(mut self, robot: Robot) -> Self {
        self.robots.push(robot);
        self
    }

    pub fn push_robot(&mut self, robot: Robot) {
        self.robots.push(robot);
    }

    pub fn build(self) -> Result<Engine, ValidationError> {
        check_positive("simulation.timestep_seconds", self.settings.timestep_seconds)?;
        let mut seen = HashSet::new();
        for robot in &self.robots {
            if !seen.insert(robot.robot_id.as_str()) {
                return Err(ValidationError::DuplicateRobotId(robot.robot_id.clone()));
            }
        }

        let rng = RngManager::new(self.settings.seed);
        let environment = EnvironmentModel::new(
            self.environment,
            self.settings.environment,
            rng.fork(ENVIRONMENT_STREAM),
        );
        let controllers: Vec<MissionController> = self
            .robots
            .into_iter()
            .map(|robot| {
                let stream = rng.fork(&robot_stream(&robot.robot_id));
                MissionController::new(robot, PhysicsModel::new(self.settings.physics), stream)
            })
            .collect();

        info!(
            scenario = %self.settings.scenario_name,
            seed = self.settings.seed,
            robots = controllers.len(),
            timestep_seconds = self.settings.timestep_seconds,
            parallel = self.settings.parallel_robots,
            "engine built"
        );

        Ok(Engine {
            environment,
            controllers,
            tick: 0,
            settings: self.settings,
        })
    }
}

/// Output of one engine tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub environment: EnvironmentSummary,
    pub robots: Vec<TickReport>,
}

pub struct Engine {
    environment: EnvironmentModel,
    controllers: Vec<MissionController>,
    tick: u64,
    settings: EngineSettings,
}

impl Engine {
    pub fn tick(&mut self) -> TickSummary {
        self.tick += 1;
        let dt = self.settings.timestep_seconds;
        let snapshot = self.environment.advance(dt);

        let robots = if self.settings.parallel_robots && self.controllers.len() > 1 {
            step_parallel(&mut self.controllers, &snapshot, dt)
        } else {
            self.controllers
                .iter_mut()
                .map(|controller| controller.step(&snapshot, dt))
                .collect()
        };

        let summary = TickSummary {
            tick: self.tick,
            environment: self.environment.summary(),
            robots,
        };
        debug!(
            tick = summary.tick,
            clock = %summary.environment.timestamp,
            conditions = summary.environment.conditions.as_str(),
            alerts = summary.robots.iter().map(|r| r.alerts.len()).sum::<usize>(),
            "tick complete"
        );
        summary
    }

    pub fn run(&mut self, ticks: u64) {
        self.run_with_hook(ticks, |_| {});
    }

    pub fn run_with_hook<F>(&mut self, ticks: u64, mut hook: F)
    where
        F: FnMut(&TickSummary),
    {
        info!(
            scenario = %self.settings.scenario_name,
            ticks,
            start_tick = self.tick,
            "run started"
        );
        for _ in 0..ticks {
            let summary = self.tick();
            hook(&summary);
        }
        info!(
            scenario = %self.settings.scenario_name,
            tick = self.tick,
            clock = %self.environment.clock(),
            "run finished"
        );
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn environment(&self) -> &EnvironmentModel {
        &self.environment
    }

    pub fn controllers(&self) -> &[MissionController] {
        &self.controllers
    }

    pub fn controller(&self, robot_id: &str) -> Option<&MissionController> {
        self.controllers
            .iter()
            .find(|controller| controller.robot_id() == robot_id)
    }

    /// Run totals keyed by robot id, in scenario order.
    pub fn statistics(&self) -> Vec<(String, RunStatistics)> {
        self.controllers
            .iter()
            .map(|controller| (controller.robot_id().to_string(), controller.statistics().clone()))
            .collect()
    }
}

fn step_parallel(
    controllers: &mut [MissionController],
    snapshot: &EnvironmentSnapshot,
    dt: f64,
) -> Vec<TickReport> {
    controllers
        .par_iter_mut()
        .map(|controller| controller.step(snapshot, dt))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::fixtures::field;
    use crate::robot::fixtures::harvester;

    fn settings(parallel_robots: bool) -> EngineSettings {
        EngineSettings {
            scenario_name: "unit".into(),
            seed: 42,
            timestep_seconds: 0.1,
            environment: EnvironmentConfig::default(),
            physics: PhysicsConfig::default(),
            parallel_robots,
        }
    }

    fn second_robot() -> Robot {
        let mut robot = harvester();
        robot.robot_id = "MICROBOT-003".into();
        robot.state.position.lat += 0.001;
        robot
    }

    #[test]
    fn hook_sees_every_tick() {
        let mut engine = EngineBuilder::new(settings(false), field())
            .with_robot(harvester())
            .build()
            .expect("engine builds");
        let mut ticks = Vec::new();
        engine.run_with_hook(6, |summary| ticks.push(summary.tick));
        assert_eq!(ticks, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(engine.current_tick(), 6);
        let elapsed = engine.environment().clock() - field().clock;
        assert_eq!(elapsed.num_milliseconds(), 600);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = EngineBuilder::new(settings(false), field())
            .with_robot(harvester())
            .with_robot(harvester())
            .build();
        assert!(
            matches!(result, Err(ValidationError::DuplicateRobotId(id)) if id == "MICROBOT-002")
        );
    }

    #[test]
    fn zero_timestep_is_rejected() {
        let mut bad = settings(false);
        bad.timestep_seconds = 0.0;
        assert!(EngineBuilder::new(bad, field()).build().is_err());
    }

    #[test]
    fn parallel_matches_serial() {
        let build = |parallel| {
            EngineBuilder::new(settings(parallel), field())
                .with_robot(harvester())
                .with_robot(second_robot())
                .build()
                .expect("engine builds")
        };
        let mut serial = build(false);
        let mut parallel = build(true);
        for _ in 0..25 {
            assert_eq!(serial.tick(), parallel.tick());
        }
    }

    #[test]
    fn robot_streams_are_independent_of_order() {
        let mut forward = EngineBuilder::new(settings(false), field())
            .with_robot(harvester())
            .with_robot(second_robot())
            .build()
            .expect("engine builds");
        let mut reversed = EngineBuilder::new(settings(false), field())
            .with_robot(second_robot())
            .with_robot(harvester())
            .build()
            .expect("engine builds");
        forward.run(10);
        reversed.run(10);
        assert_eq!(
            forward.controller("MICROBOT-002").map(|c| c.state().clone()),
            reversed.controller("MICROBOT-002").map(|c| c.state().clone()),
        );
    }
}
