pub mod engine;
pub mod environment;
pub mod error;
pub mod geo;
pub mod logging;
pub mod mission;
pub mod physics;
pub mod rng;
pub mod robot;
pub mod scenario;

pub use engine::{Engine, EngineBuilder, EngineSettings, TickSummary};
pub use environment::{EnvironmentModel, EnvironmentSnapshot};
pub use error::ValidationError;
pub use mission::{MissionController, RunStatistics, TickReport};
pub use physics::PhysicsModel;
pub use robot::{Robot, RobotState};
pub use scenario::{Scenario, ScenarioLoader};
