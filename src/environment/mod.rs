//! Ambient state of the field: weather, sun, terrain and crop.
//!
//! [`EnvironmentModel`] owns the only mutable copy of the state and advances it
//! tick by tick. Everything else sees an [`EnvironmentSnapshot`] that is
//! treated as immutable for the duration of a tick.

mod plantation;
mod snapshot;
mod solar;
mod weather;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::rng::SimRng;

pub use plantation::growth_factor;
pub use snapshot::{
    Bounds, Elevation, EnvironmentSnapshot, Maturity, Obstacle, ObstacleHit, Plantation, Solar,
    Terrain, Weather, WeatherCondition,
};
pub use solar::{declination_deg, irradiance_w_per_m2, sun_position, SunPosition};
pub use weather::{diurnal_temperature, humidity_for, PrecipitationModel, REFERENCE_STEP_SECONDS};

#[cfg(test)]
pub(crate) use snapshot::fixtures;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentConfig {
    pub weather_simulation: bool,
    pub solar_simulation: bool,
    pub precipitation_model: PrecipitationModel,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            weather_simulation: true,
            solar_simulation: true,
            precipitation_model: PrecipitationModel::default(),
        }
    }
}

/// Condensed view for logs and reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentSummary {
    pub timestamp: NaiveDateTime,
    pub conditions: WeatherCondition,
    pub temperature_c: f64,
    pub wind_speed_ms: f64,
    pub precipitation_mm_per_hour: f64,
    pub sun_elevation_deg: f64,
    pub irradiance_w_per_m2: f64,
    pub daytime: bool,
    pub maturity_percent: f64,
    pub height_m: f64,
    pub biomass_kg_per_ha: f64,
}

pub struct EnvironmentModel {
    state: EnvironmentSnapshot,
    config: EnvironmentConfig,
    rng: SimRng,
}

impl EnvironmentModel {
    pub fn new(initial: EnvironmentSnapshot, config: EnvironmentConfig, rng: SimRng) -> Self {
        Self {
            state: initial,
            config,
            rng,
        }
    }

    /// Move the clock forward by `elapsed_seconds` and update the ambient
    /// state. Returns a copy of the new state for observers.
    pub fn advance(&mut self, elapsed_seconds: f64) -> EnvironmentSnapshot {
        let elapsed = elapsed_seconds.max(0.0);
        let step = Duration::nanoseconds((elapsed * 1e9).round() as i64);
        if let Some(clock) = self.state.clock.checked_add_signed(step) {
            self.state.clock = clock;
        }

        if self.config.weather_simulation {
            weather::update_weather(
                &mut self.state.weather,
                self.state.clock,
                elapsed,
                self.config.precipitation_model,
                &mut self.rng,
            );
        }
        if self.config.solar_simulation {
            solar::update_solar(
                &mut self.state.solar,
                self.state.clock,
                self.state.weather.cloud_cover_percent,
            );
        }
        plantation::grow(
            &mut self.state.plantation,
            &self.state.weather,
            &self.state.solar,
            elapsed,
        );

        self.state.clone()
    }

    pub fn snapshot(&self) -> &EnvironmentSnapshot {
        &self.state
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn clock(&self) -> NaiveDateTime {
        self.state.clock
    }

    pub fn terrain_height(&self, lat: f64, lon: f64) -> f64 {
        self.state.terrain_height(lat, lon)
    }

    pub fn plant_density(&self, lat: f64, lon: f64) -> f64 {
        self.state.plant_density(lat, lon)
    }

    pub fn obstacles_near(&self, lat: f64, lon: f64, radius_m: f64) -> Vec<ObstacleHit> {
        self.state.obstacles_near(lat, lon, radius_m)
    }

    pub fn summary(&self) -> EnvironmentSummary {
        let EnvironmentSnapshot {
            clock,
            weather,
            solar,
            plantation,
            ..
        } = &self.state;
        EnvironmentSummary {
            timestamp: *clock,
            conditions: weather.conditions,
            temperature_c: weather.temperature_c,
            wind_speed_ms: weather.wind_speed_ms,
            precipitation_mm_per_hour: weather.precipitation_mm_per_hour,
            sun_elevation_deg: solar.sun_elevation_deg,
            irradiance_w_per_m2: solar.irradiance_w_per_m2,
            daytime: solar.sun_elevation_deg > 0.0,
            maturity_percent: plantation.maturity.avg_percent,
            height_m: plantation.height_avg_m,
            biomass_kg_per_ha: plantation.biomass_kg_per_ha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::field;
    use super::*;
    use crate::rng::RngManager;

    fn model(seed: u64, config: EnvironmentConfig) -> EnvironmentModel {
        EnvironmentModel::new(field(), config, RngManager::new(seed).fork("environment"))
    }

    #[test]
    fn advance_moves_clock() {
        let mut env = model(1, EnvironmentConfig::default());
        let start = env.clock();
        let snapshot = env.advance(90.5);
        assert_eq!(
            (snapshot.clock - start).num_milliseconds(),
            90_500,
            "clock should advance by the elapsed time"
        );
        assert_eq!(snapshot.solar.time, snapshot.clock.time());
    }

    #[test]
    fn disabled_subsystems_keep_initial_values() {
        let config = EnvironmentConfig {
            weather_simulation: false,
            solar_simulation: false,
            ..EnvironmentConfig::default()
        };
        let mut env = model(1, config);
        let initial = env.snapshot().clone();
        let snapshot = env.advance(60.0);
        assert_eq!(snapshot.weather, initial.weather);
        assert_eq!(snapshot.solar, initial.solar);
        assert!(snapshot.plantation.maturity.avg_percent > initial.plantation.maturity.avg_percent);
    }

    #[test]
    fn same_seed_same_weather() {
        let mut a = model(99, EnvironmentConfig::default());
        let mut b = model(99, EnvironmentConfig::default());
        for _ in 0..500 {
            assert_eq!(a.advance(0.1), b.advance(0.1));
        }
    }

    #[test]
    fn solar_tracks_clock() {
        let mut env = model(3, EnvironmentConfig::default());
        // fixture starts at 10:00, jump to 23:00
        let snapshot = env.advance(13.0 * 3600.0);
        assert!(snapshot.solar.sun_elevation_deg < 0.0);
        assert_eq!(snapshot.solar.irradiance_w_per_m2, 0.0);
        assert!(!env.summary().daytime);
    }

    #[test]
    fn queries_delegate_to_snapshot() {
        let env = model(3, EnvironmentConfig::default());
        let tree = env.snapshot().terrain.obstacles[0].position;
        assert_eq!(env.obstacles_near(tree.lat, tree.lon, 1.0).len(), 1);
        assert_eq!(env.plant_density(0.0, 0.0), 0.0);
        assert!(env.terrain_height(-22.715, -47.65) > 0.0);
    }
}
