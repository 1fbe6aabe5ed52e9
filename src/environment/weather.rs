use chrono::{NaiveDateTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::snapshot::{Weather, WeatherCondition};
use crate::rng::RngExt;

const MEAN_TEMPERATURE_C: f64 = 25.0;
const TEMPERATURE_AMPLITUDE_C: f64 = 8.0;
const PEAK_HOUR: f64 = 14.0;

/// Tick length the precipitation constants were tuned for.
pub const REFERENCE_STEP_SECONDS: f64 = 0.1;
/// Event probability per reference step at 100 % cloud cover.
const EVENT_PROBABILITY_FULL_CLOUD: f64 = 0.01;
const DECAY_MM_PER_HOUR_PER_STEP: f64 = 0.1;

/// How precipitation and cloud dynamics respond to the timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationModel {
    /// Rates are scaled so the same wall-clock interval behaves the same at
    /// any timestep.
    #[default]
    TimeNormalized,
    /// One roll and one decay step per tick regardless of its length.
    PerTick,
}

impl PrecipitationModel {
    fn event_probability(&self, cloud_cover_percent: f64, dt: f64) -> f64 {
        let per_step = (cloud_cover_percent / 100.0).clamp(0.0, 1.0) * EVENT_PROBABILITY_FULL_CLOUD;
        match self {
            Self::PerTick => per_step,
            Self::TimeNormalized => {
                1.0 - (1.0 - per_step).powf(dt.max(0.0) / REFERENCE_STEP_SECONDS)
            }
        }
    }

    fn step_scale(&self, dt: f64) -> f64 {
        match self {
            Self::PerTick => 1.0,
            Self::TimeNormalized => dt.max(0.0) / REFERENCE_STEP_SECONDS,
        }
    }
}

/// Diurnal temperature for the given local hour, without noise.
pub fn diurnal_temperature(hour: f64) -> f64 {
    MEAN_TEMPERATURE_C
        + TEMPERATURE_AMPLITUDE_C
            * (std::f64::consts::TAU * (hour - (PEAK_HOUR - 6.0)) / 24.0).sin()
}

pub fn humidity_for(temperature_c: f64) -> f64 {
    (70.0 - (temperature_c - MEAN_TEMPERATURE_C) * 2.0).clamp(30.0, 95.0)
}

pub(crate) fn update_weather<R: Rng>(
    weather: &mut Weather,
    clock: NaiveDateTime,
    dt: f64,
    model: PrecipitationModel,
    rng: &mut R,
) {
    let hour = clock.hour() as f64 + clock.minute() as f64 / 60.0;
    let temperature_c = diurnal_temperature(hour) + rng.uniform(-0.5, 0.5);
    let humidity_percent = humidity_for(temperature_c);

    let wind_speed_ms = (weather.wind_speed_ms + rng.uniform(-0.2, 0.2)).clamp(0.0, 15.0);
    let wind_direction_deg =
        crate::geo::normalize_heading(weather.wind_direction_deg + rng.uniform(-2.0, 2.0));

    let scale = model.step_scale(dt);
    let mut cloud_cover = weather.cloud_cover_percent;
    let precipitation_mm_per_hour = if rng.chance(model.event_probability(cloud_cover, dt)) {
        cloud_cover = (cloud_cover + 5.0).min(100.0);
        rng.uniform(0.0, 10.0)
    } else {
        cloud_cover = (cloud_cover + rng.uniform(-1.0, 0.5) * scale).clamp(0.0, 100.0);
        (weather.precipitation_mm_per_hour - DECAY_MM_PER_HOUR_PER_STEP * scale).max(0.0)
    };

    weather.temperature_c = temperature_c;
    weather.humidity_percent = humidity_percent;
    weather.wind_speed_ms = wind_speed_ms;
    weather.wind_direction_deg = wind_direction_deg;
    weather.precipitation_mm_per_hour = precipitation_mm_per_hour;
    weather.cloud_cover_percent = cloud_cover;
    weather.conditions = WeatherCondition::classify(precipitation_mm_per_hour, cloud_cover);
}
