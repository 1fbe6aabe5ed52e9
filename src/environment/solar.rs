use chrono::{Datelike, NaiveDateTime, Timelike};

use super::snapshot::Solar;

const MAX_IRRADIANCE_W_PER_M2: f64 = 1000.0;
const MAX_CLOUD_LOSS: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
}

/// Solar declination in degrees for a day of the year (1-based).
pub fn declination_deg(day_of_year: u32) -> f64 {
    23.45 * (std::f64::consts::TAU * (284.0 + day_of_year as f64) / 365.0).sin()
}

/// Sun elevation and azimuth for a latitude, day of year and local solar hour.
pub fn sun_position(latitude_deg: f64, day_of_year: u32, hour: f64) -> SunPosition {
    let lat = latitude_deg.to_radians();
    let dec = declination_deg(day_of_year).to_radians();
    let hour_angle = (15.0 * (hour - 12.0)).to_radians();

    let sin_elevation = lat.sin() * dec.sin() + lat.cos() * dec.cos() * hour_angle.cos();
    let elevation = sin_elevation.clamp(-1.0, 1.0).asin();

    let denominator = lat.cos() * elevation.cos();
    let cos_azimuth = if denominator.abs() > f64::EPSILON {
        ((dec.sin() - lat.sin() * elevation.sin()) / denominator).clamp(-1.0, 1.0)
    } else {
        1.0
    };
    let mut azimuth_deg = cos_azimuth.acos().to_degrees();
    if hour > 12.0 {
        azimuth_deg = 360.0 - azimuth_deg;
    }

    SunPosition {
        elevation_deg: elevation.to_degrees(),
        azimuth_deg,
    }
}

/// Clear-sky irradiance scaled by elevation and attenuated by cloud cover.
/// Zero at or below the horizon.
pub fn irradiance_w_per_m2(elevation_deg: f64, cloud_cover_percent: f64) -> f64 {
    if elevation_deg <= 0.0 {
        return 0.0;
    }
    let clear_sky = MAX_IRRADIANCE_W_PER_M2 * elevation_deg.to_radians().sin();
    let cloud_factor = 1.0 - (cloud_cover_percent / 100.0).clamp(0.0, 1.0) * MAX_CLOUD_LOSS;
    clear_sky * cloud_factor
}

pub(crate) fn update_solar(solar: &mut Solar, clock: NaiveDateTime, cloud_cover_percent: f64) {
    let hour =
        clock.hour() as f64 + clock.minute() as f64 / 60.0 + clock.second() as f64 / 3600.0;
    let position = sun_position(solar.latitude, clock.ordinal(), hour);

    solar.date = clock.date();
    solar.time = clock.time();
    solar.sun_elevation_deg = position.elevation_deg;
    solar.sun_azimuth_deg = position.azimuth_deg;
    solar.irradiance_w_per_m2 = irradiance_w_per_m2(position.elevation_deg, cloud_cover_percent);
}
