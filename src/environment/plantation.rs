use super::snapshot::{Plantation, Solar, Weather};

/// Maturity gained per second under ideal conditions (0.5 % per day).
const GROWTH_PERCENT_PER_SECOND: f64 = 0.5 / (24.0 * 3600.0);
const MAX_HEIGHT_M: f64 = 4.0;
const MAX_BIOMASS_KG_PER_HA: f64 = 100_000.0;

/// Product of the temperature, water and light factors, in `[0, 1]`.
pub fn growth_factor(weather: &Weather, solar: &Solar) -> f64 {
    let temperature = if (20.0..=35.0).contains(&weather.temperature_c) {
        1.0
    } else {
        0.5
    };
    let water = if weather.precipitation_mm_per_hour > 0.0 || weather.humidity_percent > 60.0 {
        1.0
    } else {
        0.7
    };
    let light = (solar.irradiance_w_per_m2 / 500.0).clamp(0.0, 1.0);
    temperature * water * light
}

pub(crate) fn grow(plantation: &mut Plantation, weather: &Weather, solar: &Solar, dt: f64) {
    let gained = GROWTH_PERCENT_PER_SECOND * growth_factor(weather, solar) * dt.max(0.0);
    let maturity = (plantation.maturity.avg_percent + gained).min(100.0);
    plantation.maturity.avg_percent = maturity;
    plantation.height_avg_m = maturity / 100.0 * MAX_HEIGHT_M;
    plantation.biomass_kg_per_ha = maturity / 100.0 * MAX_BIOMASS_KG_PER_HA;
}
