use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{check_finite, check_range, ValidationError};
use crate::geo::{haversine_m, GeoPoint};

/// Read-only view of the ambient state for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub clock: NaiveDateTime,
    pub weather: Weather,
    pub solar: Solar,
    pub terrain: Terrain,
    pub plantation: Plantation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Rainy,
    Drizzle,
    Cloudy,
    PartlyCloudy,
    #[default]
    Sunny,
}

impl WeatherCondition {
    /// Precipitation outranks cloud cover: rainy > drizzle > cloudy >
    /// partly cloudy > sunny.
    pub fn classify(precipitation_mm_per_hour: f64, cloud_cover_percent: f64) -> Self {
        if precipitation_mm_per_hour > 5.0 {
            Self::Rainy
        } else if precipitation_mm_per_hour > 0.5 {
            Self::Drizzle
        } else if cloud_cover_percent > 80.0 {
            Self::Cloudy
        } else if cloud_cover_percent > 40.0 {
            Self::PartlyCloudy
        } else {
            Self::Sunny
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rainy => "rainy",
            Self::Drizzle => "drizzle",
            Self::Cloudy => "cloudy",
            Self::PartlyCloudy => "partly_cloudy",
            Self::Sunny => "sunny",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub wind_speed_ms: f64,
    pub wind_direction_deg: f64,
    #[serde(default)]
    pub precipitation_mm_per_hour: f64,
    pub cloud_cover_percent: f64,
    #[serde(default)]
    pub conditions: WeatherCondition,
}

fn default_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 20).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solar {
    pub latitude: f64,
    #[serde(default = "default_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub time: NaiveTime,
    #[serde(default)]
    pub sun_elevation_deg: f64,
    #[serde(default)]
    pub sun_azimuth_deg: f64,
    #[serde(default)]
    pub irradiance_w_per_m2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Bounds {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lon_min..=self.lon_max).contains(&lon)
    }

    /// Position inside the bounds scaled to `[0, 1]` per axis. Values outside
    /// the bounds extrapolate linearly; a degenerate axis maps to 0.
    pub fn normalize(&self, lat: f64, lon: f64) -> (f64, f64) {
        let lat_span = self.lat_max - self.lat_min;
        let lon_span = self.lon_max - self.lon_min;
        let lat_norm = if lat_span > 0.0 {
            (lat - self.lat_min) / lat_span
        } else {
            0.0
        };
        let lon_norm = if lon_span > 0.0 {
            (lon - self.lon_min) / lon_span
        } else {
            0.0
        };
        (lat_norm, lon_norm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Elevation {
    pub min_m: f64,
    pub max_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    #[serde(rename = "type")]
    pub kind: String,
    pub position: GeoPoint,
    pub radius_m: f64,
}

/// An obstacle found by a proximity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleHit {
    #[serde(rename = "type")]
    pub kind: String,
    pub distance_m: f64,
    pub position: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    pub bounds: Bounds,
    pub elevation: Elevation,
    #[serde(default)]
    pub slope_avg_deg: f64,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl Terrain {
    /// Smooth sinusoidal height field spanning the elevation range. Outside
    /// the bounds the same formula is extrapolated.
    pub fn height_at(&self, lat: f64, lon: f64) -> f64 {
        let (lat_norm, lon_norm) = self.bounds.normalize(lat, lon);
        let half_range = (self.elevation.max_m - self.elevation.min_m) / 2.0;
        let mid = (self.elevation.max_m + self.elevation.min_m) / 2.0;
        mid + half_range
            * ((lat_norm * std::f64::consts::TAU).sin() * 0.5
                + (lon_norm * std::f64::consts::TAU).cos() * 0.5)
    }

    /// Planting density in `[0, 1]`; 0 outside the planted bounds.
    pub fn plant_density_at(&self, lat: f64, lon: f64) -> f64 {
        if !self.bounds.contains(lat, lon) {
            return 0.0;
        }
        let (lat_norm, lon_norm) = self.bounds.normalize(lat, lon);
        let density = 0.92 + 0.08 * ((lat_norm * 10.0).sin() * (lon_norm * 10.0).cos());
        density.clamp(0.0, 1.0)
    }

    /// Obstacles whose centre lies closer than `radius_m + obstacle.radius_m`.
    pub fn obstacles_near(&self, lat: f64, lon: f64, radius_m: f64) -> Vec<ObstacleHit> {
        self.obstacles
            .iter()
            .filter_map(|obstacle| {
                let distance_m =
                    haversine_m(lat, lon, obstacle.position.lat, obstacle.position.lon);
                (distance_m < radius_m + obstacle.radius_m).then(|| ObstacleHit {
                    kind: obstacle.kind.clone(),
                    distance_m,
                    position: obstacle.position,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Maturity {
    pub avg_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plantation {
    pub maturity: Maturity,
    #[serde(default)]
    pub height_avg_m: f64,
    #[serde(default)]
    pub biomass_kg_per_ha: f64,
}

impl EnvironmentSnapshot {
    pub fn terrain_height(&self, lat: f64, lon: f64) -> f64 {
        self.terrain.height_at(lat, lon)
    }

    pub fn plant_density(&self, lat: f64, lon: f64) -> f64 {
        self.terrain.plant_density_at(lat, lon)
    }

    pub fn obstacles_near(&self, lat: f64, lon: f64, radius_m: f64) -> Vec<ObstacleHit> {
        self.terrain.obstacles_near(lat, lon, radius_m)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let weather = &self.weather;
        check_finite("weather.temperature_c", weather.temperature_c)?;
        check_range("weather.humidity_percent", weather.humidity_percent, 30.0, 95.0)?;
        check_range("weather.wind_speed_ms", weather.wind_speed_ms, 0.0, 15.0)?;
        check_finite("weather.wind_direction_deg", weather.wind_direction_deg)?;
        check_range(
            "weather.precipitation_mm_per_hour",
            weather.precipitation_mm_per_hour,
            0.0,
            f64::MAX,
        )?;
        check_range("weather.cloud_cover_percent", weather.cloud_cover_percent, 0.0, 100.0)?;

        check_range("solar.latitude", self.solar.latitude, -90.0, 90.0)?;
        check_range(
            "solar.irradiance_w_per_m2",
            self.solar.irradiance_w_per_m2,
            0.0,
            f64::MAX,
        )?;

        let bounds = &self.terrain.bounds;
        for (field, value) in [
            ("terrain.bounds.lat_min", bounds.lat_min),
            ("terrain.bounds.lat_max", bounds.lat_max),
            ("terrain.bounds.lon_min", bounds.lon_min),
            ("terrain.bounds.lon_max", bounds.lon_max),
        ] {
            check_finite(field, value)?;
        }
        if bounds.lat_min > bounds.lat_max || bounds.lon_min > bounds.lon_max {
            return Err(ValidationError::InvalidBounds {
                what: "terrain bounds min exceeds max".into(),
            });
        }
        if self.terrain.elevation.min_m > self.terrain.elevation.max_m {
            return Err(ValidationError::InvalidBounds {
                what: "terrain elevation min_m exceeds max_m".into(),
            });
        }
        check_range("terrain.slope_avg_deg", self.terrain.slope_avg_deg, -90.0, 90.0)?;
        for obstacle in &self.terrain.obstacles {
            check_range("terrain.obstacles.radius_m", obstacle.radius_m, 0.0, f64::MAX)?;
            check_finite("terrain.obstacles.position.lat", obstacle.position.lat)?;
            check_finite("terrain.obstacles.position.lon", obstacle.position.lon)?;
        }

        check_range(
            "plantation.maturity.avg_percent",
            self.plantation.maturity.avg_percent,
            0.0,
            100.0,
        )?;
        Ok(())
    }
}
