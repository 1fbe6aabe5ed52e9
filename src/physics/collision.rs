use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::environment::Obstacle;
use crate::geo::haversine_m;

/// Fraction of the contact distance under which a collision counts as major.
const MAJOR_COLLISION_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionSeverity {
    Minor,
    Major,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    #[serde(rename = "type")]
    pub kind: String,
    pub object: String,
    pub distance_m: f64,
    pub severity: CollisionSeverity,
    pub timestamp: NaiveDateTime,
}

/// Obstacles strictly closer than `robot_radius_m + obstacle.radius_m`.
pub fn detect_collisions(
    lat: f64,
    lon: f64,
    robot_radius_m: f64,
    obstacles: &[Obstacle],
    timestamp: NaiveDateTime,
) -> Vec<Collision> {
    obstacles
        .iter()
        .filter_map(|obstacle| {
            let contact = robot_radius_m + obstacle.radius_m;
            let distance_m = haversine_m(lat, lon, obstacle.position.lat, obstacle.position.lon);
            if distance_m >= contact {
                return None;
            }
            let severity = if distance_m < contact * MAJOR_COLLISION_RATIO {
                CollisionSeverity::Major
            } else {
                CollisionSeverity::Minor
            };
            Some(Collision {
                kind: "obstacle".into(),
                object: obstacle.kind.clone(),
                distance_m,
                severity,
                timestamp,
            })
        })
        .collect()
}
