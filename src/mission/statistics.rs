use serde::{Deserialize, Serialize};

/// Totals accumulated over a run of one robot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_timesteps: u64,
    pub distance_traveled_km: f64,
    pub energy_consumed_kwh: f64,
    pub area_harvested_ha: f64,
    pub collisions: u64,
    pub mission_progress_percent: f64,
}

impl RunStatistics {
    /// Fold one tick into the totals. Energy counts in both directions, so a
    /// charging tick adds to the consumed total as well.
    pub fn record_tick(
        &mut self,
        speed_ms: f64,
        dt: f64,
        energy_change_wh: f64,
        collisions: usize,
        mission_progress_percent: f64,
    ) {
        self.distance_traveled_km += speed_ms * dt / 1000.0;
        self.energy_consumed_kwh += energy_change_wh.abs() / 1000.0;
        self.collisions += collisions as u64;
        self.mission_progress_percent = mission_progress_percent;
        self.total_timesteps += 1;
    }

    pub fn efficiency_ha_per_kwh(&self) -> f64 {
        if self.energy_consumed_kwh > 0.0 {
            self.area_harvested_ha / self.energy_consumed_kwh
        } else {
            0.0
        }
    }
}
