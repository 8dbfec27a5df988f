use crate::ais::fix::Fix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinematic change between a fix and its chronological predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRecord {
    pub fix: Fix,
    pub elapsed_seconds: f64,
    pub lat_delta: f64,
    pub lon_delta: f64,
    pub speed_delta: f64,
}

impl DeltaRecord {
    pub fn between(previous: &Fix, current: Fix) -> Self {
        let elapsed = current.timestamp - previous.timestamp;
        let elapsed_seconds = elapsed
            .num_nanoseconds()
            .map(|ns| ns as f64 / 1e9)
            .unwrap_or_else(|| elapsed.num_seconds() as f64);
        Self {
            elapsed_seconds,
            lat_delta: (current.latitude - previous.latitude).abs(),
            lon_delta: (current.longitude - previous.longitude).abs(),
            speed_delta: (current.speed_over_ground - previous.speed_over_ground).abs(),
            fix: current,
        }
    }

    pub fn vessel_id(&self) -> u64 {
        self.fix.vessel_id
    }

    /// Latitude change per second; `None` for simultaneous reports.
    pub fn lat_rate(&self) -> Option<f64> {
        self.per_second(self.lat_delta)
    }

    pub fn lon_rate(&self) -> Option<f64> {
        self.per_second(self.lon_delta)
    }

    pub fn speed_rate(&self) -> Option<f64> {
        self.per_second(self.speed_delta)
    }

    fn per_second(&self, value: f64) -> Option<f64> {
        if self.elapsed_seconds > 0.0 {
            Some(value / self.elapsed_seconds)
        } else {
            None
        }
    }
}

/// Which rules fired for a delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagReasons {
    pub lat: bool,
    pub lon: bool,
    pub speed: bool,
}

impl FlagReasons {
    pub fn any(&self) -> bool {
        self.lat || self.lon || self.speed
    }
}

impl fmt::Display for FlagReasons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [(self.lat, "lat"), (self.lon, "lon"), (self.speed, "speed")]
            .into_iter()
            .filter_map(|(fired, name)| fired.then_some(name))
            .collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Classification outcome for one delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagResult {
    pub delta: DeltaRecord,
    pub is_flagged: bool,
    pub reasons: FlagReasons,
}

impl FlagResult {
    pub fn new(delta: DeltaRecord, reasons: FlagReasons) -> Self {
        Self {
            delta,
            is_flagged: reasons.any(),
            reasons,
        }
    }

    pub fn vessel_id(&self) -> u64 {
        self.delta.vessel_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fix(seconds: u32, lat: f64, lon: f64, sog: f64) -> Fix {
        let timestamp = NaiveDate::from_ymd_opt(2024, 8, 25)
            .and_then(|d| d.and_hms_opt(0, 0, seconds))
            .unwrap();
        Fix {
            row: seconds as usize,
            vessel_id: 123,
            timestamp,
            latitude: lat,
            longitude: lon,
            speed_over_ground: sog,
        }
    }

    #[test]
    fn between_takes_absolute_differences() {
        let delta = DeltaRecord::between(&fix(0, 55.6, 10.2, 12.0), fix(30, 55.0, 10.0, 10.0));
        assert_eq!(delta.elapsed_seconds, 30.0);
        assert!((delta.lat_delta - 0.6).abs() < 1e-9);
        assert!((delta.lon_delta - 0.2).abs() < 1e-9);
        assert_eq!(delta.speed_delta, 2.0);
        assert!((delta.speed_rate().unwrap() - 2.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn rates_are_undefined_for_zero_elapsed_time() {
        let delta = DeltaRecord::between(&fix(5, 55.0, 10.0, 1.0), fix(5, 56.0, 10.0, 1.0));
        assert_eq!(delta.elapsed_seconds, 0.0);
        assert_eq!(delta.lat_rate(), None);
        assert_eq!(delta.lon_rate(), None);
    }

    #[test]
    fn reasons_render_fired_rules() {
        let reasons = FlagReasons {
            lat: true,
            lon: false,
            speed: true,
        };
        assert_eq!(reasons.to_string(), "lat|speed");
        assert_eq!(FlagReasons::default().to_string(), "none");
    }
}
