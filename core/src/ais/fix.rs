use crate::ais::time::TimestampFormat;
use crate::prelude::{DetectionError, DetectionResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One positional report as handed over by the ingestion side.
///
/// Kinematic fields stay optional here; validation into a [`Fix`] happens
/// inside the worker that owns the track.
#[derive(Debug, Clone, PartialEq)]
pub struct FixRow {
    /// Source row index, used when reporting malformed input.
    pub row: usize,
    pub vessel_id: u64,
    pub timestamp: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed_over_ground: Option<f64>,
}

impl FixRow {
    pub fn new(
        row: usize,
        vessel_id: u64,
        timestamp: impl Into<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        speed_over_ground: Option<f64>,
    ) -> Self {
        Self {
            row,
            vessel_id,
            timestamp: timestamp.into(),
            latitude: latitude.filter(|v| v.is_finite()),
            longitude: longitude.filter(|v| v.is_finite()),
            speed_over_ground: speed_over_ground.filter(|v| v.is_finite()),
        }
    }

    /// Parses the row into a [`Fix`], rejecting missing or unparseable fields.
    pub fn validate(&self, format: TimestampFormat) -> DetectionResult<Fix> {
        let malformed = |reason: String| DetectionError::MalformedRow {
            row: self.row,
            reason,
        };

        let timestamp = format
            .parse(&self.timestamp)
            .ok_or_else(|| malformed(format!("unparseable timestamp {:?}", self.timestamp)))?;
        let latitude = self
            .latitude
            .ok_or_else(|| malformed("missing latitude".into()))?;
        let longitude = self
            .longitude
            .ok_or_else(|| malformed("missing longitude".into()))?;
        let speed_over_ground = self
            .speed_over_ground
            .ok_or_else(|| malformed("missing speed over ground".into()))?;

        Ok(Fix {
            row: self.row,
            vessel_id: self.vessel_id,
            timestamp,
            latitude,
            longitude,
            speed_over_ground,
        })
    }
}

/// A validated positional fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub row: usize,
    pub vessel_id: u64,
    pub timestamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_over_ground: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_complete_row() {
        let row = FixRow::new(
            3,
            219_000_001,
            "25/08/2024 00:01:00",
            Some(55.0),
            Some(10.0),
            Some(9.5),
        );
        let fix = row.validate(TimestampFormat::DayFirst).unwrap();
        assert_eq!(fix.row, 3);
        assert_eq!(fix.vessel_id, 219_000_001);
        assert_eq!(fix.latitude, 55.0);
    }

    #[test]
    fn validate_rejects_missing_speed() {
        let row = FixRow::new(7, 1, "25/08/2024 00:01:00", Some(55.0), Some(10.0), None);
        match row.validate(TimestampFormat::DayFirst) {
            Err(DetectionError::MalformedRow { row, reason }) => {
                assert_eq!(row, 7);
                assert!(reason.contains("speed"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_finite_inputs_are_stored_as_missing() {
        let row = FixRow::new(0, 1, "x", Some(f64::NAN), Some(f64::INFINITY), Some(1.0));
        assert_eq!(row.latitude, None);
        assert_eq!(row.longitude, None);
    }
}
