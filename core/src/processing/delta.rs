use crate::ais::{DeltaRecord, TimestampFormat, VesselTrack};
use crate::prelude::DetectionError;

/// Deltas for one track plus the rows that could not take part.
#[derive(Debug, Clone, Default)]
pub struct TrackDeltas {
    pub vessel_id: u64,
    pub deltas: Vec<DeltaRecord>,
    pub malformed: Vec<DetectionError>,
}

/// Turns a vessel track into consecutive-fix deltas.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaComputer {
    format: TimestampFormat,
}

impl DeltaComputer {
    pub fn new(format: TimestampFormat) -> Self {
        Self { format }
    }

    /// Validates, sorts and differences a track.
    ///
    /// Malformed rows are dropped before sorting, so the fix after a bad row is
    /// compared with the last good one. Ties on timestamp fall back to source
    /// row order, which makes the output independent of input order.
    pub fn compute(&self, track: VesselTrack) -> TrackDeltas {
        let mut malformed = Vec::new();
        let mut fixes = Vec::with_capacity(track.rows.len());
        for row in &track.rows {
            match row.validate(self.format) {
                Ok(fix) => fixes.push(fix),
                Err(err) => malformed.push(err),
            }
        }

        fixes.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.row.cmp(&b.row)));

        let mut deltas = Vec::with_capacity(fixes.len().saturating_sub(1));
        let mut fixes = fixes.into_iter();
        if let Some(mut previous) = fixes.next() {
            for current in fixes {
                let delta = DeltaRecord::between(&previous, current);
                previous = delta.fix.clone();
                deltas.push(delta);
            }
        }

        TrackDeltas {
            vessel_id: track.vessel_id,
            deltas,
            malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ais::FixRow;

    fn row(row: usize, ts: &str, lat: f64, lon: f64, sog: f64) -> FixRow {
        FixRow::new(row, 123, ts, Some(lat), Some(lon), Some(sog))
    }

    fn track(rows: Vec<FixRow>) -> VesselTrack {
        VesselTrack::with_rows(123, rows)
    }

    #[test]
    fn produces_one_delta_per_fix_after_the_first() {
        let computer = DeltaComputer::default();
        let output = computer.compute(track(vec![
            row(0, "25/08/2024 00:00:00", 55.0, 10.0, 10.0),
            row(1, "25/08/2024 00:01:00", 55.6, 10.0, 12.0),
            row(2, "25/08/2024 00:02:00", 55.7, 10.1, 12.5),
        ]));
        assert_eq!(output.deltas.len(), 2);
        assert_eq!(output.deltas[0].elapsed_seconds, 60.0);
        assert!((output.deltas[0].lat_delta - 0.6).abs() < 1e-9);
        assert_eq!(output.deltas[0].speed_delta, 2.0);
        assert_eq!(output.deltas[1].fix.row, 2);
    }

    #[test]
    fn short_tracks_produce_no_deltas() {
        let computer = DeltaComputer::default();
        assert!(computer.compute(track(Vec::new())).deltas.is_empty());
        let single = computer.compute(track(vec![row(
            0,
            "25/08/2024 00:00:00",
            1.0,
            1.0,
            1.0,
        )]));
        assert!(single.deltas.is_empty());
    }

    #[test]
    fn unsorted_input_matches_sorted_input() {
        let computer = DeltaComputer::default();
        let sorted = vec![
            row(0, "25/08/2024 00:00:00", 55.0, 10.0, 10.0),
            row(1, "25/08/2024 00:01:00", 55.6, 10.0, 12.0),
            row(2, "25/08/2024 00:01:00", 55.9, 10.3, 11.0),
            row(3, "26/08/2024 00:00:00", 56.0, 11.0, 0.0),
        ];
        let mut shuffled = sorted.clone();
        shuffled.reverse();
        shuffled.swap(0, 2);

        let expected = computer.compute(track(sorted)).deltas;
        let actual = computer.compute(track(shuffled)).deltas;
        assert_eq!(expected, actual);
        assert_eq!(actual[1].elapsed_seconds, 0.0);
    }

    #[test]
    fn malformed_rows_are_excluded_and_reported() {
        let computer = DeltaComputer::default();
        let output = computer.compute(track(vec![
            row(0, "25/08/2024 00:00:00", 55.0, 10.0, 10.0),
            FixRow::new(1, 123, "25/08/2024 00:00:30", None, Some(10.0), Some(10.0)),
            row(2, "not a time", 0.0, 0.0, 0.0),
            row(3, "25/08/2024 00:01:00", 55.5, 10.0, 10.0),
        ]));
        assert_eq!(output.malformed.len(), 2);
        assert_eq!(output.deltas.len(), 1);
        assert_eq!(output.deltas[0].elapsed_seconds, 60.0);
        assert!((output.deltas[0].lat_delta - 0.5).abs() < 1e-9);
        assert!(matches!(
            output.malformed[0],
            DetectionError::MalformedRow { row: 1, .. }
        ));
    }
}
