use crate::ais::{RecordTable, VesselTrack};
use std::collections::HashMap;

/// Splits a record table into disjoint per-vessel tracks.
pub struct Partitioner;

impl Partitioner {
    /// One track per distinct vessel id. Track order is unspecified; rows keep
    /// their table order inside each track.
    pub fn partition(table: RecordTable) -> Vec<VesselTrack> {
        let mut tracks: HashMap<u64, VesselTrack> = HashMap::new();
        for row in table.rows {
            tracks
                .entry(row.vessel_id)
                .or_insert_with(|| VesselTrack::new(row.vessel_id))
                .push(row);
        }
        tracks.into_values().collect()
    }
}
