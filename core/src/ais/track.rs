use crate::ais::fix::FixRow;

/// All rows of a single vessel. Owned by exactly one worker while processed.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselTrack {
    pub vessel_id: u64,
    pub rows: Vec<FixRow>,
}

impl VesselTrack {
    pub fn new(vessel_id: u64) -> Self {
        Self {
            vessel_id,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(vessel_id: u64, rows: Vec<FixRow>) -> Self {
        Self { vessel_id, rows }
    }

    pub fn push(&mut self, row: FixRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
