use crate::ais::fix::FixRow;
use std::collections::HashSet;

/// Strips surrounding whitespace and `#` markers from a header cell.
pub fn normalize_column_name(name: &str) -> String {
    name.trim_matches(|c: char| c.is_whitespace() || c == '#')
        .to_string()
}

/// In-memory table of positional fixes, one row per report.
///
/// The table is filled once by the ingestion side and handed to the
/// partitioner by value; nothing mutates it afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    pub rows: Vec<FixRow>,
    /// Source rows dropped before reaching the table (e.g. no vessel id).
    pub rejected_rows: usize,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<FixRow>) -> Self {
        Self {
            rows,
            rejected_rows: 0,
        }
    }

    pub fn push(&mut self, row: FixRow) {
        self.rows.push(row);
    }

    pub fn record_rejected(&mut self) {
        self.rejected_rows += 1;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn vessel_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.vessel_id)
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_markers_and_whitespace() {
        assert_eq!(normalize_column_name("# Timestamp"), "Timestamp");
        assert_eq!(normalize_column_name("  SOG \t"), "SOG");
        assert_eq!(normalize_column_name("Type of mobile"), "Type of mobile");
    }

    #[test]
    fn table_counts_distinct_vessels() {
        let mut table = RecordTable::new();
        for (row, vessel) in [1_u64, 2, 1, 3].into_iter().enumerate() {
            table.push(FixRow::new(row, vessel, "", None, None, None));
        }
        table.record_rejected();
        assert_eq!(table.len(), 4);
        assert_eq!(table.vessel_count(), 3);
        assert_eq!(table.rejected_rows, 1);
    }
}
