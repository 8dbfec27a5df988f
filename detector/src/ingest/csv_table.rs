use aiscore::ais::{normalize_column_name, FixRow, RecordTable};
use anyhow::{bail, Context};
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::{self, Utf8Error};

/// Positions of the required columns in a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub mmsi: usize,
    pub timestamp: usize,
    pub latitude: usize,
    pub longitude: usize,
    pub sog: usize,
}

impl ColumnMap {
    pub fn from_headers(headers: &StringRecord) -> anyhow::Result<Self> {
        let names: Vec<String> = headers.iter().map(normalize_column_name).collect();
        let find = |wanted: &str| -> anyhow::Result<usize> {
            match names.iter().position(|name| name.eq_ignore_ascii_case(wanted)) {
                Some(index) => Ok(index),
                None => bail!("missing required column {:?} (found {:?})", wanted, names),
            }
        };
        Ok(Self {
            mmsi: find("MMSI")?,
            timestamp: find("Timestamp")?,
            latitude: find("Latitude")?,
            longitude: find("Longitude")?,
            sog: find("SOG")?,
        })
    }

    /// Decodes the required fields only; other columns may hold any bytes.
    fn decode<'r>(&self, record: &'r ByteRecord) -> Result<Fields<'r>, Utf8Error> {
        let text = move |index: usize| str::from_utf8(record.get(index).unwrap_or_default());
        Ok(Fields {
            mmsi: text(self.mmsi)?,
            timestamp: text(self.timestamp)?,
            latitude: text(self.latitude)?,
            longitude: text(self.longitude)?,
            sog: text(self.sog)?,
        })
    }
}

struct Fields<'r> {
    mmsi: &'r str,
    timestamp: &'r str,
    latitude: &'r str,
    longitude: &'r str,
    sog: &'r str,
}

fn number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok()
}

/// Reads a delimited AIS export into a [`RecordTable`].
///
/// Records that cannot be read, carry non UTF-8 bytes in a required column or
/// have an unparseable vessel id are counted as rejected. Other fields are kept
/// as read so that the detector can report them per row.
pub fn read_table<R: Read>(reader: R, limit: Option<usize>) -> anyhow::Result<RecordTable> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = reader.headers().context("reading CSV header")?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut table = RecordTable::new();
    for (row, record) in reader.byte_records().enumerate() {
        if limit.is_some_and(|limit| row >= limit) {
            break;
        }
        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => {
                return Err(err).with_context(|| format!("reading CSV row {}", row));
            }
            Err(err) => {
                debug!("row {}: {}", row, err);
                table.record_rejected();
                continue;
            }
        };
        let fields = match columns.decode(&record) {
            Ok(fields) => fields,
            Err(err) => {
                debug!("row {}: required column is not UTF-8: {}", row, err);
                table.record_rejected();
                continue;
            }
        };
        let vessel_id = match fields.mmsi.parse::<u64>() {
            Ok(id) => id,
            Err(_) => {
                debug!("row {}: unparseable MMSI {:?}", row, fields.mmsi);
                table.record_rejected();
                continue;
            }
        };
        table.push(FixRow::new(
            row,
            vessel_id,
            fields.timestamp,
            number(fields.latitude),
            number(fields.longitude),
            number(fields.sog),
        ));
    }

    info!(
        "loaded {} rows for {} vessels ({} rejected)",
        table.len(),
        table.vessel_count(),
        table.rejected_rows
    );
    Ok(table)
}

pub fn load_table(path: &Path, limit: Option<usize>) -> anyhow::Result<RecordTable> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_table(file, limit).with_context(|| format!("loading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
# Timestamp,Type of mobile,MMSI,Latitude,Longitude,Navigational status,ROT,SOG
25/08/2024 00:00:00,Class A,219000001,55.0,10.0,Under way,0,10.0
25/08/2024 00:01:00,Class A,219000001,55.6,10.0,Under way,0,12.0
25/08/2024 00:00:05,Class A,not-a-number,55.0,10.0,Under way,0,1.0
25/08/2024 00:00:07,Base Station,2190068,56.1,,Unknown,,
";

    #[test]
    fn column_map_accepts_marked_headers() {
        let headers =
            StringRecord::from(vec!["# Timestamp ", "mmsi", "Latitude", "Longitude", "SOG"]);
        let map = ColumnMap::from_headers(&headers).unwrap();
        assert_eq!(map.timestamp, 0);
        assert_eq!(map.mmsi, 1);
        assert_eq!(map.sog, 4);
    }

    #[test]
    fn column_map_reports_missing_columns() {
        let headers = StringRecord::from(vec!["Timestamp", "MMSI", "Latitude"]);
        let err = ColumnMap::from_headers(&headers).unwrap_err();
        assert!(err.to_string().contains("Longitude"));
    }

    #[test]
    fn read_table_parses_rows_and_rejects_bad_ids() {
        let table = read_table(SAMPLE.as_bytes(), None).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rejected_rows, 1);
        assert_eq!(table.rows[1].vessel_id, 219_000_001);
        assert_eq!(table.rows[1].latitude, Some(55.6));
        assert_eq!(table.rows[2].row, 3);
        assert_eq!(table.rows[2].longitude, None);
        assert_eq!(table.rows[2].speed_over_ground, None);
    }

    #[test]
    fn non_utf8_bytes_only_reject_rows_that_need_them() {
        let mut csv = b"Timestamp,MMSI,Latitude,Longitude,SOG,Name\n".to_vec();
        csv.extend_from_slice(b"25/08/2024 00:00:00,219000001,55.0,10.0,10.0,DANA\n");
        csv.extend_from_slice(b"25/08/2024 00:01:00,219000002,55.1,10.1,11.0,K\xd8BENHAVN\n");
        csv.extend_from_slice(b"25/08/2024 00:02:00,21900\xd80003,55.2,10.2,12.0,ODIN\n");
        csv.extend_from_slice(b"25/08/2024 00:03:00,219000001,55.3,10.3,13.0,DANA\n");

        let table = read_table(csv.as_slice(), None).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rejected_rows, 1);
        assert_eq!(table.rows[1].vessel_id, 219_000_002);
        assert_eq!(table.rows[1].row, 1);
        assert_eq!(table.rows[1].speed_over_ground, Some(11.0));
        assert_eq!(table.rows[2].row, 3);
        assert_eq!(table.vessel_count(), 2);
    }

    #[test]
    fn read_table_honours_limit() {
        let table = read_table(SAMPLE.as_bytes(), Some(2)).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn load_table_reads_file() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(SAMPLE.as_bytes()).unwrap();
        let path = temp.into_temp_path();
        let table = load_table(&path, None).unwrap();
        assert_eq!(table.vessel_count(), 2);
    }
}
