use aiscore::ais::{FixRow, RecordTable};
use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const FIRST_MMSI: u64 = 219_000_000;
const TIMESTAMP_LAYOUT: &str = "%d/%m/%Y %H:%M:%S";

/// Configuration for generating synthetic AIS position reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub vessels: usize,
    pub fixes_per_vessel: usize,
    pub interval_s: i64,
    /// Probability that a fix is displaced by `jump_deg` degrees of latitude.
    pub spoof_rate: f64,
    pub jump_deg: f64,
    pub seed: u64,
    /// Emit rows in random order, as a merged export would.
    pub shuffle: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            vessels: 200,
            fixes_per_vessel: 120,
            interval_s: 10,
            spoof_rate: 0.01,
            jump_deg: 45.0,
            seed: 0,
            shuffle: true,
        }
    }
}

fn start_time() -> anyhow::Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2024, 8, 25)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .context("building generator start time")
}

pub fn build_table_from_config(config: &GeneratorConfig) -> anyhow::Result<RecordTable> {
    let row_count = config
        .vessels
        .checked_mul(config.fixes_per_vessel)
        .context("overflow computing row count for generator")?;
    let spoof_rate = config.spoof_rate.clamp(0.0, 1.0);
    let start = start_time()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut rows = Vec::with_capacity(row_count);

    for vessel in 0..config.vessels {
        let mmsi = FIRST_MMSI + vessel as u64;
        let mut lat: f64 = rng.gen_range(54.0..58.0);
        let mut lon: f64 = rng.gen_range(8.0..13.0);
        let mut sog: f64 = rng.gen_range(0.0..15.0);

        for step in 0..config.fixes_per_vessel {
            lat += rng.gen_range(-0.002..0.002);
            lon += rng.gen_range(-0.003..0.003);
            sog = (sog + rng.gen_range(-0.5..0.5)).max(0.0);
            let reported_lat = if rng.gen_bool(spoof_rate) {
                lat + config.jump_deg
            } else {
                lat
            };
            let timestamp = start + Duration::seconds(config.interval_s * step as i64);
            rows.push((
                mmsi,
                timestamp.format(TIMESTAMP_LAYOUT).to_string(),
                reported_lat,
                lon,
                sog,
            ));
        }
    }

    if config.shuffle {
        rows.shuffle(&mut rng);
    }

    Ok(RecordTable::from_rows(
        rows.into_iter()
            .enumerate()
            .map(|(row, (mmsi, timestamp, lat, lon, sog))| {
                FixRow::new(row, mmsi, timestamp, Some(lat), Some(lon), Some(sog))
            })
            .collect(),
    ))
}
