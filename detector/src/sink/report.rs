use crate::workflow::runner::WorkflowResult;
use aiscore::ais::FlagResult;
use aiscore::processing::DispatchSummary;
use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

const TIMESTAMP_LAYOUT: &str = "%d/%m/%Y %H:%M:%S%.f";

pub fn write_flagged_stdout(flagged: &[FlagResult]) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let handle = stdout.lock();
    let mut writer = csv::Writer::from_writer(handle);
    write_flagged_rows(flagged, &mut writer)
}

pub fn write_flagged_csv(flagged: &[FlagResult], path: &Path) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    write_flagged_rows(flagged, &mut writer)
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

pub fn write_flagged_rows<W: Write>(
    flagged: &[FlagResult],
    writer: &mut csv::Writer<W>,
) -> anyhow::Result<()> {
    writer.write_record([
        "mmsi",
        "timestamp",
        "latitude",
        "longitude",
        "sog",
        "elapsed_s",
        "lat_delta",
        "lon_delta",
        "speed_delta",
        "lat_rate",
        "lon_rate",
        "speed_rate",
        "reasons",
    ])?;

    for result in flagged {
        let delta = &result.delta;
        let fix = &delta.fix;
        writer.write_record([
            fix.vessel_id.to_string(),
            fix.timestamp.format(TIMESTAMP_LAYOUT).to_string(),
            fix.latitude.to_string(),
            fix.longitude.to_string(),
            fix.speed_over_ground.to_string(),
            delta.elapsed_seconds.to_string(),
            format!("{:.6}", delta.lat_delta),
            format!("{:.6}", delta.lon_delta),
            format!("{:.6}", delta.speed_delta),
            optional(delta.lat_rate()),
            optional(delta.lon_rate()),
            optional(delta.speed_rate()),
            result.reasons.to_string(),
        ])?;
    }

    writer.flush().context("flushing flagged rows")?;
    Ok(())
}

/// Machine-readable account of a run, including everything that was skipped.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub rows_loaded: usize,
    pub rows_rejected: usize,
    pub vessels: usize,
    pub dispatch: DispatchSummary,
    pub pool_exhaustion: Option<String>,
    pub failures: Vec<String>,
    pub malformed: Vec<String>,
    pub insufficient: Vec<String>,
}

impl From<&WorkflowResult> for RunSummary {
    fn from(result: &WorkflowResult) -> Self {
        let messages = |errors: &[aiscore::DetectionError]| {
            errors.iter().map(ToString::to_string).collect::<Vec<_>>()
        };
        Self {
            rows_loaded: result.rows_loaded,
            rows_rejected: result.rows_rejected,
            vessels: result.vessels,
            dispatch: result.report.summary.clone(),
            pool_exhaustion: result.report.pool_exhaustion.as_ref().map(ToString::to_string),
            failures: messages(&result.report.failures),
            malformed: messages(&result.report.malformed),
            insufficient: messages(&result.report.insufficient),
        }
    }
}

pub fn write_summary_json(summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, summary)
        .with_context(|| format!("writing summary {}", path.display()))
}
