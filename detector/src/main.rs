use aiscore::ais::TimestampFormat;
use aiscore::prelude::{StrategyConfig, Thresholds, DEFAULT_BATCH_SIZE, DEFAULT_IQR_MULTIPLIER};
use aiscore::processing::CancelToken;
use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use generator::profile::{build_table_from_config, GeneratorConfig};
use ingest::csv_table::load_table;
use log::warn;
use sink::report::{write_flagged_csv, write_flagged_stdout, write_summary_json, RunSummary};
use std::path::PathBuf;
use std::thread;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod ingest;
mod sink;
mod workflow;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Fixed,
    Iqr,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    Coarse,
    Sensitive,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TimestampArg {
    DayFirst,
    YearFirst,
}

#[derive(Parser)]
#[command(author, version, about = "Flag likely GPS spoofing in AIS position exports")]
struct Args {
    /// AIS export in CSV form
    #[arg(long, conflicts_with = "synthetic")]
    input: Option<PathBuf>,
    /// Generate this many synthetic vessels instead of reading a file
    #[arg(long)]
    synthetic: Option<usize>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Load a workflow config from YAML (overrides the detection flags below)
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = StrategyArg::Fixed)]
    strategy: StrategyArg,
    #[arg(long, value_enum, default_value_t = PresetArg::Coarse)]
    preset: PresetArg,
    #[arg(long)]
    lat_threshold: Option<f64>,
    #[arg(long)]
    lon_threshold: Option<f64>,
    #[arg(long)]
    speed_threshold: Option<f64>,
    #[arg(long, default_value_t = DEFAULT_IQR_MULTIPLIER)]
    iqr_multiplier: f64,
    /// Worker threads; defaults to every available core
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
    /// Read at most this many data rows
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long, value_enum, default_value_t = TimestampArg::DayFirst)]
    timestamp_format: TimestampArg,
    /// Run on a single thread as a baseline
    #[arg(long, default_value_t = false)]
    sequential: bool,
    /// Write flagged rows here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write a JSON run summary
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl Args {
    fn strategy_config(&self) -> StrategyConfig {
        match self.strategy {
            StrategyArg::Fixed => {
                let preset = match self.preset {
                    PresetArg::Coarse => Thresholds::coarse(),
                    PresetArg::Sensitive => Thresholds::sensitive(),
                };
                StrategyConfig::FixedThreshold(Thresholds {
                    lat: self.lat_threshold.unwrap_or(preset.lat),
                    lon: self.lon_threshold.unwrap_or(preset.lon),
                    speed: self.speed_threshold.unwrap_or(preset.speed),
                })
            }
            StrategyArg::Iqr => StrategyConfig::Iqr {
                multiplier: self.iqr_multiplier,
            },
        }
    }

    fn workflow_config(&self) -> anyhow::Result<WorkflowConfig> {
        if let Some(path) = &self.workflow {
            return WorkflowConfig::load(path);
        }
        let mut config =
            WorkflowConfig::from_args(self.strategy_config(), self.workers, self.batch_size);
        config.limit = self.limit;
        config.sequential = self.sequential;
        config.timestamp_format = match self.timestamp_format {
            TimestampArg::DayFirst => TimestampFormat::DayFirst,
            TimestampArg::YearFirst => TimestampFormat::YearFirst,
        };
        Ok(config)
    }
}

/// Trips `cancel` on Ctrl+C so an operator can abort a long dispatch.
fn spawn_abort_listener(cancel: CancelToken) -> anyhow::Result<()> {
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for signal handling")?;
    thread::Builder::new()
        .name("abort-listener".into())
        .spawn(move || {
            runtime.block_on(async move {
                if signal::ctrl_c().await.is_ok() {
                    warn!("abort requested, cancelling remaining tracks");
                    cancel.cancel();
                }
            })
        })
        .context("spawning abort listener")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let workflow_config = args.workflow_config()?;

    let table = if let Some(vessels) = args.synthetic {
        build_table_from_config(&GeneratorConfig {
            vessels,
            seed: args.seed,
            ..Default::default()
        })?
    } else if let Some(path) = &args.input {
        load_table(path, workflow_config.limit)?
    } else {
        bail!("either --input or --synthetic is required");
    };

    let cancel = CancelToken::new();
    spawn_abort_listener(cancel.clone())?;

    let runner = Runner::new(workflow_config);
    let result = runner.execute(table, cancel)?;
    let report = &result.report;

    match &args.output {
        Some(path) => write_flagged_csv(&report.flagged, path)?,
        None => write_flagged_stdout(&report.flagged)?,
    }
    if let Some(path) = &args.summary {
        write_summary_json(&RunSummary::from(&result), path)?;
    }

    eprintln!(
        "{} rows ({} rejected), {} vessels -> {} flagged, {} failed tracks, {} malformed rows, \
         {} tracks too short for {} [{} workers, batch {}, {:.1} ms]",
        result.rows_loaded,
        result.rows_rejected,
        result.vessels,
        report.summary.flagged,
        report.summary.failed,
        report.summary.malformed,
        report.summary.insufficient,
        report.summary.strategy,
        report.summary.workers,
        report.summary.batch_size,
        report.summary.elapsed_ms
    );
    for failure in &report.failures {
        eprintln!("  {}", failure);
    }

    Ok(())
}
