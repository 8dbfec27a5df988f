use aiscore::ais::TimestampFormat;
use aiscore::prelude::{DetectorConfig, DispatchConfig, StrategyConfig};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub strategy: StrategyConfig,
    pub dispatch: DispatchConfig,
    pub timestamp_format: TimestampFormat,
    /// Read at most this many data rows from the input.
    pub limit: Option<usize>,
    /// Run on the calling thread instead of the worker pool.
    pub sequential: bool,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .to_detector_config()
            .validate()
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        strategy: StrategyConfig,
        worker_count: Option<usize>,
        batch_size: usize,
    ) -> Self {
        Self {
            strategy,
            dispatch: DispatchConfig {
                worker_count,
                batch_size,
            },
            ..Default::default()
        }
    }

    pub fn to_detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            strategy: self.strategy,
            dispatch: self.dispatch.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aiscore::prelude::Thresholds;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> tempfile::TempPath {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(contents.as_bytes()).unwrap();
        temp.into_temp_path()
    }

    #[test]
    fn config_from_args_produces_detector_config() {
        let cfg = WorkflowConfig::from_args(StrategyConfig::iqr(), Some(2), 8);
        let detector = cfg.to_detector_config();
        assert_eq!(detector.dispatch.batch_size, 8);
        assert_eq!(detector.dispatch.worker_count, Some(2));
        assert_eq!(detector.strategy, StrategyConfig::iqr());
        assert_eq!(cfg.timestamp_format, TimestampFormat::DayFirst);
    }

    #[test]
    fn config_load_reads_yaml() {
        let path = yaml_file(
            "strategy:\n  kind: fixed_threshold\n  lat: 1.0\n  lon: 2.0\n  speed: 3.0\n\
             dispatch:\n  worker_count: 3\n  batch_size: 16\n\
             timestamp_format: year_first\nlimit: 1000\n",
        );
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(
            cfg.strategy,
            StrategyConfig::FixedThreshold(Thresholds {
                lat: 1.0,
                lon: 2.0,
                speed: 3.0
            })
        );
        assert_eq!(cfg.dispatch.worker_count, Some(3));
        assert_eq!(cfg.dispatch.batch_size, 16);
        assert_eq!(cfg.timestamp_format, TimestampFormat::YearFirst);
        assert_eq!(cfg.limit, Some(1000));
        assert!(!cfg.sequential);
    }

    #[test]
    fn config_load_fills_defaults() {
        let path = yaml_file("strategy:\n  kind: iqr\n");
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.strategy, StrategyConfig::iqr());
        assert_eq!(cfg.dispatch, DispatchConfig::default());
    }

    #[test]
    fn config_load_rejects_zero_batch_size() {
        let path = yaml_file("dispatch:\n  batch_size: 0\n");
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
