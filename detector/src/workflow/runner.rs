use crate::workflow::config::WorkflowConfig;
use aiscore::ais::RecordTable;
use aiscore::processing::{CancelToken, DispatchReport, Partitioner, Strategy, WorkDispatcher};
use anyhow::Context;

pub struct WorkflowResult {
    pub rows_loaded: usize,
    pub rows_rejected: usize,
    pub vessels: usize,
    pub report: DispatchReport,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn execute(
        &self,
        table: RecordTable,
        cancel: CancelToken,
    ) -> anyhow::Result<WorkflowResult> {
        let detector_config = self.config.to_detector_config();
        detector_config
            .validate()
            .context("validating detector config")?;

        let rows_loaded = table.len();
        let rows_rejected = table.rejected_rows;
        let tracks = Partitioner::partition(table);
        let vessels = tracks.len();

        let dispatcher = WorkDispatcher::new(
            Strategy::from(detector_config.strategy),
            detector_config.dispatch,
        )
        .with_timestamp_format(self.config.timestamp_format)
        .with_cancel_token(cancel);

        let report = if self.config.sequential {
            dispatcher
                .dispatch_sequential(tracks)
                .context("running sequential detection")?
        } else {
            dispatcher
                .dispatch(tracks)
                .context("dispatching vessel tracks")?
        };

        Ok(WorkflowResult {
            rows_loaded,
            rows_rejected,
            vessels,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_table_from_config, GeneratorConfig};
    use aiscore::prelude::StrategyConfig;

    fn generated() -> RecordTable {
        build_table_from_config(&GeneratorConfig {
            vessels: 24,
            fixes_per_vessel: 40,
            spoof_rate: 0.05,
            seed: 5,
            ..Default::default()
        })
        .unwrap()
    }

    fn flagged_rows(result: &WorkflowResult) -> Vec<(u64, usize)> {
        result
            .report
            .flagged
            .iter()
            .map(|r| (r.vessel_id(), r.delta.fix.row))
            .collect()
    }

    #[test]
    fn runner_executes_workflow() {
        let cfg = WorkflowConfig::from_args(StrategyConfig::default(), Some(2), 4);
        let result = Runner::new(cfg).execute(generated(), CancelToken::new()).unwrap();
        assert_eq!(result.rows_loaded, 24 * 40);
        assert_eq!(result.vessels, 24);
        assert_eq!(result.report.summary.deltas, 24 * 39);
        assert!(!result.report.flagged.is_empty());
        assert!(result.report.failures.is_empty());
    }

    #[test]
    fn sequential_and_parallel_runs_agree() {
        let mut sequential = WorkflowConfig::from_args(StrategyConfig::iqr(), Some(1), 1);
        sequential.sequential = true;
        let parallel = WorkflowConfig::from_args(StrategyConfig::iqr(), Some(4), 3);

        let a = Runner::new(sequential)
            .execute(generated(), CancelToken::new())
            .unwrap();
        let b = Runner::new(parallel)
            .execute(generated(), CancelToken::new())
            .unwrap();
        assert_eq!(flagged_rows(&a), flagged_rows(&b));
        assert_eq!(a.report.summary.workers, 1);
    }

    #[test]
    fn cancelled_run_is_an_error() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let cfg = WorkflowConfig::from_args(StrategyConfig::default(), Some(1), 4);
        assert!(Runner::new(cfg).execute(generated(), cancel).is_err());
    }
}
