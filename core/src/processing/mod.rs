pub mod aggregate;
pub mod classifier;
pub mod delta;
pub mod dispatch;
pub mod partition;

pub use aggregate::ResultAggregator;
pub use classifier::{FixedThresholdClassifier, IqrClassifier, Strategy};
pub use delta::{DeltaComputer, TrackDeltas};
pub use dispatch::{
    available_workers, resolve_worker_count, CancelToken, DispatchReport,
    DispatchSummary, TrackOutcome, WorkDispatcher,
};
pub use partition::Partitioner;
