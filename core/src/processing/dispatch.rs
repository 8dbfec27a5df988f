use crate::ais::{DeltaRecord, FlagResult, TimestampFormat, VesselTrack};
use crate::prelude::{AnomalyClassifier, DetectionError, DetectionResult, DispatchConfig};
use crate::processing::aggregate::ResultAggregator;
use crate::processing::delta::{DeltaComputer, TrackDeltas};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::{Metrics, MetricsRecorder};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Shared flag used to abort a running dispatch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Analysis result of one vessel track.
#[derive(Debug, Clone, Default)]
pub struct TrackOutcome {
    pub vessel_id: u64,
    pub fix_count: usize,
    pub delta_count: usize,
    /// Flagged rows only, in chronological order.
    pub flagged: Vec<FlagResult>,
    pub malformed: Vec<DetectionError>,
    pub insufficient: Option<DetectionError>,
}

/// Validates and differences one track, refusing rows of other vessels.
fn compute_deltas(track: VesselTrack, computer: &DeltaComputer) -> DetectionResult<TrackDeltas> {
    let vessel_id = track.vessel_id;
    if let Some(stray) = track.rows.iter().find(|row| row.vessel_id != vessel_id) {
        return Err(DetectionError::WorkerFailure {
            vessel_id,
            reason: format!("row {} belongs to vessel {}", stray.row, stray.vessel_id),
        });
    }
    Ok(computer.compute(track))
}

/// Classifies the deltas of one track. The outcome carries no malformed rows;
/// those are attached by the caller so they survive a failing classifier.
fn classify_deltas<C: AnomalyClassifier + ?Sized>(
    vessel_id: u64,
    fix_count: usize,
    deltas: Vec<DeltaRecord>,
    classifier: &C,
) -> DetectionResult<TrackOutcome> {
    let delta_count = deltas.len();
    let required = classifier.min_deltas();
    let insufficient = (delta_count < required).then_some(DetectionError::InsufficientData {
        vessel_id,
        deltas: delta_count,
        required,
    });

    let results = classifier.classify(deltas)?;
    if results.len() != delta_count {
        return Err(DetectionError::WorkerFailure {
            vessel_id,
            reason: format!(
                "{} returned {} results for {} deltas",
                classifier.name(),
                results.len(),
                delta_count
            ),
        });
    }

    Ok(TrackOutcome {
        vessel_id,
        fix_count,
        delta_count,
        flagged: results.into_iter().filter(|r| r.is_flagged).collect(),
        malformed: Vec::new(),
        insufficient,
    })
}

#[derive(Debug)]
enum TrackResult {
    Done(TrackOutcome),
    /// Malformed rows found before the failure are still reported.
    Failed {
        error: DetectionError,
        malformed: Vec<DetectionError>,
    },
    Skipped,
}

/// Counters describing a finished dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchSummary {
    pub strategy: String,
    pub tracks: usize,
    pub fixes: usize,
    pub deltas: usize,
    pub flagged: usize,
    pub failed: usize,
    pub insufficient: usize,
    pub malformed: usize,
    pub workers: usize,
    pub batch_size: usize,
    pub elapsed_ms: f64,
    /// Counters recorded by the workers of this dispatch only.
    pub metrics: Metrics,
}

/// Aggregated flagged rows plus an account of everything left out.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub flagged: Vec<FlagResult>,
    pub failures: Vec<DetectionError>,
    pub malformed: Vec<DetectionError>,
    pub insufficient: Vec<DetectionError>,
    /// Set when fewer workers were started than requested.
    pub pool_exhaustion: Option<DetectionError>,
    pub summary: DispatchSummary,
}

/// Chooses the pool size, degrading to what the machine offers.
pub fn resolve_worker_count(
    requested: Option<usize>,
    available: usize,
) -> (usize, Option<DetectionError>) {
    let available = available.max(1);
    match requested {
        None => (available, None),
        Some(0) => (1, None),
        Some(n) if n > available => (
            available,
            Some(DetectionError::PoolExhaustion {
                requested: n,
                available,
            }),
        ),
        Some(n) => (n, None),
    }
}

pub fn available_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

fn into_batches(tracks: Vec<VesselTrack>, batch_size: usize) -> Vec<Vec<VesselTrack>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(tracks.len().div_ceil(batch_size));
    let mut tracks = tracks.into_iter().peekable();
    while tracks.peek().is_some() {
        batches.push(tracks.by_ref().take(batch_size).collect());
    }
    batches
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Fans vessel tracks out over a fixed worker pool and merges the results.
pub struct WorkDispatcher<C> {
    classifier: C,
    computer: DeltaComputer,
    config: DispatchConfig,
    cancel: CancelToken,
    logger: LogManager,
}

impl<C: AnomalyClassifier> WorkDispatcher<C> {
    pub fn new(classifier: C, config: DispatchConfig) -> Self {
        Self {
            classifier,
            computer: DeltaComputer::default(),
            config,
            cancel: CancelToken::new(),
            logger: LogManager::new("dispatch"),
        }
    }

    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.computer = DeltaComputer::new(format);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Processes every track on a dedicated pool of `worker_count` threads.
    ///
    /// The pool lives for this call only. Every batch has finished and the pool
    /// is torn down before returning, whether tracks succeeded, failed or were
    /// skipped after cancellation. Metrics start from zero on every call.
    pub fn dispatch(&self, tracks: Vec<VesselTrack>) -> DetectionResult<DispatchReport> {
        self.config.validate()?;
        let started = Instant::now();
        let (workers, pool_exhaustion) =
            resolve_worker_count(self.config.worker_count, available_workers());
        if let Some(note) = &pool_exhaustion {
            self.logger.warn(&format!("degrading pool: {}", note));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("ais-worker-{}", index))
            .build()
            .map_err(|err| DetectionError::PoolSetup(err.to_string()))?;

        let track_count = tracks.len();
        let batches = into_batches(tracks, self.config.batch_size);
        self.logger.detail(&format!(
            "{} tracks in {} batches across {} workers",
            track_count,
            batches.len(),
            workers
        ));

        let metrics = MetricsRecorder::new();
        let results: Vec<Vec<TrackResult>> = pool.install(|| {
            batches
                .into_par_iter()
                .map(|batch| self.run_batch(batch, &metrics))
                .collect()
        });
        drop(pool);

        let mut report =
            self.finish(results.into_iter().flatten(), &metrics, workers, started)?;
        report.pool_exhaustion = pool_exhaustion;
        Ok(report)
    }

    /// Same analysis on the calling thread, one track after another.
    pub fn dispatch_sequential(
        &self,
        tracks: Vec<VesselTrack>,
    ) -> DetectionResult<DispatchReport> {
        self.config.validate()?;
        let started = Instant::now();
        let metrics = MetricsRecorder::new();
        let results = self.run_batch(tracks, &metrics);
        self.finish(results.into_iter(), &metrics, 1, started)
    }

    fn run_batch(&self, batch: Vec<VesselTrack>, metrics: &MetricsRecorder) -> Vec<TrackResult> {
        batch
            .into_iter()
            .map(|track| {
                if self.cancel.is_cancelled() {
                    return TrackResult::Skipped;
                }
                self.run_track(track, metrics)
            })
            .collect()
    }

    fn run_track(&self, track: VesselTrack, metrics: &MetricsRecorder) -> TrackResult {
        let vessel_id = track.vessel_id;
        let fix_count = track.len();
        let mut malformed = Vec::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let computed = compute_deltas(track, &self.computer)?;
            malformed = computed.malformed;
            classify_deltas(vessel_id, fix_count, computed.deltas, &self.classifier)
        }));

        let error = match outcome {
            Ok(Ok(mut outcome)) => {
                outcome.malformed = malformed;
                metrics.record_processed(outcome.flagged.len(), outcome.malformed.len());
                if let Some(note) = &outcome.insufficient {
                    self.logger.detail(&note.to_string());
                }
                return TrackResult::Done(outcome);
            }
            Ok(Err(err @ DetectionError::WorkerFailure { .. })) => err,
            Ok(Err(err)) => DetectionError::WorkerFailure {
                vessel_id,
                reason: err.to_string(),
            },
            Err(payload) => DetectionError::WorkerFailure {
                vessel_id,
                reason: panic_message(payload),
            },
        };

        metrics.record_failed(malformed.len());
        self.logger.warn(&error.to_string());
        TrackResult::Failed { error, malformed }
    }

    fn finish(
        &self,
        results: impl Iterator<Item = TrackResult>,
        metrics: &MetricsRecorder,
        workers: usize,
        started: Instant,
    ) -> DetectionResult<DispatchReport> {
        let mut partials = Vec::new();
        let mut report = DispatchReport::default();
        let mut summary = DispatchSummary {
            strategy: self.classifier.name().to_string(),
            workers,
            batch_size: self.config.batch_size,
            ..Default::default()
        };
        let mut skipped = 0;

        for result in results {
            match result {
                TrackResult::Done(outcome) => {
                    summary.tracks += 1;
                    summary.fixes += outcome.fix_count;
                    summary.deltas += outcome.delta_count;
                    report.malformed.extend(outcome.malformed);
                    report.insufficient.extend(outcome.insufficient);
                    partials.push(outcome.flagged);
                }
                TrackResult::Failed { error, malformed } => {
                    summary.tracks += 1;
                    report.failures.push(error);
                    report.malformed.extend(malformed);
                }
                TrackResult::Skipped => skipped += 1,
            }
        }

        if skipped > 0 {
            self.logger.warn(&format!(
                "cancelled with {} tracks done, {} skipped",
                summary.tracks, skipped
            ));
            return Err(DetectionError::Cancelled {
                completed: summary.tracks,
                skipped,
            });
        }

        report.flagged = ResultAggregator::aggregate(partials);
        summary.flagged = report.flagged.len();
        summary.failed = report.failures.len();
        summary.insufficient = report.insufficient.len();
        summary.malformed = report.malformed.len();
        summary.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        summary.metrics = metrics.snapshot();

        self.logger.record(&format!(
            "{} tracks, {} flagged, {} failed, {} malformed rows ({} workers, batch {}, {:.1} ms)",
            summary.tracks,
            summary.flagged,
            summary.failed,
            summary.malformed,
            summary.workers,
            summary.batch_size,
            summary.elapsed_ms
        ));

        report.summary = summary;
        Ok(report)
    }
}
