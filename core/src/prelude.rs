use crate::ais::{DeltaRecord, FlagResult};
use serde::{Deserialize, Serialize};

/// Fixed thresholds applied to the absolute per-fix deltas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Latitude jump in degrees.
    pub lat: f64,
    /// Longitude jump in degrees.
    pub lon: f64,
    /// Speed-over-ground change in knots.
    pub speed: f64,
}

impl Thresholds {
    /// Coarse preset tuned for obviously impossible jumps.
    pub const fn coarse() -> Self {
        Self {
            lat: 40.0,
            lon: 15.0,
            speed: 80.0,
        }
    }

    /// Sensitive preset that flags any jump above one unit.
    pub const fn sensitive() -> Self {
        Self {
            lat: 1.0,
            lon: 1.0,
            speed: 1.0,
        }
    }

    pub fn validate(&self) -> DetectionResult<()> {
        for (name, value) in [("lat", self.lat), ("lon", self.lon), ("speed", self.speed)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DetectionError::InvalidConfig(format!(
                    "threshold {} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::coarse()
    }
}

pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Selects which classification rule a dispatch applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    FixedThreshold(Thresholds),
    Iqr {
        #[serde(default = "default_iqr_multiplier")]
        multiplier: f64,
    },
}

fn default_iqr_multiplier() -> f64 {
    DEFAULT_IQR_MULTIPLIER
}

impl StrategyConfig {
    pub fn iqr() -> Self {
        StrategyConfig::Iqr {
            multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }

    pub fn validate(&self) -> DetectionResult<()> {
        match self {
            StrategyConfig::FixedThreshold(thresholds) => thresholds.validate(),
            StrategyConfig::Iqr { multiplier } => {
                if multiplier.is_finite() && *multiplier >= 0.0 {
                    Ok(())
                } else {
                    Err(DetectionError::InvalidConfig(format!(
                        "IQR multiplier must be finite and non-negative, got {}",
                        multiplier
                    )))
                }
            }
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::FixedThreshold(Thresholds::default())
    }
}

pub const DEFAULT_BATCH_SIZE: usize = 4;

/// Worker pool sizing and batch granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// `None` uses every available execution unit.
    #[serde(default)]
    pub worker_count: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl DispatchConfig {
    pub fn validate(&self) -> DetectionResult<()> {
        if self.batch_size == 0 {
            return Err(DetectionError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Shared configuration for a detection pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl DetectorConfig {
    pub fn validate(&self) -> DetectionResult<()> {
        self.strategy.validate()?;
        self.dispatch.validate()
    }
}

/// Common error type for detection.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },
    #[error("vessel {vessel_id}: {deltas} deltas, {required} required")]
    InsufficientData {
        vessel_id: u64,
        deltas: usize,
        required: usize,
    },
    #[error("worker failed on vessel {vessel_id}: {reason}")]
    WorkerFailure { vessel_id: u64, reason: String },
    #[error("{requested} workers requested, {available} available")]
    PoolExhaustion { requested: usize, available: usize },
    #[error("worker pool setup failed: {0}")]
    PoolSetup(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("dispatch cancelled after {completed} tracks ({skipped} skipped)")]
    Cancelled { completed: usize, skipped: usize },
}

pub type DetectionResult<T> = Result<T, DetectionError>;

/// Classifies one vessel's deltas into flag results.
///
/// Implementations are shared by every worker of a dispatch, so they must not
/// hold per-track state.
pub trait AnomalyClassifier: Send + Sync {
    /// Returns one result per delta, in the order given.
    fn classify(&self, deltas: Vec<DeltaRecord>) -> DetectionResult<Vec<FlagResult>>;

    /// Minimum number of deltas the rule needs to say anything.
    fn min_deltas(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str;
}
