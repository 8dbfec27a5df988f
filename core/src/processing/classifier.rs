use crate::ais::{DeltaRecord, FlagReasons, FlagResult};
use crate::math::stats::{IqrBounds, StatsHelper};
use crate::prelude::{AnomalyClassifier, DetectionResult, StrategyConfig, Thresholds};

/// Flags deltas that exceed fixed per-column limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedThresholdClassifier {
    thresholds: Thresholds,
}

impl FixedThresholdClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    fn reasons(&self, delta: &DeltaRecord) -> FlagReasons {
        FlagReasons {
            lat: delta.lat_delta > self.thresholds.lat,
            lon: delta.lon_delta > self.thresholds.lon,
            speed: delta.speed_delta > self.thresholds.speed,
        }
    }
}

impl AnomalyClassifier for FixedThresholdClassifier {
    fn classify(&self, deltas: Vec<DeltaRecord>) -> DetectionResult<Vec<FlagResult>> {
        Ok(deltas
            .into_iter()
            .map(|delta| {
                let reasons = self.reasons(&delta);
                FlagResult::new(delta, reasons)
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "fixed_threshold"
    }
}

/// Flags deltas outside the Tukey fences of their own track.
///
/// Each column gets its own fences, computed over one vessel's deltas only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrClassifier {
    multiplier: f64,
}

impl IqrClassifier {
    pub const MIN_DELTAS: usize = 2;

    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    fn column_bounds(
        &self,
        deltas: &[DeltaRecord],
        column: fn(&DeltaRecord) -> f64,
    ) -> Option<IqrBounds> {
        let values: Vec<f64> = deltas.iter().map(column).collect();
        StatsHelper::iqr_bounds(&values, self.multiplier)
    }
}

impl AnomalyClassifier for IqrClassifier {
    fn classify(&self, deltas: Vec<DeltaRecord>) -> DetectionResult<Vec<FlagResult>> {
        if deltas.len() < Self::MIN_DELTAS {
            return Ok(deltas
                .into_iter()
                .map(|delta| FlagResult::new(delta, FlagReasons::default()))
                .collect());
        }

        let lat = self.column_bounds(&deltas, |d| d.lat_delta);
        let lon = self.column_bounds(&deltas, |d| d.lon_delta);
        let speed = self.column_bounds(&deltas, |d| d.speed_delta);
        let outlier = |bounds: &Option<IqrBounds>, value: f64| {
            bounds.map_or(false, |b| b.is_outlier(value))
        };

        Ok(deltas
            .into_iter()
            .map(|delta| {
                let reasons = FlagReasons {
                    lat: outlier(&lat, delta.lat_delta),
                    lon: outlier(&lon, delta.lon_delta),
                    speed: outlier(&speed, delta.speed_delta),
                };
                FlagResult::new(delta, reasons)
            })
            .collect())
    }

    fn min_deltas(&self) -> usize {
        Self::MIN_DELTAS
    }

    fn name(&self) -> &'static str {
        "iqr"
    }
}

/// Configured classification rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    FixedThreshold(FixedThresholdClassifier),
    Iqr(IqrClassifier),
}

impl From<StrategyConfig> for Strategy {
    fn from(config: StrategyConfig) -> Self {
        match config {
            StrategyConfig::FixedThreshold(thresholds) => {
                Strategy::FixedThreshold(FixedThresholdClassifier::new(thresholds))
            }
            StrategyConfig::Iqr { multiplier } => Strategy::Iqr(IqrClassifier::new(multiplier)),
        }
    }
}

impl AnomalyClassifier for Strategy {
    fn classify(&self, deltas: Vec<DeltaRecord>) -> DetectionResult<Vec<FlagResult>> {
        match self {
            Strategy::FixedThreshold(inner) => inner.classify(deltas),
            Strategy::Iqr(inner) => inner.classify(deltas),
        }
    }

    fn min_deltas(&self) -> usize {
        match self {
            Strategy::FixedThreshold(inner) => inner.min_deltas(),
            Strategy::Iqr(inner) => inner.min_deltas(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Strategy::FixedThreshold(inner) => inner.name(),
            Strategy::Iqr(inner) => inner.name(),
        }
    }
}
