pub struct StatsHelper;

/// Tukey fences derived from the interquartile range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// Values exactly on a fence are not outliers.
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

impl StatsHelper {
    /// Quantile with linear interpolation between the closest ranks.
    ///
    /// `sorted` must be ascending; returns `None` when empty.
    pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
        if sorted.is_empty() {
            return None;
        }
        let q = q.clamp(0.0, 1.0);
        let position = q * (sorted.len() - 1) as f64;
        let lower = position.floor() as usize;
        let upper = position.ceil() as usize;
        let fraction = position - lower as f64;
        Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
    }

    pub fn iqr_bounds(values: &[f64], multiplier: f64) -> Option<IqrBounds> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);
        let q1 = Self::quantile_sorted(&sorted, 0.25)?;
        let q3 = Self::quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(IqrBounds {
            q1,
            q3,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_of_empty_is_none() {
        assert_eq!(StatsHelper::quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn quantile_interpolates_between_ranks() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(StatsHelper::quantile_sorted(&values, 0.25), Some(1.75));
        assert_eq!(StatsHelper::quantile_sorted(&values, 0.75), Some(3.25));
        assert_eq!(StatsHelper::quantile_sorted(&values, 1.0), Some(4.0));
    }

    #[test]
    fn iqr_bounds_use_tukey_fences() {
        let bounds = StatsHelper::iqr_bounds(&[4.0, 1.0, 3.0, 2.0], 1.5).unwrap();
        assert_eq!(bounds.q1, 1.75);
        assert_eq!(bounds.q3, 3.25);
        assert_eq!(bounds.lower, 1.75 - 2.25);
        assert_eq!(bounds.upper, 3.25 + 2.25);
        assert!(bounds.is_outlier(100.0));
        assert!(!bounds.is_outlier(bounds.upper));
    }

    #[test]
    fn constant_values_have_no_outliers() {
        let bounds = StatsHelper::iqr_bounds(&[0.5; 6], 1.5).unwrap();
        assert_eq!(bounds.lower, 0.5);
        assert_eq!(bounds.upper, 0.5);
        assert!(!bounds.is_outlier(0.5));
    }
}
