//! Outlier filtering
//!
//! Two robust-statistics strategies with deliberately different effects:
//!
//! - [`RobustZScore`] masks outlying LFP values with the missing-value
//!   sentinel and keeps every record, so the series stays aligned with its
//!   timestamps for plotting.
//! - [`IqrFence`] drops records outside the interquartile fences, changing the
//!   number of records.
//!
//! Both ignore missing values when computing statistics. Amplitudes and
//! timestamps are never altered.

use serde::{Deserialize, Serialize};

use crate::types::HemisphereSeries;

/// Consistency constant making MAD comparable to a normal standard deviation
pub const MAD_SCALE: f64 = 1.4826;

/// Default robust z-score cutoff
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Substitute for a zero MAD
pub const DEFAULT_MAD_EPSILON: f64 = 1e-6;

/// Default interquartile fence multiplier
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// A strategy that removes or masks anomalous values in a series
pub trait OutlierStrategy {
    fn filter<T: Clone>(&self, series: &HemisphereSeries<T>) -> HemisphereSeries<T>;
}

/// Median-absolute-deviation z-score masking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobustZScore {
    pub threshold: f64,
    pub epsilon: f64,
}

impl Default for RobustZScore {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_Z_THRESHOLD,
            epsilon: DEFAULT_MAD_EPSILON,
        }
    }
}

impl OutlierStrategy for RobustZScore {
    fn filter<T: Clone>(&self, series: &HemisphereSeries<T>) -> HemisphereSeries<T> {
        let present = present_values(series);
        let Some(median) = median(&present) else {
            return series.clone();
        };

        let deviations: Vec<f64> = present.iter().map(|v| (v - median).abs()).collect();
        let mut mad = median_of(&deviations);
        if mad == 0.0 {
            mad = self.epsilon;
        }
        let scale = MAD_SCALE * mad;

        let mut masked = 0usize;
        let records = series
            .records
            .iter()
            .map(|record| {
                let mut record = record.clone();
                let z = (record.value - median) / scale;
                // NaN compares false and stays NaN
                if z.abs() >= self.threshold {
                    record.value = f64::NAN;
                    masked += 1;
                }
                record
            })
            .collect();

        log::debug!(
            "{} hemisphere: robust z-score masked {} of {} values (median {:.3}, MAD {:.3})",
            series.hemisphere,
            masked,
            series.len(),
            median,
            mad
        );

        HemisphereSeries::new(series.hemisphere, records)
    }
}

/// Interquartile-range fencing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrFence {
    pub multiplier: f64,
}

impl Default for IqrFence {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }
}

impl IqrFence {
    /// Inclusive `(lower, upper)` fences, or `None` when no value is present
    pub fn bounds<T>(&self, series: &HemisphereSeries<T>) -> Option<(f64, f64)> {
        let mut present = present_values(series);
        if present.is_empty() {
            return None;
        }
        present.sort_by(f64::total_cmp);
        let q1 = quantile_sorted(&present, 0.25);
        let q3 = quantile_sorted(&present, 0.75);
        let iqr = q3 - q1;
        Some((q1 - self.multiplier * iqr, q3 + self.multiplier * iqr))
    }
}

impl OutlierStrategy for IqrFence {
    fn filter<T: Clone>(&self, series: &HemisphereSeries<T>) -> HemisphereSeries<T> {
        let Some((lower, upper)) = self.bounds(series) else {
            return series.clone();
        };

        // Missing values fail the range check and are dropped with the outliers
        let records: Vec<_> = series
            .records
            .iter()
            .filter(|r| r.value >= lower && r.value <= upper)
            .cloned()
            .collect();

        log::debug!(
            "{} hemisphere: IQR fence [{:.3}, {:.3}] removed {} of {} records",
            series.hemisphere,
            lower,
            upper,
            series.len() - records.len(),
            series.len()
        );

        HemisphereSeries::new(series.hemisphere, records)
    }
}

/// Outlier strategy selection, as carried by the filter configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Leave values untouched
    None,
    RobustZScore {
        #[serde(default = "default_z_threshold")]
        threshold: f64,
        #[serde(default = "default_mad_epsilon")]
        epsilon: f64,
    },
    Iqr {
        #[serde(default = "default_iqr_multiplier")]
        multiplier: f64,
    },
}

fn default_z_threshold() -> f64 {
    DEFAULT_Z_THRESHOLD
}

fn default_mad_epsilon() -> f64 {
    DEFAULT_MAD_EPSILON
}

fn default_iqr_multiplier() -> f64 {
    DEFAULT_IQR_MULTIPLIER
}

impl OutlierMethod {
    pub fn robust_z_score() -> Self {
        OutlierMethod::RobustZScore {
            threshold: DEFAULT_Z_THRESHOLD,
            epsilon: DEFAULT_MAD_EPSILON,
        }
    }

    pub fn iqr() -> Self {
        OutlierMethod::Iqr {
            multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutlierMethod::None => "none",
            OutlierMethod::RobustZScore { .. } => "robust_z_score",
            OutlierMethod::Iqr { .. } => "iqr",
        }
    }
}

impl Default for OutlierMethod {
    fn default() -> Self {
        Self::robust_z_score()
    }
}

impl OutlierStrategy for OutlierMethod {
    fn filter<T: Clone>(&self, series: &HemisphereSeries<T>) -> HemisphereSeries<T> {
        match *self {
            OutlierMethod::None => series.clone(),
            OutlierMethod::RobustZScore { threshold, epsilon } => {
                RobustZScore { threshold, epsilon }.filter(series)
            }
            OutlierMethod::Iqr { multiplier } => IqrFence { multiplier }.filter(series),
        }
    }
}

fn present_values<T>(series: &HemisphereSeries<T>) -> Vec<f64> {
    series
        .records
        .iter()
        .map(|r| r.value)
        .filter(|v| !v.is_nan())
        .collect()
}

/// Median of the values; `None` when empty
fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(median_of(values))
    }
}

fn median_of(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, 0.5)
}

/// Quantile with linear interpolation between closest ranks, `h = (n - 1) * q`
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * q;
            let lo = h.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}
