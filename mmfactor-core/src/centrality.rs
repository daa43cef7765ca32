//! Centrality estimation and binning.
//!
//! Centrality is expressed as a percentile in `[0, 100]`, 0 being the most
//! central collisions. Estimators calibrate on the first `sample_size`
//! events of a run and return [`UNCALIBRATED`] until the sample is full.
//! The classifier maps a percentile onto a table of half-open
//! `(low, high]` bins.

use crate::config::CentralityConfig;
use crate::particle::Event;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel returned by estimators during warm-up.
pub const UNCALIBRATED: f64 = -1.0;

/// A half-open centrality percentile range `(low, high]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityBin {
    /// Exclusive lower edge (percent).
    pub low: f64,
    /// Inclusive upper edge (percent).
    pub high: f64,
    /// Output label for the histogram booked in this bin.
    pub label: String,
}

impl CentralityBin {
    /// Creates a new centrality bin.
    pub fn new(low: f64, high: f64, label: impl Into<String>) -> Self {
        Self {
            low,
            high,
            label: label.into(),
        }
    }

    /// Returns true if `low < centrality <= high`.
    #[inline]
    #[must_use]
    pub fn contains(&self, centrality: f64) -> bool {
        centrality > self.low && centrality <= self.high
    }
}

impl fmt::Display for CentralityBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}-{}%]", self.label, self.low, self.high)
    }
}

/// Checks that a bin table is usable: every range lies within `[0, 100]`,
/// is non-empty, and no two ranges overlap.
///
/// # Errors
/// Returns a configuration error describing the first problem found.
pub fn validate_bins(bins: &[CentralityBin]) -> Result<()> {
    if bins.is_empty() {
        return Err(Error::ConfigError(
            "at least one centrality bin is required".to_string(),
        ));
    }

    for bin in bins {
        if !bin.low.is_finite() || !bin.high.is_finite() || bin.low >= bin.high {
            return Err(Error::ConfigError(format!("empty centrality range: {bin}")));
        }
        if bin.low < 0.0 || bin.high > 100.0 {
            return Err(Error::ConfigError(format!(
                "centrality range outside [0, 100]: {bin}"
            )));
        }
    }

    let mut sorted: Vec<&CentralityBin> = bins.iter().collect();
    sorted.sort_by(|a, b| a.low.total_cmp(&b.low));
    for pair in sorted.windows(2) {
        if pair[0].high > pair[1].low {
            return Err(Error::ConfigError(format!(
                "overlapping centrality bins: {} and {}",
                pair[0], pair[1]
            )));
        }
    }

    Ok(())
}

/// Trait for centrality estimators.
///
/// Estimators are stateful: the first events of a run feed the calibration
/// sample, so events must be presented in arrival order.
pub trait CentralityEstimator: Send + Sync + fmt::Debug {
    /// Estimator name.
    fn name(&self) -> &'static str;

    /// Centrality percentile for `event`.
    ///
    /// Returns [`UNCALIBRATED`] during warm-up and NaN if the event lacks a
    /// usable observable.
    fn estimate(&mut self, event: &Event) -> f64;

    /// Returns true once the calibration sample is complete.
    fn is_calibrated(&self) -> bool;
}

/// Available centrality estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentralityMethod {
    /// Percentile of the event impact parameter within the calibration sample.
    #[default]
    ImpactParameter,
    /// Percentile of the charged multiplicity, high multiplicity being central.
    Multiplicity,
}

impl CentralityMethod {
    /// Builds an estimator calibrating on `sample_size` events.
    #[must_use]
    pub fn estimator(self, sample_size: usize) -> Box<dyn CentralityEstimator> {
        match self {
            Self::ImpactParameter => Box::new(ImpactParameterEstimator::new(sample_size)),
            Self::Multiplicity => Box::new(MultiplicityEstimator::new(sample_size)),
        }
    }
}

/// Sorted reference sample used to turn an observable into a percentile.
#[derive(Debug, Clone)]
struct Calibration {
    sample_size: usize,
    samples: Vec<f64>,
}

impl Calibration {
    fn new(sample_size: usize) -> Self {
        Self {
            sample_size,
            samples: Vec::with_capacity(sample_size),
        }
    }

    fn is_complete(&self) -> bool {
        self.samples.len() >= self.sample_size
    }

    /// Non-finite values are not recorded, so they extend the warm-up.
    fn record(&mut self, value: f64) {
        if !value.is_finite() {
            log::debug!("non-finite calibration value {value} skipped");
            return;
        }
        self.samples.push(value);
        if self.is_complete() {
            self.samples.sort_by(f64::total_cmp);
            log::debug!(
                "centrality calibration complete with {} samples",
                self.samples.len()
            );
        }
    }

    /// Percentage of the sample at or below `value`.
    fn percent_at_most(&self, value: f64) -> f64 {
        self.percent(self.samples.partition_point(|&x| x <= value))
    }

    /// Percentage of the sample at or above `value`.
    fn percent_at_least(&self, value: f64) -> f64 {
        self.percent(self.samples.len() - self.samples.partition_point(|&x| x < value))
    }

    /// Events more central than the whole sample rank with the most
    /// central sample, so a finite observable never maps to 0%.
    #[allow(clippy::cast_precision_loss)]
    fn percent(&self, count: usize) -> f64 {
        100.0 * count.max(1) as f64 / self.samples.len() as f64
    }
}

/// Impact-parameter centrality estimator.
///
/// Small impact parameters are central: an event's centrality is the
/// percentage of calibration events with an impact parameter at or below
/// its own.
#[derive(Debug, Clone)]
pub struct ImpactParameterEstimator {
    calibration: Calibration,
}

impl ImpactParameterEstimator {
    /// Creates an estimator calibrating on the first `sample_size` events
    /// with a finite impact parameter.
    #[must_use]
    pub fn new(sample_size: usize) -> Self {
        Self {
            calibration: Calibration::new(sample_size),
        }
    }
}

impl CentralityEstimator for ImpactParameterEstimator {
    fn name(&self) -> &'static str {
        "ImpactParameter"
    }

    fn estimate(&mut self, event: &Event) -> f64 {
        let b = event.impact_parameter;
        if !self.calibration.is_complete() {
            self.calibration.record(b);
            return UNCALIBRATED;
        }
        if !b.is_finite() {
            return f64::NAN;
        }
        self.calibration.percent_at_most(b)
    }

    fn is_calibrated(&self) -> bool {
        self.calibration.is_complete()
    }
}

/// Charged-multiplicity centrality estimator.
#[derive(Debug, Clone)]
pub struct MultiplicityEstimator {
    calibration: Calibration,
}

impl MultiplicityEstimator {
    /// Creates an estimator calibrating on the first `sample_size` events.
    #[must_use]
    pub fn new(sample_size: usize) -> Self {
        Self {
            calibration: Calibration::new(sample_size),
        }
    }
}

impl CentralityEstimator for MultiplicityEstimator {
    fn name(&self) -> &'static str {
        "Multiplicity"
    }

    #[allow(clippy::cast_precision_loss)]
    fn estimate(&mut self, event: &Event) -> f64 {
        let multiplicity = event.charged_multiplicity() as f64;
        if !self.calibration.is_complete() {
            self.calibration.record(multiplicity);
            return UNCALIBRATED;
        }
        self.calibration.percent_at_least(multiplicity)
    }

    fn is_calibrated(&self) -> bool {
        self.calibration.is_complete()
    }
}

/// Why an event was rejected by the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VetoReason {
    /// Event consumed by estimator warm-up.
    Uncalibrated,
    /// Estimated centrality outside `[0, 100]` (or NaN).
    OutOfRange(f64),
    /// Valid centrality that falls in none of the configured bins.
    NoMatchingBin(f64),
}

/// Outcome of classifying one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    /// Event belongs to centrality bin `bin`.
    Assigned { bin: usize, centrality: f64 },
    /// Event must be skipped.
    Vetoed(VetoReason),
}

/// Maps events onto a centrality bin table.
#[derive(Debug)]
pub struct CentralityClassifier {
    bins: Vec<CentralityBin>,
    estimator: Box<dyn CentralityEstimator>,
}

impl CentralityClassifier {
    /// Creates a classifier from a bin table and an estimator.
    #[must_use]
    pub fn new(bins: Vec<CentralityBin>, estimator: Box<dyn CentralityEstimator>) -> Self {
        Self { bins, estimator }
    }

    /// Creates a classifier from configuration.
    #[must_use]
    pub fn from_config(config: &CentralityConfig) -> Self {
        Self::new(
            config.bins.clone(),
            config.method.estimator(config.sample_size),
        )
    }

    /// Name of the underlying estimator.
    #[must_use]
    pub fn estimator_name(&self) -> &'static str {
        self.estimator.name()
    }

    /// Index of the first bin containing `centrality`.
    ///
    /// Values outside `[0, 100]` never match.
    #[must_use]
    pub fn bin_for(&self, centrality: f64) -> Option<usize> {
        if !(0.0..=100.0).contains(&centrality) {
            return None;
        }
        self.bins.iter().position(|bin| bin.contains(centrality))
    }

    /// Classifies an event, advancing estimator calibration if needed.
    pub fn classify(&mut self, event: &Event) -> Classification {
        let was_calibrated = self.estimator.is_calibrated();
        let centrality = self.estimator.estimate(event);

        if !was_calibrated {
            return Classification::Vetoed(VetoReason::Uncalibrated);
        }
        if !(0.0..=100.0).contains(&centrality) {
            return Classification::Vetoed(VetoReason::OutOfRange(centrality));
        }
        match self.bin_for(centrality) {
            Some(bin) => Classification::Assigned { bin, centrality },
            None => Classification::Vetoed(VetoReason::NoMatchingBin(centrality)),
        }
    }
}
