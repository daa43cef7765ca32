//! Analysis configuration.
//!
//! All thresholds, the centrality bin table and the histogram binning live
//! in [`AnalysisConfig`]. The defaults reproduce the PHENIX gamma-hadron
//! medium-modification analysis at 200 GeV (0-40% centrality). A config is
//! fixed once an analysis is constructed from it.

use crate::angle::FoldStep;
use crate::centrality::{validate_bins, CentralityBin, CentralityMethod};
use crate::histogram::Histo1D;
use crate::selection::{AssociateCut, EtaWindowMode, TriggerCut};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Centrality estimator and bin table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralityConfig {
    /// Estimator used to compute the percentile.
    pub method: CentralityMethod,
    /// Number of warm-up events used for calibration.
    pub sample_size: usize,
    /// Half-open `(low, high]` bins; each gets its own histogram.
    pub bins: Vec<CentralityBin>,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            method: CentralityMethod::ImpactParameter,
            sample_size: 50,
            bins: vec![CentralityBin::new(0.0, 40.0, "d01-x01-y01")],
        }
    }
}

impl CentralityConfig {
    /// Sets the estimator.
    #[must_use]
    pub fn with_method(mut self, method: CentralityMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the calibration sample size.
    #[must_use]
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Replaces the bin table.
    #[must_use]
    pub fn with_bins(mut self, bins: Vec<CentralityBin>) -> Self {
        self.bins = bins;
        self
    }
}

/// Azimuthal-difference histogram binning and folding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaPhiConfig {
    /// Number of histogram bins.
    pub n_bins: usize,
    /// Lower histogram edge (radians).
    pub low: f64,
    /// Upper histogram edge (radians).
    pub high: f64,
    /// Step used to fold negative differences.
    pub fold_step: FoldStep,
}

impl Default for DeltaPhiConfig {
    fn default() -> Self {
        Self {
            n_bins: 36,
            low: 0.0,
            high: TAU,
            fold_step: FoldStep::FullTurn,
        }
    }
}

impl DeltaPhiConfig {
    /// Books an empty histogram with this binning.
    ///
    /// # Errors
    /// Returns an error if the binning is invalid.
    pub fn book(&self) -> Result<Histo1D> {
        Histo1D::new(self.n_bins, self.low, self.high)
    }
}

/// Full analysis configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Centrality estimation and binning.
    pub centrality: CentralityConfig,
    /// Trigger particle cut.
    pub trigger: TriggerCut,
    /// Associate particle cut.
    pub associate: AssociateCut,
    /// Delta-phi histogram settings.
    pub delta_phi: DeltaPhiConfig,
}

impl AnalysisConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the centrality configuration.
    #[must_use]
    pub fn with_centrality(mut self, centrality: CentralityConfig) -> Self {
        self.centrality = centrality;
        self
    }

    /// Sets the trigger cut.
    #[must_use]
    pub fn with_trigger(mut self, trigger: TriggerCut) -> Self {
        self.trigger = trigger;
        self
    }

    /// Sets the associate cut.
    #[must_use]
    pub fn with_associate(mut self, associate: AssociateCut) -> Self {
        self.associate = associate;
        self
    }

    /// Sets the trigger eta window mode.
    #[must_use]
    pub fn with_eta_mode(mut self, mode: EtaWindowMode) -> Self {
        self.trigger.eta.mode = mode;
        self
    }

    /// Sets the delta-phi fold step.
    #[must_use]
    pub fn with_fold_step(mut self, fold_step: FoldStep) -> Self {
        self.delta_phi.fold_step = fold_step;
        self
    }

    /// Sets the delta-phi binning.
    #[must_use]
    pub fn with_delta_phi_binning(mut self, n_bins: usize, low: f64, high: f64) -> Self {
        self.delta_phi.n_bins = n_bins;
        self.delta_phi.low = low;
        self.delta_phi.high = high;
        self
    }

    /// Load configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults. The result is validated.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// configuration is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or the configuration invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks the configuration for consistency.
    ///
    /// # Errors
    /// Returns the first configuration error found.
    pub fn validate(&self) -> Result<()> {
        if self.centrality.sample_size == 0 {
            return Err(Error::ConfigError(
                "centrality calibration sample size must be non-zero".to_string(),
            ));
        }
        validate_bins(&self.centrality.bins)?;
        self.trigger.validate()?;
        self.associate.validate()?;
        self.delta_phi.book()?;
        Ok(())
    }
}
