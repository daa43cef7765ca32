//! Run lifecycle: `init`, per-event `analyze`, one-shot `finalize`.

use crate::accumulator::PairAccumulator;
use crate::batch::accumulate_parallel;
use crate::statistics::RunStatistics;
use mmfactor_core::centrality::{
    CentralityBin, CentralityClassifier, CentralityEstimator, Classification, VetoReason,
};
use mmfactor_core::config::AnalysisConfig;
use mmfactor_core::error::{Error, Result};
use mmfactor_core::histogram::Histo1D;
use mmfactor_core::particle::Event;
use mmfactor_core::selection::ParticleSelector;
use serde::Serialize;

/// Lifecycle stage of an analysis run.
///
/// `Uninitialized -> Initialized -> Accumulating -> Finalized`. The last
/// stage is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Constructed, histograms not booked yet.
    Uninitialized,
    /// Histograms booked, no event seen.
    Initialized,
    /// At least one event analyzed.
    Accumulating,
    /// Histograms normalized; no further events accepted.
    Finalized,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Accumulating => "accumulating",
            Self::Finalized => "finalized",
        }
    }
}

/// What happened to a single event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventOutcome {
    /// Rejected by the centrality classifier.
    Vetoed(VetoReason),
    /// Assigned to a centrality bin and accumulated.
    Accepted {
        /// Centrality bin index.
        bin: usize,
        /// Centrality percentile.
        centrality: f64,
        /// Number of trigger particles.
        triggers: usize,
        /// Number of associate particles.
        associates: usize,
        /// Number of pairs filled.
        pairs: usize,
    },
}

/// Final state of one centrality bin.
#[derive(Debug, Clone, Serialize)]
pub struct BinResult {
    /// The centrality bin.
    pub bin: CentralityBin,
    /// Total triggers, the normalization divisor.
    pub triggers: u64,
    /// False if the bin had no triggers and was left unscaled.
    pub normalized: bool,
    /// Delta-phi histogram, per trigger when `normalized`.
    pub histogram: Histo1D,
}

/// Gamma/pi0-hadron azimuthal correlation analysis.
///
/// # Example
///
/// ```no_run
/// use mmfactor_analysis::{AnalysisConfig, MediumModificationAnalysis};
/// # fn events() -> Vec<mmfactor_core::Event> { Vec::new() }
///
/// let mut analysis = MediumModificationAnalysis::new(AnalysisConfig::default())?;
/// analysis.init()?;
/// for event in events() {
///     analysis.analyze(&event)?;
/// }
/// let results = analysis.finalize()?;
/// # Ok::<(), mmfactor_core::Error>(())
/// ```
#[derive(Debug)]
pub struct MediumModificationAnalysis {
    config: AnalysisConfig,
    stage: Stage,
    classifier: CentralityClassifier,
    selector: ParticleSelector,
    accumulator: Option<PairAccumulator>,
    statistics: RunStatistics,
    results: Vec<BinResult>,
}

impl MediumModificationAnalysis {
    /// Creates an analysis using the configured centrality estimator.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let estimator = config
            .centrality
            .method
            .estimator(config.centrality.sample_size);
        Self::with_estimator(config, estimator)
    }

    /// Creates an analysis with a caller-supplied centrality estimator.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_estimator(
        config: AnalysisConfig,
        estimator: Box<dyn CentralityEstimator>,
    ) -> Result<Self> {
        config.validate()?;
        let classifier = CentralityClassifier::new(config.centrality.bins.clone(), estimator);
        let selector = ParticleSelector::new(config.trigger.clone(), config.associate);
        Ok(Self {
            config,
            stage: Stage::Uninitialized,
            classifier,
            selector,
            accumulator: None,
            statistics: RunStatistics::default(),
            results: Vec::new(),
        })
    }

    /// Books one histogram and trigger counter per centrality bin.
    ///
    /// # Errors
    /// Returns an error if called more than once.
    pub fn init(&mut self) -> Result<()> {
        self.require(&[Stage::Uninitialized], "initialize")?;
        self.accumulator = Some(PairAccumulator::new(
            self.config.centrality.bins.len(),
            &self.config.delta_phi,
        )?);
        self.stage = Stage::Initialized;
        log::info!(
            "booked {} centrality bin(s), estimator {}, calibration on {} events",
            self.config.centrality.bins.len(),
            self.classifier.estimator_name(),
            self.config.centrality.sample_size
        );
        Ok(())
    }

    /// Processes one event.
    ///
    /// Vetoed events are reported in the outcome and leave histograms and
    /// counters untouched.
    ///
    /// # Errors
    /// Returns an error if the analysis is not initialized or already
    /// finalized.
    pub fn analyze(&mut self, event: &Event) -> Result<EventOutcome> {
        self.require(&[Stage::Initialized, Stage::Accumulating], "analyze events")?;
        self.stage = Stage::Accumulating;

        let outcome = match self.classifier.classify(event) {
            Classification::Vetoed(reason) => {
                log::debug!("event vetoed: {reason:?}");
                EventOutcome::Vetoed(reason)
            }
            Classification::Assigned { bin, centrality } => {
                let triggers = self.selector.select_triggers(event);
                let associates = self.selector.select_associates(event);
                let accumulator = self.accumulator_mut()?;
                let pairs = accumulator.accumulate(bin, &triggers, &associates);
                EventOutcome::Accepted {
                    bin,
                    centrality,
                    triggers: triggers.len(),
                    associates: associates.len(),
                    pairs,
                }
            }
        };

        self.statistics.record(&outcome);
        Ok(outcome)
    }

    /// Processes a batch of events, pairing in parallel.
    ///
    /// Classification stays sequential because estimator calibration
    /// depends on arrival order. Returns the counters for this batch only.
    ///
    /// # Errors
    /// Returns an error if the analysis is not initialized or already
    /// finalized.
    pub fn analyze_batch(&mut self, events: &[Event]) -> Result<RunStatistics> {
        self.require(&[Stage::Initialized, Stage::Accumulating], "analyze events")?;
        self.stage = Stage::Accumulating;

        let mut batch_stats = RunStatistics::default();
        let mut assigned = Vec::with_capacity(events.len());
        for event in events {
            match self.classifier.classify(event) {
                Classification::Vetoed(reason) => {
                    batch_stats.record(&EventOutcome::Vetoed(reason));
                }
                Classification::Assigned { bin, centrality } => {
                    assigned.push((bin, centrality, event));
                }
            }
        }

        let template = self.accumulator_mut()?.empty_like();
        let (partial, pair_stats) = accumulate_parallel(&self.selector, &template, &assigned)?;
        self.accumulator_mut()?.merge(&partial)?;
        batch_stats.merge(&pair_stats);

        log::debug!(
            "batch of {} events: {} accepted, {} vetoed, {} pairs",
            events.len(),
            batch_stats.accepted,
            batch_stats.vetoed(),
            batch_stats.pairs
        );
        self.statistics.merge(&batch_stats);
        Ok(batch_stats)
    }

    /// Normalizes every bin histogram by its trigger count.
    ///
    /// Always moves the analysis to [`Stage::Finalized`]. Bins without
    /// triggers are left unscaled and reported through
    /// [`Error::ZeroTriggers`]; their results remain available from
    /// [`Self::results`].
    ///
    /// # Errors
    /// Returns an error if called twice, before `init`, or if any bin has no
    /// triggers.
    #[allow(clippy::cast_precision_loss)]
    pub fn finalize(&mut self) -> Result<&[BinResult]> {
        self.require(&[Stage::Initialized, Stage::Accumulating], "finalize")?;
        let accumulator = self
            .accumulator
            .take()
            .ok_or(Error::InvalidStage {
                action: "finalize",
                stage: self.stage.as_str(),
            })?;
        self.stage = Stage::Finalized;

        let mut empty_bins = Vec::new();
        self.results = accumulator
            .into_bins()
            .into_iter()
            .zip(&self.config.centrality.bins)
            .map(|(acc, bin)| {
                let (mut histogram, triggers) = acc.into_parts();
                let normalized = triggers > 0;
                if normalized {
                    histogram.scale_w(1.0 / triggers as f64);
                } else {
                    log::warn!("centrality bin {bin} has no triggers; histogram left unscaled");
                    empty_bins.push(bin.label.clone());
                }
                BinResult {
                    bin: bin.clone(),
                    triggers,
                    normalized,
                    histogram,
                }
            })
            .collect();

        log::info!(
            "finalized after {} events ({} accepted, {} vetoed)",
            self.statistics.events,
            self.statistics.accepted,
            self.statistics.vetoed()
        );

        if empty_bins.is_empty() {
            Ok(&self.results)
        } else {
            Err(Error::ZeroTriggers { bins: empty_bins })
        }
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Event counters so far.
    #[must_use]
    pub fn statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    /// Live per-bin accumulators, available between `init` and `finalize`.
    #[must_use]
    pub fn accumulator(&self) -> Option<&PairAccumulator> {
        self.accumulator.as_ref()
    }

    /// Finalized results; empty before `finalize`.
    #[must_use]
    pub fn results(&self) -> &[BinResult] {
        &self.results
    }

    fn accumulator_mut(&mut self) -> Result<&mut PairAccumulator> {
        let stage = self.stage.as_str();
        self.accumulator.as_mut().ok_or(Error::InvalidStage {
            action: "accumulate",
            stage,
        })
    }

    fn require(&self, allowed: &[Stage], action: &'static str) -> Result<()> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(Error::InvalidStage {
                action,
                stage: self.stage.as_str(),
            })
        }
    }
}
