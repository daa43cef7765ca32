//! Per-bin delta-phi accumulation.

use mmfactor_core::angle::{delta_phi, fold_angle, FoldStep};
use mmfactor_core::config::DeltaPhiConfig;
use mmfactor_core::error::Result;
use mmfactor_core::histogram::Histo1D;
use mmfactor_core::particle::Particle;

/// Histogram and trigger counter owned by one centrality bin.
#[derive(Debug, Clone)]
pub struct BinAccumulator {
    histogram: Histo1D,
    triggers: u64,
}

impl BinAccumulator {
    /// Delta-phi histogram.
    #[must_use]
    pub fn histogram(&self) -> &Histo1D {
        &self.histogram
    }

    /// Total triggers seen in this bin.
    #[must_use]
    pub fn triggers(&self) -> u64 {
        self.triggers
    }

    pub(crate) fn into_parts(self) -> (Histo1D, u64) {
        (self.histogram, self.triggers)
    }
}

/// Pairs triggers with lower-pT associates and fills the folded azimuthal
/// difference into the histogram of the event's centrality bin.
#[derive(Debug, Clone)]
pub struct PairAccumulator {
    bins: Vec<BinAccumulator>,
    fold_step: FoldStep,
}

impl PairAccumulator {
    /// Books one empty accumulator per centrality bin.
    ///
    /// # Errors
    /// Returns an error if the histogram binning is invalid.
    pub fn new(n_centrality_bins: usize, delta_phi: &DeltaPhiConfig) -> Result<Self> {
        let histogram = delta_phi.book()?;
        Ok(Self {
            bins: vec![
                BinAccumulator {
                    histogram,
                    triggers: 0,
                };
                n_centrality_bins
            ],
            fold_step: delta_phi.fold_step,
        })
    }

    /// An accumulator with the same shape and no content.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        let mut empty = self.clone();
        for bin in &mut empty.bins {
            bin.histogram.reset();
            bin.triggers = 0;
        }
        empty
    }

    /// Accumulates one event assigned to centrality bin `bin`.
    ///
    /// Every `(trigger, associate)` pair with `associate.pt < trigger.pt`
    /// contributes one unit-weight fill. The bin's trigger counter grows by
    /// `triggers.len()` whether or not any pair forms. Returns the number of
    /// pairs filled.
    ///
    /// # Panics
    /// Panics if `bin` is not a valid centrality bin index.
    pub fn accumulate(
        &mut self,
        bin: usize,
        triggers: &[Particle],
        associates: &[Particle],
    ) -> usize {
        let fold_step = self.fold_step;
        let acc = &mut self.bins[bin];
        acc.triggers += triggers.len() as u64;

        let mut pairs = 0;
        for trigger in triggers {
            for associate in associates.iter().filter(|a| a.pt < trigger.pt) {
                let dphi = fold_angle(delta_phi(trigger.phi, associate.phi), fold_step);
                acc.histogram.fill(dphi, 1.0);
                pairs += 1;
            }
        }
        pairs
    }

    /// Adds another accumulator's histograms and counters.
    ///
    /// # Errors
    /// Returns an error if the two accumulators have different shapes.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.bins.len() != other.bins.len() || self.fold_step != other.fold_step {
            return Err(mmfactor_core::Error::BinningMismatch(format!(
                "{} centrality bins vs {}",
                self.bins.len(),
                other.bins.len()
            )));
        }
        for (mine, theirs) in self.bins.iter_mut().zip(&other.bins) {
            mine.histogram.merge(&theirs.histogram)?;
            mine.triggers += theirs.triggers;
        }
        Ok(())
    }

    /// Per-bin accumulators.
    #[must_use]
    pub fn bins(&self) -> &[BinAccumulator] {
        &self.bins
    }

    pub(crate) fn into_bins(self) -> Vec<BinAccumulator> {
        self.bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mmfactor_core::particle::pid;
    use std::f64::consts::{FRAC_PI_2, TAU};

    fn trigger(pt: f64, phi: f64) -> Particle {
        Particle::new(pid::PHOTON, pt, 3.5, phi)
    }

    fn associate(pt: f64, phi: f64) -> Particle {
        Particle::new(pid::PI_PLUS, pt, 0.1, phi)
    }

    fn accumulator(fold_step: FoldStep) -> PairAccumulator {
        let config = DeltaPhiConfig {
            fold_step,
            ..DeltaPhiConfig::default()
        };
        PairAccumulator::new(1, &config).unwrap()
    }

    fn filled_bin(acc: &PairAccumulator, x: f64) -> u64 {
        let histogram = acc.bins()[0].histogram();
        let index = histogram.bin_index(x).unwrap();
        histogram.bins()[index].entries
    }

    #[test]
    fn test_single_pair() {
        let mut acc = accumulator(FoldStep::FullTurn);
        let pairs = acc.accumulate(0, &[trigger(6.0, 0.5)], &[associate(2.0, 1.0)]);

        assert_eq!(pairs, 1);
        assert_eq!(acc.bins()[0].triggers(), 1);
        assert_eq!(filled_bin(&acc, 0.5), 1);
        assert_eq!(acc.bins()[0].histogram().entries(), 1);
    }

    #[test]
    fn test_associate_harder_than_trigger() {
        let mut acc = accumulator(FoldStep::FullTurn);
        let pairs = acc.accumulate(0, &[trigger(6.0, 0.5)], &[associate(8.0, 1.0)]);

        assert_eq!(pairs, 0);
        assert_eq!(acc.bins()[0].triggers(), 1);
        assert_eq!(acc.bins()[0].histogram().entries(), 0);
    }

    #[test]
    fn test_equal_pt_excluded() {
        let mut acc = accumulator(FoldStep::FullTurn);
        let pairs = acc.accumulate(0, &[trigger(6.0, 0.5)], &[associate(6.0, 1.0)]);
        assert_eq!(pairs, 0);
    }

    #[test]
    fn test_cross_product() {
        let mut acc = accumulator(FoldStep::FullTurn);
        let triggers = [trigger(8.0, 0.0), trigger(5.0, 1.0)];
        let associates = [associate(6.0, 0.2), associate(3.0, 0.4), associate(2.0, 0.6)];
        let pairs = acc.accumulate(0, &triggers, &associates);

        // 8 GeV pairs with all three, 5 GeV with the two softer ones
        assert_eq!(pairs, 5);
        assert_eq!(acc.bins()[0].triggers(), 2);
    }

    #[test]
    fn test_empty_inputs() {
        let mut acc = accumulator(FoldStep::FullTurn);
        assert_eq!(acc.accumulate(0, &[], &[associate(2.0, 0.0)]), 0);
        assert_eq!(acc.bins()[0].triggers(), 0);

        assert_eq!(acc.accumulate(0, &[trigger(6.0, 0.0)], &[]), 0);
        assert_eq!(acc.bins()[0].triggers(), 1);
    }

    #[test]
    fn test_negative_delta_phi_folding() {
        let mut full = accumulator(FoldStep::FullTurn);
        full.accumulate(0, &[trigger(6.0, 1.0)], &[associate(2.0, 0.5)]);
        assert_eq!(filled_bin(&full, TAU - 0.5), 1);

        let mut quarter = accumulator(FoldStep::QuarterTurn);
        quarter.accumulate(0, &[trigger(6.0, 1.0)], &[associate(2.0, 0.5)]);
        assert_eq!(filled_bin(&quarter, FRAC_PI_2 - 0.5), 1);
    }

    #[test]
    fn test_near_side_rounding_stays_in_range() {
        let mut acc = accumulator(FoldStep::FullTurn);
        // delta-phi of one ulp below zero
        acc.accumulate(0, &[trigger(6.0, 1.000_000_000_000_000_2)], &[associate(2.0, 1.0)]);

        let histogram = acc.bins()[0].histogram();
        assert_eq!(histogram.entries(), 1);
        assert_eq!(histogram.overflow().entries, 0);
        assert_eq!(histogram.bins()[0].entries, 1);
    }

    #[test]
    fn test_merge_and_empty_like() {
        let mut a = accumulator(FoldStep::FullTurn);
        let mut b = a.empty_like();
        a.accumulate(0, &[trigger(6.0, 0.5)], &[associate(2.0, 1.0)]);
        b.accumulate(0, &[trigger(7.0, 0.5)], &[associate(2.0, 2.0)]);
        a.merge(&b).unwrap();

        assert_eq!(a.bins()[0].triggers(), 2);
        assert_relative_eq!(a.bins()[0].histogram().sum_w(), 2.0);

        let empty = a.empty_like();
        assert_eq!(empty.bins()[0].triggers(), 0);
        assert_eq!(empty.bins()[0].histogram().entries(), 0);

        let other_shape = PairAccumulator::new(2, &DeltaPhiConfig::default()).unwrap();
        assert!(a.merge(&other_shape).is_err());
    }
}
