//! One-dimensional histogram with uniform binning.
//!
//! `Histo1D` accumulates weighted fills into equal-width bins over
//! `[low, high)`, tracking underflow and overflow separately. Per-bin
//! content keeps the sum of weights, the sum of squared weights (for
//! errors) and the raw entry count.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Accumulated content of a single histogram bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BinContent {
    /// Sum of weights.
    pub sumw: f64,
    /// Sum of squared weights.
    pub sumw2: f64,
    /// Number of fills.
    pub entries: u64,
}

impl BinContent {
    #[inline]
    fn fill(&mut self, weight: f64) {
        self.sumw += weight;
        self.sumw2 += weight * weight;
        self.entries += 1;
    }

    #[inline]
    fn scale_w(&mut self, factor: f64) {
        self.sumw *= factor;
        self.sumw2 *= factor * factor;
    }

    #[inline]
    fn merge(&mut self, other: &Self) {
        self.sumw += other.sumw;
        self.sumw2 += other.sumw2;
        self.entries += other.entries;
    }

    /// Statistical error on the sum of weights.
    #[must_use]
    pub fn error(&self) -> f64 {
        self.sumw2.sqrt()
    }
}

/// A point of a scatter representation of a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    /// Bin centre.
    pub x: f64,
    /// Half bin width.
    pub x_err: f64,
    /// Sum of weights divided by bin width.
    pub y: f64,
    /// Error on `y`.
    pub y_err: f64,
}

/// A histogram with `n_bins` equal-width bins over `[low, high)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histo1D {
    low: f64,
    high: f64,
    bins: Vec<BinContent>,
    underflow: BinContent,
    overflow: BinContent,
}

impl Histo1D {
    /// Creates an empty histogram.
    ///
    /// # Errors
    /// Returns an error if `n_bins` is zero or the range is empty or not finite.
    pub fn new(n_bins: usize, low: f64, high: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::ConfigError(
                "histogram needs at least one bin".to_string(),
            ));
        }
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(Error::ConfigError(format!(
                "invalid histogram range [{low}, {high})"
            )));
        }
        Ok(Self {
            low,
            high,
            bins: vec![BinContent::default(); n_bins],
            underflow: BinContent::default(),
            overflow: BinContent::default(),
        })
    }

    /// Number of in-range bins.
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// Lower edge of the first bin.
    #[must_use]
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper edge of the last bin.
    #[must_use]
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Width of each bin.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bin_width(&self) -> f64 {
        (self.high - self.low) / self.bins.len() as f64
    }

    /// Edges `(low, high)` of bin `index`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bin_edges(&self, index: usize) -> (f64, f64) {
        let width = self.bin_width();
        (
            self.low + width * index as f64,
            self.low + width * (index + 1) as f64,
        )
    }

    /// Index of the bin containing `x`, or `None` for out-of-range values.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn bin_index(&self, x: f64) -> Option<usize> {
        if x.is_nan() || x < self.low || x >= self.high {
            return None;
        }
        let index = ((x - self.low) / self.bin_width()) as usize;
        // Rounding can push values just below `high` past the last bin.
        Some(index.min(self.bins.len() - 1))
    }

    /// Fills the histogram at `x` with `weight`.
    ///
    /// NaN values are booked as overflow.
    pub fn fill(&mut self, x: f64, weight: f64) {
        match self.bin_index(x) {
            Some(index) => self.bins[index].fill(weight),
            None if x < self.low => self.underflow.fill(weight),
            None => self.overflow.fill(weight),
        }
    }

    /// Multiplies every bin (including under/overflow) by `factor`.
    pub fn scale_w(&mut self, factor: f64) {
        for bin in &mut self.bins {
            bin.scale_w(factor);
        }
        self.underflow.scale_w(factor);
        self.overflow.scale_w(factor);
    }

    /// Clears all content, keeping the binning.
    pub fn reset(&mut self) {
        self.bins.fill(BinContent::default());
        self.underflow = BinContent::default();
        self.overflow = BinContent::default();
    }

    /// Adds another histogram bin by bin.
    ///
    /// # Errors
    /// Returns an error if the binning differs.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.bins.len() != other.bins.len()
            || self.low.to_bits() != other.low.to_bits()
            || self.high.to_bits() != other.high.to_bits()
        {
            return Err(Error::BinningMismatch(format!(
                "{} bins over [{}, {}) vs {} bins over [{}, {})",
                self.bins.len(),
                self.low,
                self.high,
                other.bins.len(),
                other.low,
                other.high
            )));
        }
        for (bin, theirs) in self.bins.iter_mut().zip(&other.bins) {
            bin.merge(theirs);
        }
        self.underflow.merge(&other.underflow);
        self.overflow.merge(&other.overflow);
        Ok(())
    }

    /// In-range bins.
    #[must_use]
    pub fn bins(&self) -> &[BinContent] {
        &self.bins
    }

    /// Content of the underflow bin.
    #[must_use]
    pub fn underflow(&self) -> &BinContent {
        &self.underflow
    }

    /// Content of the overflow bin.
    #[must_use]
    pub fn overflow(&self) -> &BinContent {
        &self.overflow
    }

    /// Total number of fills, including under/overflow.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.bins.iter().map(|b| b.entries).sum::<u64>()
            + self.underflow.entries
            + self.overflow.entries
    }

    /// Sum of weights over in-range bins.
    #[must_use]
    pub fn sum_w(&self) -> f64 {
        self.bins.iter().map(|b| b.sumw).sum()
    }

    /// Scatter representation: bin centres and densities.
    #[must_use]
    pub fn to_points(&self) -> Vec<ScatterPoint> {
        let width = self.bin_width();
        self.bins
            .iter()
            .enumerate()
            .map(|(index, bin)| {
                let (lo, hi) = self.bin_edges(index);
                ScatterPoint {
                    x: 0.5 * (lo + hi),
                    x_err: 0.5 * width,
                    y: bin.sumw / width,
                    y_err: bin.error() / width,
                }
            })
            .collect()
    }
}
