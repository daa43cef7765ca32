//! Azimuthal angle helpers.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Step added to a negative azimuthal difference until it is non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldStep {
    /// Add 2π per step. Result lies in `[0, 2π)` for inputs in `(-2π, 2π)`.
    #[default]
    FullTurn,
    /// Add π/2 per step. Reproduces the historical PHENIX Rivet output.
    QuarterTurn,
}

impl FoldStep {
    /// Step size in radians.
    #[must_use]
    pub fn radians(self) -> f64 {
        match self {
            Self::FullTurn => TAU,
            Self::QuarterTurn => FRAC_PI_2,
        }
    }
}

/// Raw azimuthal difference `associate - trigger`.
#[inline]
#[must_use]
pub fn delta_phi(trigger_phi: f64, associate_phi: f64) -> f64 {
    associate_phi - trigger_phi
}

/// Folds an angle into the non-negative range by repeated addition of `step`.
///
/// Non-negative (and NaN) inputs are returned unchanged. Negative inputs
/// land in `[0, step)`.
#[inline]
#[must_use]
pub fn fold_angle(angle: f64, step: FoldStep) -> f64 {
    let step = step.radians();
    let mut folded = angle;
    if folded < 0.0 {
        // Jump most of the way, then finish with single steps.
        folded += step * ((-folded / step).floor());
        while folded < 0.0 {
            folded += step;
        }
        // Tiny negatives round up to exactly `step`.
        if folded >= step {
            folded = 0.0;
        }
    }
    folded
}
