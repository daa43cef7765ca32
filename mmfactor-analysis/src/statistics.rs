//! Run-level bookkeeping.

use crate::analysis::EventOutcome;
use mmfactor_core::centrality::VetoReason;
use serde::Serialize;

/// Counters describing what happened to the events of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    /// Events presented to the analysis.
    pub events: u64,
    /// Events consumed by centrality calibration.
    pub vetoed_uncalibrated: u64,
    /// Events with a centrality outside `[0, 100]`.
    pub vetoed_out_of_range: u64,
    /// Events with a valid centrality outside every configured bin.
    pub vetoed_no_bin: u64,
    /// Events assigned to a centrality bin.
    pub accepted: u64,
    /// Trigger particles in accepted events.
    pub triggers: u64,
    /// Associate particles in accepted events.
    pub associates: u64,
    /// Pairs filled.
    pub pairs: u64,
}

impl RunStatistics {
    /// Records the outcome of one event.
    pub fn record(&mut self, outcome: &EventOutcome) {
        self.events += 1;
        match *outcome {
            EventOutcome::Vetoed(VetoReason::Uncalibrated) => self.vetoed_uncalibrated += 1,
            EventOutcome::Vetoed(VetoReason::OutOfRange(_)) => self.vetoed_out_of_range += 1,
            EventOutcome::Vetoed(VetoReason::NoMatchingBin(_)) => self.vetoed_no_bin += 1,
            EventOutcome::Accepted {
                triggers,
                associates,
                pairs,
                ..
            } => {
                self.accepted += 1;
                self.triggers += triggers as u64;
                self.associates += associates as u64;
                self.pairs += pairs as u64;
            }
        }
    }

    /// Total vetoed events.
    #[must_use]
    pub fn vetoed(&self) -> u64 {
        self.vetoed_uncalibrated + self.vetoed_out_of_range + self.vetoed_no_bin
    }

    /// Adds another set of counters.
    pub fn merge(&mut self, other: &Self) {
        self.events += other.events;
        self.vetoed_uncalibrated += other.vetoed_uncalibrated;
        self.vetoed_out_of_range += other.vetoed_out_of_range;
        self.vetoed_no_bin += other.vetoed_no_bin;
        self.accepted += other.accepted;
        self.triggers += other.triggers;
        self.associates += other.associates;
        self.pairs += other.pairs;
    }
}
