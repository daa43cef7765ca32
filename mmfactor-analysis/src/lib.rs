//! mmfactor-analysis: Trigger/associate azimuthal correlations.
//!
//! This crate drives the per-event pipeline:
//! - **Classification** - centrality percentile and bin lookup
//! - **Selection** - trigger and associate particle lists
//! - **Pairing** - folded delta-phi fills per centrality bin
//! - **Normalization** - per-trigger rescale at the end of the run
//!
#![warn(missing_docs)]

mod accumulator;
mod analysis;
mod batch;
mod statistics;

pub use accumulator::{BinAccumulator, PairAccumulator};
pub use analysis::{BinResult, EventOutcome, MediumModificationAnalysis, Stage};
pub use batch::accumulate_parallel;
pub use statistics::RunStatistics;

// Re-export core configuration types
pub use mmfactor_core::config::{AnalysisConfig, CentralityConfig, DeltaPhiConfig};
