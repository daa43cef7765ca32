//! mmfactor-core: Core types for two-particle azimuthal correlation analysis.
//!
//! This crate provides the foundational building blocks: particles and
//! events, kinematic cuts, centrality estimation, 1D histograms and the
//! analysis configuration that ties them together.
//!

pub mod angle;
pub mod centrality;
pub mod config;
pub mod error;
pub mod histogram;
pub mod particle;
pub mod selection;

pub use angle::{delta_phi, fold_angle, FoldStep};
pub use centrality::{
    CentralityBin, CentralityClassifier, CentralityEstimator, CentralityMethod, Classification,
    ImpactParameterEstimator, MultiplicityEstimator, VetoReason, UNCALIBRATED,
};
pub use config::{AnalysisConfig, CentralityConfig, DeltaPhiConfig};
pub use error::{Error, Result};
pub use histogram::{BinContent, Histo1D, ScatterPoint};
pub use particle::{pid, three_charge, Event, Particle};
pub use selection::{
    AssociateCut, EtaWindow, EtaWindowMode, ParticleSelector, PtRange, SpeciesCut, TriggerCut,
};
