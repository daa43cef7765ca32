//! Error types for mmfactor-core.

use thiserror::Error;

/// Result type alias for mmfactor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for mmfactor operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Histograms with different binning cannot be combined.
    #[error("binning mismatch: {0}")]
    BinningMismatch(String),

    /// One or more centrality bins saw no trigger particles, so their
    /// histograms cannot be normalized.
    #[error("cannot normalize centrality bin(s) with zero triggers: {}", .bins.join(", "))]
    ZeroTriggers { bins: Vec<String> },

    /// Lifecycle method called out of order.
    #[error("cannot {action} while analysis is {stage}")]
    InvalidStage {
        action: &'static str,
        stage: &'static str,
    },

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration JSON could not be parsed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
