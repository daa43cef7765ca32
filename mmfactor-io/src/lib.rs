//! mmfactor-io: Event input and result output for mmfactor.
//!
//! Events are read from memory-mapped JSON Lines files via memmap2;
//! finalized histograms are written as CSV or JSON.
//!

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::{EventFileReader, EventStream};
pub use writer::{OutputFormat, ResultWriter};
