//! Writers for finalized correlation histograms.

use crate::Result;
use mmfactor_analysis::{BinResult, RunStatistics};
use mmfactor_core::histogram::{Histo1D, ScatterPoint};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One row per histogram bin.
    Csv,
    /// Full report with run statistics and per-bin points.
    Json,
}

impl OutputFormat {
    /// Picks the format from the file extension, defaulting to CSV.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    statistics: &'a RunStatistics,
    bins: Vec<BinReport<'a>>,
}

#[derive(Serialize)]
struct BinReport<'a> {
    label: &'a str,
    centrality_low: f64,
    centrality_high: f64,
    triggers: u64,
    normalized: bool,
    points: Vec<ScatterPoint>,
    histogram: &'a Histo1D,
}

impl<'a> From<&'a BinResult> for BinReport<'a> {
    fn from(result: &'a BinResult) -> Self {
        Self {
            label: &result.bin.label,
            centrality_low: result.bin.low,
            centrality_high: result.bin.high,
            triggers: result.triggers,
            normalized: result.normalized,
            points: result.histogram.to_points(),
            histogram: &result.histogram,
        }
    }
}

/// Writer for analysis results.
pub struct ResultWriter {
    writer: BufWriter<File>,
    format: OutputFormat,
}

impl ResultWriter {
    /// Creates a writer, choosing the format from the extension.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = OutputFormat::from_path(&path);
        Self::with_format(path, format)
    }

    /// Creates a writer with an explicit format.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn with_format<P: AsRef<Path>>(path: P, format: OutputFormat) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            format,
        })
    }

    /// Format used by [`write`](Self::write).
    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Writes results in the writer's format.
    ///
    /// # Errors
    /// Returns an error if writing or serialization fails.
    pub fn write(&mut self, results: &[BinResult], statistics: &RunStatistics) -> Result<()> {
        match self.format {
            OutputFormat::Csv => self.write_csv(results),
            OutputFormat::Json => self.write_json(results, statistics),
        }
    }

    /// Writes one CSV row per histogram bin of every centrality bin.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_csv(&mut self, results: &[BinResult]) -> Result<()> {
        writeln!(self.writer, "label,xlow,xhigh,sumw,sumw2,entries")?;

        for result in results {
            let histogram = &result.histogram;
            for (index, bin) in histogram.bins().iter().enumerate() {
                let (xlow, xhigh) = histogram.bin_edges(index);
                writeln!(
                    self.writer,
                    "{},{},{},{},{},{}",
                    result.bin.label, xlow, xhigh, bin.sumw, bin.sumw2, bin.entries
                )?;
            }
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Writes a JSON report with run statistics and per-bin results.
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails.
    pub fn write_json(&mut self, results: &[BinResult], statistics: &RunStatistics) -> Result<()> {
        let report = Report {
            statistics,
            bins: results.iter().map(BinReport::from).collect(),
        };
        serde_json::to_writer_pretty(&mut self.writer, &report)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
