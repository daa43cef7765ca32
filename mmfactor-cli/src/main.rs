//! mmfactor CLI - Command-line interface for correlation analysis.
//!
//! Streams JSON Lines event files through the gamma/pi0-hadron analysis
//! and writes the per-trigger delta-phi distributions.
#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]

use clap::{Parser, Subcommand};

use mmfactor_analysis::{AnalysisConfig, MediumModificationAnalysis, RunStatistics};
use mmfactor_core::particle::Event;
use mmfactor_core::ParticleSelector;
use mmfactor_io::{EventFileReader, EventStream, ResultWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    MmfactorIo(#[from] mmfactor_io::Error),

    #[error("Analysis error: {0}")]
    Core(#[from] mmfactor_core::Error),
}

/// Gamma/pi0-hadron azimuthal correlation analysis.
#[derive(Parser)]
#[command(name = "mmfactor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis over event files
    Run {
        /// Input JSON Lines event file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Output file path (.csv or .json)
        #[arg(short, long)]
        output: PathBuf,

        /// Analysis configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Events per parallel batch; 1 processes events one at a time
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
        batch_size: u64,

        /// Skip malformed event lines instead of aborting
        #[arg(long)]
        skip_invalid: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about an event file
    Info {
        /// Input JSON Lines event file
        input: PathBuf,

        /// Analysis configuration used for the candidate counts
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default configuration as JSON
    DefaultConfig,
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    Ok(match path {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    })
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Feeds one file's events into the analysis, returning the number read.
fn process_stream(
    analysis: &mut MediumModificationAnalysis,
    stream: EventStream,
    batch_size: usize,
) -> Result<u64> {
    let mut count = 0u64;

    if batch_size <= 1 {
        for event in stream {
            analysis.analyze(&event?)?;
            count += 1;
        }
        return Ok(count);
    }

    let mut batch: Vec<Event> = Vec::with_capacity(batch_size.min(1 << 16));
    for event in stream {
        batch.push(event?);
        count += 1;
        if batch.len() == batch_size {
            analysis.analyze_batch(&batch)?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        analysis.analyze_batch(&batch)?;
    }
    Ok(count)
}

fn print_summary(statistics: &RunStatistics) {
    println!("Events: {}", statistics.events);
    println!(
        "Vetoed: {} (calibration {}, out of range {}, no bin {})",
        statistics.vetoed(),
        statistics.vetoed_uncalibrated,
        statistics.vetoed_out_of_range,
        statistics.vetoed_no_bin
    );
    println!("Accepted: {}", statistics.accepted);
    println!("Triggers: {}", statistics.triggers);
    println!("Associates: {}", statistics.associates);
    println!("Pairs: {}", statistics.pairs);
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            config,
            batch_size,
            skip_invalid,
            verbose,
        } => {
            init_logging(verbose);
            let config = load_config(config.as_deref())?;
            let batch_size = usize::try_from(batch_size).unwrap_or(usize::MAX);

            if verbose {
                eprintln!("Processing {} file(s)...", input.len());
                eprintln!("Centrality: {:?}", config.centrality.method);
                eprintln!("Centrality bins: {}", config.centrality.bins.len());
                eprintln!("Batch size: {}", batch_size);
            }

            let start = Instant::now();
            let mut analysis = MediumModificationAnalysis::new(config)?;
            analysis.init()?;

            for path in &input {
                if verbose {
                    eprintln!("Reading: {}", path.display());
                }

                let reader = EventFileReader::open(path)?;
                let mut stream = reader.events();
                if skip_invalid {
                    stream = stream.skip_invalid();
                }
                let file_events = process_stream(&mut analysis, stream, batch_size)?;

                if verbose {
                    eprintln!("  {} events read", file_events);
                }
            }

            let statistics = *analysis.statistics();
            // Bins without triggers are still written (unscaled) before the
            // error is reported.
            let zero_trigger = match analysis.finalize() {
                Ok(_) => None,
                Err(err @ mmfactor_core::Error::ZeroTriggers { .. }) => Some(err),
                Err(err) => return Err(err.into()),
            };

            let mut writer = ResultWriter::create(&output)?;
            if verbose {
                eprintln!("Writing output to: {}", output.display());
            }
            writer.write(analysis.results(), &statistics)?;

            let elapsed = start.elapsed();
            println!(
                "Processed {} files in {:.2}s",
                input.len(),
                elapsed.as_secs_f64()
            );
            print_summary(&statistics);
            for result in analysis.results() {
                println!(
                    "{}: {} triggers{}",
                    result.bin,
                    result.triggers,
                    if result.normalized { "" } else { " (not normalized)" }
                );
            }

            if let Some(err) = zero_trigger {
                return Err(err.into());
            }
        }

        Commands::Info { input, config } => {
            init_logging(false);
            let config = load_config(config.as_deref())?;
            let selector = ParticleSelector::new(config.trigger, config.associate);

            let reader = EventFileReader::open(&input)?;
            let file_size = reader.len();

            println!("File: {}", input.display());
            println!(
                "Size: {} bytes ({:.2} MB)",
                file_size,
                file_size as f64 / 1_000_000.0
            );

            let mut events = 0usize;
            let mut particles = 0usize;
            let mut triggers = 0usize;
            let mut associates = 0usize;
            let mut b_range: Option<(f64, f64)> = None;

            for event in reader.events() {
                let event = event?;
                events += 1;
                particles += event.len();
                triggers += selector.select_triggers(&event).len();
                associates += selector.select_associates(&event).len();

                let b = event.impact_parameter;
                b_range = Some(match b_range {
                    Some((min, max)) => (min.min(b), max.max(b)),
                    None => (b, b),
                });
            }

            println!("Events: {}", events);
            println!("Particles: {}", particles);
            println!("Trigger candidates: {}", triggers);
            println!("Associate candidates: {}", associates);
            if let Some((min, max)) = b_range {
                println!("Impact parameter range: {} - {} fm", min, max);
            }
        }

        Commands::DefaultConfig => {
            println!("{}", AnalysisConfig::default().to_json()?);
        }
    }

    Ok(())
}
