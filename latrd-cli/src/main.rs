//! latrd command-line interface.
//!
//! Simulates, inspects and replays raw LATRD frame dumps through the
//! reconstruction pipeline.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

mod dump;

use clap::{Parser, Subcommand};
use dump::{FrameDump, Simulation};
use latrd_core::Channel;
use latrd_decode::{DetectorConfig, FrameBuilder, FrameView};
use latrd_process::{ProcessCoordinator, ProcessStatistics};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] latrd_core::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] latrd_decode::Error),

    #[error("Processing error: {0}")]
    Process(#[from] latrd_process::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dump of {size} bytes is not a whole number of {frame_size}-byte frames")]
    TruncatedDump { size: usize, frame_size: usize },
}

/// LATRD event-mode frame reconstruction.
#[derive(Parser)]
#[command(name = "latrd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Detector configuration (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic frame dump ending in an idle frame
    Simulate {
        /// Output dump file
        output: PathBuf,

        /// Number of standard frames
        #[arg(short, long, default_value = "16")]
        frames: usize,

        /// Events per packet
        #[arg(short, long, default_value = "64")]
        events: usize,

        /// Trailing packet slots to mark dropped in every frame
        #[arg(long, default_value = "0")]
        dropped: usize,
    },

    /// Show information about a frame dump
    Info {
        /// Input dump file
        input: PathBuf,
    },

    /// Replay a frame dump through the reconstruction pipeline
    Process {
        /// Input dump file
        input: PathBuf,

        /// Override the number of decode threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Number of cooperating processes
        #[arg(long, default_value = "1")]
        processes: usize,

        /// Rank of this process
        #[arg(long, default_value = "0")]
        rank: usize,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Output frames and values emitted on one channel.
#[derive(Debug, Default, Serialize)]
struct ChannelSummary {
    dataset: &'static str,
    frames: u64,
    values: u64,
}

#[derive(Debug, Serialize)]
struct ProcessSummary {
    input: PathBuf,
    frames: usize,
    elapsed_seconds: f64,
    channels: Vec<ChannelSummary>,
    statistics: ProcessStatistics,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DetectorConfig> {
    match path {
        Some(path) => Ok(DetectorConfig::from_file(path)?),
        None => Ok(DetectorConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate {
            output,
            frames,
            events,
            dropped,
        } => {
            let simulation = Simulation {
                frames,
                events_per_packet: events,
                dropped_slots: dropped,
            };
            let mut writer = BufWriter::new(File::create(&output)?);
            let total = simulation.write(&config, &mut writer)?;

            println!("Wrote {} frames to {}", frames + 1, output.display());
            println!("Events: {}", total);
        }

        Commands::Info { input } => {
            let dump = FrameDump::open(&input, &config)?;

            let mut idle_frames = 0usize;
            let mut valid_packets = 0usize;
            let mut dropped_packets = 0usize;
            let mut frame_numbers: Option<(u64, u64)> = None;
            for bytes in dump.frames() {
                let frame = FrameView::parse(bytes, &config)?;
                let number = frame.frame_number();
                frame_numbers = Some(match frame_numbers {
                    Some((low, high)) => (low.min(number), high.max(number)),
                    None => (number, number),
                });
                if frame.is_idle() {
                    idle_frames += 1;
                    continue;
                }
                let valid = frame.valid_packet_count();
                valid_packets += valid;
                dropped_packets += frame.packet_slots() - valid;
            }

            println!("File: {}", input.display());
            println!(
                "Size: {} bytes ({:.2} MB)",
                dump.size(),
                dump.size() as f64 / 1_000_000.0
            );
            println!("Frame size: {} bytes", dump.frame_size());
            println!("Frames: {} ({} idle)", dump.frame_count(), idle_frames);
            println!("Packets: {} valid, {} dropped", valid_packets, dropped_packets);
            if let Some((low, high)) = frame_numbers {
                println!("Frame numbers: {} - {}", low, high);
            }
        }

        Commands::Process {
            input,
            threads,
            processes,
            rank,
            json,
        } => {
            let config = match threads {
                Some(threads) => config.with_processing_threads(threads),
                None => config,
            };
            let dump = FrameDump::open(&input, &config)?;
            let mut coordinator = ProcessCoordinator::new(config.clone())?;
            coordinator.configure_process(processes, rank)?;

            let mut channels: Vec<ChannelSummary> = Channel::ALL
                .iter()
                .map(|channel| ChannelSummary {
                    dataset: channel.dataset_name(),
                    ..ChannelSummary::default()
                })
                .collect();
            let mut tally = |frames: Vec<latrd_core::OutputFrame>| {
                for frame in frames {
                    if let Some(summary) = channels
                        .iter_mut()
                        .find(|s| s.dataset == frame.dataset_name())
                    {
                        summary.frames += 1;
                        summary.values += frame.len() as u64;
                    }
                }
            };

            let start = Instant::now();
            for bytes in dump.frames() {
                tally(coordinator.process_frame(bytes)?);
            }
            if !dump.ends_idle() {
                log::info!("Dump does not end with an idle frame, flushing");
                let idle = FrameBuilder::idle(&config).build()?;
                tally(coordinator.process_frame(&idle)?);
            }
            let elapsed = start.elapsed();

            let summary = ProcessSummary {
                input,
                frames: dump.frame_count(),
                elapsed_seconds: elapsed.as_secs_f64(),
                channels,
                statistics: coordinator.statistics(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &ProcessSummary) {
    let stats = &summary.statistics;
    println!(
        "Processed {} frames from {} in {:.2}s",
        summary.frames,
        summary.input.display(),
        summary.elapsed_seconds
    );
    println!(
        "Packets: {} submitted, {} dropped, {} stale, {} invalid",
        stats.packets_submitted, stats.dropped_packets, stats.stale_packets, stats.invalid_packets
    );
    println!(
        "Events: {} decoded, {} timestamp mismatches, {} control words",
        stats.events_decoded, stats.timestamp_mismatches, stats.control_words
    );
    if stats.malformed_jobs > 0 {
        println!("Packets not starting with a timestamp: {}", stats.malformed_jobs);
    }
    for channel in &summary.channels {
        println!(
            "{:<18} {:>8} frames {:>12} values",
            channel.dataset, channel.frames, channel.values
        );
    }
    println!("Job pool: {} jobs allocated", stats.pool_allocated);
}
