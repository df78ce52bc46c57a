//! latrd-process: Concurrent decode and time-slice reassembly.
//!
//! Inbound frames are split into per-packet [`Job`]s, decoded in parallel
//! by a [`WorkerPool`] and reassembled into time order by the
//! [`ProcessCoordinator`], which emits fixed-size frames for the
//! `event_time_offset`, `event_id` and `event_energy` channels.
//!
//! # Example
//!
//! ```no_run
//! use latrd_decode::DetectorConfig;
//! use latrd_process::ProcessCoordinator;
//!
//! let mut coordinator = ProcessCoordinator::new(DetectorConfig::default())?;
//! coordinator.configure_process(1, 0)?;
//! # let raw_frame: Vec<u8> = Vec::new();
//! for frame in coordinator.process_frame(&raw_frame)? {
//!     println!("{} #{}: {} values", frame.channel, frame.frame_number, frame.len());
//! }
//! # Ok::<(), latrd_process::Error>(())
//! ```

mod buffer;
mod coordinator;
mod error;
mod job;
mod pool;
mod queue;
mod stats;
mod worker;
mod wrap;

pub use buffer::{ChannelBuffer, ChannelElement};
pub use coordinator::ProcessCoordinator;
pub use error::{Error, Result};
pub use job::Job;
pub use pool::JobPool;
pub use queue::BlockingQueue;
pub use stats::ProcessStatistics;
pub use worker::{decode_job, JobQueue, WorkerPool};
pub use wrap::{TimeSliceWrap, WrapStore};
