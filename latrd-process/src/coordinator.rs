//! Frame-level driver of the decode pipeline.
//!
//! [`ProcessCoordinator`] turns each inbound frame into one [`Job`] per
//! valid packet, waits for the worker pool to decode them all, files the
//! results into the [`WrapStore`] and drains whatever is final into the
//! three channel buffers.
//!
//! Reassembly keeps a watermark of the newest wrap generation and buffer
//! index seen. A generation is complete once a newer one is two steps
//! ahead, and buffer `b` of the previous generation is complete once
//! buffer `b` of the current generation has been seen.

use crate::buffer::ChannelBuffer;
use crate::job::Job;
use crate::pool::JobPool;
use crate::stats::ProcessStatistics;
use crate::worker::{JobQueue, WorkerPool};
use crate::wrap::WrapStore;
use crate::Result;
use latrd_core::{Channel, OutputFrame};
use latrd_decode::{DetectorConfig, FrameView};
use log::{debug, error, warn};
use std::sync::Arc;

/// Reassembles decoded packets into time-ordered output frames.
#[derive(Debug)]
pub struct ProcessCoordinator {
    config: Arc<DetectorConfig>,
    pool: JobPool,
    jobs: Arc<JobQueue>,
    results: Arc<JobQueue>,
    workers: WorkerPool,
    store: WrapStore,
    current_wrap: u32,
    current_buffer: u32,
    timestamps: ChannelBuffer<u64>,
    ids: ChannelBuffer<u32>,
    energies: ChannelBuffer<u32>,
    stats: ProcessStatistics,
}

impl ProcessCoordinator {
    /// Validates `config` and starts the worker pool.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or a worker thread
    /// cannot be spawned.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;

        let jobs = Arc::new(JobQueue::new());
        let results = Arc::new(JobQueue::new());
        let workers = WorkerPool::spawn(
            config.processing_threads,
            Arc::clone(&jobs),
            Arc::clone(&results),
        )?;
        let capacity = config.output_frame_capacity;

        Ok(Self {
            pool: JobPool::new(2 * config.num_primary_packets, config.payload_words()),
            jobs,
            results,
            workers,
            store: WrapStore::new(config.number_of_time_slice_buffers),
            current_wrap: 0,
            current_buffer: 0,
            timestamps: ChannelBuffer::new(Channel::EventTimeOffset, capacity),
            ids: ChannelBuffer::new(Channel::EventId, capacity),
            energies: ChannelBuffer::new(Channel::EventEnergy, capacity),
            stats: ProcessStatistics::default(),
            config: Arc::new(config),
        })
    }

    /// Partitions output frame numbering across `processes` cooperating
    /// instances, this one being `rank`.
    ///
    /// Call before the first frame.
    ///
    /// # Errors
    /// Returns a configuration error if `processes` is zero or `rank` is
    /// not below it.
    pub fn configure_process(&mut self, processes: usize, rank: usize) -> Result<()> {
        if processes == 0 || rank >= processes {
            return Err(latrd_core::Error::ConfigError(format!(
                "process rank {rank} invalid for {processes} processes"
            ))
            .into());
        }
        let (processes, rank) = (processes as u64, rank as u64);
        self.timestamps.configure_process(processes, rank);
        self.ids.configure_process(processes, rank);
        self.energies.configure_process(processes, rank);
        debug!("Configured as process {rank} of {processes}");
        Ok(())
    }

    /// Processes one inbound frame and returns the output frames it completed.
    ///
    /// Blocks until every packet of the frame has been decoded. Frames are
    /// returned per drained job as timestamps, ids, energies.
    ///
    /// # Errors
    /// Returns an error if `frame` does not match the configured geometry.
    pub fn process_frame(&mut self, frame: &[u8]) -> Result<Vec<OutputFrame>> {
        let config = Arc::clone(&self.config);
        let view = FrameView::parse(frame, &config)?;
        self.stats.frames_processed += 1;

        if view.is_idle() {
            return Ok(self.finish_acquisition());
        }

        let submitted = self.frame_to_jobs(&view);
        for _ in 0..submitted {
            let Some(job) = self.results.remove() else {
                error!("Results queue closed with jobs outstanding");
                break;
            };
            self.stats.record_job(&job);
            self.file_job(job);
        }

        let ready = self.check_for_data_to_write();
        let frames = self.add_jobs_to_buffer(ready);
        debug!(
            "Frame {}: {submitted} packets, {} output frames, wrap {} buffer {}",
            view.frame_number(),
            frames.len(),
            self.current_wrap,
            self.current_buffer
        );
        Ok(frames)
    }

    /// Submits one job per valid packet and returns how many were submitted.
    fn frame_to_jobs(&mut self, view: &FrameView<'_>) -> usize {
        let header_words = self.config.packet_header_words;
        let mut submitted = 0;

        for slot in 0..view.packet_slots() {
            let Some(packet) = view.packet(slot) else {
                self.stats.dropped_packets += 1;
                continue;
            };
            let header = match packet.header() {
                Ok(header) => header,
                Err(err) => {
                    error!("Packet slot {slot}: unreadable header: {err}");
                    self.stats.invalid_packets += 1;
                    continue;
                }
            };

            let mut words = header.words_to_process(header_words);
            let capacity = packet.payload_capacity();
            if words > capacity {
                warn!(
                    "Packet {} claims {words} words, clamping to {capacity}",
                    header.packet_number
                );
                words = capacity;
            }

            let mut job = self.pool.acquire();
            job.assign(slot, &header);
            if let Err(err) = packet.read_payload(words, &mut job.words) {
                error!("Packet {}: {err}", header.packet_number);
                self.stats.invalid_packets += 1;
                self.pool.release(job);
                continue;
            }
            self.jobs.add(job);
            submitted += 1;
        }

        self.stats.packets_submitted += submitted as u64;
        submitted
    }

    /// Files a decoded job under its wrap generation and buffer index,
    /// advancing the watermark or discarding it as stale.
    fn file_job(&mut self, job: Box<Job>) {
        let wrap = job.time_slice_wrap;
        let buffer = job.time_slice_buffer;
        if buffer as usize >= self.store.buffers_per_wrap() {
            self.reject_job(job);
            return;
        }

        let filed = if let Some(slices) = self.store.get_mut(wrap) {
            if wrap == self.current_wrap && buffer > self.current_buffer {
                self.current_buffer = buffer;
            }
            slices.add_job(job)
        } else if wrap >= self.current_wrap.saturating_sub(1) {
            self.current_wrap = wrap;
            self.current_buffer = buffer;
            self.store.get_or_create(wrap).add_job(job)
        } else {
            error!(
                "Stale packet {} received for wrap {wrap} buffer {buffer} (current wrap {}), dropping",
                job.packet_number, self.current_wrap
            );
            self.stats.stale_packets += 1;
            self.pool.release(job);
            return;
        };

        if let Err(job) = filed {
            self.reject_job(job);
        }
    }

    fn reject_job(&mut self, job: Box<Job>) {
        let err = latrd_core::Error::BufferIndexOutOfRange {
            index: job.time_slice_buffer,
            buffers: self.store.buffers_per_wrap(),
        };
        error!("Packet {}: {err}, dropping", job.packet_number);
        self.stats.invalid_packets += 1;
        self.pool.release(job);
    }

    /// Removes the jobs that can no longer be preceded by a late arrival.
    fn check_for_data_to_write(&mut self) -> Vec<Box<Job>> {
        if self.current_wrap == 0 {
            return Vec::new();
        }
        let previous = self.current_wrap - 1;
        let mut ready = self.store.drain_older_than(previous);
        ready.extend(self.store.drain_buffer(previous, self.current_buffer as usize));
        ready
    }

    /// Removes every job left in the store, oldest first.
    fn purge_remaining_jobs(&mut self) -> Vec<Box<Job>> {
        self.store.drain_all()
    }

    /// Writes each job's events into the channel buffers and recycles it.
    fn add_jobs_to_buffer(&mut self, jobs: Vec<Box<Job>>) -> Vec<OutputFrame> {
        let mut frames = Vec::new();
        for job in jobs {
            frames.extend(self.timestamps.append(&job.events.timestamps));
            frames.extend(self.ids.append(&job.events.ids));
            frames.extend(self.energies.append(&job.events.energies));
            self.pool.release(job);
        }
        self.stats.output_frames += frames.len() as u64;
        frames
    }

    /// Emits the partially filled frame of every channel.
    fn purge_remaining_buffers(&mut self) -> Vec<OutputFrame> {
        let frames: Vec<_> = [
            self.timestamps.retrieve_current_frame(),
            self.ids.retrieve_current_frame(),
            self.energies.retrieve_current_frame(),
        ]
        .into_iter()
        .flatten()
        .collect();
        self.stats.output_frames += frames.len() as u64;
        frames
    }

    fn finish_acquisition(&mut self) -> Vec<OutputFrame> {
        let remaining = self.purge_remaining_jobs();
        let mut frames = self.add_jobs_to_buffer(remaining);
        frames.extend(self.purge_remaining_buffers());

        self.current_wrap = 0;
        self.current_buffer = 0;
        self.timestamps.reset_frame_number();
        self.ids.reset_frame_number();
        self.energies.reset_frame_number();
        self.stats.idle_frames += 1;

        debug!(
            "Idle frame: flushed {} output frames, {} of {} jobs pooled",
            frames.len(),
            self.pool.available(),
            self.pool.allocated()
        );
        frames
    }

    /// Newest wrap generation seen this acquisition.
    #[must_use]
    pub fn current_wrap(&self) -> u32 {
        self.current_wrap
    }

    /// Newest buffer index seen in the current wrap generation.
    #[must_use]
    pub fn current_buffer(&self) -> u32 {
        self.current_buffer
    }

    /// Wrap generations still holding jobs, ascending.
    #[must_use]
    pub fn resident_generations(&self) -> Vec<u32> {
        self.store.generations()
    }

    /// Jobs waiting in the wrap store.
    #[must_use]
    pub fn pending_jobs(&self) -> usize {
        self.store.job_count()
    }

    /// Counters so far.
    #[must_use]
    pub fn statistics(&self) -> ProcessStatistics {
        ProcessStatistics {
            pool_allocated: self.pool.allocated() as u64,
            ..self.stats
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Number of decode threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.size()
    }
}
