//! Decode workers.
//!
//! Each worker pulls [`Job`]s off the shared job queue, decodes the payload
//! words into events and hands the job to the results queue. Workers run
//! until the job queue is closed and drained.

use crate::job::Job;
use crate::queue::BlockingQueue;
use crate::{Error, Result};
use latrd_decode::{CoarseTimestamps, DataWord, WordClass};
use log::{debug, trace, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Queue of boxed jobs shared between the coordinator and the workers.
pub type JobQueue = BlockingQueue<Box<Job>>;

/// Decodes the payload words of `job` in place.
///
/// Extended timestamp words update the coarse pair, other control words are
/// recorded with the event count at which they appeared, and event words
/// are resolved to full timestamps. Events whose fine timestamp matches
/// neither coarse value are counted and dropped.
pub fn decode_job(job: &mut Job) {
    job.clear_results();

    if let Some(&first) = job.words.first() {
        if !DataWord::new(first).is_extended_timestamp() {
            warn!(
                "Packet {} does not start with an extended timestamp: {first:#018x}",
                job.packet_number
            );
            job.malformed_start = true;
        }
    }

    let mut coarse = CoarseTimestamps::new();
    for &raw in &job.words {
        match DataWord::new(raw).classify() {
            WordClass::ExtendedTimestamp { coarse: value } => coarse.observe(value),
            WordClass::Control(word) => {
                let index = u32::try_from(job.events.len()).unwrap_or(u32::MAX);
                job.control_indices.push(index);
                job.control_words.push(word);
            }
            WordClass::Event { fine, id, energy } => match coarse.resolve(fine) {
                Ok(timestamp) => job.events.push(timestamp, id, u32::from(energy)),
                Err(err) => {
                    trace!("Packet {}: {err}", job.packet_number);
                    job.timestamp_mismatches += 1;
                }
            },
        }
    }

    trace!(
        "Packet {} slice {:#x}: {} words, {} events, {} control words, {} mismatches",
        job.packet_number,
        job.time_slice,
        job.words_to_process(),
        job.valid_results(),
        job.valid_control_words(),
        job.timestamp_mismatches
    );
}

/// Fixed set of decode threads.
///
/// Dropping the pool closes the job queue and joins every worker.
#[derive(Debug)]
pub struct WorkerPool {
    jobs: Arc<JobQueue>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `threads` workers reading from `jobs` and writing to `results`.
    ///
    /// # Errors
    /// Returns [`Error::WorkerSpawn`] if a thread cannot be started. Workers
    /// already running are shut down first.
    pub fn spawn(threads: usize, jobs: Arc<JobQueue>, results: Arc<JobQueue>) -> Result<Self> {
        let mut pool = Self {
            jobs,
            handles: Vec::with_capacity(threads),
        };

        for index in 0..threads {
            let jobs = Arc::clone(&pool.jobs);
            let results = Arc::clone(&results);
            let handle = thread::Builder::new()
                .name(format!("latrd-worker-{index}"))
                .spawn(move || run_worker(&jobs, &results))
                .map_err(Error::WorkerSpawn)?;
            pool.handles.push(handle);
        }

        debug!("Started {threads} decode workers");
        Ok(pool)
    }

    /// Number of running workers.
    #[must_use]
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Closes the job queue and waits for every worker to exit.
    pub fn shutdown(&mut self) {
        self.jobs.close();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("Decode worker panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(jobs: &JobQueue, results: &JobQueue) {
    while let Some(mut job) = jobs.remove() {
        decode_job(&mut job);
        results.add(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COARSE: u64 = 0x0000_0001_0020_0000;

    fn job_with(words: &[u64]) -> Job {
        let mut job = Job::with_capacity(words.len());
        job.words.extend_from_slice(words);
        job
    }

    #[test]
    fn test_decode_events_and_control_words() {
        let mut job = job_with(&[
            DataWord::extended_timestamp(COARSE).raw(),
            DataWord::event(7, 0x0020_0010, 100).raw(),
            DataWord::control(latrd_decode::ControlType::Other(0x21), 5).raw(),
            DataWord::event(8, 0x0040_0020, 200).raw(),
        ]);
        decode_job(&mut job);

        assert_eq!(job.valid_results(), 2);
        assert_eq!(job.events.timestamps, vec![0x0000_0001_0020_0010, 0x0000_0001_0040_0020]);
        assert_eq!(job.events.ids, vec![7, 8]);
        assert_eq!(job.events.energies, vec![100, 200]);
        assert_eq!(job.valid_control_words(), 1);
        assert_eq!(job.control_indices, vec![1]);
        assert!(!job.malformed_start);
    }

    #[test]
    fn test_mismatch_drops_event() {
        let mut job = job_with(&[
            DataWord::extended_timestamp(COARSE).raw(),
            DataWord::event(1, 0x0060_0000, 1).raw(),
            DataWord::event(2, 0x0020_0001, 2).raw(),
        ]);
        decode_job(&mut job);

        assert_eq!(job.timestamp_mismatches, 1);
        assert_eq!(job.events.ids, vec![2]);
    }

    #[test]
    fn test_malformed_first_word_still_decodes() {
        let mut job = job_with(&[
            DataWord::event(1, 0x0000_0001, 1).raw(),
            DataWord::extended_timestamp(COARSE).raw(),
            DataWord::event(2, 0x0020_0001, 2).raw(),
        ]);
        decode_job(&mut job);

        assert!(job.malformed_start);
        // With no coarse value yet both codes are zero, so the first event
        // resolves to its fine value.
        assert_eq!(job.events.timestamps, vec![0x0000_0001, 0x0000_0001_0020_0001]);
    }

    #[test]
    fn test_decode_is_repeatable() {
        let mut job = job_with(&[
            DataWord::extended_timestamp(COARSE).raw(),
            DataWord::event(3, 0x0020_0003, 3).raw(),
        ]);
        decode_job(&mut job);
        decode_job(&mut job);
        assert_eq!(job.valid_results(), 1);
    }

    #[test]
    fn test_pool_processes_and_shuts_down() {
        let jobs = Arc::new(JobQueue::new());
        let results = Arc::new(JobQueue::new());
        let mut pool = WorkerPool::spawn(3, Arc::clone(&jobs), Arc::clone(&results)).unwrap();
        assert_eq!(pool.size(), 3);

        for number in 0..10 {
            let mut job = Box::new(job_with(&[
                DataWord::extended_timestamp(COARSE).raw(),
                DataWord::event(number, 0x0020_0000, 1).raw(),
            ]));
            job.packet_number = number;
            jobs.add(job);
        }

        let mut seen: Vec<u32> = (0..10)
            .map(|_| results.remove().unwrap())
            .map(|job| job.events.ids[0])
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        pool.shutdown();
        assert_eq!(pool.size(), 0);
        // Closed and drained: a late consumer returns immediately.
        assert!(jobs.remove().is_none());
    }
}
