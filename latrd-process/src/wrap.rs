//! Time-slice reassembly store.
//!
//! Decoded jobs are filed by wrap generation and buffer index so they can
//! be written out in time order even though packets arrive out of order.

use crate::job::Job;
use std::collections::BTreeMap;
use std::mem;

/// The jobs of one wrap generation, bucketed by time-slice buffer.
#[derive(Debug)]
pub struct TimeSliceWrap {
    buffers: Vec<Vec<Box<Job>>>,
}

impl TimeSliceWrap {
    /// Creates an empty generation with `buffers` buckets.
    #[must_use]
    pub fn new(buffers: usize) -> Self {
        Self {
            buffers: (0..buffers).map(|_| Vec::new()).collect(),
        }
    }

    /// Files a job under its time-slice buffer.
    ///
    /// # Errors
    /// Hands the job back if its buffer index is out of range.
    pub fn add_job(&mut self, job: Box<Job>) -> std::result::Result<(), Box<Job>> {
        match self.buffers.get_mut(job.time_slice_buffer as usize) {
            Some(bucket) => {
                bucket.push(job);
                Ok(())
            }
            None => Err(job),
        }
    }

    /// Removes and returns the jobs of one buffer in arrival order.
    pub fn empty_buffer(&mut self, buffer: usize) -> Vec<Box<Job>> {
        self.buffers.get_mut(buffer).map(mem::take).unwrap_or_default()
    }

    /// Removes and returns every job, buffer by buffer in index order.
    pub fn empty_all_buffers(&mut self) -> Vec<Box<Job>> {
        self.buffers.iter_mut().flat_map(mem::take).collect()
    }

    /// Number of buckets.
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of jobs held.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.buffers.iter().map(Vec::len).sum()
    }
}

/// Ordered map from wrap generation to [`TimeSliceWrap`].
#[derive(Debug)]
pub struct WrapStore {
    wraps: BTreeMap<u32, TimeSliceWrap>,
    buffers_per_wrap: usize,
}

impl WrapStore {
    /// Creates an empty store whose generations hold `buffers_per_wrap` buckets.
    #[must_use]
    pub fn new(buffers_per_wrap: usize) -> Self {
        Self {
            wraps: BTreeMap::new(),
            buffers_per_wrap,
        }
    }

    /// Buckets per generation.
    #[must_use]
    pub fn buffers_per_wrap(&self) -> usize {
        self.buffers_per_wrap
    }

    /// Mutable access to a resident generation.
    pub fn get_mut(&mut self, wrap: u32) -> Option<&mut TimeSliceWrap> {
        self.wraps.get_mut(&wrap)
    }

    /// Returns the generation, creating it if absent.
    pub fn get_or_create(&mut self, wrap: u32) -> &mut TimeSliceWrap {
        let buffers = self.buffers_per_wrap;
        self.wraps
            .entry(wrap)
            .or_insert_with(|| TimeSliceWrap::new(buffers))
    }

    /// Returns true if the generation is resident.
    #[must_use]
    pub fn contains(&self, wrap: u32) -> bool {
        self.wraps.contains_key(&wrap)
    }

    /// Removes every generation older than `wrap` and returns its jobs,
    /// oldest generation first.
    pub fn drain_older_than(&mut self, wrap: u32) -> Vec<Box<Job>> {
        let newer = self.wraps.split_off(&wrap);
        let older = mem::replace(&mut self.wraps, newer);
        older
            .into_values()
            .flat_map(|mut slices| slices.empty_all_buffers())
            .collect()
    }

    /// Empties one buffer of a resident generation.
    ///
    /// The generation itself stays resident.
    pub fn drain_buffer(&mut self, wrap: u32, buffer: usize) -> Vec<Box<Job>> {
        self.wraps
            .get_mut(&wrap)
            .map(|slices| slices.empty_buffer(buffer))
            .unwrap_or_default()
    }

    /// Removes every generation and returns all jobs in time order.
    pub fn drain_all(&mut self) -> Vec<Box<Job>> {
        mem::take(&mut self.wraps)
            .into_values()
            .flat_map(|mut slices| slices.empty_all_buffers())
            .collect()
    }

    /// Resident generations in ascending order.
    #[must_use]
    pub fn generations(&self) -> Vec<u32> {
        self.wraps.keys().copied().collect()
    }

    /// Number of resident generations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.wraps.len()
    }

    /// Returns true if no generation is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wraps.is_empty()
    }

    /// Number of jobs held across all generations.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.wraps.values().map(TimeSliceWrap::job_count).sum()
    }
}
