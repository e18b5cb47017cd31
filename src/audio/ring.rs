use std::sync::{Arc, Mutex, PoisonError};

use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Observer as _, RingBuffer as _};

use super::{BandVector, SixBandAnalyzer};

/// Default capture rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Samples handed to the analyzer per preview frame.
const ANALYSIS_READ: usize = 2048;

/// Fixed-capacity mono sample history shared between a capture callback and the renderer.
///
/// Writers overwrite the oldest samples once full. A mutex guards every access, so a reader
/// never observes a half-written block.
pub struct SampleRing {
    inner: Mutex<HeapRb<f32>>,
    capacity: usize,
}

impl std::fmt::Debug for SampleRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleRing")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(HeapRb::new(capacity)),
            capacity,
        }
    }

    /// Two seconds of audio at `sample_rate`.
    pub fn for_sample_rate(sample_rate: u32) -> Self {
        Self::new(sample_rate as usize * 2)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append samples, dropping the oldest ones when the ring is full.
    pub fn write(&self, samples: &[f32]) {
        let samples = if samples.len() > self.capacity {
            &samples[samples.len() - self.capacity..]
        } else {
            samples
        };
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_slice_overwrite(samples);
    }

    /// Up to `n` newest samples, oldest first.
    pub fn latest(&self, n: usize) -> Vec<f32> {
        let rb = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let len = rb.occupied_len();
        let n = n.min(len);
        rb.iter().skip(len - n).copied().collect()
    }

    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Cloneable handle to a shared [`SampleRing`]: capture threads write, the renderer reads.
#[derive(Clone, Debug)]
pub struct AudioFeed {
    ring: Arc<SampleRing>,
    sample_rate: u32,
}

impl Default for AudioFeed {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl AudioFeed {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            ring: Arc::new(SampleRing::for_sample_rate(sample_rate)),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn ring(&self) -> &Arc<SampleRing> {
        &self.ring
    }

    /// Producer side.
    pub fn push(&self, samples: &[f32]) {
        self.ring.write(samples);
    }

    /// Consumer side: `n` newest samples, oldest first.
    pub fn get_latest(&self, n: usize) -> Vec<f32> {
        self.ring.latest(n)
    }

    /// Read the newest block and run it through `analyzer`.
    pub fn analyze(&self, analyzer: &mut SixBandAnalyzer) -> BandVector {
        analyzer.process(&self.get_latest(ANALYSIS_READ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/ring.rs"]
mod tests;
