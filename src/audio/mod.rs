//! Audio analysis: raw mono samples in, a smoothed six-band energy vector out.
//!
//! The capture side (an audio callback thread) and the analysis side (the render thread) only
//! meet at [`SampleRing`]; the analyzer itself is plain single-threaded state.

mod analyzer;
#[cfg(feature = "capture")]
mod capture;
mod ring;

pub use analyzer::{AnalyzerSettings, BAND_EDGES_HZ, SixBandAnalyzer};
#[cfg(feature = "capture")]
pub use capture::MicCapture;
pub use ring::{AudioFeed, DEFAULT_SAMPLE_RATE, SampleRing};

use crate::foundation::math::clamp01;

/// Number of analysis bands.
pub const BAND_COUNT: usize = 6;

/// Six band energies in `[0, 1]`, lowest band first (60 Hz … 15 kHz).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BandVector([f32; BAND_COUNT]);

impl BandVector {
    pub const ZERO: BandVector = BandVector([0.0; BAND_COUNT]);

    /// Build from raw values, clamping each into `[0, 1]`.
    pub fn new(values: [f32; BAND_COUNT]) -> Self {
        Self(values.map(clamp01))
    }

    /// Same level in every band.
    pub fn splat(v: f32) -> Self {
        Self::new([v; BAND_COUNT])
    }

    pub fn as_array(&self) -> &[f32; BAND_COUNT] {
        &self.0
    }

    pub fn get(&self, band: usize) -> f32 {
        self.0[band]
    }

    pub fn mean(&self) -> f32 {
        self.0.iter().sum::<f32>() / BAND_COUNT as f32
    }

    /// Index of the most energetic band (lowest index on ties).
    pub fn loudest(&self) -> usize {
        let mut best = 0;
        for (i, &v) in self.0.iter().enumerate() {
            if v > self.0[best] {
                best = i;
            }
        }
        best
    }
}
