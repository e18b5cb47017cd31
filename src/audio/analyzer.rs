use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::{BAND_COUNT, BandVector};

/// Band boundaries in Hz; band `i` covers `[edges[i], edges[i + 1])`.
pub const BAND_EDGES_HZ: [f32; BAND_COUNT + 1] =
    [0.0, 60.0, 150.0, 400.0, 1000.0, 2400.0, 15000.0];

const EPS: f32 = 1e-9;

/// Analyzer constants.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    pub sample_rate: u32,
    pub window_ms: f32,
    /// EMA coefficient of the per-band noise floor.
    pub baseline_alpha: f32,
    pub knee: f32,
    pub noise_gate: f32,
    /// Smoothing coefficient when energy rises (`s = a·s + (1 - a)·x`).
    pub attack_alpha: f32,
    /// Smoothing coefficient when energy falls.
    pub release_alpha: f32,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            window_ms: 23.0,
            baseline_alpha: 0.99,
            knee: 0.1,
            noise_gate: 0.02,
            attack_alpha: 0.35,
            release_alpha: 0.1,
        }
    }
}

impl AnalyzerSettings {
    /// FFT window length in samples, rounded up to even and at least 2.
    pub fn window_len(&self) -> usize {
        let n = (self.sample_rate as f32 * self.window_ms / 1000.0) as usize;
        (n + n % 2).max(2)
    }
}

/// Windowed-FFT six-band analyzer with noise-floor tracking and attack/release smoothing.
///
/// State (baseline and smoothed output) persists across [`SixBandAnalyzer::process`] calls.
pub struct SixBandAnalyzer {
    settings: AnalyzerSettings,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    buf: Vec<Complex<f32>>,
    /// Spectrum bin range `[lo, hi)` per band.
    bins: [(usize, usize); BAND_COUNT],
    baseline: [f32; BAND_COUNT],
    smoothed: [f32; BAND_COUNT],
}

impl std::fmt::Debug for SixBandAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SixBandAnalyzer")
            .field("settings", &self.settings)
            .field("window_len", &self.window.len())
            .field("smoothed", &self.smoothed)
            .finish()
    }
}

impl Default for SixBandAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerSettings::default())
    }
}

impl SixBandAnalyzer {
    pub fn new(settings: AnalyzerSettings) -> Self {
        let n = settings.window_len();
        let window = hann(n);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(n);
        let bins = band_bins(n / 2 + 1, settings.sample_rate);
        Self {
            settings,
            window,
            fft,
            buf: vec![Complex::new(0.0, 0.0); n],
            bins,
            baseline: [0.0; BAND_COUNT],
            smoothed: [0.0; BAND_COUNT],
        }
    }

    /// Analyzer at `sample_rate` with the default 23 ms window.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self::new(AnalyzerSettings {
            sample_rate,
            ..AnalyzerSettings::default()
        })
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Last smoothed output.
    pub fn current(&self) -> BandVector {
        BandVector::new(self.smoothed)
    }

    /// Forget the noise floor and smoothing state.
    pub fn reset(&mut self) {
        self.baseline = [0.0; BAND_COUNT];
        self.smoothed = [0.0; BAND_COUNT];
    }

    /// Analyze the newest window of `mono` (left zero-padded when shorter) and advance state.
    pub fn process(&mut self, mono: &[f32]) -> BandVector {
        let n = self.window.len();
        let take = mono.len().min(n);
        let pad = n - take;
        let recent = &mono[mono.len() - take..];
        for (i, slot) in self.buf.iter_mut().enumerate() {
            let s = if i < pad { 0.0 } else { recent[i - pad] };
            let s = if s.is_finite() { s } else { 0.0 };
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buf);

        let s = self.settings;
        for band in 0..BAND_COUNT {
            let (lo, hi) = self.bins[band];
            let energy = if hi > lo {
                self.buf[lo..hi].iter().map(|c| c.norm()).sum::<f32>() / (hi - lo) as f32
            } else {
                0.0
            };

            self.baseline[band] =
                s.baseline_alpha * self.baseline[band] + (1.0 - s.baseline_alpha) * energy;
            let lifted = (energy - self.baseline[band]).max(0.0);
            let mut x = lifted / (lifted + s.knee + EPS);
            if x < s.noise_gate {
                x = 0.0;
            }

            let a = if x > self.smoothed[band] {
                s.attack_alpha
            } else {
                s.release_alpha
            };
            self.smoothed[band] = a * self.smoothed[band] + (1.0 - a) * x;
        }
        BandVector::new(self.smoothed)
    }
}

/// Symmetric Hann window (`0.5 - 0.5·cos(2πi/(n-1))`).
fn hann(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    let denom = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / denom).cos())
        .collect()
}

/// Bin ranges per band over a linear frequency axis from 0 to Nyquist with `bins` points.
fn band_bins(bins: usize, sample_rate: u32) -> [(usize, usize); BAND_COUNT] {
    let nyquist = sample_rate as f32 / 2.0;
    let step = if bins > 1 { nyquist / (bins - 1) as f32 } else { 0.0 };
    let freq = |i: usize| i as f32 * step;
    let mut out = [(0, 0); BAND_COUNT];
    for (band, slot) in out.iter_mut().enumerate() {
        let (lo_hz, hi_hz) = (BAND_EDGES_HZ[band], BAND_EDGES_HZ[band + 1]);
        let lo = (0..bins).find(|&i| freq(i) >= lo_hz).unwrap_or(bins);
        let hi = (lo..bins).find(|&i| freq(i) >= hi_hz).unwrap_or(bins);
        *slot = (lo, hi);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/audio/analyzer.rs"]
mod tests;
