use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};

/// 24-bit RGB color used throughout the glyph and post-fx stages.
pub type Rgb8 = image::Rgb<u8>;

/// Absolute 0-based frame index in export order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> GlyphwaveResult<Self> {
        if den == 0 {
            return Err(GlyphwaveError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(GlyphwaveError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number frame rate.
    pub fn whole(num: u32) -> GlyphwaveResult<Self> {
        Self::new(num, 1)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Animation time of frame `idx` when the clock runs at `speed` (1.0 = 100%).
    ///
    /// Computed as a single division so whole-number rates land on the nearest double
    /// (`3 / 10 == 0.3`), instead of accumulating `dt`.
    pub fn frame_time(self, idx: FrameIndex, speed: f64) -> f64 {
        (idx.0 as f64 * f64::from(self.den) * speed) / f64::from(self.num)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
