//! Post-effect compositor: CRT (shake, scanlines, vignette, RGB shift) and glow.
//!
//! Two tiers implement the same effects. [`QualityTier::Exact`] is used for export and for the
//! optional accurate preview; [`QualityTier::Fast`] is cheaper and deliberately weaker. The tiers
//! are not bit-identical, but raising any parameter strengthens the effect under both.

mod crt;
mod glow;

pub use crt::{rgb_shift, scanlines, shake, vignette_exact, vignette_fast};
pub use glow::{add_weighted, bright_pass, glow_exact, glow_fast};

use image::RgbImage;

/// Which implementation of the effects to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QualityTier {
    Fast,
    Exact,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CrtParams {
    pub scanlines: f32,
    pub vignette: f32,
    pub rgb_shift: f32,
    /// Per-frame jitter; offsets reach `±⌊5·shake⌋` px.
    pub shake: f32,
}

impl Default for CrtParams {
    fn default() -> Self {
        Self {
            scanlines: 0.5,
            vignette: 0.7,
            rgb_shift: 0.2,
            shake: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GlowParams {
    pub intensity: f32,
    /// Blur radius in pixels.
    pub radius: u32,
    /// Higher bloom lowers the brightness threshold.
    pub bloom: f32,
}

impl Default for GlowParams {
    fn default() -> Self {
        Self {
            intensity: 0.8,
            radius: 20,
            bloom: 0.6,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PostFxSettings {
    pub crt_enabled: bool,
    pub crt: CrtParams,
    pub glow_enabled: bool,
    pub glow: GlowParams,
    /// Run the exact tier in preview too.
    pub accurate_preview: bool,
}

impl PostFxSettings {
    pub fn is_active(&self) -> bool {
        self.crt_enabled || self.glow_enabled
    }
}

/// Effect settings plus the current shake offset.
#[derive(Clone, Debug)]
pub struct PostFx {
    settings: PostFxSettings,
    offset: (i32, i32),
    rng: fastrand::Rng,
}

impl Default for PostFx {
    fn default() -> Self {
        Self::new(PostFxSettings::default())
    }
}

impl PostFx {
    pub fn new(settings: PostFxSettings) -> Self {
        Self {
            settings,
            offset: (0, 0),
            rng: fastrand::Rng::new(),
        }
    }

    /// Reproducible shake sequence.
    pub fn with_seed(settings: PostFxSettings, seed: u64) -> Self {
        Self {
            settings,
            offset: (0, 0),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn settings(&self) -> &PostFxSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: PostFxSettings) {
        self.settings = settings;
        if !self.shake_enabled() {
            self.offset = (0, 0);
        }
    }

    pub fn shake_offset(&self) -> (i32, i32) {
        self.offset
    }

    fn shake_enabled(&self) -> bool {
        self.settings.crt_enabled && self.settings.crt.shake > 0.0
    }

    /// Draw a new shake offset; zero when shake is off.
    pub fn update_shake(&mut self) {
        let max = (self.settings.crt.shake.max(0.0) * 5.0) as i32;
        self.offset = if self.shake_enabled() && max > 0 {
            (self.rng.i32(-max..=max), self.rng.i32(-max..=max))
        } else {
            (0, 0)
        };
    }

    /// Tier used by [`PostFx::apply_preview`].
    pub fn preview_tier(&self) -> QualityTier {
        if self.settings.accurate_preview {
            QualityTier::Exact
        } else {
            QualityTier::Fast
        }
    }

    /// CRT then glow, each only when enabled.
    pub fn apply(&self, img: &RgbImage, tier: QualityTier) -> RgbImage {
        let s = &self.settings;
        if !s.is_active() {
            return img.clone();
        }
        let mut out = if s.crt_enabled {
            crt::apply_crt(img, &s.crt, self.offset, tier)
        } else {
            img.clone()
        };
        if s.glow_enabled {
            out = match tier {
                QualityTier::Exact => glow_exact(&out, &s.glow),
                QualityTier::Fast => glow_fast(&out, &s.glow),
            };
        }
        out
    }

    pub fn apply_preview(&self, img: &RgbImage) -> RgbImage {
        self.apply(img, self.preview_tier())
    }

    pub fn apply_export(&self, img: &RgbImage) -> RgbImage {
        self.apply(img, QualityTier::Exact)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/postfx/effects.rs"]
mod tests;
