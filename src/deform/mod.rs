//! Deformation engine.
//!
//! Every mode is a pure function of `(base grid, t, parameters, extra signal)` returning a fresh
//! grid clamped to `[0, 1]`. [`Deformer`] is the closed set of strategies; the session selects
//! one whenever the mode or its parameters change and then calls [`Deformer::deform`] per frame.

mod audio;
mod contour;
mod morph;
mod overlay;
mod waves;

pub use audio::{DEFAULT_AUDIO_GAIN, audio_wave_params, render_audio};
pub use contour::{ContourParams, local_edge_strength, render_contourswim};
pub use morph::{morph_mix, render_morph};
pub use overlay::{OverlayParams, apply_audio_overlays, overlay_gain, render_audio_overlays};
pub use waves::{CROSS_TERM_RATE, WaveParams, render_waves};

use image::RgbImage;

use crate::audio::BandVector;
use crate::blur::BlurBackend;
use crate::edges::EdgeData;
use crate::foundation::math::clamp01;
use crate::grid::LuminanceGrid;

/// Animation mode selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationMode {
    #[default]
    Waves,
    Morph,
    Audio,
    AudioAlt,
    #[serde(rename = "contourswim")]
    ContourSwim,
}

impl AnimationMode {
    pub const ALL: [AnimationMode; 5] = [
        Self::Waves,
        Self::Morph,
        Self::Audio,
        Self::AudioAlt,
        Self::ContourSwim,
    ];

    /// Stable lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Waves => "waves",
            Self::Morph => "morph",
            Self::Audio => "audio",
            Self::AudioAlt => "audio_alt",
            Self::ContourSwim => "contourswim",
        }
    }

    /// Whether the mode consumes the audio band vector.
    pub fn uses_audio(self) -> bool {
        matches!(self, Self::Audio | Self::AudioAlt)
    }
}

impl std::str::FromStr for AnimationMode {
    type Err = crate::GlyphwaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| crate::GlyphwaveError::validation(format!("unknown mode '{s}'")))
    }
}

/// Audio input to the audio-reactive modes: a single level or a full band vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AudioSignal {
    Scalar(f32),
    Bands(BandVector),
}

impl Default for AudioSignal {
    fn default() -> Self {
        Self::Scalar(0.0)
    }
}

impl AudioSignal {
    /// Overall level: the scalar as-is, or the clamped band mean.
    pub fn level(&self) -> f32 {
        match self {
            Self::Scalar(v) => *v,
            Self::Bands(b) => clamp01(b.mean()),
        }
    }

    /// Band view; a scalar is spread across all six bands.
    pub fn bands(&self) -> BandVector {
        match self {
            Self::Scalar(v) => BandVector::splat(*v),
            Self::Bands(b) => *b,
        }
    }
}

/// Per-frame extras some modes read. Modes ignore what they do not need.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeformInput<'a> {
    pub morph_target: Option<&'a LuminanceGrid>,
    pub audio: AudioSignal,
    /// Full-resolution color source (audio_alt).
    pub source: Option<&'a RgbImage>,
    /// Edge data of `source` (audio_alt).
    pub edges: Option<&'a EdgeData>,
}

/// All per-mode parameters, from which a [`Deformer`] is selected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeParams {
    pub waves: WaveParams,
    pub audio_gain: f32,
    pub contour: ContourParams,
    pub overlay: OverlayParams,
    pub blur: BlurBackend,
}

impl Default for ModeParams {
    fn default() -> Self {
        Self {
            waves: WaveParams::default(),
            audio_gain: DEFAULT_AUDIO_GAIN,
            contour: ContourParams::default(),
            overlay: OverlayParams::default(),
            blur: BlurBackend::default(),
        }
    }
}

/// A render strategy bound to its parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Deformer {
    Waves(WaveParams),
    Morph(WaveParams),
    Audio { waves: WaveParams, gain: f32 },
    AudioAlt(OverlayParams),
    ContourSwim { params: ContourParams, blur: BlurBackend },
}

impl Deformer {
    /// Bind `mode` to its parameters.
    pub fn select(mode: AnimationMode, p: &ModeParams) -> Self {
        match mode {
            AnimationMode::Waves => Self::Waves(p.waves),
            AnimationMode::Morph => Self::Morph(p.waves),
            AnimationMode::Audio => Self::Audio {
                waves: p.waves,
                gain: p.audio_gain,
            },
            AnimationMode::AudioAlt => Self::AudioAlt(p.overlay),
            AnimationMode::ContourSwim => Self::ContourSwim {
                params: p.contour,
                blur: p.blur,
            },
        }
    }

    pub fn mode(&self) -> AnimationMode {
        match self {
            Self::Waves(_) => AnimationMode::Waves,
            Self::Morph(_) => AnimationMode::Morph,
            Self::Audio { .. } => AnimationMode::Audio,
            Self::AudioAlt(_) => AnimationMode::AudioAlt,
            Self::ContourSwim { .. } => AnimationMode::ContourSwim,
        }
    }

    /// Deform `base` at time `t`.
    pub fn deform(&self, base: &LuminanceGrid, t: f64, input: &DeformInput<'_>) -> LuminanceGrid {
        match self {
            Self::Waves(p) => render_waves(base, t, p),
            Self::Morph(p) => render_morph(base, input.morph_target, t, p),
            Self::Audio { waves, gain } => render_audio(base, t, waves, &input.audio, *gain),
            Self::AudioAlt(p) => render_audio_overlays(
                base,
                input.source,
                input.edges,
                &input.audio.bands(),
                t,
                p,
            ),
            Self::ContourSwim { params, blur } => render_contourswim(base, t, params, *blur),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/deform/modes.rs"]
mod tests;
