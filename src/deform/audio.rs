use crate::grid::LuminanceGrid;

use super::AudioSignal;
use super::waves::{WaveParams, render_waves};

/// Default gain applied to the audio level on wave amplitude.
pub const DEFAULT_AUDIO_GAIN: f32 = 2.5;

/// Wave parameters scaled by an audio level in `[0, 1]`.
pub fn audio_wave_params(p: &WaveParams, level: f32, gain: f32) -> WaveParams {
    let boost = 1.0 + 1.2 * level;
    WaveParams {
        speed_x: p.speed_x * boost,
        speed_y: p.speed_y * boost,
        amplitude: p.amplitude * (1.0 + gain * level),
        ..*p
    }
}

/// Audio-reactive waves: louder input means larger and faster waves.
pub fn render_audio(
    base: &LuminanceGrid,
    t: f64,
    p: &WaveParams,
    signal: &AudioSignal,
    gain: f32,
) -> LuminanceGrid {
    render_waves(base, t, &audio_wave_params(p, signal.level(), gain))
}
