use crate::foundation::math::lerp;
use crate::grid::LuminanceGrid;

use super::waves::{WaveParams, render_waves};

/// Blend factor toward the target at time `t`: `0.5 + 0.5·sin(0.8t)`.
pub fn morph_mix(t: f64) -> f32 {
    (0.5 + 0.5 * (0.8 * t).sin()) as f32
}

/// Oscillating cross-fade between `base` and `target`.
///
/// Without a target, or with a target of a different shape, this is exactly
/// [`render_waves`] on `base`.
pub fn render_morph(
    base: &LuminanceGrid,
    target: Option<&LuminanceGrid>,
    t: f64,
    p: &WaveParams,
) -> LuminanceGrid {
    let Some(target) = target.filter(|g| g.shape() == base.shape()) else {
        return render_waves(base, t, p);
    };
    let f = morph_mix(t);
    let (rows, cols) = base.shape();
    LuminanceGrid::from_fn(rows, cols, |r, c| lerp(base.get(r, c), target.get(r, c), f))
}
