use std::f64::consts::TAU;

use rayon::prelude::*;

use crate::foundation::math::clamp01;
use crate::grid::{Field2, LuminanceGrid};

/// Directional sine-wave parameters shared by the waves, morph and audio modes.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WaveParams {
    pub freq_x: f32,
    pub freq_y: f32,
    pub speed_x: f32,
    pub speed_y: f32,
    pub amplitude: f32,
    pub contrast: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            freq_x: 0.8,
            freq_y: 0.6,
            speed_x: 1.2,
            speed_y: -0.9,
            amplitude: 0.25,
            contrast: 1.0,
        }
    }
}

/// Rate of the diagonal cross-term, in radians per second. Independent of `speed_x/speed_y`.
pub const CROSS_TERM_RATE: f64 = 0.7;

/// Superpose x/y sine waves and a diagonal cross-term over `base`.
///
/// Dark cells (`1 - v` large) follow the x wave more strongly, light cells the y wave.
pub fn render_waves(base: &LuminanceGrid, t: f64, p: &WaveParams) -> LuminanceGrid {
    let (rows, cols) = base.shape();
    if rows == 0 || cols == 0 {
        return base.clone();
    }
    let mut out = vec![0.0f32; rows * cols];

    let inv_cols = 1.0 / cols.max(1) as f64;
    let inv_rows = 1.0 / rows.max(1) as f64;
    let amp = f64::from(p.amplitude);
    let contrast = f64::from(p.contrast);

    out.par_chunks_mut(cols).enumerate().for_each(|(r, dst)| {
        let y = r as f64 * inv_rows;
        let src = base.as_field().row(r);
        let py = TAU * (f64::from(p.freq_y) * y + 0.3) + t * f64::from(p.speed_y);
        let (sin_py, _) = py.sin_cos();
        for (c, (o, &v)) in dst.iter_mut().zip(src).enumerate() {
            let x = c as f64 * inv_cols;
            let v = f64::from(v);
            let a = 1.0 - v;
            let px = TAU * (f64::from(p.freq_x) * x + 0.1) + t * f64::from(p.speed_x);
            let sin_px = px.sin();
            let pxy = TAU * 0.35 * (x + y) + t * CROSS_TERM_RATE;
            let w = sin_px * a
                + sin_py * (1.0 - a * 0.5)
                + 0.6 * pxy.sin() * (0.5 + 0.5 * sin_px * sin_py);
            let mut value = v + amp * w;
            if contrast != 1.0 {
                value = f64::from(clamp01(((value - 0.5) * contrast + 0.5) as f32));
            }
            *o = clamp01(value as f32);
        }
    });

    LuminanceGrid::new(Field2::from_vec(rows, cols, out).unwrap_or_else(|_| base.as_field().clone()))
}
