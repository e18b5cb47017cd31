//! Audio-reactive overlays for the `audio_alt` mode.
//!
//! Unlike the other modes these work on the full-resolution color source: every enabled overlay
//! multiplies a per-pixel gain, the gained image is converted to gray and only then resampled to
//! the character grid.

use image::RgbImage;
use rayon::prelude::*;

use crate::audio::BandVector;
use crate::edges::EdgeData;
use crate::foundation::math::to_u8;
use crate::grid::{CellGeometry, Field2, LuminanceGrid, resize_to_grid, to_grayscale};

const MIN_LEVEL: f32 = 0.01;
const MIN_ECHO_LEVEL: f32 = 0.005;

/// Overlay toggles and their tuning.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayParams {
    pub outline: bool,
    pub rays: bool,
    pub breathing: bool,
    pub sparkles: bool,
    pub echo: bool,
    pub background: bool,
    /// Distance (px) over which rays fade, `5..=200`.
    pub rays_length: f32,
    pub rays_intensity: f32,
    /// Number of echo isolines, `0..=12`.
    pub echo_lines: u32,
    pub echo_spacing: f32,
    pub echo_band: f32,
    pub sparkles_density: f32,
    pub sparkles_gain: f32,
    pub background_intensity: f32,
    pub background_speed: f32,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            outline: true,
            rays: true,
            breathing: true,
            sparkles: false,
            echo: false,
            background: false,
            rays_length: 80.0,
            rays_intensity: 1.0,
            echo_lines: 4,
            echo_spacing: 10.0,
            echo_band: 3.0,
            sparkles_density: 0.3,
            sparkles_gain: 3.0,
            background_intensity: 0.5,
            background_speed: 1.0,
        }
    }
}

/// Per-band mixes driving each overlay.
#[derive(Clone, Copy, Debug)]
struct Levels {
    outline: f32,
    rays: f32,
    breathing: f32,
    sparkles: f32,
    echo: f32,
    background: f32,
}

impl Levels {
    fn from_bands(b: &BandVector) -> Self {
        let b = b.as_array();
        Self {
            outline: 0.6 * b[1] + 0.4 * b[2],
            rays: 0.4 * b[0] + 0.4 * b[1] + 0.2 * b[4],
            breathing: 0.3 * b[0] + 0.7 * b[1],
            sparkles: 0.5 * b[4] + 0.5 * b[5],
            echo: 0.3 * b[2] + 0.7 * b[3],
            background: 0.6 * b[0] + 0.4 * b[1],
        }
    }
}

fn row_seed(t: f64, row: usize) -> u64 {
    t.to_bits() ^ (row as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Per-pixel multiplicative gain for the enabled overlays, shape `(height, width)`.
///
/// Edge-driven overlays are skipped when `edges` is absent or its shape does not match.
/// Sparkle positions are drawn from an RNG seeded by `t`, so a given `(t, bands)` always
/// produces the same gain.
pub fn overlay_gain(
    width: u32,
    height: u32,
    edges: Option<&EdgeData>,
    bands: &BandVector,
    t: f64,
    p: &OverlayParams,
) -> Field2 {
    let (rows, cols) = (height as usize, width as usize);
    let edges = edges.filter(|e| e.shape() == (rows, cols));
    let lv = Levels::from_bands(bands);

    let outline = p.outline && edges.is_some() && lv.outline > MIN_LEVEL;
    let rays = p.rays && edges.is_some() && lv.rays > MIN_LEVEL;
    let breath = if p.breathing && lv.breathing > MIN_LEVEL {
        1.0 + (t * 5.0).sin() as f32 * lv.breathing * 2.0
    } else {
        1.0
    };
    let sparkles = p.sparkles && lv.sparkles > MIN_LEVEL;
    let sparkle_p = p.sparkles_density * (0.2 + 0.8 * lv.sparkles);
    let echo = p.echo
        && edges.is_some()
        && p.echo_spacing > 0.0
        && p.echo_lines > 0
        && lv.echo > MIN_ECHO_LEVEL;
    let background = p.background && p.background_intensity > 0.0 && lv.background > MIN_LEVEL;
    let ray_scale = (p.rays_length * 0.3).max(1.0);

    if rows == 0 || cols == 0 {
        return Field2::new(rows, cols, 1.0);
    }
    let mut gain = vec![1.0f32; rows * cols];
    gain.par_chunks_mut(cols).enumerate().for_each(|(y, dst)| {
        let mut rng = fastrand::Rng::with_seed(row_seed(t, y));
        for (x, g) in dst.iter_mut().enumerate() {
            let on_edge = edges.is_some_and(|e| e.mask.get(y, x) > 0.5);
            let dist = edges.map_or(0.0, |e| e.distance.get(y, x));
            let mut f = breath;
            if outline && on_edge {
                f *= 1.0 + 3.0 * lv.outline;
            }
            if rays {
                f *= 1.0 + p.rays_intensity * lv.rays * (-dist / ray_scale).exp();
            }
            if sparkles {
                let roll = rng.f32();
                let candidate = edges.is_none() || on_edge;
                if candidate && roll < sparkle_p {
                    f *= 1.0 + p.sparkles_gain * lv.sparkles;
                }
            }
            if echo {
                for k in 1..=p.echo_lines {
                    if (dist - k as f32 * p.echo_spacing).abs() <= p.echo_band * 0.5 {
                        f *= 1.0 + 0.5 * lv.echo;
                    }
                }
            }
            if background {
                let wave = (0.02 * x as f64 + 0.02 * y as f64 + t * f64::from(p.background_speed))
                    .sin() as f32;
                f *= 1.0 + p.background_intensity * lv.background * (0.5 + 0.5 * wave);
            }
            *g = f;
        }
    });
    Field2::from_fn(rows, cols, |r, c| gain[r * cols + c])
}

/// Multiply every channel of `source` by the overlay gain, saturating to `u8`.
pub fn apply_audio_overlays(
    source: &RgbImage,
    edges: Option<&EdgeData>,
    bands: &BandVector,
    t: f64,
    p: &OverlayParams,
) -> RgbImage {
    let (w, h) = source.dimensions();
    let gain = overlay_gain(w, h, edges, bands, t, p);
    RgbImage::from_fn(w, h, |x, y| {
        let g = gain.get(y as usize, x as usize);
        let px = source.get_pixel(x, y).0;
        image::Rgb(px.map(|c| to_u8(f32::from(c) * g)))
    })
}

/// Overlays on the color source, then gray conversion and resampling to `base`'s shape.
///
/// Without a source image, or when resampling fails, `base` is returned unchanged.
pub fn render_audio_overlays(
    base: &LuminanceGrid,
    source: Option<&RgbImage>,
    edges: Option<&EdgeData>,
    bands: &BandVector,
    t: f64,
    p: &OverlayParams,
) -> LuminanceGrid {
    let Some(source) = source else {
        return base.clone();
    };
    let lit = apply_audio_overlays(source, edges, bands, t, p);
    let (rows, cols) = base.shape();
    match resize_to_grid(&to_grayscale(&lit), CellGeometry::MIN, Some(cols), Some(rows)) {
        Ok((grid, _, _)) if grid.shape() == base.shape() => grid,
        Ok(_) => base.clone(),
        Err(err) => {
            tracing::warn!(%err, "audio overlay resample failed; keeping base grid");
            base.clone()
        }
    }
}
