use rayon::prelude::*;

use crate::blur::BlurBackend;
use crate::foundation::math::clamp01;
use crate::grid::{Field2, LuminanceGrid};

/// Contour-swim tuning.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ContourParams {
    /// `[0, 1]`; higher values flatten the edge response and lower the glow threshold.
    pub edge_sensitivity: f32,
    /// Blur amount applied to the edge map (0 = none).
    pub edge_blur: u32,
    pub wave_speed: f32,
    pub amplitude: f32,
    /// Number of animated layers, `1..=5`.
    pub layers: u32,
    pub glow: f32,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            edge_sensitivity: 0.3,
            edge_blur: 0,
            wave_speed: 1.0,
            amplitude: 0.5,
            layers: 3,
            glow: 0.5,
        }
    }
}

impl ContourParams {
    /// Cells whose edge strength exceeds this receive the animated glow.
    pub fn threshold(&self) -> f32 {
        0.1 * (1.0 - 0.5 * self.edge_sensitivity)
    }
}

/// Mean absolute difference to the four neighbours, normalised by the maximum and raised to
/// `1 - 0.5·sensitivity`. Border cells are 0.
pub fn local_edge_strength(grid: &Field2, sensitivity: f32) -> Field2 {
    let (rows, cols) = grid.shape();
    let mut edges = vec![0.0f32; rows * cols];
    if rows >= 3 && cols >= 3 {
        edges
            .par_chunks_mut(cols)
            .enumerate()
            .skip(1)
            .take(rows - 2)
            .for_each(|(r, dst)| {
                let up = grid.row(r - 1);
                let mid = grid.row(r);
                let down = grid.row(r + 1);
                for c in 1..cols - 1 {
                    let v = mid[c];
                    dst[c] = ((v - up[c]).abs()
                        + (v - down[c]).abs()
                        + (v - mid[c - 1]).abs()
                        + (v - mid[c + 1]).abs())
                        / 4.0;
                }
            });
    }

    let max = edges.iter().copied().fold(0.0f32, f32::max);
    let exponent = 1.0 - sensitivity * 0.5;
    let scale = if max > 0.0 { 1.0 / max } else { 1.0 };
    for e in &mut edges {
        *e = (*e * scale).powf(exponent);
    }
    Field2::from_fn(rows, cols, |r, c| edges[r * cols + c])
}

/// Layered sine animation in `[0, 1]`, combined with edge strength into a "fire" term.
fn fire_on_edges(edges: &Field2, t: f64, p: &ContourParams) -> Field2 {
    let layers = p.layers.clamp(1, 5);
    let speed = f64::from(p.wave_speed);
    let amp = f64::from(p.amplitude);
    Field2::from_fn(edges.rows(), edges.cols(), |r, c| {
        let (x, y) = (c as f64, r as f64);
        let mut sum = 0.0f64;
        for i in 0..layers {
            let i = f64::from(i);
            let freq = 2.0 + i;
            let wave = (t * freq * speed + x * (0.1 + 0.05 * i) + y * (0.15 - 0.05 * i)).sin();
            sum += wave / (i + 1.0);
        }
        let anim = clamp01((sum / f64::from(layers) * amp * 0.5 + 0.5) as f32);
        (edges.get(r, c) * anim).powf(0.6)
    })
}

/// Animated glow crawling along the luminance contours of `base`.
pub fn render_contourswim(
    base: &LuminanceGrid,
    t: f64,
    p: &ContourParams,
    blur: BlurBackend,
) -> LuminanceGrid {
    let mut edges = local_edge_strength(base.as_field(), p.edge_sensitivity);
    if p.edge_blur > 0 {
        edges = blur.blur_field(&edges, p.edge_blur.max(1));
    }
    let fire = fire_on_edges(&edges, t, p);
    let threshold = p.threshold();
    let (rows, cols) = base.shape();
    LuminanceGrid::from_fn(rows, cols, |r, c| {
        let v = base.get(r, c);
        if edges.get(r, c) > threshold {
            v + fire.get(r, c) * p.glow
        } else {
            v
        }
    })
}
