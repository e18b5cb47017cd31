//! Edge masks and distance fields of the source image.
//!
//! Two interchangeable backends exist. [`EdgeBackend::Exact`] pairs a 3x3 Sobel operator with an
//! exact Euclidean distance transform; [`EdgeBackend::Approx`] pairs central differences with a
//! two-pass city-block transform. Results are memoised by [`EdgeFieldCache`].

mod cache;
mod distance;
mod outline;

pub use cache::{DEFAULT_EDGE_CACHE_CAPACITY, EdgeFieldCache, EdgeKey};
pub use distance::{euclidean_distance, manhattan_distance};
pub use outline::{compose, draw_outline};

use rayon::prelude::*;

use crate::grid::Field2;

/// Normalised gradient magnitude above which a pixel counts as an edge.
pub const EDGE_THRESHOLD: f32 = 0.2;

/// Edge/distance strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeBackend {
    /// Sobel + exact Euclidean distance.
    #[default]
    Exact,
    /// Central differences + Manhattan distance.
    Approx,
}

impl EdgeBackend {
    pub fn name(self) -> &'static str {
        match self {
            Self::Exact => "sobel+euclidean",
            Self::Approx => "central-diff+manhattan",
        }
    }
}

/// Binary edge mask and per-pixel distance to the nearest edge pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeData {
    /// `1.0` on edge pixels, `0.0` elsewhere.
    pub mask: Field2,
    /// Distance in pixels to the nearest edge pixel.
    pub distance: Field2,
    pub backend: EdgeBackend,
}

impl EdgeData {
    pub fn shape(&self) -> (usize, usize) {
        self.mask.shape()
    }

    /// Number of edge pixels.
    pub fn edge_count(&self) -> usize {
        self.mask.as_slice().iter().filter(|&&v| v > 0.5).count()
    }
}

/// Compute mask and distance field of `gray` (values in `[0, 1]`).
pub fn compute_edge_data(gray: &Field2, backend: EdgeBackend) -> EdgeData {
    let mask = detect_edges(gray, backend);
    let distance = match backend {
        EdgeBackend::Exact => euclidean_distance(&mask),
        EdgeBackend::Approx => manhattan_distance(&mask),
    };
    EdgeData {
        mask,
        distance,
        backend,
    }
}

/// Gradient magnitude normalised by its maximum, thresholded at [`EDGE_THRESHOLD`].
pub fn detect_edges(gray: &Field2, backend: EdgeBackend) -> Field2 {
    let mag = match backend {
        EdgeBackend::Exact => sobel_magnitude(gray),
        EdgeBackend::Approx => central_difference_magnitude(gray),
    };
    let max = mag.max();
    if max <= 0.0 {
        return Field2::new(gray.rows(), gray.cols(), 0.0);
    }
    mag.map(|m| if m / max > EDGE_THRESHOLD { 1.0 } else { 0.0 })
}

/// 3x3 Sobel gradient magnitude; out-of-range neighbours mirror the border pixel.
pub fn sobel_magnitude(gray: &Field2) -> Field2 {
    let (rows, cols) = gray.shape();
    if rows == 0 || cols == 0 {
        return gray.clone();
    }
    let at = |r: isize, c: isize| {
        let r = r.clamp(0, rows as isize - 1) as usize;
        let c = c.clamp(0, cols as isize - 1) as usize;
        gray.get(r, c)
    };
    let mut out = vec![0.0f32; rows * cols];
    out.par_chunks_mut(cols).enumerate().for_each(|(r, dst)| {
        let r = r as isize;
        for (c, o) in dst.iter_mut().enumerate() {
            let c = c as isize;
            let gx = (at(r - 1, c + 1) + 2.0 * at(r, c + 1) + at(r + 1, c + 1))
                - (at(r - 1, c - 1) + 2.0 * at(r, c - 1) + at(r + 1, c - 1));
            let gy = (at(r + 1, c - 1) + 2.0 * at(r + 1, c) + at(r + 1, c + 1))
                - (at(r - 1, c - 1) + 2.0 * at(r - 1, c) + at(r - 1, c + 1));
            *o = gx.hypot(gy);
        }
    });
    Field2::from_fn(rows, cols, |r, c| out[r * cols + c])
}

/// Half central differences; the outermost row/column gets no gradient along its axis.
pub fn central_difference_magnitude(gray: &Field2) -> Field2 {
    let (rows, cols) = gray.shape();
    Field2::from_fn(rows, cols, |r, c| {
        let gx = if c > 0 && c + 1 < cols {
            (gray.get(r, c + 1) - gray.get(r, c - 1)) * 0.5
        } else {
            0.0
        };
        let gy = if r > 0 && r + 1 < rows {
            (gray.get(r + 1, c) - gray.get(r - 1, c)) * 0.5
        } else {
            0.0
        };
        gx.hypot(gy)
    })
}

#[cfg(test)]
#[path = "../../tests/unit/edges/detect.rs"]
mod tests;
