//! Separable blur kernels shared by contour-swim edge softening and the glow pass.
//!
//! Two strategies exist for scalar fields: a true Gaussian (truncated at 4 sigma) and a box
//! blur whose window shrinks at the borders. RGB images get a q16 fixed-point Gaussian for the
//! exact post-fx tier and a prefix-sum box blur for the fast tier.

use image::RgbImage;
use rayon::prelude::*;

use crate::grid::Field2;

/// Scalar-field blur strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurBackend {
    /// Separable Gaussian with `sigma = amount`.
    #[default]
    Gaussian,
    /// Box mean of radius `amount` (cheaper, blockier).
    Box,
}

impl BlurBackend {
    /// Blur `src` by `amount` (sigma for Gaussian, radius for box). `0` returns a copy.
    pub fn blur_field(self, src: &Field2, amount: u32) -> Field2 {
        if amount == 0 {
            return src.clone();
        }
        match self {
            Self::Gaussian => gaussian_blur_field(src, amount as f32),
            Self::Box => box_blur_field(src, amount as usize),
        }
    }
}

fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (4.0 * sigma + 0.5) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut k: Vec<f32> = (-radius..=radius)
        .map(|i| (-(i * i) as f32 / denom).exp())
        .collect();
    let sum: f32 = k.iter().sum();
    for w in &mut k {
        *w /= sum;
    }
    k
}

/// Separable Gaussian over a scalar field with clamped borders.
pub fn gaussian_blur_field(src: &Field2, sigma: f32) -> Field2 {
    let (rows, cols) = src.shape();
    if rows == 0 || cols == 0 || !(sigma.is_finite() && sigma > 0.0) {
        return src.clone();
    }
    let k = gaussian_kernel(sigma);
    let radius = (k.len() / 2) as isize;

    let mut tmp = vec![0.0f32; rows * cols];
    tmp.par_chunks_mut(cols).enumerate().for_each(|(r, dst)| {
        let row = src.row(r);
        for (x, out) in dst.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius).clamp(0, cols as isize - 1);
                acc += kw * row[sx as usize];
            }
            *out = acc;
        }
    });

    let mut out = vec![0.0f32; rows * cols];
    out.par_chunks_mut(cols).enumerate().for_each(|(y, dst)| {
        for (ki, &kw) in k.iter().enumerate() {
            let sy = (y as isize + ki as isize - radius).clamp(0, rows as isize - 1) as usize;
            let src_row = &tmp[sy * cols..(sy + 1) * cols];
            for (d, &s) in dst.iter_mut().zip(src_row) {
                *d += kw * s;
            }
        }
    });

    Field2::from_fn(rows, cols, |r, c| out[r * cols + c])
}

/// Box mean over `[i - radius, i + radius]` clipped to the field, rows then columns.
pub fn box_blur_field(src: &Field2, radius: usize) -> Field2 {
    let (rows, cols) = src.shape();
    if rows == 0 || cols == 0 || radius == 0 {
        return src.clone();
    }

    let mut tmp = vec![0.0f32; rows * cols];
    tmp.par_chunks_mut(cols).enumerate().for_each(|(r, dst)| {
        box_mean_1d(src.row(r), dst, radius);
    });

    let mut out = vec![0.0f32; rows * cols];
    let mut col_in = vec![0.0f32; rows];
    let mut col_out = vec![0.0f32; rows];
    for c in 0..cols {
        for r in 0..rows {
            col_in[r] = tmp[r * cols + c];
        }
        box_mean_1d(&col_in, &mut col_out, radius);
        for r in 0..rows {
            out[r * cols + c] = col_out[r];
        }
    }

    Field2::from_fn(rows, cols, |r, c| out[r * cols + c])
}

fn box_mean_1d(src: &[f32], dst: &mut [f32], radius: usize) {
    let n = src.len();
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for &v in src {
        acc += f64::from(v);
        prefix.push(acc);
    }
    for (i, d) in dst.iter_mut().enumerate() {
        let lo = i.saturating_sub(radius);
        let hi = (i + radius).min(n - 1);
        *d = ((prefix[hi + 1] - prefix[lo]) / (hi + 1 - lo) as f64) as f32;
    }
}

/// Fixed-point (q16) separable Gaussian over an RGB image with clamped borders.
pub fn gaussian_blur_rgb(src: &RgbImage, radius: u32, sigma: f32) -> RgbImage {
    let (w, h) = src.dimensions();
    if radius == 0 || w == 0 || h == 0 || !(sigma.is_finite() && sigma > 0.0) {
        return src.clone();
    }
    let kernel = gaussian_kernel_q16(radius, sigma);
    let stride = w as usize * 3;
    let mut tmp = vec![0u8; stride * h as usize];
    horizontal_pass(src.as_raw(), &mut tmp, w, &kernel);
    let mut out = vec![0u8; stride * h as usize];
    vertical_pass(&tmp, &mut out, w, h, &kernel);
    RgbImage::from_raw(w, h, out).unwrap_or_else(|| src.clone())
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> Vec<u32> {
    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Push the rounding residue into the centre tap so the kernel sums to exactly 1.0 in q16.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    weights
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let stride = width as usize * 3;
    dst.par_chunks_mut(stride)
        .zip(src.par_chunks(stride))
        .for_each(|(drow, srow)| {
            for x in 0..w {
                let mut acc = [0u64; 3];
                for (ki, &kw) in k.iter().enumerate() {
                    let sx = (x + ki as i32 - radius).clamp(0, w - 1) as usize * 3;
                    for c in 0..3 {
                        acc[c] += u64::from(kw) * u64::from(srow[sx + c]);
                    }
                }
                let o = x as usize * 3;
                for c in 0..3 {
                    drow[o + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let h = height as i32;
    let stride = width as usize * 3;
    dst.par_chunks_mut(stride).enumerate().for_each(|(y, drow)| {
        let mut acc = vec![0u64; stride];
        for (ki, &kw) in k.iter().enumerate() {
            let sy = (y as i32 + ki as i32 - radius).clamp(0, h - 1) as usize;
            let srow = &src[sy * stride..(sy + 1) * stride];
            for (a, &s) in acc.iter_mut().zip(srow) {
                *a += u64::from(kw) * u64::from(s);
            }
        }
        for (d, a) in drow.iter_mut().zip(acc) {
            *d = q16_to_u8(a);
        }
    });
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

/// Box mean over an RGB image (window shrinks at the borders), rows then columns.
pub fn box_blur_rgb(src: &RgbImage, radius: u32) -> RgbImage {
    let (w, h) = src.dimensions();
    if radius == 0 || w == 0 || h == 0 {
        return src.clone();
    }
    let planes: Vec<Field2> = (0..3)
        .map(|c| {
            Field2::from_fn(h as usize, w as usize, |y, x| {
                f32::from(src.get_pixel(x as u32, y as u32)[c])
            })
        })
        .map(|p| box_blur_field(&p, radius as usize))
        .collect();
    RgbImage::from_fn(w, h, |x, y| {
        let px = |c: usize| crate::foundation::math::to_u8(planes[c].get(y as usize, x as usize));
        image::Rgb([px(0), px(1), px(2)])
    })
}

#[cfg(test)]
#[path = "../tests/unit/blur.rs"]
mod tests;
