use image::RgbImage;
use rayon::prelude::*;

use super::GlowParams;
use crate::blur::{box_blur_rgb, gaussian_blur_rgb};

/// Keep pixels whose mean channel exceeds `threshold`, scaled by `gain`; the rest go black.
pub fn bright_pass(img: &RgbImage, threshold: f32, gain: f32) -> RgbImage {
    let mut out = img.clone();
    let buf: &mut [u8] = &mut out;
    buf.par_chunks_mut(3).for_each(|px| {
        let mean = (f32::from(px[0]) + f32::from(px[1]) + f32::from(px[2])) / 3.0;
        if mean > threshold {
            px.iter_mut()
                .for_each(|c| *c = (f32::from(*c) * gain).clamp(0.0, 255.0) as u8);
        } else {
            px.fill(0);
        }
    });
    out
}

/// `base + layer·weight`, clipped and truncated to `u8`.
pub fn add_weighted(base: &RgbImage, layer: &RgbImage, weight: f32) -> RgbImage {
    let mut out = base.clone();
    let dst: &mut [u8] = &mut out;
    dst.par_iter_mut()
        .zip(layer.as_raw().par_iter())
        .for_each(|(d, &l)| *d = (f32::from(*d) + f32::from(l) * weight).clamp(0.0, 255.0) as u8);
    out
}

fn threshold(p: &GlowParams) -> f32 {
    128.0 * (1.0 - p.bloom.clamp(0.0, 1.0))
}

/// Export glow: bright pass brightened by `1 + intensity`, two Gaussian passes with
/// `sigma = radius`, added back at `0.5·intensity`.
pub fn glow_exact(img: &RgbImage, p: &GlowParams) -> RgbImage {
    let intensity = p.intensity.max(0.0);
    if intensity == 0.0 {
        return img.clone();
    }
    let mut bloom = bright_pass(img, threshold(p), 1.0 + intensity);
    if p.radius > 0 {
        let sigma = p.radius as f32;
        let reach = (3.0 * sigma).ceil() as u32;
        for _ in 0..2 {
            bloom = gaussian_blur_rgb(&bloom, reach, sigma);
        }
    }
    add_weighted(img, &bloom, 0.5 * intensity)
}

/// Preview glow: bright pass, one box blur of half the radius, added at `0.3·intensity`.
pub fn glow_fast(img: &RgbImage, p: &GlowParams) -> RgbImage {
    let intensity = p.intensity.max(0.0);
    if intensity == 0.0 {
        return img.clone();
    }
    let bloom = box_blur_rgb(&bright_pass(img, threshold(p), 1.0), (p.radius / 2).max(1));
    add_weighted(img, &bloom, 0.3 * intensity)
}
