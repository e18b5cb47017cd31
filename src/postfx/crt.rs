use image::RgbImage;
use rayon::prelude::*;

use super::{CrtParams, QualityTier};
use crate::foundation::math::blend_u8;

/// Translate `img` by `(dx, dy)` over black, cropping what falls outside.
pub fn shake(img: &RgbImage, dx: i32, dy: i32) -> RgbImage {
    if dx == 0 && dy == 0 {
        return img.clone();
    }
    let (w, h) = img.dimensions();
    let mut out = RgbImage::new(w, h);
    image::imageops::overlay(&mut out, img, i64::from(dx), i64::from(dy));
    out
}

/// Darken every even row with a black line of opacity `alpha`.
pub fn scanlines(img: &mut RgbImage, alpha: u8) {
    if alpha == 0 {
        return;
    }
    let stride = img.width() as usize * 3;
    if stride == 0 {
        return;
    }
    let buf: &mut [u8] = img;
    buf.par_chunks_mut(stride)
        .step_by(2)
        .for_each(|row| row.iter_mut().for_each(|c| *c = blend_u8(*c, 0, alpha)));
}

/// Darken by a per-pixel alpha derived from the distance to `(cx, cy)`.
fn radial_darken(img: &mut RgbImage, cx: f64, cy: f64, alpha_at: impl Fn(f64) -> u8 + Sync) {
    let stride = img.width() as usize * 3;
    if stride == 0 {
        return;
    }
    let buf: &mut [u8] = img;
    buf.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        let dy = y as f64 - cy;
        for (x, px) in row.chunks_exact_mut(3).enumerate() {
            let dx = x as f64 - cx;
            let a = alpha_at((dx * dx + dy * dy).sqrt());
            if a > 0 {
                px.iter_mut().for_each(|c| *c = blend_u8(*c, 0, a));
            }
        }
    });
}

/// Export vignette: alpha `255·clamp(d / d_max · strength)` around the integer centre.
pub fn vignette_exact(img: &mut RgbImage, strength: f32) {
    let (cx, cy) = (f64::from(img.width() / 2), f64::from(img.height() / 2));
    let max_dist = (cx * cx + cy * cy).sqrt();
    if strength <= 0.0 || max_dist == 0.0 {
        return;
    }
    let s = f64::from(strength);
    radial_darken(img, cx, cy, |d| ((d / max_dist * s).clamp(0.0, 1.0) * 255.0) as u8);
}

/// Preview vignette: linear radial gradient reaching alpha `200·strength` at `0.6·max(w, h)`.
pub fn vignette_fast(img: &mut RgbImage, strength: f32) {
    let (w, h) = img.dimensions();
    let radius = 0.6 * f64::from(w.max(h));
    if strength <= 0.0 || radius == 0.0 {
        return;
    }
    let edge = (f64::from(strength).min(1.0) * 200.0).floor();
    radial_darken(img, f64::from(w) / 2.0, f64::from(h) / 2.0, |d| {
        (edge * (d / radius).min(1.0)) as u8
    });
}

/// Chromatic aberration: red moves `shift` px right, blue `shift` px left; vacated samples
/// are black.
pub fn rgb_shift(img: &RgbImage, shift: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if shift == 0 {
        return img.clone();
    }
    RgbImage::from_fn(w, h, |x, y| {
        let g = img.get_pixel(x, y)[1];
        let r = x.checked_sub(shift).map_or(0, |sx| img.get_pixel(sx, y)[0]);
        let b = x
            .checked_add(shift)
            .filter(|&sx| sx < w)
            .map_or(0, |sx| img.get_pixel(sx, y)[2]);
        image::Rgb([r, g, b])
    })
}

/// Full CRT stack: shake, scanlines, vignette, then RGB shift.
pub(crate) fn apply_crt(
    img: &RgbImage,
    p: &CrtParams,
    offset: (i32, i32),
    tier: QualityTier,
) -> RgbImage {
    let mut out = shake(img, offset.0, offset.1);
    let s = p.scanlines.clamp(0.0, 1.0);
    let v = p.vignette.clamp(0.0, 1.0);
    match tier {
        QualityTier::Exact => {
            scanlines(&mut out, (s * 150.0) as u8);
            vignette_exact(&mut out, v);
        }
        QualityTier::Fast => {
            scanlines(&mut out, (s * 180.0) as u8);
            vignette_fast(&mut out, v);
        }
    }
    let shift = (p.rgb_shift.clamp(0.0, 1.0) * 5.0) as u32;
    if shift > 0 { rgb_shift(&out, shift) } else { out }
}
