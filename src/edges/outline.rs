use image::{RgbImage, Rgba, RgbaImage};

use crate::foundation::math::{blend_u8, clamp01, to_u8};
use crate::grid::Field2;

/// White outline layer from an edge mask, dilated to `width` pixels (4-neighbourhood).
///
/// Alpha is `mask · intensity`; an empty mask gives a fully transparent layer.
pub fn draw_outline(mask: &Field2, width: u32, intensity: f32) -> RgbaImage {
    let (rows, cols) = mask.shape();
    let alpha = clamp01(intensity);
    let mut dil = mask.clone();
    if mask.max() > 0.0 {
        for _ in 1..width.max(1) {
            let prev = dil.clone();
            dil = Field2::from_fn(rows, cols, |r, c| {
                let mut v = prev.get(r, c);
                if r > 0 {
                    v = v.max(prev.get(r - 1, c));
                }
                if r + 1 < rows {
                    v = v.max(prev.get(r + 1, c));
                }
                if c > 0 {
                    v = v.max(prev.get(r, c - 1));
                }
                if c + 1 < cols {
                    v = v.max(prev.get(r, c + 1));
                }
                v
            });
        }
    }
    RgbaImage::from_fn(cols as u32, rows as u32, |x, y| {
        let a = clamp01(dil.get(y as usize, x as usize) * alpha);
        Rgba([255, 255, 255, to_u8(a * 255.0)])
    })
}

/// Alpha-blend `overlay` onto `base` with an extra global `alpha` in `[0, 1]`.
///
/// Only the region covered by both images is blended.
pub fn compose(base: &RgbImage, overlay: &RgbaImage, alpha: f32) -> RgbImage {
    let global = clamp01(alpha);
    let mut out = base.clone();
    let w = base.width().min(overlay.width());
    let h = base.height().min(overlay.height());
    for y in 0..h {
        for x in 0..w {
            let o = overlay.get_pixel(x, y);
            let a = to_u8(f32::from(o[3]) * global);
            let px = out.get_pixel_mut(x, y);
            for c in 0..3 {
                px[c] = blend_u8(px[c], o[c], a);
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/edges/outline.rs"]
mod tests;
