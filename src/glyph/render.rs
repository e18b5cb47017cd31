use std::collections::HashMap;
use std::sync::Arc;

use image::{RgbImage, RgbaImage};
use rayon::prelude::*;

use super::cache::GlyphCache;
use super::color::ColorStops;
use super::ramp::SymbolRamp;
use super::raster::{GlyphCoverage, GlyphRasterizer};
use crate::foundation::core::Rgb8;
use crate::foundation::math::blend_u8;
use crate::grid::{CellGeometry, LuminanceGrid};

/// Placement options for the glyph image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GlyphLayout {
    /// Horizontal gap between cells in pixels.
    pub gap_x: u32,
    /// Vertical gap between cells in pixels.
    pub gap_y: u32,
    /// Map bright cells to the sparse end of the ramp. Colors are not inverted.
    pub invert: bool,
    #[serde(with = "rgb_hex")]
    pub background: Rgb8,
}

impl Default for GlyphLayout {
    fn default() -> Self {
        Self {
            gap_x: 0,
            gap_y: 0,
            invert: false,
            background: image::Rgb([0, 0, 0]),
        }
    }
}

impl GlyphLayout {
    /// Output size: `cols·cw + (cols-1)·gap_x` by `rows·ch + (rows-1)·gap_y`, at least 1x1.
    pub fn image_size(&self, rows: usize, cols: usize, cell: CellGeometry) -> (u32, u32) {
        let span = |n: usize, size: u32, gap: u32| {
            let n = n as u32;
            (n * size + n.saturating_sub(1) * gap).max(1)
        };
        (
            span(cols, cell.width, self.gap_x),
            span(rows, cell.height, self.gap_y),
        )
    }
}

mod rgb_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::foundation::core::Rgb8;
    use crate::glyph::color::{parse_hex, to_hex};

    pub fn serialize<S: Serializer>(c: &Rgb8, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&to_hex(*c))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Rgb8, D::Error> {
        let text = String::deserialize(d)?;
        parse_hex(&text).ok_or_else(|| serde::de::Error::custom(format!("bad color '{text}'")))
    }
}

enum Sprite<'a> {
    Baked(&'a RgbaImage),
    Mask(&'a GlyphCoverage, Rgb8),
}

impl Sprite<'_> {
    fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        match self {
            Self::Baked(img) => img.get_pixel(x, y).0,
            Self::Mask(cov, c) => [c[0], c[1], c[2], cov.get(x, y)],
        }
    }
}

/// Render `grid` as colored glyphs.
///
/// Each cell picks its character from `ramp` and its color from `stops` by luminance. With a
/// cache, every distinct `(character, color)` bitmap is rasterized once and reused across calls;
/// without one, coverage masks are only reused within this call. Both paths produce identical
/// pixels.
pub fn build_colored_glyph_image(
    grid: &LuminanceGrid,
    ramp: &SymbolRamp,
    raster: &dyn GlyphRasterizer,
    stops: &ColorStops,
    layout: &GlyphLayout,
    cache: Option<&mut GlyphCache>,
) -> RgbImage {
    let cell = raster.cell();
    let (rows, cols) = grid.shape();
    let (w, h) = layout.image_size(rows, cols, cell);
    let mut img = RgbImage::from_pixel(w, h, layout.background);
    if rows == 0 || cols == 0 || ramp.is_empty() {
        return img;
    }

    let cells: Vec<(char, Rgb8)> = grid
        .as_slice()
        .iter()
        .map(|&v| (ramp.glyph_for(v, layout.invert), stops.color_at(v)))
        .collect();

    match cache {
        Some(cache) => {
            let baked: HashMap<(char, Rgb8), Arc<RgbaImage>> = cells
                .iter()
                .map(|&key| (key, cache.get_or_render(key.0, key.1, raster)))
                .collect();
            paint(&mut img, cols, cell, layout, &cells, |key| {
                Sprite::Baked(&baked[&key])
            });
        }
        None => {
            let mut masks: HashMap<char, GlyphCoverage> = HashMap::new();
            for &(ch, _) in &cells {
                masks.entry(ch).or_insert_with(|| raster.coverage(ch));
            }
            paint(&mut img, cols, cell, layout, &cells, |(ch, color)| {
                Sprite::Mask(&masks[&ch], color)
            });
        }
    }
    img
}

fn paint<'a>(
    img: &mut RgbImage,
    cols: usize,
    cell: CellGeometry,
    layout: &GlyphLayout,
    cells: &[(char, Rgb8)],
    sprite: impl Fn((char, Rgb8)) -> Sprite<'a> + Sync,
) {
    let width = img.width() as usize;
    let stride = width * 3;
    let band = (cell.height + layout.gap_y) as usize * stride;
    let pitch_x = (cell.width + layout.gap_x) as usize;
    let buf: &mut [u8] = img;

    buf.par_chunks_mut(band)
        .zip(cells.par_chunks(cols))
        .for_each(|(dst, row_cells)| {
            for (c, &key) in row_cells.iter().enumerate() {
                let s = sprite(key);
                let x0 = c * pitch_x;
                for gy in 0..cell.height {
                    let row_off = gy as usize * stride;
                    if row_off >= dst.len() {
                        break;
                    }
                    for gx in 0..cell.width {
                        let [r, g, b, a] = s.rgba(gx, gy);
                        if a == 0 {
                            continue;
                        }
                        let i = row_off + (x0 + gx as usize) * 3;
                        dst[i] = blend_u8(dst[i], r, a);
                        dst[i + 1] = blend_u8(dst[i + 1], g, a);
                        dst[i + 2] = blend_u8(dst[i + 2], b, a);
                    }
                }
            }
        });
}

#[cfg(test)]
#[path = "../../tests/unit/glyph/render.rs"]
mod tests;
