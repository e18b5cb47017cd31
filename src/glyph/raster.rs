use std::path::Path;

use font8x8::legacy::{BASIC_LEGACY, BLOCK_LEGACY, BOX_LEGACY};
use fontdue::{Font, FontSettings};

use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};
use crate::grid::CellGeometry;

/// Default glyph pixel size.
pub const DEFAULT_FONT_PX: f32 = 16.0;

/// Reference glyph whose metrics define the cell size.
const REFERENCE_GLYPH: char = 'M';

/// Cell-sized 8-bit coverage mask for one glyph, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphCoverage {
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>,
}

impl GlyphCoverage {
    pub fn empty(cell: CellGeometry) -> Self {
        Self {
            width: cell.width,
            height: cell.height,
            alpha: vec![0; (cell.width * cell.height) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.alpha[(y * self.width + x) as usize]
    }

    /// Number of pixels with non-zero coverage.
    pub fn ink(&self) -> usize {
        self.alpha.iter().filter(|&&a| a > 0).count()
    }
}

/// Source of glyph coverage masks, all sized to one fixed cell.
pub trait GlyphRasterizer: Send + Sync + std::fmt::Debug {
    /// Short description for logs.
    fn name(&self) -> String;

    fn cell(&self) -> CellGeometry;

    /// Coverage of `ch` placed inside one cell.
    fn coverage(&self, ch: char) -> GlyphCoverage;
}

/// TrueType/OpenType rasterizer backed by `fontdue`.
pub struct FontRasterizer {
    font: Font,
    px: f32,
    cell: CellGeometry,
    baseline: i32,
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRasterizer")
            .field("name", &self.font.name())
            .field("px", &self.px)
            .field("cell", &self.cell)
            .finish()
    }
}

impl FontRasterizer {
    /// Parse font bytes and measure the cell at `px`.
    pub fn from_bytes(bytes: &[u8], px: f32) -> GlyphwaveResult<Self> {
        let px = if px.is_finite() && px >= 1.0 { px } else { DEFAULT_FONT_PX };
        let font = Font::from_bytes(
            bytes,
            FontSettings {
                scale: px,
                ..FontSettings::default()
            },
        )
        .map_err(|e| GlyphwaveError::render(format!("failed to parse font: {e}")))?;

        let advance = font.metrics(REFERENCE_GLYPH, px).advance_width.ceil();
        let (ascent, descent) = match font.horizontal_line_metrics(px) {
            Some(lm) => (lm.ascent, lm.descent),
            None => (px, 0.0),
        };
        let baseline = ascent.ceil() as i32;
        let height = (ascent - descent).ceil();
        let cell = CellGeometry::new(advance.max(1.0) as u32, height.max(1.0) as u32);
        Ok(Self {
            font,
            px,
            cell,
            baseline,
        })
    }

    pub fn from_path(path: &Path, px: f32) -> GlyphwaveResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, px)
    }

    pub fn px(&self) -> f32 {
        self.px
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn name(&self) -> String {
        format!("{} @ {}px", self.font.name().unwrap_or("font"), self.px)
    }

    fn cell(&self) -> CellGeometry {
        self.cell
    }

    fn coverage(&self, ch: char) -> GlyphCoverage {
        let mut out = GlyphCoverage::empty(self.cell);
        let (m, bitmap) = self.font.rasterize(ch, self.px);
        let x0 = m.xmin;
        let y0 = self.baseline - (m.height as i32 + m.ymin);
        for gy in 0..m.height {
            let y = y0 + gy as i32;
            if y < 0 || y >= self.cell.height as i32 {
                continue;
            }
            for gx in 0..m.width {
                let x = x0 + gx as i32;
                if x < 0 || x >= self.cell.width as i32 {
                    continue;
                }
                let a = bitmap[gy * m.width + gx];
                let slot = &mut out.alpha[(y as u32 * self.cell.width + x as u32) as usize];
                *slot = (*slot).max(a);
            }
        }
        out
    }
}

/// Built-in 8x8 bitmap font scaled by an integer factor. Always available.
///
/// Covers ASCII, box drawing (U+2500..U+257F) and block elements (U+2580..U+259F); any other
/// character renders as `?`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapFontRasterizer {
    scale: u32,
    cell: CellGeometry,
}

impl Default for BitmapFontRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_PX)
    }
}

impl BitmapFontRasterizer {
    /// Glyphs are `8·k` pixels square with `k = max(1, round(px / 8))`.
    pub fn new(px: f32) -> Self {
        let scale = if px.is_finite() {
            (px / 8.0).round().max(1.0) as u32
        } else {
            2
        };
        Self {
            scale,
            cell: CellGeometry::new(8 * scale, 8 * scale),
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }
}

fn bitmap_rows(ch: char) -> [u8; 8] {
    let code = ch as usize;
    match code {
        0..=0x7F => BASIC_LEGACY[code],
        0x2500..=0x257F => BOX_LEGACY[code - 0x2500],
        0x2580..=0x259F => BLOCK_LEGACY[code - 0x2580],
        _ => BASIC_LEGACY[b'?' as usize],
    }
}

impl GlyphRasterizer for BitmapFontRasterizer {
    fn name(&self) -> String {
        format!("builtin 8x8 x{}", self.scale)
    }

    fn cell(&self) -> CellGeometry {
        self.cell
    }

    fn coverage(&self, ch: char) -> GlyphCoverage {
        let mut out = GlyphCoverage::empty(self.cell);
        let rows = bitmap_rows(ch);
        let size = 8 * self.scale;
        let ox = (self.cell.width - size) / 2;
        let oy = (self.cell.height - size) / 2;
        for y in 0..size {
            let bits = rows[(y / self.scale) as usize];
            for x in 0..size {
                if (bits >> (x / self.scale)) & 1 == 1 {
                    out.alpha[((oy + y) * self.cell.width + ox + x) as usize] = 255;
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/glyph/raster.rs"]
mod tests;
