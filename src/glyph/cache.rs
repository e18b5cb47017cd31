use std::collections::HashMap;
use std::sync::Arc;

use image::{Rgba, RgbaImage};

use super::raster::GlyphRasterizer;
use crate::foundation::core::Rgb8;

/// Rendered `(character, color)` bitmaps.
///
/// Bitmaps bake in the font, cell size and color, so the owner must call [`GlyphCache::clear`]
/// whenever the font, cell size, ramp or palette changes. Nothing here invalidates itself.
#[derive(Debug, Default)]
pub struct GlyphCache {
    map: HashMap<(char, Rgb8), Arc<RgbaImage>>,
    hits: u64,
    misses: u64,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached bitmap for `(ch, color)`, rasterizing it on first use.
    pub fn get_or_render(
        &mut self,
        ch: char,
        color: Rgb8,
        raster: &dyn GlyphRasterizer,
    ) -> Arc<RgbaImage> {
        if let Some(img) = self.map.get(&(ch, color)) {
            self.hits += 1;
            return Arc::clone(img);
        }
        self.misses += 1;
        let img = Arc::new(render_glyph(ch, color, raster));
        self.map.insert((ch, color), Arc::clone(&img));
        img
    }

    pub fn get(&self, ch: char, color: Rgb8) -> Option<&Arc<RgbaImage>> {
        self.map.get(&(ch, color))
    }

    pub fn contains(&self, ch: char, color: Rgb8) -> bool {
        self.map.contains_key(&(ch, color))
    }

    /// Distinct characters with at least one cached bitmap.
    pub fn chars(&self) -> Vec<char> {
        let mut out: Vec<char> = self.map.keys().map(|(ch, _)| *ch).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        if !self.map.is_empty() {
            tracing::debug!(entries = self.map.len(), "glyph cache cleared");
        }
        self.map.clear();
    }
}

/// Cell-sized RGBA bitmap of `ch` in `color`, alpha taken from glyph coverage.
pub fn render_glyph(ch: char, color: Rgb8, raster: &dyn GlyphRasterizer) -> RgbaImage {
    let cov = raster.coverage(ch);
    RgbaImage::from_fn(cov.width, cov.height, |x, y| {
        Rgba([color[0], color[1], color[2], cov.get(x, y)])
    })
}

#[cfg(test)]
#[path = "../../tests/unit/glyph/cache.rs"]
mod tests;
