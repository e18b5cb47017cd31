use image::GrayImage;

use super::ramp::SymbolRamp;
use super::raster::GlyphRasterizer;

/// Grayscale atlas of a ramp's glyphs for texture-based renderers.
#[derive(Clone, Debug)]
pub struct GlyphAtlas {
    pub image: GrayImage,
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl GlyphAtlas {
    /// Top-left pixel of ramp entry `index`, row-major.
    pub fn tile_origin(&self, index: usize) -> (u32, u32) {
        let i = index as u32;
        (
            (i % self.tiles_x) * self.tile_width,
            (i / self.tiles_x) * self.tile_height,
        )
    }
}

/// Lay out every ramp glyph on a near-square grid of cell-sized tiles.
///
/// `tiles_x = ceil(sqrt(n))`, `tiles_y = ceil(n / tiles_x)`. Empty ramps yield a single blank
/// tile.
pub fn build_glyph_atlas(raster: &dyn GlyphRasterizer, ramp: &SymbolRamp) -> GlyphAtlas {
    let cell = raster.cell();
    let n = ramp.len().max(1) as u32;
    let tiles_x = (n as f64).sqrt().ceil() as u32;
    let tiles_y = n.div_ceil(tiles_x);
    let mut image = GrayImage::new(tiles_x * cell.width, tiles_y * cell.height);

    for (i, &ch) in ramp.chars().iter().enumerate() {
        let cov = raster.coverage(ch);
        let i = i as u32;
        let (ox, oy) = ((i % tiles_x) * cell.width, (i / tiles_x) * cell.height);
        for y in 0..cov.height {
            for x in 0..cov.width {
                image.put_pixel(ox + x, oy + y, image::Luma([cov.get(x, y)]));
            }
        }
    }
    tracing::debug!(glyphs = ramp.len(), tiles_x, tiles_y, "glyph atlas built");

    GlyphAtlas {
        image,
        tiles_x,
        tiles_y,
        tile_width: cell.width,
        tile_height: cell.height,
    }
}
