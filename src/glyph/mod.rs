//! Glyph rendering: symbol ramps, color gradients, rasterizers and the colored glyph image.
//!
//! A [`LuminanceGrid`](crate::grid::LuminanceGrid) becomes pixels in two lookups per cell: the
//! ramp picks a character, the [`ColorStops`] gradient picks its color. Rasterized
//! `(character, color)` bitmaps may be kept in a [`GlyphCache`] across frames.

mod atlas;
mod cache;
mod color;
mod ramp;
mod raster;
mod render;

pub use atlas::{GlyphAtlas, build_glyph_atlas};
pub use cache::{GlyphCache, render_glyph};
pub use color::{ColorStops, STOP_COUNT, parse_hex, to_hex};
pub use ramp::{RAMP_EXTENDED, RAMP_PURE, RampPreset, SymbolRamp};
pub use raster::{
    BitmapFontRasterizer, DEFAULT_FONT_PX, FontRasterizer, GlyphCoverage, GlyphRasterizer,
};
pub use render::{GlyphLayout, build_colored_glyph_image};
