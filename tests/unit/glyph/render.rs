use super::*;
use crate::glyph::{BitmapFontRasterizer, RampPreset, build_glyph_atlas};

fn rgb(r: u8, g: u8, b: u8) -> Rgb8 {
    image::Rgb([r, g, b])
}

fn gradient(rows: usize, cols: usize) -> LuminanceGrid {
    LuminanceGrid::from_fn(rows, cols, |r, c| (r * cols + c) as f32 / (rows * cols) as f32)
}

#[test]
fn image_size_includes_gaps() {
    let layout = GlyphLayout {
        gap_x: 2,
        gap_y: 3,
        ..GlyphLayout::default()
    };
    let cell = CellGeometry::new(8, 12);
    assert_eq!(layout.image_size(4, 5, cell), (5 * 8 + 4 * 2, 4 * 12 + 3 * 3));
    assert_eq!(layout.image_size(1, 1, cell), (8, 12));
    assert_eq!(layout.image_size(0, 0, cell), (1, 1));
}

#[test]
fn output_has_layout_size_and_background() {
    let raster = BitmapFontRasterizer::default();
    let layout = GlyphLayout {
        gap_x: 1,
        gap_y: 1,
        background: rgb(9, 8, 7),
        invert: false,
    };
    let grid = LuminanceGrid::filled(3, 4, 0.0);
    let img = build_colored_glyph_image(
        &grid,
        &SymbolRamp::default(),
        &raster,
        &ColorStops::default(),
        &layout,
        None,
    );
    assert_eq!(img.dimensions(), layout.image_size(3, 4, raster.cell()));
    // Luminance 0 maps to ' ', so nothing is drawn.
    assert!(img.pixels().all(|p| *p == rgb(9, 8, 7)));
}

#[test]
fn bright_cells_draw_in_the_top_stop_color() {
    let raster = BitmapFontRasterizer::new(8.0);
    let mut stops = ColorStops::default();
    stops.set(4, rgb(0, 200, 0));
    let grid = LuminanceGrid::filled(1, 1, 1.0);
    let ramp = SymbolRamp::custom(" \u{2588}").unwrap();
    let img = build_colored_glyph_image(
        &grid,
        &ramp,
        &raster,
        &stops,
        &GlyphLayout::default(),
        None,
    );
    // Full block covers rows 1..9 of the 8x10 cell.
    assert_eq!(*img.get_pixel(3, 4), rgb(0, 200, 0));
    assert_eq!(*img.get_pixel(3, 0), rgb(0, 0, 0));
}

#[test]
fn cached_and_uncached_paths_match() {
    let raster = BitmapFontRasterizer::default();
    let ramp = SymbolRamp::preset(RampPreset::Extended);
    let stops = ColorStops::randomize(7);
    let layout = GlyphLayout {
        gap_x: 2,
        gap_y: 1,
        background: rgb(20, 20, 40),
        invert: true,
    };
    let grid = gradient(6, 9);
    let mut cache = GlyphCache::new();
    let cached = build_colored_glyph_image(&grid, &ramp, &raster, &stops, &layout, Some(&mut cache));
    let again = build_colored_glyph_image(&grid, &ramp, &raster, &stops, &layout, Some(&mut cache));
    let plain = build_colored_glyph_image(&grid, &ramp, &raster, &stops, &layout, None);
    assert_eq!(cached, plain);
    assert_eq!(again, plain);
    assert!(cache.hits() > 0);
}

#[test]
fn cleared_cache_holds_only_the_new_ramp() {
    let raster = BitmapFontRasterizer::default();
    let stops = ColorStops::default();
    let layout = GlyphLayout::default();
    let grid = gradient(4, 4);
    let mut cache = GlyphCache::new();

    // A one-character custom ramp is rejected, so the preset is used.
    let first = SymbolRamp::select(RampPreset::Pure, Some("A"));
    build_colored_glyph_image(&grid, &first, &raster, &stops, &layout, Some(&mut cache));
    assert!(!cache.chars().contains(&'A'));

    cache.clear();
    let second = SymbolRamp::select(RampPreset::Pure, Some("XY"));
    build_colored_glyph_image(&grid, &second, &raster, &stops, &layout, Some(&mut cache));
    let chars = cache.chars();
    assert!(!chars.is_empty());
    assert!(chars.iter().all(|c| *c == 'X' || *c == 'Y'), "{chars:?}");
}

#[test]
fn layout_serializes_background_as_hex() {
    let layout = GlyphLayout {
        background: rgb(255, 0, 16),
        ..GlyphLayout::default()
    };
    let json = serde_json::to_string(&layout).unwrap();
    assert!(json.contains("\"#FF0010\""), "{json}");
    let back: GlyphLayout = serde_json::from_str(&json).unwrap();
    assert_eq!(back, layout);
    assert!(serde_json::from_str::<GlyphLayout>(r##"{"background":"#zz"}"##).is_err());
}

#[test]
fn atlas_is_near_square() {
    let raster = BitmapFontRasterizer::new(8.0);
    let ramp = SymbolRamp::default();
    let atlas = build_glyph_atlas(&raster, &ramp);
    assert_eq!((atlas.tiles_x, atlas.tiles_y), (4, 3));
    assert_eq!(atlas.image.dimensions(), (4 * 8, 3 * 10));
    // '@' is the tenth glyph: column 1, row 2.
    assert_eq!(atlas.tile_origin(9), (8, 20));
    let cov = raster.coverage('@');
    let (ox, oy) = atlas.tile_origin(9);
    for y in 0..cov.height {
        for x in 0..cov.width {
            assert_eq!(atlas.image.get_pixel(ox + x, oy + y).0[0], cov.get(x, y));
        }
    }
}
