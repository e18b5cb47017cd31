use super::*;

#[test]
fn bitmap_scale_follows_pixel_size() {
    assert_eq!(BitmapFontRasterizer::new(8.0).scale(), 1);
    assert_eq!(BitmapFontRasterizer::new(16.0).scale(), 2);
    assert_eq!(BitmapFontRasterizer::new(3.0).scale(), 1);
    assert_eq!(BitmapFontRasterizer::new(f32::NAN).scale(), 2);
    assert_eq!(BitmapFontRasterizer::default().cell(), CellGeometry::new(16, 16));
}

#[test]
fn small_bitmap_cell_is_floored_and_centered() {
    let r = BitmapFontRasterizer::new(8.0);
    let cell = r.cell();
    assert_eq!((cell.width, cell.height), (8, 10));
    // 8x8 glyph centered vertically: top and bottom rows stay empty.
    let cov = r.coverage('\u{2588}');
    assert_eq!(cov.ink(), 64);
    assert!((0..8).all(|x| cov.get(x, 0) == 0 && cov.get(x, 9) == 0));
    assert!((0..8).all(|x| cov.get(x, 1) == 255));
}

#[test]
fn space_has_no_ink_and_letters_do() {
    let r = BitmapFontRasterizer::default();
    assert_eq!(r.coverage(' ').ink(), 0);
    assert!(r.coverage('@').ink() > 0);
    let cov = r.coverage('#');
    assert_eq!(cov.alpha.len(), (cov.width * cov.height) as usize);
}

#[test]
fn unknown_characters_render_as_question_mark() {
    let r = BitmapFontRasterizer::default();
    assert_eq!(r.coverage('\u{4E00}'), r.coverage('?'));
    assert_ne!(r.coverage('\u{2500}'), r.coverage('?'));
}

#[test]
fn scaled_pixels_are_replicated() {
    let r = BitmapFontRasterizer::new(16.0);
    let cov = r.coverage('\u{2588}');
    assert_eq!(cov.ink(), 256);
}

#[test]
fn invalid_font_bytes_fail() {
    let err = FontRasterizer::from_bytes(b"not a font", 16.0).unwrap_err();
    assert!(matches!(err, GlyphwaveError::Render(_)));
}

#[test]
fn missing_font_file_is_io_error() {
    let err = FontRasterizer::from_path(Path::new("/nonexistent/font.ttf"), 16.0).unwrap_err();
    assert!(matches!(err, GlyphwaveError::Io(_)));
}
