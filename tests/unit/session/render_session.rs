use super::*;
use crate::postfx::QualityTier;

fn small_config() -> AnimatorConfig {
    let mut cfg = AnimatorConfig::default();
    cfg.grid.cols = Some(12);
    cfg.grid.rows = Some(10);
    cfg.font.px = 8.0;
    cfg
}

fn gradient(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        let v = ((x + y) * 255 / (w + h - 2).max(1)) as u8;
        image::Rgb([v, v / 2, 255 - v])
    })
}

fn session_with_image() -> RenderSession {
    let mut s = RenderSession::new(small_config());
    s.set_source_image(gradient(64, 48)).unwrap();
    s
}

#[test]
fn rendering_without_a_source_is_a_validation_error() {
    let mut s = RenderSession::new(small_config());
    assert!(matches!(s.render_gray(0.0), Err(GlyphwaveError::Validation(_))));
    assert!(s.render_preview().is_err());
    assert!(s.export_renderer(ExportOptions::default()).is_err());
}

#[test]
fn source_image_builds_configured_grid() {
    let s = session_with_image();
    assert_eq!(s.base_grid().unwrap().shape(), (10, 12));
}

#[test]
fn derived_grid_follows_image_and_cell_size() {
    let mut cfg = small_config();
    cfg.grid.cols = None;
    cfg.grid.rows = None;
    let mut s = RenderSession::new(cfg);
    s.set_source_image(gradient(400, 200)).unwrap();
    // 8x10 cells: 400/8 = 50 columns, 200/10 = 20 rows.
    assert_eq!(s.base_grid().unwrap().shape(), (20, 50));

    s.set_font(None, 16.0).unwrap();
    // 16x16 cells: 400/16 = 25 columns, 200/16 = 12 rows.
    assert_eq!(s.base_grid().unwrap().shape(), (12, 25));
}

#[test]
fn generated_pattern_is_a_usable_source() {
    let mut s = RenderSession::new(small_config());
    s.generate_pattern(96, 64, 5, 0.3, 42).unwrap();
    let img = s.source_image().unwrap();
    assert_eq!(img.dimensions(), (96, 64));
    assert!(img.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
    assert!(s.render_preview().is_ok());
}

#[test]
fn render_frame_has_glyph_image_size() {
    let mut s = session_with_image();
    s.set_cell_gap(2, 1);
    let img = s.render_frame(0.3, FrameOpts::full()).unwrap();
    // 12 cols of 8px + 11 gaps of 2; 10 rows of 10px + 9 gaps of 1.
    assert_eq!(img.dimensions(), (12 * 8 + 11 * 2, 10 * 10 + 9));
}

#[test]
fn preview_shrinks_large_grids() {
    let mut cfg = small_config();
    cfg.grid.cols = Some(200);
    cfg.grid.rows = Some(100);
    cfg.max_preview_cells = 40;
    let mut s = RenderSession::new(cfg);
    s.set_source_image(gradient(200, 100)).unwrap();

    let preview = s.render_frame(0.0, FrameOpts::preview()).unwrap();
    assert_eq!(preview.width(), 40 * 8);
    assert_eq!(preview.height(), 20 * 10);
    let full = s.render_frame(0.0, FrameOpts::full()).unwrap();
    assert_eq!(full.width(), 200 * 8);
}

#[test]
fn cached_and_uncached_frames_match() {
    let mut s = session_with_image();
    let opts = FrameOpts {
        for_preview: false,
        use_cache: true,
        apply_postfx: false,
    };
    let cached = s.render_frame(1.25, opts).unwrap();
    assert!(!s.glyph_cache().is_empty());
    let uncached = s
        .render_frame(
            1.25,
            FrameOpts {
                use_cache: false,
                ..opts
            },
        )
        .unwrap();
    assert_eq!(cached, uncached);
}

#[test]
fn glyph_setters_clear_the_cache() {
    let mut s = session_with_image();
    s.render_preview().unwrap();
    assert!(!s.glyph_cache().is_empty());

    s.set_ramp(RampPreset::Pure, Some("XY"));
    assert!(s.glyph_cache().is_empty());
    assert_eq!(s.ramp().to_string(), "XY");
    s.render_preview().unwrap();
    assert!(s.glyph_cache().chars().iter().all(|c| *c == 'X' || *c == 'Y'));

    s.set_palette(ColorStops::randomize(9));
    assert!(s.glyph_cache().is_empty());

    s.render_preview().unwrap();
    s.set_font(None, 16.0).unwrap();
    assert!(s.glyph_cache().is_empty());

    s.render_preview().unwrap();
    assert!(!s.set_stop_hex(0, "bogus"));
    assert!(!s.glyph_cache().is_empty());
    assert!(s.set_stop_hex(0, "#FF0000"));
    assert!(s.glyph_cache().is_empty());
}

#[test]
fn mode_change_clears_the_cache() {
    let mut s = session_with_image();
    s.set_mode(AnimationMode::Waves);
    s.render_preview().unwrap();
    assert!(!s.glyph_cache().is_empty());

    s.set_mode(AnimationMode::Waves);
    assert!(!s.glyph_cache().is_empty());

    s.set_mode(AnimationMode::ContourSwim);
    assert!(s.glyph_cache().is_empty());
    assert_eq!(s.deformer().mode(), AnimationMode::ContourSwim);
}

#[test]
fn single_char_custom_ramp_is_ignored() {
    let mut s = session_with_image();
    s.set_ramp(RampPreset::Extended, Some("X"));
    assert_eq!(s.ramp().len(), 70);
    assert_eq!(s.config().symbols.custom, None);
}

#[test]
fn missing_font_keeps_previous_rasterizer() {
    let mut s = session_with_image();
    let before = s.rasterizer().name();
    assert!(s.set_font(Some(Path::new("/nonexistent/font.ttf")), 20.0).is_err());
    assert_eq!(s.rasterizer().name(), before);
}

#[test]
fn failed_apply_config_keeps_previous_state() {
    let mut s = session_with_image();
    s.render_preview().unwrap();
    let before = s.config().clone();
    let raster = s.rasterizer().name();

    let mut cfg = before.clone();
    cfg.font.path = Some("/nonexistent/font.ttf".into());
    cfg.font.px = 20.0;
    cfg.mode = AnimationMode::Audio;
    assert!(s.apply_config(cfg).is_err());

    assert_eq!(s.config(), &before);
    assert_eq!(s.rasterizer().name(), raster);
    assert_eq!(s.deformer().mode(), before.mode);
    assert!(!s.glyph_cache().is_empty());
}

#[test]
fn missing_font_in_config_falls_back_to_bitmap() {
    let mut cfg = small_config();
    cfg.font.path = Some("/nonexistent/font.ttf".into());
    let s = RenderSession::new(cfg);
    assert_eq!(s.rasterizer().cell(), BitmapFontRasterizer::new(8.0).cell());
}

#[test]
fn rebuild_resets_clock_but_other_setters_do_not() {
    let mut s = session_with_image();
    s.tick(0.5);
    s.tick(0.5);
    assert!((s.clock().t() - 1.0).abs() < 1e-12);

    s.set_mode(AnimationMode::ContourSwim);
    s.set_cell_gap(1, 1);
    assert!((s.clock().t() - 1.0).abs() < 1e-12);

    s.set_grid_size(Some(16), Some(16)).unwrap();
    assert_eq!(s.clock().t(), 0.0);
    assert_eq!(s.base_grid().unwrap().shape(), (16, 16));
}

#[test]
fn speed_percent_scales_ticks() {
    let mut s = session_with_image();
    s.set_speed_percent(250.0);
    s.tick(0.1);
    assert!((s.clock().t() - 0.25).abs() < 1e-9);
}

#[test]
fn morph_target_is_resampled_to_base_shape() {
    let mut s = session_with_image();
    s.set_morph_target_image(&gradient(17, 33)).unwrap();
    assert_eq!(s.morph_target().unwrap().shape(), (10, 12));
    s.set_grid_size(Some(20), Some(9)).unwrap();
    assert_eq!(s.morph_target().unwrap().shape(), (9, 20));

    s.set_mode(AnimationMode::Morph);
    let g = s.render_gray(2.0).unwrap();
    assert_eq!(g.shape(), (9, 20));
    assert!(g.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));

    s.clear_morph_target();
    assert!(s.morph_target().is_none());
}

#[test]
fn every_mode_renders_within_range() {
    let mut s = session_with_image();
    for mode in AnimationMode::ALL {
        s.set_mode(mode);
        assert_eq!(s.deformer().mode(), mode);
        let g = s.render_gray(0.7).unwrap();
        assert_eq!(g.shape(), (10, 12));
        assert!(g.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

#[test]
fn audio_alt_populates_the_edge_cache_once() {
    let mut s = session_with_image();
    s.set_mode(AnimationMode::AudioAlt);
    s.render_gray(0.1).unwrap();
    s.render_gray(0.2).unwrap();
    assert_eq!(s.edge_cache().misses(), 1);
    assert_eq!(s.edge_cache().hits(), 1);

    s.set_mode(AnimationMode::Waves);
    s.render_gray(0.3).unwrap();
    assert_eq!(s.edge_cache().hits() + s.edge_cache().misses(), 2);
}

#[test]
fn audio_modes_use_fallback_without_a_feed() {
    let mut cfg = small_config();
    cfg.audio.fallback_level = 0.4;
    let mut s = RenderSession::new(cfg);
    s.set_mode(AnimationMode::Audio);
    s.tick(0.1);
    assert_eq!(s.audio_signal(), AudioSignal::Scalar(0.4));
}

#[test]
fn attached_feed_produces_band_vectors() {
    let mut s = session_with_image();
    s.set_mode(AnimationMode::Audio);
    let feed = AudioFeed::new(48_000);
    feed.push(&vec![0.0; 4096]);
    s.attach_audio(feed);
    s.tick(1.0 / 30.0);
    match s.audio_signal() {
        AudioSignal::Bands(b) => assert!(b.as_array().iter().all(|v| v.abs() < 1e-6)),
        other => panic!("expected bands, got {other:?}"),
    }

    s.detach_audio();
    assert_eq!(s.audio_signal(), AudioSignal::Scalar(0.0));
}

#[test]
fn postfx_settings_reach_the_preview_tier() {
    let mut s = session_with_image();
    let mut fx = PostFxSettings::default();
    fx.accurate_preview = true;
    fx.crt_enabled = true;
    fx.crt.scanlines = 9.0;
    s.set_postfx(fx);
    assert_eq!(s.postfx().preview_tier(), QualityTier::Exact);
    assert_eq!(s.config().postfx.crt.scanlines, 1.0);
}

#[test]
fn apply_config_rebuilds_only_on_geometry_changes() {
    let mut s = session_with_image();
    s.render_preview().unwrap();
    s.tick(1.0);

    let mut cfg = s.config().clone();
    cfg.waves.amplitude = 0.5;
    s.apply_config(cfg.clone()).unwrap();
    assert!(s.clock().t() > 0.0);
    assert!(!s.glyph_cache().is_empty());

    cfg.grid.cols = Some(20);
    cfg.symbols.preset = RampPreset::Extended;
    s.apply_config(cfg).unwrap();
    assert_eq!(s.clock().t(), 0.0);
    assert!(s.glyph_cache().is_empty());
    assert_eq!(s.base_grid().unwrap().cols(), 20);
}

#[test]
fn apply_config_mode_change_goes_through_set_mode() {
    let mut s = session_with_image();
    s.render_preview().unwrap();

    let mut cfg = s.config().clone();
    cfg.mode = AnimationMode::ContourSwim;
    s.apply_config(cfg).unwrap();
    assert_eq!(s.deformer().mode(), AnimationMode::ContourSwim);
    assert!(s.glyph_cache().is_empty());
}

#[test]
fn export_renderer_is_independent_of_the_session() {
    let mut s = session_with_image();
    s.set_mode(AnimationMode::Waves);
    let opts = ExportOptions {
        frames: 3,
        ..ExportOptions::default()
    };
    let renderer = s.export_renderer(opts).unwrap();

    s.set_ramp(RampPreset::Pure, Some("XY"));
    s.set_grid_size(Some(30), Some(30)).unwrap();

    let frame = renderer.render_glyphs(0.0);
    assert_eq!(frame.dimensions(), (12 * 8, 10 * 10));
    assert_eq!(renderer.timestamps().len(), 3);
}
