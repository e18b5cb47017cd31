use std::path::Path;
use std::sync::Arc;

use image::RgbImage;

use super::clock::AnimationClock;
use super::export::{ExportOptions, ExportRenderer};
use crate::audio::{AudioFeed, BandVector, SixBandAnalyzer};
use crate::config::AnimatorConfig;
use crate::deform::{AnimationMode, AudioSignal, DeformInput, Deformer};
use crate::edges::{DEFAULT_EDGE_CACHE_CAPACITY, EdgeData, EdgeFieldCache};
use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};
use crate::glyph::{
    BitmapFontRasterizer, ColorStops, FontRasterizer, GlyphCache, GlyphRasterizer, RampPreset,
    SymbolRamp, build_colored_glyph_image,
};
use crate::grid::{Field2, LuminanceGrid, resize_to_grid, shrink_for_preview, to_grayscale};
use crate::postfx::{PostFx, PostFxSettings};

/// Per-call rendering switches for [`RenderSession::render_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameOpts {
    /// Shrink large grids to `max_preview_cells` and use the preview post-fx tier.
    pub for_preview: bool,
    /// Reuse rasterized glyphs through the session's glyph cache.
    pub use_cache: bool,
    pub apply_postfx: bool,
}

impl FrameOpts {
    pub fn preview() -> Self {
        Self {
            for_preview: true,
            use_cache: true,
            apply_postfx: true,
        }
    }

    /// Full resolution, uncached, exact post-fx.
    pub fn full() -> Self {
        Self {
            for_preview: false,
            use_cache: false,
            apply_postfx: true,
        }
    }
}

impl Default for FrameOpts {
    fn default() -> Self {
        Self::preview()
    }
}

/// Interactive renderer state: source image, base grid, caches, audio and post-fx.
///
/// Setters that change anything baked into glyph bitmaps (font, ramp, palette) clear the glyph
/// cache. Setters that change the grid geometry rebuild the base grid and reset the clock.
pub struct RenderSession {
    config: AnimatorConfig,

    source: Option<RgbImage>,
    source_gray: Option<Field2>,
    base: Option<LuminanceGrid>,
    morph_gray: Option<Field2>,
    morph_target: Option<LuminanceGrid>,

    raster: Arc<dyn GlyphRasterizer>,
    ramp: SymbolRamp,
    stops: ColorStops,
    deformer: Deformer,

    glyph_cache: GlyphCache,
    edge_cache: EdgeFieldCache,

    analyzer: SixBandAnalyzer,
    audio_feed: Option<AudioFeed>,
    audio: AudioSignal,

    postfx: PostFx,
    clock: AnimationClock,
}

impl std::fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession")
            .field("mode", &self.deformer.mode())
            .field("grid", &self.base.as_ref().map(LuminanceGrid::shape))
            .field("raster", &self.raster.name())
            .field("t", &self.clock.t())
            .finish_non_exhaustive()
    }
}

fn rasterizer_for(font_path: Option<&Path>, px: f32) -> GlyphwaveResult<Arc<dyn GlyphRasterizer>> {
    Ok(match font_path {
        Some(path) => Arc::new(FontRasterizer::from_path(path, px)?),
        None => Arc::new(BitmapFontRasterizer::new(px)),
    })
}

fn gray_to_rgb(gray: &Field2) -> RgbImage {
    let (rows, cols) = gray.shape();
    RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
        let v = (gray.get(y as usize, x as usize).clamp(0.0, 1.0) * 255.0).round() as u8;
        image::Rgb([v, v, v])
    })
}

impl RenderSession {
    /// Build a session from `config` (sanitized here).
    ///
    /// A configured font that cannot be loaded falls back to the built-in bitmap font.
    pub fn new(config: AnimatorConfig) -> Self {
        let config = config.sanitized();
        let raster = match rasterizer_for(config.font.path.as_deref(), config.font.px) {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(%err, "font unavailable; using the built-in bitmap font");
                Arc::new(BitmapFontRasterizer::new(config.font.px))
            }
        };
        let deformer = Deformer::select(config.mode, &config.mode_params());

        tracing::info!(
            edges = config.backends.edges.name(),
            blur = ?config.backends.blur,
            raster = %raster.name(),
            "render session backends"
        );

        Self {
            ramp: config.symbols.ramp(),
            stops: config.color_stops(),
            edge_cache: EdgeFieldCache::new(config.backends.edges, DEFAULT_EDGE_CACHE_CAPACITY),
            analyzer: SixBandAnalyzer::new(config.analyzer_settings()),
            audio: AudioSignal::Scalar(config.audio.fallback_level),
            postfx: PostFx::new(config.postfx),
            source: None,
            source_gray: None,
            base: None,
            morph_gray: None,
            morph_target: None,
            raster,
            deformer,
            glyph_cache: GlyphCache::new(),
            audio_feed: None,
            clock: AnimationClock::new(),
            config,
        }
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut AnimationClock {
        &mut self.clock
    }

    pub fn base_grid(&self) -> Option<&LuminanceGrid> {
        self.base.as_ref()
    }

    pub fn morph_target(&self) -> Option<&LuminanceGrid> {
        self.morph_target.as_ref()
    }

    pub fn source_image(&self) -> Option<&RgbImage> {
        self.source.as_ref()
    }

    pub fn deformer(&self) -> Deformer {
        self.deformer
    }

    pub fn rasterizer(&self) -> &Arc<dyn GlyphRasterizer> {
        &self.raster
    }

    pub fn ramp(&self) -> &SymbolRamp {
        &self.ramp
    }

    pub fn palette(&self) -> &ColorStops {
        &self.stops
    }

    pub fn glyph_cache(&self) -> &GlyphCache {
        &self.glyph_cache
    }

    pub fn edge_cache(&self) -> &EdgeFieldCache {
        &self.edge_cache
    }

    pub fn postfx(&self) -> &PostFx {
        &self.postfx
    }

    /// Audio signal fed to the audio modes on the next render.
    pub fn audio_signal(&self) -> AudioSignal {
        self.audio
    }

    /// Decode an image file and make it the source.
    pub fn load_image(&mut self, path: &Path) -> GlyphwaveResult<()> {
        let img = image::open(path)?.to_rgb8();
        tracing::info!(path = %path.display(), width = img.width(), height = img.height(), "image loaded");
        self.set_source_image(img)
    }

    pub fn set_source_image(&mut self, img: RgbImage) -> GlyphwaveResult<()> {
        if img.width() == 0 || img.height() == 0 {
            return Err(GlyphwaveError::validation("source image is empty"));
        }
        self.source_gray = Some(to_grayscale(&img));
        self.source = Some(img);
        self.rebuild_base_grid()
    }

    /// Use a seeded random polygon image as the source.
    pub fn generate_pattern(
        &mut self,
        width: usize,
        height: usize,
        shapes: usize,
        angularity: f32,
        seed: u64,
    ) -> GlyphwaveResult<()> {
        let gray = crate::grid::generate_pattern(width, height, shapes, angularity, seed);
        self.set_source_image(gray_to_rgb(&gray))
    }

    /// Decode the image morph mode blends towards.
    pub fn load_morph_target(&mut self, path: &Path) -> GlyphwaveResult<()> {
        let img = image::open(path)?.to_rgb8();
        self.set_morph_target_image(&img)
    }

    pub fn set_morph_target_image(&mut self, img: &RgbImage) -> GlyphwaveResult<()> {
        if img.width() == 0 || img.height() == 0 {
            return Err(GlyphwaveError::validation("morph target image is empty"));
        }
        self.morph_gray = Some(to_grayscale(img));
        self.refresh_morph_target()
    }

    pub fn clear_morph_target(&mut self) {
        self.morph_gray = None;
        self.morph_target = None;
    }

    fn refresh_morph_target(&mut self) -> GlyphwaveResult<()> {
        self.morph_target = match (&self.morph_gray, &self.base) {
            (Some(gray), Some(base)) => {
                let (rows, cols) = base.shape();
                let (grid, _, _) = resize_to_grid(gray, self.raster.cell(), Some(cols), Some(rows))?;
                Some(grid)
            }
            _ => None,
        };
        Ok(())
    }

    /// Select the render strategy. This is the "mode changed" hook.
    pub fn set_mode(&mut self, mode: AnimationMode) {
        if mode != self.deformer.mode() {
            if mode.uses_audio() {
                self.analyzer.reset();
            }
            self.glyph_cache.clear();
        }
        self.config.mode = mode;
        self.deformer = Deformer::select(mode, &self.config.mode_params());
        tracing::debug!(mode = mode.name(), "mode selected");
    }

    /// Switch font. `None` selects the built-in bitmap font.
    ///
    /// On failure the previous font stays active.
    pub fn set_font(&mut self, path: Option<&Path>, px: f32) -> GlyphwaveResult<()> {
        let px = if px.is_finite() { px.clamp(8.0, 64.0) } else { self.config.font.px };
        let raster = rasterizer_for(path, px)?;
        let cell_changed = raster.cell() != self.raster.cell();
        self.raster = raster;
        self.config.font.px = px;
        self.config.font.path = path.map(Path::to_path_buf);
        self.glyph_cache.clear();
        tracing::debug!(raster = %self.raster.name(), "font changed");
        let derived = self.config.grid.cols.is_none() || self.config.grid.rows.is_none();
        if cell_changed && derived && self.source_gray.is_some() {
            self.rebuild_base_grid()?;
        }
        Ok(())
    }

    /// A custom ramp with at least two characters wins over `preset`.
    pub fn set_ramp(&mut self, preset: RampPreset, custom: Option<&str>) {
        self.config.symbols.preset = preset;
        self.config.symbols.custom = custom
            .filter(|c| SymbolRamp::custom(c).is_some())
            .map(str::to_owned);
        self.ramp = self.config.symbols.ramp();
        self.glyph_cache.clear();
    }

    pub fn set_palette(&mut self, stops: ColorStops) {
        self.stops = stops;
        self.config.set_color_stops(&stops);
        self.glyph_cache.clear();
    }

    /// Set one gradient stop from hex text; bad text keeps the previous color.
    pub fn set_stop_hex(&mut self, i: usize, text: &str) -> bool {
        let changed = self.config.set_stop_hex(i, text);
        if changed {
            self.stops = self.config.color_stops();
            self.glyph_cache.clear();
        }
        changed
    }

    pub fn set_background_hex(&mut self, text: &str) -> bool {
        self.config.set_background_hex(text)
    }

    pub fn set_invert(&mut self, invert: bool) {
        self.config.layout.invert = invert;
    }

    /// `None` derives that side from the image and cell size.
    pub fn set_grid_size(&mut self, cols: Option<usize>, rows: Option<usize>) -> GlyphwaveResult<()> {
        self.config.grid.cols = cols.map(|c| c.clamp(8, 400));
        self.config.grid.rows = rows.map(|r| r.clamp(8, 240));
        if self.source_gray.is_some() {
            self.rebuild_base_grid()?;
        }
        Ok(())
    }

    pub fn set_cell_gap(&mut self, gap_x: u32, gap_y: u32) {
        self.config.layout.gap_x = gap_x.min(24);
        self.config.layout.gap_y = gap_y.min(24);
    }

    pub fn set_postfx(&mut self, settings: PostFxSettings) {
        self.config.postfx = settings;
        self.config = std::mem::take(&mut self.config).sanitized();
        self.postfx.set_settings(self.config.postfx);
    }

    pub fn set_speed_percent(&mut self, speed: f32) {
        self.config.speed_percent = speed;
        self.config = std::mem::take(&mut self.config).sanitized();
    }

    /// Replace the whole configuration, invalidating only what changed.
    pub fn apply_config(&mut self, config: AnimatorConfig) -> GlyphwaveResult<()> {
        let next = config.sanitized();
        let raster = if next.font != self.config.font {
            Some(rasterizer_for(next.font.path.as_deref(), next.font.px)?)
        } else {
            None
        };
        let prev = std::mem::replace(&mut self.config, next.clone());

        if let Some(raster) = raster {
            self.raster = raster;
            self.glyph_cache.clear();
        }
        if prev.symbols != next.symbols {
            self.ramp = next.symbols.ramp();
            self.glyph_cache.clear();
        }
        if prev.color.stops != next.color.stops {
            self.stops = next.color_stops();
            self.glyph_cache.clear();
        }
        if prev.backends.edges != next.backends.edges {
            self.edge_cache.set_backend(next.backends.edges);
            tracing::info!(edges = next.backends.edges.name(), "edge backend changed");
        }
        if prev.audio.sample_rate != next.audio.sample_rate
            || prev.audio.window_ms != next.audio.window_ms
        {
            self.analyzer = SixBandAnalyzer::new(next.analyzer_settings());
        }
        self.postfx.set_settings(next.postfx);
        self.set_mode(next.mode);
        if self.audio_feed.is_none() {
            self.audio = AudioSignal::Scalar(next.audio.fallback_level);
        }

        if (prev.grid != next.grid || prev.font != next.font) && self.source_gray.is_some() {
            self.rebuild_base_grid()?;
        }
        Ok(())
    }

    /// Feed audio modes from a live sample source.
    pub fn attach_audio(&mut self, feed: AudioFeed) {
        if feed.sample_rate() != self.analyzer.settings().sample_rate {
            self.analyzer = SixBandAnalyzer::with_sample_rate(feed.sample_rate());
        }
        self.audio_feed = Some(feed);
    }

    /// Back to the configured fallback level.
    pub fn detach_audio(&mut self) {
        self.audio_feed = None;
        self.analyzer.reset();
        self.audio = AudioSignal::Scalar(self.config.audio.fallback_level);
    }

    /// Analyze the newest audio block, when a feed is attached and the mode reacts to audio.
    pub fn refresh_audio(&mut self) -> AudioSignal {
        if let Some(feed) = &self.audio_feed
            && self.deformer.mode().uses_audio()
        {
            let bands: BandVector = feed.analyze(&mut self.analyzer);
            self.audio = AudioSignal::Bands(bands);
        }
        self.audio
    }

    /// Resample the source to the configured grid and reset the clock.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn rebuild_base_grid(&mut self) -> GlyphwaveResult<()> {
        let Some(gray) = &self.source_gray else {
            return Err(GlyphwaveError::validation("no source image loaded"));
        };
        let (grid, cols, rows) = resize_to_grid(
            gray,
            self.raster.cell(),
            self.config.grid.cols,
            self.config.grid.rows,
        )?;
        tracing::debug!(cols, rows, "base grid rebuilt");
        self.base = Some(grid);
        self.refresh_morph_target()?;
        self.clock.reset();
        Ok(())
    }

    fn edges_for_mode(&mut self) -> Option<Arc<EdgeData>> {
        if self.deformer.mode() != AnimationMode::AudioAlt {
            return None;
        }
        let gray = self.source_gray.as_ref()?;
        Some(self.edge_cache.get_edge_data(gray))
    }

    /// Deformed grid at time `t`.
    pub fn render_gray(&mut self, t: f64) -> GlyphwaveResult<LuminanceGrid> {
        let edges = self.edges_for_mode();
        let Some(base) = &self.base else {
            return Err(GlyphwaveError::validation("no source image loaded"));
        };
        let input = DeformInput {
            morph_target: self.morph_target.as_ref(),
            audio: self.audio,
            source: self.source.as_ref(),
            edges: edges.as_deref(),
        };
        Ok(self.deformer.deform(base, t, &input))
    }

    /// Render the colored glyph frame at time `t`.
    pub fn render_frame(&mut self, t: f64, opts: FrameOpts) -> GlyphwaveResult<RgbImage> {
        let mut grid = self.render_gray(t)?;
        if opts.for_preview {
            grid = shrink_for_preview(&grid, self.config.max_preview_cells)?;
        }
        let layout = self.config.glyph_layout();
        let cache = opts.use_cache.then_some(&mut self.glyph_cache);
        let img = build_colored_glyph_image(
            &grid,
            &self.ramp,
            self.raster.as_ref(),
            &self.stops,
            &layout,
            cache,
        );
        Ok(match (opts.apply_postfx, opts.for_preview) {
            (false, _) => img,
            (true, true) => self.postfx.apply_preview(&img),
            (true, false) => self.postfx.apply_export(&img),
        })
    }

    /// Render the preview frame at the clock's current time.
    pub fn render_preview(&mut self) -> GlyphwaveResult<RgbImage> {
        self.render_frame(self.clock.t(), FrameOpts::preview())
    }

    /// Advance the clock by one preview tick, refresh shake and audio. Returns the new time.
    pub fn tick(&mut self, base_dt: f64) -> f64 {
        let t = self.clock.advance(base_dt, self.config.speed_percent);
        self.postfx.update_shake();
        self.refresh_audio();
        t
    }

    /// Owned snapshot for a background export. Shares no cache with this session.
    pub fn export_renderer(&mut self, opts: ExportOptions) -> GlyphwaveResult<ExportRenderer> {
        let edges = self.edges_for_mode();
        let Some(base) = &self.base else {
            return Err(GlyphwaveError::validation("no source image loaded"));
        };
        Ok(ExportRenderer {
            base: base.clone(),
            morph_target: self.morph_target.clone(),
            source: self.source.clone(),
            edges,
            audio: self.audio,
            deformer: self.deformer,
            ramp: self.ramp.clone(),
            raster: Arc::clone(&self.raster),
            stops: self.stops,
            layout: self.config.glyph_layout(),
            postfx: PostFx::with_seed(self.config.postfx, opts.seed),
            speed_percent: self.config.speed_percent,
            opts,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_session.rs"]
mod tests;
