//! Animator configuration, loadable from JSON.
//!
//! Every field has a default and a valid range. [`AnimatorConfig::sanitized`] pulls
//! out-of-range or non-finite numbers back into range and replaces colors that do not parse,
//! logging a warning for each repair instead of failing.

use std::path::{Path, PathBuf};

use crate::audio::AnalyzerSettings;
use crate::blur::BlurBackend;
use crate::deform::{AnimationMode, ContourParams, ModeParams, OverlayParams, WaveParams};
use crate::edges::EdgeBackend;
use crate::encode::ExportFormat;
use crate::foundation::core::Rgb8;
use crate::foundation::error::GlyphwaveResult;
use crate::glyph::{ColorStops, GlyphLayout, RampPreset, STOP_COUNT, SymbolRamp, parse_hex, to_hex};
use crate::postfx::PostFxSettings;

/// Default maximum grid side used by the preview path.
pub const DEFAULT_MAX_PREVIEW_CELLS: usize = 120;

const WHITE: &str = "#FFFFFF";
const BLACK: &str = "#000000";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub grid: GridConfig,
    pub font: FontConfig,
    pub symbols: SymbolConfig,
    pub color: ColorConfig,
    pub mode: AnimationMode,
    /// Animation speed, 100 = real time.
    pub speed_percent: f32,
    pub waves: WaveParams,
    pub audio: AudioConfig,
    pub contour: ContourParams,
    pub overlay: OverlayParams,
    pub postfx: PostFxSettings,
    pub layout: LayoutConfig,
    pub backends: BackendConfig,
    pub export: ExportConfig,
    /// Longest grid side rendered in preview; larger grids are shrunk first.
    pub max_preview_cells: usize,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            font: FontConfig::default(),
            symbols: SymbolConfig::default(),
            color: ColorConfig::default(),
            mode: AnimationMode::default(),
            speed_percent: 100.0,
            waves: WaveParams::default(),
            audio: AudioConfig::default(),
            contour: ContourParams::default(),
            overlay: OverlayParams::default(),
            postfx: PostFxSettings::default(),
            layout: LayoutConfig::default(),
            backends: BackendConfig::default(),
            export: ExportConfig::default(),
            max_preview_cells: DEFAULT_MAX_PREVIEW_CELLS,
        }
    }
}

/// Grid size; `None` derives the side from the image and cell size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cols: Option<usize>,
    pub rows: Option<usize>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: Some(40),
            rows: Some(40),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Display name; informational only.
    pub family: Option<String>,
    pub px: f32,
    /// TrueType/OpenType file. Without one the built-in bitmap font is used.
    pub path: Option<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: None,
            px: 16.0,
            path: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    pub preset: RampPreset,
    /// Used instead of the preset when it has at least two characters.
    pub custom: Option<String>,
}

impl SymbolConfig {
    pub fn ramp(&self) -> SymbolRamp {
        SymbolRamp::select(self.preset, self.custom.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Gradient anchors as `#RRGGBB`, darkest luminance first.
    pub stops: [String; STOP_COUNT],
    pub background: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            stops: std::array::from_fn(|_| WHITE.to_owned()),
            background: BLACK.to_owned(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Amplitude gain per unit of audio level.
    pub gain: f32,
    pub sample_rate: u32,
    pub window_ms: f32,
    /// Level used by audio modes when no capture device is running.
    pub fallback_level: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let analyzer = AnalyzerSettings::default();
        Self {
            gain: crate::deform::DEFAULT_AUDIO_GAIN,
            sample_rate: analyzer.sample_rate,
            window_ms: analyzer.window_ms,
            fallback_level: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub gap_x: u32,
    pub gap_y: u32,
    pub invert: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub edges: EdgeBackend,
    pub blur: BlurBackend,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    pub frames: u32,
    pub fps: u32,
    /// Nearest-neighbour scale applied after the target resize.
    pub upscale: f32,
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub crf: u8,
    /// Seed for the export's shake sequence.
    pub seed: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Gif,
            frames: 120,
            fps: 30,
            upscale: 1.0,
            target_width: None,
            target_height: None,
            looping: true,
            crf: 20,
            seed: 0,
        }
    }
}

/// Clamp `v` into `[lo, hi]`; non-finite values become `default`.
fn fit(name: &str, v: &mut f32, lo: f32, hi: f32, default: f32) {
    let old = *v;
    let fixed = if old.is_finite() { old.clamp(lo, hi) } else { default };
    if fixed != old {
        tracing::warn!(field = name, value = old, fixed, "config value out of range");
        *v = fixed;
    }
}

fn fit_int<T>(name: &str, v: &mut T, lo: T, hi: T)
where
    T: Ord + Copy + std::fmt::Display,
{
    let old = *v;
    let fixed = old.clamp(lo, hi);
    if fixed != old {
        tracing::warn!(field = name, value = %old, fixed = %fixed, "config value out of range");
        *v = fixed;
    }
}

fn fit_color(name: &str, text: &mut String, default: &str) {
    match parse_hex(text) {
        Some(c) => *text = to_hex(c),
        None => {
            tracing::warn!(field = name, value = %text, "malformed color; using default");
            *text = default.to_owned();
        }
    }
}

impl AnimatorConfig {
    /// Read and sanitize a JSON config file.
    pub fn load(path: &Path) -> GlyphwaveResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config '{}'", path.display()))?;
        Ok(cfg.sanitized())
    }

    pub fn from_json(text: &str) -> GlyphwaveResult<Self> {
        use anyhow::Context as _;
        let cfg: Self = serde_json::from_str(text).context("failed to parse config")?;
        Ok(cfg.sanitized())
    }

    pub fn to_json_pretty(&self) -> GlyphwaveResult<String> {
        use anyhow::Context as _;
        Ok(serde_json::to_string_pretty(self).context("failed to serialize config")?)
    }

    /// Every numeric field pulled into its range and every color repaired.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();

        if let Some(c) = self.grid.cols.as_mut() {
            fit_int("grid.cols", c, 8, 400);
        }
        if let Some(r) = self.grid.rows.as_mut() {
            fit_int("grid.rows", r, 8, 240);
        }
        fit("font.px", &mut self.font.px, 8.0, 64.0, d.font.px);
        if self
            .symbols
            .custom
            .as_deref()
            .is_some_and(|c| SymbolRamp::custom(c).is_none())
        {
            tracing::warn!("custom ramp needs at least two characters; using the preset");
            self.symbols.custom = None;
        }
        for (i, stop) in self.color.stops.iter_mut().enumerate() {
            fit_color(&format!("color.stops[{i}]"), stop, WHITE);
        }
        fit_color("color.background", &mut self.color.background, BLACK);
        fit("speed_percent", &mut self.speed_percent, 1.0, 1000.0, d.speed_percent);

        let w = &mut self.waves;
        fit("waves.freq_x", &mut w.freq_x, 0.0, 3.0, d.waves.freq_x);
        fit("waves.freq_y", &mut w.freq_y, 0.0, 3.0, d.waves.freq_y);
        fit("waves.speed_x", &mut w.speed_x, -3.0, 3.0, d.waves.speed_x);
        fit("waves.speed_y", &mut w.speed_y, -3.0, 3.0, d.waves.speed_y);
        fit("waves.amplitude", &mut w.amplitude, 0.0, 2.0, d.waves.amplitude);
        fit("waves.contrast", &mut w.contrast, 0.5, 2.5, d.waves.contrast);

        let a = &mut self.audio;
        fit("audio.gain", &mut a.gain, 0.0, 20.0, d.audio.gain);
        fit_int("audio.sample_rate", &mut a.sample_rate, 8_000, 192_000);
        fit("audio.window_ms", &mut a.window_ms, 5.0, 200.0, d.audio.window_ms);
        fit("audio.fallback_level", &mut a.fallback_level, 0.0, 1.0, 0.0);

        let c = &mut self.contour;
        fit("contour.edge_sensitivity", &mut c.edge_sensitivity, 0.0, 1.0, d.contour.edge_sensitivity);
        fit_int("contour.edge_blur", &mut c.edge_blur, 0, 5);
        fit("contour.wave_speed", &mut c.wave_speed, 0.0, 2.0, d.contour.wave_speed);
        fit("contour.amplitude", &mut c.amplitude, 0.0, 1.0, d.contour.amplitude);
        fit_int("contour.layers", &mut c.layers, 1, 5);
        fit("contour.glow", &mut c.glow, 0.0, 1.0, d.contour.glow);

        let o = &mut self.overlay;
        let od = d.overlay;
        fit("overlay.rays_length", &mut o.rays_length, 5.0, 200.0, od.rays_length);
        fit("overlay.rays_intensity", &mut o.rays_intensity, 0.0, 5.0, od.rays_intensity);
        fit_int("overlay.echo_lines", &mut o.echo_lines, 0, 12);
        fit("overlay.echo_spacing", &mut o.echo_spacing, 2.0, 40.0, od.echo_spacing);
        fit("overlay.echo_band", &mut o.echo_band, 1.0, 12.0, od.echo_band);
        fit("overlay.sparkles_density", &mut o.sparkles_density, 0.0, 1.0, od.sparkles_density);
        fit("overlay.sparkles_gain", &mut o.sparkles_gain, 0.0, 10.0, od.sparkles_gain);
        fit("overlay.background_intensity", &mut o.background_intensity, 0.0, 2.0, od.background_intensity);
        fit("overlay.background_speed", &mut o.background_speed, 0.0, 5.0, od.background_speed);

        let crt = &mut self.postfx.crt;
        let cd = d.postfx.crt;
        fit("postfx.crt.scanlines", &mut crt.scanlines, 0.0, 1.0, cd.scanlines);
        fit("postfx.crt.vignette", &mut crt.vignette, 0.0, 1.0, cd.vignette);
        fit("postfx.crt.rgb_shift", &mut crt.rgb_shift, 0.0, 1.0, cd.rgb_shift);
        fit("postfx.crt.shake", &mut crt.shake, 0.0, 3.0, cd.shake);
        let glow = &mut self.postfx.glow;
        let gd = d.postfx.glow;
        fit("postfx.glow.intensity", &mut glow.intensity, 0.0, 2.0, gd.intensity);
        fit_int("postfx.glow.radius", &mut glow.radius, 5, 50);
        fit("postfx.glow.bloom", &mut glow.bloom, 0.0, 1.0, gd.bloom);

        fit_int("layout.gap_x", &mut self.layout.gap_x, 0, 24);
        fit_int("layout.gap_y", &mut self.layout.gap_y, 0, 24);

        let e = &mut self.export;
        fit_int("export.frames", &mut e.frames, 2, 600);
        fit_int("export.fps", &mut e.fps, 1, 300);
        fit("export.upscale", &mut e.upscale, 0.1, 8.0, 1.0);
        if let Some(tw) = e.target_width.as_mut() {
            fit_int("export.target_width", tw, 100, 10_000);
        }
        if let Some(th) = e.target_height.as_mut() {
            fit_int("export.target_height", th, 100, 10_000);
        }
        fit_int("export.crf", &mut e.crf, 0, 51);

        if self.max_preview_cells == 0 {
            tracing::warn!("max_preview_cells must be positive; using the default");
            self.max_preview_cells = DEFAULT_MAX_PREVIEW_CELLS;
        }
        self
    }

    /// Set stop `i` from hex text; the previous color is kept when the text does not parse.
    /// Returns whether the stop changed.
    pub fn set_stop_hex(&mut self, i: usize, text: &str) -> bool {
        let (Some(slot), Some(c)) = (self.color.stops.get_mut(i), parse_hex(text)) else {
            tracing::warn!(index = i, value = text, "rejected color stop");
            return false;
        };
        let hex = to_hex(c);
        let changed = *slot != hex;
        *slot = hex;
        changed
    }

    /// Set the background from hex text; the previous color is kept when the text does not
    /// parse. Returns whether it changed.
    pub fn set_background_hex(&mut self, text: &str) -> bool {
        let Some(c) = parse_hex(text) else {
            tracing::warn!(value = text, "rejected background color");
            return false;
        };
        let hex = to_hex(c);
        let changed = self.color.background != hex;
        self.color.background = hex;
        changed
    }

    pub fn color_stops(&self) -> ColorStops {
        let white = image::Rgb([255, 255, 255]);
        ColorStops::new(std::array::from_fn(|i| {
            parse_hex(&self.color.stops[i]).unwrap_or(white)
        }))
    }

    /// Store `stops` as hex text.
    pub fn set_color_stops(&mut self, stops: &ColorStops) {
        self.color.stops = std::array::from_fn(|i| to_hex(stops.get(i)));
    }

    pub fn background(&self) -> Rgb8 {
        parse_hex(&self.color.background).unwrap_or(image::Rgb([0, 0, 0]))
    }

    pub fn glyph_layout(&self) -> GlyphLayout {
        GlyphLayout {
            gap_x: self.layout.gap_x,
            gap_y: self.layout.gap_y,
            invert: self.layout.invert,
            background: self.background(),
        }
    }

    pub fn mode_params(&self) -> ModeParams {
        ModeParams {
            waves: self.waves,
            audio_gain: self.audio.gain,
            contour: self.contour,
            overlay: self.overlay,
            blur: self.backends.blur,
        }
    }

    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            sample_rate: self.audio.sample_rate,
            window_ms: self.audio.window_ms,
            ..AnalyzerSettings::default()
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
