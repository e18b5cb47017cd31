use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;

use image::RgbImage;
use image::imageops::FilterType;

use crate::config::ExportConfig;
use crate::deform::{AudioSignal, DeformInput, Deformer};
use crate::edges::EdgeData;
use crate::encode::{ExportFormat, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};
use crate::glyph::{ColorStops, GlyphLayout, GlyphRasterizer, SymbolRamp, build_colored_glyph_image};
use crate::grid::LuminanceGrid;
use crate::postfx::PostFx;

/// Animation times of an export: `t_i = i·(speed/100)/fps`.
///
/// Independent of how long frames take to render.
pub fn export_timestamps(frames: u32, fps: Fps, speed_percent: f32) -> Vec<f64> {
    let speed = f64::from(speed_percent.max(0.0)) / 100.0;
    (0..u64::from(frames))
        .map(|i| fps.frame_time(FrameIndex(i), speed))
        .collect()
}

/// Output parameters of one export run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub frames: u32,
    pub fps: Fps,
    /// Nearest-neighbour scale applied after the target resize; 1.0 disables it.
    pub upscale: f32,
    /// Nearest-neighbour resize target, used only when both sides are set.
    pub target: Option<(u32, u32)>,
    pub looping: bool,
    pub crf: u8,
    /// Seed of the shake sequence, so repeated exports match.
    pub seed: u64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Gif,
            frames: 120,
            fps: Fps { num: 30, den: 1 },
            upscale: 1.0,
            target: None,
            looping: true,
            crf: 20,
            seed: 0,
        }
    }
}

impl ExportOptions {
    pub fn from_config(cfg: &ExportConfig) -> GlyphwaveResult<Self> {
        Ok(Self {
            format: cfg.format,
            frames: cfg.frames,
            fps: Fps::whole(cfg.fps)?,
            upscale: cfg.upscale,
            target: cfg.target_width.zip(cfg.target_height),
            looping: cfg.looping,
            crf: cfg.crf,
            seed: cfg.seed,
        })
    }

    fn upscale_active(&self) -> bool {
        self.upscale.is_finite() && self.upscale > 0.0 && (self.upscale - 1.0).abs() > 1e-6
    }

    /// Final frame size for a rendered frame of `w`x`h`.
    pub fn output_size(&self, w: u32, h: u32) -> (u32, u32) {
        let (w, h) = self.target.map_or((w, h), |(tw, th)| (tw.max(1), th.max(1)));
        if !self.upscale_active() {
            return (w, h);
        }
        let scale = |v: u32| ((v as f32 * self.upscale).floor() as u32).max(1);
        (scale(w), scale(h))
    }
}

/// Progress report sent after every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportProgress {
    /// Frames handed to the sink so far.
    pub done: u32,
    pub total: u32,
}

impl ExportProgress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.done as f32 / self.total as f32
    }
}

/// How an export run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    Completed { frames: u32 },
    /// Stopped between frames; the sink was aborted and its partial output removed.
    Cancelled { frames: u32 },
}

/// Shared cancellation flag, checked between frames.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Self-contained renderer for one export.
///
/// Holds owned copies of everything it reads, renders without a glyph cache, keeps the audio
/// signal frozen at its snapshot value and draws shake from its own seeded generator.
pub struct ExportRenderer {
    pub(crate) base: LuminanceGrid,
    pub(crate) morph_target: Option<LuminanceGrid>,
    pub(crate) source: Option<RgbImage>,
    pub(crate) edges: Option<Arc<EdgeData>>,
    pub(crate) audio: AudioSignal,
    pub(crate) deformer: Deformer,
    pub(crate) ramp: SymbolRamp,
    pub(crate) raster: Arc<dyn GlyphRasterizer>,
    pub(crate) stops: ColorStops,
    pub(crate) layout: GlyphLayout,
    pub(crate) postfx: PostFx,
    pub(crate) speed_percent: f32,
    pub(crate) opts: ExportOptions,
}

impl std::fmt::Debug for ExportRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportRenderer")
            .field("mode", &self.deformer.mode())
            .field("grid", &self.base.shape())
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl ExportRenderer {
    pub fn options(&self) -> &ExportOptions {
        &self.opts
    }

    pub fn timestamps(&self) -> Vec<f64> {
        export_timestamps(self.opts.frames, self.opts.fps, self.speed_percent)
    }

    /// Size of every frame handed to the sink.
    pub fn frame_size(&self) -> (u32, u32) {
        let (rows, cols) = self.base.shape();
        let (w, h) = self.layout.image_size(rows, cols, self.raster.cell());
        self.opts.output_size(w, h)
    }

    /// Glyph image at `t`, resized and upscaled, before post-fx.
    pub fn render_glyphs(&self, t: f64) -> RgbImage {
        let input = DeformInput {
            morph_target: self.morph_target.as_ref(),
            audio: self.audio,
            source: self.source.as_ref(),
            edges: self.edges.as_deref(),
        };
        let grid = self.deformer.deform(&self.base, t, &input);
        let img = build_colored_glyph_image(
            &grid,
            &self.ramp,
            self.raster.as_ref(),
            &self.stops,
            &self.layout,
            None,
        );
        let (w, h) = self.opts.output_size(img.width(), img.height());
        if (w, h) == img.dimensions() {
            img
        } else {
            image::imageops::resize(&img, w, h, FilterType::Nearest)
        }
    }

    /// Next export frame at `t`: glyphs, then a fresh shake offset and the exact post-fx tier.
    pub fn render_frame(&mut self, t: f64) -> RgbImage {
        let img = self.render_glyphs(t);
        self.postfx.update_shake();
        self.postfx.apply_export(&img)
    }

    /// Render every frame in time order into `sink`.
    ///
    /// `cancel` is checked before each frame; on cancellation or any sink error the sink is
    /// aborted so no partial file is left behind.
    #[tracing::instrument(level = "info", skip_all, fields(frames = self.opts.frames, format = ?self.opts.format))]
    pub fn run(
        &mut self,
        sink: &mut dyn FrameSink,
        cancel: &CancelToken,
        mut progress: impl FnMut(ExportProgress),
    ) -> GlyphwaveResult<ExportOutcome> {
        let (width, height) = self.frame_size();
        let cfg = SinkConfig {
            width,
            height,
            fps: self.opts.fps,
            looping: self.opts.looping,
        };
        if let Err(err) = sink.begin(cfg) {
            sink.abort();
            return Err(err);
        }

        let total = self.opts.frames;
        for (i, t) in self.timestamps().into_iter().enumerate() {
            if cancel.is_cancelled() {
                sink.abort();
                tracing::info!(done = i, total, "export cancelled");
                return Ok(ExportOutcome::Cancelled { frames: i as u32 });
            }
            let frame = self.render_frame(t);
            if let Err(err) = sink.push_frame(FrameIndex(i as u64), &frame) {
                sink.abort();
                return Err(err);
            }
            progress(ExportProgress {
                done: i as u32 + 1,
                total,
            });
        }

        if let Err(err) = sink.end() {
            sink.abort();
            return Err(err);
        }
        tracing::info!(frames = total, width, height, "export finished");
        Ok(ExportOutcome::Completed { frames: total })
    }
}

/// Export running on a worker thread.
pub struct ExportJob {
    handle: Option<JoinHandle<GlyphwaveResult<ExportOutcome>>>,
    cancel: CancelToken,
    progress: mpsc::Receiver<ExportProgress>,
}

impl ExportJob {
    /// Start `renderer` on a new thread feeding `sink`.
    pub fn spawn(mut renderer: ExportRenderer, mut sink: Box<dyn FrameSink>) -> GlyphwaveResult<Self> {
        let cancel = CancelToken::new();
        let (tx, rx) = mpsc::channel();
        let worker_cancel = cancel.clone();
        let handle = std::thread::Builder::new()
            .name("glyphwave-export".to_owned())
            .spawn(move || {
                renderer.run(sink.as_mut(), &worker_cancel, |p| {
                    // The receiver may have been dropped; the export still completes.
                    let _ = tx.send(p);
                })
            })?;
        Ok(Self {
            handle: Some(handle),
            cancel,
            progress: rx,
        })
    }

    /// Request cancellation at the next frame boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn progress(&self) -> &mpsc::Receiver<ExportProgress> {
        &self.progress
    }

    /// Newest progress report received since the last call, if any.
    pub fn latest_progress(&self) -> Option<ExportProgress> {
        self.progress.try_iter().last()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the worker and return its outcome.
    pub fn join(mut self) -> GlyphwaveResult<ExportOutcome> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| GlyphwaveError::export("export job already joined", "start a new export"))?;
        handle.join().map_err(|_| {
            GlyphwaveError::export(
                "export worker panicked",
                "retry the export; report the issue if it persists",
            )
        })?
    }
}

impl Drop for ExportJob {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/export.rs"]
mod tests;
