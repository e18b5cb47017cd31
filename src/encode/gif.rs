use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbImage, RgbaImage};

use super::sink::{FrameSink, PartialFile, SinkConfig, check_frame};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};

/// NeuQuant speed for palette quantization (1 = best, 30 = fastest).
const QUANTIZE_SPEED: i32 = 10;

/// Per-frame delay in milliseconds: `1000 / fps`, at least 10 ms (most viewers ignore less).
pub fn gif_frame_delay_ms(fps: Fps) -> u32 {
    if fps.num == 0 {
        return 10;
    }
    (1000 * u64::from(fps.den) / u64::from(fps.num)).clamp(10, u64::from(u32::MAX)) as u32
}

/// First I/O failure seen by a [`TrackedWriter`].
type WriteFailure = Arc<Mutex<Option<String>>>;

/// Buffered file writer that remembers its first error.
///
/// The GIF encoder writes its trailer and flushes only when dropped, where errors are otherwise
/// lost.
struct TrackedWriter {
    inner: BufWriter<File>,
    failure: WriteFailure,
}

impl TrackedWriter {
    fn record<T>(&self, res: std::io::Result<T>) -> std::io::Result<T> {
        if let Err(e) = &res
            && let Ok(mut slot) = self.failure.lock()
        {
            slot.get_or_insert_with(|| e.to_string());
        }
        res
    }
}

impl Write for TrackedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let res = self.inner.write(buf);
        self.record(res)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let res = self.inner.flush();
        self.record(res)
    }
}

impl Drop for TrackedWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Animated GIF sink built on the `image` GIF encoder.
pub struct GifSink {
    out: PathBuf,
    file: Option<PartialFile>,
    encoder: Option<GifEncoder<TrackedWriter>>,
    failure: WriteFailure,
    cfg: Option<SinkConfig>,
    delay: Delay,
    last_idx: Option<FrameIndex>,
}

impl std::fmt::Debug for GifSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GifSink")
            .field("out", &self.out)
            .field("cfg", &self.cfg)
            .field("started", &self.encoder.is_some())
            .finish()
    }
}

impl GifSink {
    pub fn new(out: impl Into<PathBuf>) -> Self {
        Self {
            out: out.into(),
            file: None,
            encoder: None,
            failure: WriteFailure::default(),
            cfg: None,
            delay: Delay::from_numer_denom_ms(100, 1),
            last_idx: None,
        }
    }

    fn fail(&mut self, message: String) -> GlyphwaveError {
        self.abort();
        GlyphwaveError::export(message, "check free disk space and write permissions")
    }
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> GlyphwaveResult<()> {
        cfg.validate()?;
        if cfg.width > u32::from(u16::MAX) || cfg.height > u32::from(u16::MAX) {
            return Err(GlyphwaveError::validation(format!(
                "GIF frames are limited to 65535x65535, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        let file = PartialFile::new(&self.out)?;
        let handle = File::create(file.partial()).map_err(|e| {
            GlyphwaveError::export(
                format!("failed to create '{}': {e}", file.partial().display()),
                "check write permissions for the output directory",
            )
        })?;
        self.failure = WriteFailure::default();
        let writer = TrackedWriter {
            inner: BufWriter::new(handle),
            failure: Arc::clone(&self.failure),
        };
        let mut encoder = GifEncoder::new_with_speed(writer, QUANTIZE_SPEED);
        if cfg.looping
            && let Err(e) = encoder.set_repeat(Repeat::Infinite)
        {
            drop(encoder);
            file.discard();
            return Err(GlyphwaveError::export(
                format!("failed to set GIF loop: {e}"),
                "retry the export",
            ));
        }
        self.delay = Delay::from_numer_denom_ms(gif_frame_delay_ms(cfg.fps), 1);
        tracing::debug!(path = %file.partial().display(), delay = ?self.delay, "gif sink started");
        self.file = Some(file);
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> GlyphwaveResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| GlyphwaveError::render("gif sink not started"))?;
        check_frame(&cfg, self.last_idx, idx, frame)?;
        self.last_idx = Some(idx);

        let rgba: RgbaImage = image::DynamicImage::ImageRgb8(frame.clone()).into_rgba8();
        let Some(encoder) = self.encoder.as_mut() else {
            return Err(GlyphwaveError::render("gif sink is already finalized"));
        };
        if let Err(e) = encoder.encode_frame(Frame::from_parts(rgba, 0, 0, self.delay)) {
            return Err(self.fail(format!("failed to encode GIF frame {}: {e}", idx.0)));
        }
        Ok(())
    }

    fn end(&mut self) -> GlyphwaveResult<()> {
        // Dropping the encoder writes the GIF trailer and flushes the file.
        drop(self.encoder.take());
        let file = self
            .file
            .take()
            .ok_or_else(|| GlyphwaveError::render("gif sink not started"))?;
        self.cfg = None;
        let failure = self.failure.lock().ok().and_then(|mut slot| slot.take());
        if let Some(e) = failure {
            file.discard();
            return Err(GlyphwaveError::export(
                format!("failed to write '{}': {e}", file.partial().display()),
                "check free disk space and write permissions",
            ));
        }
        if let Err(e) = file.commit() {
            file.discard();
            return Err(e);
        }
        tracing::info!(path = %file.target().display(), "gif written");
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.encoder.take());
        if let Some(file) = self.file.take() {
            file.discard();
        }
        self.cfg = None;
    }
}

impl Drop for GifSink {
    fn drop(&mut self) {
        if self.file.is_some() {
            self.abort();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
