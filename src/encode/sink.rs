use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    pub fps: Fps,
    /// Loop playback (GIF only).
    pub looping: bool,
}

impl SinkConfig {
    pub fn validate(&self) -> GlyphwaveResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GlyphwaveError::validation("sink width/height must be non-zero"));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(GlyphwaveError::validation("fps must be non-zero"));
        }
        Ok(())
    }
}

/// Consumer of exported frames.
///
/// Ordering contract: `push_frame` is called with strictly increasing [`FrameIndex`] values, and
/// every frame already has the configured size and all post-effects applied.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> GlyphwaveResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> GlyphwaveResult<()>;
    /// Finalize the output. Called once after the last frame.
    fn end(&mut self) -> GlyphwaveResult<()>;
    /// Discard everything written so far. Called on cancellation or after a failed frame.
    fn abort(&mut self) {}
}

/// In-memory sink for tests and previews of an export.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, RgbImage)>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub fn frames(&self) -> &[(FrameIndex, RgbImage)] {
        &self.frames
    }

    /// `true` once `end` ran without a later `begin` or `abort`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> GlyphwaveResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> GlyphwaveResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| GlyphwaveError::render("in-memory sink not started"))?;
        check_frame(&cfg, self.frames.last().map(|(i, _)| *i), idx, frame)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> GlyphwaveResult<()> {
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.frames.clear();
        self.finished = false;
    }
}

/// Shared size and ordering checks for sinks.
pub(crate) fn check_frame(
    cfg: &SinkConfig,
    last: Option<FrameIndex>,
    idx: FrameIndex,
    frame: &RgbImage,
) -> GlyphwaveResult<()> {
    if let Some(last) = last
        && idx <= last
    {
        return Err(GlyphwaveError::render(format!(
            "out-of-order frame index {} after {}",
            idx.0, last.0
        )));
    }
    if frame.dimensions() != (cfg.width, cfg.height) {
        return Err(GlyphwaveError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width(),
            frame.height(),
            cfg.width,
            cfg.height
        )));
    }
    Ok(())
}

/// Output file written under a temporary `.partial` name until committed.
#[derive(Debug)]
pub struct PartialFile {
    target: PathBuf,
    partial: PathBuf,
}

impl PartialFile {
    /// Prepare `target` for writing: create its directory and pick the partial path.
    pub fn new(target: impl Into<PathBuf>) -> GlyphwaveResult<Self> {
        let target = target.into();
        ensure_parent_dir(&target)?;
        let mut name = target.clone().into_os_string();
        name.push(".partial");
        Ok(Self {
            target,
            partial: PathBuf::from(name),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Path the encoder should write to.
    pub fn partial(&self) -> &Path {
        &self.partial
    }

    /// Move the finished partial file onto the target path.
    pub fn commit(&self) -> GlyphwaveResult<()> {
        std::fs::rename(&self.partial, &self.target).map_err(|e| {
            GlyphwaveError::export(
                format!("failed to move output into place at '{}': {e}", self.target.display()),
                "check write permissions for the output directory",
            )
        })
    }

    /// Remove the partial file if it exists.
    pub fn discard(&self) {
        match std::fs::remove_file(&self.partial) {
            Ok(()) => tracing::debug!(path = %self.partial.display(), "removed partial output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.partial.display(), error = %e, "failed to remove partial output")
            }
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> GlyphwaveResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
