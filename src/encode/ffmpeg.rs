use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};

use image::RgbImage;

use super::sink::{FrameSink, PartialFile, SinkConfig, check_frame};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};

const MISSING_FFMPEG_HINT: &str =
    "install ffmpeg and make sure it is on PATH, or export as GIF instead";

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    /// x264 constant rate factor (0 = lossless, 51 = worst).
    pub crf: u8,
    /// Color of the padding row/column added to odd-sized frames.
    pub pad_rgb: [u8; 3],
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            crf: 20,
            pad_rgb: [0, 0, 0],
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw RGB frames to its stdin.
///
/// Frames with odd sides are padded to even (yuv420p requirement) on the right/bottom.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    file: Option<PartialFile>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    padded: (u32, u32),
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl std::fmt::Debug for FfmpegSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSink")
            .field("opts", &self.opts)
            .field("cfg", &self.cfg)
            .field("running", &self.child.is_some())
            .finish()
    }
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            file: None,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            padded: (0, 0),
            cfg: None,
            last_idx: None,
        }
    }

    /// Container passed to `-f`, from the target extension.
    fn container(&self) -> &'static str {
        match self
            .opts
            .out_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("mov") => "mov",
            Some("mkv") => "matroska",
            _ => "mp4",
        }
    }

    fn pad_frame(&mut self, frame: &RgbImage) {
        let (pw, ph) = self.padded;
        let src_stride = frame.width() as usize * 3;
        let dst_stride = pw as usize * 3;
        for (y, dst) in self.scratch.chunks_exact_mut(dst_stride).enumerate() {
            if y < frame.height() as usize {
                let src = &frame.as_raw()[y * src_stride..(y + 1) * src_stride];
                dst[..src_stride].copy_from_slice(src);
                for px in dst[src_stride..].chunks_exact_mut(3) {
                    px.copy_from_slice(&self.opts.pad_rgb);
                }
            } else {
                for px in dst.chunks_exact_mut(3) {
                    px.copy_from_slice(&self.opts.pad_rgb);
                }
            }
        }
        debug_assert_eq!(self.scratch.len(), dst_stride * ph as usize);
    }

    fn kill(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

/// Even dimensions that fit `(w, h)`.
pub(crate) fn even_size(w: u32, h: u32) -> (u32, u32) {
    (w + (w & 1), h + (h & 1))
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> GlyphwaveResult<()> {
        cfg.validate()?;
        if !is_ffmpeg_on_path() {
            return Err(GlyphwaveError::export(
                "ffmpeg is required for MP4 export, but was not found on PATH",
                MISSING_FFMPEG_HINT,
            ));
        }
        let file = PartialFile::new(&self.opts.out_path)?;
        let (pw, ph) = even_size(cfg.width, cfg.height);

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{pw}x{ph}"),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args([
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-crf",
            &self.opts.crf.min(51).to_string(),
            "-movflags",
            "+faststart",
            "-f",
            self.container(),
        ])
        .arg(file.partial());

        let mut child = cmd.spawn().map_err(|e| {
            GlyphwaveError::export(format!("failed to spawn ffmpeg: {e}"), MISSING_FFMPEG_HINT)
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GlyphwaveError::render("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| GlyphwaveError::render("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        tracing::debug!(path = %file.partial().display(), width = pw, height = ph, "ffmpeg sink started");
        self.scratch = vec![0u8; pw as usize * ph as usize * 3];
        self.padded = (pw, ph);
        self.file = Some(file);
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> GlyphwaveResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| GlyphwaveError::render("ffmpeg sink not started"))?;
        check_frame(&cfg, self.last_idx, idx, frame)?;
        self.last_idx = Some(idx);

        let data: &[u8] = if self.padded == frame.dimensions() {
            frame.as_raw()
        } else {
            self.pad_frame(frame);
            &self.scratch
        };
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(GlyphwaveError::render("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        if let Err(e) = stdin.write_all(data) {
            self.abort();
            return Err(GlyphwaveError::export(
                format!("failed to write frame {} to ffmpeg: {e}", idx.0),
                "ffmpeg exited early; re-run with RUST_LOG=debug for its output",
            ));
        }
        Ok(())
    }

    fn end(&mut self) -> GlyphwaveResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| GlyphwaveError::render("ffmpeg sink not started"))?;
        let file = self
            .file
            .take()
            .ok_or_else(|| GlyphwaveError::render("ffmpeg sink not started"))?;

        let status = child.wait();
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle.join().ok().and_then(Result::ok).unwrap_or_default(),
            None => Vec::new(),
        };
        let status = match status {
            Ok(status) => status,
            Err(e) => {
                file.discard();
                return Err(GlyphwaveError::export(
                    format!("failed to wait for ffmpeg to finish: {e}"),
                    "retry the export",
                ));
            }
        };
        if !status.success() {
            file.discard();
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(GlyphwaveError::export(
                format!("ffmpeg exited with status {status}: {}", stderr.trim()),
                "check that your ffmpeg build includes libx264, or export as GIF",
            ));
        }
        if let Err(e) = file.commit() {
            file.discard();
            return Err(e);
        }
        tracing::info!(path = %file.target().display(), "video written");
        self.cfg = None;
        Ok(())
    }

    fn abort(&mut self) {
        self.kill();
        if let Some(file) = self.file.take() {
            file.discard();
        }
        self.cfg = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() || self.file.is_some() {
            self.abort();
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // Rational rate before `-i` applies to the rawvideo input.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
