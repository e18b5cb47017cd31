//! Export sinks.
//!
//! Sinks consume fully composited RGB frames in export order. File sinks write to
//! `<out>.partial` and only rename onto the requested path once encoding succeeded, so a failed
//! or cancelled export never leaves a truncated file that looks valid.

/// `ffmpeg`-based MP4 sink (system `ffmpeg`).
pub mod ffmpeg;
/// Animated GIF sink.
pub mod gif;
/// Sink trait, configuration and the in-memory sink.
pub mod sink;

pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use gif::{GifSink, gif_frame_delay_ms};
pub use sink::{FrameSink, InMemorySink, PartialFile, SinkConfig};

use std::path::{Path, PathBuf};

/// Output container requested for an export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Gif,
    Mp4,
}

impl ExportFormat {
    /// Guess from a file extension; anything but `.gif` is treated as video.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gif") => Self::Gif,
            _ => Self::Mp4,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Mp4 => "mp4",
        }
    }

    /// File sink for this format writing to `out`.
    pub fn sink(self, out: impl Into<PathBuf>, crf: u8) -> Box<dyn FrameSink> {
        match self {
            Self::Gif => Box::new(GifSink::new(out)),
            Self::Mp4 => {
                let mut opts = FfmpegSinkOpts::new(out);
                opts.crf = crf;
                Box::new(FfmpegSink::new(opts))
            }
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = crate::GlyphwaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gif" => Ok(Self::Gif),
            "mp4" => Ok(Self::Mp4),
            other => Err(crate::GlyphwaveError::validation(format!(
                "unknown export format '{other}' (expected gif or mp4)"
            ))),
        }
    }
}
