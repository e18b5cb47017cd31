use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};

use super::AudioFeed;
use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};

/// Default-input-device capture writing mono samples into an [`AudioFeed`].
///
/// The stream stops when this value is dropped.
pub struct MicCapture {
    _stream: cpal::Stream,
    feed: AudioFeed,
}

impl MicCapture {
    /// Open the default input device and start streaming into a fresh feed.
    pub fn start() -> GlyphwaveResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| GlyphwaveError::audio("no default input device found"))?;
        let supported = device
            .default_input_config()
            .map_err(|e| GlyphwaveError::audio(format!("get default input config: {e}")))?;
        let channels = usize::from(supported.channels()).max(1);
        let config: cpal::StreamConfig = supported.clone().into();
        let feed = AudioFeed::new(supported.sample_rate().0);

        let err_fn = |err| tracing::warn!(%err, "audio stream error");
        let build = |res: Result<cpal::Stream, cpal::BuildStreamError>| {
            res.map_err(|e| GlyphwaveError::audio(format!("build input stream: {e}")))
        };

        let stream = match supported.sample_format() {
            SampleFormat::F32 => {
                let f = feed.clone();
                build(device.build_input_stream(
                    &config,
                    move |data: &[f32], _| push_interleaved(data, channels, &f),
                    err_fn,
                    None,
                ))?
            }
            SampleFormat::I16 => {
                let f = feed.clone();
                build(device.build_input_stream(
                    &config,
                    move |data: &[i16], _| push_interleaved(data, channels, &f),
                    err_fn,
                    None,
                ))?
            }
            SampleFormat::U16 => {
                let f = feed.clone();
                build(device.build_input_stream(
                    &config,
                    move |data: &[u16], _| push_interleaved(data, channels, &f),
                    err_fn,
                    None,
                ))?
            }
            fmt => {
                return Err(GlyphwaveError::audio(format!(
                    "unsupported sample format: {fmt:?}"
                )));
            }
        };
        stream
            .play()
            .map_err(|e| GlyphwaveError::audio(format!("start input stream: {e}")))?;

        tracing::info!(
            sample_rate = feed.sample_rate(),
            channels,
            "microphone capture started"
        );
        Ok(Self {
            _stream: stream,
            feed,
        })
    }

    pub fn feed(&self) -> &AudioFeed {
        &self.feed
    }
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(data: &[T], channels: usize, feed: &AudioFeed) {
    let mono: Vec<f32> = data
        .chunks(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|s| s.to_float_sample()).sum();
            (sum / frame.len() as f32).clamp(-1.0, 1.0)
        })
        .collect();
    feed.push(&mono);
}
