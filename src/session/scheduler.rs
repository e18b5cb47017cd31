use std::time::{Duration, Instant};

use image::RgbImage;

use super::export::CancelToken;
use super::render_session::RenderSession;
use crate::foundation::error::GlyphwaveResult;

/// Preview tick rate.
pub const PREVIEW_TICK_HZ: f64 = 30.0;
/// Renders slower than this switch the scheduler into frame-drop mode.
pub const SLOW_RENDER: Duration = Duration::from_millis(50);
/// Renders faster than this leave frame-drop mode.
pub const RECOVERED_RENDER: Duration = Duration::from_millis(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickDecision {
    Render,
    Skip,
}

/// Counters kept by the scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreviewStats {
    pub ticks: u64,
    pub rendered: u64,
    pub skipped: u64,
}

/// Best-effort preview pacing with frame dropping.
///
/// The clock advances on every tick whether or not the tick renders, so dropped frames never
/// slow the animation down.
#[derive(Clone, Debug)]
pub struct PreviewScheduler {
    base_dt: f64,
    frame_drop: bool,
    skip_next: bool,
    stats: PreviewStats,
}

impl Default for PreviewScheduler {
    fn default() -> Self {
        Self::new(PREVIEW_TICK_HZ)
    }
}

impl PreviewScheduler {
    pub fn new(tick_hz: f64) -> Self {
        let hz = if tick_hz.is_finite() && tick_hz > 0.0 {
            tick_hz
        } else {
            PREVIEW_TICK_HZ
        };
        Self {
            base_dt: 1.0 / hz,
            frame_drop: false,
            skip_next: false,
            stats: PreviewStats::default(),
        }
    }

    pub fn base_dt(&self) -> f64 {
        self.base_dt
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.base_dt)
    }

    pub fn is_dropping_frames(&self) -> bool {
        self.frame_drop
    }

    pub fn stats(&self) -> PreviewStats {
        self.stats
    }

    /// Advance the session by one tick and decide whether this tick renders.
    pub fn on_tick(&mut self, session: &mut RenderSession) -> TickDecision {
        session.tick(self.base_dt);
        self.decide()
    }

    fn decide(&mut self) -> TickDecision {
        self.stats.ticks += 1;
        if self.frame_drop && self.skip_next {
            self.skip_next = false;
            self.stats.skipped += 1;
            return TickDecision::Skip;
        }
        self.skip_next = self.frame_drop;
        self.stats.rendered += 1;
        TickDecision::Render
    }

    /// Feed back how long the last render took.
    pub fn record_render(&mut self, took: Duration) {
        if took > SLOW_RENDER {
            if !self.frame_drop {
                tracing::debug!(ms = took.as_millis() as u64, "preview entering frame-drop mode");
            }
            self.frame_drop = true;
            self.skip_next = true;
        } else if took < RECOVERED_RENDER && self.frame_drop {
            tracing::debug!(ms = took.as_millis() as u64, "preview leaving frame-drop mode");
            self.frame_drop = false;
            self.skip_next = false;
        }
    }
}

/// Receiver of preview frames, typically a window or terminal surface.
pub trait PreviewDisplay {
    fn show(&mut self, frame: &RgbImage, t: f64) -> GlyphwaveResult<()>;
}

/// Drives a [`RenderSession`] at the scheduler's tick rate until stopped.
#[derive(Debug, Default)]
pub struct PreviewLoop {
    scheduler: PreviewScheduler,
}

impl PreviewLoop {
    pub fn new(scheduler: PreviewScheduler) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &PreviewScheduler {
        &self.scheduler
    }

    /// Tick, render and display until `stop` is cancelled.
    ///
    /// Render failures are logged and the loop keeps going; display failures end it.
    pub fn run(
        &mut self,
        session: &mut RenderSession,
        display: &mut dyn PreviewDisplay,
        stop: &CancelToken,
    ) -> GlyphwaveResult<PreviewStats> {
        let interval = self.scheduler.tick_interval();
        let mut next = Instant::now();
        while !stop.is_cancelled() {
            if self.scheduler.on_tick(session) == TickDecision::Render {
                let started = Instant::now();
                match session.render_preview() {
                    Ok(frame) => {
                        self.scheduler.record_render(started.elapsed());
                        display.show(&frame, session.clock().t())?;
                    }
                    Err(err) => tracing::warn!(%err, "preview render failed"),
                }
            }

            next += interval;
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            } else {
                next = now;
            }
        }
        Ok(self.scheduler.stats())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/scheduler.rs"]
mod tests;
