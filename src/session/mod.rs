//! Interactive session, preview scheduling and deterministic export.
//!
//! A [`RenderSession`] owns everything the live preview mutates: caches, audio analysis, the
//! shake generator and the clock. Exports never touch that state; they run from an owned
//! [`ExportRenderer`] snapshot, so a preview and an export can proceed side by side.

mod clock;
mod export;
mod render_session;
mod scheduler;

pub use clock::AnimationClock;
pub use export::{
    CancelToken, ExportJob, ExportOptions, ExportOutcome, ExportProgress, ExportRenderer,
    export_timestamps,
};
pub use render_session::{FrameOpts, RenderSession};
pub use scheduler::{
    PREVIEW_TICK_HZ, PreviewDisplay, PreviewLoop, PreviewScheduler, PreviewStats,
    RECOVERED_RENDER, SLOW_RENDER, TickDecision,
};

#[cfg(test)]
#[path = "../../tests/unit/session/clock.rs"]
mod tests;
