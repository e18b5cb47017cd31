//! Glyphwave renders images as animated grids of colored glyphs.
//!
//! An image is reduced to a luminance grid, deformed over time by one of several animation
//! modes (waves, morph, audio-reactive, contour swim), drawn with a symbol ramp and a
//! five-stop color gradient, and finished with optional CRT and glow effects. The same
//! pipeline drives a live preview and a deterministic GIF/MP4 export:
//!
//! - Build a [`RenderSession`] from an [`AnimatorConfig`]
//! - Load an image (or generate a pattern) and pick a mode
//! - Tick and render previews, or snapshot an [`ExportRenderer`] and stream it into a
//!   [`FrameSink`]
#![forbid(unsafe_code)]

mod foundation;

/// Six-band audio analysis and sample feeds.
pub mod audio;
/// Gaussian and box blurs over fields and RGB images.
pub mod blur;
/// JSON-loadable animator configuration.
pub mod config;
/// Time-varying grid deformations.
pub mod deform;
/// Edge detection, distance fields and their cache.
pub mod edges;
/// Export sinks.
pub mod encode;
/// Glyph rasterization and the colored glyph image.
pub mod glyph;
/// Luminance grids and image resampling.
pub mod grid;
/// CRT and glow post-effects.
pub mod postfx;
/// Render session, preview scheduling and export.
pub mod session;

pub use crate::foundation::core::{Fps, FrameIndex, Rgb8};
pub use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};

pub use crate::config::AnimatorConfig;
pub use crate::deform::{AnimationMode, AudioSignal, Deformer};
pub use crate::encode::{ExportFormat, FrameSink, InMemorySink, SinkConfig};
pub use crate::grid::{Field2, LuminanceGrid};
pub use crate::session::{
    CancelToken, ExportJob, ExportOptions, ExportOutcome, ExportRenderer, FrameOpts,
    RenderSession,
};
