/// Crate-wide result alias.
pub type GlyphwaveResult<T> = Result<T, GlyphwaveError>;

/// Errors surfaced by the rendering pipeline and its sinks.
///
/// Invalid user input is sanitized by the config layer and never reaches this type; mismatched
/// morph shapes and missing optional capabilities have defined fallbacks.
#[derive(thiserror::Error, Debug)]
pub enum GlyphwaveError {
    /// Bad shapes or parameters at an API boundary.
    #[error("validation error: {0}")]
    Validation(String),

    /// Rendering-stage failure (for example an unparsable font).
    #[error("render error: {0}")]
    Render(String),

    /// Export sink or encoder failure, with a hint on how to fix it.
    #[error("export error: {message} (hint: {remediation})")]
    Export {
        /// What went wrong.
        message: String,
        /// Actionable remediation text for the user.
        remediation: String,
    },

    /// Audio capture device failure.
    #[error("audio error: {0}")]
    Audio(String),

    /// Filesystem error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Image decode/encode error.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// Anything else, with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlyphwaveError {
    /// Build a [`GlyphwaveError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GlyphwaveError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`GlyphwaveError::Export`].
    pub fn export(msg: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
            remediation: remediation.into(),
        }
    }

    /// Build a [`GlyphwaveError::Audio`].
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
