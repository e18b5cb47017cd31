use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        GlyphwaveError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(GlyphwaveError::render("x").to_string().contains("render error:"));
    assert!(GlyphwaveError::audio("x").to_string().contains("audio error:"));
}

#[test]
fn export_error_carries_remediation() {
    let err = GlyphwaveError::export("ffmpeg not found", "install ffmpeg or export as GIF");
    let text = err.to_string();
    assert!(text.contains("export error: ffmpeg not found"));
    assert!(text.contains("install ffmpeg"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = GlyphwaveError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
