/// Ten-step ASCII ramp.
pub const RAMP_PURE: &str = " .:-=+*#%@";
/// Seventy-step ramp ending in a full block.
pub const RAMP_EXTENDED: &str =
    " .`^\",:;Il!i><~+_-?][}{1)(|/\\tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$█";

/// Built-in ramp selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampPreset {
    #[default]
    Pure,
    Extended,
}

/// Characters ordered from darkest (index 0) to brightest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolRamp {
    chars: Vec<char>,
}

impl Default for SymbolRamp {
    fn default() -> Self {
        Self::preset(RampPreset::Pure)
    }
}

impl SymbolRamp {
    pub fn preset(preset: RampPreset) -> Self {
        let s = match preset {
            RampPreset::Pure => RAMP_PURE,
            RampPreset::Extended => RAMP_EXTENDED,
        };
        Self {
            chars: s.chars().collect(),
        }
    }

    /// Custom ramp; `None` unless it has at least two characters.
    pub fn custom(text: &str) -> Option<Self> {
        let chars: Vec<char> = text.chars().collect();
        (chars.len() >= 2).then_some(Self { chars })
    }

    /// A valid custom ramp wins over the preset.
    pub fn select(preset: RampPreset, custom: Option<&str>) -> Self {
        custom
            .and_then(Self::custom)
            .unwrap_or_else(|| Self::preset(preset))
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Ramp index for luminance `v`: `round(v·(len-1))`, mirrored when `invert`.
    pub fn index_for(&self, v: f32, invert: bool) -> usize {
        let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        let v = if invert { 1.0 - v } else { v };
        let n = self.chars.len().saturating_sub(1);
        ((v * n as f32 + 0.5) as usize).min(n)
    }

    pub fn glyph_for(&self, v: f32, invert: bool) -> char {
        self.chars
            .get(self.index_for(v, invert))
            .copied()
            .unwrap_or(' ')
    }
}

impl std::fmt::Display for SymbolRamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ch in &self.chars {
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/glyph/ramp.rs"]
mod tests;
