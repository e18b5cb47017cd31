use image::RgbImage;

use crate::foundation::core::Rgb8;
use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};

/// Number of gradient anchors.
pub const STOP_COUNT: usize = 5;

/// Five RGB anchors of a piecewise-linear luminance gradient over four equal segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorStops([Rgb8; STOP_COUNT]);

impl Default for ColorStops {
    fn default() -> Self {
        Self([image::Rgb([255, 255, 255]); STOP_COUNT])
    }
}

impl ColorStops {
    pub fn new(stops: [Rgb8; STOP_COUNT]) -> Self {
        Self(stops)
    }

    pub fn stops(&self) -> &[Rgb8; STOP_COUNT] {
        &self.0
    }

    pub fn get(&self, i: usize) -> Rgb8 {
        self.0[i]
    }

    pub fn set(&mut self, i: usize, color: Rgb8) {
        self.0[i] = color;
    }

    /// Gradient color at luminance `v` (clamped to `[0, 1]`).
    ///
    /// `v = k/4` returns stop `k` exactly; channels between stops are truncated toward the
    /// first stop.
    pub fn color_at(&self, v: f32) -> Rgb8 {
        let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        let seg = ((v * 4.0).floor() as usize).min(STOP_COUNT - 2);
        let local = (v - seg as f32 * 0.25) / 0.25;
        let (a, b) = (self.0[seg], self.0[seg + 1]);
        let ch = |i: usize| {
            let (a, b) = (f32::from(a[i]), f32::from(b[i]));
            (a + (b - a) * local).clamp(0.0, 255.0) as u8
        };
        image::Rgb([ch(0), ch(1), ch(2)])
    }

    /// Random palette: each stop is a random gray with probability 1/4, else a random color.
    pub fn randomize(seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut stops = [image::Rgb([0, 0, 0]); STOP_COUNT];
        for stop in &mut stops {
            *stop = if rng.f32() < 0.25 {
                let g = rng.u8(..);
                image::Rgb([g, g, g])
            } else {
                image::Rgb([rng.u8(..), rng.u8(..), rng.u8(..)])
            };
        }
        Self(stops)
    }

    /// Five dominant colors of `img` (median cut), most populous first.
    ///
    /// Images with fewer distinct colors repeat the last one.
    pub fn from_image(img: &RgbImage) -> GlyphwaveResult<Self> {
        let pixels: Vec<[u8; 3]> = img.pixels().map(|p| p.0).collect();
        if pixels.is_empty() {
            return Err(GlyphwaveError::validation("cannot extract a palette from an empty image"));
        }
        let mut boxes = vec![pixels];
        while boxes.len() < STOP_COUNT {
            let Some((idx, channel)) = widest_box(&boxes) else {
                break;
            };
            let mut b = boxes.swap_remove(idx);
            b.sort_unstable_by_key(|p| p[channel]);
            let upper = b.split_off(b.len() / 2);
            boxes.push(b);
            boxes.push(upper);
        }
        boxes.sort_by_key(|b| std::cmp::Reverse(b.len()));

        let mut stops = [image::Rgb([255, 255, 255]); STOP_COUNT];
        for (i, stop) in stops.iter_mut().enumerate() {
            let b = &boxes[i.min(boxes.len() - 1)];
            let mut sum = [0u64; 3];
            for p in b {
                for c in 0..3 {
                    sum[c] += u64::from(p[c]);
                }
            }
            let n = b.len() as u64;
            *stop = image::Rgb(sum.map(|s| ((s + n / 2) / n) as u8));
        }
        Ok(Self(stops))
    }
}

/// Box with the largest single-channel range that can still be split.
fn widest_box(boxes: &[Vec<[u8; 3]>]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, u8)> = None;
    for (i, b) in boxes.iter().enumerate() {
        if b.len() < 2 {
            continue;
        }
        for c in 0..3 {
            let (lo, hi) = b
                .iter()
                .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[c]), hi.max(p[c])));
            let range = hi - lo;
            if range > 0 && best.is_none_or(|(_, _, r)| range > r) {
                best = Some((i, c, range));
            }
        }
    }
    best.map(|(i, c, _)| (i, c))
}

/// Parse `#RRGGBB` / `RRGGBB` (case-insensitive).
pub fn parse_hex(text: &str) -> Option<Rgb8> {
    let s = text.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if s.len() != 6 || !s.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    Some(image::Rgb([byte(0)?, byte(2)?, byte(4)?]))
}

/// Format as `#RRGGBB`.
pub fn to_hex(c: Rgb8) -> String {
    format!("#{:02X}{:02X}{:02X}", c[0], c[1], c[2])
}

#[cfg(test)]
#[path = "../../tests/unit/glyph/color.rs"]
mod tests;
