use std::f32::consts::TAU;

use super::Field2;

/// Procedural source image: `n` filled random polygons on black.
///
/// `angularity` in `[0, 1]` trades round many-sided blobs for jagged shapes. The same `seed`
/// always produces the same image.
pub fn generate_pattern(width: usize, height: usize, n: usize, angularity: f32, seed: u64) -> Field2 {
    let mut out = Field2::new(height, width, 0.0);
    if width == 0 || height == 0 {
        return out;
    }
    let angularity = angularity.clamp(0.0, 1.0);
    let mut rng = fastrand::Rng::with_seed(seed);
    let min_side = width.min(height);
    let r_lo = (min_side / 20).max(1);
    let r_hi = (min_side / 5).max(r_lo + 1);
    let sides = (3.0 + (1.0 - angularity) * 5.0 + angularity * 20.0) as usize;

    for _ in 0..n {
        let cx = rng.usize(0..width) as f32;
        let cy = rng.usize(0..height) as f32;
        let r = rng.usize(r_lo..r_hi) as f32;
        let pts: Vec<(f32, f32)> = (0..sides)
            .map(|k| {
                let a = TAU * k as f32 / sides as f32 + rng.f32() * 0.2 * angularity;
                let rr = r * (0.7 + 0.6 * rng.f32() * angularity);
                (cx + rr * a.cos(), cy + rr * a.sin())
            })
            .collect();
        let fill = rng.u32(80..240) as f32 / 255.0;
        fill_polygon(&mut out, &pts, fill);
    }
    out
}

fn fill_polygon(field: &mut Field2, pts: &[(f32, f32)], value: f32) {
    let (min_x, max_x, min_y, max_y) = pts.iter().fold(
        (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
        |(a, b, c, d), &(x, y)| (a.min(x), b.max(x), c.min(y), d.max(y)),
    );
    let x0 = min_x.floor().max(0.0) as usize;
    let y0 = min_y.floor().max(0.0) as usize;
    let x1 = (max_x.ceil().max(0.0) as usize).min(field.cols());
    let y1 = (max_y.ceil().max(0.0) as usize).min(field.rows());
    for y in y0..y1 {
        for x in x0..x1 {
            if point_in_polygon(x as f32 + 0.5, y as f32 + 0.5, pts) {
                field.set(y, x, value);
            }
        }
    }
}

fn point_in_polygon(px: f32, py: f32, pts: &[(f32, f32)]) -> bool {
    let mut inside = false;
    let mut j = pts.len() - 1;
    for i in 0..pts.len() {
        let (xi, yi) = pts[i];
        let (xj, yj) = pts[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
#[path = "../../tests/unit/grid/pattern.rs"]
mod tests;
