use rayon::prelude::*;

use crate::grid::Field2;

const INF: f32 = 1e20;

fn diagonal(rows: usize, cols: usize) -> f32 {
    (rows as f32).hypot(cols as f32)
}

/// Exact Euclidean distance from every pixel to the nearest pixel with `mask > 0.5`.
///
/// Separable lower-envelope transform (Felzenszwalb–Huttenlocher): columns first, then rows.
/// A mask without edge pixels yields the image diagonal everywhere.
pub fn euclidean_distance(mask: &Field2) -> Field2 {
    let (rows, cols) = mask.shape();
    if !mask.as_slice().iter().any(|&v| v > 0.5) {
        return Field2::new(rows, cols, diagonal(rows, cols));
    }

    let mut sq: Vec<f32> = mask
        .as_slice()
        .iter()
        .map(|&v| if v > 0.5 { 0.0 } else { INF })
        .collect();

    // Columns are strided; transpose into contiguous scratch so each column runs in parallel.
    let mut colmajor = vec![0.0f32; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            colmajor[c * rows + r] = sq[r * cols + c];
        }
    }
    colmajor.par_chunks_mut(rows).for_each(|col| {
        let f = col.to_vec();
        squared_distance_1d(&f, col);
    });
    for r in 0..rows {
        for c in 0..cols {
            sq[r * cols + c] = colmajor[c * rows + r];
        }
    }

    sq.par_chunks_mut(cols).for_each(|row| {
        let f = row.to_vec();
        squared_distance_1d(&f, row);
    });

    Field2::from_fn(rows, cols, |r, c| sq[r * cols + c].sqrt())
}

/// 1-D squared distance transform of sampled function `f` into `d`.
fn squared_distance_1d(f: &[f32], d: &mut [f32]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let fq = |q: usize| f64::from(f[q]);
    let intersect = |q: usize, p: usize| {
        let (qf, pf) = (q as f64, p as f64);
        ((fq(q) + qf * qf) - (fq(p) + pf * pf)) / (2.0 * (qf - pf))
    };

    // Lower envelope: parabola roots `v`, boundaries `z`.
    let mut v = vec![0usize; n];
    let mut z = vec![0.0f64; n + 1];
    let mut k = 0usize;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;
    for q in 1..n {
        let mut s = intersect(q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = intersect(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, out) in d.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let p = v[k];
        let dq = q as f64 - p as f64;
        *out = (dq * dq + fq(p)) as f32;
    }
}

/// City-block distance to the nearest edge pixel (two raster passes).
///
/// A mask without edge pixels yields the image diagonal everywhere.
pub fn manhattan_distance(mask: &Field2) -> Field2 {
    let (rows, cols) = mask.shape();
    if !mask.as_slice().iter().any(|&v| v > 0.5) {
        return Field2::new(rows, cols, diagonal(rows, cols));
    }
    let mut d: Vec<f32> = mask
        .as_slice()
        .iter()
        .map(|&v| if v > 0.5 { 0.0 } else { INF })
        .collect();

    for r in 0..rows {
        for c in 0..cols {
            let i = r * cols + c;
            if r > 0 {
                d[i] = d[i].min(d[i - cols] + 1.0);
            }
            if c > 0 {
                d[i] = d[i].min(d[i - 1] + 1.0);
            }
        }
    }
    for r in (0..rows).rev() {
        for c in (0..cols).rev() {
            let i = r * cols + c;
            if r + 1 < rows {
                d[i] = d[i].min(d[i + cols] + 1.0);
            }
            if c + 1 < cols {
                d[i] = d[i].min(d[i + 1] + 1.0);
            }
        }
    }
    Field2::from_fn(rows, cols, |r, c| d[r * cols + c])
}

#[cfg(test)]
#[path = "../../tests/unit/edges/distance.rs"]
mod tests;
