//! Character-cell grid model.
//!
//! A [`Field2`] is a plain row-major `f32` matrix used for gray images, edge masks and distance
//! fields. A [`LuminanceGrid`] wraps one and guarantees every value sits in `[0, 1]`; every
//! deformation returns a fresh grid rather than mutating its input.

mod pattern;
mod resample;

pub use pattern::generate_pattern;
pub use resample::{
    MAX_GRID_COLS, MAX_GRID_ROWS, MIN_GRID_SIDE, resize_to_grid, shrink_for_preview,
    to_grayscale,
};

use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};
use crate::foundation::math::clamp01;

/// Row-major `f32` matrix with shape `(rows, cols)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field2 {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Field2 {
    /// Field filled with `value`.
    pub fn new(rows: usize, cols: usize, value: f32) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wrap an existing buffer; `data.len()` must equal `rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> GlyphwaveResult<Self> {
        if data.len() != rows * cols {
            return Err(GlyphwaveError::validation(format!(
                "field buffer has {} values, expected {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a field by evaluating `f(row, col)` for every cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Value at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    /// Overwrite the value at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, v: f32) {
        self.data[row * self.cols + col] = v;
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// All values, row-major.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// All values, row-major, mutable.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the field and return its buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Largest value, or 0 for an empty field.
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(0.0f32, f32::max)
    }

    /// Element-wise map into a new field.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Raw little-endian bytes of the buffer, used as a content identity.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * 4);
        for v in &self.data {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }
}

/// Luminance grid with values in `[0, 1]`, one value per character cell.
#[derive(Clone, Debug, PartialEq)]
pub struct LuminanceGrid(Field2);

impl LuminanceGrid {
    /// Wrap a field, clamping every value into `[0, 1]`.
    pub fn new(field: Field2) -> Self {
        let mut field = field;
        for v in field.as_mut_slice() {
            *v = clamp01(*v);
        }
        Self(field)
    }

    /// Grid filled with one luminance value.
    pub fn filled(rows: usize, cols: usize, v: f32) -> Self {
        Self(Field2::new(rows, cols, clamp01(v)))
    }

    /// Build a grid from `f(row, col)`, clamping the results.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        Self(Field2::from_fn(rows, cols, |r, c| clamp01(f(r, c))))
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.0.rows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.0.cols()
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.0.shape()
    }

    /// Value at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.0.get(row, col)
    }

    /// All values, row-major.
    pub fn as_slice(&self) -> &[f32] {
        self.0.as_slice()
    }

    /// Borrow the underlying field.
    pub fn as_field(&self) -> &Field2 {
        &self.0
    }

    /// Element-wise map into a new (clamped) grid.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(self.0.map(f))
    }

    /// Unwrap into the underlying field.
    pub fn into_field(self) -> Field2 {
        self.0
    }
}

/// Pixel size of one character cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CellGeometry {
    /// Cell width in pixels.
    pub width: u32,
    /// Cell height in pixels.
    pub height: u32,
}

impl CellGeometry {
    /// Minimum usable cell, matching the measured-font floor.
    pub const MIN: CellGeometry = CellGeometry {
        width: 6,
        height: 10,
    };

    /// Build a cell geometry, raising it to the minimum size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(Self::MIN.width),
            height: height.max(Self::MIN.height),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/model.rs"]
mod tests;
