use image::imageops::FilterType;
use image::{ImageBuffer, Luma, RgbImage};

use super::{CellGeometry, Field2, LuminanceGrid};
use crate::foundation::error::{GlyphwaveError, GlyphwaveResult};

/// Upper bound on derived grid columns.
pub const MAX_GRID_COLS: usize = 260;
/// Upper bound on derived grid rows.
pub const MAX_GRID_ROWS: usize = 180;
/// Smallest grid side the pipeline will produce.
pub const MIN_GRID_SIDE: usize = 8;

/// Rec.709 luma of an RGB image, scaled to `[0, 1]`.
pub fn to_grayscale(img: &RgbImage) -> Field2 {
    let (w, h) = img.dimensions();
    Field2::from_fn(h as usize, w as usize, |r, c| {
        let p = img.get_pixel(c as u32, r as u32);
        (0.2126 * f32::from(p[0]) + 0.7152 * f32::from(p[1]) + 0.0722 * f32::from(p[2])) / 255.0
    })
}

/// Downsample a gray image to a character grid.
///
/// Missing `cols`/`rows` are derived from the image size and cell geometry and clamped to
/// `[16, 260]` columns and `[8, 180]` rows; every side is at least [`MIN_GRID_SIDE`].
/// Returns `(grid, cols, rows)`.
#[tracing::instrument(level = "debug", skip(gray), fields(src_rows = gray.rows(), src_cols = gray.cols()))]
pub fn resize_to_grid(
    gray: &Field2,
    cell: CellGeometry,
    cols: Option<usize>,
    rows: Option<usize>,
) -> GlyphwaveResult<(LuminanceGrid, usize, usize)> {
    let (h, w) = gray.shape();
    if h == 0 || w == 0 {
        return Err(GlyphwaveError::validation(
            "cannot build a grid from an empty image",
        ));
    }

    let cols = cols
        .unwrap_or_else(|| (w / (cell.width as usize).max(6)).clamp(16, MAX_GRID_COLS))
        .max(MIN_GRID_SIDE);
    let rows = rows
        .unwrap_or_else(|| (h / (cell.height as usize).max(8)).clamp(8, MAX_GRID_ROWS))
        .max(MIN_GRID_SIDE);

    let grid = resample_bicubic(gray, rows, cols)?;
    Ok((grid, cols, rows))
}

/// Shrink a grid so its longer side does not exceed `max_cells` (preview only).
pub fn shrink_for_preview(grid: &LuminanceGrid, max_cells: usize) -> GlyphwaveResult<LuminanceGrid> {
    let (rows, cols) = grid.shape();
    let max_dim = rows.max(cols);
    if max_cells == 0 || max_dim <= max_cells {
        return Ok(grid.clone());
    }
    let scale = max_cells as f64 / max_dim as f64;
    let new_rows = ((rows as f64 * scale) as usize).max(MIN_GRID_SIDE);
    let new_cols = ((cols as f64 * scale) as usize).max(MIN_GRID_SIDE);
    resample_bicubic(grid.as_field(), new_rows, new_cols)
}

fn resample_bicubic(src: &Field2, rows: usize, cols: usize) -> GlyphwaveResult<LuminanceGrid> {
    let buf: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_raw(src.cols() as u32, src.rows() as u32, src.as_slice().to_vec())
            .ok_or_else(|| GlyphwaveError::validation("gray buffer does not match its shape"))?;
    let out = image::imageops::resize(&buf, cols as u32, rows as u32, FilterType::CatmullRom);
    Ok(LuminanceGrid::new(Field2::from_vec(rows, cols, out.into_raw())?))
}

#[cfg(test)]
#[path = "../../tests/unit/grid/resample.rs"]
mod tests;
