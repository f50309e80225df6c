/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Cut a square byte matrix into the bands that a block worker receives.
//!
//! A row band is a run of full rows and is contiguous in the source. A column band takes
//! the same columns from every row and is materialized contiguously, giving an
//! `side x width` row-major block.

use blockmul_utils::{try_filled, AllocError, MatrixView};

/// Select one half of a matrix along rows (top/bottom) or columns (left/right).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    /// Indices `0..side / 2`: the top rows or the left columns.
    First,
    /// Indices `side / 2..side`: the bottom rows or the right columns.
    Second,
}

impl Half {
    pub const TOP: Half = Half::First;
    pub const BOTTOM: Half = Half::Second;
    pub const LEFT: Half = Half::First;
    pub const RIGHT: Half = Half::Second;

    /// Return whether an index in `0..side` falls in this half.
    pub fn contains(&self, index: usize, side: usize) -> bool {
        (index >= side / 2) == (*self == Self::Second)
    }

    /// Band index of this half in a two-way split.
    pub fn band(&self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

fn band_width(side: usize, band: usize, bands: usize) -> usize {
    assert!(
        bands > 0 && side % bands == 0 && band < bands,
        "band {band} of {bands} does not evenly tile a side of {side}"
    );
    side / bands
}

/// Copy rows `band * side / bands .. (band + 1) * side / bands` of `matrix`.
///
/// # Panics
///
/// Panics if the matrix is not square, `bands` does not divide the side or
/// `band >= bands`.
pub fn row_band(
    matrix: MatrixView<'_, u8>,
    band: usize,
    bands: usize,
) -> Result<Vec<u8>, AllocError> {
    let side = square_side(matrix);
    let width = band_width(side, band, bands);

    let mut out = try_filled(0u8, width * side)?;
    out.copy_from_slice(matrix.rows(band * width..(band + 1) * width).as_slice());
    Ok(out)
}

/// Copy columns `band * side / bands .. (band + 1) * side / bands` of every row of
/// `matrix`, row by row.
///
/// # Panics
///
/// Panics if the matrix is not square, `bands` does not divide the side or
/// `band >= bands`.
pub fn column_band(
    matrix: MatrixView<'_, u8>,
    band: usize,
    bands: usize,
) -> Result<Vec<u8>, AllocError> {
    let side = square_side(matrix);
    let width = band_width(side, band, bands);
    let cols = band * width..(band + 1) * width;

    let mut out = try_filled(0u8, width * side)?;
    for (dst, row) in out.chunks_exact_mut(width).zip(matrix.row_iter()) {
        dst.copy_from_slice(&row[cols.clone()]);
    }
    Ok(out)
}

/// The top or bottom half of the rows, in row-major order.
///
/// This is [`row_band`] with two bands, which is what the default 2x2 grid dispatches.
pub fn quarter_row(matrix: MatrixView<'_, u8>, half: Half) -> Result<Vec<u8>, AllocError> {
    row_band(matrix, half.band(), 2)
}

/// The left or right half of the columns, interleaved across every row.
///
/// This is [`column_band`] with two bands.
pub fn quarter_column(matrix: MatrixView<'_, u8>, half: Half) -> Result<Vec<u8>, AllocError> {
    column_band(matrix, half.band(), 2)
}

fn square_side(matrix: MatrixView<'_, u8>) -> usize {
    assert_eq!(
        matrix.nrows(),
        matrix.ncols(),
        "expected a square matrix, got {}x{}",
        matrix.nrows(),
        matrix.ncols()
    );
    matrix.nrows()
}
