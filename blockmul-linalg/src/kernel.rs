/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use thiserror::Error;

use super::common::{BlockShape, Operand};

/// An entry outside an operand's declared extent was requested.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("index ({row}, {col}) out of range for the {operand} ({nrows}x{ncols}, {len} entries)")]
pub struct IndexError {
    pub operand: Operand,
    pub row: usize,
    pub col: usize,
    pub nrows: usize,
    pub ncols: usize,
    pub len: usize,
}

/// Fetch entry `(row, col)` of a row-major byte operand with `nrows x ncols` logical
/// extent, widened to `i64`.
#[inline]
fn entry(
    operand: Operand,
    data: &[u8],
    nrows: usize,
    ncols: usize,
    row: usize,
    col: usize,
) -> Result<i64, IndexError> {
    let out_of_range = || IndexError {
        operand,
        row,
        col,
        nrows,
        ncols,
        len: data.len(),
    };

    if row >= nrows || col >= ncols {
        return Err(out_of_range());
    }
    data.get(row * ncols + col)
        .map(|&b| i64::from(b))
        .ok_or_else(out_of_range)
}

/// Naive triple-loop block product.
///
/// `result[i * cols + j] = sum_k row_band[i, k] * column_band[k, j]`. Every operand
/// access is bounds checked; callers verify lengths beforehand so a failure here means the
/// operands were malformed upstream.
pub(super) fn block_multiply_impl(
    shape: BlockShape,
    row_band: &[u8],
    column_band: &[u8],
    result: &mut [i64],
) -> Result<(), IndexError> {
    let BlockShape { rows, inner, cols } = shape;

    for i in 0..rows {
        for j in 0..cols {
            let mut temp: i64 = 0;
            for k in 0..inner {
                let a = entry(Operand::RowBand, row_band, rows, inner, i, k)?;
                let b = entry(Operand::ColumnBand, column_band, inner, cols, k, j)?;
                temp += a * b;
            }
            result[i * cols + j] = temp;
        }
    }
    Ok(())
}
