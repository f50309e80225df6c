/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

pub mod common;
pub use common::{BlockShape, Operand};

mod kernel;
pub use kernel::IndexError;
use kernel::block_multiply_impl;

mod reference;
use reference::direct_product_impl;

pub mod jacobi;
pub use jacobi::{one_sided_jacobi, JacobiOutput, SvdError, WorkingArray};

use blockmul_utils::{try_filled, AllocError, Matrix, MatrixView};
use thiserror::Error;

/// Error type for [`block_multiply`].
#[derive(Debug, Error)]
pub enum BlockError {
    /// An operand's length disagrees with the block shape.
    #[error("expected the {operand} to hold {expected} entries for {shape:?}, got {got}")]
    Shape {
        operand: Operand,
        shape: BlockShape,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Multiply a row band by a column band.
///
/// * `shape`: The block dimensions. The row band is `shape.rows x shape.inner`, the
///   column band is `shape.inner x shape.cols`, both row-major.
/// * `row_band`: Raw byte entries of the left operand.
/// * `column_band`: Raw byte entries of the right operand, materialized in its own
///   row-major layout (not strided over the source matrix).
///
/// Entries are the byte values themselves widened to `i64`; no digit parsing takes place.
/// The returned block is `shape.rows x shape.cols` in row-major order.
///
/// # Errors
///
/// Returns [`BlockError::Shape`] if either operand has the wrong length and
/// [`BlockError::Alloc`] if the result cannot be allocated.
pub fn block_multiply(
    shape: BlockShape,
    row_band: &[u8],
    column_band: &[u8],
) -> Result<Vec<i64>, BlockError> {
    // Check size requirements.
    check_len(Operand::RowBand, shape, shape.row_band_len(), row_band.len())?;
    check_len(
        Operand::ColumnBand,
        shape,
        shape.column_band_len(),
        column_band.len(),
    )?;

    let mut result = try_filled(0i64, shape.result_len())?;
    block_multiply_impl(shape, row_band, column_band, &mut result)?;
    Ok(result)
}

fn check_len(
    operand: Operand,
    shape: BlockShape,
    expected: usize,
    got: usize,
) -> Result<(), BlockError> {
    if expected != got {
        Err(BlockError::Shape {
            operand,
            shape,
            expected,
            got,
        })
    } else {
        Ok(())
    }
}

/// Compute `a * b` directly, without block decomposition.
///
/// # Panics
///
/// Panics if `a.ncols() != b.nrows()`.
pub fn direct_product(a: MatrixView<'_, u8>, b: MatrixView<'_, u8>) -> Matrix<i64> {
    assert_eq!(
        a.ncols(),
        b.nrows(),
        "expected the inner dimensions to agree, got {}x{} times {}x{}",
        a.nrows(),
        a.ncols(),
        b.nrows(),
        b.ncols()
    );
    direct_product_impl(a, b)
}

/// Compute the squared singular values of a square integer matrix.
///
/// Builds the `2n x n` working array described in [`jacobi`] and runs
/// [`one_sided_jacobi`] over it.
pub fn squared_singular_values(product: MatrixView<'_, i64>) -> Result<JacobiOutput, SvdError> {
    let mut work = WorkingArray::from_product(product)?;
    one_sided_jacobi(&mut work)
}
