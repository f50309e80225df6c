/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! One-sided cyclic Jacobi SVD.
//!
//! Adapted from J. C. Nash, "Compact numerical methods for computers" (Hilger, 1990), by
//! way of C. E. Rasmussen's `svd.c`. The working array holds `2n` rows and `n` columns:
//! the upper `n` rows start as the matrix to decompose, the lower `n` rows as the
//! identity. Plane rotations orthogonalize the columns of the upper half while the same
//! rotations accumulate into the lower half, so on return the upper half is `U * S` and
//! the lower half is `V` (not `V'`).
//!
//! The routine reports `S^2`, the squared singular values, in the order of the final
//! columns. Squared column norms are tracked per sweep and used as-is.

use blockmul_utils::{try_filled, AllocError, Matrix, MatrixView};
use thiserror::Error;

/// Machine precision assumed by the convergence tests.
pub const EPS: f64 = 1e-15;

/// Maximum number of sweeps for an `n x n` input before giving up on convergence.
pub fn sweep_limit(n: usize) -> usize {
    if n < 120 {
        30
    } else {
        n / 4
    }
}

/// Error type for SVD setup.
#[derive(Debug, Error)]
pub enum SvdError {
    #[error("the SVD engine needs a square matrix, got {nrows}x{ncols}")]
    NotSquare { nrows: usize, ncols: usize },

    #[error("the SVD engine needs at least one column")]
    Empty,

    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// The `2n x n` array the Jacobi iteration runs over.
#[derive(Debug, Clone)]
pub struct WorkingArray {
    data: Matrix<f64>,
    n: usize,
}

impl WorkingArray {
    /// Construct a working array whose upper half is `f(i, j)` and whose lower half is the
    /// `n x n` identity.
    pub fn try_from_fn<F>(n: usize, f: F) -> Result<Self, SvdError>
    where
        F: Fn(usize, usize) -> f64,
    {
        if n == 0 {
            return Err(SvdError::Empty);
        }
        let mut data = Matrix::try_new(0.0, 2 * n, n)?;
        for i in 0..n {
            for j in 0..n {
                data[(i, j)] = f(i, j);
            }
            data[(n + i, i)] = 1.0;
        }
        Ok(Self { data, n })
    }

    /// Promote an integer product matrix to a working array.
    pub fn from_product(product: MatrixView<'_, i64>) -> Result<Self, SvdError> {
        check_square(product.nrows(), product.ncols())?;
        Self::try_from_fn(product.nrows(), |i, j| product[(i, j)] as f64)
    }

    /// Copy a floating point square matrix into a working array.
    pub fn from_f64(matrix: MatrixView<'_, f64>) -> Result<Self, SvdError> {
        check_square(matrix.nrows(), matrix.ncols())?;
        Self::try_from_fn(matrix.nrows(), |i, j| matrix[(i, j)])
    }

    /// Return `n`, the number of columns.
    pub fn side(&self) -> usize {
        self.n
    }

    /// The upper `n` rows: the input before iteration, `U * S` afterwards.
    pub fn upper(&self) -> MatrixView<'_, f64> {
        self.data.rows(0..self.n)
    }

    /// The lower `n` rows: the identity before iteration, `V` afterwards.
    pub fn lower(&self) -> MatrixView<'_, f64> {
        self.data.rows(self.n..2 * self.n)
    }

    /// Return `(cj . ck, cj . cj, ck . ck)` over the upper rows.
    fn column_products(&self, j: usize, k: usize) -> (f64, f64, f64) {
        let (mut p, mut q, mut r) = (0.0, 0.0, 0.0);
        for row in self.upper().row_iter() {
            let x0 = row[j];
            let y0 = row[k];
            p += x0 * y0;
            q += x0 * x0;
            r += y0 * y0;
        }
        (p, q, r)
    }

    /// Rotate columns `j` and `k` of both halves.
    fn rotate(&mut self, j: usize, k: usize, c0: f64, s0: f64) {
        for row in self.data.row_iter_mut() {
            let d1 = row[j];
            let d2 = row[k];
            row[j] = d1 * c0 + d2 * s0;
            row[k] = -d1 * s0 + d2 * c0;
        }
    }
}

fn check_square(nrows: usize, ncols: usize) -> Result<(), SvdError> {
    if nrows != ncols {
        Err(SvdError::NotSquare { nrows, ncols })
    } else {
        Ok(())
    }
}

/// Result of a Jacobi run.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobiOutput {
    /// `S^2`, one entry per column.
    pub squared_singular_values: Vec<f64>,
    /// Number of sweeps executed.
    pub sweeps: usize,
    /// `false` if the sweep limit was hit before a rotation-free sweep.
    pub converged: bool,
    /// Final estimate of the number of independent leading columns.
    pub rank_estimate: usize,
}

/// Run the one-sided Jacobi iteration over `work` in place.
///
/// Hitting the sweep limit is not an error: a warning is logged and the current `S^2`
/// values are returned with `converged == false`.
pub fn one_sided_jacobi(work: &mut WorkingArray) -> Result<JacobiOutput, SvdError> {
    let n = work.side();
    let mut s2 = try_filled(0.0f64, n)?;

    let slimit = sweep_limit(n);
    let e2 = 10.0 * n as f64 * EPS * EPS;
    let tol = 0.1 * EPS;

    let mut est_col_rank = n;
    let mut rot_count = n;
    let mut sweep_count = 0usize;
    let mut sweeps = 0usize;

    while rot_count != 0 {
        let within_limit = sweep_count <= slimit;
        sweep_count += 1;
        if !within_limit {
            break;
        }
        sweeps += 1;

        rot_count = est_col_rank * (est_col_rank - 1) / 2;
        for j in 0..est_col_rank.saturating_sub(1) {
            for k in (j + 1)..est_col_rank {
                let (mut p, mut q, mut r) = work.column_products(j, k);
                s2[j] = q;
                s2[k] = r;

                if q >= r {
                    if q <= e2 * s2[0] || p.abs() <= tol * q {
                        rot_count -= 1;
                    } else {
                        p /= q;
                        r = 1.0 - r / q;
                        let vt = (4.0 * p * p + r * r).sqrt();
                        let c0 = (0.5 * (1.0 + r / vt)).sqrt();
                        let s0 = p / (vt * c0);
                        work.rotate(j, k, c0, s0);
                    }
                } else {
                    p /= r;
                    q = q / r - 1.0;
                    let vt = (4.0 * p * p + q * q).sqrt();
                    let mut s0 = (0.5 * (1.0 - q / vt)).sqrt();
                    if p < 0.0 {
                        s0 = -s0;
                    }
                    let c0 = p / (vt * s0);
                    work.rotate(j, k, c0, s0);
                }
            }
        }

        while est_col_rank > 2 && s2[est_col_rank - 1] <= s2[0] * tol + tol * tol {
            est_col_rank -= 1;
        }
        tracing::trace!(sweep = sweeps, rot_count, est_col_rank, "jacobi sweep");
    }

    // No column pairs exist for a single column.
    if n == 1 {
        s2[0] = work.upper().as_slice()[0].powi(2);
    }

    let converged = sweep_count <= slimit;
    if !converged {
        tracing::warn!(
            "reached maximum number of sweeps ({}) in SVD routine",
            slimit
        );
    }

    Ok(JacobiOutput {
        squared_singular_values: s2,
        sweeps,
        converged,
        rank_estimate: est_col_rank,
    })
}

///////////
// Tests //
///////////
