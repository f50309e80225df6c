/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use blockmul_utils::{Matrix, MatrixView};
use rayon::prelude::*;

/// Direct `a * b` over raw byte entries without any block decomposition.
///
/// Rows of the output are computed in parallel. This is the check used to validate a
/// block-decomposed product.
pub(super) fn direct_product_impl(a: MatrixView<'_, u8>, b: MatrixView<'_, u8>) -> Matrix<i64> {
    let n = b.ncols();
    let k = a.ncols();
    let mut c = Matrix::new(0i64, a.nrows(), n);

    c.par_row_iter_mut().enumerate().for_each(|(i, row)| {
        let a_row = a.row(i);
        for (j, dst) in row.iter_mut().enumerate() {
            let mut temp: i64 = 0;
            for l in 0..k {
                temp += i64::from(a_row[l]) * i64::from(b[(l, j)]);
            }
            *dst = temp;
        }
    });
    c
}

/// A hand-checked product problem.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct TestProblem {
    pub(crate) side: usize,
    pub(crate) a: Vec<u8>,
    pub(crate) b: Vec<u8>,
    pub(crate) expected: Vec<i64>,
}

/// Return a basic set of test-problems to check a product implementation against.
#[cfg(test)]
pub(crate) fn test_product_problems() -> Vec<TestProblem> {
    vec![
        // [[1, 2], [3, 4]] * [[5, 6], [7, 8]]
        TestProblem {
            side: 2,
            a: vec![1, 2, 3, 4],
            b: vec![5, 6, 7, 8],
            expected: vec![19, 22, 43, 50],
        },
        // ASCII digits: "12" "34" are 49 50 / 51 52.
        TestProblem {
            side: 2,
            a: b"1234".to_vec(),
            b: b"1001".to_vec(),
            // [[49, 50], [51, 52]] * [[49, 48], [48, 49]]
            expected: vec![
                49 * 49 + 50 * 48,
                49 * 48 + 50 * 49,
                51 * 49 + 52 * 48,
                51 * 48 + 52 * 49,
            ],
        },
        // Identity times an arbitrary matrix.
        TestProblem {
            side: 4,
            a: vec![1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1],
            b: (1..=16).collect(),
            expected: (1..=16).collect(),
        },
        // 4x4 matrices:
        //  A          B
        //  7 1 6 8    1 9 6 2
        //  6 2 6 1    8 7 5 0
        //  0 3 1 4    6 4 3 1
        //  2 5 9 1    4 7 6 3
        TestProblem {
            side: 4,
            a: vec![7, 1, 6, 8, 6, 2, 6, 1, 0, 3, 1, 4, 2, 5, 9, 1],
            b: vec![1, 9, 6, 2, 8, 7, 5, 0, 6, 4, 3, 1, 4, 7, 6, 3],
            expected: vec![
                83, 150, 113, 44, //
                62, 99, 70, 21, //
                46, 53, 42, 13, //
                100, 96, 70, 16,
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_product_matches_problems() {
        for (i, problem) in test_product_problems().iter().enumerate() {
            let a = MatrixView::try_from(problem.a.as_slice(), problem.side, problem.side).unwrap();
            let b = MatrixView::try_from(problem.b.as_slice(), problem.side, problem.side).unwrap();
            let c = direct_product_impl(a, b);
            assert_eq!(c.as_slice(), problem.expected.as_slice(), "problem {i}");
        }
    }
}
