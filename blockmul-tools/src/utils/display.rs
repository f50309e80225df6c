/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Console rendering of matrices and `S^2` vectors.

use std::fmt::Write;

use blockmul_utils::MatrixView;

/// Render a byte matrix with every entry shown as a character followed by a space, one
/// line per row.
pub fn format_byte_matrix(matrix: MatrixView<'_, u8>) -> String {
    let mut out = String::with_capacity(matrix.nrows() * (2 * matrix.ncols() + 1));
    for row in matrix.row_iter() {
        for &byte in row {
            out.push(char::from(byte));
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

/// Render an integer matrix as
///
/// ```text
/// [
/// [19.000, 22.000],
/// [43.000, 50.000],
/// ]
/// ```
pub fn format_matrix_2d(matrix: MatrixView<'_, i64>) -> String {
    let mut out = String::from("[\n");
    for row in matrix.row_iter() {
        out.push_str(&format_values(row.iter().map(|&v| v as f64)));
        out.push_str(",\n");
    }
    out.push(']');
    out
}

/// Render values as `[v0, v1, ...]` with three decimals.
pub fn format_vector(values: &[f64]) -> String {
    format_values(values.iter().copied())
}

fn format_values(values: impl Iterator<Item = f64>) -> String {
    let mut out = String::from("[");
    for (i, value) in values.enumerate() {
        if i != 0 {
            out.push_str(", ");
        }
        // Writing to a `String` cannot fail.
        let _ = write!(out, "{value:.3}");
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_matrix() {
        let data = *b"1234";
        let m = MatrixView::try_from(data.as_slice(), 2, 2).unwrap();
        assert_eq!(format_byte_matrix(m), "1 2 \n3 4 \n");
    }

    #[test]
    fn integer_matrix() {
        let data = [19i64, 22, 43, -50];
        let m = MatrixView::try_from(data.as_slice(), 2, 2).unwrap();
        assert_eq!(
            format_matrix_2d(m),
            "[\n[19.000, 22.000],\n[43.000, -50.000],\n]"
        );
    }

    #[test]
    fn vectors() {
        assert_eq!(
            format_vector(&[5193.996919520698, 0.0030804793009917633]),
            "[5193.997, 0.003]"
        );
        assert_eq!(format_vector(&[16.0]), "[16.000]");
        assert_eq!(format_vector(&[]), "[]");
    }
}
