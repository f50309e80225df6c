/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Read and write square byte matrices.
//!
//! The file format carries no header: the first `side × side` bytes of the stream are
//! the row-major entries, and each entry's value is the raw byte itself (`b'7'` is 55,
//! not 7). Trailing bytes past `side × side` are ignored.

use std::io::{Read, Seek, SeekFrom, Write};

use thiserror::Error;

use crate::{alloc::AllocError, views::Matrix, MatrixView};

/// Read a `side x side` byte matrix from the stream (see [module docs](self)).
///
/// Validates that the reader contains enough data before allocating.
pub fn read_square(
    reader: &mut (impl Read + Seek),
    side: usize,
) -> Result<Matrix<u8>, ReadMatrixError> {
    let expected = side
        .checked_mul(side)
        .ok_or(ReadMatrixError::Overflow { side })?;

    let start = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    let available = end - start;
    reader.seek(SeekFrom::Start(start))?;

    if available < expected as u64 {
        return Err(ReadMatrixError::SizeMismatch {
            side,
            expected: expected as u64,
            available,
        });
    }

    let mut data = Matrix::try_new(0u8, side, side)?;
    reader.read_exact(data.as_mut_slice())?;
    Ok(data)
}

/// Write the entries of `data` in row-major order. Returns the number of bytes written.
pub fn write_square(data: MatrixView<'_, u8>, writer: &mut impl Write) -> std::io::Result<usize> {
    writer.write_all(data.as_slice())?;
    Ok(data.as_slice().len())
}

/// Error type for [`read_square`].
#[derive(Debug, Error)]
pub enum ReadMatrixError {
    /// The stream has fewer bytes than the matrix needs.
    #[error(
        "not enough bytes to fill a {side}x{side} matrix: expected {expected} bytes, \
         found {available}"
    )]
    SizeMismatch {
        side: usize,
        expected: u64,
        available: u64,
    },

    /// `side * side` overflows `usize`.
    #[error("a {side}x{side} matrix does not fit in memory")]
    Overflow { side: usize },

    #[error(transparent)]
    Alloc(#[from] AllocError),

    /// Underlying IO failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

///////////
// Tests //
///////////
