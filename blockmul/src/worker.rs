/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! The body of a block worker, independent of how it was started.

use std::io::{Read, Write};

use blockmul_linalg::{block_multiply, BlockError, BlockShape};
use blockmul_utils::{try_filled, AllocError};
use thiserror::Error;

use crate::wire::{read_payload, write_results, Payload, TransferError};

/// Reasons a worker ends with a failure status.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker transfer failed")]
    Transfer(#[from] TransferError),

    #[error("block product failed")]
    Multiply(#[from] BlockError),

    #[error("worker could not allocate its bands")]
    Alloc(#[from] AllocError),
}

/// Serve exactly one block request.
///
/// Reads the row band and then the column band from `inbound`, multiplies them and
/// writes the result block to `outbound`. Both streams are consumed by value so they are
/// closed when the worker returns, successful or not.
pub fn serve<R, W>(shape: BlockShape, mut inbound: R, mut outbound: W) -> Result<(), WorkerError>
where
    R: Read,
    W: Write,
{
    let mut row_band = try_filled(0u8, shape.row_band_len())?;
    let mut column_band = try_filled(0u8, shape.column_band_len())?;

    read_payload(&mut inbound, Payload::RowBand, &mut row_band)?;
    read_payload(&mut inbound, Payload::ColumnBand, &mut column_band)?;
    drop(inbound);

    let block = block_multiply(shape, &row_band, &column_band)?;
    write_results(&mut outbound, &block)?;
    Ok(())
}
