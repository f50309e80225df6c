/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Fallible allocation helpers.
//!
//! Every buffer that scales with the matrix side goes through [`try_filled`] so that
//! allocation failure surfaces as an error instead of aborting the process.

use std::collections::TryReserveError;

use thiserror::Error;

/// The allocator could not provide a buffer of the requested length.
#[derive(Debug, Error)]
#[error("failed to allocate {len} elements of {elem_size} bytes")]
pub struct AllocError {
    len: usize,
    elem_size: usize,
    #[source]
    source: TryReserveError,
}

impl AllocError {
    /// Number of elements requested by the failed allocation.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return `true` if the failed allocation requested zero elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Allocate a `Vec` holding `len` copies of `value`.
pub fn try_filled<T: Clone>(value: T, len: usize) -> Result<Vec<T>, AllocError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|source| AllocError {
        len,
        elem_size: std::mem::size_of::<T>(),
        source,
    })?;
    data.resize(len, value);
    Ok(data)
}
