/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

// Views
pub mod views;
pub use views::{Matrix, MatrixView};

pub mod io;

pub mod alloc;
pub use alloc::{try_filled, AllocError};
