/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */
pub mod cmd_tool_error;
pub use cmd_tool_error::*;

pub type CMDResult<T> = Result<T, CMDToolError>;

pub mod display;
pub use display::*;

pub mod matrix_generator;
pub use matrix_generator::*;

pub mod report;
pub use report::RunReport;

pub mod tracing;
pub use tracing::{init_subscriber, init_test_subscriber, init_worker_subscriber};
