/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

pub mod config;
pub mod error;
pub mod grid;
pub mod lifecycle;
pub mod partition;
pub mod transport;
pub mod wire;
pub mod worker;

// Dispatch and gather.
pub mod coordinator;

// Top level exports.
pub use config::{RunConfig, RunConfigBuilder};
pub use coordinator::{multiply, Coordinator, RunOutput};
pub use error::{ErrorContext, RunError, RunErrorKind, RunResult};
pub use grid::{BlockCoord, BlockGrid, BlockSpec};
pub use transport::{ProcessTransport, ThreadTransport, Transport};
