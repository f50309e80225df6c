/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use tracing;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

fn filter_layer(default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy()
}

/// Create a default subscriber logging messages to `stderr` and respecting the `RUST_LOG`
/// environment variable.
///
/// If the environment variable is not set - then the "info" level will be used. `stdout`
/// is left to the console output of the driver.
pub fn init_subscriber() {
    let fmt_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter_layer(LevelFilter::INFO))
        .with(fmt_layer)
        .init();
}

/// Create the subscriber for a worker process.
///
/// `stdout` carries the result block, so every message goes to `stderr`. Without
/// `RUST_LOG` only warnings and errors are shown.
pub fn init_worker_subscriber() {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter_layer(LevelFilter::WARN))
        .with(fmt_layer)
        .init();
}

/// Create a subscriber for the integration tests.
///
/// This subscriber returns a `Guard` that will only install the subscriber locally,
/// allowing test threads to have non-conflicting subscribers.
pub fn init_test_subscriber() -> tracing::subscriber::DefaultGuard {
    let fmt_layer = fmt::layer().with_target(true).with_test_writer();

    tracing_subscriber::registry()
        .with(filter_layer(LevelFilter::INFO))
        .with(fmt_layer)
        .set_default()
}
