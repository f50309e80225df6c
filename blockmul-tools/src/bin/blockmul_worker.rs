/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{
    io::{self, BufWriter},
    process::ExitCode,
};

use blockmul::worker;
use blockmul_linalg::BlockShape;
use blockmul_tools::utils::init_worker_subscriber;
use clap::Parser;
use tracing::error;

/// Serves one block product: reads the row band and the column band from stdin and
/// writes the result block to stdout as little-endian 64-bit integers.
#[derive(Debug, Parser)]
#[command(name = "blockmul-worker")]
struct WorkerArgs {
    /// Rows of the row band and of the result block.
    #[arg(long)]
    rows: usize,

    /// Columns of the row band, rows of the column band.
    #[arg(long)]
    inner: usize,

    /// Columns of the column band and of the result block.
    #[arg(long)]
    cols: usize,
}

fn main() -> ExitCode {
    init_worker_subscriber();
    let args = WorkerArgs::parse();
    let shape = BlockShape::new(args.rows, args.inner, args.cols);

    let inbound = io::stdin().lock();
    let outbound = BufWriter::new(io::stdout().lock());
    match worker::serve(shape, inbound, outbound) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(?shape, "block worker failed: {err:?}");
            ExitCode::FAILURE
        }
    }
}
