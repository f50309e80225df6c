/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{
    fs::File,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use blockmul::{
    lifecycle, Coordinator, ProcessTransport, RunConfigBuilder, RunError, RunErrorKind,
    ThreadTransport, Transport,
};
use blockmul_tools::utils::{
    format_byte_matrix, format_matrix_2d, format_vector, init_subscriber, RunReport,
};
use blockmul_utils::{io::read_square, Matrix};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};

/// Multiplies two 2^n x 2^n byte matrices with one worker per block, then prints the
/// squared singular values of the product.
#[derive(Debug, Parser)]
#[command(name = "blockmul")]
struct Args {
    /// File holding matrix A. Its first N*N bytes are the row-major entries.
    #[arg(short = 'i', long = "input1")]
    input1: PathBuf,

    /// File holding matrix B. Its first N*N bytes are the row-major entries.
    #[arg(short = 'j', long = "input2")]
    input2: PathBuf,

    /// Size exponent: the matrices are N x N with N = 2^n, 1 <= n <= 15.
    #[arg(short = 'n', long = "exponent")]
    exponent: u32,

    /// Number of bands per side. The run uses splits^2 workers.
    #[arg(long, default_value_t = 2)]
    splits: usize,

    /// How workers are started.
    #[arg(long, value_enum, default_value_t = TransportKind::Process)]
    transport: TransportKind,

    /// Worker binary for the process transport. Defaults to the `blockmul-worker` next
    /// to this executable.
    #[arg(long)]
    worker: Option<PathBuf>,

    /// Check the blocked product against a direct product.
    #[arg(long)]
    verify: bool,

    /// Write a JSON report of the run to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportKind {
    /// One child process per block.
    Process,
    /// One thread per block.
    Thread,
}

fn main() -> ExitCode {
    init_subscriber();
    let args = Args::parse();

    // Terminate workers still alive when the user interrupts the run.
    let registry = lifecycle::install();
    if let Err(err) = ctrlc::set_handler(|| {
        let terminated = lifecycle::interrupt();
        eprintln!("Interrupted, terminated {terminated} worker(s)");
        std::process::exit(130);
    }) {
        warn!("could not install the interrupt handler: {err}");
    }

    let result = run(&args, registry);
    lifecycle::clear();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("blockmul failed - see diagnostic");
            eprintln!("Error: {err:?}");
            let interrupted = err
                .downcast_ref::<RunError>()
                .is_some_and(|e| e.kind() == RunErrorKind::Interrupted);
            ExitCode::from(if interrupted { 130 } else { 1 })
        }
    }
}

fn run(args: &Args, registry: lifecycle::ShutdownRegistry) -> Result<()> {
    println!("Input 1 path : {}", args.input1.display());
    println!("Input 2 path : {}", args.input2.display());

    let config = RunConfigBuilder::new_with(args.exponent, |b| {
        b.splits(args.splits).verify(args.verify);
    })
    .build()?;
    let side = config.side();
    println!("N: {side}");

    // Both inputs are validated before any worker starts.
    let a = read_input(&args.input1, side, "Input 1")?;
    let b = read_input(&args.input2, side, "Input 2")?;

    let transport: Box<dyn Transport> = match args.transport {
        TransportKind::Thread => Box::new(ThreadTransport),
        TransportKind::Process => match &args.worker {
            Some(program) => Box::new(ProcessTransport::new(program)),
            None => Box::new(ProcessTransport::sibling()?),
        },
    };

    let output = Coordinator::new(transport.as_ref())
        .with_registry(registry)
        .run(&config, a.as_view(), b.as_view())?;

    println!("Matrix A:");
    print!("{}", format_byte_matrix(a.as_view()));
    println!("Matrix B:");
    print!("{}", format_byte_matrix(b.as_view()));
    println!("Matrix C:");
    println!("{}", format_matrix_2d(output.product.as_view()));
    println!("Singular Values Squared:");
    println!("{}", format_vector(&output.svd.squared_singular_values));

    if let Some(path) = &args.report {
        RunReport::new(&output, config.grid().splits(), transport.name())
            .save(path)
            .with_context(|| format!("writing the report to {}", path.display()))?;
        info!(path = %path.display(), "wrote run report");
    }
    Ok(())
}

fn read_input(path: &Path, side: usize, label: &str) -> Result<Matrix<u8>> {
    let mut file = File::open(path)
        .with_context(|| format!("{label} file could not be opened: {}", path.display()))?;
    read_square(&mut file, side)
        .with_context(|| format!("{label} file cannot fill a {side}x{side} matrix"))
}
