/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use blockmul::config::MAX_EXPONENT;
use blockmul_tools::utils::{init_subscriber, random_matrix, Alphabet, CMDResult, CMDToolError};
use blockmul_utils::{io::write_square, MatrixView};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

/// Writes a random 2^n x 2^n byte matrix file for `blockmul`.
#[derive(Debug, Parser)]
#[command(name = "generate_matrix")]
struct Args {
    /// File to create.
    #[arg(long, short)]
    output: PathBuf,

    /// Size exponent: the matrix is N x N with N = 2^n.
    #[arg(short = 'n', long = "exponent")]
    exponent: u32,

    /// Byte values to draw entries from.
    #[arg(long, value_enum, default_value_t = Alphabet::Digits)]
    alphabet: Alphabet,

    /// Optional random seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => {
            let mut system_rng = rand::rng();
            StdRng::from_rng(&mut system_rng)
        }
    }
}

fn main() -> CMDResult<()> {
    init_subscriber();
    let args = Args::parse();

    if !(1..=MAX_EXPONENT).contains(&args.exponent) {
        return Err(CMDToolError {
            details: format!(
                "Error: exponent must be in 1..={MAX_EXPONENT}, got {}",
                args.exponent
            ),
        });
    }
    let side = 1usize << args.exponent;

    let mut rng = create_rng(args.seed);
    let data = random_matrix(&mut rng, side, args.alphabet);
    let view = MatrixView::try_from(data.as_slice(), side, side).map_err(|_| CMDToolError {
        details: format!("Error: generated {} entries for a {side}x{side} matrix", data.len()),
    })?;

    let mut writer = BufWriter::new(File::create(&args.output)?);
    let written = write_square(view, &mut writer)?;
    writer.flush()?;

    info!(
        path = %args.output.display(),
        side,
        bytes = written,
        "wrote random matrix"
    );
    Ok(())
}
