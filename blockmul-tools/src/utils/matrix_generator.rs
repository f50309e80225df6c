/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use clap::ValueEnum;
use rand::Rng;

/// Which byte values a generated matrix draws its entries from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Alphabet {
    /// ASCII digits `'0'..='9'`, so the file stays printable. Entries still multiply as
    /// their byte values, 48 to 57.
    Digits,
    /// Any byte value `0..=255`.
    Bytes,
}

/// Draw `side * side` row-major entries from `alphabet`.
pub fn random_matrix<R: Rng>(rng: &mut R, side: usize, alphabet: Alphabet) -> Vec<u8> {
    (0..side * side)
        .map(|_| match alphabet {
            Alphabet::Digits => rng.random_range(b'0'..=b'9'),
            Alphabet::Bytes => rng.random(),
        })
        .collect()
}
