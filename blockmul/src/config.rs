/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use crate::{
    error::{RunError, RunErrorKind, RunResult},
    grid::BlockGrid,
};

/// Largest supported exponent: `N = 2^15` gives a 2^30 byte input matrix.
pub const MAX_EXPONENT: u32 = 15;

/// Validated parameters of a run.
///
/// Construct with [`RunConfigBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    exponent: u32,
    grid: BlockGrid,
    verify: bool,
}

impl RunConfig {
    /// The exponent `n` with `N = 2^n`.
    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    /// Matrix side `N`.
    pub fn side(&self) -> usize {
        self.grid.side()
    }

    pub fn grid(&self) -> BlockGrid {
        self.grid
    }

    /// Whether the blocked product is checked against the direct product.
    pub fn verify(&self) -> bool {
        self.verify
    }
}

/// A builder for [`RunConfig`]. Invariants are checked by [`RunConfigBuilder::build`].
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    exponent: u32,

    // optional //
    splits: Option<usize>,
    verify: Option<bool>,
}

impl RunConfigBuilder {
    /// Construct a builder for `N = 2^exponent` with the default 2x2 grid.
    pub fn new(exponent: u32) -> Self {
        Self {
            exponent,
            splits: None,
            verify: None,
        }
    }

    /// Construct a builder and apply `f` to it inline.
    pub fn new_with<F>(exponent: u32, f: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut this = Self::new(exponent);
        f(&mut this);
        this
    }

    /// Number of bands along each side. Must divide `N`.
    pub fn splits(&mut self, splits: usize) -> &mut Self {
        self.splits = Some(splits);
        self
    }

    pub fn verify(&mut self, verify: bool) -> &mut Self {
        self.verify = Some(verify);
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`RunErrorKind::Configuration`] error if the exponent is outside
    /// `1..=15` or the splits do not evenly divide `N`.
    pub fn build(&self) -> RunResult<RunConfig> {
        if !(1..=MAX_EXPONENT).contains(&self.exponent) {
            return Err(RunError::message(
                RunErrorKind::Configuration,
                format!(
                    "exponent must be in 1..={MAX_EXPONENT}, got {}",
                    self.exponent
                ),
            ));
        }

        let side = 1usize << self.exponent;
        let grid = BlockGrid::new(side, self.splits.unwrap_or(2))?;
        Ok(RunConfig {
            exponent: self.exponent,
            grid,
            verify: self.verify.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RunConfigBuilder::new(3).build().unwrap();
        assert_eq!(config.exponent(), 3);
        assert_eq!(config.side(), 8);
        assert_eq!(config.grid().splits(), 2);
        assert!(!config.verify());
    }

    #[test]
    fn chained_options() {
        let config = RunConfigBuilder::new_with(4, |b| {
            b.splits(8).verify(true);
        })
        .build()
        .unwrap();
        assert_eq!(config.side(), 16);
        assert_eq!(config.grid().num_blocks(), 64);
        assert!(config.verify());
    }

    #[test]
    fn rejects_bad_exponents() {
        for exponent in [0, MAX_EXPONENT + 1, 40] {
            let err = RunConfigBuilder::new(exponent).build().unwrap_err();
            assert_eq!(err.kind(), RunErrorKind::Configuration);
        }
    }

    #[test]
    fn rejects_uneven_splits() {
        let err = RunConfigBuilder::new_with(2, |b| {
            b.splits(3);
        })
        .build()
        .unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::Configuration);
        assert!(err.to_string().contains("do not evenly tile"));
    }
}
