/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::fmt;

use blockmul_linalg::BlockShape;

use crate::error::{RunError, RunErrorKind, RunResult};

/// Position of a block in the product grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockCoord {
    /// Row band of the left operand.
    pub row: usize,
    /// Column band of the right operand.
    pub col: usize,
}

impl BlockCoord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for BlockCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Named quadrants of the default two-way split.
pub mod quadrant {
    use super::BlockCoord;

    pub const TOP_LEFT: BlockCoord = BlockCoord { row: 0, col: 0 };
    pub const TOP_RIGHT: BlockCoord = BlockCoord { row: 0, col: 1 };
    pub const BOTTOM_LEFT: BlockCoord = BlockCoord { row: 1, col: 0 };
    pub const BOTTOM_RIGHT: BlockCoord = BlockCoord { row: 1, col: 1 };
}

/// Everything a worker needs to know about its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpec {
    pub coord: BlockCoord,
    pub shape: BlockShape,
}

/// An even `splits x splits` tiling of an `side x side` product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    side: usize,
    splits: usize,
}

impl BlockGrid {
    /// Construct a grid, checking that `side >= 2` and that `splits` evenly divides `side`.
    pub fn new(side: usize, splits: usize) -> RunResult<Self> {
        if side < 2 {
            return Err(RunError::message(
                RunErrorKind::Configuration,
                format!("matrix side must be at least 2, got {side}"),
            ));
        }
        if splits == 0 || side % splits != 0 {
            return Err(RunError::message(
                RunErrorKind::Configuration,
                format!("{splits} splits do not evenly tile a side of {side}"),
            ));
        }
        Ok(Self { side, splits })
    }

    /// The default four-quadrant grid.
    pub fn quadrants(side: usize) -> RunResult<Self> {
        Self::new(side, 2)
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn splits(&self) -> usize {
        self.splits
    }

    /// Side length of one block.
    pub fn band(&self) -> usize {
        self.side / self.splits
    }

    /// Number of blocks, and therefore workers.
    pub fn num_blocks(&self) -> usize {
        self.splits * self.splits
    }

    /// Shape shared by every block product.
    pub fn shape(&self) -> BlockShape {
        BlockShape::new(self.band(), self.side, self.band())
    }

    /// Every block in row-major order.
    pub fn blocks(&self) -> impl ExactSizeIterator<Item = BlockSpec> + '_ {
        (0..self.num_blocks()).map(move |i| BlockSpec {
            coord: BlockCoord::new(i / self.splits, i % self.splits),
            shape: self.shape(),
        })
    }
}
