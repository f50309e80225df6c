/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

/// Dimensions of one block product `rows x inner` times `inner x cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockShape {
    /// Number of rows in the row band and in the result block.
    pub rows: usize,
    /// Shared dimension: columns of the row band, rows of the column band.
    pub inner: usize,
    /// Number of columns in the column band and in the result block.
    pub cols: usize,
}

impl BlockShape {
    /// Construct a new shape.
    pub fn new(rows: usize, inner: usize, cols: usize) -> Self {
        Self { rows, inner, cols }
    }

    /// Number of entries in the row band operand.
    pub fn row_band_len(&self) -> usize {
        self.rows * self.inner
    }

    /// Number of entries in the column band operand.
    pub fn column_band_len(&self) -> usize {
        self.inner * self.cols
    }

    /// Number of entries in the result block.
    pub fn result_len(&self) -> usize {
        self.rows * self.cols
    }
}

/// Identify which operand of a block product an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// The `rows x inner` left operand.
    RowBand,
    /// The `inner x cols` right operand.
    ColumnBand,
}

impl Operand {
    /// Return a human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RowBand => "row band",
            Self::ColumnBand => "column band",
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        let shape = BlockShape::new(2, 4, 3);
        assert_eq!(shape.row_band_len(), 8);
        assert_eq!(shape.column_band_len(), 12);
        assert_eq!(shape.result_len(), 6);
    }

    #[test]
    fn test_operand_names() {
        assert_eq!(Operand::RowBand.to_string(), "row band");
        assert_eq!(Operand::ColumnBand.to_string(), "column band");
    }
}
