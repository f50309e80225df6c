/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{fs::File, io::BufWriter, path::Path};

use blockmul::RunOutput;
use serde::{Deserialize, Serialize};

/// Machine readable summary of a run, written by `blockmul --report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub side: usize,
    pub splits: usize,
    pub workers: usize,
    pub transport: String,
    pub verified: bool,
    /// The product, one inner vector per row.
    pub product: Vec<Vec<i64>>,
    pub squared_singular_values: Vec<f64>,
    pub sweeps: usize,
    pub converged: bool,
    pub rank_estimate: usize,
}

impl RunReport {
    pub fn new(output: &RunOutput, splits: usize, transport: &str) -> Self {
        Self {
            side: output.product.nrows(),
            splits,
            workers: output.workers,
            transport: transport.to_string(),
            verified: output.verified,
            product: output.product.row_iter().map(<[i64]>::to_vec).collect(),
            squared_singular_values: output.svd.squared_singular_values.clone(),
            sweeps: output.svd.sweeps,
            converged: output.svd.converged,
            rank_estimate: output.svd.rank_estimate,
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use blockmul::{Coordinator, RunConfigBuilder, ThreadTransport};
    use blockmul_utils::MatrixView;

    use super::*;
    use crate::utils::init_test_subscriber;

    #[test]
    fn report_of_a_thread_run() {
        let _guard = init_test_subscriber();

        let a = [1u8, 2, 3, 4];
        let b = [5u8, 6, 7, 8];
        let config = RunConfigBuilder::new(1).build().unwrap();
        let output = Coordinator::new(&ThreadTransport)
            .run(
                &config,
                MatrixView::try_from(a.as_slice(), 2, 2).unwrap(),
                MatrixView::try_from(b.as_slice(), 2, 2).unwrap(),
            )
            .unwrap();

        let report = RunReport::new(&output, 2, "thread");
        assert_eq!(report.side, 2);
        assert_eq!(report.workers, 4);
        assert_eq!(report.product, vec![vec![19, 22], vec![43, 50]]);
        assert_eq!(report.squared_singular_values.len(), 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: RunReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.product, report.product);
        assert_eq!(parsed.sweeps, report.sweeps);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        for key in [
            "side",
            "splits",
            "workers",
            "product",
            "squared_singular_values",
            "sweeps",
            "converged",
            "rank_estimate",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
