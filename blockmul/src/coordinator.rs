/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Partition, dispatch and gather.
//!
//! A run spawns one worker per block of the [`BlockGrid`] before sending anything. Each
//! worker then receives its row band of `A` followed by its column band of `B` and its
//! inbound channel is closed. Result blocks are drained from every outbound channel
//! concurrently, after which every worker is waited on. The product is only returned if
//! every block arrived in full and every worker succeeded.
//!
//! Any failure aborts the whole run. Workers that are still alive at that point are
//! terminated and reaped before the error is returned.

use std::{
    io::{Read, Write},
    thread,
};

use blockmul_linalg::{direct_product, squared_singular_values, BlockShape, JacobiOutput};
use blockmul_utils::{try_filled, Matrix, MatrixView};
use tracing::{debug, info};

use crate::{
    config::RunConfig,
    error::{ErrorContext, RunError, RunErrorKind, RunResult},
    grid::{BlockGrid, BlockSpec},
    lifecycle::ShutdownRegistry,
    partition::{column_band, row_band},
    transport::{Transport, WorkerHandle, WorkerLink},
    wire::{read_results, WireInt},
};

/// Everything a completed run produces.
#[derive(Debug)]
pub struct RunOutput {
    /// The `N x N` product `A * B`.
    pub product: Matrix<i64>,
    /// Squared singular values of the product.
    pub svd: JacobiOutput,
    /// Number of workers that served a block.
    pub workers: usize,
    /// Whether the product was checked against the direct product.
    pub verified: bool,
}

/// Drives block workers through a [`Transport`].
pub struct Coordinator<'a> {
    transport: &'a dyn Transport,
    registry: Option<ShutdownRegistry>,
}

impl<'a> Coordinator<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            registry: None,
        }
    }

    /// Record worker processes in `registry` while they are alive.
    pub fn with_registry(mut self, registry: ShutdownRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Run the full pipeline: blocked product, optional verification, then `S^2`.
    pub fn run(
        &self,
        config: &RunConfig,
        lhs: MatrixView<'_, u8>,
        rhs: MatrixView<'_, u8>,
    ) -> RunResult<RunOutput> {
        let grid = config.grid();
        let product = self.multiply(lhs, rhs, grid)?;

        if config.verify() {
            verify(lhs, rhs, product.as_view())?;
            info!("blocked product matches the direct product");
        }

        info!(side = grid.side(), "computing squared singular values");
        let svd = squared_singular_values(product.as_view())?;
        Ok(RunOutput {
            product,
            svd,
            workers: grid.num_blocks(),
            verified: config.verify(),
        })
    }

    /// Compute `lhs * rhs` with one worker per block of `grid`.
    ///
    /// # Errors
    ///
    /// * [`RunErrorKind::Configuration`] if an operand is not `grid.side()` square.
    /// * [`RunErrorKind::ResourceExhausted`] if the bands or the product cannot be
    ///   allocated.
    /// * [`RunErrorKind::Spawn`] or [`RunErrorKind::Channel`] if a worker or one of its
    ///   channels could not be set up or written.
    /// * [`RunErrorKind::ShortTransfer`] if a channel ended early.
    /// * [`RunErrorKind::WorkerFailed`] if a worker exited unsuccessfully.
    /// * [`RunErrorKind::Interrupted`] if the registry was interrupted during the run.
    pub fn multiply(
        &self,
        lhs: MatrixView<'_, u8>,
        rhs: MatrixView<'_, u8>,
        grid: BlockGrid,
    ) -> RunResult<Matrix<i64>> {
        check_operand("A", lhs, grid.side())?;
        check_operand("B", rhs, grid.side())?;

        let result = self.multiply_inner(lhs, rhs, grid);
        if let (Err(err), Some(registry)) = (&result, &self.registry) {
            if registry.is_interrupted() {
                debug!("run failed after an interrupt: {err}");
                return Err(RunError::message(
                    RunErrorKind::Interrupted,
                    "run interrupted while workers were active",
                ));
            }
        }
        result
    }

    fn multiply_inner(
        &self,
        lhs: MatrixView<'_, u8>,
        rhs: MatrixView<'_, u8>,
        grid: BlockGrid,
    ) -> RunResult<Matrix<i64>> {
        let side = grid.side();
        let splits = grid.splits();

        let row_bands = (0..splits)
            .map(|band| row_band(lhs, band, splits))
            .collect::<Result<Vec<_>, _>>()
            .context("slicing row bands of A")?;
        let column_bands = (0..splits)
            .map(|band| column_band(rhs, band, splits))
            .collect::<Result<Vec<_>, _>>()
            .context("slicing column bands of B")?;
        let mut product = Matrix::try_new(0i64, side, side).context("allocating the product")?;

        // Spawn every worker before sending anything.
        let mut session = Session::new(self.registry.as_ref());
        for spec in grid.blocks() {
            let link = self.transport.spawn(&spec)?;
            session.push(spec, link);
        }
        info!(
            workers = session.workers.len(),
            transport = self.transport.name(),
            side,
            splits,
            "spawned block workers"
        );

        for worker in session.workers.iter_mut() {
            let coord = worker.spec.coord;
            worker.dispatch(&row_bands[coord.row], &column_bands[coord.col])?;
            debug!(%coord, "dispatched bands");
        }

        let gathered = session.drain(grid.shape());
        let blocks = settle(session.wait_all(), gathered)?;

        let band = grid.band();
        for (spec, block) in grid.blocks().zip(blocks) {
            let cols = spec.coord.col * band..(spec.coord.col + 1) * band;
            for (i, values) in block.chunks_exact(band).enumerate() {
                product.row_mut(spec.coord.row * band + i)[cols.clone()].copy_from_slice(values);
            }
        }

        info!(side, "gathered all blocks");
        Ok(product)
    }
}

/// Compute `lhs * rhs` with one worker per block of `grid`.
///
/// See [`Coordinator::multiply`].
pub fn multiply(
    lhs: MatrixView<'_, u8>,
    rhs: MatrixView<'_, u8>,
    grid: BlockGrid,
    transport: &dyn Transport,
) -> RunResult<Matrix<i64>> {
    Coordinator::new(transport).multiply(lhs, rhs, grid)
}

/// Combine the worker exit results with the gathered blocks.
///
/// A worker's own error wins, except that an opaque exit status yields to the first
/// channel that ended early.
fn settle(
    waited: RunResult<()>,
    gathered: Vec<RunResult<Vec<WireInt>>>,
) -> RunResult<Vec<Vec<WireInt>>> {
    let mut blocks = Vec::with_capacity(gathered.len());
    let mut short = None;
    let mut other = None;
    for block in gathered {
        match block {
            Ok(block) => blocks.push(block),
            Err(err) if err.kind() == RunErrorKind::ShortTransfer => {
                short.get_or_insert(err);
            }
            Err(err) => {
                other.get_or_insert(err);
            }
        }
    }

    match waited {
        Err(err) if err.kind() == RunErrorKind::WorkerFailed => Err(short.unwrap_or(err)),
        Err(err) => Err(err),
        Ok(()) => match short.or(other) {
            Some(err) => Err(err),
            None => Ok(blocks),
        },
    }
}

fn check_operand(name: &str, matrix: MatrixView<'_, u8>, side: usize) -> RunResult<()> {
    if matrix.nrows() != side || matrix.ncols() != side {
        return Err(RunError::message(
            RunErrorKind::Configuration,
            format!(
                "operand {name} is {}x{}, expected {side}x{side}",
                matrix.nrows(),
                matrix.ncols()
            ),
        ));
    }
    Ok(())
}

fn verify(
    lhs: MatrixView<'_, u8>,
    rhs: MatrixView<'_, u8>,
    product: MatrixView<'_, i64>,
) -> RunResult<()> {
    let direct = direct_product(lhs, rhs);
    let mismatch = std::iter::zip(direct.as_slice(), product.as_slice())
        .position(|(expected, got)| expected != got);

    match mismatch {
        None => Ok(()),
        Some(index) => {
            let (row, col) = (index / product.ncols(), index % product.ncols());
            Err(RunError::message(
                RunErrorKind::WorkerFailed,
                format!(
                    "blocked product disagrees with the direct product at ({row}, {col}): \
                     got {}, expected {}",
                    product[(row, col)],
                    direct[(row, col)]
                ),
            ))
        }
    }
}

/////////////
// Session //
/////////////

struct ActiveWorker {
    spec: BlockSpec,
    inbound: Option<Box<dyn Write + Send>>,
    outbound: Option<Box<dyn Read + Send>>,
    handle: Box<dyn WorkerHandle>,
    reaped: bool,
}

impl ActiveWorker {
    /// Send both bands and close the inbound channel.
    fn dispatch(&mut self, row_band: &[u8], column_band: &[u8]) -> RunResult<()> {
        let coord = self.spec.coord;
        let Some(mut inbound) = self.inbound.take() else {
            return Err(RunError::message(
                RunErrorKind::Channel,
                format!("inbound channel of worker {coord} is already closed"),
            ));
        };

        inbound
            .write_all(row_band)
            .with_context(|| format!("sending the row band to worker {coord}"))?;
        inbound
            .write_all(column_band)
            .with_context(|| format!("sending the column band to worker {coord}"))?;
        inbound
            .flush()
            .with_context(|| format!("flushing the inbound channel of worker {coord}"))?;
        Ok(())
    }
}

/// The workers of one run. Dropping a session terminates and reaps every worker that has
/// not been waited on.
struct Session<'r> {
    workers: Vec<ActiveWorker>,
    registry: Option<&'r ShutdownRegistry>,
}

impl<'r> Session<'r> {
    fn new(registry: Option<&'r ShutdownRegistry>) -> Self {
        Self {
            workers: Vec::new(),
            registry,
        }
    }

    fn push(&mut self, spec: BlockSpec, link: WorkerLink) {
        if let (Some(registry), Some(pid)) = (self.registry, link.handle.pid()) {
            registry.register(pid);
        }
        self.workers.push(ActiveWorker {
            spec,
            inbound: Some(link.inbound),
            outbound: Some(link.outbound),
            handle: link.handle,
            reaped: false,
        });
    }

    /// Read every result block, one thread per worker.
    fn drain(&mut self, shape: BlockShape) -> Vec<RunResult<Vec<WireInt>>> {
        thread::scope(|scope| {
            let pending: Vec<_> = self
                .workers
                .iter_mut()
                .map(|worker| {
                    let coord = worker.spec.coord;
                    let outbound = worker.outbound.take();
                    scope.spawn(move || -> RunResult<Vec<WireInt>> {
                        let mut outbound = outbound.ok_or_else(|| {
                            RunError::message(
                                RunErrorKind::Channel,
                                format!("outbound channel of worker {coord} is already closed"),
                            )
                        })?;
                        let mut block = try_filled(0, shape.result_len())?;
                        read_results(&mut outbound, &mut block)
                            .with_context(|| format!("gathering block {coord}"))?;
                        debug!(%coord, values = block.len(), "gathered block");
                        Ok(block)
                    })
                })
                .collect();

            pending
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(RunError::message(
                            RunErrorKind::WorkerFailed,
                            "result drain thread panicked",
                        ))
                    })
                })
                .collect()
        })
    }

    /// Wait for every worker and return the first failure.
    fn wait_all(&mut self) -> RunResult<()> {
        let mut first = None;
        for worker in self.workers.iter_mut() {
            worker.inbound = None;
            worker.outbound = None;
            let result = worker.handle.wait();
            mark_reaped(self.registry, worker);

            if let Err(err) = result {
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

fn mark_reaped(registry: Option<&ShutdownRegistry>, worker: &mut ActiveWorker) {
    worker.reaped = true;
    if let (Some(registry), Some(pid)) = (registry, worker.handle.pid()) {
        registry.unregister(pid);
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        for worker in self.workers.iter_mut().filter(|w| !w.reaped) {
            worker.inbound = None;
            worker.outbound = None;
            worker.handle.terminate();
            if let Err(err) = worker.handle.wait() {
                debug!(coord = %worker.spec.coord, "reaped failed worker: {err}");
            }
            mark_reaped(self.registry, worker);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rstest::rstest;

    use super::*;
    use crate::{
        config::RunConfigBuilder,
        grid::{quadrant, BlockCoord},
        transport::ThreadTransport,
    };

    fn view(data: &[u8], side: usize) -> MatrixView<'_, u8> {
        MatrixView::try_from(data, side, side).unwrap()
    }

    fn random_square(rng: &mut StdRng, side: usize) -> Vec<u8> {
        (0..side * side).map(|_| rng.random()).collect()
    }

    const A: [u8; 4] = [1, 2, 3, 4];
    const B: [u8; 4] = [5, 6, 7, 8];

    #[test]
    fn two_by_two_product() {
        let grid = BlockGrid::quadrants(2).unwrap();
        let product = multiply(view(&A, 2), view(&B, 2), grid, &ThreadTransport).unwrap();
        assert_eq!(product.as_slice(), &[19, 22, 43, 50]);
    }

    /// Wraps a transport and records the bytes sent to every worker.
    #[derive(Default)]
    struct Recording {
        inner: ThreadTransport,
        sent: Mutex<Vec<(BlockSpec, Arc<Mutex<Vec<u8>>>)>>,
    }

    struct Tee {
        inner: Box<dyn Write + Send>,
        log: Arc<Mutex<Vec<u8>>>,
    }

    impl Write for Tee {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = self.inner.write(buf)?;
            self.log.lock().unwrap().extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    impl Transport for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn spawn(&self, spec: &BlockSpec) -> RunResult<WorkerLink> {
            let mut link = self.inner.spawn(spec)?;
            let log = Arc::new(Mutex::new(Vec::new()));
            self.sent.lock().unwrap().push((*spec, log.clone()));
            link.inbound = Box::new(Tee {
                inner: link.inbound,
                log,
            });
            Ok(link)
        }
    }

    #[test]
    fn smallest_grid_dispatches_single_entry_blocks() {
        let transport = Recording::default();
        let grid = BlockGrid::quadrants(2).unwrap();
        let product = multiply(view(&A, 2), view(&B, 2), grid, &transport).unwrap();
        assert_eq!(product.as_slice(), &[19, 22, 43, 50]);

        let sent = transport.sent.lock().unwrap();
        let expected = [
            (quadrant::TOP_LEFT, [1, 2, 5, 7]),
            (quadrant::TOP_RIGHT, [1, 2, 6, 8]),
            (quadrant::BOTTOM_LEFT, [3, 4, 5, 7]),
            (quadrant::BOTTOM_RIGHT, [3, 4, 6, 8]),
        ];
        assert_eq!(sent.len(), expected.len());
        for ((spec, log), (coord, bytes)) in sent.iter().zip(expected) {
            assert_eq!(spec.coord, coord);
            assert_eq!(spec.shape, BlockShape::new(1, 2, 1));
            assert_eq!(log.lock().unwrap().as_slice(), bytes.as_slice(), "{coord}");
        }
    }

    #[rstest]
    #[case(4, 1)]
    #[case(8, 2)]
    #[case(8, 4)]
    #[case(8, 8)]
    #[case(16, 4)]
    #[case(64, 2)]
    fn blocked_matches_direct(#[case] side: usize, #[case] splits: usize) {
        let mut rng = StdRng::seed_from_u64(0x5eed + (side * splits) as u64);
        let a = random_square(&mut rng, side);
        let b = random_square(&mut rng, side);

        let grid = BlockGrid::new(side, splits).unwrap();
        let product = multiply(view(&a, side), view(&b, side), grid, &ThreadTransport).unwrap();
        let direct = direct_product(view(&a, side), view(&b, side));
        assert_eq!(product.as_slice(), direct.as_slice());
    }

    #[test]
    fn large_result_blocks_do_not_deadlock() {
        // Every 128x128 block is 128 KiB on the wire, more than a default pipe buffer.
        let side = 256;
        let mut rng = StdRng::seed_from_u64(7);
        let a = random_square(&mut rng, side);
        let b = random_square(&mut rng, side);

        let grid = BlockGrid::quadrants(side).unwrap();
        let product = multiply(view(&a, side), view(&b, side), grid, &ThreadTransport).unwrap();
        let direct = direct_product(view(&a, side), view(&b, side));
        assert_eq!(product.as_slice(), direct.as_slice());
    }

    /// Forwards only the first `limit` bytes written to each worker.
    struct Truncating {
        limit: usize,
    }

    struct Limited {
        inner: Box<dyn Write + Send>,
        remaining: usize,
    }

    impl Write for Limited {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.remaining);
            self.inner.write_all(&buf[..n])?;
            self.remaining -= n;
            // Pretend everything went through.
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    impl Transport for Truncating {
        fn name(&self) -> &'static str {
            "truncating"
        }

        fn spawn(&self, spec: &BlockSpec) -> RunResult<WorkerLink> {
            let mut link = ThreadTransport.spawn(spec)?;
            link.inbound = Box::new(Limited {
                inner: link.inbound,
                remaining: self.limit,
            });
            Ok(link)
        }
    }

    #[rstest]
    #[case(0)]
    #[case(7)]
    #[case(32)]
    #[case(63)]
    fn short_inbound_fails_the_run(#[case] limit: usize) {
        // Each quadrant worker of an 8x8 product needs two 32 byte bands.
        let side = 8;
        let a = vec![1u8; side * side];
        let grid = BlockGrid::quadrants(side).unwrap();

        let err = multiply(view(&a, side), view(&a, side), grid, &Truncating { limit })
            .unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::ShortTransfer, "{err}");
    }

    /// Reports every worker failure as a bare exit status, the way a child process does.
    struct OpaqueExit {
        limit: usize,
    }

    struct OpaqueHandle {
        inner: Box<dyn WorkerHandle>,
    }

    impl WorkerHandle for OpaqueHandle {
        fn pid(&self) -> Option<u32> {
            None
        }

        fn wait(&mut self) -> RunResult<()> {
            self.inner.wait().map_err(|_| {
                RunError::message(RunErrorKind::WorkerFailed, "worker exited with status 1")
            })
        }

        fn terminate(&mut self) {
            self.inner.terminate()
        }
    }

    impl Transport for OpaqueExit {
        fn name(&self) -> &'static str {
            "opaque-exit"
        }

        fn spawn(&self, spec: &BlockSpec) -> RunResult<WorkerLink> {
            let mut link = Truncating { limit: self.limit }.spawn(spec)?;
            link.handle = Box::new(OpaqueHandle { inner: link.handle });
            Ok(link)
        }
    }

    #[test]
    fn short_transfer_outranks_an_exit_status() {
        let side = 8;
        let a = vec![1u8; side * side];
        let grid = BlockGrid::quadrants(side).unwrap();

        let err = multiply(view(&a, side), view(&a, side), grid, &OpaqueExit { limit: 10 })
            .unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::ShortTransfer, "{err}");
    }

    #[test]
    fn settle_prefers_worker_errors() {
        let short = || Err(RunError::message(RunErrorKind::ShortTransfer, "block ended early"));
        let failed = || Err(RunError::message(RunErrorKind::WorkerFailed, "exit status 1"));
        let index = || Err(RunError::message(RunErrorKind::IndexOutOfRange, "index out of range"));

        let blocks = settle(Ok(()), vec![Ok(vec![1]), Ok(vec![2])]).unwrap();
        assert_eq!(blocks, vec![vec![1], vec![2]]);

        let err = settle(failed(), vec![Ok(vec![1]), short()]).unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::ShortTransfer);

        let err = settle(failed(), vec![Ok(vec![1]), Ok(vec![2])]).unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::WorkerFailed);

        let err = settle(index(), vec![short()]).unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::IndexOutOfRange);

        let err = settle(Ok(()), vec![Ok(vec![1]), short()]).unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::ShortTransfer);
    }

    #[test]
    fn mismatched_operands_are_rejected() {
        let grid = BlockGrid::quadrants(4).unwrap();
        let err = multiply(view(&A, 2), view(&B, 2), grid, &ThreadTransport).unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::Configuration);
        assert!(err.to_string().contains("operand A is 2x2, expected 4x4"));
    }

    /// Fails to spawn after `ok` successful spawns.
    struct FailingSpawn {
        ok: usize,
        spawned: AtomicUsize,
    }

    impl Transport for FailingSpawn {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn spawn(&self, spec: &BlockSpec) -> RunResult<WorkerLink> {
            if self.spawned.fetch_add(1, Ordering::SeqCst) >= self.ok {
                return Err(RunError::message(
                    RunErrorKind::Spawn,
                    format!("no worker for {}", spec.coord),
                ));
            }
            ThreadTransport.spawn(spec)
        }
    }

    #[test]
    fn spawn_failure_reaps_started_workers() {
        let transport = FailingSpawn {
            ok: 2,
            spawned: AtomicUsize::new(0),
        };
        let grid = BlockGrid::quadrants(4).unwrap();
        let a = [3u8; 16];

        // Returning at all means the two started workers saw end of stream and were joined.
        let err = multiply(view(&a, 4), view(&a, 4), grid, &transport).unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::Spawn);
        assert!(err.to_string().contains("no worker for (1, 0)"));
    }

    /// Thread workers that claim a process id, to exercise the registry bookkeeping.
    struct FakePids {
        seen: Mutex<Vec<u32>>,
        registry: ShutdownRegistry,
    }

    struct FakePidHandle {
        inner: Box<dyn WorkerHandle>,
        pid: u32,
    }

    impl WorkerHandle for FakePidHandle {
        fn pid(&self) -> Option<u32> {
            Some(self.pid)
        }

        fn wait(&mut self) -> RunResult<()> {
            self.inner.wait()
        }

        fn terminate(&mut self) {
            self.inner.terminate()
        }
    }

    impl Transport for FakePids {
        fn name(&self) -> &'static str {
            "fake-pids"
        }

        fn spawn(&self, spec: &BlockSpec) -> RunResult<WorkerLink> {
            // Every earlier worker is still registered when the next one spawns.
            let mut seen = self.seen.lock().unwrap();
            assert_eq!(self.registry.pids(), *seen);

            let pid = u32::MAX - (spec.coord.row * 10 + spec.coord.col) as u32;
            seen.push(pid);

            let mut link = ThreadTransport.spawn(spec)?;
            link.handle = Box::new(FakePidHandle {
                inner: link.handle,
                pid,
            });
            Ok(link)
        }
    }

    #[test]
    fn registry_tracks_live_workers() {
        let registry = ShutdownRegistry::new();
        let transport = FakePids {
            seen: Mutex::new(Vec::new()),
            registry: registry.clone(),
        };
        let grid = BlockGrid::quadrants(2).unwrap();

        let product = Coordinator::new(&transport)
            .with_registry(registry.clone())
            .multiply(view(&A, 2), view(&B, 2), grid)
            .unwrap();
        assert_eq!(product.as_slice(), &[19, 22, 43, 50]);
        assert_eq!(transport.seen.lock().unwrap().len(), 4);
        assert!(registry.pids().is_empty());
    }

    #[test]
    fn failures_after_an_interrupt_are_reported_as_interrupts() {
        let registry = ShutdownRegistry::new();
        registry.interrupt();

        let grid = BlockGrid::quadrants(2).unwrap();
        let err = Coordinator::new(&Truncating { limit: 1 })
            .with_registry(registry)
            .multiply(view(&A, 2), view(&B, 2), grid)
            .unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::Interrupted);
    }

    #[test]
    fn full_run() {
        let config = RunConfigBuilder::new_with(1, |b| {
            b.verify(true);
        })
        .build()
        .unwrap();

        let output = Coordinator::new(&ThreadTransport)
            .run(&config, view(&A, 2), view(&B, 2))
            .unwrap();
        assert_eq!(output.product.as_slice(), &[19, 22, 43, 50]);
        assert_eq!(output.workers, 4);
        assert!(output.verified);
        assert!(output.svd.converged);

        let mut s2 = output.svd.squared_singular_values.clone();
        s2.sort_by(|x, y| y.total_cmp(x));
        approx::assert_relative_eq!(s2[0], 5193.996919520698, max_relative = 1e-12);
        approx::assert_relative_eq!(s2[1], 0.0030804793009917633, max_relative = 1e-6);
    }

    #[test]
    fn verification_catches_a_wrong_block() {
        let a = [1u8, 0, 0, 1];
        let product = Matrix::try_from(vec![1i64, 0, 0, 2].into_boxed_slice(), 2, 2).unwrap();
        let err = verify(view(&a, 2), view(&a, 2), product.as_view()).unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::WorkerFailed);
        assert!(err.to_string().contains("at (1, 1): got 2, expected 1"));
    }

    #[test]
    fn block_coordinates_are_row_major() {
        let grid = BlockGrid::new(4, 2).unwrap();
        let coords: Vec<BlockCoord> = grid.blocks().map(|s| s.coord).collect();
        assert_eq!(coords[1], quadrant::TOP_RIGHT);
    }
}
