/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Ways of starting a block worker and connecting its channel pair.
//!
//! A [`Transport`] hands back a [`WorkerLink`]: the write end of the worker's inbound
//! channel, the read end of its outbound channel and a handle for waiting on or
//! terminating it. The worker's own ends are owned by the worker once `spawn` returns, so
//! dropping the link's `inbound` is what signals end of stream.

use std::{
    ffi::OsString,
    fmt,
    io::{Read, Write},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    thread::{self, JoinHandle},
};

use tracing::debug;

use crate::{
    error::{ErrorContext, RunError, RunErrorKind, RunResult},
    grid::BlockSpec,
    worker::{self, WorkerError},
};

/// Start one worker per block.
pub trait Transport: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Create the channel pair for `spec` and start a worker serving it.
    fn spawn(&self, spec: &BlockSpec) -> RunResult<WorkerLink>;
}

/// The coordinator's side of one running worker.
pub struct WorkerLink {
    pub inbound: Box<dyn Write + Send>,
    pub outbound: Box<dyn Read + Send>,
    pub handle: Box<dyn WorkerHandle>,
}

impl fmt::Debug for WorkerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerLink")
            .field("pid", &self.handle.pid())
            .finish_non_exhaustive()
    }
}

/// Control over a running worker.
pub trait WorkerHandle: Send {
    /// OS process id, if the worker is a separate process.
    fn pid(&self) -> Option<u32>;

    /// Block until the worker finishes. Succeeds only if the worker served its block.
    ///
    /// Calling `wait` again after it returned is a no-op that succeeds.
    fn wait(&mut self) -> RunResult<()>;

    /// Ask the worker to stop without waiting for it.
    fn terminate(&mut self);
}

/////////////
// Threads //
/////////////

/// Run every worker as a named thread joined to the coordinator by anonymous pipes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadTransport;

impl ThreadTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for ThreadTransport {
    fn name(&self) -> &'static str {
        "thread"
    }

    fn spawn(&self, spec: &BlockSpec) -> RunResult<WorkerLink> {
        let (inbound_reader, inbound_writer) =
            std::io::pipe().with_context(|| format!("creating inbound channel {}", spec.coord))?;
        let (outbound_reader, outbound_writer) = std::io::pipe()
            .with_context(|| format!("creating outbound channel {}", spec.coord))?;

        let shape = spec.shape;
        let join = thread::Builder::new()
            .name(format!("block-worker-{}-{}", spec.coord.row, spec.coord.col))
            .spawn(move || worker::serve(shape, inbound_reader, outbound_writer))
            .map_err(|err| RunError::new(RunErrorKind::Spawn, err))
            .with_context(|| format!("starting worker thread {}", spec.coord))?;

        Ok(WorkerLink {
            inbound: Box::new(inbound_writer),
            outbound: Box::new(outbound_reader),
            handle: Box::new(ThreadHandle {
                spec: *spec,
                join: Some(join),
            }),
        })
    }
}

struct ThreadHandle {
    spec: BlockSpec,
    join: Option<JoinHandle<Result<(), WorkerError>>>,
}

impl WorkerHandle for ThreadHandle {
    fn pid(&self) -> Option<u32> {
        None
    }

    fn wait(&mut self) -> RunResult<()> {
        let Some(join) = self.join.take() else {
            return Ok(());
        };
        match join.join() {
            Ok(result) => result.with_context(|| format!("worker {}", self.spec.coord)),
            Err(_) => Err(RunError::message(
                RunErrorKind::WorkerFailed,
                format!("worker thread {} panicked", self.spec.coord),
            )),
        }
    }

    fn terminate(&mut self) {
        // A thread cannot be stopped from outside. Closing its channel ends makes it
        // finish on its own.
    }
}

///////////////
// Processes //
///////////////

/// Name of the worker binary shipped alongside the command line driver.
pub const WORKER_BINARY: &str = "blockmul-worker";

/// Run every worker as a child process of `program`.
///
/// The child receives its block shape as `--rows`, `--inner` and `--cols`, reads the
/// inbound channel from stdin and writes the outbound channel to stdout. Its stderr is
/// inherited.
#[derive(Debug, Clone)]
pub struct ProcessTransport {
    program: PathBuf,
}

impl ProcessTransport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Look for the worker binary in the directory of the running executable.
    pub fn sibling() -> RunResult<Self> {
        let exe = std::env::current_exe().context("locating the running executable")?;
        let mut name = OsString::from(WORKER_BINARY);
        name.push(std::env::consts::EXE_SUFFIX);

        let program = exe.with_file_name(name);
        if !program.is_file() {
            return Err(RunError::message(
                RunErrorKind::Spawn,
                format!("worker binary not found at {}", program.display()),
            ));
        }
        Ok(Self { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Transport for ProcessTransport {
    fn name(&self) -> &'static str {
        "process"
    }

    fn spawn(&self, spec: &BlockSpec) -> RunResult<WorkerLink> {
        let shape = spec.shape;
        let mut child = Command::new(&self.program)
            .arg("--rows")
            .arg(shape.rows.to_string())
            .arg("--inner")
            .arg(shape.inner.to_string())
            .arg("--cols")
            .arg(shape.cols.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| RunError::new(RunErrorKind::Spawn, err))
            .with_context(|| {
                format!(
                    "starting {} for worker {}",
                    self.program.display(),
                    spec.coord
                )
            })?;

        debug!(pid = child.id(), coord = %spec.coord, "spawned worker process");

        // `Stdio::piped` guarantees both ends are present.
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RunError::message(
                RunErrorKind::Channel,
                format!("worker {} was started without its channels", spec.coord),
            ));
        };

        Ok(WorkerLink {
            inbound: Box::new(stdin),
            outbound: Box::new(stdout),
            handle: Box::new(ProcessHandle {
                spec: *spec,
                child,
                reaped: false,
            }),
        })
    }
}

struct ProcessHandle {
    spec: BlockSpec,
    child: Child,
    reaped: bool,
}

impl WorkerHandle for ProcessHandle {
    fn pid(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn wait(&mut self) -> RunResult<()> {
        if self.reaped {
            return Ok(());
        }
        let status = self
            .child
            .wait()
            .with_context(|| format!("waiting for worker {}", self.spec.coord))?;
        self.reaped = true;

        if status.success() {
            Ok(())
        } else {
            Err(RunError::message(
                RunErrorKind::WorkerFailed,
                format!("worker {} exited with {status}", self.spec.coord),
            ))
        }
    }

    fn terminate(&mut self) {
        if !self.reaped {
            // Fails only if the child already exited, which `wait` handles.
            let _ = self.child.kill();
        }
    }
}
