/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{
    fmt::{Debug, Display},
    io,
};

use blockmul_linalg::{BlockError, SvdError};
use blockmul_utils::AllocError;

use crate::{wire::TransferError, worker::WorkerError};

/// Convenience alias for a `Result<T, RunError>`.
pub type RunResult<T> = Result<T, RunError>;

/// Classify the origin of a [`RunError`].
///
/// Every kind except [`RunErrorKind::Configuration`] aborts a run that is already under
/// way; there is no partial-success mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunErrorKind {
    /// Invalid sizes or grid parameters, detected before any worker starts.
    Configuration,
    /// An allocation request could not be satisfied.
    ResourceExhausted,
    /// A channel carried fewer bytes or integers than the protocol requires.
    ShortTransfer,
    /// A block product touched an entry outside its operands.
    IndexOutOfRange,
    /// Channel creation or a channel write failed.
    Channel,
    /// A worker could not be started.
    Spawn,
    /// A worker finished with a failure status.
    WorkerFailed,
    /// The run was interrupted from outside.
    Interrupted,
}

/// Common error type for a block multiplication run.
///
/// The `kind()` tells callers which part of the protocol failed; the wrapped error keeps
/// the full source chain plus the file and line where it was raised and where context was
/// attached.
/// ```rust
/// use blockmul::{RunError, RunErrorKind, ErrorContext};
///
/// fn dispatch() -> Result<(), RunError> {
///     Err(RunError::message(RunErrorKind::ShortTransfer, "worker (0, 1) hung up"))
/// }
///
/// let err = dispatch().context("while sending bands").unwrap_err();
/// assert_eq!(err.kind(), RunErrorKind::ShortTransfer);
///
/// let message = err.to_string();
/// assert!(message.contains("worker (0, 1) hung up"));
/// assert!(message.contains("while sending bands"));
/// ```
#[derive(Debug)]
pub struct RunError {
    kind: RunErrorKind,
    error: anyhow::Error,
}

impl RunError {
    /// Construct a new `RunError` encapsulating `err`.
    ///
    /// Errors constructed this way can be retrieved using downcasting.
    #[track_caller]
    #[inline(never)]
    pub fn new<E>(kind: RunErrorKind, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            kind,
            error: anyhow::Error::new(Located::new(err)),
        }
    }

    /// Construct a new `RunError` with the provided error message.
    #[track_caller]
    #[inline(never)]
    pub fn message<D>(kind: RunErrorKind, display: D) -> Self
    where
        D: Display + Debug + Send + Sync + 'static,
    {
        Self {
            kind,
            error: anyhow::Error::msg(Located::new(display)),
        }
    }

    /// Attempt to downcast the error object by reference.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Display + Debug + Send + Sync + 'static,
    {
        match self.error.downcast_ref::<E>() {
            Some(err) => Some(err),
            None => self.error.downcast_ref::<Located<E>>().map(|e| &e.err),
        }
    }

    /// Attach the context to `Self` and return a new error.
    #[track_caller]
    #[inline(never)]
    pub fn context<C>(self, context: C) -> Self
    where
        C: Display + Debug + Send + Sync + 'static,
    {
        Self {
            kind: self.kind,
            error: self.error.context(Located::new(context)),
        }
    }

    /// Return the kind of the originally constructed error.
    pub fn kind(&self) -> RunErrorKind {
        self.kind
    }
}

impl Display for RunError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `{:?}` on `anyhow::Error` prints the whole source chain.
        write!(formatter, "RunError: {:?}\n\n{:?}", self.kind, self.error)
    }
}

impl std::error::Error for RunError {
    // Don't implement `source` because we print the whole source chain in our `Display`
    // implementation.
}

impl From<io::Error> for RunError {
    #[track_caller]
    fn from(err: io::Error) -> Self {
        RunError::new(RunErrorKind::Channel, err)
    }
}

impl From<AllocError> for RunError {
    #[track_caller]
    fn from(err: AllocError) -> Self {
        RunError::new(RunErrorKind::ResourceExhausted, err)
    }
}

impl From<TransferError> for RunError {
    #[track_caller]
    fn from(err: TransferError) -> Self {
        let kind = match err {
            TransferError::Short { .. } => RunErrorKind::ShortTransfer,
            TransferError::Io(_) => RunErrorKind::Channel,
        };
        RunError::new(kind, err)
    }
}

impl From<BlockError> for RunError {
    #[track_caller]
    fn from(err: BlockError) -> Self {
        let kind = match err {
            BlockError::Shape { .. } => RunErrorKind::Configuration,
            BlockError::Index(_) => RunErrorKind::IndexOutOfRange,
            BlockError::Alloc(_) => RunErrorKind::ResourceExhausted,
        };
        RunError::new(kind, err)
    }
}

impl From<WorkerError> for RunError {
    #[track_caller]
    fn from(err: WorkerError) -> Self {
        let kind = match err {
            WorkerError::Transfer(TransferError::Short { .. }) => RunErrorKind::ShortTransfer,
            WorkerError::Transfer(TransferError::Io(_)) => RunErrorKind::Channel,
            WorkerError::Multiply(BlockError::Index(_)) => RunErrorKind::IndexOutOfRange,
            WorkerError::Multiply(BlockError::Shape { .. }) => RunErrorKind::Configuration,
            WorkerError::Multiply(BlockError::Alloc(_)) | WorkerError::Alloc(_) => {
                RunErrorKind::ResourceExhausted
            }
        };
        RunError::new(kind, err)
    }
}

impl From<SvdError> for RunError {
    #[track_caller]
    fn from(err: SvdError) -> Self {
        let kind = match err {
            SvdError::Alloc(_) => RunErrorKind::ResourceExhausted,
            SvdError::NotSquare { .. } | SvdError::Empty => RunErrorKind::Configuration,
        };
        RunError::new(kind, err)
    }
}

/// An internal wrapper for error types that also tracks the file and line information
/// for where the error was first converted and where context was propagated.
#[derive(Debug)]
struct Located<T>
where
    T: Debug,
{
    err: T,
    location: &'static std::panic::Location<'static>,
}

impl<T> Located<T>
where
    T: Debug,
{
    #[track_caller]
    fn new(err: T) -> Self {
        Self {
            err,
            location: std::panic::Location::caller(),
        }
    }
}

impl<T> Display for Located<T>
where
    T: Display + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -- ({}:{})",
            self.err,
            self.location.file(),
            self.location.line()
        )
    }
}

impl<T> std::error::Error for Located<T>
where
    T: std::error::Error + Debug,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.err.source()
    }
}

//////////////////
// ErrorContext //
//////////////////

/// Add context to a returned error that will be included in the source chain.
pub trait ErrorContext<T> {
    /// Attach the provided context to the error part of the result.
    fn context<C>(self, context: C) -> Result<T, RunError>
    where
        C: Display + Debug + Send + Sync + 'static;

    /// Attach the provided context to the error part of the result.
    ///
    /// The function `f` will only be evaluated if `self` is an `Err`.
    fn with_context<F, C>(self, f: F) -> Result<T, RunError>
    where
        C: Display + Debug + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    RunError: From<E>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T, RunError>
    where
        C: Display + Debug + Send + Sync + 'static,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => Err(RunError::from(error).context(context)),
        }
    }

    #[track_caller]
    fn with_context<F, C>(self, f: F) -> Result<T, RunError>
    where
        C: Display + Debug + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => Err(RunError::from(error).context(f())),
        }
    }
}
