/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Teardown of worker processes when a run is interrupted from outside.
//!
//! Every worker process that a run spawns is recorded in the installed
//! [`ShutdownRegistry`] until it has been reaped. An interrupt hook (installed by the
//! binary, not by this crate) calls [`interrupt`] to terminate whatever is still alive.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use tracing::{debug, warn};

/// Set of live worker process ids.
#[derive(Debug, Clone, Default)]
pub struct ShutdownRegistry {
    pids: Arc<Mutex<Vec<u32>>>,
    interrupted: Arc<AtomicBool>,
}

impl ShutdownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u32>> {
        // The list stays consistent even if a holder panicked.
        self.pids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a spawned worker process.
    pub fn register(&self, pid: u32) {
        self.lock().push(pid);
    }

    /// Forget a worker process after it has been reaped.
    pub fn unregister(&self, pid: u32) {
        self.lock().retain(|&p| p != pid);
    }

    /// Return the currently registered process ids.
    pub fn pids(&self) -> Vec<u32> {
        self.lock().clone()
    }

    /// Send a termination request to every registered process.
    ///
    /// Returns the number of processes that accepted the request.
    pub fn terminate_all(&self) -> usize {
        let pids = self.pids();
        pids.into_iter().filter(|&pid| terminate(pid)).count()
    }

    /// Mark the registry as interrupted and terminate every registered process.
    pub fn interrupt(&self) -> usize {
        self.interrupted.store(true, Ordering::SeqCst);
        self.terminate_all()
    }

    /// Return whether [`ShutdownRegistry::interrupt`] has been called.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

#[cfg(unix)]
fn terminate(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: `kill` has no memory-safety preconditions. A stale pid at worst targets
    // no process and returns an error.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        debug!(pid, "termination request was not delivered");
    }
    rc == 0
}

#[cfg(not(unix))]
fn terminate(pid: u32) -> bool {
    std::process::Command::new("taskkill")
        .args(["/F", "/PID", &pid.to_string()])
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/////////////////////////
// Process-wide handle //
/////////////////////////

static INSTALLED: Mutex<Option<ShutdownRegistry>> = Mutex::new(None);

fn installed_slot() -> MutexGuard<'static, Option<ShutdownRegistry>> {
    INSTALLED.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install a fresh process-wide registry and return a handle to it.
///
/// Runs started afterwards record their worker processes in this registry. Installing
/// again replaces the previous registry.
pub fn install() -> ShutdownRegistry {
    let registry = ShutdownRegistry::new();
    if installed_slot().replace(registry.clone()).is_some() {
        warn!("replacing an already installed shutdown registry");
    }
    registry
}

/// Remove the process-wide registry.
pub fn clear() {
    installed_slot().take();
}

/// Return the process-wide registry, if one is installed.
pub fn installed() -> Option<ShutdownRegistry> {
    installed_slot().clone()
}

/// Interrupt the installed registry. Returns the number of terminated processes.
pub fn interrupt() -> usize {
    match installed() {
        Some(registry) => registry.interrupt(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_unregister() {
        let registry = ShutdownRegistry::new();
        registry.register(10);
        registry.register(11);
        registry.register(12);
        registry.unregister(11);
        assert_eq!(registry.pids(), vec![10, 12]);

        // Clones share state.
        let other = registry.clone();
        other.unregister(10);
        assert_eq!(registry.pids(), vec![12]);
        assert!(!registry.is_interrupted());
    }

    #[cfg(unix)]
    #[test]
    fn interrupt_terminates_live_processes() {
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();

        let registry = ShutdownRegistry::new();
        registry.register(child.id());
        assert_eq!(registry.interrupt(), 1);
        assert!(registry.is_interrupted());

        let status = child.wait().unwrap();
        assert!(!status.success());

        use std::os::unix::process::ExitStatusExt;
        assert_eq!(status.signal(), Some(libc::SIGTERM));
    }

    #[test]
    fn process_wide_handle() {
        // Only this test touches the process-wide slot.
        let registry = install();
        registry.register(u32::MAX);
        assert_eq!(installed().unwrap().pids(), vec![u32::MAX]);

        // `u32::MAX` is not a valid pid, so nothing is terminated.
        assert_eq!(interrupt(), 0);
        assert!(registry.is_interrupted());

        clear();
        assert!(installed().is_none());
        assert_eq!(interrupt(), 0);
    }
}
