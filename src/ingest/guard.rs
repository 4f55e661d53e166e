//! Single-flight guard.
//!
//! Filesystem event APIs commonly fire several events per write, so the
//! same path can reach the dispatch point more than once. The guard
//! holds the set of paths with a pipeline currently in flight and admits
//! at most one run per path; the permit releases the path on drop, on
//! success and failure alike.
//!
//! The in-flight set is the only shared mutable state in the process.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Set of paths with a pipeline currently in flight.
#[derive(Debug, Default)]
pub struct FlightGuard {
    in_flight: Mutex<HashSet<PathBuf>>,
}

impl FlightGuard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Atomically admit a path, unless a run for it is already in flight.
    ///
    /// Returns a permit that releases the path when dropped.
    pub fn try_acquire(self: &Arc<Self>, path: &Path) -> Option<FlightPermit> {
        let mut in_flight = self.in_flight.lock().expect("flight set poisoned");
        if in_flight.insert(path.to_path_buf()) {
            Some(FlightPermit {
                guard: Arc::clone(self),
                path: path.to_path_buf(),
            })
        } else {
            None
        }
    }

    /// Number of paths currently admitted. For logging only.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().expect("flight set poisoned").len()
    }

    fn release(&self, path: &Path) {
        self.in_flight
            .lock()
            .expect("flight set poisoned")
            .remove(path);
    }
}

/// Scoped admission for one path; releases on drop.
#[derive(Debug)]
pub struct FlightPermit {
    guard: Arc<FlightGuard>,
    path: PathBuf,
}

impl FlightPermit {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.guard.release(&self.path);
    }
}
