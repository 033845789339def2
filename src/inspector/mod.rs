//! Package inspector boundary.
//!
//! The inspector is the component that actually unpacks the package and yields its manifest,
//! permissions and string constants. It is consumed here as an opaque capability: the full
//! inspection is always started inside an isolated execution context, so that a crash or a hang
//! in the inspector can be contained, while the lightweight inspection runs directly.

mod in_process;
mod process;

pub use in_process::{InProcessInspector, PackageInspector};
pub use process::CommandInspector;

use crate::{artifacts::PackageArtifacts, error::InspectorError};
use log::debug;
use std::{
    fmt,
    path::Path,
    sync::mpsc::{Receiver, RecvTimeoutError},
    time::{Duration, Instant},
};

/// Result of an inspection.
pub type InspectionResult = Result<PackageArtifacts, InspectorError>;

/// Interval between checks while waiting for a terminated context to go away.
const REAP_INTERVAL: Duration = Duration::from_millis(20);

/// Capability to inspect packages.
pub trait Inspector: Send + Sync {
    /// Starts a full inspection of the package in its own failure domain.
    fn spawn_full(&self, path: &Path) -> Result<IsolatedInspection, InspectorError>;

    /// Runs the reduced inspection: manifest, permissions, package id and version only.
    fn light_inspect(&self, path: &Path) -> InspectionResult;
}

/// Control over an isolated execution context.
pub trait Terminate: Send {
    /// Requests the termination of the context. Must not block.
    fn terminate(&mut self);

    /// Waits at most `grace` for the context to be gone. Returns whether it is.
    fn reap(&mut self, grace: Duration) -> bool;
}

/// Outcome of waiting for an isolated inspection.
#[derive(Debug)]
pub enum Wait {
    /// The context wrote its result, or died without one.
    Completed(InspectionResult),
    /// The timeout elapsed first.
    TimedOut,
}

/// A running full inspection.
///
/// The only data crossing the isolation boundary is the single result written once by the
/// context and read once here.
pub struct IsolatedInspection {
    result: Receiver<InspectionResult>,
    handle: Box<dyn Terminate>,
}

impl IsolatedInspection {
    /// Creates a new isolated inspection from its result channel and its termination handle.
    pub fn new(result: Receiver<InspectionResult>, handle: Box<dyn Terminate>) -> Self {
        Self { result, handle }
    }

    /// Blocks until the context signals completion or the timeout elapses.
    pub fn wait(&self, timeout: Duration) -> Wait {
        match self.result.recv_timeout(timeout) {
            Ok(result) => Wait::Completed(result),
            Err(RecvTimeoutError::Timeout) => Wait::TimedOut,
            Err(RecvTimeoutError::Disconnected) => Wait::Completed(Err(InspectorError::Died {
                status: String::from("context dropped its result channel"),
                stderr: String::new(),
            })),
        }
    }

    /// Terminates the context and waits for it at most `grace`.
    ///
    /// Returns `false` if the context could still be alive when the grace period expired.
    pub fn shutdown(mut self, grace: Duration) -> bool {
        let start = Instant::now();
        self.handle.terminate();
        let gone = self.handle.reap(grace);
        debug!(
            "isolated context shut down in {:?} (gone: {})",
            start.elapsed(),
            gone
        );
        gone
    }
}

impl fmt::Debug for IsolatedInspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolatedInspection")
            .field("result", &self.result)
            .finish()
    }
}

/// Polls `finished` until it returns `true` or `grace` elapses.
fn wait_until<F>(grace: Duration, mut finished: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + grace;
    loop {
        if finished() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep(REAP_INTERVAL.min(deadline - now));
    }
}
