//! Inspector running on a thread of the current process.
//!
//! A thread only contains panics: it cannot be forcibly stopped and shares the address space of
//! the orchestrator. Use it for trusted inspectors; untrusted ones belong in a
//! [`CommandInspector`](super::CommandInspector).

use super::{wait_until, InspectionResult, Inspector, IsolatedInspection, Terminate};
use crate::error::InspectorError;
use log::{debug, warn};
use std::{
    path::Path,
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
    time::Duration,
};

/// Package inspector callable in-process.
pub trait PackageInspector: Send + Sync + 'static {
    /// Extracts the full artifact set, including the string constants.
    fn full_inspect(&self, path: &Path) -> InspectionResult;

    /// Extracts the manifest, permissions, package id and version only.
    fn light_inspect(&self, path: &Path) -> InspectionResult;
}

/// Adapter running a [`PackageInspector`] full inspection on its own thread.
#[derive(Debug)]
pub struct InProcessInspector<T> {
    inner: Arc<T>,
}

impl<T: PackageInspector> InProcessInspector<T> {
    /// Wraps the given inspector.
    pub fn new(inspector: T) -> Self {
        Self {
            inner: Arc::new(inspector),
        }
    }
}

impl<T: PackageInspector> Inspector for InProcessInspector<T> {
    fn spawn_full(&self, path: &Path) -> Result<IsolatedInspection, InspectorError> {
        let (tx, rx) = mpsc::channel();
        let inspector = Arc::clone(&self.inner);
        let path = path.to_path_buf();

        // A panic drops the sender, which the receiver sees as a context that died.
        let handle = thread::Builder::new()
            .name(String::from("inspector"))
            .spawn(move || {
                let result = inspector.full_inspect(&path).map(|a| a.normalize());
                let _ = tx.send(result);
            })?;

        Ok(IsolatedInspection::new(
            rx,
            Box::new(ThreadHandle {
                handle: Some(handle),
            }),
        ))
    }

    fn light_inspect(&self, path: &Path) -> InspectionResult {
        self.inner
            .light_inspect(path)
            .map(|artifacts| artifacts.into_partial())
    }
}

/// Termination handle of an inspector thread.
struct ThreadHandle {
    handle: Option<JoinHandle<()>>,
}

impl Terminate for ThreadHandle {
    fn terminate(&mut self) {
        if let Some(ref handle) = self.handle {
            if !handle.is_finished() {
                debug!("inspector threads cannot be stopped, detaching it");
            }
        }
    }

    fn reap(&mut self, grace: Duration) -> bool {
        let finished = match self.handle {
            Some(ref handle) => wait_until(grace, || handle.is_finished()),
            None => true,
        };
        if finished {
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        } else {
            warn!("the inspector thread is still running after the grace period");
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::{InProcessInspector, PackageInspector};
    use crate::{
        artifacts::PackageArtifacts,
        error::InspectorError,
        inspector::{InspectionResult, Inspector, Wait},
    };
    use std::{path::Path, time::Duration};

    struct Panicking;

    impl PackageInspector for Panicking {
        fn full_inspect(&self, _path: &Path) -> InspectionResult {
            panic!("native fault")
        }

        fn light_inspect(&self, _path: &Path) -> InspectionResult {
            Ok(PackageArtifacts {
                string_constants: vec![String::from("should be dropped")],
                ..PackageArtifacts::default()
            })
        }
    }

    #[test]
    fn it_panic_is_contained() {
        let inspector = InProcessInspector::new(Panicking);
        let inspection = inspector.spawn_full(Path::new("app.apk")).unwrap();

        match inspection.wait(Duration::from_secs(10)) {
            Wait::Completed(Err(InspectorError::Died { .. })) => {}
            other => panic!("unexpected wait result: {:?}", other),
        }
        assert!(inspection.shutdown(Duration::from_secs(3)));
    }

    #[test]
    fn it_light_is_partial() {
        let inspector = InProcessInspector::new(Panicking);
        let artifacts = inspector.light_inspect(Path::new("app.apk")).unwrap();
        assert!(artifacts.string_constants.is_empty());
    }
}
