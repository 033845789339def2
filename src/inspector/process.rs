//! Inspector running as an external program, isolated in its own OS process.

use super::{wait_until, InspectionResult, Inspector, IsolatedInspection, Terminate};
use crate::{artifacts::PackageArtifacts, error::InspectorError};
use log::{debug, warn};
use serde::Deserialize;
use std::{
    io::Read,
    path::Path,
    process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio},
    sync::{mpsc, Arc, Mutex, MutexGuard},
    thread,
    time::Duration,
};

/// Time given to a child that closed its output to report its exit status.
const EXIT_STATUS_WAIT: Duration = Duration::from_secs(1);
/// Largest reply accepted from the full inspection, in bytes.
const MAX_REPLY_SIZE: u64 = 64 * 1024 * 1024;

/// Inspector backed by an external program.
///
/// The program is invoked as `<program> [args…] full <package>` or
/// `<program> [args…] light <package>` and must write a single JSON document on its standard
/// output: either the package artifacts or an object of the form `{"error": "message"}`. A full
/// inspection reply over 64 MiB is rejected as malformed.
#[derive(Debug, Clone)]
pub struct CommandInspector {
    program: String,
    args: Vec<String>,
}

impl CommandInspector {
    /// Creates an inspector that runs the given program.
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Adds arguments passed to the program before the inspection mode.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Gets the program run by this inspector.
    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, mode: &str, path: &Path) -> Command {
        let mut command = Command::new(&self.program);
        let _ = command.args(&self.args).arg(mode).arg(path);
        let _ = command.stdin(Stdio::null());
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> InspectorError {
        InspectorError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl Inspector for CommandInspector {
    fn spawn_full(&self, path: &Path) -> Result<IsolatedInspection, InspectorError> {
        let mut child = self
            .command("full", path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;
        debug!(
            "started full inspection of `{}` in process {}",
            path.display(),
            child.id()
        );

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let child = Arc::new(Mutex::new(child));
        let (tx, rx) = mpsc::channel();

        let reader_child = Arc::clone(&child);
        let reader = thread::Builder::new()
            .name(String::from("inspector-reader"))
            .spawn(move || {
                let result = collect_reply(stdout, stderr, &reader_child);
                // The receiver is gone if the orchestrator already timed out.
                let _ = tx.send(result);
            });
        if let Err(e) = reader {
            let _ = lock(&child).kill();
            return Err(e.into());
        }

        Ok(IsolatedInspection::new(rx, Box::new(ProcessHandle { child })))
    }

    fn light_inspect(&self, path: &Path) -> InspectionResult {
        let output = self
            .command("light", path)
            .output()
            .map_err(|e| self.spawn_error(e))?;

        parse_reply(
            &output.stdout,
            Some(output.status),
            &String::from_utf8_lossy(&output.stderr),
        )
        .map(PackageArtifacts::into_partial)
    }
}

/// Termination handle of an inspector process.
struct ProcessHandle {
    child: Arc<Mutex<Child>>,
}

impl Terminate for ProcessHandle {
    fn terminate(&mut self) {
        let mut child = lock(&self.child);
        if let Ok(None) = child.try_wait() {
            if let Err(e) = child.kill() {
                warn!("could not kill inspector process {}: {}", child.id(), e);
            }
        }
    }

    fn reap(&mut self, grace: Duration) -> bool {
        wait_until(grace, || match lock(&self.child).try_wait() {
            Ok(Some(_)) => true,
            Ok(None) => false,
            // The process can no longer be waited for, so there is nothing left to reap.
            Err(_) => true,
        })
    }
}

/// Reply written by the inspector program.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Reply {
    Error { error: String },
    Artifacts(PackageArtifacts),
}

/// Reads the whole output of the inspector process and turns it into a result.
fn collect_reply(
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    child: &Mutex<Child>,
) -> InspectionResult {
    let stderr_reader = stderr.map(|mut stderr| {
        thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        })
    });

    let bytes = match stdout {
        Some(stdout) => match read_capped(stdout, MAX_REPLY_SIZE) {
            Err(e @ InspectorError::Oversized { .. }) => {
                // The child would block on the full pipe, and stderr would never reach its end.
                let _ = lock(child).kill();
                return Err(e);
            }
            result => result?,
        },
        None => Vec::new(),
    };
    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    let mut status = None;
    let _ = wait_until(EXIT_STATUS_WAIT, || match lock(child).try_wait() {
        Ok(Some(s)) => {
            status = Some(s);
            true
        }
        Ok(None) => false,
        Err(_) => true,
    });

    parse_reply(&bytes, status, &stderr)
}

/// Reads the whole reply, failing once it grows over `limit` bytes.
fn read_capped<R: Read>(reader: R, limit: u64) -> Result<Vec<u8>, InspectorError> {
    let mut bytes = Vec::new();
    let read = reader.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    if read as u64 > limit {
        return Err(InspectorError::Oversized { limit });
    }
    Ok(bytes)
}

/// Parses the reply of the inspector.
///
/// An empty output, or an unparseable one from a process that did not exit successfully, means
/// the process died without writing a result.
fn parse_reply(stdout: &[u8], status: Option<ExitStatus>, stderr: &str) -> InspectionResult {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(InspectorError::died(status, stderr));
    }

    match serde_json::from_slice::<Reply>(stdout) {
        Ok(Reply::Artifacts(artifacts)) => Ok(artifacts.normalize()),
        Ok(Reply::Error { error }) => Err(InspectorError::Reported(error)),
        Err(e) => match status {
            Some(s) if s.success() => Err(e.into()),
            _ => Err(InspectorError::died(status, stderr)),
        },
    }
}

/// Locks the child, even if another thread panicked while holding it.
fn lock(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    match child.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
