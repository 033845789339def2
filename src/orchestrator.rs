//! Bounded-time analysis orchestrator.
//!
//! Obtains the artifacts of a package while bounding the worst-case latency of the inspection
//! and containing its failures. The flow of a run is:
//!
//! ```text
//! Init → SizeCheck ─┬→ SelectFull → Running ─┬→ Completed ──────────────────────→ Full
//!                   │                        ├→ TimedOut ───────┐
//!                   │                        └→ InspectorError ─┤
//!                   └→ SelectLight ─────────────────────────────┴→ LightFallback ─┬→ Degraded
//!                                                                                 └→ Failed
//! ```
//!
//! There is a single fallback: once a terminal outcome is reached nothing else is attempted.

use crate::{
    artifacts::AnalysisOutcome,
    error::Degradation,
    inspector::{Inspector, Wait},
};
use log::{debug, info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

/// Default size above which the full inspection is skipped: 10 MiB.
pub const DEFAULT_SIZE_THRESHOLD: u64 = 10 * 1024 * 1024;
/// Default budget for the full inspection.
pub const DEFAULT_HARD_TIMEOUT: Duration = Duration::from_secs(20);
/// Default time given to a terminated inspection to go away.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);
/// Default caller-side ceiling around a whole analysis.
pub const DEFAULT_CEILING: Duration = Duration::from_secs(60);

/// Limits of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Packages bigger than this, in bytes, go straight to the lightweight inspection.
    pub size_threshold: u64,
    /// Budget for the full inspection.
    pub hard_timeout: Duration,
    /// Maximum wait for a terminated inspection to go away.
    pub grace_period: Duration,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            hard_timeout: DEFAULT_HARD_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Inspection strategy chosen before any inspection is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Full,
    Light,
}

/// Chooses the strategy from the package size.
fn select_strategy(size: u64, threshold: u64) -> Strategy {
    if size > threshold {
        Strategy::Light
    } else {
        Strategy::Full
    }
}

/// Runs the analysis of the package at `path`.
///
/// Returns [`AnalysisOutcome::Full`] only when the isolated full inspection succeeds within the
/// hard timeout. Oversized packages, timeouts and inspector errors all fall back to the
/// lightweight inspection, producing a degraded outcome with the reason as warning, and only a
/// failure of that fallback produces [`AnalysisOutcome::Failed`].
///
/// The artifacts are not returned exactly as the inspector produced them: every inspector
/// normalizes its reply before handing it over (see
/// [`crate::artifacts::PackageArtifacts::normalize`]), so the string constants of a full outcome
/// are trimmed, at least four characters long, deduplicated and sorted.
pub fn run_analysis<I, P>(inspector: &I, path: P, options: &AnalysisOptions) -> AnalysisOutcome
where
    I: Inspector + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let degradation = match fs::metadata(path) {
        Ok(metadata) => {
            let strategy = select_strategy(metadata.len(), options.size_threshold);
            debug!(
                "package `{}` is {} bytes (threshold {}), strategy: {:?}",
                path.display(),
                metadata.len(),
                options.size_threshold,
                strategy
            );

            match strategy {
                Strategy::Light => Degradation::SizeExceeded,
                Strategy::Full => match full_inspection(inspector, path, options) {
                    Ok(outcome) => return outcome,
                    Err(degradation) => degradation,
                },
            }
        }
        Err(e) => Degradation::InspectorFault {
            message: format!("could not read the package size: {}", e),
        },
    };

    info!(
        "falling back to the lightweight inspection of `{}`: {}",
        path.display(),
        degradation
    );
    light_fallback(inspector, path, degradation)
}

/// Runs the full inspection in its isolated context, racing it against the hard timeout.
fn full_inspection<I>(
    inspector: &I,
    path: &Path,
    options: &AnalysisOptions,
) -> Result<AnalysisOutcome, Degradation>
where
    I: Inspector + ?Sized,
{
    let start = Instant::now();
    let inspection = inspector.spawn_full(path)?;

    match inspection.wait(options.hard_timeout) {
        Wait::Completed(Ok(artifacts)) => {
            debug!("full inspection completed in {:?}", start.elapsed());
            let _ = inspection.shutdown(options.grace_period);
            Ok(AnalysisOutcome::Full(artifacts))
        }
        Wait::Completed(Err(e)) => {
            warn!("the full inspection of `{}` failed: {}", path.display(), e);
            // The fallback never runs next to a live full inspection.
            let _ = inspection.shutdown(options.grace_period);
            Err(e.into())
        }
        Wait::TimedOut => {
            warn!(
                "the full inspection of `{}` did not finish in {}s, terminating it",
                path.display(),
                options.hard_timeout.as_secs()
            );
            if !inspection.shutdown(options.grace_period) {
                warn!(
                    "the full inspection did not stop within the {:?} grace period",
                    options.grace_period
                );
            }
            Err(Degradation::timeout(options.hard_timeout))
        }
    }
}

/// Runs the lightweight inspection after a degradation.
fn light_fallback<I>(inspector: &I, path: &Path, degradation: Degradation) -> AnalysisOutcome
where
    I: Inspector + ?Sized,
{
    match inspector.light_inspect(path) {
        Ok(artifacts) => AnalysisOutcome::Degraded {
            artifacts: artifacts.into_partial(),
            warning: degradation.to_string(),
        },
        Err(e) => AnalysisOutcome::Failed {
            message: format!("lightweight analysis failed after {}: {}", degradation, e),
        },
    }
}

/// Runs the analysis under a caller-side ceiling.
///
/// The orchestrator's own timeout is strictly shorter and should fire first; if the ceiling
/// elapses anyway, a degraded outcome is synthesized from the lightweight inspection directly.
pub fn run_with_ceiling<I, P>(
    inspector: Arc<I>,
    path: P,
    options: &AnalysisOptions,
    ceiling: Duration,
) -> AnalysisOutcome
where
    I: Inspector + ?Sized + 'static,
    P: Into<PathBuf>,
{
    let path = path.into();
    let (tx, rx) = mpsc::channel();

    let worker_inspector = Arc::clone(&inspector);
    let worker_path = path.clone();
    let worker_options = *options;
    let worker = thread::Builder::new()
        .name(String::from("analysis"))
        .spawn(move || {
            let outcome = run_analysis(&*worker_inspector, &worker_path, &worker_options);
            let _ = tx.send(outcome);
        });
    if let Err(e) = worker {
        return AnalysisOutcome::Failed {
            message: format!("could not start the analysis: {}", e),
        };
    }

    match rx.recv_timeout(ceiling) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => {
            warn!(
                "the analysis of `{}` did not finish under the {}s ceiling, using the \
                 lightweight inspection",
                path.display(),
                ceiling.as_secs()
            );
            light_fallback(&*inspector, &path, Degradation::ceiling(ceiling))
        }
        Err(RecvTimeoutError::Disconnected) => light_fallback(
            &*inspector,
            &path,
            Degradation::InspectorFault {
                message: String::from("the analysis worker stopped unexpectedly"),
            },
        ),
    }
}

#[cfg(test)]
mod tests;
