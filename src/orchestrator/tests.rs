//! Tests for the orchestrator.

use super::{run_analysis, run_with_ceiling, select_strategy, AnalysisOptions, Strategy};
use crate::{
    artifacts::{AnalysisOutcome, PackageArtifacts},
    error::InspectorError,
    inspector::{InProcessInspector, InspectionResult, PackageInspector},
};
use std::{
    io::Write,
    path::Path,
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};
use tempfile::NamedTempFile;

/// Behaviour of a stubbed inspection.
#[derive(Debug, Clone, Copy)]
enum Behaviour {
    Succeed,
    Fail(&'static str),
    Block,
    Panic,
}

/// Inspector with scripted behaviour that records the calls it receives.
struct Stub {
    full: Behaviour,
    light: Behaviour,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl Stub {
    fn new(full: Behaviour, light: Behaviour) -> (Self, Arc<Mutex<Vec<&'static str>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let stub = Self {
            full,
            light,
            calls: Arc::clone(&calls),
        };
        (stub, calls)
    }

    fn run(&self, name: &'static str, behaviour: Behaviour) -> InspectionResult {
        self.calls.lock().unwrap().push(name);
        match behaviour {
            Behaviour::Succeed => Ok(artifacts()),
            Behaviour::Fail(message) => Err(InspectorError::Reported(message.to_owned())),
            Behaviour::Block => loop {
                thread::park();
            },
            Behaviour::Panic => panic!("simulated native fault"),
        }
    }
}

impl PackageInspector for Stub {
    fn full_inspect(&self, _path: &Path) -> InspectionResult {
        self.run("full", self.full)
    }

    fn light_inspect(&self, _path: &Path) -> InspectionResult {
        self.run("light", self.light)
    }
}

fn artifacts() -> PackageArtifacts {
    PackageArtifacts {
        package_id: String::from("com.example.app"),
        version_name: String::from("1.2.3"),
        version_code: 123,
        manifest_xml: String::from("<manifest package=\"com.example.app\"/>"),
        permissions: vec![String::from("android.permission.CAMERA")]
            .into_iter()
            .collect(),
        string_constants: vec![String::from("api_key_value"), String::from("hello world")],
    }
}

fn package(size: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&vec![0; size]).unwrap();
    file.flush().unwrap();
    file
}

fn options(hard_timeout: Duration) -> AnalysisOptions {
    AnalysisOptions {
        size_threshold: 1024,
        hard_timeout,
        grace_period: Duration::from_millis(100),
    }
}

#[test]
fn it_select_strategy() {
    assert_eq!(select_strategy(0, 1024), Strategy::Full);
    assert_eq!(select_strategy(1024, 1024), Strategy::Full);
    assert_eq!(select_strategy(1025, 1024), Strategy::Light);
}

#[test]
fn it_default_options() {
    let options = AnalysisOptions::default();
    assert_eq!(options.size_threshold, 10 * 1024 * 1024);
    assert_eq!(options.hard_timeout, Duration::from_secs(20));
    assert!(options.grace_period < options.hard_timeout);
}

#[test]
fn it_full_outcome() {
    let (stub, calls) = Stub::new(Behaviour::Succeed, Behaviour::Fail("unused"));
    let package = package(512);

    let outcome = run_analysis(
        &InProcessInspector::new(stub),
        package.path(),
        &options(Duration::from_secs(10)),
    );

    assert_eq!(outcome, AnalysisOutcome::Full(artifacts()));
    assert_eq!(*calls.lock().unwrap(), vec!["full"]);
}

#[test]
fn it_size_exceeded_skips_full_inspection() {
    let (stub, calls) = Stub::new(Behaviour::Succeed, Behaviour::Succeed);
    let package = package(2048);

    let outcome = run_analysis(
        &InProcessInspector::new(stub),
        package.path(),
        &options(Duration::from_secs(10)),
    );

    match outcome {
        AnalysisOutcome::Degraded { artifacts, warning } => {
            assert_eq!(warning, "size-exceeded");
            assert!(artifacts.string_constants.is_empty());
            assert_eq!(artifacts.package_id, "com.example.app");
            assert!(artifacts
                .permissions
                .contains("android.permission.CAMERA"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(*calls.lock().unwrap(), vec!["light"]);
}

#[test]
fn it_size_exceeded_and_light_failure() {
    let (stub, _) = Stub::new(Behaviour::Succeed, Behaviour::Fail("not an APK"));
    let package = package(2048);

    let outcome = run_analysis(
        &InProcessInspector::new(stub),
        package.path(),
        &options(Duration::from_secs(10)),
    );

    match outcome {
        AnalysisOutcome::Failed { message } => {
            assert!(message.contains("size-exceeded"));
            assert!(message.contains("not an APK"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn it_blocking_inspector_times_out() {
    let (stub, calls) = Stub::new(Behaviour::Block, Behaviour::Succeed);
    let package = package(512);
    let options = options(Duration::from_secs(1));

    let start = Instant::now();
    let outcome = run_analysis(&InProcessInspector::new(stub), package.path(), &options);
    let elapsed = start.elapsed();

    assert_eq!(outcome.warning(), Some("timeout:1s"));
    assert!(elapsed >= options.hard_timeout);
    assert!(elapsed < options.hard_timeout + options.grace_period + Duration::from_secs(2));
    assert_eq!(*calls.lock().unwrap(), vec!["full", "light"]);
}

#[test]
fn it_inspector_error_falls_back() {
    let (stub, calls) = Stub::new(Behaviour::Fail("corrupt dex"), Behaviour::Succeed);
    let package = package(512);

    let outcome = run_analysis(
        &InProcessInspector::new(stub),
        package.path(),
        &options(Duration::from_secs(10)),
    );

    match outcome {
        AnalysisOutcome::Degraded { artifacts, warning } => {
            assert_eq!(warning, "inspector-error:corrupt dex");
            assert!(artifacts.string_constants.is_empty());
            assert_eq!(artifacts.version_name, "1.2.3");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(*calls.lock().unwrap(), vec!["full", "light"]);
}

#[test]
fn it_both_paths_fail() {
    let (stub, _) = Stub::new(Behaviour::Fail("corrupt dex"), Behaviour::Fail("bad manifest"));
    let package = package(512);

    let outcome = run_analysis(
        &InProcessInspector::new(stub),
        package.path(),
        &options(Duration::from_secs(10)),
    );

    match outcome {
        AnalysisOutcome::Failed { message } => {
            assert!(message.contains("inspector-error:corrupt dex"));
            assert!(message.contains("bad manifest"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn it_crashed_inspector_falls_back() {
    let (stub, _) = Stub::new(Behaviour::Panic, Behaviour::Succeed);
    let package = package(512);

    let outcome = run_analysis(
        &InProcessInspector::new(stub),
        package.path(),
        &options(Duration::from_secs(10)),
    );

    let warning = outcome.warning().unwrap();
    assert!(warning.starts_with("inspector-error:inspection terminated without a result"));
    assert!(outcome.artifacts().is_some());
}

#[test]
fn it_missing_package() {
    let (stub, calls) = Stub::new(Behaviour::Succeed, Behaviour::Fail("no such file"));

    let outcome = run_analysis(
        &InProcessInspector::new(stub),
        "/nonexistent/droid-triage/app.apk",
        &options(Duration::from_secs(10)),
    );

    match outcome {
        AnalysisOutcome::Failed { message } => {
            assert!(message.contains("could not read the package size"))
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(*calls.lock().unwrap(), vec!["light"]);
}

#[test]
fn it_ceiling_passes_outcome_through() {
    let (stub, _) = Stub::new(Behaviour::Succeed, Behaviour::Succeed);
    let package = package(512);

    let outcome = run_with_ceiling(
        Arc::new(InProcessInspector::new(stub)),
        package.path(),
        &options(Duration::from_secs(10)),
        Duration::from_secs(30),
    );

    assert!(outcome.is_full());
}

#[test]
fn it_ceiling_synthesizes_degraded_outcome() {
    let (stub, calls) = Stub::new(Behaviour::Block, Behaviour::Succeed);
    let package = package(512);

    let start = Instant::now();
    let outcome = run_with_ceiling(
        Arc::new(InProcessInspector::new(stub)),
        package.path(),
        &options(Duration::from_secs(30)),
        Duration::from_secs(1),
    );

    assert_eq!(outcome.warning(), Some("ceiling-exceeded:1s"));
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(*calls.lock().unwrap(), vec!["full", "light"]);
}

#[cfg(unix)]
mod process {
    use super::{options, package};
    use crate::{
        artifacts::AnalysisOutcome, inspector::CommandInspector, orchestrator::run_analysis,
    };
    use std::{
        fs,
        path::PathBuf,
        time::{Duration, Instant},
    };

    const REPLY: &str = r#"{"package_id":"com.example","version_name":"1.0","version_code":7,"manifest_xml":"<manifest/>","permissions":["android.permission.READ_SMS"],"string_constants":["password=hunter2"]}"#;

    fn sh(script: String) -> CommandInspector {
        CommandInspector::new("sh").with_args(vec![
            String::from("-c"),
            script,
            String::from("inspector"),
        ])
    }

    #[test]
    fn it_process_full_outcome() {
        let inspector = sh(format!("echo '{}'", REPLY));
        let package = package(512);

        let outcome = run_analysis(&inspector, package.path(), &options(Duration::from_secs(10)));

        match outcome {
            AnalysisOutcome::Full(artifacts) => {
                assert_eq!(artifacts.version_code, 7);
                assert_eq!(artifacts.string_constants, vec!["password=hunter2"]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn it_process_hang_is_killed() {
        let inspector = sh(format!(
            "if [ \"$1\" = full ]; then exec sleep 60; else echo '{}'; fi",
            REPLY
        ));
        let package = package(512);
        let options = options(Duration::from_secs(1));

        let start = Instant::now();
        let outcome = run_analysis(&inspector, package.path(), &options);

        assert_eq!(outcome.warning(), Some("timeout:1s"));
        assert!(outcome.artifacts().unwrap().string_constants.is_empty());
        assert!(
            start.elapsed() < options.hard_timeout + options.grace_period + Duration::from_secs(3)
        );
    }

    #[test]
    fn it_process_light_waits_for_full_termination() {
        // The full inspection records its PID, the light one refuses to run while it is alive.
        let inspector = sh(format!(
            "pid=\"$2.pid\"; \
             if [ \"$1\" = full ]; then echo $$ > \"$pid\"; exec sleep 60; \
             elif kill -0 \"$(cat \"$pid\")\" 2>/dev/null; then \
             echo '{{\"error\": \"full inspection still running\"}}'; \
             else echo '{}'; fi",
            REPLY
        ));
        let package = package(512);
        let pid_file = PathBuf::from(format!("{}.pid", package.path().display()));

        let outcome = run_analysis(&inspector, package.path(), &options(Duration::from_secs(1)));
        let recorded = pid_file.exists();
        let _ = fs::remove_file(&pid_file);

        assert!(recorded);
        assert_eq!(outcome.warning(), Some("timeout:1s"));
        assert_eq!(outcome.artifacts().unwrap().package_id, "com.example");
    }

    #[test]
    fn it_process_crash_falls_back() {
        let inspector = sh(format!(
            "if [ \"$1\" = full ]; then kill -9 $$; else echo '{}'; fi",
            REPLY
        ));
        let package = package(512);

        let outcome = run_analysis(&inspector, package.path(), &options(Duration::from_secs(10)));

        let warning = outcome.warning().unwrap();
        assert!(warning.starts_with("inspector-error:inspection terminated without a result"));
    }

    #[test]
    fn it_process_reported_error() {
        let inspector = sh(format!(
            "if [ \"$1\" = full ]; then echo '{{\"error\": \"unsupported format\"}}'; else echo '{}'; fi",
            REPLY
        ));
        let package = package(512);

        let outcome = run_analysis(&inspector, package.path(), &options(Duration::from_secs(10)));

        assert_eq!(outcome.warning(), Some("inspector-error:unsupported format"));
    }
}
