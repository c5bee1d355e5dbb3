//! Runtime probing
//!
//! Each surviving combination is handed to a [`RuntimeProber`], which reports
//! the collector names the runtime selects for it. [`JvmProber`] does this by
//! launching a fresh JVM with the combination's flags and a helper main class
//! that prints `GarbageCollectorMXBean` names, comma-joined, to stdout.
//!
//! Probes run strictly one after another. A failed probe is reported on
//! stderr and left out of the results; the run carries on.

use crate::combination::Combination;
use crate::results::{ObservedResult, ResultMap};
use anyhow::{bail, Result};
use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Interval between exit checks while a probe has a timeout
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Why a single probe produced no result
#[derive(Error, Debug)]
pub enum ProbeFailure {
    #[error("failed to launch {launcher}: {source}")]
    Launch {
        launcher: String,
        #[source]
        source: io::Error,
    },

    #[error("runtime exited with {}: {detail}", exit_label(.code))]
    Exit { code: Option<i32>, detail: String },

    #[error("failed to read probe output: {0}")]
    Io(#[from] io::Error),

    #[error("probe output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("probe did not finish within {0:?}")]
    TimedOut(Duration),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Observes which collectors a combination of flags selects
pub trait RuntimeProber {
    fn probe(&mut self, combination: &Combination) -> Result<ObservedResult, ProbeFailure>;
}

/// Program the probe JVM runs to print its collector names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperProgram {
    /// Compiled main class found on a classpath
    Class {
        classpath: String,
        main_class: String,
    },
    /// Single-file source program run by the JDK 11+ source launcher
    Source(PathBuf),
}

impl HelperProgram {
    fn arguments(&self) -> Vec<String> {
        match self {
            HelperProgram::Class {
                classpath,
                main_class,
            } => vec!["-classpath".to_string(), classpath.clone(), main_class.clone()],
            HelperProgram::Source(path) => vec![path.display().to_string()],
        }
    }
}

/// How to launch the probe JVM
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Path to the `java` launcher
    pub launcher: PathBuf,
    /// Entry point that prints the active collector names
    pub helper: HelperProgram,
    /// Kill a probe that runs longer than this (None = wait forever)
    pub timeout: Option<Duration>,
}

/// Prober that launches one real JVM per combination
#[derive(Debug, Clone)]
pub struct JvmProber {
    config: ProbeConfig,
}

impl JvmProber {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Arguments after the launcher: flags, then the helper program
    pub fn arguments(&self, combination: &Combination) -> Vec<String> {
        let mut args: Vec<String> = combination
            .tokens()
            .into_iter()
            .map(str::to_string)
            .collect();
        args.extend(self.config.helper.arguments());
        args
    }

    /// Full command line, launcher first
    pub fn command_line(&self, combination: &Combination) -> Vec<String> {
        let mut line = vec![self.config.launcher.display().to_string()];
        line.extend(self.arguments(combination));
        line
    }

    fn spawn(&self, combination: &Combination) -> Result<Child, ProbeFailure> {
        tracing::trace!(command = ?self.command_line(combination), "spawning probe");

        Command::new(&self.config.launcher)
            .args(self.arguments(combination))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProbeFailure::Launch {
                launcher: self.config.launcher.display().to_string(),
                source,
            })
    }
}

impl RuntimeProber for JvmProber {
    fn probe(&mut self, combination: &Combination) -> Result<ObservedResult, ProbeFailure> {
        let child = self.spawn(combination)?;
        let output = match self.config.timeout {
            Some(limit) => wait_with_timeout(child, limit)?,
            None => child.wait_with_output()?,
        };

        if !output.status.success() {
            return Err(ProbeFailure::Exit {
                code: output.status.code(),
                detail: first_diagnostic_line(&output.stderr, &output.stdout),
            });
        }

        let stdout = String::from_utf8(output.stdout)?;
        Ok(ObservedResult::parse(&stdout))
    }
}

/// First non-empty line of stderr, else of stdout, for diagnostics
///
/// HotSpot reports some option conflicts (e.g. "Multiple garbage collectors
/// selected") on stdout rather than stderr.
fn first_diagnostic_line(stderr: &[u8], stdout: &[u8]) -> String {
    [stderr, stdout]
        .iter()
        .find_map(|stream| {
            String::from_utf8_lossy(stream)
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "no diagnostic output".to_string())
}

/// Wait for `child`, killing it once `limit` has elapsed
///
/// Output pipes are drained on helper threads so a chatty child cannot block
/// on a full pipe while we poll for its exit.
fn wait_with_timeout(mut child: Child, limit: Duration) -> Result<Output, ProbeFailure> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let deadline = Instant::now() + limit;

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            tracing::debug!(pid = child.id(), "probe timed out, killing");
            // The child may exit on its own between try_wait and kill.
            let _ = child.kill();
            child.wait()?;
            return Err(ProbeFailure::TimedOut(limit));
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(Output {
        status,
        stdout: collect(stdout)?,
        stderr: collect(stderr)?,
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(handle: Option<thread::JoinHandle<io::Result<Vec<u8>>>>) -> io::Result<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| io::Error::other("output reader panicked"))?,
        None => Ok(Vec::new()),
    }
}

/// Result of probing one combination
#[derive(Debug)]
pub enum ProbeOutcome {
    Observed(ObservedResult),
    Failed(ProbeFailure),
}

impl ProbeOutcome {
    pub fn is_observed(&self) -> bool {
        matches!(self, ProbeOutcome::Observed(_))
    }
}

/// Outcomes of a probing pass, in probe order
#[derive(Debug, Default)]
pub struct ProbeRun {
    outcomes: Vec<(Combination, ProbeOutcome)>,
}

impl ProbeRun {
    pub fn outcomes(&self) -> &[(Combination, ProbeOutcome)] {
        &self.outcomes
    }

    /// Successful observations, in probe order
    pub fn results(&self) -> ResultMap {
        self.outcomes
            .iter()
            .filter_map(|(combination, outcome)| match outcome {
                ProbeOutcome::Observed(result) => Some((combination.clone(), result.clone())),
                ProbeOutcome::Failed(_) => None,
            })
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_observed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Probe every combination in order, one at a time
pub fn run_probes<P>(prober: &mut P, combinations: &[Combination]) -> ProbeRun
where
    P: RuntimeProber + ?Sized,
{
    let mut run = ProbeRun::default();

    for combination in combinations {
        let outcome = match prober.probe(combination) {
            Ok(result) => {
                tracing::debug!(%combination, collectors = ?result.names(), "probe succeeded");
                ProbeOutcome::Observed(result)
            }
            Err(failure) => {
                eprintln!("[gcgraph: probe {} failed: {}]", combination, failure);
                ProbeOutcome::Failed(failure)
            }
        };
        run.outcomes.push((combination.clone(), outcome));
    }

    tracing::debug!(
        probed = run.outcomes.len(),
        succeeded = run.succeeded(),
        failed = run.failed(),
        "probing finished"
    );

    run
}

/// Locate the `java` launcher
///
/// An explicit path wins; a bare name is looked up on `search_path`. Without
/// one, `$JAVA_HOME/bin/java` is used when `java_home` is set, otherwise
/// `java` from `search_path`.
pub fn find_launcher(
    explicit: Option<&Path>,
    java_home: Option<&OsStr>,
    search_path: Option<&OsStr>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.components().count() > 1 {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            bail!("Java launcher not found: {}", path.display());
        }
        return search(path.as_os_str(), search_path);
    }

    if let Some(home) = java_home.filter(|home| !home.is_empty()) {
        let launcher = Path::new(home)
            .join("bin")
            .join(format!("java{}", std::env::consts::EXE_SUFFIX));
        if launcher.is_file() {
            return Ok(launcher);
        }
        bail!(
            "JAVA_HOME is set but {} does not exist; use --java to choose a launcher",
            launcher.display()
        );
    }

    search(
        OsStr::new(&format!("java{}", std::env::consts::EXE_SUFFIX)),
        search_path,
    )
}

fn search(name: &OsStr, search_path: Option<&OsStr>) -> Result<PathBuf> {
    if let Some(dirs) = search_path {
        for dir in std::env::split_paths(dirs) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }
    bail!(
        "Java launcher '{}' not found on PATH; set JAVA_HOME or pass --java",
        name.to_string_lossy()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::Flag;
    use std::collections::HashMap;

    fn single(token: &str) -> Combination {
        Combination::single(Flag::parse(token).unwrap())
    }

    fn pair(a: &str, b: &str) -> Combination {
        Combination::pair(Flag::parse(a).unwrap(), Flag::parse(b).unwrap())
    }

    fn config(launcher: &str) -> ProbeConfig {
        ProbeConfig {
            launcher: PathBuf::from(launcher),
            helper: HelperProgram::Class {
                classpath: "/opt/probe/classes".to_string(),
                main_class: "PrintGCMXBeanNames".to_string(),
            },
            timeout: None,
        }
    }

    struct TableProber {
        table: HashMap<String, &'static str>,
        calls: Vec<String>,
    }

    impl RuntimeProber for TableProber {
        fn probe(&mut self, combination: &Combination) -> Result<ObservedResult, ProbeFailure> {
            let key = combination.to_string();
            self.calls.push(key.clone());
            match self.table.get(&key) {
                Some(out) => Ok(ObservedResult::parse(out)),
                None => Err(ProbeFailure::Exit {
                    code: Some(1),
                    detail: "Conflicting collector combinations in option list".to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_command_line_layout() {
        let prober = JvmProber::new(config("/usr/lib/jvm/bin/java"));
        let line = prober.command_line(&pair("-XX:+UseParNewGC", "-XX:-UseSerialGC"));
        assert_eq!(
            line,
            vec![
                "/usr/lib/jvm/bin/java",
                "-XX:+UseParNewGC",
                "-XX:-UseSerialGC",
                "-classpath",
                "/opt/probe/classes",
                "PrintGCMXBeanNames",
            ]
        );
    }

    #[test]
    fn test_run_probes_is_sequential_and_ordered() {
        let mut prober = TableProber {
            table: [("-XX:+A", "X"), ("-XX:+B", "Y")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            calls: Vec::new(),
        };
        let combos = vec![single("-XX:+B"), pair("-XX:+A", "-XX:+B"), single("-XX:+A")];

        let run = run_probes(&mut prober, &combos);

        assert_eq!(prober.calls, vec!["-XX:+B", "-XX:+A -XX:+B", "-XX:+A"]);
        assert_eq!(run.outcomes().len(), 3);
        assert_eq!(run.succeeded(), 2);
        assert_eq!(run.failed(), 1);

        let results = run.results();
        let order: Vec<String> = results.iter().map(|(c, _)| c.to_string()).collect();
        assert_eq!(order, vec!["-XX:+B", "-XX:+A"]);
    }

    #[test]
    fn test_failure_display() {
        let failure = ProbeFailure::Exit {
            code: Some(1),
            detail: "Error: Could not create the Java Virtual Machine.".to_string(),
        };
        assert_eq!(
            failure.to_string(),
            "runtime exited with status 1: Error: Could not create the Java Virtual Machine."
        );

        let killed = ProbeFailure::Exit {
            code: None,
            detail: "no diagnostic output".to_string(),
        };
        assert!(killed.to_string().contains("signal"));
    }

    #[test]
    fn test_command_line_source_helper() {
        let mut cfg = config("/usr/lib/jvm/bin/java");
        cfg.helper = HelperProgram::Source(PathBuf::from("/tmp/gcgraph-x/PrintGCMXBeanNames.java"));
        let prober = JvmProber::new(cfg);
        let line = prober.command_line(&single("-XX:+UseG1GC"));
        assert_eq!(
            line,
            vec![
                "/usr/lib/jvm/bin/java",
                "-XX:+UseG1GC",
                "/tmp/gcgraph-x/PrintGCMXBeanNames.java",
            ]
        );
    }

    #[test]
    fn test_first_diagnostic_line() {
        assert_eq!(first_diagnostic_line(b"\n  first\nsecond\n", b"out"), "first");
        assert_eq!(
            first_diagnostic_line(b"  \n", b"Multiple garbage collectors selected\n"),
            "Multiple garbage collectors selected"
        );
        assert_eq!(first_diagnostic_line(b"", b""), "no diagnostic output");
    }

    #[test]
    fn test_launch_failure_is_recoverable() {
        let mut prober = JvmProber::new(config("/nonexistent/gcgraph/java"));
        let err = prober.probe(&single("-XX:+UseG1GC")).unwrap_err();
        assert!(matches!(err, ProbeFailure::Launch { .. }));
        assert!(err.to_string().contains("/nonexistent/gcgraph/java"));
    }

    #[test]
    fn test_find_launcher_explicit_missing() {
        let err = find_launcher(Some(Path::new("/nonexistent/bin/java")), None, None).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bin/java"));
    }

    #[test]
    fn test_find_launcher_java_home() {
        let home = tempfile::tempdir().unwrap();
        let bin = home.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let java = bin.join(format!("java{}", std::env::consts::EXE_SUFFIX));
        std::fs::write(&java, "").unwrap();

        let found = find_launcher(None, Some(home.path().as_os_str()), None).unwrap();
        assert_eq!(found, java);
    }

    #[test]
    fn test_find_launcher_java_home_missing_binary() {
        let home = tempfile::tempdir().unwrap();
        let err = find_launcher(None, Some(home.path().as_os_str()), None).unwrap_err();
        assert!(err.to_string().contains("JAVA_HOME"));
    }

    #[test]
    fn test_find_launcher_searches_path() {
        let dir = tempfile::tempdir().unwrap();
        let java = dir.path().join(format!("java{}", std::env::consts::EXE_SUFFIX));
        std::fs::write(&java, "").unwrap();

        let found = find_launcher(None, None, Some(dir.path().as_os_str())).unwrap();
        assert_eq!(found, java);

        assert!(find_launcher(None, None, None).is_err());
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("java");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn test_probe_captures_stdout() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = script(dir.path(), "printf 'Copy,MarkSweepCompact'");
            let mut prober = JvmProber::new(config(launcher.to_str().unwrap()));

            let result = prober.probe(&single("-XX:+UseSerialGC")).unwrap();
            assert_eq!(result.names(), &["Copy", "MarkSweepCompact"]);
        }

        #[test]
        fn test_probe_nonzero_exit() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = script(
                dir.path(),
                "echo 'Conflicting collector combinations in option list' >&2\nexit 1",
            );
            let mut prober = JvmProber::new(config(launcher.to_str().unwrap()));

            match prober.probe(&single("-XX:+UseSerialGC")) {
                Err(ProbeFailure::Exit { code, detail }) => {
                    assert_eq!(code, Some(1));
                    assert!(detail.contains("Conflicting"));
                }
                other => panic!("expected exit failure, got {:?}", other),
            }
        }

        #[test]
        fn test_probe_conflict_reported_on_stdout() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = script(
                dir.path(),
                "echo 'Error occurred during initialization of VM'\necho 'Multiple garbage collectors selected'\nexit 1",
            );
            let mut prober = JvmProber::new(config(launcher.to_str().unwrap()));

            let err = prober
                .probe(&Combination::pair(
                    Flag::parse("-XX:+UseG1GC").unwrap(),
                    Flag::parse("-XX:+UseSerialGC").unwrap(),
                ))
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "runtime exited with status 1: Error occurred during initialization of VM"
            );
        }

        #[test]
        fn test_probe_invalid_utf8() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = script(dir.path(), "printf '\\377\\376'");
            let mut prober = JvmProber::new(config(launcher.to_str().unwrap()));

            let err = prober.probe(&single("-XX:+UseSerialGC")).unwrap_err();
            assert!(matches!(err, ProbeFailure::Encoding(_)));
        }

        #[test]
        fn test_probe_timeout_kills_child() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = script(dir.path(), "exec sleep 30");
            let mut cfg = config(launcher.to_str().unwrap());
            cfg.timeout = Some(Duration::from_millis(200));
            let mut prober = JvmProber::new(cfg);

            let started = Instant::now();
            let err = prober.probe(&single("-XX:+UseSerialGC")).unwrap_err();
            assert!(matches!(err, ProbeFailure::TimedOut(_)));
            assert!(started.elapsed() < Duration::from_secs(10));
        }

        #[test]
        fn test_probe_with_timeout_succeeds() {
            let dir = tempfile::tempdir().unwrap();
            let launcher = script(dir.path(), "printf 'G1 Young Generation,G1 Old Generation'");
            let mut cfg = config(launcher.to_str().unwrap());
            cfg.timeout = Some(Duration::from_secs(20));
            let mut prober = JvmProber::new(cfg);

            let result = prober.probe(&single("-XX:+UseG1GC")).unwrap();
            assert_eq!(result.names(), &["G1 Young Generation", "G1 Old Generation"]);
        }
    }
}
