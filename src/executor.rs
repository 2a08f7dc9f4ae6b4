//! Shell step execution
//!
//! Runs an artifact's named steps sequentially in its directory, stopping
//! at the first failure, and runs many artifacts concurrently on a fixed
//! worker pool. Results land in per-index slots so reporting order always
//! matches planning order, whatever the completion order was.
//!
//! Steps run under `sh -c` (`cmd /C` on Windows) with the merged variable
//! map both substituted into the command text and injected as process
//! environment.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::error::{ConvoyError, ConvoyResult};
use crate::models::Step;

/// Default worker pool size
pub const DEFAULT_CONCURRENCY: usize = 10;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Maximum variable-resolution passes before giving up on chained refs
const MAX_RESOLVE_PASSES: usize = 10;

/// Shared cancellation flag, flipped by the signal handler
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One artifact's step sequence, ready to run
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub dir: PathBuf,
    pub steps: Vec<Step>,
    pub vars: BTreeMap<String, String>,
}

/// Captured output of one executed step
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub step: String,
    pub output: String,
}

/// Outcome of one job; `records` covers every step that ran, including
/// the failing one
#[derive(Debug)]
pub struct JobResult {
    pub name: String,
    pub records: Vec<StepRecord>,
    pub outcome: ConvoyResult<()>,
}

impl JobResult {
    pub fn failed(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Run one job's steps sequentially, aborting on the first failure
pub fn run_job(job: &Job, cancel: &CancelToken) -> JobResult {
    let vars = resolve_vars(&job.vars);
    let mut records = Vec::with_capacity(job.steps.len());

    for step in &job.steps {
        if cancel.is_cancelled() {
            return JobResult {
                name: job.name.clone(),
                records,
                outcome: Err(ConvoyError::Cancelled),
            };
        }

        let command = expand(&step.run, &vars);
        let (success, code, output) = match run_command(&command, &job.dir, &vars, cancel) {
            Ok(result) => result,
            Err(e) => {
                return JobResult {
                    name: job.name.clone(),
                    records,
                    outcome: Err(e),
                };
            }
        };

        records.push(StepRecord {
            step: step.name.clone(),
            output,
        });

        if !success {
            return JobResult {
                name: job.name.clone(),
                records,
                outcome: Err(ConvoyError::StepFailed {
                    step: step.name.clone(),
                    code,
                }),
            };
        }
    }

    JobResult {
        name: job.name.clone(),
        records,
        outcome: Ok(()),
    }
}

/// Run jobs on a pool of at most `concurrency` workers
///
/// Every job runs to completion; a failure never cancels siblings. The
/// returned results are in the same order as `jobs`.
pub fn run_parallel(jobs: &[Job], concurrency: usize, cancel: &CancelToken) -> Vec<JobResult> {
    if jobs.is_empty() {
        return Vec::new();
    }

    let workers = concurrency.clamp(1, jobs.len());
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<(usize, JobResult)>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let next = &next;
            scope.spawn(move || loop {
                let i = next.fetch_add(1, Ordering::SeqCst);
                if i >= jobs.len() {
                    break;
                }
                let result = run_job(&jobs[i], cancel);
                // Receiver outlives the scope; a send failure means the
                // process is tearing down anyway
                let _ = tx.send((i, result));
            });
        }
    });
    drop(tx);

    let mut slots: Vec<Option<JobResult>> = jobs.iter().map(|_| None).collect();
    for (i, result) in rx {
        slots[i] = Some(result);
    }
    slots.into_iter().flatten().collect()
}

/// Spawn `command` through the platform shell and poll it to completion
///
/// Returns (success, exit code, combined output). Cancellation kills the
/// child and reports it as failed.
fn run_command(
    command: &str,
    dir: &Path,
    vars: &BTreeMap<String, String>,
    cancel: &CancelToken,
) -> ConvoyResult<(bool, i32, String)> {
    let (shell, flag) = shell_invocation();

    let mut child = Command::new(shell)
        .arg(flag)
        .arg(command)
        .current_dir(dir)
        .envs(vars)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_reader = thread::spawn(move || read_stream(stdout));
    let err_reader = thread::spawn(move || read_stream(stderr));

    let status = loop {
        if cancel.is_cancelled() {
            let _ = child.kill();
        }
        match child.try_wait()? {
            Some(status) => break status,
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    let mut output = out_reader.join().unwrap_or_default();
    output.push_str(&err_reader.join().unwrap_or_default());

    if cancel.is_cancelled() {
        return Err(ConvoyError::Cancelled);
    }

    Ok((status.success(), status.code().unwrap_or(-1), output))
}

fn shell_invocation() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

fn read_stream(stream: Option<impl Read>) -> String {
    let mut buf = String::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_string(&mut buf);
    }
    buf
}

/// Resolve chained variable references iteratively until stable
///
/// Values may reference other variables or process environment variables
/// (`REGISTRY: "eu.gcr.io/${PROJECT}"`); unresolvable placeholders are
/// left as-is for the shell.
pub fn resolve_vars(vars: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut resolved = vars.clone();

    for _ in 0..MAX_RESOLVE_PASSES {
        let mut changed = false;
        let snapshot = resolved.clone();

        for value in resolved.values_mut() {
            let next = expand_with(value, |key| {
                snapshot
                    .get(key)
                    .cloned()
                    .or_else(|| std::env::var(key).ok())
            });
            if next != *value {
                *value = next;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    resolved
}

/// Substitute `$NAME` / `${NAME}` placeholders from `vars`
///
/// Unknown placeholders stay untouched so the shell can still expand them
/// from the injected environment.
pub fn expand(text: &str, vars: &BTreeMap<String, String>) -> String {
    expand_with(text, |key| vars.get(key).cloned())
}

fn expand_with(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek() {
            Some((_, '{')) => {
                if let Some(end) = text[i..].find('}') {
                    let key = &text[i + 2..i + end];
                    if let Some(value) = lookup(key) {
                        out.push_str(&value);
                        // Skip past the closing brace
                        while let Some((j, _)) = chars.next() {
                            if j == i + end {
                                break;
                            }
                        }
                        continue;
                    }
                }
                out.push(c);
            }
            Some((_, n)) if n.is_ascii_alphabetic() || *n == '_' => {
                let start = i + 1;
                let mut end = start;
                while let Some((j, n)) = chars.peek() {
                    if n.is_ascii_alphanumeric() || *n == '_' {
                        end = j + n.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let key = &text[start..end];
                match lookup(key) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&text[i..end]),
                }
            }
            _ => out.push(c),
        }
    }

    out
}
