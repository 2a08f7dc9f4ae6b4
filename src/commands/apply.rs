//! `convoy apply`: consume the plan file, deploy its artifacts, update
//! the lock ledger, and remove the plan.
//!
//! The plan is self-contained: it already carries the resolved steps and
//! merged variables, so descriptor edits made after planning have no
//! effect on what runs. The plan file is deleted even when some
//! deployments fail; a partially applied plan must never be replayed
//! verbatim.

use std::path::Path;

use anyhow::Result;

use convoy::error::ConvoyError;
use convoy::executor::{self, CancelToken, Job};
use convoy::git::ChangeDetector;
use convoy::lockfile::{LockLedger, LOCK_FILE};
use convoy::plan_file::{self, PlanFile};
use convoy::planner;
use convoy::process::{CommandRunner, ShellRunner};
use convoy::ui::Printer;

#[derive(Debug, Clone, Default)]
pub struct ApplyArgs {
    /// Skip the ledger auto-commit after deploying
    pub no_commit: bool,
    pub concurrency: usize,
    /// Deploy pinned plan entries without re-pinning them in the ledger
    pub force: bool,
}

pub fn cmd_apply(
    root: &Path,
    args: &ApplyArgs,
    cancel: &CancelToken,
    printer: &Printer,
) -> Result<()> {
    printer.banner("convoy apply");

    let plan = PlanFile::load(root)?;
    let runner = ShellRunner;
    let detector = ChangeDetector::new(root, &runner);

    warn_on_drift(&plan, &detector, printer);

    if plan.artifacts.is_empty() {
        printer.summary("Nothing to deploy.");
        plan_file::remove_plan(root)?;
        return Ok(());
    }

    let jobs = deploy_jobs(root, &plan);

    printer.phase(&format!(
        "Deploying {} artifact(s), concurrency {}",
        jobs.len(),
        args.concurrency
    ));
    let results = executor::run_parallel(&jobs, args.concurrency, cancel);

    // Successes are ledgered even when siblings fail
    let mut ledger = LockLedger::load(root)?;
    let mut failed = 0;
    for (entry, result) in plan.artifacts.iter().zip(&results) {
        match &result.outcome {
            Ok(()) => {
                printer.success(&format!("{} → {}", entry.name, entry.version));
                if printer.verbose {
                    for record in &result.records {
                        printer.output_block(&record.output);
                    }
                }
                if entry.pinned && !args.force {
                    ledger.update_artifact_pinned(
                        &entry.name,
                        &entry.commit,
                        &entry.version,
                        &entry.target,
                    );
                } else {
                    ledger.update_artifact(
                        &entry.name,
                        &entry.commit,
                        &entry.version,
                        &entry.target,
                    );
                }
            }
            Err(e) => {
                failed += 1;
                printer.failure(&format!("{} ({e})", entry.name));
                if let Some(record) = result.records.last() {
                    printer.output_block(&record.output);
                }
            }
        }
    }
    ledger.save(root)?;

    if !args.no_commit {
        commit_ledger(root, &runner, printer);
    }

    plan_file::remove_plan(root)?;

    printer.summary(&format!(
        "Deployed {} artifact(s), {} failed, {} skipped.",
        results.iter().filter(|r| !r.failed()).count(),
        failed,
        plan.skipped.len()
    ));

    if failed > 0 {
        return Err(ConvoyError::DeploymentFailed(failed).into());
    }
    Ok(())
}

/// Warn when HEAD moved since the plan was computed; the plan's recorded
/// commit still wins
fn warn_on_drift(plan: &PlanFile, detector: &ChangeDetector, printer: &Printer) {
    let head = detector.current_commit();
    if !head.is_empty() && head != plan.commit {
        printer.warning(&format!(
            "plan was created at {} but HEAD is now {}; deploying the planned commit",
            planner::short_version(&plan.commit),
            planner::short_version(&head)
        ));
    }
}

/// Deploy jobs straight from the plan entries; nothing is re-resolved
fn deploy_jobs(root: &Path, plan: &PlanFile) -> Vec<Job> {
    plan.artifacts
        .iter()
        .map(|entry| Job {
            name: entry.name.clone(),
            dir: root.join(&entry.path),
            steps: entry.steps.clone(),
            vars: entry.vars.clone(),
        })
        .collect()
}

/// Commit and push the updated ledger; failures are warnings only
fn commit_ledger(root: &Path, runner: &dyn CommandRunner, printer: &Printer) {
    let steps: [&[&str]; 3] = [
        &["add", LOCK_FILE],
        &[
            "commit",
            "-m",
            "chore: update convoy.lock.toml [skip ci]",
        ],
        &["push"],
    ];

    for args in steps {
        match runner.run("git", args, root) {
            Ok(out) if out.success => {}
            Ok(out) => {
                printer.warning(&format!(
                    "git {} failed: {}",
                    args[0],
                    out.stderr.trim()
                ));
                return;
            }
            Err(e) => {
                printer.warning(&format!("git {} failed: {e}", args[0]));
                return;
            }
        }
    }

    printer.detail("lock ledger committed and pushed");
}
