//! `convoy plan`: detect changes, validate affected artifacts, write the
//! plan file for a later `convoy apply`.

use std::path::Path;

use anyhow::Result;

use convoy::error::ConvoyError;
use convoy::executor::{self, CancelToken, Job};
use convoy::git::ChangeDetector;
use convoy::lockfile::LockLedger;
use convoy::plan_file::{PlanArtifact, PlanFile, PlanSkipped};
use convoy::planner::{self, Action, Plan, PlanOptions};
use convoy::process::ShellRunner;
use convoy::ui::Printer;

use super::Workspace;

#[derive(Debug, Clone, Default)]
pub struct PlanArgs {
    /// Restrict planning to these artifact names
    pub artifacts: Vec<String>,
    /// Deploy this exact commit, bypassing change detection
    pub pin: Option<String>,
    pub concurrency: usize,
    pub force: bool,
}

pub fn cmd_plan(
    root: &Path,
    args: &PlanArgs,
    cancel: &CancelToken,
    printer: &Printer,
) -> Result<()> {
    printer.banner("convoy plan");

    let workspace = Workspace::load(root)?;
    let ledger = LockLedger::load(root)?;
    let runner = ShellRunner;
    let detector = ChangeDetector::new(root, &runner);

    let opts = PlanOptions {
        only: args.artifacts.clone(),
        pin_commit: args.pin.clone(),
        force: args.force,
    };
    let plan = planner::create_plan(
        root,
        &workspace.config,
        &workspace.artifacts,
        &ledger,
        &detector,
        &opts,
    )?;

    validate(&plan, args.concurrency, cancel, printer)?;

    let plan_file = to_plan_file(&plan);
    plan_file.save(root)?;

    print_plan(&plan, printer);
    Ok(())
}

/// Run validation steps for every non-skip artifact, concurrently
fn validate(
    plan: &Plan,
    concurrency: usize,
    cancel: &CancelToken,
    printer: &Printer,
) -> Result<()> {
    let jobs: Vec<Job> = plan
        .actions
        .iter()
        .filter(|a| a.action != Action::Skip && !a.validate_steps.is_empty())
        .map(|a| Job {
            name: a.name.clone(),
            dir: a.path.clone(),
            steps: a.validate_steps.clone(),
            vars: a.vars.clone(),
        })
        .collect();

    if jobs.is_empty() {
        return Ok(());
    }

    printer.phase(&format!(
        "Validating {} artifact(s), concurrency {}",
        jobs.len(),
        concurrency
    ));

    let results = executor::run_parallel(&jobs, concurrency, cancel);

    let mut failed = 0;
    for result in &results {
        match &result.outcome {
            Ok(()) => {
                printer.success(&result.name);
                if printer.verbose {
                    for record in &result.records {
                        printer.output_block(&record.output);
                    }
                }
            }
            Err(e) => {
                failed += 1;
                printer.failure(&format!("{} ({e})", result.name));
                if let Some(record) = result.records.last() {
                    printer.output_block(&record.output);
                }
            }
        }
    }

    if failed > 0 {
        return Err(ConvoyError::ValidationFailed(failed).into());
    }
    Ok(())
}

fn to_plan_file(plan: &Plan) -> PlanFile {
    let artifacts = plan
        .actions
        .iter()
        .filter(|a| a.action == Action::Deploy)
        .map(|a| PlanArtifact {
            name: a.name.clone(),
            path: a.rel_path.clone(),
            language: a.language.clone(),
            target: a.target.clone(),
            version: a.version.clone(),
            commit: a.commit.clone(),
            reason: a.reason.clone(),
            vars: a.vars.clone(),
            steps: a.deploy_steps.clone(),
            pinned: a.pinned,
        })
        .collect();

    let skipped = plan
        .actions
        .iter()
        .filter(|a| a.action == Action::Skip)
        .map(|a| PlanSkipped {
            name: a.name.clone(),
            reason: a.reason.clone(),
        })
        .collect();

    PlanFile::new(
        plan.commit.clone(),
        plan.changed_files,
        plan.to_validate(),
        artifacts,
        skipped,
    )
}

fn print_plan(plan: &Plan, printer: &Printer) {
    printer.phase(&format!(
        "Plan: {} to validate, {} to deploy, {} to skip ({} changed files)",
        plan.to_validate(),
        plan.to_deploy(),
        plan.to_skip(),
        plan.changed_files
    ));

    for action in &plan.actions {
        let line = format!("{:<24} {}", action.name, action.reason);
        match action.action {
            Action::Deploy => printer.success(&format!("+ {line}")),
            Action::Validate => printer.detail(&format!("~ {line}")),
            Action::Skip => printer.dimmed(&format!("- {line}")),
        }
    }

    if plan.to_deploy() > 0 {
        printer.summary("Run 'convoy apply' to deploy.");
    } else {
        printer.summary("Nothing to deploy.");
    }
}
