//! Dependency-aware planning
//!
//! Classifies every discovered artifact as skip, validate, or deploy.
//! Per artifact the decision runs in order: pin short-circuit (bypassed
//! when planning a new pin), direct change test (working tree plus the
//! diff since the last deployed commit), then action resolution. A worklist pass afterwards promotes
//! dependents of changed artifacts, so change propagates transitively
//! through `depends_on` edges in O(edges).
//!
//! Libraries participate fully in change propagation but never receive a
//! deploy action.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{ConvoyError, ConvoyResult};
use crate::git::ChangeDetector;
use crate::lockfile::LockLedger;
use crate::models::{DiscoveredArtifact, Step};

/// What the plan decided for one artifact
///
/// `Deploy` implies validation runs first; `Validate` alone is used for
/// libraries and artifacts without deploy steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Skip,
    Validate,
    Deploy,
}

/// One artifact's planned action with everything apply needs later
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAction {
    pub name: String,
    /// Absolute artifact directory
    pub path: PathBuf,
    /// Directory relative to the workspace root, forward slashes
    pub rel_path: String,
    pub target: String,
    /// Detected language name
    pub language: String,
    pub is_lib: bool,
    pub depends_on: Vec<String>,
    pub action: Action,
    pub reason: String,
    /// Language steps, run during validation
    pub validate_steps: Vec<Step>,
    /// Target steps, run during deployment
    pub deploy_steps: Vec<Step>,
    /// Merged variables: target defaults < artifact params < NAME/VERSION
    pub vars: BTreeMap<String, String>,
    /// Commit recorded in the ledger on successful deploy
    pub commit: String,
    /// Short commit, injected as `VERSION`
    pub version: String,
    /// Deployment will mark the ledger entry pinned
    pub pinned: bool,
}

/// A full planning result
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Workspace HEAD at plan time (empty outside a git checkout)
    pub commit: String,
    /// Actions in discovery order
    pub actions: Vec<PlannedAction>,
    /// Distinct changed files seen across all change queries
    pub changed_files: usize,
}

impl Plan {
    pub fn to_validate(&self) -> usize {
        self.actions.iter().filter(|a| a.action != Action::Skip).count()
    }

    pub fn to_deploy(&self) -> usize {
        self.actions.iter().filter(|a| a.action == Action::Deploy).count()
    }

    pub fn to_skip(&self) -> usize {
        self.actions.iter().filter(|a| a.action == Action::Skip).count()
    }
}

/// Caller-supplied planning options
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Restrict planning to these artifact names; empty means all
    pub only: Vec<String>,
    /// Deploy this exact commit, bypassing change detection
    pub pin_commit: Option<String>,
    /// Plan pinned artifacts too; a pin run with force leaves entries unpinned
    pub force: bool,
}

/// First seven characters of a commit hash, the deploy version
pub fn short_version(commit: &str) -> String {
    commit.chars().take(7).collect()
}

/// Classify every artifact and resolve the dependency closure
pub fn create_plan(
    root: &Path,
    cfg: &Config,
    discovered: &[DiscoveredArtifact],
    ledger: &LockLedger,
    detector: &ChangeDetector,
    opts: &PlanOptions,
) -> ConvoyResult<Plan> {
    for name in &opts.only {
        if !discovered.iter().any(|d| &d.artifact.name == name) {
            return Err(ConvoyError::UnknownArtifact(name.clone()));
        }
    }

    let head = detector.current_commit();
    let deploy_commit = opts.pin_commit.clone().unwrap_or_else(|| head.clone());
    let version = short_version(&deploy_commit);
    let mark_pinned = opts.pin_commit.is_some() && !opts.force;
    // Pin reasons show eight characters, one more than the version
    let pin_reason = opts
        .pin_commit
        .as_deref()
        .map(|c| format!("pin to {}", c.chars().take(8).collect::<String>()));

    // Pin mode bypasses change detection entirely
    let uncommitted = if opts.pin_commit.is_some() {
        Vec::new()
    } else {
        detector.uncommitted_changes()
    };

    let mut changed_paths: HashSet<String> =
        uncommitted.iter().map(|f| f.path.clone()).collect();

    let mut actions = Vec::with_capacity(discovered.len());
    // Artifacts a closure pass may still promote (not pinned, in scope)
    let mut promotable = Vec::with_capacity(discovered.len());

    for d in discovered {
        let artifact = &d.artifact;
        let rel_path = workspace_relative(root, &d.path);

        let in_scope = opts.only.is_empty() || opts.only.contains(&artifact.name);
        // A new pin supersedes an existing ledger pin, so pin mode is
        // never blocked by one
        let pinned_skip = opts.pin_commit.is_none()
            && ledger.is_pinned(&artifact.name)
            && !opts.force;

        let validate_steps = cfg
            .language(&d.language)
            .map(|l| l.steps.clone())
            .unwrap_or_default();

        let (deploy_steps, mut vars) = if artifact.is_lib || artifact.target.is_empty() {
            (Vec::new(), BTreeMap::new())
        } else {
            let target = cfg.target(&artifact.target).ok_or_else(|| {
                ConvoyError::UnknownTarget {
                    artifact: artifact.name.clone(),
                    target: artifact.target.clone(),
                }
            })?;
            (target.steps.clone(), target.defaults.clone())
        };
        vars.extend(artifact.params.clone());
        vars.insert("NAME".to_string(), artifact.name.clone());
        vars.insert("VERSION".to_string(), version.clone());

        let mut entry = PlannedAction {
            name: artifact.name.clone(),
            path: d.path.clone(),
            rel_path: rel_path.clone(),
            target: artifact.target.clone(),
            language: d.language.clone(),
            is_lib: artifact.is_lib,
            depends_on: artifact.depends_on.clone(),
            action: Action::Skip,
            reason: String::new(),
            validate_steps,
            deploy_steps,
            vars,
            commit: deploy_commit.clone(),
            version: version.clone(),
            pinned: mark_pinned,
        };

        if pinned_skip {
            entry.reason = "pinned (use --force to override)".to_string();
            promotable.push(false);
            actions.push(entry);
            continue;
        }

        if !in_scope {
            entry.reason = "not requested".to_string();
            promotable.push(false);
            actions.push(entry);
            continue;
        }

        let affected = if let Some(reason) = &pin_reason {
            Some(reason.clone())
        } else {
            direct_change_reason(
                detector,
                ledger,
                artifact,
                &rel_path,
                &head,
                &uncommitted,
                &mut changed_paths,
            )
        };

        match affected {
            Some(reason) => promote(&mut entry, reason),
            None => entry.reason = "no changes detected".to_string(),
        }

        promotable.push(true);
        actions.push(entry);
    }

    resolve_closure(&mut actions, &promotable);

    Ok(Plan {
        commit: head,
        actions,
        changed_files: changed_paths.len(),
    })
}

/// Why the artifact is directly affected, or `None` when unchanged
fn direct_change_reason(
    detector: &ChangeDetector,
    ledger: &LockLedger,
    artifact: &crate::models::Artifact,
    rel_path: &str,
    head: &str,
    uncommitted: &[crate::git::ChangedFile],
    changed_paths: &mut HashSet<String>,
) -> Option<String> {
    if uncommitted.iter().any(|f| in_dir(&f.path, rel_path)) {
        return Some("files changed".to_string());
    }

    match ledger.last_deployed_commit(&artifact.name) {
        Some(commit) if commit != head && !head.is_empty() => {
            match detector.changed_between(commit, head) {
                Ok(files) => {
                    let hit = files.iter().any(|f| in_dir(&f.path, rel_path));
                    changed_paths.extend(files.into_iter().map(|f| f.path));
                    hit.then(|| "files changed".to_string())
                }
                // History rewritten under us; fail toward validation
                Err(_) => Some("previous deploy commit not found".to_string()),
            }
        }
        Some(_) => None,
        // First-deploy case; libraries are never deployed, so it does not
        // apply to them
        None if artifact.is_lib => None,
        None => detector
            .is_tracked(rel_path)
            .then(|| "new artifact".to_string()),
    }
}

/// Worklist propagation: dependents of changed names become validate/deploy
///
/// Promotion is monotonic (skip to validate, never back), so the frontier
/// drains even on a cyclic graph; cycle reporting lives in `check`.
fn resolve_closure(actions: &mut [PlannedAction], promotable: &[bool]) {
    let mut dependents: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, action) in actions.iter().enumerate() {
        for dep in &action.depends_on {
            dependents.entry(dep.clone()).or_default().push(i);
        }
    }

    let mut frontier: VecDeque<usize> = actions
        .iter()
        .enumerate()
        .filter(|(_, a)| a.action != Action::Skip)
        .map(|(i, _)| i)
        .collect();

    while let Some(changed) = frontier.pop_front() {
        let changed_name = actions[changed].name.clone();
        let Some(indices) = dependents.get(&changed_name) else {
            continue;
        };

        for &i in indices.clone().iter() {
            if actions[i].action != Action::Skip || !promotable[i] {
                continue;
            }
            promote(&mut actions[i], format!("dependency '{changed_name}' changed"));
            frontier.push_back(i);
        }
    }
}

fn promote(entry: &mut PlannedAction, reason: String) {
    entry.action = if !entry.is_lib && !entry.deploy_steps.is_empty() {
        Action::Deploy
    } else {
        Action::Validate
    };
    entry.reason = reason;
}

/// Is `path` equal to or nested under `dir`?
fn in_dir(path: &str, dir: &str) -> bool {
    if dir.is_empty() || dir == "." {
        return true;
    }
    path == dir || path.starts_with(&format!("{dir}/"))
}

/// Forward-slash path of `path` relative to `root`
fn workspace_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
