//! Durable plan file
//!
//! `convoy plan` writes its result to `.convoy/plan.yml`; `convoy apply`
//! reads it back, deploys, and removes it. The file records the commit it
//! was planned at so apply can warn when the workspace has moved on.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConvoyError, ConvoyResult};
use crate::models::Step;

/// Directory holding the plan file, relative to the workspace root
pub const PLAN_DIR: &str = ".convoy";

/// Plan filename inside [`PLAN_DIR`]
pub const PLAN_FILE: &str = "plan.yml";

/// One artifact scheduled for deployment
///
/// Carries the resolved steps and merged variables, so apply executes
/// exactly what was planned even when the descriptors change in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanArtifact {
    pub name: String,
    /// Directory relative to the workspace root
    pub path: String,
    pub language: String,
    pub target: String,
    /// Version that will be recorded on deploy (short commit)
    pub version: String,
    /// Commit to record in the ledger
    pub commit: String,
    /// Why this artifact is in the plan
    pub reason: String,
    /// Merged variables: target defaults < artifact params < NAME/VERSION
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    /// Deploy steps resolved at plan time
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Deployment was requested with `--pin`
    #[serde(default)]
    pub pinned: bool,
}

/// One artifact the plan decided not to deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSkipped {
    pub name: String,
    pub reason: String,
}

/// The serialized plan (`.convoy/plan.yml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFile {
    /// When the plan was created (UTC)
    pub created_at: DateTime<Utc>,
    /// Workspace HEAD at plan time; apply warns if HEAD has moved
    pub commit: String,
    /// Distinct changed files seen while planning
    #[serde(default)]
    pub changed_files: usize,
    /// Artifacts that ran validation
    #[serde(default)]
    pub validated: usize,
    #[serde(default)]
    pub to_deploy: usize,
    #[serde(default)]
    pub total_skipped: usize,
    #[serde(default)]
    pub artifacts: Vec<PlanArtifact>,
    #[serde(default)]
    pub skipped: Vec<PlanSkipped>,
}

impl PlanFile {
    pub fn new(
        commit: String,
        changed_files: usize,
        validated: usize,
        artifacts: Vec<PlanArtifact>,
        skipped: Vec<PlanSkipped>,
    ) -> Self {
        Self {
            created_at: Utc::now(),
            commit,
            changed_files,
            validated,
            to_deploy: artifacts.len(),
            total_skipped: skipped.len(),
            artifacts,
            skipped,
        }
    }

    /// Write the plan into `root`, creating `.convoy/` as needed
    pub fn save(&self, root: &Path) -> ConvoyResult<()> {
        fs::create_dir_all(root.join(PLAN_DIR))?;
        let data = serde_yaml_ng::to_string(self)?;
        fs::write(plan_path(root), data)?;
        Ok(())
    }

    /// Load the plan from `root`; a missing file means no plan was made
    pub fn load(root: &Path) -> ConvoyResult<Self> {
        let data = match fs::read_to_string(plan_path(root)) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConvoyError::MissingPlan);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_yaml_ng::from_str(&data)?)
    }
}

/// Delete the plan file if present
///
/// Called after apply regardless of outcome, so a half-failed apply is
/// never replayed from a stale plan.
pub fn remove_plan(root: &Path) -> ConvoyResult<()> {
    match fs::remove_file(plan_path(root)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub fn plan_exists(root: &Path) -> bool {
    plan_path(root).exists()
}

/// Path of the plan file inside `root`
pub fn plan_path(root: &Path) -> PathBuf {
    root.join(PLAN_DIR).join(PLAN_FILE)
}
