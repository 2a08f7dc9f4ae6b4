//! Deployment lock ledger
//!
//! `convoy.lock.toml` records, per artifact, the last deployed commit and
//! version. The planner diffs against the recorded commit to decide what
//! changed; `apply` updates entries as deployments succeed. A pinned entry
//! is skipped by future plans until it is unpinned or forced.
//!
//! Writes are atomic: the ledger is serialized to a temp file in the same
//! directory, then renamed over the old one.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConvoyResult;

/// Lock ledger filename, kept in the workspace root and committed to git
pub const LOCK_FILE: &str = "convoy.lock.toml";

/// One artifact's deployment record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    /// Commit the artifact was last deployed at
    pub commit: String,
    /// When the deployment happened (UTC)
    pub timestamp: DateTime<Utc>,
    /// Deployed version, the short commit hash
    pub version: String,
    /// Target the artifact was deployed to
    pub target: String,
    /// Pinned entries are skipped by planning until forced
    #[serde(default)]
    pub pinned: bool,
}

/// The full ledger, keyed by artifact name
///
/// `BTreeMap` keeps serialization order stable so diffs of the committed
/// file stay readable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockLedger {
    #[serde(default)]
    pub artifacts: BTreeMap<String, LockEntry>,
}

impl LockLedger {
    /// Load the ledger from `root`; a missing file is an empty ledger
    pub fn load(root: &Path) -> ConvoyResult<Self> {
        let path = lock_path(root);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(toml::from_str(&data)?)
    }

    /// Write the ledger atomically into `root`
    pub fn save(&self, root: &Path) -> ConvoyResult<()> {
        let data = toml::to_string_pretty(self)?;

        let mut tmp = tempfile::NamedTempFile::new_in(root)?;
        tmp.write_all(data.as_bytes())?;
        tmp.persist(lock_path(root)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Record a successful deployment of `name` at `commit`
    pub fn update_artifact(&mut self, name: &str, commit: &str, version: &str, target: &str) {
        self.insert(name, commit, version, target, false);
    }

    /// Record a pinned deployment; the artifact is skipped until unpinned
    pub fn update_artifact_pinned(
        &mut self,
        name: &str,
        commit: &str,
        version: &str,
        target: &str,
    ) {
        self.insert(name, commit, version, target, true);
    }

    fn insert(&mut self, name: &str, commit: &str, version: &str, target: &str, pinned: bool) {
        self.artifacts.insert(
            name.to_string(),
            LockEntry {
                commit: commit.to_string(),
                timestamp: Utc::now(),
                version: version.to_string(),
                target: target.to_string(),
                pinned,
            },
        );
    }

    /// Commit `name` was last deployed at, if ever
    pub fn last_deployed_commit(&self, name: &str) -> Option<&str> {
        self.artifacts.get(name).map(|e| e.commit.as_str())
    }

    pub fn is_pinned(&self, name: &str) -> bool {
        self.artifacts.get(name).is_some_and(|e| e.pinned)
    }
}

/// Path of the lock ledger inside `root`
pub fn lock_path(root: &Path) -> PathBuf {
    root.join(LOCK_FILE)
}
