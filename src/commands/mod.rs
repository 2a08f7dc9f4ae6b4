//! Command implementations
//!
//! Each subcommand lives in its own module as a `cmd_*` function taking
//! typed options and returning `anyhow::Result`, so `main` stays a thin
//! argument-parsing shell.

use std::path::Path;

use anyhow::{Context, Result};

use convoy::config::{self, Config};
use convoy::models::DiscoveredArtifact;
use convoy::scanner;

mod apply;
mod check;
mod init;
mod list;
mod plan;
mod tree;

pub use apply::{cmd_apply, ApplyArgs};
pub use check::cmd_check;
pub use init::cmd_init;
pub use list::cmd_list;
pub use plan::{cmd_plan, PlanArgs};
pub use tree::cmd_tree;

/// Loaded workspace: config plus all discovered artifacts
pub struct Workspace {
    pub config: Config,
    pub artifacts: Vec<DiscoveredArtifact>,
}

impl Workspace {
    pub fn load(root: &Path) -> Result<Self> {
        let config = Config::load(&config::config_path(root))?;
        let artifacts = scanner::scan_artifacts(root, &config)
            .context("failed to scan workspace for artifacts")?;

        Ok(Self { config, artifacts })
    }
}
