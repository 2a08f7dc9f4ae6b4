//! Convoy - plan/apply deployment orchestration for monorepos
//!
//! Convoy discovers deployable artifacts in a workspace, decides which of
//! them changed since their last deployment (directly or through a
//! dependency), validates them, and deploys them with bounded
//! concurrency. The flow is two-phase in the terraform style:
//!
//! - `plan` detects changes, runs validation steps, and writes a durable
//!   plan file
//! - `apply` consumes the plan file, runs deployment steps, and records
//!   the result in the lock ledger
//!
//! State lives in two committed files: `convoy.lock.toml` (per-artifact
//! deployment records) and `.convoy/plan.yml` (the single-use plan).

pub mod config;
pub mod error;
pub mod executor;
pub mod git;
pub mod lockfile;
pub mod models;
pub mod plan_file;
pub mod planner;
pub mod presets;
pub mod process;
pub mod scanner;
pub mod ui;

pub use error::{ConvoyError, ConvoyResult};
