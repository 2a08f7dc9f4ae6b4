//! Core data models for Convoy
//!
//! Defines the fundamental data structures used throughout Convoy:
//! - `Artifact`: a deployable unit or shared library discovered in the workspace
//! - `Language`: detection rules plus validation steps
//! - `Target`: a reusable deployment recipe with default variables
//! - `Step`: a single named shell command

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A single named shell command, run during validation or deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    /// Shell command; may contain `$VAR` / `${VAR}` placeholders
    pub run: String,
}

/// How a language is detected in an artifact directory
///
/// A directory matches if any of `files` exists in it, or if `pattern`
/// matches at least one entry (non-recursive, like `ls <dir>/<pattern>`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Detection {
    /// Marker filenames, e.g. `["Cargo.toml"]`
    #[serde(default)]
    pub files: Vec<String>,
    /// Glob pattern, e.g. `"*.go"`
    #[serde(default)]
    pub pattern: Option<String>,
}

/// A language with detection rules and validation steps
///
/// Languages are configured as an ordered list; detection tests them in
/// order and the first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    #[serde(default)]
    pub detection: Detection,
    /// Validation steps (lint, test, build), run in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A reusable deployment recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    /// Default variables, overridable per artifact via `params`
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
    /// Deployment steps, run in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Sentinel language name assigned when no detection rule matches
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// A deployable unit or shared library (from `convoy.artifact.yml` /
/// `convoy.lib.yml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Unique name across the workspace (duplicates are a fatal config error)
    pub name: String,

    /// Target name; empty only for libraries
    #[serde(default)]
    pub target: String,

    /// Artifact-local overrides for target variables
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Names of artifacts/libraries this one depends on
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Set by the scanner for libraries; never read from descriptors
    #[serde(skip)]
    pub is_lib: bool,
}

/// A shared library descriptor (`convoy.lib.yml`)
///
/// Libraries have no target and are never deployed, but participate in
/// dependency propagation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Library {
    /// Convert to an `Artifact` for unified handling in the planner
    pub fn into_artifact(self) -> Artifact {
        Artifact {
            name: self.name,
            target: String::new(),
            params: BTreeMap::new(),
            depends_on: self.depends_on,
            is_lib: true,
        }
    }
}

/// An artifact found by the scanner, with its directory and detected language
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredArtifact {
    /// Absolute directory containing the descriptor
    pub path: PathBuf,
    pub artifact: Artifact,
    /// Detected language name, or [`UNKNOWN_LANGUAGE`]
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_deserialize_minimal() {
        let yaml = "name: user-api\ntarget: docker";
        let artifact: Artifact = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(artifact.name, "user-api");
        assert_eq!(artifact.target, "docker");
        assert!(artifact.params.is_empty());
        assert!(artifact.depends_on.is_empty());
        assert!(!artifact.is_lib);
    }

    #[test]
    fn test_artifact_deserialize_full() {
        let yaml = r#"
name: user-api
target: cloudrun
params:
  REGION: europe-west3
  MEMORY: 1Gi
depends_on:
  - shared-lib
  - auth-lib
"#;
        let artifact: Artifact = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(artifact.name, "user-api");
        assert_eq!(artifact.target, "cloudrun");
        assert_eq!(artifact.params.get("REGION").unwrap(), "europe-west3");
        assert_eq!(artifact.depends_on, vec!["shared-lib", "auth-lib"]);
    }

    #[test]
    fn test_artifact_missing_name_fails() {
        let yaml = "target: docker";
        let result: Result<Artifact, _> = serde_yaml_ng::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_library_into_artifact() {
        let yaml = "name: shared-lib\ndepends_on: [base-lib]";
        let lib: Library = serde_yaml_ng::from_str(yaml).unwrap();
        let artifact = lib.into_artifact();

        assert_eq!(artifact.name, "shared-lib");
        assert!(artifact.is_lib);
        assert!(artifact.target.is_empty());
        assert_eq!(artifact.depends_on, vec!["base-lib"]);
    }

    #[test]
    fn test_step_deserialize() {
        let yaml = "name: Test\nrun: cargo test";
        let step: Step = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(step.name, "Test");
        assert_eq!(step.run, "cargo test");
    }

    #[test]
    fn test_step_yaml_shape() {
        let step = Step {
            name: "Test".to_string(),
            run: "cargo test".to_string(),
        };
        insta::assert_snapshot!(serde_yaml_ng::to_string(&step).unwrap(), @r#"
        name: Test
        run: cargo test
        "#);
    }

    #[test]
    fn test_detection_defaults_are_empty() {
        let yaml = "{}";
        let detection: Detection = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(detection.files.is_empty());
        assert!(detection.pattern.is_none());
    }

    #[test]
    fn test_language_deserialize() {
        let yaml = r#"
name: rust
detection:
  files: [Cargo.toml]
steps:
  - name: Lint
    run: cargo clippy -- -D warnings
  - name: Test
    run: cargo test
"#;
        let lang: Language = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(lang.name, "rust");
        assert_eq!(lang.detection.files, vec!["Cargo.toml"]);
        assert_eq!(lang.steps.len(), 2);
        assert_eq!(lang.steps[1].name, "Test");
    }

    #[test]
    fn test_target_deserialize() {
        let yaml = r#"
name: docker
defaults:
  REGISTRY: docker.io
steps:
  - name: Build image
    run: docker build -t $REGISTRY/$NAME:$VERSION .
"#;
        let target: Target = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(target.name, "docker");
        assert_eq!(target.defaults.get("REGISTRY").unwrap(), "docker.io");
        assert_eq!(target.steps.len(), 1);
    }
}
