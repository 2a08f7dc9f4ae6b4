//! Workspace configuration and descriptor loading
//!
//! Three YAML documents drive a workspace:
//! - `convoy.yml` — names the workspace and defines its languages and
//!   targets (as ordered lists, so "first match wins" detection is
//!   deterministic), optionally importing built-in presets via `use:`
//! - `convoy.artifact.yml` — one per deployable unit
//! - `convoy.lib.yml` — one per shared library

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConvoyError, ConvoyResult};
use crate::models::{Artifact, Language, Library, Target};
use crate::presets;

/// Workspace config filename, expected in the workspace root
pub const CONFIG_FILE: &str = "convoy.yml";

/// Artifact descriptor filename
pub const ARTIFACT_FILE: &str = "convoy.artifact.yml";

/// Library descriptor filename
pub const LIB_FILE: &str = "convoy.lib.yml";

/// Preset imports (`use:` section of `convoy.yml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UseConfig {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
}

/// The workspace configuration (`convoy.yml`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    pub name: String,

    /// Built-in presets to import; local definitions take precedence
    #[serde(default, rename = "use")]
    pub uses: UseConfig,

    /// Ordered: language detection tests these in order, first match wins
    #[serde(default)]
    pub languages: Vec<Language>,

    #[serde(default)]
    pub targets: Vec<Target>,
}

impl Config {
    /// Load `convoy.yml` and resolve all preset imports
    pub fn load(path: &Path) -> ConvoyResult<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvoyError::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConvoyError::Io(e)
            }
        })?;

        let mut config: Config = serde_yaml_ng::from_str(&data)?;
        config.resolve_presets()?;
        Ok(config)
    }

    /// Append imported presets after local definitions (local overrides preset)
    fn resolve_presets(&mut self) -> ConvoyResult<()> {
        for name in &self.uses.languages {
            if self.languages.iter().any(|l| &l.name == name) {
                continue;
            }
            let preset = presets::builtin_language(name)
                .ok_or_else(|| ConvoyError::UnknownLanguagePreset(name.clone()))?;
            self.languages.push(preset);
        }

        for name in &self.uses.targets {
            if self.targets.iter().any(|t| &t.name == name) {
                continue;
            }
            let preset = presets::builtin_target(name)
                .ok_or_else(|| ConvoyError::UnknownTargetPreset(name.clone()))?;
            self.targets.push(preset);
        }

        Ok(())
    }

    /// Look up a language by name
    pub fn language(&self, name: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.name == name)
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// Path to the workspace config inside `root`
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Load a `convoy.artifact.yml` file
pub fn load_artifact(path: &Path) -> ConvoyResult<Artifact> {
    let data = fs::read_to_string(path)?;
    Ok(serde_yaml_ng::from_str(&data)?)
}

/// Load a `convoy.lib.yml` file
pub fn load_library(path: &Path) -> ConvoyResult<Library> {
    let data = fs::read_to_string(path)?;
    Ok(serde_yaml_ng::from_str(&data)?)
}
