//! Error types for Convoy
//!
//! Uses `thiserror` for library errors; commands wrap these with `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Convoy operations
pub type ConvoyResult<T> = Result<T, ConvoyError>;

/// Main error type for Convoy operations
#[derive(Error, Debug)]
pub enum ConvoyError {
    /// Workspace config file missing
    #[error("config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Two descriptors declare the same artifact name
    #[error("duplicate artifact name '{name}' in:\n  - {}\n  - {}", first.display(), second.display())]
    DuplicateArtifact {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// `use:` references a language preset that does not exist
    #[error("unknown language preset: {0}")]
    UnknownLanguagePreset(String),

    /// `use:` references a target preset that does not exist
    #[error("unknown target preset: {0}")]
    UnknownTargetPreset(String),

    /// An artifact names a target that is configured nowhere
    #[error("artifact '{artifact}' references unknown target '{target}'")]
    UnknownTarget { artifact: String, target: String },

    /// An artifact depends on a name no descriptor declares
    #[error("artifact '{artifact}' depends on unknown artifact '{dependency}'")]
    UnresolvedDependency {
        artifact: String,
        dependency: String,
    },

    /// `plan` was asked to scope to a name no descriptor declares
    #[error("unknown artifact: {0}")]
    UnknownArtifact(String),

    /// `apply` invoked without a prior `plan`
    #[error("no plan found. Run 'convoy plan' first")]
    MissingPlan,

    /// A git subprocess failed where the result is required
    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    /// A shell step exited non-zero
    #[error("{step}: exited with {code}")]
    StepFailed { step: String, code: i32 },

    /// Execution interrupted by the caller (signal)
    #[error("cancelled")]
    Cancelled,

    /// One or more artifacts failed validation
    #[error("validation failed for {0} artifact(s)")]
    ValidationFailed(usize),

    /// One or more artifacts failed deployment
    #[error("deployment failed for {0} artifact(s)")]
    DeploymentFailed(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error (descriptors, config, plan file)
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// TOML parsing error (lock ledger)
    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error (lock ledger)
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_duplicate_artifact() {
        let err = ConvoyError::DuplicateArtifact {
            name: "user-api".to_string(),
            first: PathBuf::from("services/user-api"),
            second: PathBuf::from("legacy/user-api"),
        };
        assert_eq!(
            err.to_string(),
            "duplicate artifact name 'user-api' in:\n  - services/user-api\n  - legacy/user-api"
        );
    }

    #[test]
    fn test_error_display_missing_plan() {
        assert_eq!(
            ConvoyError::MissingPlan.to_string(),
            "no plan found. Run 'convoy plan' first"
        );
    }

    #[test]
    fn test_error_display_step_failed() {
        let err = ConvoyError::StepFailed {
            step: "Build image".to_string(),
            code: 2,
        };
        assert_eq!(err.to_string(), "Build image: exited with 2");
    }
}
