//! Artifact discovery
//!
//! Walks the workspace tree looking for `convoy.artifact.yml` and
//! `convoy.lib.yml` descriptors, loads them, and attaches a detected
//! language. Hidden and gitignored directories are skipped. The walk is
//! sorted so planning order is deterministic.

use std::collections::HashMap;
use std::path::Path;

use globset::Glob;
use ignore::WalkBuilder;

use crate::config::{self, Config, ARTIFACT_FILE, LIB_FILE};
use crate::error::{ConvoyError, ConvoyResult};
use crate::models::{DiscoveredArtifact, Language, UNKNOWN_LANGUAGE};

/// Recursively scan `root` for artifact and library descriptors
///
/// Duplicate artifact names are a fatal configuration error, reported with
/// both offending paths.
pub fn scan_artifacts(root: &Path, cfg: &Config) -> ConvoyResult<Vec<DiscoveredArtifact>> {
    let mut artifacts = Vec::new();
    let mut seen: HashMap<String, std::path::PathBuf> = HashMap::new();

    let walker = WalkBuilder::new(root)
        .sort_by_file_path(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = entry.map_err(|e| ConvoyError::Io(std::io::Error::other(e)))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        let artifact = match file_name.as_ref() {
            ARTIFACT_FILE => config::load_artifact(entry.path())?,
            LIB_FILE => config::load_library(entry.path())?.into_artifact(),
            _ => continue,
        };

        let dir = entry
            .path()
            .parent()
            .unwrap_or(root)
            .to_path_buf();

        if let Some(first) = seen.get(&artifact.name) {
            return Err(ConvoyError::DuplicateArtifact {
                name: artifact.name,
                first: first.clone(),
                second: dir,
            });
        }
        seen.insert(artifact.name.clone(), dir.clone());

        let language = detect_language(&dir, &cfg.languages);
        artifacts.push(DiscoveredArtifact {
            path: dir,
            artifact,
            language,
        });
    }

    Ok(artifacts)
}

/// Detect the language of a directory: first configured language whose
/// detection rule matches wins; no match yields [`UNKNOWN_LANGUAGE`]
pub fn detect_language(dir: &Path, languages: &[Language]) -> String {
    for lang in languages {
        for marker in &lang.detection.files {
            if dir.join(marker).exists() {
                return lang.name.clone();
            }
        }

        if let Some(pattern) = &lang.detection.pattern {
            if pattern_matches(dir, pattern) {
                return lang.name.clone();
            }
        }
    }

    UNKNOWN_LANGUAGE.to_string()
}

/// Non-recursive glob test: does any direct entry of `dir` match?
fn pattern_matches(dir: &Path, pattern: &str) -> bool {
    let Ok(glob) = Glob::new(pattern) else {
        return false;
    };
    let matcher = glob.compile_matcher();

    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };

    entries
        .flatten()
        .any(|e| matcher.is_match(Path::new(&e.file_name())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Detection;
    use std::fs;
    use tempfile::tempdir;

    fn lang(name: &str, files: &[&str], pattern: Option<&str>) -> Language {
        Language {
            name: name.to_string(),
            detection: Detection {
                files: files.iter().map(|f| f.to_string()).collect(),
                pattern: pattern.map(|p| p.to_string()),
            },
            steps: Vec::new(),
        }
    }

    #[test]
    fn test_detect_language_by_marker_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();

        let languages = vec![lang("go", &["go.mod"], None), lang("rust", &["Cargo.toml"], None)];
        assert_eq!(detect_language(dir.path(), &languages), "rust");
    }

    #[test]
    fn test_detect_language_by_pattern() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("handler.py"), "").unwrap();

        let languages = vec![lang("python", &[], Some("*.py"))];
        assert_eq!(detect_language(dir.path(), &languages), "python");
    }

    #[test]
    fn test_detect_language_first_match_wins() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "").unwrap();
        fs::write(dir.path().join("package.json"), "").unwrap();

        let languages = vec![
            lang("node", &["package.json"], None),
            lang("rust", &["Cargo.toml"], None),
        ];
        assert_eq!(detect_language(dir.path(), &languages), "node");
    }

    #[test]
    fn test_detect_language_no_match_is_unknown() {
        let dir = tempdir().unwrap();
        let languages = vec![lang("rust", &["Cargo.toml"], None)];
        assert_eq!(detect_language(dir.path(), &languages), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn test_scan_finds_artifacts_and_libraries() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("services/api")).unwrap();
        fs::create_dir_all(dir.path().join("libs/shared")).unwrap();
        fs::write(
            dir.path().join("services/api/convoy.artifact.yml"),
            "name: api\ntarget: docker\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("libs/shared/convoy.lib.yml"),
            "name: shared\n",
        )
        .unwrap();

        let cfg = Config::default();
        let artifacts = scan_artifacts(dir.path(), &cfg).unwrap();

        assert_eq!(artifacts.len(), 2);
        // Sorted walk: libs/ before services/
        assert_eq!(artifacts[0].artifact.name, "shared");
        assert!(artifacts[0].artifact.is_lib);
        assert_eq!(artifacts[1].artifact.name, "api");
        assert!(!artifacts[1].artifact.is_lib);
        assert!(artifacts[1].path.ends_with("services/api"));
    }

    #[test]
    fn test_scan_attaches_detected_language() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("api")).unwrap();
        fs::write(
            dir.path().join("api/convoy.artifact.yml"),
            "name: api\ntarget: docker\n",
        )
        .unwrap();
        fs::write(dir.path().join("api/go.mod"), "module api").unwrap();

        let mut cfg = Config::default();
        cfg.languages.push(lang("go", &["go.mod"], None));

        let artifacts = scan_artifacts(dir.path(), &cfg).unwrap();
        assert_eq!(artifacts[0].language, "go");
    }

    #[test]
    fn test_scan_duplicate_names_are_fatal() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/convoy.artifact.yml"), "name: api\n").unwrap();
        fs::write(dir.path().join("b/convoy.artifact.yml"), "name: api\n").unwrap();

        let err = scan_artifacts(dir.path(), &Config::default()).unwrap_err();
        assert!(matches!(err, ConvoyError::DuplicateArtifact { name, .. } if name == "api"));
    }

    #[test]
    fn test_scan_skips_hidden_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".cache/api")).unwrap();
        fs::write(
            dir.path().join(".cache/api/convoy.artifact.yml"),
            "name: api\ntarget: docker\n",
        )
        .unwrap();

        let artifacts = scan_artifacts(dir.path(), &Config::default()).unwrap();
        assert!(artifacts.is_empty());
    }
}
