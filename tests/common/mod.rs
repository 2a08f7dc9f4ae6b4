//! Shared integration-test fixtures: a throwaway git workspace with a
//! convoy config and the binary under test.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Workspace config used by most scenarios: a `shell` language detected
/// by `build.sh` and an `echo` target that deploys nothing real.
pub const BASIC_CONFIG: &str = r#"name: testws
languages:
  - name: shell
    detection:
      files: [build.sh]
    steps:
      - name: Validate
        run: sh build.sh
targets:
  - name: echo
    defaults:
      CHANNEL: stable
    steps:
      - name: Deploy
        run: echo deployed $NAME $VERSION $CHANNEL
"#;

pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Empty git repository with identity configured
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let ws = Self { dir };
        ws.git(&["init", "-q"]);
        ws.git(&["config", "user.email", "ci@example.com"]);
        ws.git(&["config", "user.name", "CI"]);
        ws
    }

    /// Repository with [`BASIC_CONFIG`], `user-api` (depends on
    /// `shared-lib`) and `shared-lib`, all committed
    pub fn with_basic_workspace() -> Self {
        let ws = Self::new();
        ws.write("convoy.yml", BASIC_CONFIG);
        ws.write(
            "services/user-api/convoy.artifact.yml",
            "name: user-api\ntarget: echo\ndepends_on: [shared-lib]\n",
        );
        ws.write("services/user-api/build.sh", "echo user-api ok\n");
        ws.write("libs/shared/convoy.lib.yml", "name: shared-lib\n");
        ws.write("libs/shared/build.sh", "echo shared-lib ok\n");
        ws.commit_all("initial workspace");
        ws
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(rel)).unwrap()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.dir.path().join(rel).exists()
    }

    pub fn git(&self, args: &[&str]) {
        let out = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .unwrap();
        assert!(
            out.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
    }

    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "."]);
        self.git(&["commit", "-q", "-m", message]);
    }

    pub fn head(&self) -> String {
        let out = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(self.path())
            .output()
            .unwrap();
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    /// Seed a ledger entry so an artifact counts as already deployed
    pub fn seed_ledger_entry(&self, name: &str, commit: &str, target: &str) {
        let entry = format!(
            r#"[artifacts.{name}]
commit = "{commit}"
timestamp = "2024-01-01T00:00:00Z"
version = "{}"
target = "{target}"
"#,
            &commit[..commit.len().min(7)]
        );

        let mut ledger = if self.exists("convoy.lock.toml") {
            self.read("convoy.lock.toml")
        } else {
            String::new()
        };
        ledger.push_str(&entry);
        self.write("convoy.lock.toml", &ledger);
    }

    /// Run the convoy binary in the workspace root
    pub fn convoy(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_convoy"))
            .args(args)
            .current_dir(self.path())
            .output()
            .unwrap()
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
