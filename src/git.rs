//! Change detection against git
//!
//! Wraps git subprocess queries and normalizes results to paths relative
//! to the workspace root. The workspace may live in a subdirectory of the
//! repository; diff output is repo-root-relative, so entries outside the
//! workspace are discarded and the workspace prefix is stripped from the
//! rest.
//!
//! Failure policy: the three working-tree sub-queries (staged, unstaged,
//! untracked) degrade gracefully — a failing one is warned about and
//! treated as empty. Commit-range diffs propagate errors so the planner
//! can treat an unresolvable commit as "changed".

use std::path::{Path, PathBuf};

use crate::error::{ConvoyError, ConvoyResult};
use crate::process::CommandRunner;

const DIFF_FLAGS: [&str; 3] = [
    "--name-status",
    "--ignore-space-change",
    "--ignore-blank-lines",
];

/// Status letter of a changed file, from `git diff --name-status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    /// `R<similarity>` in git output
    Renamed,
}

impl FileStatus {
    fn from_letter(letter: &str) -> Self {
        match letter.chars().next() {
            Some('A') => FileStatus::Added,
            Some('D') => FileStatus::Deleted,
            Some('R') => FileStatus::Renamed,
            _ => FileStatus::Modified,
        }
    }
}

/// A changed file, path relative to the workspace root (forward slashes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
}

/// Git-backed change detector for one workspace root
pub struct ChangeDetector<'a> {
    root: &'a Path,
    runner: &'a dyn CommandRunner,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(root: &'a Path, runner: &'a dyn CommandRunner) -> Self {
        Self { root, runner }
    }

    /// Resolve HEAD; empty string when the tree is not git-managed
    pub fn current_commit(&self) -> String {
        match self.runner.run("git", &["rev-parse", "HEAD"], self.root) {
            Ok(out) if out.success => out.stdout_trimmed(),
            _ => String::new(),
        }
    }

    /// Repository root directory, if any
    fn git_root(&self) -> Option<PathBuf> {
        match self
            .runner
            .run("git", &["rev-parse", "--show-toplevel"], self.root)
        {
            Ok(out) if out.success => Some(PathBuf::from(out.stdout_trimmed())),
            _ => None,
        }
    }

    /// Prefix (with trailing slash) of the workspace inside the repository,
    /// or `None` when the workspace is the repository root
    fn workspace_prefix(&self) -> Option<String> {
        let git_root = self.git_root()?;
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.to_path_buf());
        let git_root = git_root.canonicalize().unwrap_or(git_root);

        let rel = root.strip_prefix(&git_root).ok()?;
        if rel.as_os_str().is_empty() {
            return None;
        }

        let mut prefix = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        prefix.push('/');
        Some(prefix)
    }

    /// All uncommitted changes: staged diff ∪ unstaged diff ∪ untracked
    /// files, deduplicated, workspace-relative
    pub fn uncommitted_changes(&self) -> Vec<ChangedFile> {
        let mut files = Vec::new();

        let staged = ["diff", DIFF_FLAGS[0], "--cached", DIFF_FLAGS[1], DIFF_FLAGS[2]];
        match self.runner.run("git", &staged, self.root) {
            Ok(out) if out.success => files.extend(parse_name_status(&out.stdout)),
            _ => eprintln!("warning: failed to get staged changes, treating as empty"),
        }

        let unstaged = ["diff", DIFF_FLAGS[0], DIFF_FLAGS[1], DIFF_FLAGS[2]];
        match self.runner.run("git", &unstaged, self.root) {
            Ok(out) if out.success => files.extend(parse_name_status(&out.stdout)),
            _ => eprintln!("warning: failed to get unstaged changes, treating as empty"),
        }

        match self
            .runner
            .run("git", &["ls-files", "--others", "--exclude-standard"], self.root)
        {
            Ok(out) if out.success => {
                for line in out.stdout.lines() {
                    let line = line.trim();
                    if !line.is_empty() {
                        files.push(ChangedFile {
                            path: line.to_string(),
                            status: FileStatus::Added,
                        });
                    }
                }
            }
            _ => eprintln!("warning: failed to get untracked files, treating as empty"),
        }

        dedupe(self.to_workspace_relative(files))
    }

    /// Changed files between two commits; errors when a commit cannot be
    /// resolved (callers treat that as "changed")
    pub fn changed_between(&self, from: &str, to: &str) -> ConvoyResult<Vec<ChangedFile>> {
        let range = format!("{from}..{to}");
        let args = ["diff", DIFF_FLAGS[0], DIFF_FLAGS[1], DIFF_FLAGS[2], &range];
        let out = self.runner.run("git", &args, self.root)?;
        if !out.success {
            return Err(ConvoyError::Git {
                command: format!("diff {range}"),
                message: out.stderr.trim().to_string(),
            });
        }

        Ok(dedupe(self.to_workspace_relative(parse_name_status(&out.stdout))))
    }

    /// Whether the given workspace-relative path has tracked files
    pub fn is_tracked(&self, rel_path: &str) -> bool {
        match self.runner.run("git", &["ls-files", rel_path], self.root) {
            Ok(out) => out.success && !out.stdout.trim().is_empty(),
            Err(_) => false,
        }
    }

    /// Drop entries outside the workspace subtree, strip the prefix from
    /// the rest
    fn to_workspace_relative(&self, files: Vec<ChangedFile>) -> Vec<ChangedFile> {
        let Some(prefix) = self.workspace_prefix() else {
            return files;
        };

        files
            .into_iter()
            .filter_map(|f| {
                f.path.strip_prefix(&prefix).map(|stripped| ChangedFile {
                    path: stripped.to_string(),
                    status: f.status,
                })
            })
            .collect()
    }
}

fn parse_name_status(output: &str) -> Vec<ChangedFile> {
    let mut files = Vec::new();

    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let Some(status) = fields.next() else { continue };
        // Rename lines carry two paths; the last one is where the file is now
        let Some(path) = fields.last() else { continue };

        files.push(ChangedFile {
            path: path.to_string(),
            status: FileStatus::from_letter(status),
        });
    }

    files
}

fn dedupe(files: Vec<ChangedFile>) -> Vec<ChangedFile> {
    let mut seen = std::collections::HashSet::new();
    files
        .into_iter()
        .filter(|f| seen.insert(f.path.clone()))
        .collect()
}
