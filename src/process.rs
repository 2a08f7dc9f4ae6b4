//! Subprocess invocation abstraction
//!
//! All external binaries (git, mainly) are invoked through the
//! `CommandRunner` trait so that change detection and planning can be
//! tested without a real checkout.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::ConvoyResult;

/// Captured result of one subprocess invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Trimmed stdout, convenient for single-line git answers
    pub fn stdout_trimmed(&self) -> String {
        self.stdout.trim().to_string()
    }
}

/// Abstract subprocess interface
///
/// `run` only fails when the process cannot be spawned at all; a non-zero
/// exit is reported through `CommandOutput::success`.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> ConvoyResult<CommandOutput>;
}

/// Real subprocess runner using `std::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> ConvoyResult<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Mock runner for tests: maps a command line to a canned output
///
/// Unmapped invocations report failure, which mirrors how callers treat a
/// git call that cannot answer.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockRunner {
    pub responses:
        std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, CommandOutput>>>,
}

#[cfg(test)]
impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register successful stdout for `program arg1 arg2 ...`
    pub fn respond(&self, command_line: &str, stdout: &str) {
        self.responses.lock().unwrap().insert(
            command_line.to_string(),
            CommandOutput {
                success: true,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
    }

    /// Register a failing invocation
    pub fn fail(&self, command_line: &str, stderr: &str) {
        self.responses.lock().unwrap().insert(
            command_line.to_string(),
            CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
    }
}

#[cfg(test)]
impl CommandRunner for MockRunner {
    fn run(&self, program: &str, args: &[&str], _cwd: &Path) -> ConvoyResult<CommandOutput> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }

        let responses = self.responses.lock().unwrap();
        Ok(responses.get(&line).cloned().unwrap_or(CommandOutput {
            success: false,
            stdout: String::new(),
            stderr: format!("mock: no response for '{line}'"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_shell_runner_captures_stdout() {
        let runner = ShellRunner;
        let out = runner
            .run("echo", &["hello"], &PathBuf::from("."))
            .unwrap();

        assert!(out.success);
        assert_eq!(out.stdout_trimmed(), "hello");
    }

    #[test]
    fn test_shell_runner_reports_nonzero_exit() {
        let runner = ShellRunner;
        let out = runner
            .run("sh", &["-c", "exit 3"], &PathBuf::from("."))
            .unwrap();

        assert!(!out.success);
    }

    #[test]
    fn test_mock_runner_round_trip() {
        let mock = MockRunner::new();
        mock.respond("git rev-parse HEAD", "abc123\n");

        let out = mock
            .run("git", &["rev-parse", "HEAD"], &PathBuf::from("/ws"))
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout_trimmed(), "abc123");

        let miss = mock
            .run("git", &["status"], &PathBuf::from("/ws"))
            .unwrap();
        assert!(!miss.success);
    }
}
