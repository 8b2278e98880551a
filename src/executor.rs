//! Command execution.
//!
//! Runs one command line at a time through the platform shell, relaying the
//! captured stdout/stderr to the terminal. `cd` is the single builtin: a
//! subprocess-local directory change would not survive the loop iteration, so
//! it mutates the process working directory directly.
//!
//! Every failure is caught here and collapsed to `false`; nothing propagates
//! to the interactive loop.

use crate::platform::PlatformKind;
use anyhow::{anyhow, Result};
use crossterm::style::Stylize;
use std::io::Write;
use std::process::{Command, Output};
use tracing::{error, info};

// =============================================================================
// Traits for Dependency Injection
// =============================================================================

/// Trait for running system processes.
///
/// This abstraction enables testing without spawning real processes.
pub trait ProcessRunner: Send + Sync {
    /// Executes a program and returns its captured output.
    fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
}

/// Default process runner using std::process::Command.
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        Ok(cmd.output()?)
    }
}

// =============================================================================
// Executor Implementation
// =============================================================================

/// Executes command lines under the shell for the detected platform.
///
/// Returns plain success/failure; the interactive loop branches on that to
/// decide whether to fall back to AI translation. Note that a real command
/// exiting non-zero (a grep with no matches, a failing compiler) is
/// indistinguishable from an unrecognized command here. That conflation is
/// intentional and core to the interaction model.
pub struct Executor<P = SystemProcessRunner> {
    platform: PlatformKind,
    runner: P,
}

impl Executor<SystemProcessRunner> {
    /// Creates an executor spawning real subprocesses.
    pub fn new(platform: PlatformKind) -> Self {
        Self::with_runner(platform, SystemProcessRunner)
    }
}

impl<P: ProcessRunner> Executor<P> {
    /// Creates an executor with an injected process runner (for testing).
    pub fn with_runner(platform: PlatformKind, runner: P) -> Self {
        Self { platform, runner }
    }

    /// Executes `line`, relaying output to the real stdout/stderr.
    ///
    /// Returns `true` when the command exited with status zero (or was a
    /// no-op / successful builtin), `false` on any failure.
    pub fn execute(&self, line: &str) -> bool {
        self.execute_with_io(line, &mut std::io::stdout(), &mut std::io::stderr())
    }

    /// Executes `line` with injected output sinks (for testing).
    pub fn execute_with_io<W1: Write, W2: Write>(
        &self,
        line: &str,
        out: &mut W1,
        err: &mut W2,
    ) -> bool {
        match self.run_line(line, out, err) {
            Ok(succeeded) => succeeded,
            Err(e) => {
                error!("Command execution error: {}", e);
                let _ = writeln!(err, "{}", format!("Error running command: {}", e).red());
                false
            }
        }
    }

    fn run_line<W1: Write, W2: Write>(
        &self,
        line: &str,
        out: &mut W1,
        err: &mut W2,
    ) -> Result<bool> {
        let mut parts = line.split_whitespace();
        let first = match parts.next() {
            Some(token) => token,
            // Blank input is a no-op, not a failure.
            None => return Ok(true),
        };

        if first.eq_ignore_ascii_case("cd") {
            let target: Vec<&str> = parts.collect();
            return self.change_directory(&target.join(" "), err);
        }

        let (shell, flag) = self.platform.shell_invocation();
        info!("Spawning through {}: {}", shell, line);
        let output = self.runner.run(shell, &[flag, line.trim()])?;
        self.relay_output(&output, out, err)?;

        Ok(output.status.success())
    }

    /// The `cd` builtin. Empty target resolves to the home directory.
    fn change_directory<W: Write>(&self, target: &str, err: &mut W) -> Result<bool> {
        let path = resolve_cd_target(target)?;
        info!("cd builtin: {}", path.display());

        match std::env::set_current_dir(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                writeln!(
                    err,
                    "{}",
                    format!("Error: directory not found: '{}'", path.display()).red()
                )?;
                Ok(false)
            }
            Err(e) => {
                writeln!(err, "{}", format!("Error running 'cd': {}", e).red())?;
                Ok(false)
            }
        }
    }

    /// Prints non-empty stdout verbatim and non-empty stderr in red, both
    /// trimmed. Undecodable bytes are replaced rather than rejected.
    fn relay_output<W1: Write, W2: Write>(
        &self,
        output: &Output,
        out: &mut W1,
        err: &mut W2,
    ) -> Result<()> {
        let stdout_text = String::from_utf8_lossy(&output.stdout);
        if !stdout_text.trim().is_empty() {
            writeln!(out, "{}", stdout_text.trim())?;
        }

        let stderr_text = String::from_utf8_lossy(&output.stderr);
        if !stderr_text.trim().is_empty() {
            writeln!(err, "{}", stderr_text.trim().red())?;
        }

        Ok(())
    }
}

/// Resolves the argument of the `cd` builtin to a concrete path.
fn resolve_cd_target(target: &str) -> Result<std::path::PathBuf> {
    if target.trim().is_empty() {
        dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))
    } else {
        Ok(std::path::PathBuf::from(target))
    }
}
