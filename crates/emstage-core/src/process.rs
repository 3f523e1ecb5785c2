//! External process capability.
//!
//! All side effects outside the filesystem go through [`ProcessRunner`], so
//! provisioning and compilation can be exercised without spawning anything.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ProcessError;

/// One external command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; inherits the caller's when `None`.
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands and resolves programs on the execution path.
pub trait ProcessRunner {
    /// Run a command to completion. A non-zero exit is an error.
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput, ProcessError>;

    /// Resolve a program name against the execution path.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        (**self).run(cmd)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        (**self).locate(program)
    }
}

/// Spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        tracing::debug!(command = %cmd, cwd = ?cmd.cwd, "spawning process");

        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(dir) = &cmd.cwd {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| ProcessError::Spawn {
            command: cmd.to_string(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !stdout.is_empty() {
            tracing::debug!(stdout = %stdout, "command stdout");
        }
        if !stderr.is_empty() {
            tracing::debug!(stderr = %stderr, "command stderr");
        }

        if !output.status.success() {
            return Err(ProcessError::Failed {
                command: cmd.to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(ProcessOutput { stdout, stderr })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}
