//! In-process fake of [`ProcessRunner`] for tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::ProcessError;
use crate::process::{CommandSpec, ProcessOutput, ProcessRunner};

type Hook = Box<dyn Fn(&CommandSpec) + Send + Sync>;

/// Records commands instead of running them.
///
/// `locate` answers from a fixed table, a program can be marked as failing,
/// and hooks can produce the files a real program would have written.
#[derive(Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<CommandSpec>>,
    located: HashMap<String, PathBuf>,
    failing: Option<(String, i32)>,
    hooks: HashMap<String, Hook>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `program` resolvable on the execution path.
    pub fn with_program(mut self, program: &str, path: impl Into<PathBuf>) -> Self {
        self.located.insert(program.to_string(), path.into());
        self
    }

    /// Fail every invocation whose program file name is `program`.
    pub fn failing(mut self, program: &str, code: i32) -> Self {
        self.failing = Some((program.to_string(), code));
        self
    }

    /// Run `hook` whenever a command with program file name `program` runs.
    pub fn on_run(
        mut self,
        program: &str,
        hook: impl Fn(&CommandSpec) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.insert(program.to_string(), Box::new(hook));
        self
    }

    /// Commands run so far, in order.
    pub fn commands(&self) -> Vec<CommandSpec> {
        match self.commands.lock() {
            Ok(commands) => commands.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Rendered command lines, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.commands().iter().map(ToString::to_string).collect()
    }
}

fn program_name(cmd: &CommandSpec) -> String {
    PathBuf::from(&cmd.program)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cmd.program.clone())
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        match self.commands.lock() {
            Ok(mut commands) => commands.push(cmd.clone()),
            Err(poisoned) => poisoned.into_inner().push(cmd.clone()),
        }

        let name = program_name(cmd);
        if let Some((failing, code)) = &self.failing {
            if *failing == name {
                return Err(ProcessError::Failed {
                    command: cmd.to_string(),
                    code: Some(*code),
                    stderr: format!("{name}: simulated failure"),
                });
            }
        }

        if let Some(hook) = self.hooks.get(&name) {
            hook(cmd);
        }

        Ok(ProcessOutput::default())
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.located.get(program).cloned()
    }
}
