//! Error types for emstage-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for emstage-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while provisioning or building.
#[derive(Debug, Error)]
pub enum Error {
    /// The toolchain is absent and could not be installed.
    #[error("toolchain not available: {0}")]
    EnvironmentMissing(String),

    /// An external command could not be started or exited non-zero.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Filesystem read or write failed.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The build configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The compiler exited successfully but an expected output is missing.
    #[error("compiler did not produce {}", .0.display())]
    MissingArtifact(PathBuf),
}

impl Error {
    /// Wrap an IO error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short recovery hint for terminal output, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::EnvironmentMissing(_) => {
                Some("install Emscripten manually and make sure `emcc` is on PATH")
            }
            Self::Process(ProcessError::Spawn { .. }) => {
                Some("check that the program is installed and on PATH")
            }
            Self::Process(ProcessError::Failed { .. }) => {
                Some("run with --verbose to see the full command output")
            }
            Self::Io { .. } | Self::Config(_) | Self::MissingArtifact(_) => None,
        }
    }
}

/// Failure of a single external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be spawned at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited with a non-zero status.
    #[error("`{command}` exited with {}{}", exit_status(*code), stderr_suffix(stderr))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_status(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{stderr}")
    }
}
