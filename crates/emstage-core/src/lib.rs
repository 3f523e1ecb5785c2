//! Build steps for emstage.
//!
//! This crate provides:
//! - Build configuration (filenames, snippet, exported symbols)
//! - A process capability so every external command can be faked
//! - Emscripten toolchain provisioning
//! - Compilation of the snippet to a WebAssembly module
//! - Generation of the HTML page that loads it

pub mod compile;
pub mod config;
pub mod error;
pub mod page;
pub mod process;
pub mod toolchain;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use compile::{ArtifactCompiler, CompiledArtifact};
pub use config::{BuildConfig, ExportList, SourceSnippet};
pub use error::{Error, ProcessError, Result};
pub use page::PageGenerator;
pub use process::{CommandSpec, ProcessOutput, ProcessRunner, SystemRunner};
pub use toolchain::{Platform, Toolchain, ToolchainProvisioner};
